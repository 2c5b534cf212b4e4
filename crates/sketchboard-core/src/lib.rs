//! Sketchboard Core Library
//!
//! Platform-agnostic document model, undo history, selection, transform and
//! text editing logic for the Sketchboard shape editor.

pub mod command;
pub mod config;
pub mod document;
pub mod editor;
pub mod history;
pub mod input;
pub mod marquee;
pub mod registry;
pub mod selection;
pub mod shapes;
pub mod stage;
pub mod storage;
pub mod text_edit;
pub mod transform;

pub use command::Command;
pub use config::{ConfigError, EditorConfig};
pub use document::{Document, ZOrder};
pub use editor::{CommandOutcome, DocumentEvent, Editor, SubscriptionId};
pub use history::{HistoryManager, HistoryMode};
pub use input::{Focus, KeyPress, Modifiers, MouseButton, PointerEvent, ShortcutRegistry};
pub use marquee::{Marquee, MarqueeOutcome};
pub use registry::{ImageStatus, NodeRegistry, ShapeNode};
pub use selection::{MoveGesture, Selection};
pub use shapes::{Shape, ShapeId, ShapeKind};
pub use stage::Stage;
pub use storage::{KeyValueStore, MemoryStorage, PersistenceAdapter, StorageError, StorageResult};
pub use text_edit::{OverlayBox, TextEditSession};
pub use transform::{Anchor, HandleKind, TransformController};
#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;
