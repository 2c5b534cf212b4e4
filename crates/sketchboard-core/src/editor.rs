//! The editing surface: owns the document, its history and every piece of
//! interaction state, and routes input to them.

use crate::command::{Command, FONT_SIZE_RANGE, OPACITY_RANGE, STROKE_WIDTH_RANGE, clamp_to};
use crate::config::EditorConfig;
use crate::document::{Document, ZOrder};
use crate::history::HistoryManager;
use crate::input::{Focus, KeyPress, Modifiers, MouseButton, PointerEvent, ShortcutRegistry};
use crate::marquee::{Marquee, MarqueeOutcome};
use crate::registry::NodeRegistry;
use crate::selection::{MoveGesture, Selection};
use crate::shapes::{ImageProps, Shape, ShapeId, ShapeKind, TextProps};
use crate::stage::Stage;
use crate::storage::{Confirm, KeyValueStore, LoadOutcome, PersistenceAdapter};
use crate::text_edit::TextEditSession;
use crate::transform::{HANDLE_HIT_TOLERANCE, TransformController};
use kurbo::{Point, Size, Vec2};
use std::collections::HashSet;

/// Why subscribers are being notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentEvent {
    /// A settled change: recorded in history (or a load-time fix-up such as
    /// fitting an image) and autosaved.
    Committed,
    /// A live preview while typing in the text editor. Not recorded, not
    /// autosaved.
    Preview,
    /// Undo, redo or a cancelled text edit put back an earlier state.
    Restored,
}

/// Handle returned by [`Editor::subscribe`].
pub type SubscriptionId = u64;

type Listener = Box<dyn FnMut(DocumentEvent, &Document)>;

/// What executing a command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The document changed.
    Changed,
    /// Nothing changed in the document (selection-only or no-op commands).
    Unchanged,
    SnapshotSaved,
    NoSnapshot,
    /// A confirmation was declined.
    Declined,
    /// Writing to storage failed; the document is untouched.
    StorageFailed,
}

/// The pointer gesture holding capture between down and up.
#[derive(Debug)]
enum Gesture {
    Move {
        gesture: MoveGesture,
        /// Shape to select alone if the press ends without moving.
        collapse_to: Option<ShapeId>,
    },
    Marquee(Marquee),
    Transform,
    /// Press on something that does not drag (a locked shape).
    Inert {
        /// Shape to select alone when the press ends.
        collapse_to: Option<ShapeId>,
    },
}

/// Deterministic jitter for placing new shapes (splitmix64).
#[derive(Debug, Clone)]
struct Placement {
    state: u64,
}

impl Placement {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Next value in `[0, 1)`.
    fn next_unit(&mut self) -> f64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        (z >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// The shape editor.
pub struct Editor<S: KeyValueStore> {
    config: EditorConfig,
    history: HistoryManager,
    registry: NodeRegistry,
    selection: Selection,
    transform: TransformController,
    text_edit: Option<TextEditSession>,
    stage: Stage,
    persistence: PersistenceAdapter<S>,
    gesture: Option<Gesture>,
    /// Images added in this session still waiting for their natural size.
    pending_fit: HashSet<ShapeId>,
    placement: Placement,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: SubscriptionId,
}

impl<S: KeyValueStore> Editor<S> {
    /// Mount the editor, hydrating the document from autosave.
    pub fn new(storage: S, config: EditorConfig) -> Self {
        let mut persistence = PersistenceAdapter::with_keys(
            storage,
            config.autosave_key.clone(),
            config.backup_key.clone(),
        );
        let document = persistence.restore();
        let mut registry = NodeRegistry::new();
        registry.sync(&document);
        log::info!("Editor mounted with {} shapes", document.len());
        Self {
            history: HistoryManager::with_document(document, config.history_limit),
            registry,
            selection: Selection::new(),
            transform: TransformController::new(),
            text_edit: None,
            stage: Stage::new(),
            persistence,
            gesture: None,
            pending_fit: HashSet::new(),
            placement: Placement::new(0x5EED),
            listeners: Vec::new(),
            next_subscription: 1,
            config,
        }
    }

    pub fn document(&self) -> &Document {
        self.history.document()
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Selected ids present in the document, in z-order.
    pub fn selected_ids(&self) -> Vec<ShapeId> {
        self.selection.ids_in(self.history.document())
    }

    pub fn transform(&self) -> &TransformController {
        &self.transform
    }

    pub fn text_session(&self) -> Option<&TextEditSession> {
        self.text_edit.as_ref()
    }

    /// The open session, for the in-session font/width/colour setters.
    /// Setters only touch the overlay; they reach the document on commit.
    pub fn text_session_mut(&mut self) -> Option<&mut TextEditSession> {
        self.text_edit.as_mut()
    }

    pub fn persistence(&self) -> &PersistenceAdapter<S> {
        &self.persistence
    }

    /// Register a listener called after every document change.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(DocumentEvent, &Document) + 'static,
    ) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    // ---- commands ----

    /// Execute a toolbar, menu or keyboard command.
    ///
    /// Any open text edit is committed first (the editor loses focus), except
    /// for the commands that act on the edit itself.
    pub fn execute(&mut self, command: Command, confirm: &mut dyn Confirm) -> CommandOutcome {
        log::debug!("Executing {:?}", command);
        match command {
            Command::CommitTextEdit => return changed(self.commit_text_edit()),
            Command::CancelTextEdit => return changed(self.cancel_text_edit()),
            _ => {}
        }
        self.commit_text_edit();

        match command {
            Command::Undo => changed(self.undo()),
            Command::Redo => changed(self.redo()),
            Command::AddRect => self.add_kind(ShapeKind::Rect),
            Command::AddEllipse => self.add_kind(ShapeKind::Ellipse),
            Command::AddTriangle => self.add_kind(ShapeKind::Triangle),
            Command::AddLine => self.add_kind(ShapeKind::Line),
            Command::AddText => self.add_kind(ShapeKind::Text(TextProps::default())),
            Command::AddImages(sources) => self.add_images(sources),
            Command::DuplicateSelection => self.duplicate_selection(),
            Command::BringToFront => self.reorder_selection(ZOrder::Front),
            Command::SendToBack => self.reorder_selection(ZOrder::Back),
            Command::DeleteSelection => {
                let ids = self.selected_ids();
                changed(self.commit(|doc| doc.remove_many(&ids)))
            }
            Command::ToggleLockSelection => {
                let ids = self.selected_ids();
                changed(self.commit(|doc| ids.iter().fold(doc.clone(), |d, id| d.toggle_lock(id))))
            }
            Command::SelectAll => {
                self.selection.select_all(self.history.document());
                self.refresh();
                CommandOutcome::Unchanged
            }
            Command::SaveSnapshot => match self.persistence.save_snapshot(self.history.document()) {
                Ok(()) => CommandOutcome::SnapshotSaved,
                Err(e) => {
                    log::error!("Failed to save snapshot: {}", e);
                    CommandOutcome::StorageFailed
                }
            },
            Command::LoadSnapshot => match self.persistence.load_snapshot(confirm) {
                LoadOutcome::Loaded(document) => {
                    self.selection.clear();
                    changed(self.commit(|_| document))
                }
                LoadOutcome::NoSnapshot => CommandOutcome::NoSnapshot,
                LoadOutcome::Declined => CommandOutcome::Declined,
            },
            Command::ClearDocument => {
                if !self.persistence.confirm_clear(confirm) {
                    return CommandOutcome::Declined;
                }
                self.selection.clear();
                changed(self.commit(Document::clear))
            }
            Command::SetFill(color) => self.style_selection(|s| s.style.fill = color.clone()),
            Command::SetStroke(color) => self.style_selection(|s| s.style.stroke = color.clone()),
            Command::SetStrokeWidth(width) => {
                let width = clamp_to(width, STROKE_WIDTH_RANGE);
                self.style_selection(|s| s.style.stroke_width = width)
            }
            Command::SetOpacity(opacity) => {
                let opacity = clamp_to(opacity, OPACITY_RANGE);
                self.style_selection(|s| s.style.opacity = opacity)
            }
            Command::SetFontSize(size) => {
                let size = clamp_to(size, FONT_SIZE_RANGE);
                self.style_selection(|s| {
                    if let Some(text) = s.as_text_mut() {
                        text.font_size = size;
                    }
                })
            }
            Command::CommitTextEdit | Command::CancelTextEdit => CommandOutcome::Unchanged,
        }
    }

    /// Handle a key press. Returns the outcome if it mapped to a command.
    pub fn key(
        &mut self,
        press: &KeyPress,
        focus: Focus,
        confirm: &mut dyn Confirm,
    ) -> Option<CommandOutcome> {
        let command = ShortcutRegistry::resolve(press, focus)?;
        Some(self.execute(command, confirm))
    }

    pub fn undo(&mut self) -> bool {
        if !self.history.undo() {
            return false;
        }
        self.after_change(DocumentEvent::Restored);
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.history.redo() {
            return false;
        }
        self.after_change(DocumentEvent::Restored);
        true
    }

    /// Add a shape as given (id and geometry included).
    pub fn add_shape(&mut self, shape: Shape) -> bool {
        self.commit(|doc| doc.add(shape))
    }

    fn add_kind(&mut self, kind: ShapeKind) -> CommandOutcome {
        let origin = self.next_placement();
        changed(self.add_shape(Shape::new(kind, origin.x, origin.y)))
    }

    fn add_images(&mut self, sources: Vec<String>) -> CommandOutcome {
        let shapes: Vec<Shape> = sources
            .into_iter()
            .map(|src| {
                let origin = self.next_placement();
                Shape::new(ShapeKind::Image(ImageProps::new(src)), origin.x, origin.y)
            })
            .collect();
        if shapes.is_empty() {
            return CommandOutcome::Unchanged;
        }
        let ids: Vec<ShapeId> = shapes.iter().map(|s| s.id.clone()).collect();
        let added = self.commit(|doc| shapes.into_iter().fold(doc.clone(), |d, s| d.add(s)));
        if added {
            self.pending_fit.extend(ids);
        }
        changed(added)
    }

    fn duplicate_selection(&mut self) -> CommandOutcome {
        let ids = self.selected_ids();
        let offset = Vec2::new(self.config.duplicate_offset, self.config.duplicate_offset);
        changed(self.commit(|doc| ids.iter().fold(doc.clone(), |d, id| d.duplicate(id, offset).0)))
    }

    fn reorder_selection(&mut self, to: ZOrder) -> CommandOutcome {
        let mut ids = self.selected_ids();
        // Keep the relative order of the moved shapes.
        if to == ZOrder::Back {
            ids.reverse();
        }
        changed(self.commit(|doc| ids.iter().fold(doc.clone(), |d, id| d.reorder(id, to))))
    }

    fn style_selection(&mut self, edit: impl Fn(&mut Shape)) -> CommandOutcome {
        let ids = self.selected_ids();
        changed(self.commit(|doc| ids.iter().fold(doc.clone(), |d, id| d.update_with(id, &edit))))
    }

    fn next_placement(&mut self) -> Point {
        let (x0, xs) = self.config.placement_x;
        let (y0, ys) = self.config.placement_y;
        let x = x0 + self.placement.next_unit() * xs;
        let y = y0 + self.placement.next_unit() * ys;
        Point::new(x, y)
    }

    // ---- text editing ----

    /// Open the overlay editor on a text shape.
    ///
    /// An edit open on another shape is committed first. Returns `false` if
    /// the shape is not text or has no mounted node.
    pub fn open_text_edit(&mut self, id: &str) -> bool {
        if self.text_edit.as_ref().is_some_and(|s| s.target() == id) {
            return true;
        }
        self.commit_text_edit();
        let Some(shape) = self.history.document().get(id) else {
            return false;
        };
        let Some(session) = TextEditSession::open(shape, &self.registry, &self.stage) else {
            return false;
        };
        self.text_edit = Some(session);
        self.refresh();
        true
    }

    /// Replace the edited text and preview it on the canvas without history.
    pub fn live_update_text(&mut self, value: &str) {
        let Some(session) = self.text_edit.as_mut() else {
            return;
        };
        session.set_value(value);
        let id = session.target().clone();
        let Some(current) = self.history.document().get(&id) else {
            return;
        };
        let preview = session.preview(current);
        if self.history.apply_untracked(|doc| doc.update(&id, preview)) {
            self.after_change(DocumentEvent::Preview);
        }
    }

    /// Fold the open edit into the document as one undoable step.
    pub fn commit_text_edit(&mut self) -> bool {
        let Some(session) = self.text_edit.take() else {
            return false;
        };
        let id = session.target().clone();
        if !self.history.document().contains(&id) {
            self.refresh();
            return false;
        }
        // Drop the live preview first so the undo entry is the pre-open state.
        let original = session.original().clone();
        self.history.apply_untracked(|doc| doc.update(&id, original));
        let committed = session.committed();
        let changed = self.history.apply(|doc| doc.update(&id, committed));
        log::debug!("Text edit on {} committed (changed: {})", id, changed);
        self.after_change(if changed { DocumentEvent::Committed } else { DocumentEvent::Restored });
        changed
    }

    /// Abandon the open edit and put the shape back as it was.
    pub fn cancel_text_edit(&mut self) -> bool {
        let Some(session) = self.text_edit.take() else {
            return false;
        };
        let id = session.target().clone();
        let original = session.original().clone();
        let reverted = self.history.apply_untracked(|doc| doc.update(&id, original));
        log::debug!("Text edit on {} cancelled", id);
        self.after_change(DocumentEvent::Restored);
        reverted
    }

    // ---- pointer ----

    /// Route a pointer event. Once a press starts a gesture, that gesture
    /// receives every move until the release.
    pub fn pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down {
                position,
                button,
                modifiers,
            } => {
                let world = self.stage.screen_to_world(position);
                match button {
                    MouseButton::Left => self.press(world, modifiers),
                    MouseButton::Right => self.context_press(world),
                    MouseButton::Middle => {}
                }
            }
            PointerEvent::Move { position, modifiers } => {
                let world = self.stage.screen_to_world(position);
                self.drag(world, modifiers);
            }
            PointerEvent::Up { position } => {
                let world = self.stage.screen_to_world(position);
                self.release(world);
            }
            PointerEvent::DoubleClick { position } => {
                let world = self.stage.screen_to_world(position);
                let target = self
                    .registry
                    .node_at(world, self.hit_tolerance())
                    .filter(|node| node.shape().is_text())
                    .map(|node| node.id().clone());
                if let Some(id) = target {
                    self.open_text_edit(&id);
                }
            }
        }
    }

    fn hit_tolerance(&self) -> f64 {
        self.config.hit_tolerance / self.stage.zoom
    }

    fn press(&mut self, world: Point, modifiers: Modifiers) {
        self.commit_text_edit();

        let handle_tolerance = HANDLE_HIT_TOLERANCE / self.stage.zoom;
        let handle = self.transform.hit_test_handles(&self.registry, world, handle_tolerance);
        if let Some(handle) = handle {
            if self.transform.begin(handle, world, &self.registry) {
                self.gesture = Some(Gesture::Transform);
                return;
            }
        }

        let hit = self
            .registry
            .node_at(world, self.hit_tolerance())
            .map(|node| (node.id().clone(), node.draggable()));
        let Some((id, draggable)) = hit else {
            self.gesture = Some(Gesture::Marquee(Marquee::begin(world)));
            return;
        };

        let multi = modifiers.multi_select();
        let mut collapse_to = None;
        if !multi && self.selection.is_selected(&id) && self.selection.len() > 1 {
            // Keep the group for a drag; a plain click collapses on release.
            collapse_to = Some(id.clone());
        } else {
            self.selection.click(&id, multi);
        }
        self.refresh();

        // A locked shape never carries the rest of the selection along.
        if !draggable || !self.selection.is_selected(&id) {
            self.gesture = Some(Gesture::Inert { collapse_to });
            return;
        }
        let selected = self.selected_ids();
        self.gesture = Some(match MoveGesture::begin(world, &selected, &self.registry) {
            Some(gesture) => Gesture::Move { gesture, collapse_to },
            None => Gesture::Inert { collapse_to },
        });
    }

    fn context_press(&mut self, world: Point) {
        self.commit_text_edit();
        let hit = self
            .registry
            .node_at(world, self.hit_tolerance())
            .map(|node| node.id().clone());
        let Some(id) = hit else {
            return;
        };
        if !self.selection.is_selected(&id) {
            self.selection.click(&id, false);
            self.refresh();
        }
    }

    fn drag(&mut self, world: Point, modifiers: Modifiers) {
        match &mut self.gesture {
            Some(Gesture::Move { gesture, .. }) => gesture.update(world, &mut self.registry),
            Some(Gesture::Marquee(marquee)) => marquee.update(world),
            Some(Gesture::Transform) => self.transform.update(
                world,
                modifiers.multi_select(),
                self.config.rotation_snap_degrees,
                &mut self.registry,
            ),
            Some(Gesture::Inert { .. }) | None => {}
        }
    }

    fn release(&mut self, world: Point) {
        let Some(gesture) = self.gesture.take() else {
            return;
        };
        match gesture {
            Gesture::Move { gesture, collapse_to } => {
                match gesture.finish(world, &mut self.registry) {
                    Some((ids, delta)) => {
                        self.commit(|doc| doc.translate(&ids, delta));
                    }
                    None => self.collapse_selection(collapse_to),
                }
            }
            Gesture::Marquee(marquee) => {
                match marquee.finish(world, &self.registry) {
                    MarqueeOutcome::Select(ids) => self.selection.set(ids),
                    MarqueeOutcome::Clear => self.selection.clear(),
                }
                self.refresh();
            }
            Gesture::Transform => {
                let min_size = self.config.min_transform_size;
                if let Some(commit) = self.transform.end(&mut self.registry, min_size) {
                    self.commit(|doc| {
                        doc.update_with(&commit.id, |s| {
                            s.x = commit.x;
                            s.y = commit.y;
                            s.width = commit.width;
                            s.height = commit.height;
                            s.rotation = commit.rotation;
                        })
                    });
                }
            }
            Gesture::Inert { collapse_to } => self.collapse_selection(collapse_to),
        }
    }

    fn collapse_selection(&mut self, collapse_to: Option<ShapeId>) {
        if let Some(id) = collapse_to {
            self.selection.set(vec![id]);
            self.refresh();
        }
    }

    // ---- window and images ----

    /// The container was resized; `origin` is its new page position.
    pub fn resize(&mut self, viewport: Size, origin: Point) {
        self.stage.resize(viewport);
        self.stage.set_container_origin(origin);
        self.resync_overlay();
    }

    /// The page scrolled; `origin` is the container's new page position.
    pub fn scroll(&mut self, origin: Point) {
        self.stage.set_container_origin(origin);
        self.resync_overlay();
    }

    pub fn pan(&mut self, delta: Vec2) {
        self.stage.pan(delta);
        self.resync_overlay();
    }

    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        self.stage.zoom_at(screen_point, factor);
        self.resync_overlay();
    }

    fn resync_overlay(&mut self) {
        let lost = self
            .text_edit
            .as_mut()
            .is_some_and(|s| !s.resync(&self.registry, &self.stage));
        if lost {
            self.text_edit = None;
            self.refresh();
        }
    }

    /// The shell finished loading an image reference.
    ///
    /// Images added in this session are fitted to their natural size; the
    /// fit is not an undo step.
    pub fn image_loaded(&mut self, src: &str, natural: Size) {
        let ids = self.registry.image_loaded(src, natural);
        let to_fit: Vec<ShapeId> = ids
            .into_iter()
            .filter(|id| self.pending_fit.remove(id))
            .collect();
        if to_fit.is_empty() {
            return;
        }
        let (max_w, max_h) = self.config.image_max_size;
        let (width, height) = ImageProps::fit_within(natural.width, natural.height, max_w, max_h);
        let fitted = self.history.apply_untracked(|doc| {
            to_fit.iter().fold(doc.clone(), |d, id| {
                d.update_with(id, |s| {
                    s.width = width;
                    s.height = height;
                })
            })
        });
        if fitted {
            self.after_change(DocumentEvent::Committed);
        }
    }

    /// The shell could not load an image reference.
    pub fn image_failed(&mut self, src: &str) {
        for id in self.registry.image_failed(src) {
            self.pending_fit.remove(&id);
        }
    }

    // ---- change propagation ----

    /// Apply a recorded mutation and propagate it.
    fn commit(&mut self, mutate: impl FnOnce(&Document) -> Document) -> bool {
        let changed = self.history.apply(mutate);
        if changed {
            self.after_change(DocumentEvent::Committed);
        } else {
            // Gestures may have left nodes offset or scaled.
            self.registry.sync(self.history.document());
            self.refresh();
        }
        changed
    }

    fn after_change(&mut self, event: DocumentEvent) {
        let document = self.history.document();
        self.registry.sync(document);
        self.selection.prune(document);
        self.pending_fit.retain(|id| document.contains(id));
        self.resync_overlay();
        self.refresh();

        let document = self.history.document();
        for (_, listener) in self.listeners.iter_mut() {
            listener(event, document);
        }
        if event != DocumentEvent::Preview {
            let settled = self.settled_document();
            self.persistence.autosave(&settled);
        }
    }

    /// The current document with any open text edit's preview rolled back.
    fn settled_document(&self) -> Document {
        let document = self.history.document();
        match &self.text_edit {
            Some(session) if document.contains(session.target()) => {
                document.update(session.target(), session.original().clone())
            }
            _ => document.clone(),
        }
    }

    /// Re-derive node dimming and handle attachment from the current state.
    fn refresh(&mut self) {
        let editing = self.text_edit.as_ref().map(|s| s.target().as_str());
        self.registry.set_editing(editing);
        self.transform.attach(&self.selection, &self.registry, editing);
    }
}

fn changed(changed: bool) -> CommandOutcome {
    if changed {
        CommandOutcome::Changed
    } else {
        CommandOutcome::Unchanged
    }
}
