//! Sketchboard command shell (native).
//!
//! Reads editor commands and pointer gestures from stdin, one per line, and
//! persists the document under the user's data directory.

mod commands;
mod shell;

use sketchboard_core::{Editor, EditorConfig, FileStorage, StorageResult};
use std::io;
use std::path::PathBuf;

/// Overrides the directory holding autosave and snapshot files.
const DATA_DIR_ENV: &str = "SKETCHBOARD_DATA_DIR";

fn main() {
    env_logger::init();
    log::info!("Starting Sketchboard");

    let config = load_config();
    let storage = match open_storage(std::env::var_os(DATA_DIR_ENV).map(PathBuf::from)) {
        Ok(storage) => storage,
        Err(e) => {
            log::error!("Failed to open storage: {}", e);
            std::process::exit(1);
        }
    };
    log::info!("Storing documents in {}", storage.base_path().display());

    let mut editor = Editor::new(storage, config);
    let mut input = io::stdin().lock();
    let mut output = io::stdout().lock();
    if let Err(e) = shell::run(&mut editor, &mut input, &mut output) {
        log::error!("Shell terminated: {}", e);
        std::process::exit(1);
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sketchboard").join("config.json"))
}

/// A broken config file is reported and replaced by defaults.
fn load_config() -> EditorConfig {
    let Some(path) = config_path() else {
        return EditorConfig::default();
    };
    EditorConfig::load_or_default(&path).unwrap_or_else(|e| {
        log::warn!("Ignoring config at {}: {}", path.display(), e);
        EditorConfig::default()
    })
}

fn open_storage(dir: Option<PathBuf>) -> StorageResult<FileStorage> {
    match dir {
        Some(dir) => FileStorage::new(dir),
        None => FileStorage::default_location(),
    }
}
