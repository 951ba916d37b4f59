use std::fs;
use std::path::Path;

use crate::board::undo::ActionLog;
use crate::io::json_store::atomic_write;

const HISTORY_FILE: &str = ".history.json";

/// Read the saved undo/redo history from the board directory.
/// A missing or unreadable file yields `None`; history is a convenience and
/// never blocks opening the board.
pub fn read_history(board_dir: &Path) -> Option<ActionLog> {
    let path = board_dir.join(HISTORY_FILE);
    let content = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&content) {
        Ok(log) => Some(log),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed history file");
            None
        }
    }
}

/// Save the undo/redo history into the board directory
pub fn write_history(board_dir: &Path, log: &ActionLog) -> Result<(), std::io::Error> {
    let path = board_dir.join(HISTORY_FILE);
    let content = serde_json::to_string(log)?;
    atomic_write(&path, content.as_bytes())
}

/// Forget any saved history
pub fn clear_history(board_dir: &Path) -> Result<(), std::io::Error> {
    match fs::remove_file(board_dir.join(HISTORY_FILE)) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
