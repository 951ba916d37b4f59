use std::fs;
use std::path::Path;

use crate::io::project_io::ProjectError;
use crate::model::config::BoardConfig;

pub const CONFIG_FILE: &str = "board.toml";

const BOARD_TOML_TEMPLATE: &str = r##"[board]
name = "{name}"
# Column for `tb add` when --status is not given: pending, in-progress, completed
default_status = "pending"

[history]
# Keep undo/redo history between tb invocations (stored in .history.json)
persist = true
# Maximum number of undo steps to keep. Omit for unlimited.
# limit = 500
"##;

/// Read board.toml from the board directory. A missing file means defaults.
pub fn read_config(board_dir: &Path) -> Result<BoardConfig, ProjectError> {
    let config_path = board_dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(BoardConfig::default());
    }
    let config_text = fs::read_to_string(&config_path).map_err(|e| ProjectError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;
    Ok(toml::from_str(&config_text)?)
}

/// The commented board.toml written by `tb init`
pub fn render_config(name: &str) -> String {
    let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
    BOARD_TOML_TEMPLATE.replace("{name}", &escaped)
}
