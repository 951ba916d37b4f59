use serde::{Deserialize, Serialize};

use super::task::TaskStatus;

/// Configuration from board.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardConfig {
    #[serde(default)]
    pub board: BoardInfo,
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardInfo {
    #[serde(default = "default_name")]
    pub name: String,
    /// Status given to `tb add` when `--status` is omitted
    #[serde(default)]
    pub default_status: TaskStatus,
}

impl Default for BoardInfo {
    fn default() -> Self {
        BoardInfo {
            name: default_name(),
            default_status: TaskStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Keep undo/redo history in `.history.json` between runs
    #[serde(default = "default_true")]
    pub persist: bool,
    /// Maximum undo depth. Absent = unbounded.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            persist: true,
            limit: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_name() -> String {
    "Task Board".to_string()
}
