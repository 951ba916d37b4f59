use std::fs;
use std::path::{Path, PathBuf};

use crate::io::config_io::{self, CONFIG_FILE};
use crate::io::json_store::JsonFileStore;
use crate::io::persistence::StorageError;
use crate::model::config::BoardConfig;

/// Name of the directory holding a board's files
pub const BOARD_DIR: &str = ".taskboard";

const TASKS_FILE: &str = "tasks.json";

/// Error type for board directory operations
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("not a task board: no .taskboard/ directory found (run `tb init`)")]
    NotABoard,
    #[error("a task board already exists at {0}")]
    AlreadyExists(PathBuf),
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse board.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A board directory on disk with its parsed configuration
#[derive(Debug, Clone)]
pub struct BoardDir {
    /// Directory containing `.taskboard/`
    pub root: PathBuf,
    /// The `.taskboard/` directory itself
    pub dir: PathBuf,
    pub config: BoardConfig,
}

impl BoardDir {
    pub fn tasks_path(&self) -> PathBuf {
        self.dir.join(TASKS_FILE)
    }

    /// Open the JSON task file as the board's persistence backend
    pub fn open_store(&self) -> Result<JsonFileStore, ProjectError> {
        Ok(JsonFileStore::open(self.tasks_path())?)
    }
}

/// Walk up from `start` looking for a `.taskboard/` directory
pub fn discover_board(start: &Path) -> Result<PathBuf, ProjectError> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(BOARD_DIR).is_dir() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(ProjectError::NotABoard);
        }
    }
}

/// Load the board directory under `root`
pub fn load_board_dir(root: &Path) -> Result<BoardDir, ProjectError> {
    let dir = root.join(BOARD_DIR);
    if !dir.is_dir() {
        return Err(ProjectError::NotABoard);
    }
    let config = config_io::read_config(&dir)?;
    Ok(BoardDir {
        root: root.to_path_buf(),
        dir,
        config,
    })
}

/// Create `.taskboard/` under `root` with a commented board.toml and an
/// empty task file. Refuses to overwrite unless `force` is set.
pub fn init_board(root: &Path, name: &str, force: bool) -> Result<BoardDir, ProjectError> {
    let dir = root.join(BOARD_DIR);
    if dir.join(CONFIG_FILE).exists() && !force {
        return Err(ProjectError::AlreadyExists(dir));
    }
    fs::create_dir_all(&dir)?;
    fs::write(dir.join(CONFIG_FILE), config_io::render_config(name))?;
    let tasks_path = dir.join(TASKS_FILE);
    if !tasks_path.exists() {
        fs::write(&tasks_path, "[]\n")?;
    }
    tracing::info!(path = %dir.display(), "initialized board");
    load_board_dir(root)
}
