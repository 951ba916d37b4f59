use std::path::PathBuf;

use indexmap::IndexMap;

use crate::model::task::{SubTask, Task, TaskPatch};

/// Error type for persistence backends
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed task data: {0}")]
    Format(#[from] serde_json::Error),
    #[error("backend rejected the write: {0}")]
    Rejected(String),
}

/// Where the board's tasks live outside the process.
///
/// Every write is acknowledged or refused synchronously; the board only
/// commits a change locally after the backend reports success. A write
/// naming an id the backend does not hold is not an error.
pub trait Persistence {
    /// Every stored task, in board order
    fn load_all(&mut self) -> Result<Vec<Task>, StorageError>;

    /// Append a task
    fn insert(&mut self, task: &Task) -> Result<(), StorageError>;

    /// Put a task back at a given position. Backends without ordering
    /// may simply append.
    fn insert_at(&mut self, index: usize, task: &Task) -> Result<(), StorageError> {
        let _ = index;
        self.insert(task)
    }

    fn update(&mut self, id: &str, patch: &TaskPatch) -> Result<(), StorageError>;

    fn delete(&mut self, id: &str) -> Result<(), StorageError>;

    /// Replace a task's whole checklist tree
    fn update_subtasks(&mut self, id: &str, subtasks: &[SubTask]) -> Result<(), StorageError>;
}

// ---------------------------------------------------------------------------
// Ordered task list shared by the in-memory and JSON backends
// ---------------------------------------------------------------------------

/// Collapse records sharing an id the same way the task store does: the id
/// keeps its first position and its last record.
pub(crate) fn merge_duplicate_ids(tasks: Vec<Task>) -> Vec<Task> {
    let loaded = tasks.len();
    let mut by_id: IndexMap<String, Task> = IndexMap::with_capacity(loaded);
    for task in tasks {
        by_id.insert(task.id.clone(), task);
    }
    if by_id.len() < loaded {
        tracing::warn!(
            duplicates = loaded - by_id.len(),
            "merged task records with repeated ids"
        );
    }
    by_id.into_values().collect()
}

pub(crate) fn apply_insert_at(tasks: &mut Vec<Task>, index: usize, task: &Task) {
    tasks.retain(|t| t.id != task.id);
    let index = index.min(tasks.len());
    tasks.insert(index, task.clone());
}

pub(crate) fn apply_update(tasks: &mut [Task], id: &str, patch: &TaskPatch) {
    if let Some(task) = tasks.iter_mut().find(|t| t.id == id) {
        *task = task.merged(patch);
    }
}

pub(crate) fn apply_update_subtasks(tasks: &mut [Task], id: &str, subtasks: &[SubTask]) {
    if let Some(task) = tasks.iter_mut().find(|t| t.id == id) {
        task.subtasks = subtasks.to_vec();
    }
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

/// Vector-backed persistence. Keeps everything in the process; useful for
/// embedding the board without storage and for exercising failure paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tasks: Vec<Task>,
    fail_writes: bool,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        MemoryStore {
            tasks: merge_duplicate_ids(tasks),
            ..Default::default()
        }
    }

    /// While set, every write is refused with [`StorageError::Rejected`]
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// The backend's current contents
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Number of acknowledged writes
    pub fn write_count(&self) -> usize {
        self.writes
    }

    fn begin_write(&mut self) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Rejected("writes disabled".into()));
        }
        self.writes += 1;
        Ok(())
    }
}

impl Persistence for MemoryStore {
    fn load_all(&mut self) -> Result<Vec<Task>, StorageError> {
        Ok(self.tasks.clone())
    }

    fn insert(&mut self, task: &Task) -> Result<(), StorageError> {
        self.begin_write()?;
        let end = self.tasks.len();
        apply_insert_at(&mut self.tasks, end, task);
        Ok(())
    }

    fn insert_at(&mut self, index: usize, task: &Task) -> Result<(), StorageError> {
        self.begin_write()?;
        apply_insert_at(&mut self.tasks, index, task);
        Ok(())
    }

    fn update(&mut self, id: &str, patch: &TaskPatch) -> Result<(), StorageError> {
        self.begin_write()?;
        apply_update(&mut self.tasks, id, patch);
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<(), StorageError> {
        self.begin_write()?;
        self.tasks.retain(|t| t.id != id);
        Ok(())
    }

    fn update_subtasks(&mut self, id: &str, subtasks: &[SubTask]) -> Result<(), StorageError> {
        self.begin_write()?;
        apply_update_subtasks(&mut self.tasks, id, subtasks);
        Ok(())
    }
}
