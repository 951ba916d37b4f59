use std::sync::Arc;

use indexmap::IndexMap;

use crate::model::task::{SubTask, Task, TaskPatch, TaskStatus};

/// Error type for id lookups
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("ambiguous id \"{prefix}\" matches {count} records")]
    Ambiguous { prefix: String, count: usize },
}

/// The authoritative, order-preserving task collection.
///
/// Records are held behind `Arc` and never mutated in place: every change
/// swaps in a new record, so any handle taken earlier (index views, history
/// snapshots) keeps seeing the state it was taken from.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: IndexMap<String, Arc<Task>>,
}

impl TaskStore {
    pub fn new() -> Self {
        TaskStore {
            tasks: IndexMap::new(),
        }
    }

    /// Build a store from loaded records, keeping their order.
    /// A repeated id keeps its first position and its last record.
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut store = TaskStore::new();
        for task in tasks {
            store.push(task);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    // -----------------------------------------------------------------------
    // CRUD
    // -----------------------------------------------------------------------

    /// Allocate a new task and append it
    pub fn create(&mut self, title: &str, description: &str, status: TaskStatus) -> Task {
        let task = Task::new(title, description, status);
        self.push(task.clone());
        task
    }

    /// Append a record to the end of the sequence
    pub fn push(&mut self, task: Task) {
        self.tasks.insert(task.id.clone(), Arc::new(task));
    }

    /// Insert a record at `index` (clamped to the length). Returns where it landed.
    pub fn insert_at(&mut self, index: usize, task: Task) -> usize {
        let index = index.min(self.tasks.len());
        self.tasks.shift_insert(index, task.id.clone(), Arc::new(task));
        index
    }

    /// Merge `patch` into the record for `id`, keeping its position.
    /// Returns the previous record, or `None` (no-op) if `id` is absent.
    pub fn update(&mut self, id: &str, patch: &TaskPatch) -> Option<Arc<Task>> {
        let slot = self.tasks.get_mut(id)?;
        let merged = slot.merged(patch);
        Some(std::mem::replace(slot, Arc::new(merged)))
    }

    /// Overwrite the record with the same id. No-op if absent.
    pub fn replace(&mut self, task: Task) -> Option<Arc<Task>> {
        let slot = self.tasks.get_mut(&task.id)?;
        Some(std::mem::replace(slot, Arc::new(task)))
    }

    /// Swap in a new subtask tree for `id`. Returns false if `id` is absent.
    pub fn set_subtasks(&mut self, id: &str, subtasks: Vec<SubTask>) -> bool {
        let patch = TaskPatch {
            subtasks: Some(subtasks),
            ..Default::default()
        };
        self.update(id, &patch).is_some()
    }

    /// Remove the record for `id`, returning its former index and the record
    pub fn delete(&mut self, id: &str) -> Option<(usize, Arc<Task>)> {
        self.tasks
            .shift_remove_full(id)
            .map(|(index, _, task)| (index, task))
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn find(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id).map(|t| t.as_ref())
    }

    pub fn handle(&self, id: &str) -> Option<&Arc<Task>> {
        self.tasks.get(id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.tasks.get_index_of(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tasks.contains_key(id)
    }

    /// Resolve a full id or a unique id prefix
    pub fn resolve(&self, prefix: &str) -> Result<&Task, TaskError> {
        if let Some(task) = self.find(prefix) {
            return Ok(task);
        }
        if prefix.is_empty() {
            return Err(TaskError::NotFound(String::new()));
        }
        let mut matches = self.iter().filter(|t| t.id.starts_with(prefix));
        match (matches.next(), matches.count()) {
            (Some(task), 0) => Ok(task),
            (Some(_), rest) => Err(TaskError::Ambiguous {
                prefix: prefix.to_string(),
                count: rest + 1,
            }),
            (None, _) => Err(TaskError::NotFound(prefix.to_string())),
        }
    }

    /// Tasks in store order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Task> {
        self.tasks.values().map(|t| t.as_ref())
    }

    /// Shared handles in store order
    pub fn handles(&self) -> impl DoubleEndedIterator<Item = &Arc<Task>> {
        self.tasks.values()
    }

    /// Tasks in one column, keeping store order
    pub fn with_status(&self, status: TaskStatus) -> impl Iterator<Item = &Task> {
        self.iter().filter(move |t| t.status == status)
    }

    /// Owned copy of every record, in order
    pub fn snapshot(&self) -> Vec<Task> {
        self.iter().cloned().collect()
    }
}
