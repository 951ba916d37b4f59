use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::io::persistence::{
    Persistence, StorageError, apply_insert_at, apply_update, apply_update_subtasks,
    merge_duplicate_ids,
};
use crate::model::task::{SubTask, Task, TaskPatch};

/// Tasks stored as a pretty-printed JSON array in a single file.
///
/// Every write builds the next document in memory, writes it to a temp file
/// beside the target and renames it into place. The cached copy only
/// advances once the rename succeeds, so a failed write leaves both the file
/// and the cache as they were.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    tasks: Vec<Task>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty board.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let tasks = read_tasks(&path)?;
        Ok(JsonFileStore { path, tasks })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn commit(&mut self, next: Vec<Task>) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(&next)?;
        atomic_write(&self.path, content.as_bytes()).map_err(|source| StorageError::Write {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), tasks = next.len(), "wrote task file");
        self.tasks = next;
        Ok(())
    }
}

impl Persistence for JsonFileStore {
    fn load_all(&mut self) -> Result<Vec<Task>, StorageError> {
        self.tasks = read_tasks(&self.path)?;
        Ok(self.tasks.clone())
    }

    fn insert(&mut self, task: &Task) -> Result<(), StorageError> {
        let end = self.tasks.len();
        self.insert_at(end, task)
    }

    fn insert_at(&mut self, index: usize, task: &Task) -> Result<(), StorageError> {
        let mut next = self.tasks.clone();
        apply_insert_at(&mut next, index, task);
        self.commit(next)
    }

    fn update(&mut self, id: &str, patch: &TaskPatch) -> Result<(), StorageError> {
        let mut next = self.tasks.clone();
        apply_update(&mut next, id, patch);
        self.commit(next)
    }

    fn delete(&mut self, id: &str) -> Result<(), StorageError> {
        let mut next = self.tasks.clone();
        next.retain(|t| t.id != id);
        self.commit(next)
    }

    fn update_subtasks(&mut self, id: &str, subtasks: &[SubTask]) -> Result<(), StorageError> {
        let mut next = self.tasks.clone();
        apply_update_subtasks(&mut next, id, subtasks);
        self.commit(next)
    }
}

fn read_tasks(path: &Path) -> Result<Vec<Task>, StorageError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path).map_err(|source| StorageError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let tasks: Vec<Task> = serde_json::from_str(&content)?;
    Ok(merge_duplicate_ids(tasks))
}

/// Write `content` to `path` through a temp file in the same directory
pub fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::TaskStatus;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::open(dir.path().join("tasks.json")).unwrap();
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn writes_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        let mut store = JsonFileStore::open(&path).unwrap();

        let mut a = Task::new("a", "first", TaskStatus::Pending);
        a.subtasks.push(SubTask::new("step"));
        let b = Task::new("b", "", TaskStatus::InProgress);
        store.insert(&a).unwrap();
        store.insert(&b).unwrap();
        store
            .update(&b.id, &TaskPatch::status(TaskStatus::Completed))
            .unwrap();

        let mut reopened = JsonFileStore::open(&path).unwrap();
        let loaded = reopened.load_all().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0], a);
        assert_eq!(loaded[1].status, TaskStatus::Completed);
    }

    #[test]
    fn insert_at_and_delete_keep_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        let mut store = JsonFileStore::open(&path).unwrap();
        let a = Task::new("a", "", TaskStatus::Pending);
        let b = Task::new("b", "", TaskStatus::Pending);
        store.insert(&a).unwrap();
        store.insert(&b).unwrap();
        store.delete(&a.id).unwrap();
        store.insert_at(0, &a).unwrap();

        let loaded = JsonFileStore::open(&path).unwrap().load_all().unwrap();
        let titles: Vec<_> = loaded.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b"]);
    }

    #[test]
    fn file_uses_the_documented_shape() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        let mut store = JsonFileStore::open(&path).unwrap();
        let task = Task::new("Buy milk", "", TaskStatus::InProgress);
        store.insert(&task).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let record = &raw[0];
        assert_eq!(record["title"], "Buy milk");
        assert_eq!(record["status"], "in-progress");
        assert_eq!(record["createdAt"], task.created_at);
        assert!(record["subtasks"].as_array().unwrap().is_empty());
    }

    #[test]
    fn failed_write_keeps_cache() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-dir").join("tasks.json");
        let mut store = JsonFileStore::open(&path).unwrap();
        let task = Task::new("a", "", TaskStatus::Pending);
        assert!(matches!(store.insert(&task), Err(StorageError::Write { .. })));
        assert!(store.tasks.is_empty());
    }

    #[test]
    fn repeated_ids_are_merged_on_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(
            &path,
            r#"[
                {"id":"a","title":"old","status":"pending","createdAt":1},
                {"id":"b","title":"other","status":"pending","createdAt":2},
                {"id":"a","title":"new","status":"completed","createdAt":1}
            ]"#,
        )
        .unwrap();

        let mut store = JsonFileStore::open(&path).unwrap();
        let loaded = store.load_all().unwrap();
        let titles: Vec<_> = loaded.iter().map(|t| (t.id.as_str(), t.title.as_str())).collect();
        assert_eq!(titles, vec![("a", "new"), ("b", "other")]);

        store.delete("b").unwrap();
        let on_disk = JsonFileStore::open(&path).unwrap().load_all().unwrap();
        assert_eq!(on_disk.len(), 1);
        assert_eq!(on_disk[0].title, "new");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, "not json {{{").unwrap();
        assert!(matches!(
            JsonFileStore::open(&path),
            Err(StorageError::Format(_))
        ));
    }
}
