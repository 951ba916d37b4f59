//! The board: one context object owning the task store, its history, the
//! derived index views and the two outside collaborators.
//!
//! Every mutation runs in two phases. The intended change is computed from
//! the current state and handed to the persistence backend; only when the
//! backend acknowledges it is the change committed to the store, the views
//! rebuilt and the history updated. A refused write leaves all of it
//! untouched.

pub mod notify;
pub mod undo;

use std::sync::Arc;

use crate::index::LinearViews;
use crate::io::persistence::{Persistence, StorageError};
use crate::model::task::{Progress, SubTask, Task, TaskPatch, TaskStatus};
use crate::ops::subtask_ops;
use crate::ops::task_ops::TaskStore;

pub use notify::{ConsoleNotifier, LogNotifier, Notifier, RecordingNotifier, Severity};
pub use undo::{Action, ActionKind, ActionLog, Direction, HistoryStep, StepOutcome, StoreChange};

/// Error type for board operations
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("could not save change: {0}")]
    Persistence(#[from] StorageError),
}

pub struct Board<P: Persistence, N: Notifier> {
    store: TaskStore,
    history: ActionLog,
    views: LinearViews,
    persistence: P,
    notifier: N,
}

impl<P: Persistence, N: Notifier> Board<P, N> {
    /// Load every task from `persistence` and build the board around it
    pub fn open(mut persistence: P, notifier: N) -> Result<Self, BoardError> {
        let tasks = persistence.load_all()?;
        tracing::debug!(tasks = tasks.len(), "loaded board");
        let store = TaskStore::from_tasks(tasks);
        let views = LinearViews::from_store(&store);
        Ok(Board {
            store,
            history: ActionLog::new(),
            views,
            persistence,
            notifier,
        })
    }

    /// Install a history carried over from an earlier session
    pub fn with_history(mut self, history: ActionLog) -> Self {
        self.history = history;
        self
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn tasks(&self) -> impl DoubleEndedIterator<Item = &Task> {
        self.store.iter()
    }

    pub fn find(&self, id: &str) -> Option<&Task> {
        self.store.find(id)
    }

    pub fn tasks_with_status(&self, status: TaskStatus) -> impl Iterator<Item = &Task> {
        self.store.with_status(status)
    }

    /// Checklist progress for a task, `None` if the task is absent
    pub fn progress(&self, task_id: &str) -> Option<Progress> {
        self.store
            .find(task_id)
            .map(|t| subtask_ops::aggregate_progress(&t.subtasks))
    }

    pub fn views(&self) -> &LinearViews {
        &self.views
    }

    pub fn history(&self) -> &ActionLog {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut ActionLog {
        &mut self.history
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn persistence_mut(&mut self) -> &mut P {
        &mut self.persistence
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn into_parts(self) -> (TaskStore, ActionLog, P, N) {
        (self.store, self.history, self.persistence, self.notifier)
    }

    // -----------------------------------------------------------------------
    // Task operations
    // -----------------------------------------------------------------------

    /// Create a task at the end of the board
    pub fn create(
        &mut self,
        title: &str,
        description: &str,
        status: TaskStatus,
    ) -> Result<Task, BoardError> {
        let task = Task::new(title, description, status);
        self.persist(|p| p.insert(&task))?;

        self.store.push(task.clone());
        self.history.record(Action::Add { data: task.clone() });
        self.views.rebuild(&self.store);
        tracing::info!(task_id = %task.id, "created task");
        self.notifier.notify(
            &format!("Task \"{}\" created", task.title),
            Severity::Success,
        );
        Ok(task)
    }

    /// Merge `patch` into a task. Unknown ids are a silent no-op.
    pub fn update(&mut self, id: &str, patch: TaskPatch) -> Result<(), BoardError> {
        let Some(before) = self.store.find(id).cloned() else {
            tracing::debug!(task_id = id, "update of unknown task ignored");
            return Ok(());
        };
        self.persist(|p| p.update(id, &patch))?;

        self.history.record(Action::Update { data: before });
        self.store.update(id, &patch);
        self.views.rebuild(&self.store);
        tracing::info!(task_id = id, "updated task");
        self.notifier.notify("Task updated", Severity::Info);
        Ok(())
    }

    /// Remove a task. Unknown ids are a silent no-op.
    pub fn delete(&mut self, id: &str) -> Result<(), BoardError> {
        let (Some(index), Some(data)) = (self.store.position(id), self.store.find(id).cloned())
        else {
            tracing::debug!(task_id = id, "delete of unknown task ignored");
            return Ok(());
        };
        self.persist(|p| p.delete(id))?;

        self.history.record(Action::Delete { data, index });
        self.store.delete(id);
        self.views.rebuild(&self.store);
        tracing::info!(task_id = id, index, "deleted task");
        self.notifier.notify("Task deleted", Severity::Warning);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Subtask operations (not recorded in history; they always clear redo)
    // -----------------------------------------------------------------------

    /// Add a checklist item to a task, at the root or under `parent_id`.
    /// Returns the new subtask's id, or `None` when the task or parent is
    /// unknown (silent no-op).
    pub fn add_subtask(
        &mut self,
        task_id: &str,
        text: &str,
        parent_id: Option<&str>,
    ) -> Result<Option<String>, BoardError> {
        let node = SubTask::new(text);
        let committed = self.mutate_subtasks(task_id, |tree| {
            subtask_ops::insert(tree, &node, parent_id)
        })?;
        Ok(committed.then_some(node.id))
    }

    /// Flip a checklist item's completed flag. Returns whether anything changed.
    pub fn toggle_subtask(&mut self, task_id: &str, subtask_id: &str) -> Result<bool, BoardError> {
        self.mutate_subtasks(task_id, |tree| subtask_ops::toggle(tree, subtask_id))
    }

    /// Remove a checklist item and everything under it. Returns whether
    /// anything changed.
    pub fn remove_subtask(&mut self, task_id: &str, subtask_id: &str) -> Result<bool, BoardError> {
        let removed = self.mutate_subtasks(task_id, |tree| subtask_ops::remove(tree, subtask_id))?;
        if removed {
            self.notifier.notify("Subtask removed", Severity::Warning);
        }
        Ok(removed)
    }

    fn mutate_subtasks(
        &mut self,
        task_id: &str,
        rebuild: impl FnOnce(&[SubTask]) -> Option<Vec<SubTask>>,
    ) -> Result<bool, BoardError> {
        let Some(task) = self.store.find(task_id) else {
            tracing::debug!(task_id, "subtask change on unknown task ignored");
            self.history.clear_redo();
            return Ok(false);
        };
        let Some(tree) = rebuild(&task.subtasks) else {
            tracing::debug!(task_id, "subtask change matched nothing");
            self.history.clear_redo();
            return Ok(false);
        };
        self.persist(|p| p.update_subtasks(task_id, &tree))?;

        self.store.set_subtasks(task_id, tree);
        self.history.clear_redo();
        self.views.rebuild(&self.store);
        tracing::debug!(task_id, "updated subtasks");
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    /// Reverse the most recent create/update/delete. An empty history is
    /// reported through the notifier and returns `Ok(None)`.
    pub fn undo(&mut self) -> Result<Option<HistoryStep>, BoardError> {
        self.step(Direction::Undo)
    }

    /// Re-apply the most recently undone action
    pub fn redo(&mut self) -> Result<Option<HistoryStep>, BoardError> {
        self.step(Direction::Redo)
    }

    fn step(&mut self, direction: Direction) -> Result<Option<HistoryStep>, BoardError> {
        let persistence = &mut self.persistence;
        let persist = |change: &StoreChange| match change {
            StoreChange::Insert { index, task } => persistence.insert_at(*index, task),
            StoreChange::Remove { id } => persistence.delete(id),
            StoreChange::Replace { task } => persistence.update(&task.id, &TaskPatch::from(task)),
        };
        let outcome = match direction {
            Direction::Undo => self.history.undo(&mut self.store, persist),
            Direction::Redo => self.history.redo(&mut self.store, persist),
        };

        match outcome {
            Ok(StepOutcome::Applied(step)) => {
                self.views.rebuild(&self.store);
                tracing::info!(?direction, kind = ?step.kind, task_id = %step.task_id, "history step applied");
                self.notifier.notify(&step.describe(), Severity::Info);
                Ok(Some(step))
            }
            Ok(StepOutcome::Empty) => {
                let message = match direction {
                    Direction::Undo => "Nothing to undo.",
                    Direction::Redo => "Nothing to redo.",
                };
                self.notifier.notify(message, Severity::Info);
                Ok(None)
            }
            Ok(StepOutcome::Stale(action)) => {
                self.notifier.notify(
                    &format!(
                        "Skipped history entry for missing task \"{}\".",
                        action.data().title
                    ),
                    Severity::Warning,
                );
                Ok(None)
            }
            Err(e) => Err(self.report_failure(e)),
        }
    }

    // -----------------------------------------------------------------------
    // Index views
    // -----------------------------------------------------------------------

    /// Pop the top of the stack view and announce it
    pub fn pop_stack(&mut self) -> Option<Arc<Task>> {
        let popped = self.views.stack.pop();
        match &popped {
            Some(task) => self
                .notifier
                .notify(&format!("Stack pop: {}", task.title), Severity::Info),
            None => self.notifier.notify("Stack is empty", Severity::Warning),
        }
        popped
    }

    /// Dequeue the front of the queue view and announce it
    pub fn dequeue_queue(&mut self) -> Option<Arc<Task>> {
        let front = self.views.queue.dequeue();
        match &front {
            Some(task) => self
                .notifier
                .notify(&format!("Queue dequeue: {}", task.title), Severity::Info),
            None => self.notifier.notify("Queue is empty", Severity::Warning),
        }
        front
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn persist(
        &mut self,
        write: impl FnOnce(&mut P) -> Result<(), StorageError>,
    ) -> Result<(), BoardError> {
        write(&mut self.persistence).map_err(|e| self.report_failure(e))
    }

    fn report_failure(&self, error: StorageError) -> BoardError {
        tracing::error!(error = %error, "persistence write failed; change abandoned");
        self.notifier
            .notify(&format!("Could not save change: {}", error), Severity::Error);
        BoardError::Persistence(error)
    }
}

impl<P: Persistence, N: Notifier> std::fmt::Debug for Board<P, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Board")
            .field("tasks", &self.store.len())
            .field("undo", &self.history.undo_actions().len())
            .field("redo", &self.history.redo_actions().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::persistence::MemoryStore;
    use pretty_assertions::assert_eq;

    type TestBoard = Board<MemoryStore, RecordingNotifier>;

    fn board() -> TestBoard {
        Board::open(MemoryStore::new(), RecordingNotifier::new()).unwrap()
    }

    fn last_notice(board: &TestBoard) -> (String, Severity) {
        board.notifier().last().expect("a notice")
    }

    fn titles(board: &TestBoard) -> Vec<String> {
        board.tasks().map(|t| t.title.clone()).collect()
    }

    #[test]
    fn open_loads_existing_tasks_in_order() {
        let a = Task::new("a", "", TaskStatus::Pending);
        let b = Task::new("b", "", TaskStatus::Completed);
        let board = Board::open(
            MemoryStore::with_tasks(vec![a.clone(), b.clone()]),
            RecordingNotifier::new(),
        )
        .unwrap();
        assert_eq!(titles(&board), vec!["a", "b"]);
        assert_eq!(board.views().list.len(), 2);
        assert!(board.history().is_empty());
    }

    #[test]
    fn create_persists_records_and_notifies() {
        let mut board = board();
        let task = board.create("Buy milk", "", TaskStatus::Pending).unwrap();
        assert_eq!(board.find(&task.id), Some(&task));
        assert_eq!(board.persistence().tasks(), &[task.clone()]);
        assert_eq!(
            board.history().peek_undo(),
            Some(&Action::Add { data: task.clone() })
        );
        assert_eq!(board.views().list.tail().unwrap().id, task.id);
        assert_eq!(
            last_notice(&board),
            ("Task \"Buy milk\" created".to_string(), Severity::Success)
        );
    }

    #[test]
    fn update_and_delete_of_unknown_ids_are_silent() {
        let mut board = board();
        board.create("a", "", TaskStatus::Pending).unwrap();
        board.notifier().clear();
        let writes = board.persistence().write_count();

        board
            .update("ghost", TaskPatch::status(TaskStatus::Completed))
            .unwrap();
        board.delete("ghost").unwrap();
        assert_eq!(board.persistence().write_count(), writes);
        assert_eq!(board.history().undo_actions().len(), 1);
        assert!(board.notifier().notices().is_empty());
    }

    #[test]
    fn failed_write_changes_nothing() {
        let mut board = board();
        let task = board.create("a", "", TaskStatus::Pending).unwrap();
        board.undo().unwrap();
        board.redo().unwrap();
        board.undo().unwrap();
        let history_before = board.history().clone();
        let tasks_before = board.store().snapshot();

        board.persistence_mut().set_fail_writes(true);
        assert!(matches!(
            board.create("b", "", TaskStatus::Pending),
            Err(BoardError::Persistence(_))
        ));
        assert_eq!(last_notice(&board).1, Severity::Error);
        assert!(board.redo().is_err());
        assert!(board.delete(&task.id).is_ok()); // absent after undo: no write attempted

        assert_eq!(board.history(), &history_before);
        assert_eq!(board.store().snapshot(), tasks_before);
        assert!(board.views().list.is_empty());
    }

    #[test]
    fn failed_update_keeps_record_and_history() {
        let mut board = board();
        let task = board.create("a", "", TaskStatus::Pending).unwrap();
        board.persistence_mut().set_fail_writes(true);
        assert!(
            board
                .update(&task.id, TaskPatch::status(TaskStatus::Completed))
                .is_err()
        );
        assert!(board.add_subtask(&task.id, "step", None).is_err());
        assert_eq!(board.find(&task.id), Some(&task));
        assert_eq!(board.history().undo_actions().len(), 1);
    }

    #[test]
    fn empty_history_is_reported() {
        let mut board = board();
        assert_eq!(board.undo().unwrap(), None);
        assert_eq!(
            last_notice(&board),
            ("Nothing to undo.".to_string(), Severity::Info)
        );
        assert_eq!(board.redo().unwrap(), None);
        assert_eq!(
            last_notice(&board),
            ("Nothing to redo.".to_string(), Severity::Info)
        );
    }

    #[test]
    fn undo_persists_restored_position() {
        let mut board = board();
        board.create("a", "", TaskStatus::Pending).unwrap();
        let b = board.create("b", "", TaskStatus::Pending).unwrap();
        board.create("c", "", TaskStatus::Pending).unwrap();
        board.delete(&b.id).unwrap();
        board.undo().unwrap();

        let stored: Vec<_> = board
            .persistence()
            .tasks()
            .iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(stored, vec!["a", "b", "c"]);
        assert_eq!(titles(&board), vec!["a", "b", "c"]);
    }

    #[test]
    fn subtask_changes_clear_redo_without_recording() {
        let mut board = board();
        let task = board.create("a", "", TaskStatus::Pending).unwrap();
        board
            .update(&task.id, TaskPatch::status(TaskStatus::InProgress))
            .unwrap();
        board.undo().unwrap();
        assert!(board.history().can_redo());

        let sub = board.add_subtask(&task.id, "step", None).unwrap().unwrap();
        assert!(!board.history().can_redo());
        assert_eq!(board.history().undo_actions().len(), 1);
        assert_eq!(board.persistence().tasks()[0].subtasks[0].id, sub);

        assert_eq!(board.redo().unwrap(), None);
    }

    #[test]
    fn subtask_noops_skip_the_write_but_still_clear_redo() {
        let mut board = board();
        let task = board.create("a", "", TaskStatus::Pending).unwrap();
        let before = board.find(&task.id).unwrap().clone();

        let noops: [fn(&mut TestBoard, &str); 4] = [
            |b, id| assert_eq!(b.add_subtask(id, "x", Some("ghost")).unwrap(), None),
            |b, _| assert_eq!(b.add_subtask("ghost", "x", None).unwrap(), None),
            |b, id| assert!(!b.toggle_subtask(id, "ghost").unwrap()),
            |b, id| assert!(!b.remove_subtask(id, "ghost").unwrap()),
        ];
        for noop in noops {
            board
                .update(&task.id, TaskPatch::status(TaskStatus::InProgress))
                .unwrap();
            board.undo().unwrap();
            assert!(board.history().can_redo());
            let writes = board.persistence().write_count();

            noop(&mut board, &task.id);
            assert_eq!(board.persistence().write_count(), writes);
            assert!(!board.history().can_redo());
            assert_eq!(board.find(&task.id), Some(&before));
            assert_eq!(board.redo().unwrap(), None);
        }
    }

    #[test]
    fn nested_subtasks_and_progress() {
        let mut board = board();
        let task = board.create("Bake", "", TaskStatus::Pending).unwrap();
        let flour = board
            .add_subtask(&task.id, "Buy flour", None)
            .unwrap()
            .unwrap();
        let pantry = board
            .add_subtask(&task.id, "Check pantry", Some(&flour))
            .unwrap()
            .unwrap();
        board.add_subtask(&task.id, "Preheat", None).unwrap();
        assert!(board.toggle_subtask(&task.id, &pantry).unwrap());

        assert_eq!(
            board.progress(&task.id),
            Some(Progress {
                total: 3,
                completed: 1
            })
        );
        assert!(board.remove_subtask(&task.id, &flour).unwrap());
        assert_eq!(
            board.progress(&task.id),
            Some(Progress {
                total: 1,
                completed: 0
            })
        );
        assert_eq!(board.progress("ghost"), None);
    }

    #[test]
    fn history_snapshot_unaffected_by_later_subtask_edits() {
        let mut board = board();
        let task = board.create("a", "", TaskStatus::Pending).unwrap();
        board.add_subtask(&task.id, "step", None).unwrap();
        board
            .update(&task.id, TaskPatch::status(TaskStatus::Completed))
            .unwrap();
        let sub = board.find(&task.id).unwrap().subtasks[0].id.clone();
        board.toggle_subtask(&task.id, &sub).unwrap();

        match board.history().peek_undo() {
            Some(Action::Update { data }) => assert!(!data.subtasks[0].completed),
            other => panic!("expected Update, got {:?}", other),
        }
    }

    #[test]
    fn pop_and_dequeue_report_through_notifier() {
        let mut board = board();
        board.create("first", "", TaskStatus::Pending).unwrap();
        board.create("second", "", TaskStatus::Pending).unwrap();

        assert_eq!(board.pop_stack().unwrap().title, "second");
        assert_eq!(
            last_notice(&board),
            ("Stack pop: second".to_string(), Severity::Info)
        );
        assert_eq!(board.dequeue_queue().unwrap().title, "first");
        assert_eq!(board.dequeue_queue().unwrap().title, "second");
        assert!(board.dequeue_queue().is_none());
        assert_eq!(
            last_notice(&board),
            ("Queue is empty".to_string(), Severity::Warning)
        );
        // Store is unaffected by view operations
        assert_eq!(titles(&board), vec!["first", "second"]);
    }
}
