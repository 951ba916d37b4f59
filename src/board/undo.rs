use serde::{Deserialize, Serialize};

use crate::model::task::Task;
use crate::ops::task_ops::TaskStore;

/// A single reversible task-level mutation.
///
/// `data` is an independent copy of the task, never a handle into the store.
/// For `Add` it is the task as created; for `Delete` the task as it was
/// removed, with its index in the store. For `Update` it holds the state to
/// restore next: the pre-update record while on the undo stack and the
/// post-update record while on the redo stack. Each undo/redo of an `Update`
/// swaps the payload for the record it overwrites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Action {
    Add { data: Task },
    Update { data: Task },
    Delete { data: Task, index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionKind {
    Add,
    Update,
    Delete,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Add { .. } => ActionKind::Add,
            Action::Update { .. } => ActionKind::Update,
            Action::Delete { .. } => ActionKind::Delete,
        }
    }

    pub fn data(&self) -> &Task {
        match self {
            Action::Add { data } | Action::Update { data } | Action::Delete { data, .. } => data,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.data().id
    }
}

/// Which stack a step is taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Undo,
    Redo,
}

/// The store mutation a history step performs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    /// Put a record back at `index`
    Insert { index: usize, task: Task },
    /// Drop the record with this id
    Remove { id: String },
    /// Overwrite the record with the same id
    Replace { task: Task },
}

impl StoreChange {
    pub fn apply(self, store: &mut TaskStore) {
        match self {
            StoreChange::Insert { index, task } => {
                store.insert_at(index, task);
            }
            StoreChange::Remove { id } => {
                store.delete(&id);
            }
            StoreChange::Replace { task } => {
                store.replace(task);
            }
        }
    }
}

/// What an applied undo/redo did, for the front end to report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryStep {
    pub direction: Direction,
    pub kind: ActionKind,
    pub task_id: String,
    /// Title of the record that was restored, removed or re-applied
    pub title: String,
}

impl HistoryStep {
    pub fn describe(&self) -> String {
        match (self.direction, self.kind) {
            (Direction::Undo, ActionKind::Update) => {
                format!("Undone: task \"{}\" reverted.", self.title)
            }
            (Direction::Undo, ActionKind::Delete) => {
                format!("Undone: task \"{}\" restored.", self.title)
            }
            (Direction::Undo, ActionKind::Add) => "Undone: created task removed.".to_string(),
            (Direction::Redo, ActionKind::Update) => {
                format!("Redone: task \"{}\" updated.", self.title)
            }
            (Direction::Redo, ActionKind::Delete) => "Redone: task deleted again.".to_string(),
            (Direction::Redo, ActionKind::Add) => {
                format!("Redone: task \"{}\" restored.", self.title)
            }
        }
    }
}

/// Result of asking the log for one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step was persisted and applied
    Applied(HistoryStep),
    /// The stack was empty; nothing changed
    Empty,
    /// The top action referred to a record that no longer exists. It has
    /// been dropped from the log and the store is unchanged.
    Stale(Action),
}

/// The undo/redo stacks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLog {
    undo: Vec<Action>,
    redo: Vec<Action>,
    #[serde(skip)]
    limit: Option<usize>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A log keeping at most `limit` undo entries (oldest dropped first)
    pub fn with_limit(limit: Option<usize>) -> Self {
        ActionLog {
            limit,
            ..Default::default()
        }
    }

    pub fn set_limit(&mut self, limit: Option<usize>) {
        self.limit = limit;
        self.trim_undo();
    }

    /// Record a new action. Clears the redo stack.
    pub fn record(&mut self, action: Action) {
        self.undo.push(action);
        self.trim_undo();
        self.redo.clear();
    }

    /// Forward progress that is not itself undoable still invalidates redo
    pub fn clear_redo(&mut self) {
        self.redo.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.undo.is_empty() && self.redo.is_empty()
    }

    pub fn peek_undo(&self) -> Option<&Action> {
        self.undo.last()
    }

    pub fn peek_redo(&self) -> Option<&Action> {
        self.redo.last()
    }

    /// Undo entries, oldest first
    pub fn undo_actions(&self) -> &[Action] {
        &self.undo
    }

    /// Redo entries, oldest first
    pub fn redo_actions(&self) -> &[Action] {
        &self.redo
    }

    /// Reverse the most recent action.
    ///
    /// The store change is handed to `persist` first; if it fails the log and
    /// the store are left exactly as they were and the error is returned.
    pub fn undo<E>(
        &mut self,
        store: &mut TaskStore,
        persist: impl FnOnce(&StoreChange) -> Result<(), E>,
    ) -> Result<StepOutcome, E> {
        self.step(Direction::Undo, store, persist)
    }

    /// Re-apply the most recently undone action. Same failure contract as
    /// [`ActionLog::undo`].
    pub fn redo<E>(
        &mut self,
        store: &mut TaskStore,
        persist: impl FnOnce(&StoreChange) -> Result<(), E>,
    ) -> Result<StepOutcome, E> {
        self.step(Direction::Redo, store, persist)
    }

    fn step<E>(
        &mut self,
        direction: Direction,
        store: &mut TaskStore,
        persist: impl FnOnce(&StoreChange) -> Result<(), E>,
    ) -> Result<StepOutcome, E> {
        let (from, to) = match direction {
            Direction::Undo => (&mut self.undo, &mut self.redo),
            Direction::Redo => (&mut self.redo, &mut self.undo),
        };
        let Some(mut action) = from.pop() else {
            return Ok(StepOutcome::Empty);
        };
        let Some(change) = plan_change(&action, direction, store) else {
            tracing::warn!(
                task_id = action.task_id(),
                ?direction,
                "dropping history entry for a task that no longer exists"
            );
            return Ok(StepOutcome::Stale(action));
        };
        if let Err(e) = persist(&change) {
            from.push(action);
            return Err(e);
        }

        let step = HistoryStep {
            direction,
            kind: action.kind(),
            task_id: action.task_id().to_string(),
            title: action.data().title.clone(),
        };
        if let Action::Update { data } = &mut action
            && let Some(current) = store.find(&data.id)
        {
            // The record about to be overwritten becomes the payload for
            // the opposite direction
            *data = current.clone();
        }
        change.apply(store);
        to.push(action);
        if direction == Direction::Redo {
            self.trim_undo();
        }
        Ok(StepOutcome::Applied(step))
    }

    fn trim_undo(&mut self) {
        if let Some(limit) = self.limit
            && self.undo.len() > limit
        {
            self.undo.drain(..self.undo.len() - limit);
        }
    }
}

/// Work out what the top action asks of the store.
/// `None` means an `Update` whose record is gone.
fn plan_change(action: &Action, direction: Direction, store: &TaskStore) -> Option<StoreChange> {
    let change = match (action, direction) {
        (Action::Add { data }, Direction::Undo) | (Action::Delete { data, .. }, Direction::Redo) => {
            StoreChange::Remove {
                id: data.id.clone(),
            }
        }
        (Action::Add { data }, Direction::Redo) => StoreChange::Insert {
            index: store.len(),
            task: data.clone(),
        },
        (Action::Delete { data, index }, Direction::Undo) => StoreChange::Insert {
            index: *index,
            task: data.clone(),
        },
        (Action::Update { data }, _) => {
            if !store.contains(&data.id) {
                return None;
            }
            StoreChange::Replace { task: data.clone() }
        }
    };
    Some(change)
}
