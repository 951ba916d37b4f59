//! Alternate orderings over the task collection.
//!
//! The views are derived data: they are rebuilt from the [`TaskStore`] after
//! every mutation and are never consulted to decide what the store holds.

pub mod linked_list;
pub mod queue;
pub mod stack;

use std::sync::Arc;

pub use linked_list::DoublyLinkedList;
pub use queue::Queue;
pub use stack::Stack;

use crate::model::task::Task;
use crate::ops::task_ops::TaskStore;

/// List, stack and queue views sharing the store's task records
#[derive(Debug, Clone, Default)]
pub struct LinearViews {
    pub list: DoublyLinkedList<Arc<Task>>,
    pub stack: Stack<Arc<Task>>,
    pub queue: Queue<Arc<Task>>,
}

impl LinearViews {
    pub fn from_store(store: &TaskStore) -> Self {
        let mut views = LinearViews::default();
        views.rebuild(store);
        views
    }

    /// Discard all three views and refill them in store order
    pub fn rebuild(&mut self, store: &TaskStore) {
        self.list.clear();
        self.stack.clear();
        self.queue.clear();
        for task in store.handles() {
            self.list.append(Arc::clone(task));
            self.stack.push(Arc::clone(task));
            self.queue.enqueue(Arc::clone(task));
        }
    }
}
