pub mod subtask_ops;
pub mod task_ops;
