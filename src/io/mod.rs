pub mod config_io;
pub mod history_io;
pub mod json_store;
pub mod lock;
pub mod persistence;
pub mod project_io;
