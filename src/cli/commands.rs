use clap::{Args, Parser, Subcommand};

use crate::model::task::TaskStatus;

#[derive(Parser)]
#[command(name = "tb", about = concat!("tb v", env!("CARGO_PKG_VERSION"), " - a kanban board with checklists and undo"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different board directory
    #[arg(short = 'C', long = "board-dir", global = true)]
    pub board_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new board in the current directory
    Init(InitArgs),
    /// Add a task to the end of the board
    Add(AddArgs),
    /// Change a task's title, description or status
    Edit(EditArgs),
    /// Move a task to another column
    Mv(MvArgs),
    /// Delete a task
    Rm(RmArgs),
    /// Checklist items inside a task
    Sub(SubCmd),
    /// Reverse the last add, edit, move or delete
    Undo,
    /// Re-apply the last undone change
    Redo,
    /// Show the undo and redo stacks
    History,
    /// List tasks in board order
    List(ListArgs),
    /// Show the board as three columns
    Board,
    /// Show task details and its checklist
    Show(ShowArgs),
    /// Show the list, stack and queue orderings
    Views(ViewsArgs),
}

// ---------------------------------------------------------------------------
// Init args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Board name (default: inferred from directory name)
    #[arg(long)]
    pub name: Option<String>,
    /// Rewrite board.toml even if a board already exists
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Task title
    pub title: String,
    /// Longer description
    #[arg(short = 'd', long, default_value = "")]
    pub description: String,
    /// Starting column (default: board.default_status)
    #[arg(short = 's', long)]
    pub status: Option<TaskStatus>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID (any unique prefix)
    pub id: String,
    /// New title
    #[arg(long)]
    pub title: Option<String>,
    /// New description
    #[arg(short = 'd', long)]
    pub description: Option<String>,
    /// New status
    #[arg(short = 's', long)]
    pub status: Option<TaskStatus>,
}

#[derive(Args)]
pub struct MvArgs {
    /// Task ID (any unique prefix)
    pub id: String,
    /// Target column: pending, in-progress or completed
    pub status: TaskStatus,
}

#[derive(Args)]
pub struct RmArgs {
    /// Task ID (any unique prefix)
    pub id: String,
}

#[derive(Args)]
pub struct SubCmd {
    #[command(subcommand)]
    pub action: SubAction,
}

#[derive(Subcommand)]
pub enum SubAction {
    /// Add a checklist item
    Add(SubAddArgs),
    /// Toggle a checklist item's completed flag
    Toggle(SubRefArgs),
    /// Remove a checklist item and everything under it
    Rm(SubRefArgs),
}

#[derive(Args)]
pub struct SubAddArgs {
    /// Task ID (any unique prefix)
    pub task: String,
    /// Item text
    pub text: String,
    /// Nest under this checklist item
    #[arg(long)]
    pub parent: Option<String>,
}

#[derive(Args)]
pub struct SubRefArgs {
    /// Task ID (any unique prefix)
    pub task: String,
    /// Checklist item ID (any unique prefix)
    pub sub: String,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListArgs {
    /// Only tasks in this column
    #[arg(long, short = 's')]
    pub status: Option<TaskStatus>,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Task ID (any unique prefix)
    pub id: String,
}

#[derive(Args)]
pub struct ViewsArgs {
    /// Pop the top of the stack view before printing
    #[arg(long)]
    pub pop: bool,
    /// Dequeue the front of the queue view before printing
    #[arg(long)]
    pub dequeue: bool,
}
