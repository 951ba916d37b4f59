mod init;
pub use init::cmd_init;

use std::path::{Path, PathBuf};

use crate::board::{Board, ConsoleNotifier};
use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::history_io;
use crate::io::json_store::JsonFileStore;
use crate::io::lock::BoardLock;
use crate::io::project_io::{self, BoardDir};
use crate::model::task::{Task, TaskPatch};
use crate::ops::subtask_ops;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

type CliBoard = Board<JsonFileStore, ConsoleNotifier>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let start = start_dir(cli.board_dir.as_deref())?;
    let json = cli.json;

    match cli.command {
        Commands::Init(args) => cmd_init(args, &start),

        // Read commands
        Commands::List(args) => cmd_list(args, &start, json),
        Commands::Board => cmd_board(&start, json),
        Commands::Show(args) => cmd_show(args, &start, json),
        Commands::History => cmd_history(&start, json),
        Commands::Views(args) => cmd_views(args, &start, json),

        // Write commands
        Commands::Add(args) => cmd_add(args, &start, json),
        Commands::Edit(args) => cmd_edit(args, &start, json),
        Commands::Mv(args) => cmd_mv(args, &start, json),
        Commands::Rm(args) => cmd_rm(args, &start, json),
        Commands::Sub(args) => cmd_sub(args, &start, json),
        Commands::Undo => cmd_step(&start, json, true),
        Commands::Redo => cmd_step(&start, json, false),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Directory to start board discovery from: `-C` if given, else the cwd
fn start_dir(override_dir: Option<&str>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match override_dir {
        Some(dir) => Ok(std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?),
        None => Ok(std::env::current_dir()?),
    }
}

fn locate(start: &Path) -> Result<BoardDir, Box<dyn std::error::Error>> {
    let root = project_io::discover_board(start)?;
    Ok(project_io::load_board_dir(&root)?)
}

/// Load the tasks and, when enabled, the saved history
fn open_board(dir: &BoardDir, json: bool) -> Result<CliBoard, Box<dyn std::error::Error>> {
    let notifier = ConsoleNotifier { quiet: json };
    let mut board = Board::open(dir.open_store()?, notifier)?;
    if dir.config.history.persist
        && let Some(log) = history_io::read_history(&dir.dir)
    {
        board = board.with_history(log);
    }
    board.history_mut().set_limit(dir.config.history.limit);
    Ok(board)
}

/// Run a read-only command against the board
fn read_board<T>(
    start: &Path,
    json: bool,
    f: impl FnOnce(&BoardDir, &mut CliBoard) -> Result<T, Box<dyn std::error::Error>>,
) -> Result<T, Box<dyn std::error::Error>> {
    let dir = locate(start)?;
    let mut board = open_board(&dir, json)?;
    f(&dir, &mut board)
}

/// Run a write command: the board directory stays locked from load until the
/// history has been saved.
///
/// The saved history is removed before the command touches tasks.json and
/// rewritten afterwards, so it can never describe an older task file. If
/// the rewrite fails the board is left with no history rather than a stale
/// one.
fn write_board<T>(
    start: &Path,
    json: bool,
    f: impl FnOnce(&BoardDir, &mut CliBoard) -> Result<T, Box<dyn std::error::Error>>,
) -> Result<T, Box<dyn std::error::Error>> {
    let dir = locate(start)?;
    let _lock = BoardLock::acquire_default(&dir.dir)?;
    let mut board = open_board(&dir, json)?;
    if !dir.config.history.persist {
        return f(&dir, &mut board);
    }

    history_io::clear_history(&dir.dir)
        .map_err(|e| format!("could not replace saved history: {}", e))?;
    let result = f(&dir, &mut board);
    if let Err(e) = history_io::write_history(&dir.dir, board.history()) {
        tracing::error!(error = %e, "history not saved; undo starts empty next run");
        return Err(format!("undo history could not be saved: {}", e).into());
    }
    result
}

/// Resolve a task id prefix to the full id
fn resolve_task(board: &CliBoard, prefix: &str) -> Result<String, Box<dyn std::error::Error>> {
    Ok(board.store().resolve(prefix)?.id.clone())
}

/// Resolve a checklist item prefix within a task
fn resolve_subtask(
    board: &CliBoard,
    task_id: &str,
    prefix: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    let task = board
        .find(task_id)
        .ok_or_else(|| format!("task not found: {}", task_id))?;
    Ok(subtask_ops::resolve(&task.subtasks, prefix)?.id.clone())
}

fn print_task(task: &Task, json: bool) -> CmdResult {
    if json {
        println!("{}", serde_json::to_string_pretty(&task_to_json(task))?);
    } else {
        println!("{}", task.id);
    }
    Ok(())
}

/// Print the task after a change, if it still exists
fn print_updated(board: &CliBoard, id: &str, json: bool) -> CmdResult {
    if json && let Some(task) = board.find(id) {
        println!("{}", serde_json::to_string_pretty(&task_to_json(task))?);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(args: ListArgs, start: &Path, json: bool) -> CmdResult {
    read_board(start, json, |_, board| {
        let tasks: Vec<&Task> = match args.status {
            Some(status) => board.tasks_with_status(status).collect(),
            None => board.tasks().collect(),
        };
        if json {
            let out: Vec<TaskJson> = tasks.iter().map(|t| task_to_json(t)).collect();
            println!("{}", serde_json::to_string_pretty(&out)?);
        } else {
            for line in format_task_list(tasks.into_iter()) {
                println!("{}", line);
            }
        }
        Ok(())
    })
}

fn cmd_board(start: &Path, json: bool) -> CmdResult {
    read_board(start, json, |dir, board| {
        let tasks: Vec<&Task> = board.tasks().collect();
        let name = &dir.config.board.name;
        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&board_to_json(name, &tasks))?
            );
        } else {
            for line in format_board(name, &tasks) {
                println!("{}", line);
            }
        }
        Ok(())
    })
}

fn cmd_show(args: ShowArgs, start: &Path, json: bool) -> CmdResult {
    read_board(start, json, |_, board| {
        let task = board.store().resolve(&args.id)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&task_to_json(task))?);
        } else {
            for line in format_task_detail(task) {
                println!("{}", line);
            }
        }
        Ok(())
    })
}

fn cmd_history(start: &Path, json: bool) -> CmdResult {
    read_board(start, json, |_, board| {
        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&history_to_json(board.history()))?
            );
        } else {
            for line in format_history(board.history()) {
                println!("{}", line);
            }
        }
        Ok(())
    })
}

fn cmd_views(args: ViewsArgs, start: &Path, json: bool) -> CmdResult {
    read_board(start, json, |_, board| {
        if args.pop {
            board.pop_stack();
        }
        if args.dequeue {
            board.dequeue_queue();
        }
        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&views_to_json(board.views()))?
            );
        } else {
            for line in format_views(board.views()) {
                println!("{}", line);
            }
        }
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(args: AddArgs, start: &Path, json: bool) -> CmdResult {
    let task = write_board(start, json, |dir, board| {
        let status = args.status.unwrap_or(dir.config.board.default_status);
        Ok(board.create(&args.title, &args.description, status)?)
    })?;
    print_task(&task, json)
}

fn cmd_edit(args: EditArgs, start: &Path, json: bool) -> CmdResult {
    let patch = TaskPatch {
        title: args.title,
        description: args.description,
        status: args.status,
        subtasks: None,
    };
    if patch.is_empty() {
        return Err("nothing to change (use --title, --description or --status)".into());
    }
    write_board(start, json, |_, board| {
        let id = resolve_task(board, &args.id)?;
        board.update(&id, patch)?;
        print_updated(board, &id, json)
    })
}

fn cmd_mv(args: MvArgs, start: &Path, json: bool) -> CmdResult {
    write_board(start, json, |_, board| {
        let id = resolve_task(board, &args.id)?;
        board.update(&id, TaskPatch::status(args.status))?;
        print_updated(board, &id, json)
    })
}

fn cmd_rm(args: RmArgs, start: &Path, json: bool) -> CmdResult {
    write_board(start, json, |_, board| {
        let id = resolve_task(board, &args.id)?;
        board.delete(&id)?;
        Ok(())
    })
}

fn cmd_sub(args: SubCmd, start: &Path, json: bool) -> CmdResult {
    write_board(start, json, |_, board| match args.action {
        SubAction::Add(a) => {
            let task_id = resolve_task(board, &a.task)?;
            let parent = match &a.parent {
                Some(p) => Some(resolve_subtask(board, &task_id, p)?),
                None => None,
            };
            let new_id = board
                .add_subtask(&task_id, &a.text, parent.as_deref())?
                .ok_or_else(|| format!("could not add checklist item to {}", a.task))?;
            if json {
                print_updated(board, &task_id, json)
            } else {
                println!("{}", new_id);
                Ok(())
            }
        }
        SubAction::Toggle(a) => {
            let task_id = resolve_task(board, &a.task)?;
            let sub_id = resolve_subtask(board, &task_id, &a.sub)?;
            board.toggle_subtask(&task_id, &sub_id)?;
            print_updated(board, &task_id, json)
        }
        SubAction::Rm(a) => {
            let task_id = resolve_task(board, &a.task)?;
            let sub_id = resolve_subtask(board, &task_id, &a.sub)?;
            board.remove_subtask(&task_id, &sub_id)?;
            print_updated(board, &task_id, json)
        }
    })
}

fn cmd_step(start: &Path, json: bool, undo: bool) -> CmdResult {
    write_board(start, json, |_, board| {
        let step = if undo { board.undo()? } else { board.redo()? };
        if json {
            println!("{}", serde_json::to_string_pretty(&step)?);
        }
        Ok(())
    })
}
