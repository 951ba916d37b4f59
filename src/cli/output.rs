use chrono::DateTime;
use serde::Serialize;

use crate::board::undo::{Action, ActionKind, ActionLog};
use crate::index::LinearViews;
use crate::model::task::{Progress, SubTask, Task, TaskStatus};
use crate::ops::subtask_ops;

/// Characters of a uuid shown in listings
pub const SHORT_ID_LEN: usize = 8;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub status: TaskStatus,
    pub created: String,
    pub progress: Progress,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<SubTask>,
}

#[derive(Serialize)]
pub struct ColumnJson {
    pub status: TaskStatus,
    pub label: &'static str,
    pub count: usize,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct BoardJson {
    pub name: String,
    pub columns: Vec<ColumnJson>,
}

#[derive(Serialize)]
pub struct HistoryEntryJson {
    pub kind: ActionKind,
    pub task_id: String,
    pub title: String,
}

#[derive(Serialize)]
pub struct HistoryJson {
    pub undo: Vec<HistoryEntryJson>,
    pub redo: Vec<HistoryEntryJson>,
}

#[derive(Serialize)]
pub struct ViewsJson {
    pub list: Vec<String>,
    pub stack: Vec<String>,
    pub queue: Vec<String>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn task_to_json(task: &Task) -> TaskJson {
    TaskJson {
        id: task.id.clone(),
        title: task.title.clone(),
        description: task.description.clone(),
        status: task.status,
        created: format_created(task.created_at),
        progress: subtask_ops::aggregate_progress(&task.subtasks),
        subtasks: task.subtasks.clone(),
    }
}

pub fn board_to_json(name: &str, tasks: &[&Task]) -> BoardJson {
    let columns = TaskStatus::ALL
        .iter()
        .map(|&status| {
            let column: Vec<TaskJson> = tasks
                .iter()
                .filter(|t| t.status == status)
                .map(|t| task_to_json(t))
                .collect();
            ColumnJson {
                status,
                label: status.label(),
                count: column.len(),
                tasks: column,
            }
        })
        .collect();
    BoardJson {
        name: name.to_string(),
        columns,
    }
}

pub fn history_to_json(log: &ActionLog) -> HistoryJson {
    let entry = |action: &Action| HistoryEntryJson {
        kind: action.kind(),
        task_id: action.task_id().to_string(),
        title: action.data().title.clone(),
    };
    // most recent first, matching the order `undo`/`redo` will take them
    HistoryJson {
        undo: log.undo_actions().iter().rev().map(entry).collect(),
        redo: log.redo_actions().iter().rev().map(entry).collect(),
    }
}

pub fn views_to_json(views: &LinearViews) -> ViewsJson {
    let title = |t: &std::sync::Arc<Task>| t.title.clone();
    ViewsJson {
        list: views.list.iter().map(title).collect(),
        stack: views.stack.iter().map(title).collect(),
        queue: views.queue.iter().map(title).collect(),
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

/// Creation time as RFC 3339 in UTC, or the raw millisecond value if it is
/// out of range
pub fn format_created(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
        .unwrap_or_else(|| millis.to_string())
}

fn format_progress(progress: Progress) -> String {
    if progress.total == 0 {
        String::new()
    } else {
        format!(" [{}/{}]", progress.completed, progress.total)
    }
}

/// One line per task: short id, title, checklist progress
pub fn format_task_line(task: &Task) -> String {
    format!(
        "{} {}{}",
        short_id(&task.id),
        task.title,
        format_progress(subtask_ops::aggregate_progress(&task.subtasks))
    )
}

/// Flat listing with each task's column
pub fn format_task_list<'a>(tasks: impl Iterator<Item = &'a Task>) -> Vec<String> {
    tasks
        .map(|t| format!("{}  ({})", format_task_line(t), t.status))
        .collect()
}

/// The board as three columns, each headed with its count
pub fn format_board(name: &str, tasks: &[&Task]) -> Vec<String> {
    let mut lines = vec![format!("== {} ==", name)];
    for status in TaskStatus::ALL {
        let column: Vec<&Task> = tasks.iter().copied().filter(|t| t.status == status).collect();
        lines.push(String::new());
        lines.push(format!("{} ({})", status.label(), column.len()));
        if column.is_empty() {
            lines.push("  -".to_string());
        }
        for task in column {
            lines.push(format!("  {}", format_task_line(task)));
        }
    }
    lines
}

/// Full task details, checklist included
pub fn format_task_detail(task: &Task) -> Vec<String> {
    let mut lines = vec![
        format!("{} {}", short_id(&task.id), task.title),
        format!("id: {}", task.id),
        format!("status: {}", task.status.label()),
        format!("created: {}", format_created(task.created_at)),
    ];
    if !task.description.is_empty() {
        lines.push("description:".to_string());
        for line in task.description.lines() {
            lines.push(format!("  {}", line));
        }
    }
    if !task.subtasks.is_empty() {
        let progress = subtask_ops::aggregate_progress(&task.subtasks);
        lines.push(String::new());
        lines.push(format!(
            "checklist: {}/{} ({}%)",
            progress.completed,
            progress.total,
            progress.percent()
        ));
        let tree = subtask_ops::render_tree(&task.subtasks, Some(SHORT_ID_LEN));
        lines.extend(tree.lines().map(|l| format!("  {}", l)));
    }
    lines
}

fn format_action(action: &Action) -> String {
    let verb = match action.kind() {
        ActionKind::Add => "add",
        ActionKind::Update => "update",
        ActionKind::Delete => "delete",
    };
    format!(
        "  {:<6} {} {}",
        verb,
        short_id(action.task_id()),
        action.data().title
    )
}

/// Undo and redo stacks, most recent entry first
pub fn format_history(log: &ActionLog) -> Vec<String> {
    let mut lines = vec![format!("undo ({}):", log.undo_actions().len())];
    lines.extend(log.undo_actions().iter().rev().map(format_action));
    lines.push(format!("redo ({}):", log.redo_actions().len()));
    lines.extend(log.redo_actions().iter().rev().map(format_action));
    lines
}

/// The three linear views. The stack is printed top first.
pub fn format_views(views: &LinearViews) -> Vec<String> {
    let join = |titles: Vec<&str>| {
        if titles.is_empty() {
            "-".to_string()
        } else {
            titles.join(", ")
        }
    };
    vec![
        format!(
            "list:  {}",
            join(views.list.iter().map(|t| t.title.as_str()).collect())
        ),
        format!(
            "stack: {}",
            join(views.stack.iter().map(|t| t.title.as_str()).collect())
        ),
        format!(
            "queue: {}",
            join(views.queue.iter().map(|t| t.title.as_str()).collect())
        ),
    ]
}
