//! Recursive operations on a task's checklist tree.
//!
//! Mutations are copy-on-write: they read the input tree and return a
//! rebuilt one, copying only what they must. The input is never modified, so
//! a snapshot of the tree taken before the call stays valid. `None` means no
//! node matched and the caller should treat the call as a no-op.

use crate::model::task::{Progress, SubTask};
use crate::ops::task_ops::TaskError;

/// Add `node` to the tree. With no `parent_id` it goes to the end of the
/// root sequence; otherwise it is appended to the children of the first
/// node (depth-first) whose id matches.
pub fn insert(tree: &[SubTask], node: &SubTask, parent_id: Option<&str>) -> Option<Vec<SubTask>> {
    match parent_id {
        None => {
            let mut rebuilt = tree.to_vec();
            rebuilt.push(node.clone());
            Some(rebuilt)
        }
        Some(parent_id) => insert_under(tree, parent_id, node),
    }
}

fn insert_under(nodes: &[SubTask], parent_id: &str, node: &SubTask) -> Option<Vec<SubTask>> {
    for (i, current) in nodes.iter().enumerate() {
        if current.id == parent_id {
            let mut children = current.subtasks.clone();
            children.push(node.clone());
            return Some(replace_at(nodes, i, with_children(current, children)));
        }
        if let Some(children) = insert_under(&current.subtasks, parent_id, node) {
            return Some(replace_at(nodes, i, with_children(current, children)));
        }
    }
    None
}

/// Flip `completed` on the first node (depth-first) whose id matches.
/// Ancestors, siblings and descendants keep their flags.
pub fn toggle(tree: &[SubTask], id: &str) -> Option<Vec<SubTask>> {
    for (i, current) in tree.iter().enumerate() {
        if current.id == id {
            let mut flipped = current.clone();
            flipped.completed = !flipped.completed;
            return Some(replace_at(tree, i, flipped));
        }
        if let Some(children) = toggle(&current.subtasks, id) {
            return Some(replace_at(tree, i, with_children(current, children)));
        }
    }
    None
}

/// Cut the node whose id matches, together with its whole subtree.
/// Every level is searched, so the node is found at any depth.
pub fn remove(tree: &[SubTask], id: &str) -> Option<Vec<SubTask>> {
    let mut removed = false;
    let rebuilt = remove_filtered(tree, id, &mut removed);
    removed.then_some(rebuilt)
}

fn remove_filtered(nodes: &[SubTask], id: &str, removed: &mut bool) -> Vec<SubTask> {
    let mut kept = Vec::with_capacity(nodes.len());
    for node in nodes {
        if node.id == id {
            *removed = true;
            continue;
        }
        kept.push(with_children(node, remove_filtered(&node.subtasks, id, removed)));
    }
    kept
}

/// Count every node in the tree and how many of them are completed.
/// Each node counts once toward the total, whatever its depth.
pub fn aggregate_progress(tree: &[SubTask]) -> Progress {
    tree.iter().fold(Progress::default(), |acc, node| {
        let own = Progress {
            total: 1,
            completed: usize::from(node.completed),
        };
        acc + own + aggregate_progress(&node.subtasks)
    })
}

/// Depth-first lookup
pub fn find<'a>(tree: &'a [SubTask], id: &str) -> Option<&'a SubTask> {
    tree.iter()
        .find_map(|node| if node.id == id { Some(node) } else { find(&node.subtasks, id) })
}

/// Resolve a full subtask id or a unique id prefix anywhere in the tree
pub fn resolve<'a>(tree: &'a [SubTask], prefix: &str) -> Result<&'a SubTask, TaskError> {
    if let Some(node) = find(tree, prefix) {
        return Ok(node);
    }
    let mut matches = Vec::new();
    if !prefix.is_empty() {
        collect_prefixed(tree, prefix, &mut matches);
    }
    match matches.as_slice() {
        [] => Err(TaskError::NotFound(prefix.to_string())),
        [node] => Ok(*node),
        _ => Err(TaskError::Ambiguous {
            prefix: prefix.to_string(),
            count: matches.len(),
        }),
    }
}

fn collect_prefixed<'a>(tree: &'a [SubTask], prefix: &str, out: &mut Vec<&'a SubTask>) {
    for node in tree {
        if node.id.starts_with(prefix) {
            out.push(node);
        }
        collect_prefixed(&node.subtasks, prefix, out);
    }
}

/// Number of levels in the tree (0 for an empty tree)
pub fn depth(tree: &[SubTask]) -> usize {
    tree.iter()
        .map(|node| 1 + depth(&node.subtasks))
        .max()
        .unwrap_or(0)
}

/// Indented checklist, one node per line:
///
/// ```text
/// - [x] Buy flour
///   - [ ] Check pantry
/// ```
///
/// With `id_len`, each line also carries the first `id_len` characters of
/// the node's id so it can be addressed from the command line.
pub fn render_tree(tree: &[SubTask], id_len: Option<usize>) -> String {
    let mut out = String::new();
    render_level(tree, 0, id_len, &mut out);
    out
}

fn render_level(nodes: &[SubTask], level: usize, id_len: Option<usize>, out: &mut String) {
    for node in nodes {
        let mark = if node.completed { 'x' } else { ' ' };
        out.push_str(&"  ".repeat(level));
        out.push_str(&format!("- [{}] ", mark));
        if let Some(len) = id_len {
            let short: String = node.id.chars().take(len).collect();
            out.push_str(&short);
            out.push(' ');
        }
        out.push_str(&node.text);
        out.push('\n');
        render_level(&node.subtasks, level + 1, id_len, out);
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Copy a node's own fields over a new child list
fn with_children(node: &SubTask, subtasks: Vec<SubTask>) -> SubTask {
    SubTask {
        id: node.id.clone(),
        text: node.text.clone(),
        completed: node.completed,
        subtasks,
    }
}

fn replace_at(nodes: &[SubTask], index: usize, replacement: SubTask) -> Vec<SubTask> {
    let mut rebuilt = Vec::with_capacity(nodes.len());
    rebuilt.extend_from_slice(&nodes[..index]);
    rebuilt.push(replacement);
    rebuilt.extend_from_slice(&nodes[index + 1..]);
    rebuilt
}
