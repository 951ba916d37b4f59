//! Behavioural properties of the board, exercised through the library API.

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use taskboard::board::{Board, RecordingNotifier, Severity};
use taskboard::index::DoublyLinkedList;
use taskboard::io::json_store::JsonFileStore;
use taskboard::io::persistence::{MemoryStore, Persistence};
use taskboard::model::task::{Task, TaskPatch, TaskStatus};
use taskboard::ops::subtask_ops;

type TestBoard = Board<MemoryStore, RecordingNotifier>;

fn empty_board() -> TestBoard {
    Board::open(MemoryStore::new(), RecordingNotifier::new()).unwrap()
}

fn contents<P: Persistence>(board: &Board<P, RecordingNotifier>) -> Vec<Task> {
    board.tasks().cloned().collect()
}

#[test]
fn undo_all_then_redo_all_round_trips() {
    let mut board = empty_board();
    let seed = board.create("seed", "kept", TaskStatus::Pending).unwrap();
    let initial = contents(&board);
    let start_depth = board.history().undo_actions().len();

    let a = board.create("a", "", TaskStatus::Pending).unwrap();
    let b = board.create("b", "", TaskStatus::InProgress).unwrap();
    board.update(&a.id, TaskPatch::status(TaskStatus::Completed)).unwrap();
    board.delete(&seed.id).unwrap();
    board
        .update(
            &b.id,
            TaskPatch {
                title: Some("b2".into()),
                description: Some("renamed".into()),
                ..Default::default()
            },
        )
        .unwrap();
    board.delete(&a.id).unwrap();
    let latest = contents(&board);
    let steps = board.history().undo_actions().len() - start_depth;
    assert_eq!(steps, 6);

    for _ in 0..steps {
        assert!(board.undo().unwrap().is_some());
    }
    assert_eq!(contents(&board), initial);
    assert_eq!(board.persistence().tasks(), initial.as_slice());

    for _ in 0..steps {
        assert!(board.redo().unwrap().is_some());
    }
    assert_eq!(contents(&board), latest);
    assert_eq!(board.persistence().tasks(), latest.as_slice());
    assert!(!board.history().can_redo());
}

#[test]
fn every_mutation_clears_redo() {
    let mut board = empty_board();
    let t = board.create("t", "", TaskStatus::Pending).unwrap();
    let sub = board.add_subtask(&t.id, "step", None).unwrap().unwrap();

    let mutations: Vec<Box<dyn Fn(&mut TestBoard)>> = vec![
        Box::new(|b| {
            b.create("x", "", TaskStatus::Pending).unwrap();
        }),
        Box::new(|b| {
            let id = b.tasks().next().unwrap().id.clone();
            b.update(&id, TaskPatch::status(TaskStatus::InProgress)).unwrap();
        }),
        Box::new(|b| {
            let id = b.tasks().last().unwrap().id.clone();
            b.add_subtask(&id, "more", None).unwrap();
        }),
        Box::new(|b| {
            let id = b.tasks().next().unwrap().id.clone();
            let sub = b.find(&id).unwrap().subtasks[0].id.clone();
            b.toggle_subtask(&id, &sub).unwrap();
        }),
    ];

    for mutate in &mutations {
        board
            .update(&t.id, TaskPatch::status(TaskStatus::Completed))
            .unwrap();
        board.undo().unwrap();
        assert!(board.history().can_redo());
        mutate(&mut board);
        assert!(!board.history().can_redo());
    }

    board
        .update(&t.id, TaskPatch::status(TaskStatus::Completed))
        .unwrap();
    board.undo().unwrap();
    assert!(board.remove_subtask(&t.id, &sub).unwrap());
    assert!(!board.history().can_redo());

    board.create("last", "", TaskStatus::Pending).unwrap();
    let last = board.tasks().last().unwrap().id.clone();
    board.undo().unwrap();
    assert!(board.history().can_redo());
    board.delete(&t.id).unwrap();
    assert!(!board.history().can_redo());
    assert!(board.find(&last).is_none());
}

#[test]
fn progress_of_five_node_tree() {
    let mut board = empty_board();
    let t = board.create("Party", "", TaskStatus::Pending).unwrap();
    let food = board.add_subtask(&t.id, "Food", None).unwrap().unwrap();
    let drinks = board.add_subtask(&t.id, "Drinks", None).unwrap().unwrap();
    let cake = board.add_subtask(&t.id, "Cake", Some(&food)).unwrap().unwrap();
    board.add_subtask(&t.id, "Candles", Some(&cake)).unwrap();
    board.add_subtask(&t.id, "Juice", Some(&drinks)).unwrap();
    board.toggle_subtask(&t.id, &cake).unwrap();
    board.toggle_subtask(&t.id, &drinks).unwrap();

    let progress = board.progress(&t.id).unwrap();
    assert_eq!((progress.total, progress.completed), (5, 2));
    assert_eq!(subtask_ops::depth(&board.find(&t.id).unwrap().subtasks), 3);
}

#[test]
fn insert_under_missing_parent_changes_nothing() {
    let mut board = empty_board();
    let t = board.create("t", "", TaskStatus::Pending).unwrap();
    board.add_subtask(&t.id, "root", None).unwrap();
    let before = board.find(&t.id).unwrap().clone();
    let writes = board.persistence().write_count();

    assert_eq!(board.add_subtask(&t.id, "orphan", Some("missing")).unwrap(), None);
    assert_eq!(board.find(&t.id).unwrap(), &before);
    assert_eq!(board.persistence().write_count(), writes);
}

#[test]
fn removing_a_node_drops_its_descendants() {
    let mut board = empty_board();
    let t = board.create("t", "", TaskStatus::Pending).unwrap();
    let a = board.add_subtask(&t.id, "A", None).unwrap().unwrap();
    let mid = board.add_subtask(&t.id, "mid", Some(&a)).unwrap().unwrap();
    let b = board.add_subtask(&t.id, "B", Some(&mid)).unwrap().unwrap();
    board.add_subtask(&t.id, "sibling", None).unwrap();

    assert!(board.remove_subtask(&t.id, &a).unwrap());
    let tree = &board.find(&t.id).unwrap().subtasks;
    assert!(subtask_ops::find(tree, &a).is_none());
    assert!(subtask_ops::find(tree, &b).is_none());
    assert_eq!(tree.len(), 1);
    assert_eq!(
        board.notifier().last(),
        Some(("Subtask removed".to_string(), Severity::Warning))
    );
}

#[test]
fn buy_milk_scenario() {
    let mut board = empty_board();
    let t1 = board.create("Buy milk", "", TaskStatus::Pending).unwrap();
    board
        .update(&t1.id, TaskPatch::status(TaskStatus::InProgress))
        .unwrap();
    board.delete(&t1.id).unwrap();
    assert_eq!(board.store().len(), 0);

    board.undo().unwrap();
    assert_eq!(board.find(&t1.id).unwrap().status, TaskStatus::InProgress);
    board.undo().unwrap();
    assert_eq!(board.find(&t1.id).unwrap().status, TaskStatus::Pending);
    board.undo().unwrap();
    assert!(board.find(&t1.id).is_none());
    assert_eq!(board.undo().unwrap(), None);
    assert_eq!(
        board.notifier().last(),
        Some(("Nothing to undo.".to_string(), Severity::Info))
    );

    board.redo().unwrap();
    assert_eq!(board.find(&t1.id).unwrap(), &t1);
    board.redo().unwrap();
    assert_eq!(board.find(&t1.id).unwrap().status, TaskStatus::InProgress);
    board.redo().unwrap();
    assert!(board.find(&t1.id).is_none());
    assert_eq!(board.redo().unwrap(), None);
    assert!(board.history().undo_actions().len() == 3);

    let messages: Vec<String> = board
        .notifier()
        .notices()
        .into_iter()
        .map(|(m, _)| m)
        .collect();
    assert_eq!(
        messages,
        vec![
            "Task \"Buy milk\" created",
            "Task updated",
            "Task deleted",
            "Undone: task \"Buy milk\" restored.",
            "Undone: task \"Buy milk\" reverted.",
            "Undone: created task removed.",
            "Nothing to undo.",
            "Redone: task \"Buy milk\" restored.",
            "Redone: task \"Buy milk\" updated.",
            "Redone: task deleted again.",
            "Nothing to redo.",
        ]
    );
}

#[test]
fn linked_list_prepend_and_remove_last() {
    let mut list = DoublyLinkedList::new();
    list.append("a");
    list.append("b");
    list.prepend("c");
    assert_eq!(list.to_vec(), vec!["c", "a", "b"]);
    assert_eq!(list.remove_last(), Some("b"));
    assert_eq!(list.to_vec(), vec!["c", "a"]);
}

#[test]
fn views_follow_every_mutation() {
    let mut board = empty_board();
    let a = board.create("a", "", TaskStatus::Pending).unwrap();
    board.create("b", "", TaskStatus::Pending).unwrap();
    board.create("c", "", TaskStatus::Pending).unwrap();
    board.delete(&a.id).unwrap();

    let titles = |board: &TestBoard| -> Vec<String> {
        board.views().list.iter().map(|t| t.title.clone()).collect()
    };
    assert_eq!(titles(&board), vec!["b", "c"]);
    assert_eq!(board.views().stack.peek().unwrap().title, "c");
    assert_eq!(board.views().queue.front().unwrap().title, "b");

    board.undo().unwrap();
    assert_eq!(titles(&board), vec!["a", "b", "c"]);
}

#[test]
fn refused_writes_leave_board_untouched() {
    let mut board = empty_board();
    let t = board.create("t", "", TaskStatus::Pending).unwrap();
    board.add_subtask(&t.id, "step", None).unwrap();
    let snapshot = contents(&board);
    let history = board.history().clone();

    board.persistence_mut().set_fail_writes(true);
    assert!(board.create("u", "", TaskStatus::Pending).is_err());
    assert!(board.update(&t.id, TaskPatch::status(TaskStatus::Completed)).is_err());
    assert!(board.add_subtask(&t.id, "more", None).is_err());
    assert!(board.delete(&t.id).is_err());
    assert!(board.undo().is_err());

    assert_eq!(contents(&board), snapshot);
    assert_eq!(board.history(), &history);
    assert_eq!(board.views().list.len(), 1);
    assert_eq!(board.notifier().last().unwrap().1, Severity::Error);
}

#[test]
fn json_backed_board_survives_reopen() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("tasks.json");

    let mut board = Board::open(JsonFileStore::open(&path).unwrap(), RecordingNotifier::new())
        .unwrap();
    let a = board.create("a", "first", TaskStatus::Pending).unwrap();
    let b = board.create("b", "", TaskStatus::InProgress).unwrap();
    board.add_subtask(&b.id, "nested", None).unwrap();
    board.delete(&a.id).unwrap();
    board.undo().unwrap();
    let expected = contents(&board);
    let (_, history, _, _) = board.into_parts();

    let reopened = Board::open(JsonFileStore::open(&path).unwrap(), RecordingNotifier::new())
        .unwrap()
        .with_history(history);
    assert_eq!(contents(&reopened), expected);
    assert_eq!(reopened.history().redo_actions().len(), 1);
}
