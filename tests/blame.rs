use lineage::*;
use pretty_assertions::assert_eq;
use serde_json::json;

mod common;
use common::*;

// "a" at c1, rewritten to "b" at c2, deleted at c3
fn rewritten_then_deleted() -> (History, MemoryBlobs) {
    Fixture::new()
        .commit("c1", &[("f", Some("a\n"))])
        .commit("c2", &[("f", Some("b\n"))])
        .commit("c3", &[("f", None)])
        .build()
}

// "y" inserted between "x" and "z" at c2, then rewritten at c3
fn inserted_then_rewritten() -> (History, MemoryBlobs) {
    Fixture::new()
        .commit("c1", &[("f", Some("x\nz\n"))])
        .commit("c2", &[("f", Some("x\ny\nz\n"))])
        .commit("c3", &[("f", Some("x\nY\nz\n"))])
        .build()
}

#[test]
fn blame_and_future_of_a_rewritten_line() {
    let (history, _) = rewritten_then_deleted();
    let r = history.file_blame("c2", "f").expect("blame");

    assert_eq!(short(&r.blame), vec!["c2:1"]);
    assert_eq!(short(&r.future), vec!["c3:1"]);
    assert_eq!(r.previous.as_deref(), Some("c1"));
    assert_eq!(r.next.as_deref(), Some("c3"));
}

#[test]
fn deleted_file_is_absent() {
    let (history, _) = rewritten_then_deleted();
    let r = history.file_blame("c3", "f").expect("blame");

    assert!(r.blame.is_empty());
    assert!(r.future.is_empty());
    assert_eq!(r.next, None);
}

#[test]
fn diff_blame_of_an_insertion() {
    let (history, _) = inserted_then_rewritten();
    let r = history.diff_blame("c2", "f").expect("diff blame");

    assert_eq!(short(&r.blame), vec!["c1:1", "c1:2"]);
    assert_eq!(short(&r.future), vec!["-", "c3:2", "-"]);
    assert_eq!(r.hunks, vec![Hunk::new(1, 0, 2, 1)]);

    let rows = r.rows().expect("rows");
    assert_eq!(rows.len(), 3);
    assert!(matches!(&rows[0], DiffRow::Context { old_line: 1, new_line: 1, .. }));
    match &rows[1] {
        DiffRow::Added { new_line, future } => {
            assert_eq!(*new_line, 2);
            assert!(future.is("c3", 2));
        }
        row => panic!("unexpected row {row:?}"),
    }
    match &rows[2] {
        DiffRow::Context {
            old_line,
            new_line,
            blame,
            future,
        } => {
            assert_eq!((*old_line, *new_line), (2, 3));
            assert!(blame.is("c1", 2));
            assert_eq!(future, &Attribution::StillExists);
        }
        row => panic!("unexpected row {row:?}"),
    }
}

#[test]
fn blame_serializes_with_tagged_attributions() {
    let (history, _) = rewritten_then_deleted();
    let r = history.file_blame("c2", "f").expect("blame");

    assert_eq!(
        serde_json::to_value(&r).expect("serializable"),
        json!({
            "blame": [{
                "kind": "known",
                "commit": {"hash": "c2", "label": "author c2", "date": 1},
                "line": 1
            }],
            "future": [{
                "kind": "known",
                "commit": {"hash": "c3", "label": "author c3", "date": 2},
                "line": 1
            }],
            "previous": "c1",
            "next": "c3",
            "hunks": []
        })
    );
}

#[test]
fn renamed_file() {
    let (history, _) = Fixture::new()
        .commit("c1", &[("a.txt", Some("one\ntwo\n"))])
        .commit("c2", &[("a.txt", None), ("b.txt", Some("one\ntwo\n"))])
        .build();

    let changes = history.changes("c2").expect("changes");
    assert_eq!(changes.len(), 1);
    match &changes[0] {
        FileChange::Renamed { from, diff } => {
            assert_eq!(from, "a.txt");
            assert_eq!(diff.path, "b.txt");
        }
        change => panic!("unexpected change {change:?}"),
    }
}

#[test]
fn blame_with_start_anchors_untouched_lines() {
    let (history, _) = inserted_then_rewritten();

    let v = history
        .file_blame_with_start("c1", "c3", "f")
        .expect("blame");
    assert_eq!(short(&v), vec!["c1:1", "c3:2", "c1:2"]);
}
