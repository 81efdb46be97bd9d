use std::sync::atomic::AtomicBool;

use lineage::*;
use pretty_assertions::assert_eq;
use test_case::test_case;

mod common;
use common::*;

const MAIN: &str = "fn main() {\n    let x = 1;\n    println!(\"{}\", x);\n}\n";

// f: c1 writes MAIN, c2 adds a header, c3 changes the constant, c4 adds a
// footer, c5 only touches g.
fn evolving() -> (History, MemoryBlobs) {
    let with_header = format!("// header\n{MAIN}");
    let changed = with_header.replace("= 1", "= 2");
    let with_footer = format!("{changed}// footer\n");

    Fixture::new()
        .commit("c1", &[("f", Some(MAIN))])
        .commit("c2", &[("f", Some(with_header.as_str()))])
        .commit("c3", &[("f", Some(changed.as_str()))])
        .commit("c4", &[("f", Some(with_footer.as_str()))])
        .commit("c5", &[("g", Some("unrelated\n"))])
        .build()
}

fn run(history: &History, blobs: &MemoryBlobs, source: &str, target: &str, line: u32) -> LinePosition {
    FastForward::new(history, blobs)
        .run("f", source, target, line)
        .expect("fast forward")
}

#[test]
fn stops_before_a_deletion() {
    let (history, blobs) = Fixture::new()
        .commit("c1", &[("f", Some("a\n"))])
        .commit("c2", &[("f", Some("b\n"))])
        .commit("c3", &[("f", None)])
        .build();

    assert_eq!(run(&history, &blobs, "c1", "c3", 1), LinePosition::new("c2", 1));
    assert_eq!(run(&history, &blobs, "c1", "c2", 1), LinePosition::new("c2", 1));
}

#[test_case("c1", 1)]
#[test_case("c1", 4)]
#[test_case("c3", 3)]
#[test_case("c5", 6 ; "commit not touching the file")]
fn identity(commit: &str, line: u32) {
    let (history, blobs) = evolving();

    assert_eq!(run(&history, &blobs, commit, commit, line), LinePosition::new(commit, line));
}

#[test_case(1, 2 ; "first line")]
#[test_case(2, 3 ; "modified line")]
#[test_case(3, 4)]
#[test_case(4, 5 ; "last line")]
fn across_several_commits(line: u32, expected: u32) {
    let (history, blobs) = evolving();

    assert_eq!(run(&history, &blobs, "c1", "c5", line), LinePosition::new("c5", expected));
}

#[test]
fn line_moves_with_an_insertion() {
    let (history, blobs) = Fixture::new()
        .commit("c1", &[("f", Some("x\nz\n"))])
        .commit("c2", &[("f", Some("x\ny\nz\n"))])
        .build();

    assert_eq!(run(&history, &blobs, "c1", "c2", 2), LinePosition::new("c2", 3));
    assert_eq!(run(&history, &blobs, "c1", "c2", 1), LinePosition::new("c2", 1));
}

#[test]
fn aligns_inside_a_rewritten_hunk() {
    let (history, blobs) = Fixture::new()
        .commit("c1", &[("f", Some("a\nfoo(1)\nbar(2)\nb\n"))])
        .commit("c2", &[("f", Some("a\nfoo(10)\nbaz\nbar(20)\nb\n"))])
        .build();

    assert_eq!(run(&history, &blobs, "c1", "c2", 3), LinePosition::new("c2", 4));
    assert_eq!(run(&history, &blobs, "c1", "c2", 4), LinePosition::new("c2", 5));
}

#[test]
fn rejects_bad_lines() {
    let (history, blobs) = evolving();
    let ff = FastForward::new(&history, &blobs);

    assert!(matches!(ff.run("f", "c1", "c5", 0), Err(Error::LineOutOfRange(0))));
    assert!(matches!(ff.run("f", "c1", "c5", 5), Err(Error::LineOutOfRange(5))));
    assert!(matches!(ff.run("f", "c9", "c5", 1), Err(Error::NoSuchCommit(_))));
    assert!(matches!(ff.run("g", "c1", "c5", 1), Err(Error::FileAbsent { .. })));
    assert!(matches!(ff.run("f", "c4", "c2", 1), Err(Error::StartAfterTarget { .. })));
}

#[test]
fn cancelled_before_the_first_step() {
    let (history, blobs) = evolving();
    let cancel = AtomicBool::new(true);

    let r = FastForward::new(&history, &blobs)
        .cancel_on(&cancel)
        .run("f", "c1", "c5", 2);
    assert!(matches!(r, Err(Error::Cancelled)));
}

#[test]
fn blob_errors_surface() {
    let (history, _) = evolving();
    let failing = |_: &str, _: &str| -> std::result::Result<String, BoxError> {
        Err("repository unavailable".into())
    };

    // Unchanged lines never need file contents
    let at = FastForward::new(&history, &failing)
        .run("f", "c1", "c5", 1)
        .expect("fast forward");
    assert_eq!(at, LinePosition::new("c5", 2));

    let r = FastForward::new(&history, &failing).run("f", "c1", "c5", 2);
    assert!(matches!(r, Err(Error::Blob { .. })));
}

#[test]
fn through_a_registry_snapshot() {
    let (history, blobs) = evolving();
    let registry = Registry::new();
    registry.install("repo", history);

    let history = registry.get("repo").expect("installed");
    let at = FastForward::new(history.as_ref(), &blobs)
        .aligner(Aligner::new().max_context(4).skip_penalty(3))
        .run("f", "c2", "c4", 3)
        .expect("fast forward");

    assert_eq!(at, LinePosition::new("c4", 3));
}
