use std::io::Cursor;
use std::sync::Arc;

use pretty_assertions::assert_eq;

use wtf::import::{import_files, import_lines, ImportReport, IMPORT_AUTHOR};
use wtf::interpreter::{Interpreter, GENERIC_FAILURE_REPLY};
use wtf::store::{GlossaryStore, SqliteGlossary};

fn setup() -> (Arc<SqliteGlossary>, Interpreter) {
    let store = Arc::new(SqliteGlossary::open_in_memory().expect("in-memory glossary"));
    let interpreter = Interpreter::new(store.clone());
    (store, interpreter)
}

fn run(interp: &Interpreter, argstr: &str, sender: &str) -> String {
    interp
        .execute(argstr, sender)
        .expect("command succeeds")
        .expect("command replies")
}

#[test]
fn test_add_then_lookup() {
    let (_, interp) = setup();
    assert_eq!(
        run(&interp, "add BRB be right back", "alice"),
        "Added explanation: BRB — be right back"
    );
    assert_eq!(run(&interp, "is brb", "bob"), "BRB — be right back");
}

#[test]
fn test_batch_lookup_with_missing_term() {
    let (_, interp) = setup();
    run(&interp, "add BRB be right back", "alice");
    run(&interp, "add BRB be right back, sorry", "bob");

    assert_eq!(
        run(&interp, "is BRB XYZ", "carol"),
        "BRB — be right back\nBRB — be right back, sorry\n'XYZ' not found."
    );
}

#[test]
fn test_detail_lists_ids_and_authors() {
    let (store, interp) = setup();
    let a = store.add("AFK", "away from keyboard", "alice").unwrap();
    let b = store.add("afk", "a fine kettle", "bob").unwrap();

    assert_eq!(
        run(&interp, "detail AFK nope", "carol"),
        format!(
            "{}: AFK — away from keyboard (by alice)\n{}: afk — a fine kettle (by bob)\n'nope' not found.",
            a, b
        )
    );
}

#[test]
fn test_delete_reports_success_even_for_unknown_id() {
    let (store, interp) = setup();
    let id = store.add("X", "ex", "alice").unwrap();

    assert_eq!(run(&interp, "delete 9999", "bob"), "Deleted.");
    assert_eq!(store.record_count().unwrap(), 1);
    assert_eq!(run(&interp, "is x", "bob"), "X — ex");

    assert_eq!(run(&interp, &format!("delete {}", id), "bob"), "Deleted.");
    assert_eq!(run(&interp, "is x", "bob"), "'x' not found.");
}

#[test]
fn test_replace_command() {
    let (store, interp) = setup();
    let id = store.add("TIL", "today i learned", "alice").unwrap();

    assert_eq!(
        run(&interp, &format!("replace {} today I learned", id), "bob"),
        "Changed explanation: TIL — today I learned"
    );
    assert_eq!(run(&interp, "is til", "carol"), "TIL — today I learned");
    assert_eq!(
        run(&interp, &format!("replace {} again", id), "bob"),
        format!("No explanation with id {} exists.", id)
    );

    let details = store.find_by_term_full("til", None).unwrap();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0].author, "bob");
}

#[test]
fn test_passive_trigger_shares_lookup_output() {
    let (_, interp) = setup();
    run(&interp, "add IDK I don't know", "alice");

    let passive = interp.passive("WTF is idk nah").unwrap();
    let command = interp.execute("is idk nah", "bob").unwrap();
    assert_eq!(passive, command);
    assert_eq!(passive.unwrap(), "IDK — I don't know\n'nah' not found.");
}

#[test]
fn test_usage_for_unrecognized_input() {
    let (_, interp) = setup();
    for input in ["", "   ", "explain BRB", "delete abc", "add BRB"] {
        assert_eq!(run(&interp, input, "alice"), interp.usage());
    }
}

#[test]
fn test_respond_wraps_rejected_input() {
    // An author made of whitespace is rejected by the store.
    let (store, interp) = setup();
    assert_eq!(
        interp.respond_command("add X something", "   "),
        Some(GENERIC_FAILURE_REPLY.to_string())
    );
    assert_eq!(store.record_count().unwrap(), 0);
}

#[test]
fn test_import_skips_malformed_lines() {
    let (store, interp) = setup();
    let input = "FOO\tbar baz\nmalformed line without tab\nBAR\tqux\n";

    let report = import_lines(store.as_ref(), Cursor::new(input)).unwrap();
    assert_eq!(report, ImportReport { added: 2, skipped: 1 });
    assert_eq!(store.record_count().unwrap(), 2);

    let foo = store.find_by_term_full("foo", None).unwrap();
    assert_eq!(foo[0].explanation, "bar baz");
    assert_eq!(foo[0].author, IMPORT_AUTHOR);
    assert_eq!(run(&interp, "is bar", "alice"), "BAR — qux");
}

#[test]
fn test_import_files_sums_reports() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("acronyms");
    let b = dir.path().join("acronyms.comp");
    std::fs::write(&a, "AFAIK\tas far as I know\n# comment\n").unwrap();
    std::fs::write(&b, "CPU\tcentral processing unit\nRAM\trandom access memory\n").unwrap();

    let (store, _) = setup();
    let report = import_files(store.as_ref(), &[a, b]).unwrap();
    assert_eq!(report, ImportReport { added: 3, skipped: 1 });
}

#[test]
fn test_import_skips_invalid_utf8_line_and_continues() {
    let (store, interp) = setup();
    let mut input = b"FOO\tbar baz\n".to_vec();
    input.extend_from_slice(b"BAD\t\xff\xfe caf\xe9\n");
    input.extend_from_slice(b"BAR\tqux\n");

    let report = import_lines(store.as_ref(), Cursor::new(input)).unwrap();
    assert_eq!(report, ImportReport { added: 2, skipped: 1 });
    assert_eq!(store.record_count().unwrap(), 2);
    assert_eq!(run(&interp, "is bar", "alice"), "BAR — qux");
    assert_eq!(run(&interp, "is bad", "alice"), "'bad' not found.");
}
