use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;
use tempfile::tempdir;

use wtf::store::{Explanation, GlossaryRecord, GlossaryStore, SqliteGlossary};

fn store() -> SqliteGlossary {
    SqliteGlossary::open_in_memory().expect("in-memory glossary")
}

fn explanation(term: &str, text: &str) -> Explanation {
    Explanation {
        term: term.to_string(),
        explanation: text.to_string(),
    }
}

/// Every row, deleted or not, for comparing table state.
fn snapshot(s: &SqliteGlossary, terms: &[&str]) -> Vec<GlossaryRecord> {
    terms
        .iter()
        .flat_map(|t| s.history(t).expect("history"))
        .collect()
}

#[test]
fn test_add_then_find_full_returns_record() {
    let s = store();
    let id = s.add("IMHO", "in my humble opinion", "alice").unwrap();

    let rows = s.find_by_term_full("IMHO", None).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, id);
    assert_eq!(rows[0].term, "IMHO");
    assert_eq!(rows[0].explanation, "in my humble opinion");
    assert_eq!(rows[0].author, "alice");

    let record = s.get_record(id).unwrap().expect("record exists");
    assert!(!record.deleted);
}

#[test]
fn test_find_is_case_insensitive() {
    let s = store();
    s.add("Foo", "a placeholder", "alice").unwrap();

    let upper = s.find_by_term("FOO", None).unwrap();
    let lower = s.find_by_term("foo", None).unwrap();
    let mixed = s.find_by_term("FoO", None).unwrap();
    assert_eq!(upper, vec![explanation("Foo", "a placeholder")]);
    assert_eq!(upper, lower);
    assert_eq!(lower, mixed);
}

#[test]
fn test_find_orders_by_insertion() {
    let s = store();
    for text in ["A", "B", "C"] {
        s.add("ORD", text, "alice").unwrap();
    }
    s.add("OTHER", "unrelated", "bob").unwrap();

    let got: Vec<_> = s
        .find_by_term("ord", None)
        .unwrap()
        .into_iter()
        .map(|e| e.explanation)
        .collect();
    assert_eq!(got, vec!["A", "B", "C"]);
}

#[test]
fn test_brb_scenario() {
    let s = store();
    s.add("BRB", "be right back", "alice").unwrap();
    s.add("BRB", "be right back, sorry", "bob").unwrap();

    assert_eq!(
        s.find_by_term("brb", None).unwrap(),
        vec![
            explanation("BRB", "be right back"),
            explanation("BRB", "be right back, sorry"),
        ]
    );
}

#[test]
fn test_delete_hides_record_and_is_idempotent() {
    let s = store();
    let keep = s.add("X", "kept", "alice").unwrap();
    let gone = s.add("X", "dropped", "alice").unwrap();

    s.delete(gone).unwrap();
    let after_once = snapshot(&s, &["X"]);
    s.delete(gone).unwrap();
    assert_eq!(snapshot(&s, &["X"]), after_once);

    let ids: Vec<_> = s
        .find_by_term_full("x", None)
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![keep]);

    // Still addressable for audit.
    let record = s.get_record(gone).unwrap().expect("soft-deleted record");
    assert!(record.deleted);
    assert_eq!(s.get_term_by_id(gone).unwrap(), None);
}

#[test]
fn test_delete_unknown_id_is_noop() {
    let s = store();
    s.add("X", "kept", "alice").unwrap();
    let before = snapshot(&s, &["X"]);
    s.delete(9999).unwrap();
    assert_eq!(snapshot(&s, &["X"]), before);
    assert_eq!(s.record_count().unwrap(), 1);
}

#[test]
fn test_get_term_by_id() {
    let s = store();
    let id = s.add("Gg", "good game", "alice").unwrap();
    assert_eq!(s.get_term_by_id(id).unwrap(), Some("Gg".to_string()));
    assert_eq!(s.get_term_by_id(id + 100).unwrap(), None);
}

#[test]
fn test_replace_retires_old_id() {
    let s = store();
    let old = s.add("TLA", "three letter acronym", "alice").unwrap();

    let replaced = s
        .replace(old, "three-letter abbreviation", "bob")
        .unwrap()
        .expect("live id");
    assert_eq!(replaced.term, "TLA");
    assert!(replaced.new_id > old);

    let rows = s.find_by_term_full("tla", None).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, replaced.new_id);
    assert_eq!(rows[0].explanation, "three-letter abbreviation");
    assert_eq!(rows[0].author, "bob");

    // History keeps the retired explanation under its old id.
    let history = s.history("TLA").unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, old);
    assert!(history[0].deleted);
    assert!(!history[1].deleted);
}

#[test]
fn test_replace_missing_or_deleted_changes_nothing() {
    let s = store();
    let id = s.add("Y", "why", "alice").unwrap();
    s.delete(id).unwrap();
    let before = snapshot(&s, &["Y"]);

    assert_eq!(s.replace(id, "new", "bob").unwrap(), None);
    assert_eq!(s.replace(424242, "new", "bob").unwrap(), None);

    assert_eq!(snapshot(&s, &["Y"]), before);
    assert_eq!(s.record_count().unwrap(), 1);
}

#[test]
fn test_replace_preserves_stored_term_case() {
    let s = store();
    let id = s.add("LoL", "laughing out loud", "alice").unwrap();
    let replaced = s.replace(id, "league of legends", "bob").unwrap().unwrap();
    assert_eq!(replaced.term, "LoL");
    assert_eq!(
        s.find_by_term("LOL", None).unwrap(),
        vec![explanation("LoL", "league of legends")]
    );
}

#[test]
fn test_concurrent_writers_are_linearized() {
    let dir = tempdir().unwrap();
    let s = Arc::new(SqliteGlossary::open(&dir.path().join("wtf.db")).expect("open"));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let s = s.clone();
            thread::spawn(move || {
                for i in 0..25 {
                    s.add("CONC", &format!("{}-{}", t, i), "writer").unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let rows = s.find_by_term_full("conc", None).unwrap();
    assert_eq!(rows.len(), 100);
    assert!(rows.windows(2).all(|w| w[0].id < w[1].id));
}

#[test]
fn test_replace_never_leaves_term_without_explanation() {
    let s = Arc::new(store());
    let first = s.add("LIVE", "v0", "alice").unwrap();

    let writer = {
        let s = s.clone();
        thread::spawn(move || {
            let mut id = first;
            for i in 1..50 {
                id = s
                    .replace(id, &format!("v{}", i), "alice")
                    .unwrap()
                    .expect("live id")
                    .new_id;
            }
        })
    };

    for _ in 0..200 {
        assert_eq!(s.find_by_term("live", None).unwrap().len(), 1);
    }
    writer.join().unwrap();
    assert_eq!(
        s.find_by_term("live", None).unwrap(),
        vec![explanation("LIVE", "v49")]
    );
}
