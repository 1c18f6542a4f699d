//! Batch import of `term<TAB>explanation` lines, e.g. the acronym databases
//! shipped with the BSD `wtf` program.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info};

use crate::error::WtfResult;
use crate::store::GlossaryStore;

/// Author recorded for every imported explanation.
pub const IMPORT_AUTHOR: &str = "importer";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub added: usize,
    pub skipped: usize,
}

impl ImportReport {
    fn merge(&mut self, other: ImportReport) {
        self.added += other.added;
        self.skipped += other.skipped;
    }
}

/// Split a line on its first tab. Lines without a tab or with a blank side
/// are not importable.
pub fn parse_import_line(line: &str) -> Option<(&str, &str)> {
    let (term, explanation) = line.split_once('\t')?;
    let term = term.trim();
    let explanation = explanation.trim();
    if term.is_empty() || explanation.is_empty() {
        return None;
    }
    Some((term, explanation))
}

/// Import every well-formed line from `reader`. Malformed lines, including
/// ones that are not valid UTF-8, are skipped; read and storage failures
/// abort the import.
pub fn import_lines<R: BufRead>(store: &dyn GlossaryStore, reader: R) -> WtfResult<ImportReport> {
    let mut report = ImportReport::default();
    for raw in reader.split(b'\n') {
        let raw = raw?;
        let Ok(line) = std::str::from_utf8(&raw) else {
            debug!("skipping line that is not valid UTF-8");
            report.skipped += 1;
            continue;
        };
        match parse_import_line(line) {
            Some((term, explanation)) => {
                store.add(term, explanation, IMPORT_AUTHOR)?;
                debug!("imported {} - {}", term, explanation);
                report.added += 1;
            }
            None => report.skipped += 1,
        }
    }
    Ok(report)
}

pub fn import_files<P: AsRef<Path>>(
    store: &dyn GlossaryStore,
    paths: &[P],
) -> WtfResult<ImportReport> {
    let mut total = ImportReport::default();
    for path in paths {
        let path = path.as_ref();
        let report = import_lines(store, BufReader::new(File::open(path)?))?;
        info!(
            "imported {} explanations from {} ({} lines skipped)",
            report.added,
            path.display(),
            report.skipped
        );
        total.merge(report);
    }
    Ok(total)
}
