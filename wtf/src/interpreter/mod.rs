//! Turns one line of chat text into a glossary operation and a reply.
//!
//! Two entry points share the same batch lookup:
//! - the directed command (`!wtf is ...`, `!wtf add ...`, ...), and
//! - the passive trigger (`wtf is ...` anywhere as a whole message).
//!
//! `execute`/`passive` surface storage failures as `Err`; `respond_*` wrap
//! them, log the failure and answer with a generic reply instead.

pub mod command;
pub mod format;

pub use command::{parse_passive, Command};

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::GeneralConfig;
use crate::error::WtfResult;
use crate::store::{ExplanationId, GlossaryStore, LookupLimit};

pub const DEFAULT_COMMAND: &str = "!wtf";
pub const DEFAULT_LOOKUP_LIMIT: u32 = 25;
pub const GENERIC_FAILURE_REPLY: &str = "Sorry, something went wrong.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LookupStyle {
    Plain,
    Detailed,
}

pub struct Interpreter {
    store: Arc<dyn GlossaryStore>,
    command: String,
    lookup_limit: LookupLimit,
}

impl Interpreter {
    pub fn new(store: Arc<dyn GlossaryStore>) -> Self {
        Self {
            store,
            command: DEFAULT_COMMAND.to_string(),
            lookup_limit: Some(DEFAULT_LOOKUP_LIMIT),
        }
    }

    pub fn from_config(store: Arc<dyn GlossaryStore>, config: &GeneralConfig) -> Self {
        Self::new(store)
            .with_command(config.command.clone())
            .with_lookup_limit(config.lookup_limit())
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    pub fn with_lookup_limit(mut self, limit: LookupLimit) -> Self {
        self.lookup_limit = limit;
        self
    }

    /// The directed-command prefix, e.g. `!wtf`.
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn usage(&self) -> String {
        let c = &self.command;
        format!(
            "Usage:\n\
             {c} is <term> [<term> ...] - look up one or more terms\n\
             {c} add <term> <explanation> - add a new explanation\n\
             {c} detail <term> [<term> ...] - show ids and authors of a term's explanations\n\
             {c} delete <id> - delete the explanation with that id (find it using {c} detail)\n\
             {c} replace <id> <explanation> - replace the explanation with that id"
        )
    }

    /// Handle the argument string of a directed command sent by `sender`.
    ///
    /// `Ok(None)` means no reply should be sent.
    pub fn execute(&self, argstr: &str, sender: &str) -> WtfResult<Option<String>> {
        match Command::parse(argstr) {
            Command::Lookup(terms) => self.batch_lookup(&terms, LookupStyle::Plain),
            Command::Detail(terms) => self.batch_lookup(&terms, LookupStyle::Detailed),
            Command::Add { term, explanation } => {
                let id = self.store.add(&term, &explanation, sender)?;
                info!(
                    "{} added explanation #{}: {} - {}",
                    sender, id, term, explanation
                );
                Ok(Some(format!("Added explanation: {} — {}", term, explanation)))
            }
            Command::Delete(id) => {
                self.store.delete(id)?;
                info!("{} deleted explanation with id {}", sender, id);
                Ok(Some("Deleted.".to_string()))
            }
            Command::Replace { id, explanation } => self.replace(id, &explanation, sender),
            Command::Usage => Ok(Some(self.usage())),
        }
    }

    /// Handle an ordinary chat message; only `wtf is ...` produces a reply.
    pub fn passive(&self, text: &str) -> WtfResult<Option<String>> {
        match parse_passive(text) {
            Some(terms) => self.batch_lookup(&terms, LookupStyle::Plain),
            None => Ok(None),
        }
    }

    pub fn respond_command(&self, argstr: &str, sender: &str) -> Option<String> {
        Self::or_generic_failure(self.execute(argstr, sender))
    }

    pub fn respond_passive(&self, text: &str) -> Option<String> {
        Self::or_generic_failure(self.passive(text))
    }

    fn or_generic_failure(result: WtfResult<Option<String>>) -> Option<String> {
        match result {
            Ok(reply) => reply,
            Err(e) if e.is_storage() => {
                error!("glossary storage failure: {}", e);
                Some(GENERIC_FAILURE_REPLY.to_string())
            }
            Err(e) => {
                warn!("glossary request rejected: {}", e);
                Some(GENERIC_FAILURE_REPLY.to_string())
            }
        }
    }

    fn replace(
        &self,
        id: ExplanationId,
        explanation: &str,
        sender: &str,
    ) -> WtfResult<Option<String>> {
        let reply = match self.store.replace(id, explanation, sender)? {
            Some(replaced) => {
                info!(
                    "{} replaced explanation #{} with #{}: {} - {}",
                    sender, id, replaced.new_id, replaced.term, explanation
                );
                format!("Changed explanation: {} — {}", replaced.term, explanation)
            }
            None => format!("No explanation with id {} exists.", id),
        };
        Ok(Some(reply))
    }

    fn batch_lookup(&self, terms: &[String], style: LookupStyle) -> WtfResult<Option<String>> {
        if terms.is_empty() {
            return Ok(None);
        }

        let mut lines = Vec::new();
        for term in terms {
            let found = match style {
                LookupStyle::Plain => {
                    let rows = self.store.find_by_term(term, self.lookup_limit)?;
                    lines.extend(rows.iter().map(format::explanation_line));
                    rows.len()
                }
                LookupStyle::Detailed => {
                    let rows = self.store.find_by_term_full(term, self.lookup_limit)?;
                    lines.extend(rows.iter().map(format::detail_line));
                    rows.len()
                }
            };
            debug!("lookup {:?} ({:?}) -> {} rows", term, style, found);
            if found == 0 {
                lines.push(format::not_found_line(term));
            }
        }
        Ok(Some(lines.join("\n")))
    }
}
