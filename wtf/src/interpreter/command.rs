//! Free-text argument parsing for the `!wtf` command and the passive trigger.
//!
//! Every form is matched against the whole input, anchored at both ends.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::store::ExplanationId;

static RE_IS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)^\s*is(?:\s+(.*))?$").unwrap());
static RE_ADD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*add\s+(\S+)\s+(\S.*?)\s*$").unwrap());
static RE_DETAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*detail(?:\s+(.*))?$").unwrap());
static RE_DELETE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*delete\s+(\d+)\s*$").unwrap());
static RE_REPLACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*replace\s+(\d+)\s+(\S.*?)\s*$").unwrap());
static RE_PASSIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^\s*wtf\s+is(?:\s+(.*))?$").unwrap());

/// A parsed `!wtf` argument string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `is <term>...`; may be empty, which produces no reply.
    Lookup(Vec<String>),
    Add { term: String, explanation: String },
    Detail(Vec<String>),
    Delete(ExplanationId),
    Replace {
        id: ExplanationId,
        explanation: String,
    },
    /// Input matched no form (including empty input).
    Usage,
}

impl Command {
    pub fn parse(argstr: &str) -> Self {
        if let Some(caps) = RE_IS.captures(argstr) {
            return Command::Lookup(split_terms(caps.get(1).map_or("", |m| m.as_str())));
        }
        if let Some(caps) = RE_ADD.captures(argstr) {
            return Command::Add {
                term: caps[1].to_string(),
                explanation: caps[2].trim().to_string(),
            };
        }
        if let Some(caps) = RE_DETAIL.captures(argstr) {
            return Command::Detail(split_terms(caps.get(1).map_or("", |m| m.as_str())));
        }
        if let Some(caps) = RE_DELETE.captures(argstr) {
            return match caps[1].parse() {
                Ok(id) => Command::Delete(id),
                Err(_) => Command::Usage,
            };
        }
        if let Some(caps) = RE_REPLACE.captures(argstr) {
            return match caps[1].parse() {
                Ok(id) => Command::Replace {
                    id,
                    explanation: caps[2].trim().to_string(),
                },
                Err(_) => Command::Usage,
            };
        }
        Command::Usage
    }
}

/// Terms of a passive `wtf is ...` message, or `None` if the text is not one.
pub fn parse_passive(text: &str) -> Option<Vec<String>> {
    RE_PASSIVE
        .captures(text)
        .map(|caps| split_terms(caps.get(1).map_or("", |m| m.as_str())))
}

fn split_terms(rest: &str) -> Vec<String> {
    rest.split_whitespace().map(str::to_string).collect()
}
