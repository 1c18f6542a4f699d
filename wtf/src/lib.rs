// wtf - crowd-sourced glossary bot
// Soft-delete glossary store, command interpreter and chat gateway.

pub mod chat;
pub mod config;
pub mod error;
pub mod import;
pub mod interpreter;
pub mod store;

pub use config::WtfConfig;
pub use error::{WtfError, WtfResult};
pub use interpreter::Interpreter;
pub use store::{GlossaryStore, SqliteGlossary};
