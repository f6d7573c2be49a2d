//! Mnemonic to resource bindings
//!
//! Aliases come from two places: built-ins registered while the application is composed,
//! and a user file merged over them at startup. Reserved mnemonics (the quit and help
//! families) never resolve through the store.

pub mod types;
pub mod store;

pub use types::{Alias, Origin, HELP_COMMANDS, QUIT_COMMANDS, is_help, is_quit, is_reserved, validate};
pub use store::AliasStore;
