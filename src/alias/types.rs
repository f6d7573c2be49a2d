use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{LensError, LensResult};

/// Mnemonics that terminate the interactive loop
pub const QUIT_COMMANDS: &[&str] = &["q", "q!", "Q", "quit"];

/// Mnemonics that open the help view
pub const HELP_COMMANDS: &[&str] = &["?", "h", "help"];

static MNEMONIC_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A[A-Za-z0-9][A-Za-z0-9:_!?.-]*\z").expect("valid mnemonic pattern"));

/// Where an alias came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    BuiltIn,
    User,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::BuiltIn => f.write_str("built-in"),
            Origin::User => f.write_str("user"),
        }
    }
}

/// A mnemonic-to-resource binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub mnemonic: String,
    pub resource: String,
    pub origin: Origin,
}

impl Alias {
    pub fn new(mnemonic: &str, resource: &str, origin: Origin) -> Self {
        Self {
            mnemonic: mnemonic.to_string(),
            resource: resource.to_string(),
            origin,
        }
    }
}

pub fn is_quit(mnemonic: &str) -> bool {
    QUIT_COMMANDS.contains(&mnemonic)
}

pub fn is_help(mnemonic: &str) -> bool {
    HELP_COMMANDS.contains(&mnemonic)
}

/// Reserved mnemonics bypass alias resolution entirely
pub fn is_reserved(mnemonic: &str) -> bool {
    is_quit(mnemonic) || is_help(mnemonic)
}

/// Check that a binding may enter the store
pub fn validate(mnemonic: &str, resource: &str) -> LensResult<()> {
    let reject = |reason: &str| LensError::MalformedAlias {
        mnemonic: mnemonic.to_string(),
        reason: reason.to_string(),
    };

    if is_reserved(mnemonic) {
        return Err(reject("mnemonic is reserved"));
    }
    if !MNEMONIC_RX.is_match(mnemonic) {
        return Err(reject("mnemonic must be a single word"));
    }
    if resource.trim().is_empty() {
        return Err(reject("resource is empty"));
    }
    if resource.chars().any(char::is_whitespace) {
        return Err(reject("resource contains whitespace"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved() {
        for m in ["q", "q!", "Q", "quit", "?", "h", "help"] {
            assert!(is_reserved(m), "{m} should be reserved");
        }
        assert!(!is_reserved("ec2"));
        assert!(!is_reserved("H"));
    }

    #[test]
    fn test_validate() {
        assert!(validate("ec2", "ec2").is_ok());
        assert!(validate("iam:u", "iam:u").is_ok());
        assert!(validate("q", "ec2").is_err());
        assert!(validate("two words", "ec2").is_err());
        assert!(validate("", "ec2").is_err());
        assert!(validate("ec2", "").is_err());
        assert!(validate("ec2", "ec 2").is_err());
    }
}
