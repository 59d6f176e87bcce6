//! Status-line classification.
//!
//! The server prefixes every response with a status token. A fixed set of
//! tokens are errors on any command; each command additionally supplies the
//! error tokens it can provoke. Classification is a pure function: the same
//! line always yields the same outcome.

use crate::error::{BeanlineError, Result};

/// Tokens that are errors regardless of the command that was sent.
pub const UNIVERSAL_ERRORS: &[&str] = &[
    "OUT_OF_MEMORY",
    "INTERNAL_ERROR",
    "BAD_FORMAT",
    "UNKNOWN_COMMAND",
];

/// Classify a decoded status line against the universal error table plus
/// the command's own error tokens.
///
/// Returns the line unchanged when it matches no error token, leaving the
/// calling handler step to pattern-match its expected success token(s).
pub fn classify<'a>(line: &'a str, extra_errors: &[&str]) -> Result<&'a str> {
    let token = line.split(' ').next().unwrap_or(line);
    if UNIVERSAL_ERRORS.contains(&token) || extra_errors.contains(&token) {
        return Err(BeanlineError::Protocol(line.to_string()));
    }
    Ok(line)
}
