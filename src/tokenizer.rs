//! Command tokenizer.
//!
//! Shell-style splitting of an agent launch command into `argv`, using POSIX
//! word rules: single quotes preserve everything verbatim, double quotes
//! allow embedded whitespace, a backslash escapes exactly one character. No
//! variable expansion, no globbing, no pipeline operators — `shlex` already
//! implements this subset.

use crate::error::TokenizeError;

/// Split `command` into `(program, args)` using POSIX shell word rules.
///
/// Empty or whitespace-only input fails with [`TokenizeError::EmptyCommand`].
/// Unclosed quotes (or a trailing unescaped backslash) fail with
/// [`TokenizeError::ParseError`].
pub fn tokenize(command: &str) -> Result<(String, Vec<String>), TokenizeError> {
    if command.trim().is_empty() {
        return Err(TokenizeError::EmptyCommand);
    }

    let parts = shlex::split(command).ok_or(TokenizeError::ParseError)?;
    if parts.is_empty() {
        return Err(TokenizeError::EmptyCommand);
    }

    let mut iter = parts.into_iter();
    let program = iter.next().expect("non-empty checked above");
    let args: Vec<String> = iter.collect();
    Ok((program, args))
}
