//! Shared helpers for CLI commands

use std::io::Write;

use serde::Serialize;

use crate::{BambooError, Config, ContentGenerator};

/// Build the content generator for `config`.
///
/// Fails before any command output when the provider is unknown or the API
/// key variable is unset.
pub fn build_generator(config: &Config) -> Result<ContentGenerator, BambooError> {
    Ok(ContentGenerator::from_config(config)?)
}

/// Print `value` as JSON or `text` as-is, depending on `json`.
pub fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<(), BambooError> {
    let out = if json {
        super::json_emit::to_json(value)?
    } else {
        text()
    };
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{out}")?;
    Ok(())
}
