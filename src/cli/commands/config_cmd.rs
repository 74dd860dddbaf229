//! Config command implementation
//!
//! Handles `bamboo config` and `bamboo config --json`.

use serde::Serialize;
use std::collections::BTreeMap;

use super::common::emit;
use crate::{BambooError, Config};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigValue {
    value: String,
    source: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigOutput {
    config_path: Option<String>,
    values: BTreeMap<String, ConfigValue>,
}

fn config_output(config: &Config) -> ConfigOutput {
    let values = config
        .effective_config()
        .into_iter()
        .map(|(key, (value, source))| (key, ConfigValue { value, source }))
        .collect();
    ConfigOutput {
        config_path: config.config_path.as_ref().map(|p| p.display().to_string()),
        values,
    }
}

/// Execute the config command. Needs no API key.
pub fn execute_config_command(config: &Config, json: bool) -> Result<(), BambooError> {
    let output = config_output(config);
    emit(json, &output, || {
        let mut lines = vec![format!(
            "Config file: {}",
            output.config_path.as_deref().unwrap_or("(none)")
        )];
        for (key, v) in &output.values {
            lines.push(format!("  {key} = {} [{}]", v.value, v.source));
        }
        lines.join("\n")
    })
}
