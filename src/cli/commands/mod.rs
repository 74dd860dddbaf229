//! CLI command implementations (facade).
//!
//! This module re-exports the command surface used by `run.rs` and CLI tests.
//! Implementations live in `commands/*`.

mod common;
mod config_cmd;
mod console;
mod feed;
mod intercept;
mod json_emit;
mod render;
mod simulate;

pub use config_cmd::execute_config_command;
pub use console::{Console, Flow, execute_console_command};
pub use feed::execute_feed_command;
pub use intercept::execute_intercept_command;
pub use simulate::{Simulation, execute_simulate_command, simulate_post};

pub use common::build_generator;
pub use json_emit::to_json;
