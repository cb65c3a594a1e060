//! CLI module

pub mod commands;

use crate::error::Error;

pub fn run() -> anyhow::Result<()> {
    commands::run()
}

/// Process exit code for an error that reached the binary
pub fn exit_code(error: &anyhow::Error) -> u8 {
    match error.downcast_ref::<Error>() {
        Some(e) if e.is_remote() => 2,
        _ => 1,
    }
}
