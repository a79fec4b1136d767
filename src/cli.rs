//! Operator commands

use crate::backend::CdrBackend;
use cdr_core::StoreConnector;
use std::fmt;

/// Words of the status command
pub const STATUS_COMMAND: [&str; 3] = ["cdr", "mongodb", "status"];

pub const STATUS_USAGE: &str = "Usage: cdr mongodb status\n       \
                                Shows current connection status for cdr_mongodb";

/// Reported when the backend is not registered
pub const NOT_LOADED: &str = "MongoDB CDR backend is not loaded.";

/// Result of running a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliOutcome {
    Success(String),
    ShowUsage,
}

impl fmt::Display for CliOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliOutcome::Success(output) => f.write_str(output),
            CliOutcome::ShowUsage => f.write_str(STATUS_USAGE),
        }
    }
}

/// Whether `args` addresses this module's commands
pub fn is_module_command(args: &[&str]) -> bool {
    args.starts_with(&STATUS_COMMAND[..2])
}

/// `cdr mongodb status`
pub async fn status_command<C: StoreConnector>(
    backend: &CdrBackend<C>,
    args: &[&str],
) -> CliOutcome {
    if args != STATUS_COMMAND.as_slice() {
        return CliOutcome::ShowUsage;
    }

    match backend.status_reporter().await {
        Some(reporter) => CliOutcome::Success(reporter.snapshot().await.to_string()),
        None => CliOutcome::Success(NOT_LOADED.to_string()),
    }
}
