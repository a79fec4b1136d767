//! MongoDB CDR exporter
//!
//! Host glue around the delivery pipeline: the load/reload/unload lifecycle
//! and the `cdr mongodb status` operator command.

pub mod backend;
pub mod cli;

pub use backend::{CdrBackend, LoadOutcome};
pub use cli::{status_command, CliOutcome};
