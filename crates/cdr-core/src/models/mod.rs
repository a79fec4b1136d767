//! Domain models for the CDR exporter

pub mod record;

pub use record::{AmaFlags, CallRecord, Disposition};
