//! MongoDB CDR exporter core library
//!
//! This crate provides the pieces of the exporter that do not touch the
//! network:
//!
//! - The call record model (`CallRecord`, dispositions, AMA flags)
//! - Channel name decomposition
//! - Mapping a call record into the stored document
//! - Configuration loading
//! - The datastore traits the delivery client drives
//! - Unified error handling

pub mod channel;
pub mod config;
pub mod error;
pub mod mapper;
pub mod models;
pub mod traits;

pub use channel::ChannelAddress;
pub use config::{ConfigLoader, ConfigOutcome, ConnectionConfig};
pub use error::CdrError;
pub use mapper::RecordMapper;
pub use models::{AmaFlags, CallRecord, Disposition};
pub use traits::{StoreConnector, StoreSession};

/// Result type alias using CdrError
pub type CdrResult<T> = Result<T, CdrError>;
