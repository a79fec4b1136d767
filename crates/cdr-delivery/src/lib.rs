//! MongoDB delivery for the CDR exporter
//!
//! This crate opens a connection per call record, writes the mapped document,
//! and keeps the counters the status command reports.
//!
//! # Architecture
//!
//! ```text
//!   CallRecord
//!       |
//!       v
//!  DeliveryClient ── lock ──> connect -> authenticate -> insert -> close
//!       |                        (StoreConnector / StoreSession)
//!       v
//!  DeliveryCounters ──> StatusReporter
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use cdr_core::{CallRecord, ConnectionConfig};
//! use cdr_delivery::{DeliveryClient, MongoConnector};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = DeliveryClient::new(Arc::new(MongoConnector::new()), ConnectionConfig::default());
//!     client.deliver(&CallRecord::default()).await?;
//!     println!("{}", client.snapshot().await);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod counters;
pub mod mongo;
pub mod status;

pub use client::DeliveryClient;
pub use counters::DeliveryCounters;
pub use mongo::{MongoConnector, MongoSession};
pub use status::{StatusReporter, StatusSnapshot};
