//! Operator-facing connection status

use crate::client::DeliveryClient;
use crate::counters::DeliveryCounters;
use cdr_core::config::DEFAULT_PORT;
use cdr_core::{ConnectionConfig, StoreConnector};
use std::fmt;
use std::sync::Arc;

/// Point-in-time view of the delivery counters and target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// Whether the last connection attempt succeeded
    pub connected: bool,

    /// Records written since the last connection failure
    pub records_since_reconnect: u64,

    /// Records written since the process started
    pub records_total: u64,

    /// `dbname.collection` records are written to
    pub namespace: String,

    pub hostname: String,

    pub port: u16,
}

impl StatusSnapshot {
    /// Capture the target from `config` and a copy of `counters`
    pub fn new(config: &ConnectionConfig, counters: &DeliveryCounters) -> Self {
        Self {
            connected: counters.connected,
            records_since_reconnect: counters.records_since_reconnect,
            records_total: counters.records_total,
            namespace: config.namespace(),
            hostname: config.hostname.clone(),
            port: config.port,
        }
    }
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.connected {
            return f.write_str("Not currently connected to a MongoDB server.");
        }

        write!(f, "Connected to {} on {}", self.namespace, self.hostname)?;
        if self.port != DEFAULT_PORT {
            write!(f, ", port {}", self.port)?;
        }
        f.write_str("\n")?;

        if self.records_since_reconnect == self.records_total {
            write!(
                f,
                "  Wrote {} records since last restart.",
                self.records_total
            )
        } else {
            write!(
                f,
                "  Wrote {} records since last restart and {} records since last reconnect.",
                self.records_total, self.records_since_reconnect
            )
        }
    }
}

/// Read-only access to a delivery client's status
pub struct StatusReporter<C: StoreConnector> {
    client: Arc<DeliveryClient<C>>,
}

impl<C: StoreConnector> StatusReporter<C> {
    /// Report on `client`
    pub fn new(client: Arc<DeliveryClient<C>>) -> Self {
        Self { client }
    }

    /// Current counters and target, read under the delivery lock
    pub async fn snapshot(&self) -> StatusSnapshot {
        self.client.snapshot().await
    }
}
