//! Per-record delivery
//!
//! Every record gets its own connection: connect, authenticate when a
//! username is configured, insert, close. A single lock covers the whole
//! sequence and the counter update, so deliveries never overlap.

use crate::counters::DeliveryCounters;
use crate::status::StatusSnapshot;
use cdr_core::{
    CallRecord, CdrResult, ConnectionConfig, RecordMapper, StoreConnector, StoreSession,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// Configuration and counters guarded by the delivery lock
#[derive(Debug)]
struct DeliveryState {
    config: ConnectionConfig,
    counters: DeliveryCounters,
}

/// Delivers call records to the datastore one at a time
pub struct DeliveryClient<C: StoreConnector> {
    connector: Arc<C>,
    state: Mutex<DeliveryState>,
}

impl<C: StoreConnector> DeliveryClient<C> {
    /// Create a client with zeroed counters
    pub fn new(connector: Arc<C>, config: ConnectionConfig) -> Self {
        Self {
            connector,
            state: Mutex::new(DeliveryState {
                config,
                counters: DeliveryCounters::default(),
            }),
        }
    }

    /// Deliver one call record
    ///
    /// Fails only when the connection or the authentication fails; both
    /// reset the connection counters. The insert itself is fire-and-forget.
    pub async fn deliver(&self, record: &CallRecord) -> CdrResult<()> {
        debug!("mongodb: Starting delivery of {}", record.unique_id);

        let mut state = self.state.lock().await;

        let mut session = match self.open(&state.config).await {
            Ok(session) => session,
            Err(e) => {
                error!("{}", e);
                state.counters.mark_failed();
                return Err(e);
            }
        };

        debug!("mongodb: Got connection, preparing record");
        let document = RecordMapper::build_document(record, &state.config);

        debug!("mongodb: Inserting a CDR record into {}", state.config.namespace());
        session
            .insert(&state.config.dbname, &state.config.collection, document)
            .await;
        session.close().await;

        state.counters.record_delivered();
        debug!(
            "mongodb: Delivered {} ({} since reconnect, {} total)",
            record.unique_id,
            state.counters.records_since_reconnect,
            state.counters.records_total
        );

        Ok(())
    }

    /// Check that the datastore is reachable with the current settings
    ///
    /// Connects, authenticates when configured, and disconnects again.
    pub async fn probe(&self) -> CdrResult<()> {
        let mut state = self.state.lock().await;

        match self.open(&state.config).await {
            Ok(mut session) => {
                session.close().await;
                state.counters.mark_connected();
                info!(
                    "Connected to MongoDB at {}:{}",
                    state.config.hostname, state.config.port
                );
                Ok(())
            }
            Err(e) => {
                error!("{}", e);
                state.counters.mark_failed();
                Err(e)
            }
        }
    }

    /// Replace the configuration, waiting for any in-flight delivery
    pub async fn reconfigure(&self, config: ConnectionConfig) {
        let mut state = self.state.lock().await;
        debug!("mongodb: Reconfigured for {}", config.namespace());
        state.config = config;
    }

    /// Copy of the current counters
    pub async fn counters(&self) -> DeliveryCounters {
        self.state.lock().await.counters
    }

    /// Read counters and settings for display
    pub async fn snapshot(&self) -> StatusSnapshot {
        let state = self.state.lock().await;
        StatusSnapshot::new(&state.config, &state.counters)
    }

    /// Connect and, when a username is configured, authenticate
    ///
    /// The session is closed again if authentication fails.
    async fn open(&self, config: &ConnectionConfig) -> CdrResult<C::Session> {
        let mut session = self.connector.connect(config).await?;

        if config.requires_auth() {
            if let Err(e) = session
                .authenticate(&config.dbname, &config.username, &config.password)
                .await
            {
                session.close().await;
                return Err(e);
            }
        }

        Ok(session)
    }
}
