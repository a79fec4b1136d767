//! Backend lifecycle
//!
//! Load, reload and unload hooks around the delivery client. While the
//! backend is registered, call records handed to [`CdrBackend::log`] are
//! delivered; otherwise they are refused with [`CdrError::NotRegistered`].

use cdr_core::{CallRecord, CdrError, CdrResult, ConfigLoader, ConfigOutcome, StoreConnector};
use cdr_delivery::{DeliveryClient, StatusReporter};
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Result of a load or reload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Configuration applied and record handling enabled
    Registered,

    /// The file has no `[global]` section; record handling is disabled
    Unregistered,

    /// The file is missing, unreadable or unchanged; nothing was touched
    Skipped,
}

struct BackendState<C: StoreConnector> {
    client: Option<Arc<DeliveryClient<C>>>,
    registered: bool,
    config_modified: Option<SystemTime>,
}

/// The MongoDB CDR backend
pub struct CdrBackend<C: StoreConnector> {
    loader: ConfigLoader,
    connector: Arc<C>,
    state: RwLock<BackendState<C>>,
}

impl<C: StoreConnector> CdrBackend<C> {
    pub fn new(config_path: impl AsRef<Path>, connector: Arc<C>) -> Self {
        Self {
            loader: ConfigLoader::new(config_path),
            connector,
            state: RwLock::new(BackendState {
                client: None,
                registered: false,
                config_modified: None,
            }),
        }
    }

    /// Initial load with fresh counters
    pub async fn load(&self) -> LoadOutcome {
        info!("Starting mongodb module load from {}", self.loader.path());
        self.apply(false).await
    }

    /// Re-read the configuration
    ///
    /// Counters survive a reload. An unchanged file is skipped.
    pub async fn reload(&self) -> LoadOutcome {
        info!("Reloading mongodb module from {}", self.loader.path());
        self.apply(true).await
    }

    /// Stop handling records
    pub async fn unload(&self) {
        let mut state = self.state.write().await;
        if state.registered {
            info!("Unregistered MongoDB CDR handling");
        }
        state.registered = false;
    }

    pub async fn is_registered(&self) -> bool {
        self.state.read().await.registered
    }

    /// Deliver one call record
    pub async fn log(&self, record: &CallRecord) -> CdrResult<()> {
        let client = self.registered_client().await.ok_or(CdrError::NotRegistered)?;
        client.deliver(record).await
    }

    /// Status reporter, while registered
    pub async fn status_reporter(&self) -> Option<StatusReporter<C>> {
        self.registered_client().await.map(StatusReporter::new)
    }

    async fn registered_client(&self) -> Option<Arc<DeliveryClient<C>>> {
        let state = self.state.read().await;
        if state.registered {
            state.client.clone()
        } else {
            None
        }
    }

    async fn apply(&self, reload: bool) -> LoadOutcome {
        let modified = self.loader.modified();

        let client = {
            let mut state = self.state.write().await;

            if reload && modified.is_some() && modified == state.config_modified {
                info!("Config file {} unchanged, skipping", self.loader.path());
                return LoadOutcome::Skipped;
            }

            let config = match self.loader.load() {
                Ok(ConfigOutcome::Loaded(config)) => config,
                Ok(ConfigOutcome::Missing) => return LoadOutcome::Skipped,
                Ok(ConfigOutcome::NoGlobal) => {
                    state.registered = false;
                    state.config_modified = modified;
                    return LoadOutcome::Unregistered;
                }
                Err(e) => {
                    warn!("Unable to load config for mongodb CDR's: {}", e);
                    return LoadOutcome::Skipped;
                }
            };

            let client = match state.client.as_ref() {
                Some(client) if reload => {
                    client.reconfigure(config).await;
                    client.clone()
                }
                _ => Arc::new(DeliveryClient::new(self.connector.clone(), config)),
            };

            state.client = Some(client.clone());
            state.registered = true;
            state.config_modified = modified;
            client
        };

        info!("Registered MongoDB CDR handling");

        // A failed check is logged by the client; records are still accepted.
        let _ = client.probe().await;

        LoadOutcome::Registered
    }
}
