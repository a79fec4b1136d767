//! MongoDB connector
//!
//! Each session owns its own single-connection `Client`, opened directly
//! against the configured host and shut down when the session closes.

use async_trait::async_trait;
use bson::{doc, Document};
use cdr_core::{CdrError, CdrResult, ConnectionConfig, StoreConnector, StoreSession};
use mongodb::options::{ClientOptions, Credential};
use mongodb::Client;
use tracing::{debug, warn};

/// Application name reported to the server
const APP_NAME: &str = "cdr-mongodb";

/// Opens MongoDB sessions
#[derive(Debug, Clone, Default)]
pub struct MongoConnector;

impl MongoConnector {
    pub fn new() -> Self {
        Self
    }
}

/// Run `ping` against `dbname`, forcing the connection handshake
async fn ping(client: &Client, dbname: &str) -> mongodb::error::Result<()> {
    client
        .database(dbname)
        .run_command(doc! { "ping": 1 })
        .await
        .map(|_| ())
}

#[async_trait]
impl StoreConnector for MongoConnector {
    type Session = MongoSession;

    async fn connect(&self, config: &ConnectionConfig) -> CdrResult<MongoSession> {
        let connection_error = |e: mongodb::error::Error| CdrError::Connection {
            host: config.hostname.clone(),
            port: config.port,
            message: e.to_string(),
        };

        debug!("mongodb: Connecting to {}:{}", config.hostname, config.port);

        let uri = format!("mongodb://{}:{}/", config.hostname, config.port);
        let mut options = ClientOptions::parse(&uri).await.map_err(connection_error)?;
        options.app_name = Some(APP_NAME.to_string());
        options.direct_connection = Some(true);
        options.max_pool_size = Some(1);
        options.connect_timeout = Some(config.timeout());
        options.server_selection_timeout = Some(config.timeout());

        let client = Client::with_options(options.clone()).map_err(connection_error)?;
        if let Err(e) = ping(&client, "admin").await {
            client.shutdown().await;
            return Err(connection_error(e));
        }

        Ok(MongoSession {
            client: Some(client),
            options,
        })
    }
}

/// An open MongoDB connection
pub struct MongoSession {
    client: Option<Client>,
    options: ClientOptions,
}

#[async_trait]
impl StoreSession for MongoSession {
    async fn authenticate(
        &mut self,
        dbname: &str,
        username: &str,
        password: &str,
    ) -> CdrResult<()> {
        let auth_error = |e: mongodb::error::Error| CdrError::Authentication {
            dbname: dbname.to_string(),
            username: username.to_string(),
            message: e.to_string(),
        };

        let mut credential = Credential::default();
        credential.username = Some(username.to_string());
        credential.password = Some(password.to_string());
        credential.source = Some(dbname.to_string());

        let mut options = self.options.clone();
        options.credential = Some(credential);

        let client = Client::with_options(options).map_err(auth_error)?;
        if let Err(e) = ping(&client, dbname).await {
            client.shutdown().await;
            return Err(auth_error(e));
        }

        debug!("mongodb: Authenticated to {} as {}", dbname, username);
        if let Some(anonymous) = self.client.replace(client) {
            anonymous.shutdown().await;
        }

        Ok(())
    }

    async fn insert(&mut self, dbname: &str, collection: &str, document: Document) {
        let Some(client) = self.client.as_ref() else {
            warn!("MongoDB session already closed, dropping record");
            return;
        };

        let result = client
            .database(dbname)
            .collection::<Document>(collection)
            .insert_one(document)
            .await;

        if let Err(e) = result {
            warn!("MongoDB insert into {}.{} failed: {}", dbname, collection, e);
        }
    }

    async fn close(&mut self) {
        if let Some(client) = self.client.take() {
            client.shutdown().await;
        }
    }
}
