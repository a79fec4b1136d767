//! Datastore abstractions
//!
//! The delivery client drives a connector through one short-lived session per
//! record. The production implementation talks to MongoDB; tests plug in
//! in-memory fakes.

use crate::config::ConnectionConfig;
use crate::error::CdrError;
use async_trait::async_trait;
use bson::Document;

/// Opens sessions against the datastore
#[async_trait]
pub trait StoreConnector: Send + Sync + 'static {
    type Session: StoreSession;

    /// Open a session to `config.hostname:config.port`
    ///
    /// Must fail with [`CdrError::Connection`] when the server cannot be
    /// reached.
    async fn connect(&self, config: &ConnectionConfig) -> Result<Self::Session, CdrError>;
}

/// One open connection to the datastore
#[async_trait]
pub trait StoreSession: Send {
    /// Authenticate against `dbname`
    ///
    /// Must fail with [`CdrError::Authentication`] when the credentials are
    /// rejected.
    async fn authenticate(
        &mut self,
        dbname: &str,
        username: &str,
        password: &str,
    ) -> Result<(), CdrError>;

    /// Write one document into `dbname.collection`
    ///
    /// Fire-and-forget: implementations log failures and return normally.
    async fn insert(&mut self, dbname: &str, collection: &str, document: Document);

    /// Release the connection
    async fn close(&mut self);
}
