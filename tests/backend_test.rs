// tests/backend_test.rs
//
// Backend lifecycle and operator command, driven through an in-memory store.

use async_trait::async_trait;
use bson::Document;
use cdr_core::{CallRecord, CdrError, CdrResult, ConnectionConfig, StoreConnector, StoreSession};
use cdr_mongodb::cli::{is_module_command, NOT_LOADED, STATUS_COMMAND, STATUS_USAGE};
use cdr_mongodb::{status_command, CdrBackend, CliOutcome, LoadOutcome};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

#[derive(Default)]
struct MemoryStore {
    refuse_connect: AtomicBool,
    documents: Mutex<Vec<(String, Document)>>,
}

impl MemoryStore {
    fn documents(&self) -> Vec<(String, Document)> {
        self.documents.lock().unwrap().clone()
    }
}

struct MemoryConnector {
    store: Arc<MemoryStore>,
}

struct MemorySession {
    store: Arc<MemoryStore>,
}

#[async_trait]
impl StoreConnector for MemoryConnector {
    type Session = MemorySession;

    async fn connect(&self, config: &ConnectionConfig) -> CdrResult<MemorySession> {
        if self.store.refuse_connect.load(Ordering::SeqCst) {
            return Err(CdrError::Connection {
                host: config.hostname.clone(),
                port: config.port,
                message: "connection refused".to_string(),
            });
        }
        Ok(MemorySession {
            store: self.store.clone(),
        })
    }
}

#[async_trait]
impl StoreSession for MemorySession {
    async fn authenticate(&mut self, _: &str, _: &str, _: &str) -> CdrResult<()> {
        Ok(())
    }

    async fn insert(&mut self, dbname: &str, collection: &str, document: Document) {
        self.store
            .documents
            .lock()
            .unwrap()
            .push((format!("{}.{}", dbname, collection), document));
    }

    async fn close(&mut self) {}
}

fn backend(path: &Path) -> (Arc<MemoryStore>, CdrBackend<MemoryConnector>) {
    let store = Arc::new(MemoryStore::default());
    let connector = Arc::new(MemoryConnector {
        store: store.clone(),
    });
    (store, CdrBackend::new(path, connector))
}

fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("cdr_mongodb.conf");
    fs::write(&path, contents).unwrap();
    path
}

/// Rewrite the file and push its mtime forward so a reload sees the change
fn rewrite_config(path: &Path, contents: &str) {
    fs::write(path, contents).unwrap();
    let later = SystemTime::now() + Duration::from_secs(60);
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(later)
        .unwrap();
}

fn record(unique_id: &str) -> CallRecord {
    CallRecord {
        unique_id: unique_id.to_string(),
        channel: "SIP/100-00000001".to_string(),
        dst_channel: "PJSIP/trunk-00000002".to_string(),
        ..CallRecord::default()
    }
}

#[tokio::test]
async fn test_missing_config_refuses_records() {
    let dir = TempDir::new().unwrap();
    let (store, backend) = backend(&dir.path().join("absent.conf"));

    assert_eq!(backend.load().await, LoadOutcome::Skipped);
    assert!(!backend.is_registered().await);

    let err = backend.log(&record("1.1")).await.unwrap_err();
    assert!(matches!(err, CdrError::NotRegistered));
    assert!(store.documents().is_empty());

    assert_eq!(
        status_command(&backend, &STATUS_COMMAND).await,
        CliOutcome::Success(NOT_LOADED.to_string())
    );
}

#[tokio::test]
async fn test_config_without_global_is_unregistered() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[other]\nhostname=db1\n");
    let (_store, backend) = backend(&path);

    assert_eq!(backend.load().await, LoadOutcome::Unregistered);
    assert!(!backend.is_registered().await);
    assert!(backend.log(&record("1.2")).await.is_err());
}

#[tokio::test]
async fn test_empty_global_section_is_unregistered() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[global]\n");
    let (store, backend) = backend(&path);

    assert_eq!(backend.load().await, LoadOutcome::Unregistered);
    assert!(!backend.is_registered().await);
    assert!(matches!(
        backend.log(&record("1.3")).await,
        Err(CdrError::NotRegistered)
    ));
    assert!(store.documents().is_empty());
}

#[tokio::test]
async fn test_load_registers_and_delivers() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[global]\ndbname=pbx\ncollection=calls\n");
    let (store, backend) = backend(&path);

    assert_eq!(backend.load().await, LoadOutcome::Registered);
    assert!(backend.is_registered().await);

    let snapshot = backend.status_reporter().await.unwrap().snapshot().await;
    assert!(snapshot.connected);
    assert_eq!(snapshot.records_total, 0);

    backend.log(&record("2.1")).await.unwrap();
    backend.log(&record("2.2")).await.unwrap();

    let documents = store.documents();
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0].0, "pbx.calls");
    assert_eq!(documents[1].1.get_str("uniqueid").unwrap(), "2.2");
    assert_eq!(documents[1].1.get_str("dstchanneltype").unwrap(), "PJSIP");

    assert_eq!(
        status_command(&backend, &STATUS_COMMAND).await.to_string(),
        "Connected to pbx.calls on localhost\n  Wrote 2 records since last restart."
    );
}

#[tokio::test]
async fn test_unreachable_server_still_registers() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[global]\nhostname=db1\nport=27018\n");
    let (store, backend) = backend(&path);
    store.refuse_connect.store(true, Ordering::SeqCst);

    assert_eq!(backend.load().await, LoadOutcome::Registered);
    assert_eq!(
        status_command(&backend, &STATUS_COMMAND).await.to_string(),
        "Not currently connected to a MongoDB server."
    );

    let err = backend.log(&record("3.1")).await.unwrap_err();
    assert!(err.is_connection_failure());

    store.refuse_connect.store(false, Ordering::SeqCst);
    backend.log(&record("3.2")).await.unwrap();
    assert_eq!(
        status_command(&backend, &STATUS_COMMAND).await.to_string(),
        "Connected to astriskcdrdb.cdr on db1, port 27018\n  Wrote 1 records since last restart."
    );
}

#[tokio::test]
async fn test_reload_keeps_counters_and_applies_custom_fields() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[global]\ncollection=cdr\n");
    let (store, backend) = backend(&path);

    backend.load().await;
    backend.log(&record("4.1")).await.unwrap();

    store.refuse_connect.store(true, Ordering::SeqCst);
    assert!(backend.log(&record("4.2")).await.is_err());
    store.refuse_connect.store(false, Ordering::SeqCst);

    rewrite_config(&path, "[global]\ncollection=calls\ncustomfields=campaign, agent\n");
    assert_eq!(backend.reload().await, LoadOutcome::Registered);

    let call = record("4.3")
        .with_variable("campaign", "spring")
        .with_variable("agent", "1001");
    backend.log(&call).await.unwrap();

    let documents = store.documents();
    let (namespace, document) = documents.last().unwrap();
    assert_eq!(namespace, "astriskcdrdb.calls");
    assert_eq!(document.get_str("campaign").unwrap(), "spring");
    assert_eq!(document.get_str("agent").unwrap(), "1001");

    assert_eq!(
        status_command(&backend, &STATUS_COMMAND).await.to_string(),
        "Connected to astriskcdrdb.calls on localhost\n  \
         Wrote 2 records since last restart and 1 records since last reconnect."
    );
}

#[tokio::test]
async fn test_unchanged_reload_is_skipped() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[global]\nhostname=localhost\n");
    let (_store, backend) = backend(&path);

    assert_eq!(backend.load().await, LoadOutcome::Registered);
    assert_eq!(backend.reload().await, LoadOutcome::Skipped);
    assert!(backend.is_registered().await);
}

#[tokio::test]
async fn test_reload_with_missing_file_keeps_registration() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[global]\nhostname=localhost\n");
    let (_store, backend) = backend(&path);

    backend.load().await;
    fs::remove_file(&path).unwrap();

    assert_eq!(backend.reload().await, LoadOutcome::Skipped);
    assert!(backend.is_registered().await);
    backend.log(&record("5.1")).await.unwrap();
}

#[tokio::test]
async fn test_reload_without_global_unregisters() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[global]\nhostname=localhost\n");
    let (_store, backend) = backend(&path);

    backend.load().await;
    rewrite_config(&path, "[general]\nenabled=yes\n");

    assert_eq!(backend.reload().await, LoadOutcome::Unregistered);
    assert!(matches!(
        backend.log(&record("6.1")).await,
        Err(CdrError::NotRegistered)
    ));
}

#[tokio::test]
async fn test_unload_stops_delivery() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[global]\nhostname=localhost\n");
    let (store, backend) = backend(&path);

    backend.load().await;
    backend.unload().await;

    assert!(!backend.is_registered().await);
    assert!(backend.log(&record("7.1")).await.is_err());
    assert!(store.documents().is_empty());
}

#[tokio::test]
async fn test_status_command_arguments() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[global]\nhostname=localhost\n");
    let (_store, backend) = backend(&path);
    backend.load().await;

    assert_eq!(
        status_command(&backend, &["cdr", "mongodb"]).await,
        CliOutcome::ShowUsage
    );
    assert_eq!(
        status_command(&backend, &["cdr", "mongodb", "status", "extra"]).await,
        CliOutcome::ShowUsage
    );
    assert_eq!(CliOutcome::ShowUsage.to_string(), STATUS_USAGE);

    assert!(is_module_command(&["cdr", "mongodb", "status"]));
    assert!(is_module_command(&["cdr", "mongodb"]));
    assert!(!is_module_command(&["cdr", "show", "status"]));
    assert!(!is_module_command(&["reload"]));
}
