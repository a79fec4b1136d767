//! MongoDB CDR exporter
//!
//! Reads call records as JSON lines from stdin and writes each one to
//! MongoDB. Two operator commands are accepted on the same stream:
//! `cdr mongodb status` and `reload`.

use anyhow::Context;
use cdr_core::config::DEFAULT_CONFIG_FILE;
use cdr_core::{CallRecord, CdrError};
use cdr_delivery::MongoConnector;
use cdr_mongodb::cli::{is_module_command, STATUS_COMMAND};
use cdr_mongodb::{status_command, CdrBackend, LoadOutcome};
use std::env;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging
fn init_tracing() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "cdr_mongodb={},cdr_core={},cdr_delivery={},mongodb=warn",
            log_level, log_level, log_level
        ))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting MongoDB CDR exporter v{}", env!("CARGO_PKG_VERSION"));

    let config_path = env::args()
        .nth(1)
        .or_else(|| env::var("CDR_MONGODB_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

    let backend = Arc::new(CdrBackend::new(
        &config_path,
        Arc::new(MongoConnector::new()),
    ));

    match backend.load().await {
        LoadOutcome::Registered => info!("MongoDB CDR backend loaded from {}", config_path),
        outcome => warn!(
            "MongoDB CDR backend not registered ({:?}), records will be refused",
            outcome
        ),
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut deliveries = JoinSet::new();

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let words: Vec<&str> = line.split_whitespace().collect();
        if is_module_command(&words) {
            println!("{}", status_command(backend.as_ref(), &words).await);
            continue;
        }

        if line == "reload" {
            let outcome = backend.reload().await;
            info!("Reload finished: {:?}", outcome);
            continue;
        }

        let record: CallRecord = match serde_json::from_str(line) {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping malformed record: {}", CdrError::from(e));
                continue;
            }
        };

        let backend = backend.clone();
        deliveries.spawn(async move {
            if let Err(e) = backend.log(&record).await {
                error!(
                    "Record {} not delivered ({}): {}",
                    record.unique_id,
                    e.error_code(),
                    e
                );
            }
        });
    }

    while let Some(result) = deliveries.join_next().await {
        if let Err(e) = result {
            error!("Delivery task failed: {}", e);
        }
    }

    println!(
        "{}",
        status_command(backend.as_ref(), &STATUS_COMMAND).await
    );
    backend.unload().await;

    info!("MongoDB CDR exporter stopped");
    Ok(())
}
