//! Output sinks for extracted records.
//!
//! Every record scraped from a target page is fanned out to all configured
//! sinks concurrently. A sink owns its buffering and durability; the worker
//! only logs and counts sink failures, it never retries them.

use crate::error::CrawlError;
use crate::schema::Record;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::info;

/// An output destination for extracted records.
#[async_trait]
pub trait Sink: Send + Sync {
    /// A short name used in logs and error reports.
    fn name(&self) -> &str;

    async fn emit(&self, record: &Record) -> Result<(), CrawlError>;

    /// Called once after the crawl finishes so sinks can flush.
    async fn close(&self) -> Result<(), CrawlError> {
        Ok(())
    }
}

/// Writes each record to stdout as pretty-printed JSON.
#[derive(Debug, Default)]
pub struct ConsoleSink;

#[async_trait]
impl Sink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    async fn emit(&self, record: &Record) -> Result<(), CrawlError> {
        println!("{}", serde_json::to_string_pretty(record)?);
        Ok(())
    }
}

/// Appends one JSON object per line to a file.
pub struct JsonLinesSink {
    path: PathBuf,
    file: tokio::sync::Mutex<Option<tokio::fs::File>>,
}

impl JsonLinesSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file: tokio::sync::Mutex::new(None),
        }
    }
}

#[async_trait]
impl Sink for JsonLinesSink {
    fn name(&self) -> &str {
        "json-lines"
    }

    async fn emit(&self, record: &Record) -> Result<(), CrawlError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut guard = self.file.lock().await;
        if guard.is_none() {
            let file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            *guard = Some(file);
        }
        let file = guard.as_mut().ok_or_else(|| {
            CrawlError::Sink {
                sink: "json-lines".to_string(),
                message: "file handle unavailable".to_string(),
            }
        })?;
        file.write_all(&line).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), CrawlError> {
        if let Some(file) = self.file.lock().await.as_mut() {
            file.flush().await?;
            info!(path = %self.path.display(), "json-lines sink flushed");
        }
        Ok(())
    }
}

/// Invokes an in-process callback for each record.
///
/// This is the "scraped data" notification folded into the sink contract:
/// a callback is just another output destination.
pub struct CallbackSink {
    callback: Mutex<Box<dyn FnMut(&Record) + Send>>,
}

impl CallbackSink {
    pub fn new(callback: impl FnMut(&Record) + Send + 'static) -> Self {
        Self {
            callback: Mutex::new(Box::new(callback)),
        }
    }
}

#[async_trait]
impl Sink for CallbackSink {
    fn name(&self) -> &str {
        "callback"
    }

    async fn emit(&self, record: &Record) -> Result<(), CrawlError> {
        (self.callback.lock())(record);
        Ok(())
    }
}
