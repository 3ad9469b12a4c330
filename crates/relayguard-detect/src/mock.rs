//! Mock file fetcher for deterministic testing.
//!
//! Serves canned bytes by file id, fails on request, can delay chosen ids,
//! and records every fetch so tests can assert which attachments were
//! downloaded.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use relayguard_core::{Error, FileFetcher, Result};

/// In-memory [`FileFetcher`].
#[derive(Clone, Default)]
pub struct MockFileFetcher {
    files: HashMap<String, Vec<u8>>,
    failures: HashSet<String>,
    delays: HashMap<String, Duration>,
    call_log: Arc<Mutex<Vec<String>>>,
}

impl MockFileFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `data` for `file_id`.
    pub fn with_file(mut self, file_id: &str, data: Vec<u8>) -> Self {
        self.files.insert(file_id.to_string(), data);
        self
    }

    /// Fail every fetch of `file_id`.
    pub fn with_failure(mut self, file_id: &str) -> Self {
        self.failures.insert(file_id.to_string());
        self
    }

    /// Sleep before answering for `file_id`.
    pub fn with_delay(mut self, file_id: &str, delay: Duration) -> Self {
        self.delays.insert(file_id.to_string(), delay);
        self
    }

    /// File ids requested so far, in call order.
    pub fn fetched_ids(&self) -> Vec<String> {
        self.call_log.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileFetcher for MockFileFetcher {
    async fn fetch_file(&self, file_id: &str) -> Result<Vec<u8>> {
        self.call_log.lock().unwrap().push(file_id.to_string());

        if let Some(delay) = self.delays.get(file_id) {
            tokio::time::sleep(*delay).await;
        }

        if self.failures.contains(file_id) {
            return Err(Error::FileFetch(format!("mock failure for {}", file_id)));
        }

        self.files
            .get(file_id)
            .cloned()
            .ok_or_else(|| Error::FileFetch(format!("unknown file {}", file_id)))
    }
}
