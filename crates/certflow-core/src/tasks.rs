//! Tracking of detached verify-and-issue tasks
//!
//! Each in-flight certificate request owns one background task and one
//! log buffer, keyed by request id. Entries are removed when the task
//! completes (its outcome is durable by then) or when the request is
//! deleted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use crate::log_buffer::IssuanceLogBuffer;

struct TaskEntry {
    handle: Option<JoinHandle<()>>,
    log: Arc<IssuanceLogBuffer>,
}

/// Registry of per-request background tasks and their log buffers
pub struct TaskRegistry {
    log_capacity: usize,
    entries: Mutex<HashMap<String, TaskEntry>>,
}

impl TaskRegistry {
    pub fn new(log_capacity: usize) -> Self {
        Self {
            log_capacity,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Create (or reuse) the log buffer for a request, without a task.
    /// Used by synchronous operator-triggered operations that still want
    /// their progress readable.
    pub fn log_for(&self, request_id: &str) -> Arc<IssuanceLogBuffer> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .entry(request_id.to_string())
            .or_insert_with(|| TaskEntry {
                handle: None,
                log: Arc::new(IssuanceLogBuffer::new(self.log_capacity)),
            })
            .log
            .clone()
    }

    /// Attach a running task to a request, aborting any previous one
    pub fn register(&self, request_id: &str, handle: JoinHandle<()>) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let entry = entries
            .entry(request_id.to_string())
            .or_insert_with(|| TaskEntry {
                handle: None,
                log: Arc::new(IssuanceLogBuffer::new(self.log_capacity)),
            });
        if let Some(old) = entry.handle.replace(handle) {
            old.abort();
        }
    }

    /// Read the log buffer of an in-flight request, if any
    pub fn log(&self, request_id: &str) -> Option<Arc<IssuanceLogBuffer>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(request_id).map(|e| e.log.clone())
    }

    /// Drop a request's entry once its result is durably persisted
    pub fn complete(&self, request_id: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(request_id);
    }

    /// Abort and drop a request's task, if running
    pub fn abort(&self, request_id: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = entries.remove(request_id) {
            if let Some(handle) = entry.handle {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_complete() {
        let registry = TaskRegistry::new(16);
        let handle =
            tokio::spawn(async { tokio::time::sleep(std::time::Duration::from_secs(10)).await });

        registry.register("req-1", handle);
        registry.log_for("req-1").push("started".to_string());

        assert_eq!(registry.log("req-1").unwrap().snapshot(), vec!["started"]);

        registry.complete("req-1");
        assert!(registry.log("req-1").is_none());
    }

    #[tokio::test]
    async fn test_register_replaces_previous_task() {
        let registry = TaskRegistry::new(16);

        let first =
            tokio::spawn(async { tokio::time::sleep(std::time::Duration::from_secs(10)).await });
        registry.register("req-1", first);

        let second =
            tokio::spawn(async { tokio::time::sleep(std::time::Duration::from_secs(10)).await });
        registry.register("req-1", second);

        let entries = registry.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_log_without_task() {
        let registry = TaskRegistry::new(16);
        registry.log_for("req-2").push("manual issue".to_string());
        assert!(registry.log("req-2").is_some());

        registry.abort("req-2");
        assert!(registry.log("req-2").is_none());
    }
}
