//! Control-panel audit log.
//!
//! Create and delete actions are queued and written by a background worker so
//! the response never waits on the log. The queue is bounded; when it is full
//! the entry is dropped and counted. [`AuditLog::shutdown`] closes the queue and
//! waits for the worker to write what is still pending.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::db::{AuditStore, NewCpLogEntry};
use crate::discord::DiscordUser;
use crate::web::metrics::Metrics;

pub fn log_entry(actor: &DiscordUser, guild_id: &str, action: impl Into<String>) -> NewCpLogEntry {
    NewCpLogEntry {
        guild_id: guild_id.to_string(),
        actor_id: actor.id.clone(),
        actor_name: actor.username.clone(),
        action: action.into(),
    }
}

pub struct AuditLog {
    store: Arc<dyn AuditStore>,
    sender: Mutex<Option<mpsc::Sender<NewCpLogEntry>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AuditLog {
    /// Starts the background writer. Must be called inside a tokio runtime.
    pub fn spawn(store: Arc<dyn AuditStore>, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity);
        let worker = tokio::spawn(run_worker(store.clone(), receiver));

        Self {
            store,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Queues an entry without waiting. Returns false when it was dropped.
    pub fn enqueue(&self, entry: NewCpLogEntry) -> bool {
        let guard = self.sender.lock();
        let Some(sender) = guard.as_ref() else {
            warn!(guild_id = %entry.guild_id, action = %entry.action, "audit log closed, dropping entry");
            Metrics::audit_entry_dropped();
            return false;
        };

        match sender.try_send(entry) {
            Ok(()) => {
                let pending = sender.max_capacity() - sender.capacity();
                Metrics::set_audit_queue_size(pending as u64);
                true
            }
            Err(TrySendError::Full(entry)) => {
                warn!(guild_id = %entry.guild_id, action = %entry.action, "audit queue full, dropping entry");
                Metrics::audit_entry_dropped();
                false
            }
            Err(TrySendError::Closed(entry)) => {
                warn!(guild_id = %entry.guild_id, action = %entry.action, "audit writer stopped, dropping entry");
                Metrics::audit_entry_dropped();
                false
            }
        }
    }

    /// Writes an entry directly, waiting for the store. Failures are logged, not returned.
    pub async fn record(&self, entry: NewCpLogEntry) {
        write_entry(self.store.as_ref(), &entry).await;
    }

    /// Closes the queue and waits up to `timeout` for pending entries to be written.
    /// Returns false if the worker did not finish in time.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.sender.lock().take();
        let Some(worker) = self.worker.lock().take() else {
            return true;
        };

        match tokio::time::timeout(timeout, worker).await {
            Ok(Ok(())) => {
                info!("audit log drained");
                true
            }
            Ok(Err(e)) => {
                error!(error = %e, "audit writer task failed");
                false
            }
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "audit log did not drain before timeout");
                false
            }
        }
    }
}

async fn run_worker(store: Arc<dyn AuditStore>, mut receiver: mpsc::Receiver<NewCpLogEntry>) {
    while let Some(entry) = receiver.recv().await {
        Metrics::set_audit_queue_size(receiver.len() as u64);
        write_entry(store.as_ref(), &entry).await;
    }
    debug!("audit writer stopped");
}

async fn write_entry(store: &dyn AuditStore, entry: &NewCpLogEntry) {
    match store.insert_log_entry(entry).await {
        Ok(()) => Metrics::audit_entry_written(),
        Err(e) => {
            Metrics::audit_entry_failed();
            error!(
                guild_id = %entry.guild_id,
                actor_id = %entry.actor_id,
                action = %entry.action,
                error = %e,
                "failed to write audit log entry"
            );
        }
    }
}
