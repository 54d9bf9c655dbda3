//! Audit recorder - asynchronous, failure-isolated append to the audit log.
//!
//! Callers hand events to a background task over an unbounded channel and
//! return immediately. Store failures are logged by the task and dropped;
//! they never reach the request that produced the event.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::config::MAX_AUDIT_PAGE_SIZE;
use crate::domain::{AuditEvent, NewAuditEvent};
use crate::errors::AppResult;
use crate::infra::AuditRepository;

enum Message {
    Event(Box<NewAuditEvent>),
    Flush(oneshot::Sender<()>),
}

/// Handle to the audit worker. Cheap to clone.
#[derive(Clone)]
pub struct AuditRecorder {
    tx: mpsc::UnboundedSender<Message>,
    store: Arc<dyn AuditRepository>,
}

impl AuditRecorder {
    /// Spawn the background writer. Must be called inside a tokio runtime.
    pub fn spawn(store: Arc<dyn AuditRepository>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(write_loop(store.clone(), rx));
        Self { tx, store }
    }

    /// Queue an event. Never blocks and never fails.
    ///
    /// Also the entry point for callers that perform their own mutations
    /// (course or assessment CRUD) and only need them traced.
    pub fn record(&self, event: NewAuditEvent) {
        let action = event.action.to_string();
        if self.tx.send(Message::Event(Box::new(event))).is_err() {
            tracing::error!(%action, "Audit worker stopped, event dropped");
        }
    }

    /// Wait until every event queued before this call has reached the store.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Message::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }

    /// Most recent events first, capped at the maximum page size.
    pub async fn recent(&self, limit: u64) -> AppResult<Vec<AuditEvent>> {
        self.store.list_recent(limit.min(MAX_AUDIT_PAGE_SIZE)).await
    }
}

async fn write_loop(store: Arc<dyn AuditRepository>, mut rx: mpsc::UnboundedReceiver<Message>) {
    while let Some(message) = rx.recv().await {
        match message {
            Message::Event(event) => {
                let action = event.action.to_string();
                let actor = event.user_id;
                if let Err(e) = store.append(*event).await {
                    tracing::error!(%action, user_id = ?actor, error = %e, "Failed to write audit event");
                }
            }
            Message::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
    tracing::debug!("Audit worker shut down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AuditAction;
    use crate::errors::AppError;
    use crate::infra::MockAuditRepository;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_events_reach_store_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut store = MockAuditRepository::new();
        store.expect_append().times(2).returning(move |event| {
            sink.lock().unwrap().push(event.action.label().to_string());
            Ok(())
        });

        let recorder = AuditRecorder::spawn(Arc::new(store));
        recorder.record(NewAuditEvent::new(None, AuditAction::LoginFailed));
        recorder.record(NewAuditEvent::new(Some(Uuid::new_v4()), AuditAction::LoginSuccess));
        recorder.flush().await;

        assert_eq!(*seen.lock().unwrap(), vec!["LOGIN_FAILED", "LOGIN_SUCCESS"]);
    }

    #[tokio::test]
    async fn test_store_failure_is_swallowed() {
        let mut store = MockAuditRepository::new();
        store
            .expect_append()
            .returning(|_| Err(AppError::internal("audit table unavailable")));

        let recorder = AuditRecorder::spawn(Arc::new(store));
        recorder.record(NewAuditEvent::new(None, AuditAction::Logout));
        recorder.flush().await;

        // Worker survives the failure and keeps accepting events
        recorder.record(NewAuditEvent::new(None, AuditAction::Logout));
        recorder.flush().await;
    }

    #[tokio::test]
    async fn test_recent_caps_limit() {
        let mut store = MockAuditRepository::new();
        store
            .expect_list_recent()
            .withf(|limit| *limit == MAX_AUDIT_PAGE_SIZE)
            .returning(|_| Ok(Vec::new()));

        let recorder = AuditRecorder::spawn(Arc::new(store));
        assert!(recorder.recent(10_000).await.unwrap().is_empty());
    }
}
