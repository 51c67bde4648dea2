//! Background publish actor
//!
//! Lifecycle mutations must not wait on ledger confirmation, so they enqueue
//! payloads here and return. One consumer task drains the bounded mailbox and
//! runs the full retry cycle per payload. A full mailbox or an exhausted
//! retry budget is logged and counted; it is never surfaced to the caller —
//! donation commits are deliberately decoupled from ledger proof success.

use crate::{
    metrics::AUDIT_QUEUE_DROPPED_TOTAL, payload::EventPayload, publisher::AuditPublisher,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::error;

/// Mailbox capacity; the queue is bounded so an unreachable ledger cannot
/// accumulate unbounded background work
const QUEUE_CAPACITY: usize = 256;

/// Message sent to the audit actor
enum AuditMessage {
    /// Publish a payload with retry
    Publish(EventPayload),

    /// Stop after draining messages already enqueued
    Shutdown,
}

/// Actor that publishes queued payloads
struct AuditActor {
    publisher: Arc<AuditPublisher>,
    mailbox: mpsc::Receiver<AuditMessage>,
}

impl AuditActor {
    async fn run(mut self) {
        while let Some(message) = self.mailbox.recv().await {
            match message {
                AuditMessage::Publish(payload) => {
                    if let Err(e) = self.publisher.publish(&payload).await {
                        error!(
                            event_type = %payload.event_type,
                            donation_id = %payload.donation_id,
                            error = %e,
                            "audit publish failed; event committed without ledger proof"
                        );
                    }
                }
                AuditMessage::Shutdown => break,
            }
        }
    }
}

/// Handle for enqueueing payloads on the actor
#[derive(Clone)]
pub struct AuditHandle {
    sender: mpsc::Sender<AuditMessage>,
}

impl AuditHandle {
    /// Enqueue a payload for background publication
    ///
    /// Non-blocking. When the queue is full the event is dropped, logged,
    /// and counted; the lifecycle mutation that emitted it stays committed.
    pub fn emit(&self, payload: EventPayload) {
        if self
            .sender
            .try_send(AuditMessage::Publish(payload))
            .is_err()
        {
            AUDIT_QUEUE_DROPPED_TOTAL.inc();
            error!("audit queue full or closed; dropping event");
        }
    }

    /// Drain already-enqueued payloads, then stop the actor
    pub async fn shutdown(&self) {
        let _ = self.sender.send(AuditMessage::Shutdown).await;
    }
}

/// Spawn the audit actor, returning its handle
pub fn spawn_audit_actor(publisher: Arc<AuditPublisher>) -> AuditHandle {
    let (sender, mailbox) = mpsc::channel(QUEUE_CAPACITY);
    let actor = AuditActor { publisher, mailbox };

    tokio::spawn(async move {
        actor.run().await;
    });

    AuditHandle { sender }
}
