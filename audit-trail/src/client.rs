//! Ledger client seam
//!
//! The external ledger is reached only through [`LedgerClient::submit`]. The
//! publisher owns retries and timeouts; implementations should make exactly
//! one submission attempt per call.

use crate::Result;
use async_trait::async_trait;

/// Confirmation returned by a successful ledger submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerReceipt {
    /// Ledger transaction id
    pub tx_id: String,

    /// URL where the transaction can be inspected
    pub explorer_url: String,
}

/// Submit-only interface to the external append-only ledger
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Submit one message, returning the ledger's confirmation
    async fn submit(&self, message: &[u8]) -> Result<LedgerReceipt>;
}
