//! Lifecycle event payloads and canonical hashing
//!
//! The payload travels two ways: as JSON in the ledger message body, and as
//! canonical bytes into the digest stored with each proof record. The
//! canonical form uses a fixed field order, length-prefixed strings,
//! present/absent markers for options, fixed-scale decimals, and epoch
//! nanoseconds for the timestamp, so the digest is independent of how the
//! payload was constructed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Decimal places used when canonicalizing USD amounts
const AMOUNT_SCALE: u32 = 2;

/// One lifecycle event, as published to the ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPayload {
    /// Event type, e.g. `donation_funded`
    #[serde(rename = "type")]
    pub event_type: String,

    /// Donation the event belongs to
    #[serde(rename = "donationId")]
    pub donation_id: String,

    /// Status before the transition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// Status after the transition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,

    /// Recipient attached by the transition, if any
    #[serde(rename = "recipientId", skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<String>,

    /// Donation amount in USD (creation events)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_usd: Option<Decimal>,

    /// Campaign the donation belongs to (creation events)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign: Option<String>,

    /// Event time
    pub timestamp: DateTime<Utc>,
}

impl EventPayload {
    /// Create a payload with only the required fields set
    pub fn new(event_type: impl Into<String>, donation_id: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            donation_id: donation_id.into(),
            from: None,
            to: None,
            recipient_id: None,
            amount_usd: None,
            campaign: None,
            timestamp: Utc::now(),
        }
    }

    /// JSON message body submitted to the ledger
    pub fn message_bytes(&self) -> crate::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Canonical bytes for hashing
    ///
    /// Field order is fixed and matches the struct declaration; changing it
    /// breaks cross-system verification.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut writer = CanonicalWriter::new();
        writer.write_string(&self.event_type);
        writer.write_string(&self.donation_id);
        writer.write_option_string(&self.from);
        writer.write_option_string(&self.to);
        writer.write_option_string(&self.recipient_id);
        writer.write_option_decimal(&self.amount_usd, AMOUNT_SCALE);
        writer.write_option_string(&self.campaign);
        writer.write_i64(self.timestamp.timestamp_nanos_opt().unwrap_or(0));
        writer.finalize()
    }

    /// Hex SHA-256 of the canonical bytes
    pub fn payload_hash(&self) -> String {
        sha256_hex(&self.canonical_bytes())
    }
}

/// Hex-encoded SHA-256 digest
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Canonical byte writer with deterministic encoding
struct CanonicalWriter {
    buffer: Vec<u8>,
}

impl CanonicalWriter {
    fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Write string (length-prefixed, big-endian u32)
    fn write_string(&mut self, s: &str) {
        let bytes = s.as_bytes();
        self.buffer.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
        self.buffer.extend_from_slice(bytes);
    }

    /// Write optional string with a present/absent marker
    fn write_option_string(&mut self, opt: &Option<String>) {
        match opt {
            Some(s) => {
                self.buffer.push(1);
                self.write_string(s);
            }
            None => self.buffer.push(0),
        }
    }

    /// Write optional decimal at a fixed scale
    fn write_option_decimal(&mut self, opt: &Option<Decimal>, scale: u32) {
        match opt {
            Some(d) => {
                self.buffer.push(1);
                self.write_string(&d.round_dp(scale).to_string());
            }
            None => self.buffer.push(0),
        }
    }

    /// Write i64 (big-endian)
    fn write_i64(&mut self, n: i64) {
        self.buffer.extend_from_slice(&n.to_be_bytes());
    }

    fn finalize(self) -> Vec<u8> {
        self.buffer
    }
}
