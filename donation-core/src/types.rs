//! Core types for the donation lifecycle

use chrono::{DateTime, Utc};
use entity_store::Entity;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Donation currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    /// US Dollar
    USD,
    /// The collateral-backed credit unit
    OFD,
    /// Ledger-native token
    HBAR,
}

impl Currency {
    /// Currency code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::OFD => "OFD",
            Currency::HBAR => "HBAR",
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "USD" => Some(Currency::USD),
            "OFD" => Some(Currency::OFD),
            "HBAR" => Some(Currency::HBAR),
            _ => None,
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::USD
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Donation status
///
/// Moves forward only; `Delivered` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonationStatus {
    /// Created, not yet funded
    Pending,
    /// Funds received
    Funded,
    /// Assigned to a recipient
    Assigned,
    /// Delivery proven (terminal)
    Delivered,
}

impl DonationStatus {
    /// Snake-case name, as used in event types
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationStatus::Pending => "pending",
            DonationStatus::Funded => "funded",
            DonationStatus::Assigned => "assigned",
            DonationStatus::Delivered => "delivered",
        }
    }

    /// True for statuses with no outgoing edges
    pub fn is_terminal(&self) -> bool {
        matches!(self, DonationStatus::Delivered)
    }
}

impl fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Actor role, resolved by the external authentication layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Contributes donations
    Donor,
    /// Operates the delivery pipeline
    Ngo,
    /// Full control
    Admin,
}

impl Role {
    /// Role name
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Donor => "donor",
            Role::Ngo => "ngo",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An already-authenticated caller
///
/// The core never validates credentials; it only consumes this claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Stable actor id
    pub actor_id: String,

    /// Resolved role
    pub role: Role,
}

impl Actor {
    /// Create an actor context
    pub fn new(actor_id: impl Into<String>, role: Role) -> Self {
        Self {
            actor_id: actor_id.into(),
            role,
        }
    }
}

/// One pledged contribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donation {
    /// Unique donation id
    pub donation_id: Uuid,

    /// Contributing donor
    pub donor_id: String,

    /// Campaign the donation belongs to
    pub campaign_id: String,

    /// Pledged amount in USD
    pub amount_usd: Decimal,

    /// Currency of the pledge
    pub currency: Currency,

    /// Lifecycle status
    pub status: DonationStatus,

    /// Recipient, set when assigned
    pub recipient_id: Option<String>,

    /// Ledger transaction id of the creation proof
    pub ledger_proof_id: Option<String>,

    /// Digest of the delivery proof secret; set exactly when delivered
    pub delivery_proof_hash: Option<String>,

    /// Reference to delivery media, stored verbatim
    pub media_ref: Option<String>,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl Entity for Donation {
    fn id(&self) -> Uuid {
        self.donation_id
    }
}

/// Input for creating a donation
#[derive(Debug, Clone)]
pub struct NewDonation {
    /// Contributing donor
    pub donor_id: String,

    /// Campaign the donation belongs to
    pub campaign_id: String,

    /// Pledged amount in USD
    pub amount_usd: Decimal,

    /// Currency of the pledge
    pub currency: Currency,
}

/// Result of a successful create, including the ledger proof
#[derive(Debug, Clone)]
pub struct DonationReceipt {
    /// Id of the created donation
    pub donation_id: Uuid,

    /// Status after creation (always pending)
    pub status: DonationStatus,

    /// Ledger transaction id of the creation proof
    pub ledger_tx_id: String,

    /// Explorer URL for the proof transaction
    pub explorer_url: String,
}

/// Filter for listing donations; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct DonationFilter {
    /// Match this donor
    pub donor_id: Option<String>,

    /// Match this campaign
    pub campaign_id: Option<String>,

    /// Match this status
    pub status: Option<DonationStatus>,
}

impl DonationFilter {
    /// True when the donation satisfies every set field
    pub fn matches(&self, donation: &Donation) -> bool {
        if let Some(donor_id) = &self.donor_id {
            if &donation.donor_id != donor_id {
                return false;
            }
        }
        if let Some(campaign_id) = &self.campaign_id {
            if &donation.campaign_id != campaign_id {
                return false;
            }
        }
        if let Some(status) = self.status {
            if donation.status != status {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_from_str() {
        assert_eq!(Currency::from_str("USD"), Some(Currency::USD));
        assert_eq!(Currency::from_str("HBAR"), Some(Currency::HBAR));
        assert_eq!(Currency::from_str("EUR"), None);
    }

    #[test]
    fn test_status_names_match_event_suffixes() {
        assert_eq!(DonationStatus::Funded.as_str(), "funded");
        assert_eq!(DonationStatus::Delivered.as_str(), "delivered");
    }

    #[test]
    fn test_only_delivered_is_terminal() {
        assert!(DonationStatus::Delivered.is_terminal());
        assert!(!DonationStatus::Pending.is_terminal());
        assert!(!DonationStatus::Funded.is_terminal());
        assert!(!DonationStatus::Assigned.is_terminal());
    }
}
