//! Donation lifecycle engine

use crate::{
    error::{Error, Result},
    transitions::can_transition,
    types::{
        Actor, Donation, DonationFilter, DonationReceipt, DonationStatus, NewDonation, Role,
    },
};
use audit_trail::{sha256_hex, AuditHandle, AuditPublisher, EventPayload};
use chrono::Utc;
use entity_store::{LockMap, MemStore, Versioned};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Listing cap for `list`
const LIST_LIMIT: usize = 100;

/// Owns donation records and guards every mutation
///
/// Collaborators are injected; the engine holds no global state. Mutations on
/// one donation are serialized through the lock map and committed with a
/// versioned compare-and-swap.
pub struct DonationLifecycle {
    donations: Arc<MemStore<Donation>>,
    publisher: Arc<AuditPublisher>,
    audit: AuditHandle,
    locks: LockMap,
}

impl DonationLifecycle {
    /// Create a lifecycle engine
    ///
    /// `publisher` serves the synchronous create-path proof; `audit` is the
    /// background handle used by everything else.
    pub fn new(
        donations: Arc<MemStore<Donation>>,
        publisher: Arc<AuditPublisher>,
        audit: AuditHandle,
    ) -> Self {
        Self {
            donations,
            publisher,
            audit,
            locks: LockMap::new(),
        }
    }

    /// Create a donation in `pending` and publish its creation proof
    ///
    /// This is the one path that awaits the ledger: the caller gets the proof
    /// transaction id in the receipt. Retry exhaustion surfaces as
    /// [`Error::Ledger`]; the donation itself is already committed.
    pub async fn create(&self, input: NewDonation) -> Result<DonationReceipt> {
        if input.donor_id.trim().is_empty() {
            return Err(Error::Validation("donor_id is required".to_string()));
        }
        if input.campaign_id.trim().is_empty() {
            return Err(Error::Validation("campaign_id is required".to_string()));
        }
        if input.amount_usd <= Decimal::ZERO {
            return Err(Error::Validation(
                "amount_usd must be positive".to_string(),
            ));
        }

        let now = Utc::now();
        let donation = Donation {
            donation_id: Uuid::now_v7(),
            donor_id: input.donor_id,
            campaign_id: input.campaign_id,
            amount_usd: input.amount_usd,
            currency: input.currency,
            status: DonationStatus::Pending,
            recipient_id: None,
            ledger_proof_id: None,
            delivery_proof_hash: None,
            media_ref: None,
            created_at: now,
            updated_at: now,
        };
        let donation_id = donation.donation_id;
        self.donations.insert(donation.clone())?;

        let mut payload = EventPayload::new("donation_created", donation_id.to_string());
        payload.amount_usd = Some(donation.amount_usd);
        payload.campaign = Some(donation.campaign_id.clone());
        let receipt = self.publisher.publish(&payload).await?;

        let versioned = self.donations.get_versioned(donation_id)?;
        let mut committed = versioned.record;
        committed.ledger_proof_id = Some(receipt.tx_id.clone());
        committed.updated_at = Utc::now();
        self.donations.update(versioned.version, committed)?;

        info!(%donation_id, tx_id = %receipt.tx_id, "donation created");
        Ok(DonationReceipt {
            donation_id,
            status: DonationStatus::Pending,
            ledger_tx_id: receipt.tx_id,
            explorer_url: receipt.explorer_url,
        })
    }

    /// Move a donation along the transition table
    ///
    /// Requesting the current status is an idempotent no-op. Otherwise the
    /// edge must exist and `actor.role` must be allowed on it. On commit the
    /// lifecycle event is enqueued for background publication; the caller
    /// never waits on the ledger.
    pub async fn transition(
        &self,
        donation_id: Uuid,
        requested: DonationStatus,
        recipient_id: Option<String>,
        actor: &Actor,
    ) -> Result<Donation> {
        let _guard = self.locks.acquire(donation_id).await;

        let Versioned {
            record: mut donation,
            version,
        } = self.load(donation_id)?;
        let current = donation.status;

        if requested == current {
            return Ok(donation);
        }
        if !can_transition(current, requested, actor.role) {
            return Err(Error::Forbidden {
                from: current,
                to: requested,
                role: actor.role,
            });
        }

        donation.status = requested;
        if let Some(recipient) = recipient_id {
            donation.recipient_id = Some(recipient);
        }
        donation.updated_at = Utc::now();
        self.donations.update(version, donation.clone())?;

        info!(
            %donation_id,
            from = %current,
            to = %requested,
            actor = %actor.actor_id,
            "donation transitioned"
        );
        self.audit.emit(self.lifecycle_event(&donation, current, requested));
        Ok(donation)
    }

    /// Mark a donation delivered with an irreversible proof of delivery
    ///
    /// The edge into `delivered` is checked against the same table as
    /// `transition`, from whatever status the donation currently holds. Only
    /// the digest of `proof_secret` is persisted.
    pub async fn deliver(
        &self,
        donation_id: Uuid,
        proof_secret: &str,
        media_ref: Option<String>,
        actor: &Actor,
    ) -> Result<Donation> {
        if proof_secret.is_empty() {
            return Err(Error::Validation("proof secret is required".to_string()));
        }

        let _guard = self.locks.acquire(donation_id).await;

        let Versioned {
            record: mut donation,
            version,
        } = self.load(donation_id)?;
        let current = donation.status;

        if !can_transition(current, DonationStatus::Delivered, actor.role) {
            return Err(Error::Forbidden {
                from: current,
                to: DonationStatus::Delivered,
                role: actor.role,
            });
        }

        donation.status = DonationStatus::Delivered;
        donation.delivery_proof_hash = Some(sha256_hex(proof_secret.as_bytes()));
        if media_ref.is_some() {
            donation.media_ref = media_ref;
        }
        donation.updated_at = Utc::now();
        self.donations.update(version, donation.clone())?;

        info!(%donation_id, actor = %actor.actor_id, "donation delivered");
        self.audit
            .emit(self.lifecycle_event(&donation, current, DonationStatus::Delivered));
        Ok(donation)
    }

    /// Fetch a donation by id
    pub fn get(&self, donation_id: Uuid) -> Result<Donation> {
        self.load(donation_id).map(|versioned| versioned.record)
    }

    /// List donations matching a filter, newest first, capped at 100
    pub fn list(&self, filter: &DonationFilter) -> Vec<Donation> {
        let mut donations = self.donations.find(|donation| filter.matches(donation));
        donations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        donations.truncate(LIST_LIMIT);
        donations
    }

    /// Administrative purge; admin only
    pub async fn delete(&self, donation_id: Uuid, actor: &Actor) -> Result<()> {
        if actor.role != Role::Admin {
            return Err(Error::AdminOnly(actor.role));
        }
        let _guard = self.locks.acquire(donation_id).await;
        self.donations
            .remove(donation_id)
            .map_err(|_| Error::NotFound(donation_id))?;
        info!(%donation_id, actor = %actor.actor_id, "donation purged");
        Ok(())
    }

    fn load(&self, donation_id: Uuid) -> Result<Versioned<Donation>> {
        self.donations
            .get_versioned(donation_id)
            .map_err(|_| Error::NotFound(donation_id))
    }

    fn lifecycle_event(
        &self,
        donation: &Donation,
        from: DonationStatus,
        to: DonationStatus,
    ) -> EventPayload {
        let mut payload = EventPayload::new(
            format!("donation_{}", to.as_str()),
            donation.donation_id.to_string(),
        );
        payload.from = Some(from.as_str().to_string());
        payload.to = Some(to.as_str().to_string());
        payload.recipient_id = donation.recipient_id.clone();
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Currency;
    use audit_trail::{spawn_audit_actor, AuditConfig, AuditLogEntry};
    use rust_decimal_macros::dec;
    use tokio::time::{sleep, Duration};

    struct Fixture {
        lifecycle: DonationLifecycle,
        entries: Arc<MemStore<AuditLogEntry>>,
    }

    fn fixture() -> Fixture {
        let mut config = AuditConfig::default();
        config.retry.base_delay_ms = 1;
        let entries = Arc::new(MemStore::<AuditLogEntry>::new());
        let publisher = Arc::new(AuditPublisher::new(None, entries.clone(), config));
        let audit = spawn_audit_actor(publisher.clone());
        Fixture {
            lifecycle: DonationLifecycle::new(Arc::new(MemStore::new()), publisher, audit),
            entries,
        }
    }

    async fn wait_for_event(entries: &MemStore<AuditLogEntry>, event_type: &str) {
        for _ in 0..100 {
            if !entries.find(|entry| entry.event_type == event_type).is_empty() {
                return;
            }
            sleep(Duration::from_millis(5)).await;
        }
        panic!("no {event_type} entry reached the audit trail");
    }

    fn donor() -> Actor {
        Actor::new("u1", Role::Donor)
    }

    fn ngo() -> Actor {
        Actor::new("ngo-1", Role::Ngo)
    }

    fn admin() -> Actor {
        Actor::new("root", Role::Admin)
    }

    fn pledge() -> NewDonation {
        NewDonation {
            donor_id: "u1".to_string(),
            campaign_id: "c1".to_string(),
            amount_usd: dec!(50),
            currency: Currency::default(),
        }
    }

    #[tokio::test]
    async fn test_create_returns_proof() {
        let fx = fixture();

        let receipt = fx.lifecycle.create(pledge()).await.unwrap();
        assert_eq!(receipt.status, DonationStatus::Pending);
        assert!(receipt.ledger_tx_id.starts_with("synthetic-"));

        let donation = fx.lifecycle.get(receipt.donation_id).unwrap();
        assert_eq!(donation.status, DonationStatus::Pending);
        assert_eq!(donation.ledger_proof_id.as_deref(), Some(receipt.ledger_tx_id.as_str()));
    }

    #[tokio::test]
    async fn test_create_validates_input() {
        let fx = fixture();

        let mut missing_donor = pledge();
        missing_donor.donor_id = String::new();
        assert!(matches!(
            fx.lifecycle.create(missing_donor).await,
            Err(Error::Validation(_))
        ));

        let mut zero_amount = pledge();
        zero_amount.amount_usd = Decimal::ZERO;
        assert!(matches!(
            fx.lifecycle.create(zero_amount).await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_donor_cannot_skip_to_assigned() {
        let fx = fixture();
        let id = fx.lifecycle.create(pledge()).await.unwrap().donation_id;

        let err = fx
            .lifecycle
            .transition(id, DonationStatus::Assigned, None, &donor())
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot transition from pending to assigned with role donor"
        );
    }

    #[tokio::test]
    async fn test_ngo_walks_the_pipeline() {
        let fx = fixture();
        let id = fx.lifecycle.create(pledge()).await.unwrap().donation_id;

        fx.lifecycle
            .transition(id, DonationStatus::Funded, None, &ngo())
            .await
            .unwrap();
        let donation = fx
            .lifecycle
            .transition(
                id,
                DonationStatus::Assigned,
                Some("r1".to_string()),
                &ngo(),
            )
            .await
            .unwrap();

        assert_eq!(donation.status, DonationStatus::Assigned);
        assert_eq!(donation.recipient_id.as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_donor_may_fund() {
        let fx = fixture();
        let id = fx.lifecycle.create(pledge()).await.unwrap().donation_id;

        let donation = fx
            .lifecycle
            .transition(id, DonationStatus::Funded, None, &donor())
            .await
            .unwrap();
        assert_eq!(donation.status, DonationStatus::Funded);
    }

    #[tokio::test]
    async fn test_transition_is_idempotent() {
        let fx = fixture();
        let id = fx.lifecycle.create(pledge()).await.unwrap().donation_id;
        fx.lifecycle
            .transition(id, DonationStatus::Funded, None, &ngo())
            .await
            .unwrap();
        let before = fx.lifecycle.get(id).unwrap();

        // Same status again: no-op, even for a role the edge would reject.
        let donation = fx
            .lifecycle
            .transition(id, DonationStatus::Funded, Some("r9".to_string()), &donor())
            .await
            .unwrap();
        assert_eq!(donation.status, DonationStatus::Funded);
        assert_eq!(donation.recipient_id, before.recipient_id);
        assert_eq!(donation.updated_at, before.updated_at);
    }

    #[tokio::test]
    async fn test_delivered_is_terminal() {
        let fx = fixture();
        let id = fx.lifecycle.create(pledge()).await.unwrap().donation_id;
        fx.lifecycle
            .transition(id, DonationStatus::Funded, None, &ngo())
            .await
            .unwrap();
        fx.lifecycle
            .transition(id, DonationStatus::Assigned, None, &ngo())
            .await
            .unwrap();
        fx.lifecycle
            .deliver(id, "secret", None, &ngo())
            .await
            .unwrap();

        for requested in [
            DonationStatus::Pending,
            DonationStatus::Funded,
            DonationStatus::Assigned,
        ] {
            let err = fx
                .lifecycle
                .transition(id, requested, None, &admin())
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Forbidden { .. }));
        }
    }

    #[tokio::test]
    async fn test_deliver_requires_secret() {
        let fx = fixture();
        let id = fx.lifecycle.create(pledge()).await.unwrap().donation_id;
        fx.lifecycle
            .transition(id, DonationStatus::Funded, None, &ngo())
            .await
            .unwrap();
        fx.lifecycle
            .transition(id, DonationStatus::Assigned, None, &ngo())
            .await
            .unwrap();

        let err = fx.lifecycle.deliver(id, "", None, &ngo()).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(
            fx.lifecycle.get(id).unwrap().status,
            DonationStatus::Assigned
        );
    }

    #[tokio::test]
    async fn test_deliver_stores_digest_not_secret() {
        let fx = fixture();
        let id = fx.lifecycle.create(pledge()).await.unwrap().donation_id;
        fx.lifecycle
            .transition(id, DonationStatus::Funded, None, &ngo())
            .await
            .unwrap();
        fx.lifecycle
            .transition(id, DonationStatus::Assigned, None, &ngo())
            .await
            .unwrap();

        let donation = fx
            .lifecycle
            .deliver(id, "top-secret", Some("ipfs://proof.jpg".to_string()), &ngo())
            .await
            .unwrap();

        let digest = donation.delivery_proof_hash.unwrap();
        assert_eq!(digest, sha256_hex(b"top-secret"));
        assert_ne!(digest, "top-secret");
        assert_eq!(donation.media_ref.as_deref(), Some("ipfs://proof.jpg"));
    }

    #[tokio::test]
    async fn test_deliver_guard_uses_transition_table() {
        let fx = fixture();
        let id = fx.lifecycle.create(pledge()).await.unwrap().donation_id;

        // No pending -> delivered edge exists.
        let err = fx
            .lifecycle
            .deliver(id, "secret", None, &admin())
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot transition from pending to delivered with role admin"
        );
    }

    #[tokio::test]
    async fn test_transition_emits_lifecycle_event() {
        let fx = fixture();
        let id = fx.lifecycle.create(pledge()).await.unwrap().donation_id;
        fx.lifecycle
            .transition(id, DonationStatus::Funded, None, &ngo())
            .await
            .unwrap();

        wait_for_event(&fx.entries, "donation_funded").await;
        let funded = fx.entries.find(|entry| entry.event_type == "donation_funded");
        assert_eq!(funded.len(), 1);
        assert!(!funded[0].payload_hash.is_empty());
        assert!(!funded[0].ledger_tx_id.is_empty());
    }

    #[tokio::test]
    async fn test_create_event_is_awaited_not_queued() {
        let fx = fixture();
        fx.lifecycle.create(pledge()).await.unwrap();

        // The creation proof is published synchronously; no polling needed.
        let created = fx
            .entries
            .find(|entry| entry.event_type == "donation_created");
        assert_eq!(created.len(), 1);
    }

    #[tokio::test]
    async fn test_list_filters_and_orders() {
        let fx = fixture();
        let a = fx.lifecycle.create(pledge()).await.unwrap().donation_id;
        sleep(Duration::from_millis(5)).await;
        let mut other = pledge();
        other.campaign_id = "c2".to_string();
        let b = fx.lifecycle.create(other).await.unwrap().donation_id;

        let all = fx.lifecycle.list(&DonationFilter::default());
        assert_eq!(all.len(), 2);
        // Newest first.
        assert_eq!(all[0].donation_id, b);
        assert_eq!(all[1].donation_id, a);

        let c1_only = fx.lifecycle.list(&DonationFilter {
            campaign_id: Some("c1".to_string()),
            ..Default::default()
        });
        assert_eq!(c1_only.len(), 1);
        assert_eq!(c1_only[0].donation_id, a);

        let delivered = fx.lifecycle.list(&DonationFilter {
            status: Some(DonationStatus::Delivered),
            ..Default::default()
        });
        assert!(delivered.is_empty());
    }

    #[tokio::test]
    async fn test_delete_requires_admin() {
        let fx = fixture();
        let id = fx.lifecycle.create(pledge()).await.unwrap().donation_id;

        assert!(matches!(
            fx.lifecycle.delete(id, &ngo()).await,
            Err(Error::AdminOnly(Role::Ngo))
        ));
        fx.lifecycle.delete(id, &admin()).await.unwrap();
        assert!(matches!(fx.lifecycle.get(id), Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unknown_donation() {
        let fx = fixture();
        let missing = Uuid::now_v7();

        assert!(matches!(
            fx.lifecycle
                .transition(missing, DonationStatus::Funded, None, &admin())
                .await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            fx.lifecycle.deliver(missing, "secret", None, &admin()).await,
            Err(Error::NotFound(_))
        ));
    }
}
