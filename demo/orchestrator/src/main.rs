// Demo Orchestrator - walks the donation pipeline and the collateral engine
// end to end against the degraded (unconfigured) ledger.

use anyhow::Result;
use audit_trail::{spawn_audit_actor, AuditConfig, AuditLogEntry, AuditPublisher};
use collateral_engine::{AssetRegistry, CollateralAsset, PositionEngine};
use donation_core::{
    Actor, Currency, DonationFilter, DonationLifecycle, DonationStatus, NewDonation, Role,
};
use entity_store::MemStore;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tokio::time::{sleep, Duration};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("\n🚀 =============================================================");
    println!("🚀 ImpactRail - Donation Pipeline Demo");
    println!("🚀 Lifecycle proofs + collateralized credit, no live ledger");
    println!("🚀 =============================================================\n");

    // Process startup owns every component; nothing is global.
    let audit_config = AuditConfig::from_env();
    let entries = Arc::new(MemStore::<AuditLogEntry>::new());
    let publisher = Arc::new(AuditPublisher::new(None, entries.clone(), audit_config));
    let audit = spawn_audit_actor(publisher.clone());

    let lifecycle = DonationLifecycle::new(
        Arc::new(MemStore::new()),
        publisher.clone(),
        audit.clone(),
    );

    let registry = Arc::new(AssetRegistry::new());
    registry.register(
        CollateralAsset::new("HBAR", dec!(10))
            .with_min_ratio(dec!(1.5))
            .with_token_id("0.0.5005"),
    )?;
    let engine = PositionEngine::new(Arc::new(MemStore::new()), registry.clone());

    run_donation_flow(&lifecycle).await?;
    run_collateral_flow(&engine).await?;

    // Drain queued lifecycle events before reading the audit trail.
    audit.shutdown().await;
    sleep(Duration::from_millis(200)).await;

    println!("\n🔎 Audit trail ({} proof records):", entries.len());
    let mut proofs = entries.find(|_| true);
    proofs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    for proof in &proofs {
        println!(
            "   {} | {} | {}",
            proof.event_type, proof.ledger_tx_id, proof.ledger_explorer_url
        );
    }

    if let Some(proof) = proofs.first() {
        let verified = publisher.verify_by_hash(&proof.payload_hash);
        println!(
            "\n✅ verify_by_hash({}...) -> {} record(s)",
            &proof.payload_hash[..16],
            verified.len()
        );
    }

    println!("\n🏁 Demo complete\n");
    Ok(())
}

async fn run_donation_flow(lifecycle: &DonationLifecycle) -> Result<()> {
    println!("💳 Donation lifecycle");

    let receipt = lifecycle
        .create(NewDonation {
            donor_id: "donor-alice".to_string(),
            campaign_id: "clean-water".to_string(),
            amount_usd: dec!(50),
            currency: Currency::USD,
        })
        .await?;
    println!(
        "   created {} (proof {})",
        receipt.donation_id, receipt.ledger_tx_id
    );

    let donor = Actor::new("donor-alice", Role::Donor);
    let ngo = Actor::new("ngo-wells", Role::Ngo);
    let id = receipt.donation_id;

    lifecycle
        .transition(id, DonationStatus::Funded, None, &donor)
        .await?;
    println!("   funded by donor");

    lifecycle
        .transition(id, DonationStatus::Assigned, Some("village-7".to_string()), &ngo)
        .await?;
    println!("   assigned to village-7");

    // Show the guard firing: there is no edge back to pending.
    let refused = lifecycle
        .transition(id, DonationStatus::Pending, None, &donor)
        .await;
    println!("   backward move refused: {}", refused.unwrap_err());

    let delivered = lifecycle
        .deliver(id, "well-photo-secret", Some("ipfs://well.jpg".to_string()), &ngo)
        .await?;
    println!(
        "   delivered; proof digest {}",
        delivered.delivery_proof_hash.unwrap_or_default()
    );

    let delivered_count = lifecycle
        .list(&DonationFilter {
            status: Some(DonationStatus::Delivered),
            ..Default::default()
        })
        .len();
    println!("   {} delivered donation(s) on record\n", delivered_count);
    Ok(())
}

async fn run_collateral_flow(engine: &PositionEngine) -> Result<()> {
    println!("🏦 Collateral engine (HBAR @ $10, min ratio 150%)");

    let position_id = engine.open("donor-alice", "HBAR")?;
    engine.deposit(position_id, dec!(100)).await?;
    println!("   deposited 100 HBAR ($1000)");

    let position = engine.mint(position_id, dec!(500)).await?;
    let ratio = engine
        .get(position_id)?
        .collateral_ratio
        .map(|r| r.to_string())
        .unwrap_or_default();
    println!("   minted 500 OFD, debt {} (ratio {})", position.debt_ofd, ratio);

    let refused = engine.mint(position_id, dec!(300)).await;
    println!("   mint 300 more refused: {}", refused.unwrap_err());

    engine.repay(position_id, dec!(200)).await?;
    let position = engine.withdraw(position_id, dec!(50)).await?;
    println!(
        "   repaid 200, withdrew 50; collateral {} debt {}",
        position.collateral_amount, position.debt_ofd
    );

    let refused = engine.withdraw(position_id, dec!(100)).await;
    println!("   withdraw 100 more refused: {}\n", refused.unwrap_err());
    Ok(())
}
