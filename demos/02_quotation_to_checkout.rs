/// full lifecycle - lead, quotation, lease, early checkout and refund
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use lease_lifecycle_rs::{
    CheckoutData, ConversionRequest, EarlyTerminationClause, InMemoryLedger, InMemoryStore,
    Lead, LeadStatus, LifecycleConfig, LifecycleOrchestrator, Money, ParkingSpot,
    QuotationAccount, QuotationStatus, RandomIds, RecordingNotifier, SafeTimeProvider,
    TimeSource, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    println!("=== quotation to checkout ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()
    ));
    let engine = LifecycleOrchestrator::new(
        InMemoryStore::new(),
        RecordingNotifier::new(),
        InMemoryLedger::new(),
        time,
        RandomIds,
        LifecycleConfig::default().with_approval_threshold(Money::from_major(3_000)),
    )?;

    // lead and quotation
    let lead = Lead::new("Omar Khalil");
    engine.store().insert_lead(lead.clone())?;
    engine.transition_lead(lead.id, LeadStatus::Contacted)?;

    let mut quotation = QuotationAccount::draft(
        Uuid::new_v4(),
        NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
        Money::from_major(6_000),
    );
    quotation.lead_id = Some(lead.id);
    quotation.service_charge = Money::from_major(300);
    quotation.parking_spots = 1;
    quotation.parking_fee_per_spot = Money::from_major(200);
    quotation.security_deposit = Money::from_major(12_000);
    quotation.admin_fee = Money::from_major(750);
    engine.store().insert_quotation(quotation.clone())?;

    engine.transition_quotation(quotation.id, QuotationStatus::Sent)?;
    engine.transition_quotation(quotation.id, QuotationStatus::Accepted)?;

    let due = engine.first_payment(quotation.id)?;
    println!("first payment due: {} (monthly {})", due.total, due.monthly_portion());

    // convert into a lease with one parking spot
    let spot = ParkingSpot::new("B2-14");
    engine.store().insert_parking_spot(spot.clone())?;
    let converted = engine.convert_quotation(
        quotation.id,
        ConversionRequest {
            tenant_id: Uuid::new_v4(),
            lease_start: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            lease_end: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
            parking_spot_ids: vec![spot.id],
            auto_renewal: false,
            early_termination: Some(EarlyTerminationClause { penalty_cap_months: None }),
        },
    )?;
    let lease = converted.lease;
    println!("lease {} active, monthly total {}", lease.id, lease.total_monthly());

    // six months later the tenant leaves early owing one invoice
    engine.clock().test_control().unwrap().advance(Duration::days(200));
    engine.ledger().set_balances(lease.id, vec![Money::from_major(6_500)]);

    let settlement = engine
        .complete_checkout(lease.id, CheckoutData::new(NaiveDate::from_ymd_opt(2025, 9, 15).unwrap(), Uuid::new_v4()))?
        .settlement;
    for deduction in &settlement.deductions {
        println!("  {:<28} {}", deduction.category.to_string(), deduction.amount);
    }
    println!("net refund {} ({:?})", settlement.net_refund, settlement.refund_status);

    // refund workflow
    let manager = Uuid::new_v4();
    if settlement.net_refund.is_positive() {
        engine.approve_settlement(settlement.id, manager)?;
        engine.start_refund_processing(settlement.id, manager)?;
        let done = engine.complete_refund(settlement.id, manager)?;
        println!("refund {:?} at {:?}", done.refund_status, done.processed_at);
    } else {
        println!("tenant owes {}", settlement.amount_owed());
    }

    println!("\nevents delivered: {}", engine.notifier().published().len());

    Ok(())
}
