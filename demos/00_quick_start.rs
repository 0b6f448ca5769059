/// quick start - extend a lease and check the tenant out
use chrono::{NaiveDate, TimeZone, Utc};
use lease_lifecycle_rs::{
    CheckoutData, Deduction, DeductionCategory, ExtensionRequest, InMemoryLedger, InMemoryStore,
    InspectionItem, ItemCondition, LeaseAccount, LifecycleConfig, LifecycleOrchestrator, Money,
    RandomIds, RecordingNotifier, RentAdjustment, SafeTimeProvider, TimeSource, Uuid,
};
use lease_lifecycle_rs::orchestrator::rent_change_percent;
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2025, 11, 1, 9, 0, 0).unwrap()
    ));
    let engine = LifecycleOrchestrator::new(
        InMemoryStore::new(),
        RecordingNotifier::new(),
        InMemoryLedger::new(),
        time,
        RandomIds,
        LifecycleConfig::default(),
    )?;

    // a one-year lease at 5,000 a month
    let lease = LeaseAccount::builder()
        .term(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), NaiveDate::from_ymd_opt(2025, 12, 31).unwrap())
        .base_rent(Money::from_major(5_000))
        .service_charge(Money::from_major(250))
        .security_deposit(Money::from_major(10_000))
        .build()?;
    engine.store().insert_lease(lease.clone())?;

    // renew for another year with a 5% increase
    let renewal = engine.extend_lease(
        lease.id,
        ExtensionRequest {
            new_end_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            adjustment: RentAdjustment::Percentage(dec!(5)),
            requested_by: Uuid::new_v4(),
        },
    )?;
    println!(
        "rent {} -> {} ({}%)",
        renewal.extension.previous_rent,
        renewal.extension.new_rent,
        rent_change_percent(&renewal.extension)
    );

    // move out at the end of the new term
    let checkout = CheckoutData::new(NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(), Uuid::new_v4())
        .with_inspection(InspectionItem::new("kitchen cabinets", ItemCondition::Damaged, Money::from_major(3_000)))
        .with_deduction(Deduction::manual(DeductionCategory::Cleaning, Money::from_major(500), "end of tenancy clean"));
    let result = engine.complete_checkout(lease.id, checkout)?;

    println!("{}", serde_json::to_string_pretty(&result.settlement)?);

    Ok(())
}
