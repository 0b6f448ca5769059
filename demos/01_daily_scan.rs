/// daily scan - threshold notices as leases approach their end date
use chrono::{Duration, TimeZone, Utc};
use lease_lifecycle_rs::{
    Clock, InMemoryLedger, InMemoryStore, LeaseAccount, LifecycleConfig, LifecycleOrchestrator,
    Money, RandomIds, RecordingNotifier, SafeTimeProvider, TimeSource,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== daily scan example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2025, 1, 1, 2, 0, 0).unwrap()
    ));
    let engine = LifecycleOrchestrator::new(
        InMemoryStore::new(),
        RecordingNotifier::new(),
        InMemoryLedger::new(),
        time,
        RandomIds,
        LifecycleConfig::default(),
    )?;

    let today = engine.clock().today();
    for days_left in [90, 45, 20, 7] {
        let lease = LeaseAccount::builder()
            .term(today - Duration::days(365), today + Duration::days(days_left))
            .base_rent(Money::from_major(4_000))
            .build()?;
        engine.store().insert_lease(lease)?;
    }

    // one scan per day for five weeks
    let controller = engine.clock().test_control().unwrap();
    for _ in 0..35 {
        let report = engine.run_daily_scan_now()?;
        if !report.notices.is_empty() || !report.transitioned.is_empty() {
            println!(
                "{}: {} notice(s), {} lease(s) now expiring soon",
                report.scan_date,
                report.notices.len(),
                report.transitioned.len()
            );
        }
        controller.advance(Duration::days(1));
    }

    // re-running a day never repeats a notice
    let again = engine.run_daily_scan_now()?;
    println!("\nrepeat scan sent {} notice(s)", again.notification_count());
    println!("{}", again.to_json_pretty()?);

    Ok(())
}
