//! daily expiration scan: threshold notices, EXPIRING_SOON flips and quotation expiry

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Serialize, Serializer};
use tracing as log;
use uuid::Uuid;

use crate::config::ExpirationConfig;
use crate::errors::{LifecycleError, Result};
use crate::events::{notice_key, Event, EventStore};
use crate::gateway::{ChangeSet, NotificationGateway, PersistenceGateway, Write};
use crate::lifecycle::{
    lease_machine, quotation_machine, LeaseContext, QuotationContext, StateMachine,
};
use crate::state::{ExpirationNotice, LeaseAccount, QuotationAccount, Versioned};
use crate::types::{LeaseId, LeaseStatus, LeaseTrigger, QuotationStatus};

/// step of the scan a failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStage {
    Lease,
    Quotation,
    Publish,
}

/// one isolated failure; the rest of the batch still runs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanFailure {
    pub id: Uuid,
    pub stage: ScanStage,
    #[serde(serialize_with = "error_message")]
    pub error: LifecycleError,
    /// a conflict the next scan can resolve by itself
    pub retryable: bool,
}

/// notice written during a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NoticeSent {
    pub lease_id: LeaseId,
    pub threshold_days: u32,
}

/// outcome of one scan run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub scan_date: NaiveDate,
    pub scanned: usize,
    pub transitioned: Vec<LeaseId>,
    pub notices: Vec<NoticeSent>,
    pub expired_quotations: Vec<Uuid>,
    pub failures: Vec<ScanFailure>,
    /// events delivered to the notification gateway
    pub published: Vec<Event>,
}

impl ScanReport {
    fn new(scan_date: NaiveDate) -> Self {
        Self {
            scan_date,
            scanned: 0,
            transitioned: Vec::new(),
            notices: Vec::new(),
            expired_quotations: Vec::new(),
            failures: Vec::new(),
            published: Vec::new(),
        }
    }

    pub fn notification_count(&self) -> usize {
        self.published
            .iter()
            .filter(|e| matches!(e, Event::LeaseExpirationNotice { .. }))
            .count()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn fail(&mut self, id: Uuid, stage: ScanStage, error: LifecycleError) {
        let retryable = error.is_retryable();
        log::warn!(%id, ?stage, retryable, %error, "expiration scan item failed");
        self.failures.push(ScanFailure {
            id,
            stage,
            error,
            retryable,
        });
    }
}

fn error_message<S: Serializer>(error: &LifecycleError, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// writes and events planned for one lease
struct LeasePlan {
    changes: ChangeSet,
    events: EventStore,
    transitioned: bool,
    notices: Vec<NoticeSent>,
}

/// expiration monitor run once per day by the scheduler
#[derive(Debug)]
pub struct ExpirationMonitor {
    config: ExpirationConfig,
    leases: StateMachine<LeaseAccount, LeaseContext>,
    quotations: StateMachine<QuotationAccount, QuotationContext>,
}

impl ExpirationMonitor {
    pub fn new(config: ExpirationConfig) -> Self {
        Self {
            config,
            leases: lease_machine(),
            quotations: quotation_machine(),
        }
    }

    pub fn config(&self) -> &ExpirationConfig {
        &self.config
    }

    /// thresholds crossed at `days_remaining` that have no notice yet, descending
    pub fn due_thresholds(&self, days_remaining: i64, already_sent: &HashSet<u32>) -> Vec<u32> {
        self.config
            .notice_thresholds
            .iter()
            .copied()
            .filter(|t| days_remaining <= i64::from(*t) && !already_sent.contains(t))
            .collect()
    }

    /// scan every open lease, each in its own commit; only loading the
    /// candidate list can fail the whole run
    pub fn run<P, N>(
        &self,
        today: NaiveDate,
        now: DateTime<Utc>,
        store: &P,
        notifier: &N,
    ) -> Result<ScanReport>
    where
        P: PersistenceGateway + ?Sized,
        N: NotificationGateway + ?Sized,
    {
        let mut report = ScanReport::new(today);
        let window = i64::from(self.config.expiring_window_days);

        let candidates: Vec<_> = store
            .leases_with_status(&[LeaseStatus::Active, LeaseStatus::ExpiringSoon])?
            .into_iter()
            .filter(|row| row.value.days_remaining(today) <= window)
            .collect();

        log::info!(scan_date = %today, candidates = candidates.len(), "starting expiration scan");

        for row in candidates {
            report.scanned += 1;
            let lease_id = row.value.id;

            let plan = match self.plan_lease(&row, today, now, store) {
                Ok(Some(plan)) => plan,
                Ok(None) => continue,
                Err(error) => {
                    report.fail(lease_id, ScanStage::Lease, error);
                    continue;
                }
            };

            let LeasePlan {
                changes,
                mut events,
                transitioned,
                notices,
            } = plan;

            if let Err(error) = store.commit(changes) {
                report.fail(lease_id, ScanStage::Lease, error);
                continue;
            }

            if transitioned {
                report.transitioned.push(lease_id);
            }
            report.notices.extend(notices);
            self.publish(events.take_events(), notifier, &mut report);
        }

        if self.config.expire_quotations {
            self.expire_quotations(today, now, store, notifier, &mut report)?;
        }

        log::info!(
            scan_date = %today,
            scanned = report.scanned,
            transitioned = report.transitioned.len(),
            notices = report.notices.len(),
            expired_quotations = report.expired_quotations.len(),
            failures = report.failures.len(),
            "expiration scan finished"
        );

        Ok(report)
    }

    fn plan_lease<P>(
        &self,
        row: &Versioned<LeaseAccount>,
        today: NaiveDate,
        now: DateTime<Utc>,
        store: &P,
    ) -> Result<Option<LeasePlan>>
    where
        P: PersistenceGateway + ?Sized,
    {
        let lease = &row.value;
        let days_remaining = lease.days_remaining(today);

        let sent: HashSet<u32> = store
            .notices(lease.id)?
            .into_iter()
            .map(|n| n.threshold_days)
            .collect();
        let due = self.due_thresholds(days_remaining, &sent);

        let transitioned = lease.status == LeaseStatus::Active;
        if due.is_empty() && !transitioned {
            log::debug!(lease_id = %lease.id, days_remaining, "nothing due");
            return Ok(None);
        }

        let mut changes = ChangeSet::new();
        let mut events = EventStore::new();

        // the lease row is always written at the version read, so a checkout
        // committed since then rejects the notices as well
        let updated = if transitioned {
            let ctx = LeaseContext::new(today, LeaseTrigger::DailyScan, self.config.expiring_window_days);
            let updated = self.leases.transition(lease, LeaseStatus::ExpiringSoon, &ctx)?;
            events.emit(Event::LeaseStatusChanged {
                lease_id: lease.id,
                old_status: lease.status,
                new_status: LeaseStatus::ExpiringSoon,
                reason: format!("{days_remaining} days remaining"),
                timestamp: now,
            });
            updated
        } else {
            lease.clone()
        };
        changes = changes.lease(Write::update(row.version, updated));

        let mut notices = Vec::with_capacity(due.len());
        for threshold_days in due {
            changes = changes.notice(ExpirationNotice {
                lease_account_id: lease.id,
                threshold_days,
                sent_at: now,
            });
            events.emit(Event::LeaseExpirationNotice {
                lease_id: lease.id,
                tenant_id: lease.tenant_id,
                threshold_days,
                days_remaining,
                lease_end: lease.lease_end,
                auto_renewal: lease.auto_renewal,
                idempotency_key: notice_key(lease.id, threshold_days),
                timestamp: now,
            });
            notices.push(NoticeSent {
                lease_id: lease.id,
                threshold_days,
            });
        }

        Ok(Some(LeasePlan {
            changes,
            events,
            transitioned,
            notices,
        }))
    }

    fn expire_quotations<P, N>(
        &self,
        today: NaiveDate,
        now: DateTime<Utc>,
        store: &P,
        notifier: &N,
        report: &mut ScanReport,
    ) -> Result<()>
    where
        P: PersistenceGateway + ?Sized,
        N: NotificationGateway + ?Sized,
    {
        let ctx = QuotationContext { today };

        for row in store.quotations_with_status(QuotationStatus::Sent)? {
            let quotation = &row.value;
            if !quotation.is_past_validity(today) {
                continue;
            }

            let expired = match self.quotations.transition(quotation, QuotationStatus::Expired, &ctx) {
                Ok(expired) => expired,
                Err(error) => {
                    report.fail(quotation.id, ScanStage::Quotation, error);
                    continue;
                }
            };

            if let Err(error) = store.commit(ChangeSet::new().quotation(Write::update(row.version, expired))) {
                report.fail(quotation.id, ScanStage::Quotation, error);
                continue;
            }

            report.expired_quotations.push(quotation.id);
            let events = vec![
                Event::QuotationStatusChanged {
                    quotation_id: quotation.id,
                    old_status: QuotationStatus::Sent,
                    new_status: QuotationStatus::Expired,
                    timestamp: now,
                },
                Event::QuotationExpired {
                    quotation_id: quotation.id,
                    validity_date: quotation.validity_date,
                    timestamp: now,
                },
            ];
            self.publish(events, notifier, report);
        }

        Ok(())
    }

    // the commit already happened, so a delivery failure is reported, not undone
    fn publish<N>(&self, events: Vec<Event>, notifier: &N, report: &mut ScanReport)
    where
        N: NotificationGateway + ?Sized,
    {
        for event in events {
            match notifier.publish(&event) {
                Ok(()) => report.published.push(event),
                Err(error) => report.fail(event.aggregate_id(), ScanStage::Publish, error),
            }
        }
    }
}

impl Default for ExpirationMonitor {
    fn default() -> Self {
        Self::new(ExpirationConfig::default())
    }
}
