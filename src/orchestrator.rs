//! lifecycle orchestrator: validate, calculate, transition, commit, then publish

use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing as log;
use uuid::Uuid;

use crate::config::LifecycleConfig;
use crate::errors::{LifecycleError, Result};
use crate::events::{Event, EventStore};
use crate::expiration::{ExpirationMonitor, ScanReport};
use crate::gateway::{
    ChangeSet, Clock, IdGenerator, InvoiceLedger, NotificationGateway, PersistenceGateway, Write,
};
use crate::lifecycle::{LeaseContext, Machines, ParkingContext, QuotationContext, RefundContext};
use crate::pricing::{first_payment, FirstPaymentBreakdown, ParkingCharge, RentAdjustmentCalculator};
use crate::settlement::{CheckoutData, DepositSettlementCalculator, EarlyTerminationPenalty};
use crate::state::{
    DepositSettlement, EarlyTerminationClause, Lead, LeaseAccount, LeaseExtension, ParkingSpot,
    QuotationAccount, Versioned,
};
use crate::types::{
    LeadId, LeadStatus, LeaseId, LeaseStatus, LeaseTrigger, ParkingSpotId, ParkingSpotStatus,
    ParkingTrigger, QuotationId, QuotationStatus, RefundStatus, RentAdjustment, SettlementId,
};

/// renewal request from the property manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionRequest {
    pub new_end_date: NaiveDate,
    pub adjustment: RentAdjustment,
    pub requested_by: Uuid,
}

/// outcome of a successful extension
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionResult {
    pub lease: LeaseAccount,
    pub extension: LeaseExtension,
    pub events: Vec<Event>,
}

/// outcome of a completed checkout
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementResult {
    pub settlement: DepositSettlement,
    pub lease: LeaseAccount,
    pub released_spots: Vec<ParkingSpotId>,
    pub penalty: Option<EarlyTerminationPenalty>,
    pub events: Vec<Event>,
}

/// lease terms supplied when an accepted quotation becomes a lease
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub tenant_id: Uuid,
    pub lease_start: NaiveDate,
    pub lease_end: NaiveDate,
    /// must match the number of spots on the quotation
    pub parking_spot_ids: Vec<ParkingSpotId>,
    pub auto_renewal: bool,
    pub early_termination: Option<EarlyTerminationClause>,
}

/// outcome of a quotation conversion
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    pub quotation: QuotationAccount,
    pub lease: LeaseAccount,
    pub lead: Option<Lead>,
    pub events: Vec<Event>,
}

fn found<T>(row: Option<T>, entity: &'static str, id: Uuid) -> Result<T> {
    row.ok_or(LifecycleError::NotFound { entity, id })
}

// a non-empty confirmation list must name exactly the lease's spots, each once
fn confirm_released_spots(lease: &LeaseAccount, confirmed: &[ParkingSpotId]) -> Result<()> {
    if confirmed.is_empty() {
        return Ok(());
    }
    let listed: HashSet<ParkingSpotId> = confirmed.iter().copied().collect();
    let held: HashSet<ParkingSpotId> = lease.parking_spot_ids.iter().copied().collect();
    if listed.len() != confirmed.len() || listed != held {
        return Err(LifecycleError::GuardRejected {
            entity: "parking spot",
            from: format!("{:?}", ParkingSpotStatus::Assigned),
            to: format!("{:?}", ParkingSpotStatus::Available),
            reason: format!(
                "checkout lists {} spot(s) but lease {} holds {}; every spot must be released exactly once",
                confirmed.len(),
                lease.id,
                held.len()
            ),
        });
    }
    Ok(())
}

/// composes the calculators, state machines and gateways into business operations
pub struct LifecycleOrchestrator<P, N, L, C, I> {
    store: P,
    notifier: N,
    ledger: L,
    clock: C,
    ids: I,
    config: LifecycleConfig,
    machines: Machines,
    monitor: ExpirationMonitor,
    deposits: DepositSettlementCalculator,
}

impl<P, N, L, C, I> LifecycleOrchestrator<P, N, L, C, I>
where
    P: PersistenceGateway,
    N: NotificationGateway,
    L: InvoiceLedger,
    C: Clock,
    I: IdGenerator,
{
    pub fn new(store: P, notifier: N, ledger: L, clock: C, ids: I, config: LifecycleConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            monitor: ExpirationMonitor::new(config.expiration.clone()),
            deposits: DepositSettlementCalculator::new(config.settlement.clone()),
            machines: Machines::new(),
            store,
            notifier,
            ledger,
            clock,
            ids,
            config,
        })
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    // ----- leases -----

    /// renew a lease: new end date, adjusted rent, immutable extension record
    #[tracing::instrument(skip_all, fields(lease_id = %lease_id, new_end = %request.new_end_date))]
    pub fn extend_lease(&self, lease_id: LeaseId, request: ExtensionRequest) -> Result<ExtensionResult> {
        let row = self.load_lease(lease_id)?;
        let lease = &row.value;

        if lease.is_terminated() {
            return Err(LifecycleError::AlreadyTerminated { lease_id });
        }
        LifecycleError::ensure_after(request.new_end_date, lease.lease_end, "new end date")?;

        let quote = RentAdjustmentCalculator::compute_extension(
            lease.base_rent,
            lease.service_charge,
            request.adjustment,
            Some(ParkingCharge {
                spots: lease.parking_spot_ids.len() as u32,
                fee_per_spot: lease.parking_fee_per_spot,
            }),
        )?;

        let today = self.clock.today();
        let now = self.clock.now();
        let window = self.config.expiration.expiring_window_days;

        let mut extended = lease.clone();
        extended.lease_end = request.new_end_date;
        extended.base_rent = quote.new_base_rent;

        let mut events = EventStore::new();
        if extended.status == LeaseStatus::ExpiringSoon
            && extended.days_remaining(today) > i64::from(window)
        {
            let ctx = LeaseContext::new(today, LeaseTrigger::Extension, window);
            extended = self.machines.lease.transition(&extended, LeaseStatus::Active, &ctx)?;
            events.emit(Event::LeaseStatusChanged {
                lease_id,
                old_status: LeaseStatus::ExpiringSoon,
                new_status: LeaseStatus::Active,
                reason: format!("extended to {}", request.new_end_date),
                timestamp: now,
            });
        }

        let extension = LeaseExtension {
            id: self.ids.next_id(),
            lease_account_id: lease_id,
            previous_end_date: lease.lease_end,
            new_end_date: request.new_end_date,
            previous_rent: quote.previous_base_rent,
            new_rent: quote.new_base_rent,
            adjustment_type: quote.adjustment_type,
            adjustment_value: quote.adjustment_value,
            extended_at: now,
            extended_by: request.requested_by,
        };
        events.emit(Event::ExtensionCompleted {
            lease_id,
            extension_id: extension.id,
            previous_end_date: extension.previous_end_date,
            new_end_date: extension.new_end_date,
            previous_rent: extension.previous_rent,
            new_rent: extension.new_rent,
            adjustment_type: extension.adjustment_type,
            timestamp: now,
        });

        self.store.commit(
            ChangeSet::new()
                .lease(Write::update(row.version, extended.clone()))
                .extension(extension.clone()),
        )?;

        log::info!(
            previous_rent = %extension.previous_rent,
            new_rent = %extension.new_rent,
            change_pct = %rent_change_percent(&extension),
            status = ?extended.status,
            "lease extended"
        );

        let events = self.publish(events.take_events());
        Ok(ExtensionResult {
            lease: extended,
            extension,
            events,
        })
    }

    /// terminate the lease, settle the deposit and release its parking spots
    #[tracing::instrument(skip_all, fields(lease_id = %lease_id, move_out = %checkout.move_out_date))]
    pub fn complete_checkout(&self, lease_id: LeaseId, checkout: CheckoutData) -> Result<SettlementResult> {
        let row = self.load_lease(lease_id)?;
        let lease = &row.value;

        if lease.is_terminated() || self.store.settlement_for_lease(lease_id)?.is_some() {
            return Err(LifecycleError::AlreadyCheckedOut { lease_id });
        }
        if checkout.move_out_date < lease.lease_start {
            return Err(LifecycleError::invalid_date(format!(
                "move-out {} is before lease start {}",
                checkout.move_out_date, lease.lease_start
            )));
        }

        let outstanding = self.ledger.outstanding_balances(lease_id)?;
        let draft = self.deposits.settle(lease, &checkout, &outstanding)?;

        let today = self.clock.today();
        let now = self.clock.now();
        let ctx = LeaseContext::new(today, LeaseTrigger::Checkout, self.config.expiration.expiring_window_days);
        let mut terminated = self.machines.lease.transition(lease, LeaseStatus::Terminated, &ctx)?;
        terminated.terminated_on = Some(checkout.move_out_date);

        let to_release = lease.parking_spot_ids.clone();
        confirm_released_spots(lease, &checkout.parking_spot_ids)?;

        let mut changes = ChangeSet::new();
        let mut events = EventStore::new();
        events.emit(Event::LeaseStatusChanged {
            lease_id,
            old_status: lease.status,
            new_status: LeaseStatus::Terminated,
            reason: "checkout completed".to_string(),
            timestamp: now,
        });

        // any spot that cannot be released fails the whole checkout
        let release = ParkingContext::new(ParkingTrigger::CheckoutRelease);
        for spot_id in &to_release {
            let spot_row = found(self.store.parking_spot(*spot_id)?, "parking spot", *spot_id)?;
            if spot_row.value.assigned_lease != Some(lease_id) {
                return Err(LifecycleError::GuardRejected {
                    entity: "parking spot",
                    from: format!("{:?}", spot_row.value.status),
                    to: format!("{:?}", ParkingSpotStatus::Available),
                    reason: format!("spot {} is not assigned to lease {lease_id}", spot_row.value.code),
                });
            }
            let mut released = self.machines.parking.transition(&spot_row.value, ParkingSpotStatus::Available, &release)?;
            released.assigned_lease = None;
            changes = changes.parking_spot(Write::update(spot_row.version, released));
            events.emit(Event::ParkingSpotStatusChanged {
                spot_id: *spot_id,
                old_status: spot_row.value.status,
                new_status: ParkingSpotStatus::Available,
                lease_id: Some(lease_id),
                timestamp: now,
            });
        }
        terminated.parking_spot_ids.clear();

        let penalty = draft.penalty;
        let settlement = draft.into_settlement(self.ids.next_id(), lease_id, now);

        events.emit(Event::CheckoutCompleted {
            lease_id,
            move_out_date: checkout.move_out_date,
            early_termination: penalty.is_some(),
            released_spots: to_release.clone(),
            processed_by: checkout.processed_by,
            timestamp: now,
        });
        events.emit(Event::DepositCalculated {
            lease_id,
            settlement_id: settlement.id,
            original_deposit: settlement.original_deposit,
            total_deductions: settlement.total_deductions,
            net_refund: settlement.net_refund,
            amount_owed_by_tenant: settlement.amount_owed_by_tenant,
            refund_status: settlement.refund_status,
            timestamp: now,
        });

        self.store.commit(
            changes
                .lease(Write::update(row.version, terminated.clone()))
                .settlement(Write::insert(settlement.clone())),
        )?;

        log::info!(
            settlement_id = %settlement.id,
            net_refund = %settlement.net_refund,
            refund_status = ?settlement.refund_status,
            released = to_release.len(),
            "checkout completed"
        );

        let events = self.publish(events.take_events());
        Ok(SettlementResult {
            settlement,
            lease: terminated,
            released_spots: to_release,
            penalty,
            events,
        })
    }

    /// daily expiration scan against the configured thresholds
    pub fn run_daily_scan(&self, today: NaiveDate) -> Result<ScanReport> {
        self.monitor.run(today, self.clock.now(), &self.store, &self.notifier)
    }

    /// scan using the clock's current date
    pub fn run_daily_scan_now(&self) -> Result<ScanReport> {
        self.run_daily_scan(self.clock.today())
    }

    /// renewals of a lease, oldest first
    pub fn extension_history(&self, lease_id: LeaseId) -> Result<Vec<LeaseExtension>> {
        self.load_lease(lease_id)?;
        self.store.extensions(lease_id)
    }

    // ----- deposit refunds -----

    #[tracing::instrument(skip_all, fields(settlement_id = %settlement_id, approver = %approver_id))]
    pub fn approve_settlement(&self, settlement_id: SettlementId, approver_id: Uuid) -> Result<DepositSettlement> {
        let now = self.clock.now();
        let (settlement, mut events) = self.change_refund_status(
            settlement_id,
            RefundStatus::Approved,
            RefundContext::by(approver_id),
            "approved",
            |s, _| {
                s.approved_by = Some(approver_id);
                s.approved_at = Some(now);
            },
        )?;
        events.push(Event::SettlementApproved {
            settlement_id,
            lease_id: settlement.lease_account_id,
            approved_by: approver_id,
            net_refund: settlement.net_refund,
            timestamp: now,
        });
        self.publish(events);
        Ok(settlement)
    }

    /// park a settlement until the dispute or query is resolved
    pub fn hold_settlement(&self, settlement_id: SettlementId, actor: Uuid, reason: impl Into<String>) -> Result<DepositSettlement> {
        let reason = reason.into();
        let held_reason = reason.clone();
        let (settlement, events) = self.change_refund_status(
            settlement_id,
            RefundStatus::OnHold,
            RefundContext::by(actor),
            &reason,
            move |s, previous| {
                s.held_from = Some(previous);
                s.hold_reason = Some(held_reason);
            },
        )?;
        self.publish(events);
        Ok(settlement)
    }

    /// return a held settlement to the status it was held from
    pub fn release_settlement_hold(&self, settlement_id: SettlementId, actor: Uuid) -> Result<DepositSettlement> {
        let row = self.load_settlement(settlement_id)?;
        let target = match (row.value.refund_status, row.value.held_from) {
            (RefundStatus::OnHold, Some(target)) => target,
            (status, _) => {
                return Err(LifecycleError::InvalidTransition {
                    entity: self.machines.refund.entity(),
                    from: format!("{status:?}"),
                    to: "released".to_string(),
                })
            }
        };

        let (settlement, events) = self.change_refund_status(
            settlement_id,
            target,
            RefundContext::by(actor),
            "hold released",
            |s, _| {
                s.held_from = None;
                s.hold_reason = None;
            },
        )?;
        self.publish(events);
        Ok(settlement)
    }

    pub fn start_refund_processing(&self, settlement_id: SettlementId, actor: Uuid) -> Result<DepositSettlement> {
        let (settlement, events) = self.change_refund_status(
            settlement_id,
            RefundStatus::Processing,
            RefundContext::by(actor),
            "refund processing started",
            |_, _| {},
        )?;
        self.publish(events);
        Ok(settlement)
    }

    pub fn complete_refund(&self, settlement_id: SettlementId, actor: Uuid) -> Result<DepositSettlement> {
        let now = self.clock.now();
        let (settlement, events) = self.change_refund_status(
            settlement_id,
            RefundStatus::Completed,
            RefundContext::by(actor),
            "refund paid out",
            |s, _| s.processed_at = Some(now),
        )?;
        self.publish(events);
        Ok(settlement)
    }

    /// commit a refund status change; returns the settlement and the events still to publish
    fn change_refund_status<F>(
        &self,
        settlement_id: SettlementId,
        target: RefundStatus,
        ctx: RefundContext,
        reason: &str,
        update: F,
    ) -> Result<(DepositSettlement, Vec<Event>)>
    where
        F: FnOnce(&mut DepositSettlement, RefundStatus),
    {
        let row = self.load_settlement(settlement_id)?;
        let previous = row.value.refund_status;

        // guards see the stored settlement; side fields follow the new status
        let mut updated = self.machines.refund.transition(&row.value, target, &ctx)?;
        update(&mut updated, previous);

        self.store
            .commit(ChangeSet::new().settlement(Write::update(row.version, updated.clone())))?;

        log::info!(%settlement_id, from = ?previous, to = ?target, "refund status changed");

        let events = vec![Event::RefundStatusChanged {
            settlement_id,
            lease_id: updated.lease_account_id,
            old_status: previous,
            new_status: target,
            reason: reason.to_string(),
            timestamp: self.clock.now(),
        }];
        Ok((updated, events))
    }

    // ----- pre-lease pipeline -----

    pub fn transition_lead(&self, lead_id: LeadId, target: LeadStatus) -> Result<Lead> {
        let row = found(self.store.lead(lead_id)?, "lead", lead_id)?;
        let updated = self.machines.lead.transition(&row.value, target, &())?;

        self.store
            .commit(ChangeSet::new().lead(Write::update(row.version, updated.clone())))?;
        log::info!(%lead_id, from = ?row.value.status, to = ?target, "lead status changed");

        self.publish(vec![Event::LeadStatusChanged {
            lead_id,
            old_status: row.value.status,
            new_status: target,
            timestamp: self.clock.now(),
        }]);
        Ok(updated)
    }

    /// move a quotation through DRAFT/SENT/ACCEPTED/REJECTED/EXPIRED; the
    /// linked lead follows when its own graph allows it
    pub fn transition_quotation(&self, quotation_id: QuotationId, target: QuotationStatus) -> Result<QuotationAccount> {
        let row = self.load_quotation(quotation_id)?;
        let quotation = &row.value;

        if target == QuotationStatus::Converted {
            return Err(LifecycleError::GuardRejected {
                entity: self.machines.quotation.entity(),
                from: format!("{:?}", quotation.status),
                to: format!("{target:?}"),
                reason: "conversion must create the lease".to_string(),
            });
        }

        let ctx = QuotationContext { today: self.clock.today() };
        let updated = self.machines.quotation.transition(quotation, target, &ctx)?;
        let now = self.clock.now();

        let mut changes = ChangeSet::new().quotation(Write::update(row.version, updated.clone()));
        let mut events = EventStore::new();
        events.emit(Event::QuotationStatusChanged {
            quotation_id,
            old_status: quotation.status,
            new_status: target,
            timestamp: now,
        });
        if target == QuotationStatus::Expired {
            events.emit(Event::QuotationExpired {
                quotation_id,
                validity_date: quotation.validity_date,
                timestamp: now,
            });
        }

        let lead_target = match target {
            QuotationStatus::Sent => Some(LeadStatus::QuotationSent),
            QuotationStatus::Accepted => Some(LeadStatus::Accepted),
            _ => None,
        };
        if let (Some(lead_id), Some(lead_target)) = (quotation.lead_id, lead_target) {
            changes = self.follow_lead(lead_id, lead_target, changes, &mut events)?.0;
        }

        self.store.commit(changes)?;
        log::info!(%quotation_id, from = ?quotation.status, to = ?target, "quotation status changed");

        self.publish(events.take_events());
        Ok(updated)
    }

    /// turn an accepted quotation into an ACTIVE lease with its parking spots assigned
    #[tracing::instrument(skip_all, fields(quotation_id = %quotation_id))]
    pub fn convert_quotation(&self, quotation_id: QuotationId, request: ConversionRequest) -> Result<ConversionResult> {
        let row = self.load_quotation(quotation_id)?;
        let quotation = &row.value;

        let ctx = QuotationContext { today: self.clock.today() };
        let converted = self.machines.quotation.transition(quotation, QuotationStatus::Converted, &ctx)?;

        if request.parking_spot_ids.len() != quotation.parking_spots as usize {
            return Err(LifecycleError::GuardRejected {
                entity: self.machines.quotation.entity(),
                from: format!("{:?}", quotation.status),
                to: format!("{:?}", QuotationStatus::Converted),
                reason: format!(
                    "quotation includes {} parking spot(s), {} supplied",
                    quotation.parking_spots,
                    request.parking_spot_ids.len()
                ),
            });
        }

        let mut builder = LeaseAccount::builder()
            .id(self.ids.next_id())
            .unit_id(quotation.unit_id)
            .tenant_id(request.tenant_id)
            .term(request.lease_start, request.lease_end)
            .base_rent(quotation.base_rent)
            .service_charge(quotation.service_charge)
            .security_deposit(quotation.security_deposit)
            .parking(request.parking_spot_ids.clone(), quotation.parking_fee_per_spot)
            .auto_renewal(request.auto_renewal);
        if let Some(clause) = request.early_termination {
            builder = builder.early_termination(clause);
        }
        let lease = builder.build()?;
        let now = self.clock.now();

        let mut changes = ChangeSet::new()
            .quotation(Write::update(row.version, converted.clone()))
            .lease(Write::insert(lease.clone()));
        let mut events = EventStore::new();
        events.emit(Event::QuotationStatusChanged {
            quotation_id,
            old_status: quotation.status,
            new_status: QuotationStatus::Converted,
            timestamp: now,
        });
        events.emit(Event::LeaseCreated {
            lease_id: lease.id,
            quotation_id: Some(quotation_id),
            lease_start: lease.lease_start,
            lease_end: lease.lease_end,
            monthly_total: lease.total_monthly(),
            timestamp: now,
        });

        for spot_id in &request.parking_spot_ids {
            let spot_row = found(self.store.parking_spot(*spot_id)?, "parking spot", *spot_id)?;
            let (write, event) = self.assign_spot(&spot_row, lease.id)?;
            changes = changes.parking_spot(write);
            events.emit(event);
        }

        let mut lead = None;
        if let Some(lead_id) = quotation.lead_id {
            let (next, converted_lead) = self.follow_lead(lead_id, LeadStatus::Converted, changes, &mut events)?;
            changes = next;
            lead = converted_lead;
        }

        self.store.commit(changes)?;
        log::info!(lease_id = %lease.id, monthly_total = %lease.total_monthly(), "quotation converted");

        let events = self.publish(events.take_events());
        Ok(ConversionResult {
            quotation: converted,
            lease,
            lead,
            events,
        })
    }

    /// secondary lead transition; skipped when the lead's graph has no such edge
    fn follow_lead(
        &self,
        lead_id: LeadId,
        target: LeadStatus,
        changes: ChangeSet,
        events: &mut EventStore,
    ) -> Result<(ChangeSet, Option<Lead>)> {
        let row = found(self.store.lead(lead_id)?, "lead", lead_id)?;
        if !self.machines.lead.has_edge(row.value.status, target) {
            log::debug!(%lead_id, status = ?row.value.status, to = ?target, "lead left unchanged");
            return Ok((changes, Some(row.value)));
        }

        let updated = self.machines.lead.transition(&row.value, target, &())?;
        events.emit(Event::LeadStatusChanged {
            lead_id,
            old_status: row.value.status,
            new_status: target,
            timestamp: self.clock.now(),
        });
        Ok((changes.lead(Write::update(row.version, updated.clone())), Some(updated)))
    }

    /// totals due before move-in
    pub fn first_payment(&self, quotation_id: QuotationId) -> Result<FirstPaymentBreakdown> {
        let row = self.load_quotation(quotation_id)?;
        Ok(first_payment(&row.value))
    }

    // ----- parking -----

    /// assign an available spot to an open lease; the lease starts paying for it
    pub fn assign_parking_spot(&self, spot_id: ParkingSpotId, lease_id: LeaseId) -> Result<ParkingSpot> {
        let lease_row = self.load_lease(lease_id)?;
        if lease_row.value.is_terminated() {
            return Err(LifecycleError::AlreadyTerminated { lease_id });
        }
        let spot_row = found(self.store.parking_spot(spot_id)?, "parking spot", spot_id)?;

        let (write, event) = self.assign_spot(&spot_row, lease_id)?;
        let assigned = write.value.clone();

        let mut lease = lease_row.value.clone();
        lease.parking_spot_ids.push(spot_id);

        self.store.commit(
            ChangeSet::new()
                .parking_spot(write)
                .lease(Write::update(lease_row.version, lease)),
        )?;
        log::info!(%spot_id, %lease_id, "parking spot assigned");

        self.publish(vec![event]);
        Ok(assigned)
    }

    /// take a free spot out of service, or put it back
    pub fn set_parking_maintenance(&self, spot_id: ParkingSpotId, under_maintenance: bool) -> Result<ParkingSpot> {
        let row = found(self.store.parking_spot(spot_id)?, "parking spot", spot_id)?;
        let target = if under_maintenance {
            ParkingSpotStatus::UnderMaintenance
        } else {
            ParkingSpotStatus::Available
        };

        let ctx = ParkingContext::new(ParkingTrigger::ManualEdit);
        let updated = self.machines.parking.transition(&row.value, target, &ctx)?;
        self.store
            .commit(ChangeSet::new().parking_spot(Write::update(row.version, updated.clone())))?;

        self.publish(vec![Event::ParkingSpotStatusChanged {
            spot_id,
            old_status: row.value.status,
            new_status: target,
            lease_id: None,
            timestamp: self.clock.now(),
        }]);
        Ok(updated)
    }

    fn assign_spot(&self, row: &Versioned<ParkingSpot>, lease_id: LeaseId) -> Result<(Write<ParkingSpot>, Event)> {
        let ctx = ParkingContext::new(ParkingTrigger::LeaseAssignment);
        let mut assigned = self.machines.parking.transition(&row.value, ParkingSpotStatus::Assigned, &ctx)?;
        assigned.assigned_lease = Some(lease_id);

        let event = Event::ParkingSpotStatusChanged {
            spot_id: row.value.id,
            old_status: row.value.status,
            new_status: ParkingSpotStatus::Assigned,
            lease_id: Some(lease_id),
            timestamp: self.clock.now(),
        };
        Ok((Write::update(row.version, assigned), event))
    }

    // ----- helpers -----

    fn load_lease(&self, id: LeaseId) -> Result<Versioned<LeaseAccount>> {
        found(self.store.lease(id)?, "lease", id)
    }

    fn load_settlement(&self, id: SettlementId) -> Result<Versioned<DepositSettlement>> {
        found(self.store.settlement(id)?, "deposit settlement", id)
    }

    fn load_quotation(&self, id: QuotationId) -> Result<Versioned<QuotationAccount>> {
        found(self.store.quotation(id)?, "quotation", id)
    }

    // runs after the commit; delivery failures are logged and never undo it
    fn publish(&self, events: Vec<Event>) -> Vec<Event> {
        for event in &events {
            if let Err(error) = self.notifier.publish(event) {
                log::warn!(event = event.name(), aggregate_id = %event.aggregate_id(), %error, "event not delivered");
            }
        }
        events
    }
}

/// signed rent change of an extension as a percentage of the previous rent
pub fn rent_change_percent(extension: &LeaseExtension) -> Decimal {
    let previous = extension.previous_rent.as_decimal();
    if previous.is_zero() {
        return Decimal::ZERO;
    }
    ((extension.new_rent.as_decimal() - previous) / previous * Decimal::ONE_HUNDRED).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Money;
    use crate::gateway::RandomIds;
    use crate::memory::{InMemoryLedger, InMemoryStore, RecordingNotifier};
    use crate::settlement::InspectionItem;
    use crate::state::Deduction;
    use crate::types::{DeductionCategory, ItemCondition};
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone, Utc};
    use hourglass_rs::{SafeTimeProvider, TimeSource};
    use rust_decimal_macros::dec;

    type TestOrchestrator =
        LifecycleOrchestrator<InMemoryStore, RecordingNotifier, InMemoryLedger, SafeTimeProvider, RandomIds>;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // clock starts at 2025-03-01 09:00 UTC
    fn orchestrator() -> TestOrchestrator {
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
        ));
        LifecycleOrchestrator::new(
            InMemoryStore::new(),
            RecordingNotifier::new(),
            InMemoryLedger::new(),
            time,
            RandomIds,
            LifecycleConfig::default(),
        )
        .unwrap()
    }

    fn seed_lease(o: &TestOrchestrator, end: NaiveDate, deposit: i64) -> LeaseAccount {
        let lease = LeaseAccount::builder()
            .term(date(2024, 4, 1), end)
            .base_rent(Money::from_major(5000))
            .service_charge(Money::from_major(250))
            .security_deposit(Money::from_major(deposit))
            .build()
            .unwrap();
        o.store().insert_lease(lease.clone()).unwrap();
        lease
    }

    fn seed_assigned_spot(o: &TestOrchestrator, code: &str, lease_id: LeaseId) -> ParkingSpot {
        let mut spot = ParkingSpot::new(code);
        spot.status = ParkingSpotStatus::Assigned;
        spot.assigned_lease = Some(lease_id);
        o.store().insert_parking_spot(spot.clone()).unwrap();
        spot
    }

    fn assign_new_spot(o: &TestOrchestrator, code: &str, lease_id: LeaseId) -> ParkingSpot {
        let spot = ParkingSpot::new(code);
        o.store().insert_parking_spot(spot.clone()).unwrap();
        o.assign_parking_spot(spot.id, lease_id).unwrap();
        spot
    }

    fn extension(new_end: NaiveDate, adjustment: RentAdjustment) -> ExtensionRequest {
        ExtensionRequest {
            new_end_date: new_end,
            adjustment,
            requested_by: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_percentage_extension_rounds_to_cents() {
        let o = orchestrator();
        let lease = seed_lease(&o, date(2025, 12, 31), 10_000);

        let result = o
            .extend_lease(lease.id, extension(date(2026, 12, 31), RentAdjustment::Percentage(dec!(5))))
            .unwrap();

        assert_eq!(result.lease.base_rent, Money::from_major(5250));
        assert_eq!(result.lease.base_rent.to_string(), "5250.00");
        assert_eq!(result.extension.previous_rent, Money::from_major(5000));
        assert_eq!(result.extension.previous_end_date, date(2025, 12, 31));
        assert_eq!(rent_change_percent(&result.extension), dec!(5.00));
        assert_eq!(o.extension_history(lease.id).unwrap(), vec![result.extension]);
        assert_eq!(o.notifier().count("extension_completed"), 1);
    }

    #[test]
    fn test_extension_reactivates_expiring_lease() {
        let o = orchestrator();
        let lease = seed_lease(&o, date(2025, 4, 15), 10_000);
        o.run_daily_scan_now().unwrap();
        assert_eq!(o.store().lease(lease.id).unwrap().unwrap().value.status, LeaseStatus::ExpiringSoon);

        let result = o
            .extend_lease(lease.id, extension(date(2026, 4, 15), RentAdjustment::Flat(Money::from_major(200))))
            .unwrap();

        assert_eq!(result.lease.status, LeaseStatus::Active);
        assert_eq!(result.lease.base_rent, Money::from_major(5200));
        assert_matches!(
            result.events.as_slice(),
            [Event::LeaseStatusChanged { new_status: LeaseStatus::Active, .. }, Event::ExtensionCompleted { .. }]
        );
    }

    #[test]
    fn test_short_extension_stays_expiring() {
        let o = orchestrator();
        let lease = seed_lease(&o, date(2025, 4, 1), 10_000);
        o.run_daily_scan_now().unwrap();

        let result = o
            .extend_lease(lease.id, extension(date(2025, 4, 20), RentAdjustment::None))
            .unwrap();

        assert_eq!(result.lease.status, LeaseStatus::ExpiringSoon);
        assert_eq!(result.events.len(), 1);
    }

    #[test]
    fn test_extension_must_move_end_date_forward() {
        let o = orchestrator();
        let lease = seed_lease(&o, date(2025, 12, 31), 10_000);

        for new_end in [date(2025, 12, 31), date(2025, 6, 30)] {
            let result = o.extend_lease(lease.id, extension(new_end, RentAdjustment::None));
            assert_matches!(result, Err(LifecycleError::InvalidDate { .. }));
        }

        assert_eq!(o.store().extension_count(), 0);
        assert_eq!(o.store().lease(lease.id).unwrap().unwrap().version, 1);
        assert!(o.notifier().published().is_empty());
    }

    #[test]
    fn test_extension_rejects_terminated_and_unknown_leases() {
        let o = orchestrator();
        let lease = seed_lease(&o, date(2025, 12, 31), 10_000);
        o.complete_checkout(lease.id, CheckoutData::new(date(2025, 12, 31), Uuid::new_v4()))
            .unwrap();

        assert_matches!(
            o.extend_lease(lease.id, extension(date(2026, 12, 31), RentAdjustment::None)),
            Err(LifecycleError::AlreadyTerminated { .. })
        );
        assert_matches!(
            o.extend_lease(Uuid::new_v4(), extension(date(2026, 12, 31), RentAdjustment::None)),
            Err(LifecycleError::NotFound { entity: "lease", .. })
        );
    }

    #[test]
    fn test_invalid_rent_writes_nothing() {
        let o = orchestrator();
        let lease = seed_lease(&o, date(2025, 12, 31), 10_000);

        let result = o.extend_lease(
            lease.id,
            extension(date(2026, 12, 31), RentAdjustment::Flat(Money::from_major(-6000))),
        );

        assert_matches!(result, Err(LifecycleError::InvalidAmount { .. }));
        assert_eq!(o.store().extension_count(), 0);
    }

    #[test]
    fn test_racing_extension_surfaces_conflict() {
        let o = orchestrator();
        let lease = seed_lease(&o, date(2025, 12, 31), 10_000);

        let racer = lease.clone();
        o.store().before_next_commit(move |store| {
            store
                .commit(ChangeSet::new().lease(Write::update(1, racer)))
                .unwrap();
        });

        let result = o.extend_lease(lease.id, extension(date(2026, 12, 31), RentAdjustment::None));

        assert_matches!(result, Err(LifecycleError::ConcurrentModification { entity: "lease", .. }));
        assert_eq!(o.store().extension_count(), 0);
        assert_eq!(o.store().lease(lease.id).unwrap().unwrap().value.lease_end, date(2025, 12, 31));
        assert!(o.notifier().published().is_empty());
    }

    #[test]
    fn test_publish_failure_keeps_commit() {
        let o = orchestrator();
        let lease = seed_lease(&o, date(2025, 12, 31), 10_000);
        o.notifier().fail_for(lease.id);

        let result = o
            .extend_lease(lease.id, extension(date(2026, 12, 31), RentAdjustment::None))
            .unwrap();

        assert_eq!(result.events.len(), 1);
        assert_eq!(o.store().lease(lease.id).unwrap().unwrap().value.lease_end, date(2026, 12, 31));
        assert!(o.notifier().published().is_empty());
    }

    #[test]
    fn test_checkout_routes_large_refund_to_approval() {
        let o = orchestrator();
        let lease = seed_lease(&o, date(2025, 12, 31), 10_000);

        let checkout = CheckoutData::new(date(2025, 12, 31), Uuid::new_v4())
            .with_inspection(InspectionItem::new("kitchen", ItemCondition::Damaged, Money::from_major(3000)))
            .with_deduction(Deduction::manual(DeductionCategory::Cleaning, Money::from_major(500), "deep clean"));

        let result = o.complete_checkout(lease.id, checkout).unwrap();

        assert_eq!(result.settlement.total_deductions, Money::from_major(3500));
        assert_eq!(result.settlement.net_refund, Money::from_major(6500));
        assert_eq!(result.settlement.refund_status, RefundStatus::PendingApproval);
        assert_eq!(result.lease.status, LeaseStatus::Terminated);
        assert_eq!(result.lease.terminated_on, Some(date(2025, 12, 31)));
        assert!(result.penalty.is_none());
        assert_eq!(o.notifier().count("deposit_calculated"), 1);
        assert_eq!(o.notifier().count("checkout_completed"), 1);
    }

    #[test]
    fn test_early_checkout_with_arrears_leaves_tenant_owing() {
        let o = orchestrator();
        let lease = LeaseAccount::builder()
            .term(date(2025, 1, 1), date(2025, 12, 31))
            .base_rent(Money::from_major(5000))
            .security_deposit(Money::from_major(10_000))
            .early_termination(EarlyTerminationClause { penalty_cap_months: None })
            .build()
            .unwrap();
        o.store().insert_lease(lease.clone()).unwrap();
        o.ledger()
            .set_balances(lease.id, vec![Money::from_major(1200), Money::from_major(-300)]);

        let checkout = CheckoutData::new(date(2025, 6, 15), Uuid::new_v4())
            .with_inspection(InspectionItem::new("walls", ItemCondition::Damaged, Money::from_major(3000)))
            .with_inspection(InspectionItem::new("doors", ItemCondition::Good, Money::ZERO))
            .with_deduction(Deduction::manual(DeductionCategory::Cleaning, Money::from_major(500), "cleaning"));

        let result = o.complete_checkout(lease.id, checkout).unwrap();
        let settlement = &result.settlement;

        let categories: Vec<_> = settlement.deductions.iter().map(|d| d.category).collect();
        assert_eq!(
            categories,
            vec![
                DeductionCategory::UnpaidRent,
                DeductionCategory::DamageRepairs,
                DeductionCategory::EarlyTerminationPenalty,
                DeductionCategory::Cleaning,
            ]
        );
        assert_eq!(settlement.total_deductions, Money::from_major(14_700));
        assert_eq!(settlement.net_refund, Money::from_major(-4700));
        assert!(settlement.amount_owed_by_tenant);
        assert_eq!(settlement.amount_owed(), Money::from_major(4700));
        assert_eq!(settlement.refund_status, RefundStatus::Calculated);
        assert_eq!(result.penalty.map(|p| p.charged_months), Some(2));
    }

    #[test]
    fn test_second_checkout_is_rejected() {
        let o = orchestrator();
        let lease = seed_lease(&o, date(2025, 12, 31), 10_000);

        let first = o
            .complete_checkout(lease.id, CheckoutData::new(date(2025, 12, 31), Uuid::new_v4()))
            .unwrap();
        let second = o.complete_checkout(lease.id, CheckoutData::new(date(2025, 12, 31), Uuid::new_v4()));

        assert_matches!(second, Err(LifecycleError::AlreadyCheckedOut { .. }));
        let stored = o.store().settlement_for_lease(lease.id).unwrap().unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(stored.value, first.settlement);
    }

    #[test]
    fn test_checkout_releases_every_assigned_spot() {
        let o = orchestrator();
        let lease = seed_lease(&o, date(2025, 12, 31), 10_000);
        let a = ParkingSpot::new("B1-07");
        let b = ParkingSpot::new("B1-08");
        o.store().insert_parking_spot(a.clone()).unwrap();
        o.store().insert_parking_spot(b.clone()).unwrap();
        o.assign_parking_spot(a.id, lease.id).unwrap();
        o.assign_parking_spot(b.id, lease.id).unwrap();

        let result = o
            .complete_checkout(lease.id, CheckoutData::new(date(2025, 12, 31), Uuid::new_v4()))
            .unwrap();

        assert_eq!(result.released_spots, vec![a.id, b.id]);
        assert!(result.lease.parking_spot_ids.is_empty());
        for id in [a.id, b.id] {
            let spot = o.store().parking_spot(id).unwrap().unwrap().value;
            assert_eq!(spot.status, ParkingSpotStatus::Available);
            assert_eq!(spot.assigned_lease, None);
        }
    }

    #[test]
    fn test_checkout_listing_only_some_spots_is_rejected() {
        let o = orchestrator();
        let lease = seed_lease(&o, date(2025, 12, 31), 10_000);
        let a = assign_new_spot(&o, "C-01", lease.id);
        let b = assign_new_spot(&o, "C-02", lease.id);

        let mut checkout = CheckoutData::new(date(2025, 12, 31), Uuid::new_v4());
        checkout.parking_spot_ids = vec![a.id];

        assert_matches!(
            o.complete_checkout(lease.id, checkout),
            Err(LifecycleError::GuardRejected { entity: "parking spot", .. })
        );
        let stored = o.store().lease(lease.id).unwrap().unwrap().value;
        assert_eq!(stored.status, LeaseStatus::Active);
        assert_eq!(stored.parking_spot_ids, vec![a.id, b.id]);
        for id in [a.id, b.id] {
            assert_eq!(o.store().parking_spot(id).unwrap().unwrap().value.status, ParkingSpotStatus::Assigned);
        }
    }

    #[test]
    fn test_checkout_listing_a_spot_twice_is_rejected() {
        let o = orchestrator();
        let lease = seed_lease(&o, date(2025, 12, 31), 10_000);
        let a = assign_new_spot(&o, "C-03", lease.id);

        let mut checkout = CheckoutData::new(date(2025, 12, 31), Uuid::new_v4());
        checkout.parking_spot_ids = vec![a.id, a.id];

        assert_matches!(
            o.complete_checkout(lease.id, checkout),
            Err(LifecycleError::GuardRejected { entity: "parking spot", .. })
        );
        assert!(o.store().settlement_for_lease(lease.id).unwrap().is_none());
    }

    #[test]
    fn test_checkout_with_matching_spot_list_releases_all() {
        let o = orchestrator();
        let lease = seed_lease(&o, date(2025, 12, 31), 10_000);
        let a = assign_new_spot(&o, "C-04", lease.id);
        let b = assign_new_spot(&o, "C-05", lease.id);

        let mut checkout = CheckoutData::new(date(2025, 12, 31), Uuid::new_v4());
        checkout.parking_spot_ids = vec![b.id, a.id];

        let result = o.complete_checkout(lease.id, checkout).unwrap();

        assert_eq!(result.released_spots, vec![a.id, b.id]);
        assert!(result.lease.parking_spot_ids.is_empty());
        assert_eq!(o.store().parking_spot(b.id).unwrap().unwrap().value.assigned_lease, None);
    }

    #[test]
    fn test_checkout_with_foreign_spot_writes_nothing() {
        let o = orchestrator();
        let lease = seed_lease(&o, date(2025, 12, 31), 10_000);
        let ours = assign_new_spot(&o, "A-01", lease.id);
        let theirs = seed_assigned_spot(&o, "A-02", Uuid::new_v4());

        let mut checkout = CheckoutData::new(date(2025, 12, 31), Uuid::new_v4());
        checkout.parking_spot_ids = vec![ours.id, theirs.id];

        assert_matches!(
            o.complete_checkout(lease.id, checkout),
            Err(LifecycleError::GuardRejected { entity: "parking spot", .. })
        );
        assert_eq!(o.store().lease(lease.id).unwrap().unwrap().value.status, LeaseStatus::Active);
        assert_eq!(o.store().parking_spot(ours.id).unwrap().unwrap().value.status, ParkingSpotStatus::Assigned);
        assert!(o.store().settlement_for_lease(lease.id).unwrap().is_none());
    }

    #[test]
    fn test_refund_workflow_with_hold() {
        let o = orchestrator();
        let lease = seed_lease(&o, date(2025, 12, 31), 10_000);
        let settlement = o
            .complete_checkout(lease.id, CheckoutData::new(date(2025, 12, 31), Uuid::new_v4()))
            .unwrap()
            .settlement;
        assert_eq!(settlement.refund_status, RefundStatus::PendingApproval);

        let manager = Uuid::new_v4();
        let approved = o.approve_settlement(settlement.id, manager).unwrap();
        assert_eq!(approved.refund_status, RefundStatus::Approved);
        assert_eq!(approved.approved_by, Some(manager));
        assert!(approved.approved_at.is_some());
        assert_matches!(
            o.approve_settlement(settlement.id, manager),
            Err(LifecycleError::InvalidTransition { .. })
        );

        let held = o.hold_settlement(settlement.id, manager, "bank details missing").unwrap();
        assert_eq!(held.refund_status, RefundStatus::OnHold);
        assert_eq!(held.held_from, Some(RefundStatus::Approved));
        assert_matches!(
            o.start_refund_processing(settlement.id, manager),
            Err(LifecycleError::GuardRejected { .. })
        );

        let released = o.release_settlement_hold(settlement.id, manager).unwrap();
        assert_eq!(released.refund_status, RefundStatus::Approved);
        assert_eq!(released.held_from, None);
        assert_matches!(
            o.release_settlement_hold(settlement.id, manager),
            Err(LifecycleError::InvalidTransition { .. })
        );

        o.start_refund_processing(settlement.id, manager).unwrap();
        let done = o.complete_refund(settlement.id, manager).unwrap();
        assert_eq!(done.refund_status, RefundStatus::Completed);
        assert!(done.processed_at.is_some());
        assert_eq!(o.notifier().count("settlement_approved"), 1);
        assert_eq!(o.notifier().count("refund_status_changed"), 5);
    }

    #[test]
    fn test_quotation_to_lease() {
        let o = orchestrator();
        let lead = Lead::new("Amal Haddad");
        o.store().insert_lead(lead.clone()).unwrap();
        o.transition_lead(lead.id, LeadStatus::Contacted).unwrap();

        let mut quotation = QuotationAccount::draft(Uuid::new_v4(), date(2025, 3, 31), Money::from_major(4800));
        quotation.lead_id = Some(lead.id);
        quotation.service_charge = Money::from_major(200);
        quotation.parking_spots = 1;
        quotation.parking_fee_per_spot = Money::from_major(150);
        quotation.security_deposit = Money::from_major(9600);
        quotation.admin_fee = Money::from_major(500);
        o.store().insert_quotation(quotation.clone()).unwrap();
        let spot = ParkingSpot::new("G-12");
        o.store().insert_parking_spot(spot.clone()).unwrap();

        o.transition_quotation(quotation.id, QuotationStatus::Sent).unwrap();
        o.transition_quotation(quotation.id, QuotationStatus::Accepted).unwrap();
        assert_eq!(o.store().lead(lead.id).unwrap().unwrap().value.status, LeadStatus::Accepted);
        assert_eq!(o.first_payment(quotation.id).unwrap().total, Money::from_major(15_250));

        let result = o
            .convert_quotation(
                quotation.id,
                ConversionRequest {
                    tenant_id: Uuid::new_v4(),
                    lease_start: date(2025, 4, 1),
                    lease_end: date(2026, 3, 31),
                    parking_spot_ids: vec![spot.id],
                    auto_renewal: false,
                    early_termination: None,
                },
            )
            .unwrap();

        assert_eq!(result.quotation.status, QuotationStatus::Converted);
        assert_eq!(result.lease.status, LeaseStatus::Active);
        assert_eq!(result.lease.total_monthly(), Money::from_major(5150));
        assert_eq!(result.lead.map(|l| l.status), Some(LeadStatus::Converted));

        let spot = o.store().parking_spot(spot.id).unwrap().unwrap().value;
        assert_eq!(spot.status, ParkingSpotStatus::Assigned);
        assert_eq!(spot.assigned_lease, Some(result.lease.id));
        assert!(o.store().lease(result.lease.id).unwrap().is_some());
    }

    #[test]
    fn test_quotation_cannot_be_converted_directly() {
        let o = orchestrator();
        let mut quotation = QuotationAccount::draft(Uuid::new_v4(), date(2025, 3, 31), Money::from_major(4800));
        quotation.status = QuotationStatus::Accepted;
        o.store().insert_quotation(quotation.clone()).unwrap();

        assert_matches!(
            o.transition_quotation(quotation.id, QuotationStatus::Converted),
            Err(LifecycleError::GuardRejected { .. })
        );
    }

    #[test]
    fn test_conversion_requires_quoted_spot_count() {
        let o = orchestrator();
        let mut quotation = QuotationAccount::draft(Uuid::new_v4(), date(2025, 3, 31), Money::from_major(4800));
        quotation.status = QuotationStatus::Accepted;
        quotation.parking_spots = 2;
        o.store().insert_quotation(quotation.clone()).unwrap();

        let result = o.convert_quotation(
            quotation.id,
            ConversionRequest {
                tenant_id: Uuid::new_v4(),
                lease_start: date(2025, 4, 1),
                lease_end: date(2026, 3, 31),
                parking_spot_ids: vec![],
                auto_renewal: false,
                early_termination: None,
            },
        );

        assert_matches!(result, Err(LifecycleError::GuardRejected { .. }));
        assert_eq!(o.store().quotation(quotation.id).unwrap().unwrap().value.status, QuotationStatus::Accepted);
    }

    #[test]
    fn test_lapsed_quotation_cannot_be_accepted() {
        let o = orchestrator();
        let quotation = QuotationAccount::draft(Uuid::new_v4(), date(2025, 3, 10), Money::from_major(4800));
        o.store().insert_quotation(quotation.clone()).unwrap();
        o.transition_quotation(quotation.id, QuotationStatus::Sent).unwrap();

        o.clock().test_control().unwrap().advance(Duration::days(10));

        assert_matches!(
            o.transition_quotation(quotation.id, QuotationStatus::Accepted),
            Err(LifecycleError::GuardRejected { .. })
        );
        let report = o.run_daily_scan_now().unwrap();
        assert_eq!(report.expired_quotations, vec![quotation.id]);
    }

    #[test]
    fn test_parking_maintenance_only_for_free_spots() {
        let o = orchestrator();
        let lease = seed_lease(&o, date(2025, 12, 31), 10_000);
        let free = ParkingSpot::new("C-01");
        o.store().insert_parking_spot(free.clone()).unwrap();
        let taken = assign_new_spot(&o, "C-02", lease.id);

        let spot = o.set_parking_maintenance(free.id, true).unwrap();
        assert_eq!(spot.status, ParkingSpotStatus::UnderMaintenance);
        assert_matches!(
            o.assign_parking_spot(free.id, lease.id),
            Err(LifecycleError::InvalidTransition { .. })
        );
        assert_eq!(o.set_parking_maintenance(free.id, false).unwrap().status, ParkingSpotStatus::Available);

        assert_matches!(
            o.set_parking_maintenance(taken.id, true),
            Err(LifecycleError::InvalidTransition { .. })
        );
        assert_matches!(
            o.set_parking_maintenance(taken.id, false),
            Err(LifecycleError::GuardRejected { .. })
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let time = SafeTimeProvider::new(TimeSource::System);
        let config = LifecycleConfig::default().with_notice_thresholds(vec![14, 30]);
        let result = LifecycleOrchestrator::new(
            InMemoryStore::new(),
            RecordingNotifier::new(),
            InMemoryLedger::new(),
            time,
            RandomIds,
            config,
        );
        assert_matches!(result.err(), Some(LifecycleError::InvalidConfiguration { .. }));
    }
}
