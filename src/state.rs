use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{LifecycleError, Result};
use crate::types::{
    AdjustmentType, DeductionCategory, ExtensionId, LeadId, LeadStatus, LeaseId, LeaseStatus,
    ParkingSpotId, ParkingSpotStatus, QuotationId, QuotationStatus, RefundStatus, SettlementId,
};

/// persistence envelope carrying the optimistic-lock version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

impl<T> Versioned<T> {
    pub fn new(version: u64, value: T) -> Self {
        Self { version, value }
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

/// early termination clause in the lease terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarlyTerminationClause {
    /// overrides the configured cap when set
    pub penalty_cap_months: Option<u32>,
}

/// lease account aggregate, one per tenancy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseAccount {
    // identification
    pub id: LeaseId,
    pub unit_id: Uuid,
    pub tenant_id: Uuid,

    // status
    pub status: LeaseStatus,
    pub terminated_on: Option<NaiveDate>,

    // term
    pub lease_start: NaiveDate,
    pub lease_end: NaiveDate,
    pub auto_renewal: bool,

    // money
    pub base_rent: Money,
    pub service_charge: Money,
    pub security_deposit: Money,
    pub parking_fee_per_spot: Money,

    // associations
    pub parking_spot_ids: Vec<ParkingSpotId>,
    pub early_termination: Option<EarlyTerminationClause>,
}

impl LeaseAccount {
    pub fn builder() -> LeaseAccountBuilder {
        LeaseAccountBuilder::new()
    }

    /// days from today until lease end, negative once the end has passed
    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        (self.lease_end - today).num_days()
    }

    /// status as a pure function of (today, lease_end, terminated)
    pub fn derived_status(&self, today: NaiveDate, expiring_window_days: u32) -> LeaseStatus {
        if self.is_terminated() {
            LeaseStatus::Terminated
        } else if self.days_remaining(today) <= i64::from(expiring_window_days) {
            LeaseStatus::ExpiringSoon
        } else {
            LeaseStatus::Active
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.status == LeaseStatus::Terminated
    }

    /// monthly parking charge across all assigned spots
    pub fn parking_charge(&self) -> Money {
        self.parking_fee_per_spot.times(self.parking_spot_ids.len() as u32)
    }

    /// rent + service charge + parking
    pub fn total_monthly(&self) -> Money {
        self.base_rent + self.service_charge + self.parking_charge()
    }
}

/// builder for lease accounts
#[derive(Debug, Default)]
pub struct LeaseAccountBuilder {
    id: Option<LeaseId>,
    unit_id: Option<Uuid>,
    tenant_id: Option<Uuid>,
    lease_start: Option<NaiveDate>,
    lease_end: Option<NaiveDate>,
    base_rent: Option<Money>,
    service_charge: Option<Money>,
    security_deposit: Option<Money>,
    parking_fee_per_spot: Option<Money>,
    parking_spot_ids: Vec<ParkingSpotId>,
    auto_renewal: bool,
    early_termination: Option<EarlyTerminationClause>,
}

impl LeaseAccountBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: LeaseId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn unit_id(mut self, unit_id: Uuid) -> Self {
        self.unit_id = Some(unit_id);
        self
    }

    pub fn tenant_id(mut self, tenant_id: Uuid) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    pub fn term(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.lease_start = Some(start);
        self.lease_end = Some(end);
        self
    }

    pub fn base_rent(mut self, rent: Money) -> Self {
        self.base_rent = Some(rent);
        self
    }

    pub fn service_charge(mut self, charge: Money) -> Self {
        self.service_charge = Some(charge);
        self
    }

    pub fn security_deposit(mut self, deposit: Money) -> Self {
        self.security_deposit = Some(deposit);
        self
    }

    pub fn parking(mut self, spots: Vec<ParkingSpotId>, fee_per_spot: Money) -> Self {
        self.parking_spot_ids = spots;
        self.parking_fee_per_spot = Some(fee_per_spot);
        self
    }

    pub fn auto_renewal(mut self, enabled: bool) -> Self {
        self.auto_renewal = enabled;
        self
    }

    pub fn early_termination(mut self, clause: EarlyTerminationClause) -> Self {
        self.early_termination = Some(clause);
        self
    }

    /// new leases start ACTIVE; the daily scan moves them into EXPIRING_SOON
    pub fn build(self) -> Result<LeaseAccount> {
        let lease_start = self
            .lease_start
            .ok_or_else(|| LifecycleError::invalid_date("lease start is required"))?;
        let lease_end = self
            .lease_end
            .ok_or_else(|| LifecycleError::invalid_date("lease end is required"))?;
        LifecycleError::ensure_after(lease_end, lease_start, "lease end")?;

        let base_rent = self.base_rent.unwrap_or(Money::ZERO);
        if !base_rent.is_positive() {
            return Err(LifecycleError::InvalidAmount {
                amount: base_rent,
                message: "base rent must be positive".to_string(),
            });
        }

        let security_deposit = self.security_deposit.unwrap_or(Money::ZERO);
        if security_deposit.is_negative() {
            return Err(LifecycleError::InvalidDeposit {
                amount: security_deposit,
            });
        }

        let service_charge = self.service_charge.unwrap_or(Money::ZERO);
        let parking_fee_per_spot = self.parking_fee_per_spot.unwrap_or(Money::ZERO);
        for (amount, what) in [(service_charge, "service charge"), (parking_fee_per_spot, "parking fee")] {
            if amount.is_negative() {
                return Err(LifecycleError::InvalidAmount {
                    amount,
                    message: format!("{what} cannot be negative"),
                });
            }
        }

        Ok(LeaseAccount {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            unit_id: self.unit_id.unwrap_or_else(Uuid::new_v4),
            tenant_id: self.tenant_id.unwrap_or_else(Uuid::new_v4),
            status: LeaseStatus::Active,
            terminated_on: None,
            lease_start,
            lease_end,
            auto_renewal: self.auto_renewal,
            base_rent,
            service_charge,
            security_deposit,
            parking_fee_per_spot,
            parking_spot_ids: self.parking_spot_ids,
            early_termination: self.early_termination,
        })
    }
}

/// immutable record of one renewal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseExtension {
    pub id: ExtensionId,
    pub lease_account_id: LeaseId,
    pub previous_end_date: NaiveDate,
    pub new_end_date: NaiveDate,
    pub previous_rent: Money,
    pub new_rent: Money,
    pub adjustment_type: AdjustmentType,
    pub adjustment_value: Decimal,
    pub extended_at: DateTime<Utc>,
    pub extended_by: Uuid,
}

/// one deduction row on a deposit settlement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deduction {
    pub category: DeductionCategory,
    pub amount: Money,
    pub notes: Option<String>,
    pub auto_calculated: bool,
    pub disputed: bool,
}

impl Deduction {
    /// manager-entered row
    pub fn manual(category: DeductionCategory, amount: Money, notes: impl Into<String>) -> Self {
        Self {
            category,
            amount,
            notes: Some(notes.into()),
            auto_calculated: false,
            disputed: false,
        }
    }

    /// row derived by the calculator
    pub fn automatic(category: DeductionCategory, amount: Money, notes: impl Into<String>) -> Self {
        Self {
            category,
            amount,
            notes: Some(notes.into()),
            auto_calculated: true,
            disputed: false,
        }
    }

    pub fn disputed(mut self) -> Self {
        self.disputed = true;
        self
    }
}

/// deposit settlement, one per completed checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositSettlement {
    pub id: SettlementId,
    pub lease_account_id: LeaseId,
    pub original_deposit: Money,
    pub deductions: Vec<Deduction>,
    pub total_deductions: Money,
    /// negative when the tenant owes money
    pub net_refund: Money,
    pub amount_owed_by_tenant: bool,
    pub refund_status: RefundStatus,
    /// state the settlement returns to when a hold is released
    pub held_from: Option<RefundStatus>,
    pub hold_reason: Option<String>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub processed_at: Option<DateTime<Utc>>,
    pub calculated_at: DateTime<Utc>,
}

impl DepositSettlement {
    /// recompute the sum of the deduction list
    pub fn deductions_sum(&self) -> Money {
        self.deductions.iter().map(|d| d.amount).sum()
    }

    pub fn has_disputes(&self) -> bool {
        self.deductions.iter().any(|d| d.disputed)
    }

    /// amount the tenant still has to pay, zero when a refund is due
    pub fn amount_owed(&self) -> Money {
        if self.net_refund.is_negative() {
            self.net_refund.abs()
        } else {
            Money::ZERO
        }
    }
}

/// dedup row for expiration notices, unique per (lease, threshold)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExpirationNotice {
    pub lease_account_id: LeaseId,
    pub threshold_days: u32,
    pub sent_at: DateTime<Utc>,
}

impl ExpirationNotice {
    /// idempotency key shared with the notification event
    pub fn key(&self) -> (LeaseId, u32) {
        (self.lease_account_id, self.threshold_days)
    }
}

/// quotation prior to lease creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotationAccount {
    pub id: QuotationId,
    pub lead_id: Option<LeadId>,
    pub unit_id: Uuid,
    pub status: QuotationStatus,
    pub validity_date: NaiveDate,
    pub base_rent: Money,
    pub service_charge: Money,
    pub parking_spots: u32,
    pub parking_fee_per_spot: Money,
    pub security_deposit: Money,
    pub admin_fee: Money,
}

impl QuotationAccount {
    /// draft quotation for a unit
    pub fn draft(unit_id: Uuid, validity_date: NaiveDate, base_rent: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            lead_id: None,
            unit_id,
            status: QuotationStatus::Draft,
            validity_date,
            base_rent,
            service_charge: Money::ZERO,
            parking_spots: 0,
            parking_fee_per_spot: Money::ZERO,
            security_deposit: Money::ZERO,
            admin_fee: Money::ZERO,
        }
    }

    pub fn is_past_validity(&self, today: NaiveDate) -> bool {
        today > self.validity_date
    }
}

/// sales lead
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub name: String,
    pub status: LeadStatus,
}

impl Lead {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            status: LeadStatus::New,
        }
    }
}

/// parking spot in a building
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingSpot {
    pub id: ParkingSpotId,
    pub code: String,
    pub status: ParkingSpotStatus,
    pub assigned_lease: Option<LeaseId>,
}

impl ParkingSpot {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: code.into(),
            status: ParkingSpotStatus::Available,
            assigned_lease: None,
        }
    }
}
