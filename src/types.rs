use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;

/// unique identifier for a lease account
pub type LeaseId = Uuid;
/// unique identifier for a quotation
pub type QuotationId = Uuid;
/// unique identifier for a lead
pub type LeadId = Uuid;
/// unique identifier for a parking spot
pub type ParkingSpotId = Uuid;
/// unique identifier for a deposit settlement
pub type SettlementId = Uuid;
/// unique identifier for a lease extension record
pub type ExtensionId = Uuid;

/// lease account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaseStatus {
    /// lease running, more than the expiring window left
    Active,
    /// inside the expiring window, renewal notices in flight
    ExpiringSoon,
    /// checked out or ended early, sticky
    Terminated,
}

/// quotation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuotationStatus {
    Draft,
    Sent,
    Accepted,
    Rejected,
    Expired,
    Converted,
}

/// lead status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadStatus {
    New,
    Contacted,
    QuotationSent,
    Accepted,
    Converted,
    Lost,
}

/// parking spot status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParkingSpotStatus {
    Available,
    Assigned,
    UnderMaintenance,
}

/// refund workflow status of a deposit settlement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundStatus {
    /// below approval threshold, ready for processing
    Calculated,
    /// waiting on a manager
    PendingApproval,
    Approved,
    Processing,
    Completed,
    OnHold,
}

/// rent adjustment kind recorded on an extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentType {
    None,
    Percentage,
    Flat,
    Custom,
}

/// rent adjustment requested for an extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RentAdjustment {
    /// keep the current rent
    None,
    /// percentage change, e.g. 5 for +5%
    Percentage(Decimal),
    /// flat amount added to the current rent (may be negative)
    Flat(Money),
    /// replace the rent outright
    Custom(Money),
}

impl RentAdjustment {
    pub fn adjustment_type(&self) -> AdjustmentType {
        match self {
            RentAdjustment::None => AdjustmentType::None,
            RentAdjustment::Percentage(_) => AdjustmentType::Percentage,
            RentAdjustment::Flat(_) => AdjustmentType::Flat,
            RentAdjustment::Custom(_) => AdjustmentType::Custom,
        }
    }

    /// raw adjustment value as stored on the extension record
    pub fn value(&self) -> Decimal {
        match self {
            RentAdjustment::None => Decimal::ZERO,
            RentAdjustment::Percentage(p) => *p,
            RentAdjustment::Flat(m) | RentAdjustment::Custom(m) => m.as_decimal(),
        }
    }
}

/// deposit deduction category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeductionCategory {
    UnpaidRent,
    DamageRepairs,
    EarlyTerminationPenalty,
    Cleaning,
    KeyReplacement,
    Other,
}

impl DeductionCategory {
    /// rows the calculator derives on its own
    pub fn is_automatic(&self) -> bool {
        matches!(
            self,
            DeductionCategory::UnpaidRent
                | DeductionCategory::DamageRepairs
                | DeductionCategory::EarlyTerminationPenalty
        )
    }
}

impl std::fmt::Display for DeductionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DeductionCategory::UnpaidRent => "unpaid rent",
            DeductionCategory::DamageRepairs => "damage repairs",
            DeductionCategory::EarlyTerminationPenalty => "early termination penalty",
            DeductionCategory::Cleaning => "cleaning",
            DeductionCategory::KeyReplacement => "key replacement",
            DeductionCategory::Other => "other",
        };
        f.write_str(label)
    }
}

/// condition recorded for one move-out inspection item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemCondition {
    Good,
    Fair,
    Damaged,
    Missing,
}

impl ItemCondition {
    pub fn is_chargeable(&self) -> bool {
        matches!(self, ItemCondition::Damaged | ItemCondition::Missing)
    }
}

/// what is driving a lease status change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaseTrigger {
    DailyScan,
    Extension,
    Checkout,
}

/// what is driving a parking spot status change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParkingTrigger {
    /// property manager editing the spot
    ManualEdit,
    /// lease conversion assigning the spot
    LeaseAssignment,
    /// checkout releasing every spot of a lease
    CheckoutRelease,
}
