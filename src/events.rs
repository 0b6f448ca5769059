use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::{
    AdjustmentType, LeadId, LeadStatus, LeaseId, LeaseStatus, ParkingSpotId, ParkingSpotStatus,
    QuotationId, QuotationStatus, RefundStatus, SettlementId,
};

/// all events the engine hands to the notification and audit collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    // lease events
    LeaseCreated {
        lease_id: LeaseId,
        quotation_id: Option<QuotationId>,
        lease_start: NaiveDate,
        lease_end: NaiveDate,
        monthly_total: Money,
        timestamp: DateTime<Utc>,
    },
    ExtensionCompleted {
        lease_id: LeaseId,
        extension_id: Uuid,
        previous_end_date: NaiveDate,
        new_end_date: NaiveDate,
        previous_rent: Money,
        new_rent: Money,
        adjustment_type: AdjustmentType,
        timestamp: DateTime<Utc>,
    },
    LeaseStatusChanged {
        lease_id: LeaseId,
        old_status: LeaseStatus,
        new_status: LeaseStatus,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    LeaseExpirationNotice {
        lease_id: LeaseId,
        tenant_id: Uuid,
        threshold_days: u32,
        days_remaining: i64,
        lease_end: NaiveDate,
        auto_renewal: bool,
        idempotency_key: String,
        timestamp: DateTime<Utc>,
    },

    // checkout events
    CheckoutCompleted {
        lease_id: LeaseId,
        move_out_date: NaiveDate,
        early_termination: bool,
        released_spots: Vec<ParkingSpotId>,
        processed_by: Uuid,
        timestamp: DateTime<Utc>,
    },
    DepositCalculated {
        lease_id: LeaseId,
        settlement_id: SettlementId,
        original_deposit: Money,
        total_deductions: Money,
        net_refund: Money,
        amount_owed_by_tenant: bool,
        refund_status: RefundStatus,
        timestamp: DateTime<Utc>,
    },
    SettlementApproved {
        settlement_id: SettlementId,
        lease_id: LeaseId,
        approved_by: Uuid,
        net_refund: Money,
        timestamp: DateTime<Utc>,
    },
    RefundStatusChanged {
        settlement_id: SettlementId,
        lease_id: LeaseId,
        old_status: RefundStatus,
        new_status: RefundStatus,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    // pre-lease events
    QuotationStatusChanged {
        quotation_id: QuotationId,
        old_status: QuotationStatus,
        new_status: QuotationStatus,
        timestamp: DateTime<Utc>,
    },
    QuotationExpired {
        quotation_id: QuotationId,
        validity_date: NaiveDate,
        timestamp: DateTime<Utc>,
    },
    LeadStatusChanged {
        lead_id: LeadId,
        old_status: LeadStatus,
        new_status: LeadStatus,
        timestamp: DateTime<Utc>,
    },

    // parking events
    ParkingSpotStatusChanged {
        spot_id: ParkingSpotId,
        old_status: ParkingSpotStatus,
        new_status: ParkingSpotStatus,
        lease_id: Option<LeaseId>,
        timestamp: DateTime<Utc>,
    },
}

impl Event {
    /// aggregate the event belongs to, used for audit routing
    pub fn aggregate_id(&self) -> Uuid {
        match self {
            Event::LeaseCreated { lease_id, .. }
            | Event::ExtensionCompleted { lease_id, .. }
            | Event::LeaseStatusChanged { lease_id, .. }
            | Event::LeaseExpirationNotice { lease_id, .. }
            | Event::CheckoutCompleted { lease_id, .. }
            | Event::DepositCalculated { lease_id, .. } => *lease_id,
            Event::SettlementApproved { settlement_id, .. }
            | Event::RefundStatusChanged { settlement_id, .. } => *settlement_id,
            Event::QuotationStatusChanged { quotation_id, .. }
            | Event::QuotationExpired { quotation_id, .. } => *quotation_id,
            Event::LeadStatusChanged { lead_id, .. } => *lead_id,
            Event::ParkingSpotStatusChanged { spot_id, .. } => *spot_id,
        }
    }

    /// short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Event::LeaseCreated { .. } => "lease_created",
            Event::ExtensionCompleted { .. } => "extension_completed",
            Event::LeaseStatusChanged { .. } => "lease_status_changed",
            Event::LeaseExpirationNotice { .. } => "lease_expiration_notice",
            Event::CheckoutCompleted { .. } => "checkout_completed",
            Event::DepositCalculated { .. } => "deposit_calculated",
            Event::SettlementApproved { .. } => "settlement_approved",
            Event::RefundStatusChanged { .. } => "refund_status_changed",
            Event::QuotationStatusChanged { .. } => "quotation_status_changed",
            Event::QuotationExpired { .. } => "quotation_expired",
            Event::LeadStatusChanged { .. } => "lead_status_changed",
            Event::ParkingSpotStatusChanged { .. } => "parking_spot_status_changed",
        }
    }
}

/// idempotency key for a threshold notice
pub fn notice_key(lease_id: LeaseId, threshold_days: u32) -> String {
    format!("lease-expiry:{lease_id}:{threshold_days}")
}

/// event store for collecting events during an operation, drained after commit
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_store_drains() {
        let mut store = EventStore::new();
        let lease_id = Uuid::new_v4();
        store.emit(Event::LeaseStatusChanged {
            lease_id,
            old_status: LeaseStatus::Active,
            new_status: LeaseStatus::ExpiringSoon,
            reason: "45 days remaining".to_string(),
            timestamp: Utc::now(),
        });

        assert_eq!(store.events().len(), 1);
        let events = store.take_events();
        assert_eq!(events[0].aggregate_id(), lease_id);
        assert!(store.is_empty());
    }

    #[test]
    fn test_event_json_is_tagged() {
        let event = Event::QuotationExpired {
            quotation_id: Uuid::nil(),
            validity_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "quotation_expired");
        assert_eq!(json["validity_date"], "2024-03-31");
    }

    #[test]
    fn test_notice_key_is_stable() {
        let id = Uuid::nil();
        assert_eq!(notice_key(id, 30), notice_key(id, 30));
        assert_ne!(notice_key(id, 30), notice_key(id, 14));
    }
}
