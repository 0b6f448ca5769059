//! contracts for the collaborators the engine consumes

use chrono::{DateTime, NaiveDate, Utc};
use hourglass_rs::SafeTimeProvider;
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::Result;
use crate::events::Event;
use crate::state::{
    DepositSettlement, ExpirationNotice, Lead, LeaseAccount, LeaseExtension, ParkingSpot,
    QuotationAccount, Versioned,
};
use crate::types::{
    LeadId, LeaseId, LeaseStatus, ParkingSpotId, QuotationId, QuotationStatus, SettlementId,
};

/// supplies the current time
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

impl Clock for SafeTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        SafeTimeProvider::now(self)
    }
}

/// supplies unique identifiers
pub trait IdGenerator {
    fn next_id(&self) -> Uuid;
}

/// random v4 ids
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// aggregate stored under a uuid with an optimistic-lock version
pub trait Aggregate: Clone {
    const NAME: &'static str;

    fn aggregate_id(&self) -> Uuid;
}

impl Aggregate for LeaseAccount {
    const NAME: &'static str = "lease";

    fn aggregate_id(&self) -> Uuid {
        self.id
    }
}

impl Aggregate for DepositSettlement {
    const NAME: &'static str = "deposit settlement";

    fn aggregate_id(&self) -> Uuid {
        self.id
    }
}

impl Aggregate for QuotationAccount {
    const NAME: &'static str = "quotation";

    fn aggregate_id(&self) -> Uuid {
        self.id
    }
}

impl Aggregate for Lead {
    const NAME: &'static str = "lead";

    fn aggregate_id(&self) -> Uuid {
        self.id
    }
}

impl Aggregate for ParkingSpot {
    const NAME: &'static str = "parking spot";

    fn aggregate_id(&self) -> Uuid {
        self.id
    }
}

/// one aggregate write; `expected_version: None` means insert
#[derive(Debug, Clone, PartialEq)]
pub struct Write<T> {
    pub expected_version: Option<u64>,
    pub value: T,
}

impl<T> Write<T> {
    pub fn insert(value: T) -> Self {
        Self {
            expected_version: None,
            value,
        }
    }

    pub fn update(expected_version: u64, value: T) -> Self {
        Self {
            expected_version: Some(expected_version),
            value,
        }
    }
}

/// everything one operation persists, committed atomically or not at all
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub leases: Vec<Write<LeaseAccount>>,
    pub extensions: Vec<LeaseExtension>,
    pub settlements: Vec<Write<DepositSettlement>>,
    pub notices: Vec<ExpirationNotice>,
    pub quotations: Vec<Write<QuotationAccount>>,
    pub leads: Vec<Write<Lead>>,
    pub parking_spots: Vec<Write<ParkingSpot>>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lease(mut self, write: Write<LeaseAccount>) -> Self {
        self.leases.push(write);
        self
    }

    pub fn extension(mut self, extension: LeaseExtension) -> Self {
        self.extensions.push(extension);
        self
    }

    pub fn settlement(mut self, write: Write<DepositSettlement>) -> Self {
        self.settlements.push(write);
        self
    }

    pub fn notice(mut self, notice: ExpirationNotice) -> Self {
        self.notices.push(notice);
        self
    }

    pub fn quotation(mut self, write: Write<QuotationAccount>) -> Self {
        self.quotations.push(write);
        self
    }

    pub fn lead(mut self, write: Write<Lead>) -> Self {
        self.leads.push(write);
        self
    }

    pub fn parking_spot(mut self, write: Write<ParkingSpot>) -> Self {
        self.parking_spots.push(write);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.leases.is_empty()
            && self.extensions.is_empty()
            && self.settlements.is_empty()
            && self.notices.is_empty()
            && self.quotations.is_empty()
            && self.leads.is_empty()
            && self.parking_spots.is_empty()
    }
}

/// load/save for every aggregate the engine touches
pub trait PersistenceGateway {
    fn lease(&self, id: LeaseId) -> Result<Option<Versioned<LeaseAccount>>>;

    fn leases_with_status(&self, statuses: &[LeaseStatus]) -> Result<Vec<Versioned<LeaseAccount>>>;

    /// ordered by `extended_at`
    fn extensions(&self, lease_id: LeaseId) -> Result<Vec<LeaseExtension>>;

    fn settlement(&self, id: SettlementId) -> Result<Option<Versioned<DepositSettlement>>>;

    fn settlement_for_lease(&self, lease_id: LeaseId) -> Result<Option<Versioned<DepositSettlement>>>;

    fn notices(&self, lease_id: LeaseId) -> Result<Vec<ExpirationNotice>>;

    fn quotation(&self, id: QuotationId) -> Result<Option<Versioned<QuotationAccount>>>;

    fn quotations_with_status(&self, status: QuotationStatus) -> Result<Vec<Versioned<QuotationAccount>>>;

    fn lead(&self, id: LeadId) -> Result<Option<Versioned<Lead>>>;

    fn parking_spot(&self, id: ParkingSpotId) -> Result<Option<Versioned<ParkingSpot>>>;

    /// apply every write or none; version mismatches fail with
    /// `ConcurrentModification`, repeated notices with `DuplicateNotice`
    fn commit(&self, changes: ChangeSet) -> Result<()>;
}

/// fire-and-forget delivery of domain events (email, pdf, audit)
pub trait NotificationGateway {
    fn publish(&self, event: &Event) -> Result<()>;
}

/// read-only view of a lease's unpaid invoices
pub trait InvoiceLedger {
    fn outstanding_balances(&self, lease_id: LeaseId) -> Result<Vec<Money>>;
}
