//! in-memory gateway implementations for tests and demos

use std::collections::{HashMap, HashSet};
use std::fmt;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{LifecycleError, Result};
use crate::events::Event;
use crate::gateway::{Aggregate, ChangeSet, InvoiceLedger, NotificationGateway, PersistenceGateway, Write};
use crate::state::{
    DepositSettlement, ExpirationNotice, Lead, LeaseAccount, LeaseExtension, ParkingSpot,
    QuotationAccount, Versioned,
};
use crate::types::{
    LeadId, LeaseId, LeaseStatus, ParkingSpotId, QuotationId, QuotationStatus, SettlementId,
};

type Table<T> = HashMap<Uuid, Versioned<T>>;

#[derive(Debug, Default)]
struct Tables {
    leases: Table<LeaseAccount>,
    extensions: Vec<LeaseExtension>,
    settlements: Table<DepositSettlement>,
    notices: HashMap<(LeaseId, u32), ExpirationNotice>,
    quotations: Table<QuotationAccount>,
    leads: Table<Lead>,
    parking_spots: Table<ParkingSpot>,
}

type CommitHook = Box<dyn FnOnce(&InMemoryStore) + Send>;

/// mutex-guarded store; a commit checks every version before applying anything
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    before_commit: Mutex<Option<CommitHook>>,
}

impl fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tables = self.tables.lock();
        f.debug_struct("InMemoryStore")
            .field("leases", &tables.leases.len())
            .field("extensions", &tables.extensions.len())
            .field("settlements", &tables.settlements.len())
            .field("notices", &tables.notices.len())
            .field("quotations", &tables.quotations.len())
            .field("leads", &tables.leads.len())
            .field("parking_spots", &tables.parking_spots.len())
            .finish()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_lease(&self, lease: LeaseAccount) -> Result<()> {
        self.commit(ChangeSet::new().lease(Write::insert(lease)))
    }

    pub fn insert_quotation(&self, quotation: QuotationAccount) -> Result<()> {
        self.commit(ChangeSet::new().quotation(Write::insert(quotation)))
    }

    pub fn insert_lead(&self, lead: Lead) -> Result<()> {
        self.commit(ChangeSet::new().lead(Write::insert(lead)))
    }

    pub fn insert_parking_spot(&self, spot: ParkingSpot) -> Result<()> {
        self.commit(ChangeSet::new().parking_spot(Write::insert(spot)))
    }

    pub fn extension_count(&self) -> usize {
        self.tables.lock().extensions.len()
    }

    pub fn notice_count(&self) -> usize {
        self.tables.lock().notices.len()
    }

    /// run `hook` right before the next commit is applied, simulating a
    /// writer that races the caller between its read and its write
    pub fn before_next_commit(&self, hook: impl FnOnce(&InMemoryStore) + Send + 'static) {
        *self.before_commit.lock() = Some(Box::new(hook));
    }
}

fn check_write<T: Aggregate>(table: &Table<T>, write: &Write<T>) -> Result<()> {
    let id = write.value.aggregate_id();
    let found = table.get(&id).map(|row| row.version);
    if found != write.expected_version {
        return Err(LifecycleError::ConcurrentModification {
            entity: T::NAME,
            id,
            expected: write.expected_version,
            found,
        });
    }
    Ok(())
}

fn apply_write<T: Aggregate>(table: &mut Table<T>, write: Write<T>) {
    let version = write.expected_version.map_or(1, |v| v + 1);
    table.insert(write.value.aggregate_id(), Versioned::new(version, write.value));
}

fn check_unique_ids<T: Aggregate>(writes: &[Write<T>]) -> Result<()> {
    let mut seen = HashSet::new();
    for write in writes {
        let id = write.value.aggregate_id();
        if !seen.insert(id) {
            return Err(LifecycleError::DuplicateWrite { entity: T::NAME, id });
        }
    }
    Ok(())
}

fn check_all<T: Aggregate>(table: &Table<T>, writes: &[Write<T>]) -> Result<()> {
    check_unique_ids(writes)?;
    writes.iter().try_for_each(|w| check_write(table, w))
}

impl PersistenceGateway for InMemoryStore {
    fn lease(&self, id: LeaseId) -> Result<Option<Versioned<LeaseAccount>>> {
        Ok(self.tables.lock().leases.get(&id).cloned())
    }

    fn leases_with_status(&self, statuses: &[LeaseStatus]) -> Result<Vec<Versioned<LeaseAccount>>> {
        let tables = self.tables.lock();
        let mut leases: Vec<_> = tables
            .leases
            .values()
            .filter(|row| statuses.contains(&row.value.status))
            .cloned()
            .collect();
        leases.sort_by_key(|row| (row.value.lease_end, row.value.id));
        Ok(leases)
    }

    fn extensions(&self, lease_id: LeaseId) -> Result<Vec<LeaseExtension>> {
        let tables = self.tables.lock();
        let mut history: Vec<_> = tables
            .extensions
            .iter()
            .filter(|e| e.lease_account_id == lease_id)
            .cloned()
            .collect();
        history.sort_by_key(|e| e.extended_at);
        Ok(history)
    }

    fn settlement(&self, id: SettlementId) -> Result<Option<Versioned<DepositSettlement>>> {
        Ok(self.tables.lock().settlements.get(&id).cloned())
    }

    fn settlement_for_lease(&self, lease_id: LeaseId) -> Result<Option<Versioned<DepositSettlement>>> {
        Ok(self
            .tables
            .lock()
            .settlements
            .values()
            .find(|row| row.value.lease_account_id == lease_id)
            .cloned())
    }

    fn notices(&self, lease_id: LeaseId) -> Result<Vec<ExpirationNotice>> {
        let tables = self.tables.lock();
        let mut notices: Vec<_> = tables
            .notices
            .values()
            .filter(|n| n.lease_account_id == lease_id)
            .cloned()
            .collect();
        notices.sort_by(|a, b| b.threshold_days.cmp(&a.threshold_days));
        Ok(notices)
    }

    fn quotation(&self, id: QuotationId) -> Result<Option<Versioned<QuotationAccount>>> {
        Ok(self.tables.lock().quotations.get(&id).cloned())
    }

    fn quotations_with_status(&self, status: QuotationStatus) -> Result<Vec<Versioned<QuotationAccount>>> {
        let tables = self.tables.lock();
        let mut quotations: Vec<_> = tables
            .quotations
            .values()
            .filter(|row| row.value.status == status)
            .cloned()
            .collect();
        quotations.sort_by_key(|row| (row.value.validity_date, row.value.id));
        Ok(quotations)
    }

    fn lead(&self, id: LeadId) -> Result<Option<Versioned<Lead>>> {
        Ok(self.tables.lock().leads.get(&id).cloned())
    }

    fn parking_spot(&self, id: ParkingSpotId) -> Result<Option<Versioned<ParkingSpot>>> {
        Ok(self.tables.lock().parking_spots.get(&id).cloned())
    }

    fn commit(&self, changes: ChangeSet) -> Result<()> {
        let hook = self.before_commit.lock().take();
        if let Some(hook) = hook {
            hook(self);
        }

        let mut tables = self.tables.lock();

        // validate everything first so a rejected commit writes nothing
        check_all(&tables.leases, &changes.leases)?;
        check_all(&tables.settlements, &changes.settlements)?;
        check_all(&tables.quotations, &changes.quotations)?;
        check_all(&tables.leads, &changes.leads)?;
        check_all(&tables.parking_spots, &changes.parking_spots)?;

        for extension in &changes.extensions {
            if tables.extensions.iter().any(|e| e.id == extension.id) {
                return Err(LifecycleError::ConcurrentModification {
                    entity: "lease extension",
                    id: extension.id,
                    expected: None,
                    found: Some(1),
                });
            }
        }

        let mut keys = HashSet::new();
        for notice in &changes.notices {
            if tables.notices.contains_key(&notice.key()) || !keys.insert(notice.key()) {
                return Err(LifecycleError::DuplicateNotice {
                    lease_id: notice.lease_account_id,
                    threshold_days: notice.threshold_days,
                });
            }
        }

        let ChangeSet {
            leases,
            extensions,
            settlements,
            notices,
            quotations,
            leads,
            parking_spots,
        } = changes;

        leases.into_iter().for_each(|w| apply_write(&mut tables.leases, w));
        settlements.into_iter().for_each(|w| apply_write(&mut tables.settlements, w));
        quotations.into_iter().for_each(|w| apply_write(&mut tables.quotations, w));
        leads.into_iter().for_each(|w| apply_write(&mut tables.leads, w));
        parking_spots.into_iter().for_each(|w| apply_write(&mut tables.parking_spots, w));
        tables.extensions.extend(extensions);
        for notice in notices {
            tables.notices.insert(notice.key(), notice);
        }

        Ok(())
    }
}

/// outstanding invoice balances keyed by lease
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    balances: Mutex<HashMap<LeaseId, Vec<Money>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balances(&self, lease_id: LeaseId, balances: Vec<Money>) {
        self.balances.lock().insert(lease_id, balances);
    }
}

impl InvoiceLedger for InMemoryLedger {
    fn outstanding_balances(&self, lease_id: LeaseId) -> Result<Vec<Money>> {
        Ok(self.balances.lock().get(&lease_id).cloned().unwrap_or_default())
    }
}

/// notifier that keeps every published event, optionally failing for chosen aggregates
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    published: Mutex<Vec<Event>>,
    failing: Mutex<HashSet<Uuid>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// make publish fail for events of this aggregate
    pub fn fail_for(&self, aggregate_id: Uuid) {
        self.failing.lock().insert(aggregate_id);
    }

    pub fn published(&self) -> Vec<Event> {
        self.published.lock().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.published.lock().iter().filter(|e| e.name() == name).count()
    }

    pub fn clear(&self) {
        self.published.lock().clear();
    }
}

impl NotificationGateway for RecordingNotifier {
    fn publish(&self, event: &Event) -> Result<()> {
        if self.failing.lock().contains(&event.aggregate_id()) {
            return Err(LifecycleError::NotificationFailed {
                message: format!("{} rejected for {}", event.name(), event.aggregate_id()),
            });
        }
        self.published.lock().push(event.clone());
        Ok(())
    }
}
