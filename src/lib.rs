pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod expiration;
pub mod gateway;
pub mod lifecycle;
pub mod memory;
pub mod orchestrator;
pub mod pricing;
pub mod settlement;
pub mod state;
pub mod types;

// re-export key types
pub use config::{ExpirationConfig, LifecycleConfig, SettlementConfig};
pub use decimal::Money;
pub use errors::{LifecycleError, Result};
pub use events::{Event, EventStore};
pub use expiration::{ExpirationMonitor, NoticeSent, ScanFailure, ScanReport, ScanStage};
pub use gateway::{
    ChangeSet, Clock, IdGenerator, InvoiceLedger, NotificationGateway, PersistenceGateway,
    RandomIds, Write,
};
pub use lifecycle::{Machines, StateMachine, Stateful};
pub use memory::{InMemoryLedger, InMemoryStore, RecordingNotifier};
pub use orchestrator::{
    ConversionRequest, ConversionResult, ExtensionRequest, ExtensionResult, LifecycleOrchestrator,
    SettlementResult,
};
pub use pricing::{first_payment, FirstPaymentBreakdown, ParkingCharge, RentAdjustmentCalculator, RentQuote};
pub use settlement::{CheckoutData, DepositSettlementCalculator, EarlyTerminationPenalty, InspectionItem};
pub use state::{
    Deduction, DepositSettlement, EarlyTerminationClause, ExpirationNotice, Lead, LeaseAccount,
    LeaseExtension, ParkingSpot, QuotationAccount, Versioned,
};
pub use types::{
    AdjustmentType, DeductionCategory, ItemCondition, LeadId, LeadStatus, LeaseId, LeaseStatus,
    ParkingSpotId, ParkingSpotStatus, QuotationId, QuotationStatus, RefundStatus, RentAdjustment,
    SettlementId,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
