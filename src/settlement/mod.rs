pub mod deposit;
pub mod penalty;

pub use deposit::{CheckoutData, DepositSettlementCalculator, InspectionItem, SettlementDraft};
pub use penalty::{early_termination_penalty, remaining_months, EarlyTerminationPenalty};
