pub mod lead;
pub mod lease;
pub mod machine;
pub mod parking;
pub mod quotation;
pub mod refund;

pub use lead::lead_machine;
pub use lease::{lease_machine, LeaseContext};
pub use machine::{Guard, StateMachine, StateMachineBuilder, Stateful};
pub use parking::{parking_machine, ParkingContext};
pub use quotation::{quotation_machine, QuotationContext};
pub use refund::{refund_machine, RefundContext};

use crate::state::{DepositSettlement, Lead, LeaseAccount, ParkingSpot, QuotationAccount};

/// every declared lifecycle graph, built once and shared by the orchestrator
#[derive(Debug)]
pub struct Machines {
    pub lead: StateMachine<Lead, ()>,
    pub quotation: StateMachine<QuotationAccount, QuotationContext>,
    pub lease: StateMachine<LeaseAccount, LeaseContext>,
    pub parking: StateMachine<ParkingSpot, ParkingContext>,
    pub refund: StateMachine<DepositSettlement, RefundContext>,
}

impl Machines {
    pub fn new() -> Self {
        Self {
            lead: lead_machine(),
            quotation: quotation_machine(),
            lease: lease_machine(),
            parking: parking_machine(),
            refund: refund_machine(),
        }
    }
}

impl Default for Machines {
    fn default() -> Self {
        Self::new()
    }
}
