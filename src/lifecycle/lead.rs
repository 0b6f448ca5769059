use crate::lifecycle::machine::{StateMachine, Stateful};
use crate::state::Lead;
use crate::types::LeadStatus;

impl Stateful for Lead {
    type State = LeadStatus;

    fn state(&self) -> LeadStatus {
        self.status
    }

    fn set_state(&mut self, state: LeadStatus) {
        self.status = state;
    }
}

/// NEW -> CONTACTED -> QUOTATION_SENT -> {ACCEPTED -> CONVERTED, LOST};
/// LOST from any non-terminal state
pub fn lead_machine() -> StateMachine<Lead, ()> {
    StateMachine::<Lead, ()>::builder("lead")
        .edge(LeadStatus::New, LeadStatus::Contacted)
        .edge(LeadStatus::Contacted, LeadStatus::QuotationSent)
        .edge(LeadStatus::QuotationSent, LeadStatus::Accepted)
        .edge(LeadStatus::Accepted, LeadStatus::Converted)
        .edges_from(
            &[
                LeadStatus::New,
                LeadStatus::Contacted,
                LeadStatus::QuotationSent,
                LeadStatus::Accepted,
            ],
            LeadStatus::Lost,
        )
        .build()
}
