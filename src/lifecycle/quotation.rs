use chrono::NaiveDate;

use crate::lifecycle::machine::{StateMachine, Stateful};
use crate::state::QuotationAccount;
use crate::types::QuotationStatus;

impl Stateful for QuotationAccount {
    type State = QuotationStatus;

    fn state(&self) -> QuotationStatus {
        self.status
    }

    fn set_state(&mut self, state: QuotationStatus) {
        self.status = state;
    }
}

/// context for quotation status changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotationContext {
    pub today: NaiveDate,
}

/// DRAFT -> SENT -> {ACCEPTED -> CONVERTED, REJECTED, EXPIRED}
pub fn quotation_machine() -> StateMachine<QuotationAccount, QuotationContext> {
    StateMachine::<QuotationAccount, QuotationContext>::builder("quotation")
        .edge(QuotationStatus::Draft, QuotationStatus::Sent)
        .guarded(QuotationStatus::Sent, QuotationStatus::Accepted, |quotation, ctx| {
            ensure_sent(quotation)?;
            if quotation.is_past_validity(ctx.today) {
                return Err(format!("quotation lapsed on {}", quotation.validity_date));
            }
            Ok(())
        })
        .guarded(QuotationStatus::Sent, QuotationStatus::Rejected, |quotation, _| {
            ensure_sent(quotation)
        })
        .guarded(QuotationStatus::Sent, QuotationStatus::Expired, |quotation, ctx| {
            if quotation.is_past_validity(ctx.today) {
                Ok(())
            } else {
                Err(format!(
                    "quotation valid until {}, today is {}",
                    quotation.validity_date, ctx.today
                ))
            }
        })
        .edge(QuotationStatus::Accepted, QuotationStatus::Converted)
        .build()
}

// guards against double-processing of a response
fn ensure_sent(quotation: &QuotationAccount) -> Result<(), String> {
    if quotation.status == QuotationStatus::Sent {
        Ok(())
    } else {
        Err(format!("quotation is {:?}, expected Sent", quotation.status))
    }
}
