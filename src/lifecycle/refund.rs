use uuid::Uuid;

use crate::lifecycle::machine::{StateMachine, Stateful};
use crate::state::DepositSettlement;
use crate::types::RefundStatus;

impl Stateful for DepositSettlement {
    type State = RefundStatus;

    fn state(&self) -> RefundStatus {
        self.refund_status
    }

    fn set_state(&mut self, state: RefundStatus) {
        self.refund_status = state;
    }
}

/// context for refund workflow changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefundContext {
    pub actor: Option<Uuid>,
}

impl RefundContext {
    pub fn by(actor: Uuid) -> Self {
        Self { actor: Some(actor) }
    }
}

const PRE_COMPLETED: [RefundStatus; 4] = [
    RefundStatus::Calculated,
    RefundStatus::PendingApproval,
    RefundStatus::Approved,
    RefundStatus::Processing,
];

/// CALCULATED -> PENDING_APPROVAL -> APPROVED -> PROCESSING -> COMPLETED, with
/// ON_HOLD reachable from every pre-COMPLETED state and releasing back to it
pub fn refund_machine() -> StateMachine<DepositSettlement, RefundContext> {
    let mut builder = StateMachine::<DepositSettlement, RefundContext>::builder("deposit settlement")
        .edge(RefundStatus::Calculated, RefundStatus::PendingApproval)
        .guarded(RefundStatus::Calculated, RefundStatus::Approved, require_approver)
        .edge(RefundStatus::Calculated, RefundStatus::Processing)
        .guarded(RefundStatus::PendingApproval, RefundStatus::Approved, require_approver)
        .edge(RefundStatus::Approved, RefundStatus::Processing)
        .edge(RefundStatus::Processing, RefundStatus::Completed)
        .edges_from(&PRE_COMPLETED, RefundStatus::OnHold);

    for target in PRE_COMPLETED {
        builder = builder.guarded(RefundStatus::OnHold, target, move |settlement, _| {
            match settlement.held_from {
                Some(held_from) if held_from == target => Ok(()),
                Some(held_from) => Err(format!("hold must release back to {held_from:?}")),
                None => Err("settlement has no recorded pre-hold status".to_string()),
            }
        });
    }

    builder.build()
}

fn require_approver(_: &DepositSettlement, ctx: &RefundContext) -> Result<(), String> {
    match ctx.actor {
        Some(_) => Ok(()),
        None => Err("approval requires an approver".to_string()),
    }
}
