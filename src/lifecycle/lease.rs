use chrono::NaiveDate;

use crate::lifecycle::machine::{StateMachine, Stateful};
use crate::state::LeaseAccount;
use crate::types::{LeaseStatus, LeaseTrigger};

impl Stateful for LeaseAccount {
    type State = LeaseStatus;

    fn state(&self) -> LeaseStatus {
        self.status
    }

    fn set_state(&mut self, state: LeaseStatus) {
        self.status = state;
    }
}

/// context for lease status changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaseContext {
    pub today: NaiveDate,
    pub trigger: LeaseTrigger,
    pub expiring_window_days: u32,
}

impl LeaseContext {
    pub fn new(today: NaiveDate, trigger: LeaseTrigger, expiring_window_days: u32) -> Self {
        Self {
            today,
            trigger,
            expiring_window_days,
        }
    }
}

/// ACTIVE -> EXPIRING_SOON -> TERMINATED, ACTIVE -> TERMINATED, and
/// EXPIRING_SOON -> ACTIVE only through an extension
pub fn lease_machine() -> StateMachine<LeaseAccount, LeaseContext> {
    StateMachine::<LeaseAccount, LeaseContext>::builder("lease")
        .edge(LeaseStatus::Active, LeaseStatus::ExpiringSoon)
        .guarded(LeaseStatus::ExpiringSoon, LeaseStatus::Active, |lease, ctx| {
            if ctx.trigger != LeaseTrigger::Extension {
                return Err("only an extension can reactivate an expiring lease".to_string());
            }
            let remaining = lease.days_remaining(ctx.today);
            if remaining <= i64::from(ctx.expiring_window_days) {
                return Err(format!(
                    "{remaining} days remaining after extension, need more than {}",
                    ctx.expiring_window_days
                ));
            }
            Ok(())
        })
        .guarded(LeaseStatus::Active, LeaseStatus::Terminated, checkout_only)
        .guarded(LeaseStatus::ExpiringSoon, LeaseStatus::Terminated, checkout_only)
        .build()
}

fn checkout_only(_: &LeaseAccount, ctx: &LeaseContext) -> Result<(), String> {
    if ctx.trigger == LeaseTrigger::Checkout {
        Ok(())
    } else {
        Err(format!("termination requires checkout, got {:?}", ctx.trigger))
    }
}
