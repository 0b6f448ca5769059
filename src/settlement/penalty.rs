use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::state::LeaseAccount;

/// early termination penalty breakdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarlyTerminationPenalty {
    pub remaining_months: u32,
    pub cap_months: u32,
    pub charged_months: u32,
    pub monthly_rent: Money,
    pub amount: Money,
}

/// whole months left on the lease, a started month counts as a full one
pub fn remaining_months(move_out: NaiveDate, lease_end: NaiveDate) -> u32 {
    if move_out >= lease_end {
        return 0;
    }

    let mut months = (lease_end.year() - move_out.year()) * 12 + lease_end.month() as i32
        - move_out.month() as i32;
    if lease_end.day() > move_out.day() {
        months += 1;
    }

    months.max(0) as u32
}

/// penalty for leaving before lease end; `None` when the lease has no
/// penalty clause or the tenant stays to the end
pub fn early_termination_penalty(
    lease: &LeaseAccount,
    move_out: NaiveDate,
    default_cap_months: u32,
) -> Option<EarlyTerminationPenalty> {
    let clause = lease.early_termination?;
    if move_out >= lease.lease_end {
        return None;
    }

    let remaining = remaining_months(move_out, lease.lease_end);
    let cap_months = clause.penalty_cap_months.unwrap_or(default_cap_months);
    let charged_months = remaining.min(cap_months);

    Some(EarlyTerminationPenalty {
        remaining_months: remaining,
        cap_months,
        charged_months,
        monthly_rent: lease.base_rent,
        amount: lease.base_rent.times(charged_months),
    })
}
