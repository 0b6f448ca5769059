use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SettlementConfig;
use crate::decimal::Money;
use crate::errors::{LifecycleError, Result};
use crate::settlement::penalty::{early_termination_penalty, EarlyTerminationPenalty};
use crate::state::{Deduction, DepositSettlement, LeaseAccount};
use crate::types::{DeductionCategory, ItemCondition, LeaseId, ParkingSpotId, RefundStatus, SettlementId};

/// one line of the move-out inspection checklist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionItem {
    pub name: String,
    pub condition: ItemCondition,
    pub repair_cost: Money,
}

impl InspectionItem {
    pub fn new(name: impl Into<String>, condition: ItemCondition, repair_cost: Money) -> Self {
        Self {
            name: name.into(),
            condition,
            repair_cost,
        }
    }
}

/// checkout submission from the property manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutData {
    pub move_out_date: NaiveDate,
    pub inspection: Vec<InspectionItem>,
    /// manager-entered rows (cleaning, key replacement, other)
    pub deductions: Vec<Deduction>,
    /// optional confirmation of the spots being handed back; every spot on
    /// the lease is released regardless, and a non-empty list must match them
    pub parking_spot_ids: Vec<ParkingSpotId>,
    pub processed_by: Uuid,
}

impl CheckoutData {
    pub fn new(move_out_date: NaiveDate, processed_by: Uuid) -> Self {
        Self {
            move_out_date,
            inspection: Vec::new(),
            deductions: Vec::new(),
            parking_spot_ids: Vec::new(),
            processed_by,
        }
    }

    pub fn with_inspection(mut self, item: InspectionItem) -> Self {
        self.inspection.push(item);
        self
    }

    pub fn with_deduction(mut self, deduction: Deduction) -> Self {
        self.deductions.push(deduction);
        self
    }
}

/// settlement figures before they are bound to a lease and an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementDraft {
    pub original_deposit: Money,
    pub deductions: Vec<Deduction>,
    pub total_deductions: Money,
    pub net_refund: Money,
    pub amount_owed_by_tenant: bool,
    pub refund_status: RefundStatus,
    pub penalty: Option<EarlyTerminationPenalty>,
}

impl SettlementDraft {
    pub fn into_settlement(
        self,
        id: SettlementId,
        lease_account_id: LeaseId,
        calculated_at: DateTime<Utc>,
    ) -> DepositSettlement {
        DepositSettlement {
            id,
            lease_account_id,
            original_deposit: self.original_deposit,
            deductions: self.deductions,
            total_deductions: self.total_deductions,
            net_refund: self.net_refund,
            amount_owed_by_tenant: self.amount_owed_by_tenant,
            refund_status: self.refund_status,
            held_from: None,
            hold_reason: None,
            approved_by: None,
            approved_at: None,
            processed_at: None,
            calculated_at,
        }
    }
}

/// deposit settlement calculator
#[derive(Debug, Clone)]
pub struct DepositSettlementCalculator {
    config: SettlementConfig,
}

impl DepositSettlementCalculator {
    pub fn new(config: SettlementConfig) -> Self {
        Self { config }
    }

    /// rows derived from the ledger, the inspection and the lease terms
    pub fn auto_deductions(
        &self,
        lease: &LeaseAccount,
        checkout: &CheckoutData,
        outstanding_balances: &[Money],
    ) -> Result<(Vec<Deduction>, Option<EarlyTerminationPenalty>)> {
        let mut rows = Vec::new();

        // credits on the ledger are not deductions
        let unpaid: Money = outstanding_balances.iter().filter(|b| b.is_positive()).sum();
        if unpaid.is_positive() {
            let invoices = outstanding_balances.iter().filter(|b| b.is_positive()).count();
            rows.push(Deduction::automatic(
                DeductionCategory::UnpaidRent,
                unpaid,
                format!("{invoices} outstanding invoice(s)"),
            ));
        }

        let mut damaged = Vec::new();
        let mut repairs = Money::ZERO;
        for item in &checkout.inspection {
            if item.repair_cost.is_negative() {
                return Err(LifecycleError::InvalidDeduction {
                    category: format!("{} ({})", DeductionCategory::DamageRepairs, item.name),
                    amount: item.repair_cost,
                });
            }
            if item.condition.is_chargeable() {
                repairs += item.repair_cost;
                damaged.push(item.name.as_str());
            }
        }
        if repairs.is_positive() {
            rows.push(Deduction::automatic(
                DeductionCategory::DamageRepairs,
                repairs,
                damaged.join(", "),
            ));
        }

        let penalty = early_termination_penalty(
            lease,
            checkout.move_out_date,
            self.config.early_termination_cap_months,
        );
        if let Some(p) = penalty.filter(|p| p.amount.is_positive()) {
            rows.push(Deduction::automatic(
                DeductionCategory::EarlyTerminationPenalty,
                p.amount,
                format!(
                    "{} of {} remaining month(s) at {}",
                    p.charged_months, p.remaining_months, p.monthly_rent
                ),
            ));
        }

        Ok((rows, penalty))
    }

    /// totals, net refund and approval routing for a candidate deduction list
    pub fn calculate(
        &self,
        original_deposit: Money,
        candidate_deductions: Vec<Deduction>,
    ) -> Result<SettlementDraft> {
        if original_deposit.is_negative() {
            return Err(LifecycleError::InvalidDeposit {
                amount: original_deposit,
            });
        }

        if let Some(bad) = candidate_deductions.iter().find(|d| d.amount.is_negative()) {
            return Err(LifecycleError::InvalidDeduction {
                category: bad.category.to_string(),
                amount: bad.amount,
            });
        }

        let total_deductions: Money = candidate_deductions.iter().map(|d| d.amount).sum();
        let net_refund = original_deposit - total_deductions;
        let amount_owed_by_tenant = net_refund.is_negative();

        let disputed = candidate_deductions.iter().any(|d| d.disputed);
        let refund_status = if net_refund.abs() > self.config.approval_threshold || disputed {
            RefundStatus::PendingApproval
        } else {
            RefundStatus::Calculated
        };

        Ok(SettlementDraft {
            original_deposit,
            deductions: candidate_deductions,
            total_deductions,
            net_refund,
            amount_owed_by_tenant,
            refund_status,
            penalty: None,
        })
    }

    /// auto rows first, then manager rows, then totals and routing
    pub fn settle(
        &self,
        lease: &LeaseAccount,
        checkout: &CheckoutData,
        outstanding_balances: &[Money],
    ) -> Result<SettlementDraft> {
        let (mut rows, penalty) = self.auto_deductions(lease, checkout, outstanding_balances)?;
        rows.extend(checkout.deductions.iter().cloned());

        let mut draft = self.calculate(lease.security_deposit, rows)?;
        draft.penalty = penalty;
        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EarlyTerminationClause;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn calculator() -> DepositSettlementCalculator {
        DepositSettlementCalculator::new(SettlementConfig::default())
    }

    fn lease(deposit: i64) -> LeaseAccount {
        LeaseAccount::builder()
            .term(date(2024, 1, 1), date(2024, 12, 31))
            .base_rent(Money::from_major(5000))
            .security_deposit(Money::from_major(deposit))
            .early_termination(EarlyTerminationClause { penalty_cap_months: None })
            .build()
            .unwrap()
    }

    #[test]
    fn test_large_refund_needs_approval() {
        let draft = calculator()
            .calculate(
                Money::from_major(10_000),
                vec![
                    Deduction::manual(DeductionCategory::DamageRepairs, Money::from_major(3000), "wall"),
                    Deduction::manual(DeductionCategory::Cleaning, Money::from_major(500), "deep clean"),
                ],
            )
            .unwrap();

        assert_eq!(draft.total_deductions, Money::from_major(3500));
        assert_eq!(draft.net_refund, Money::from_major(6500));
        // 6500 > 5000 routes to a manager
        assert_eq!(draft.refund_status, RefundStatus::PendingApproval);
        assert!(!draft.amount_owed_by_tenant);
    }

    #[test]
    fn test_small_refund_is_calculated() {
        let draft = calculator()
            .calculate(
                Money::from_major(6000),
                vec![Deduction::manual(DeductionCategory::Cleaning, Money::from_major(1500), "")],
            )
            .unwrap();
        assert_eq!(draft.net_refund, Money::from_major(4500));
        assert_eq!(draft.refund_status, RefundStatus::Calculated);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let draft = calculator().calculate(Money::from_major(5000), Vec::new()).unwrap();
        assert_eq!(draft.refund_status, RefundStatus::Calculated);
    }

    #[test]
    fn test_dispute_forces_approval() {
        let draft = calculator()
            .calculate(
                Money::from_major(2000),
                vec![Deduction::manual(DeductionCategory::KeyReplacement, Money::from_major(200), "2 keys").disputed()],
            )
            .unwrap();
        assert_eq!(draft.refund_status, RefundStatus::PendingApproval);
    }

    #[test]
    fn test_tenant_owes_money() {
        let draft = calculator()
            .calculate(
                Money::from_major(3000),
                vec![Deduction::manual(DeductionCategory::DamageRepairs, Money::from_major(4200), "flooring")],
            )
            .unwrap();

        assert_eq!(draft.net_refund, Money::from_major(-1200));
        assert!(draft.amount_owed_by_tenant);
        assert_eq!(draft.refund_status, RefundStatus::Calculated);
    }

    #[test]
    fn test_owed_amount_over_threshold_needs_approval() {
        let draft = calculator()
            .calculate(
                Money::from_major(1000),
                vec![Deduction::manual(DeductionCategory::Other, Money::from_major(7000), "")],
            )
            .unwrap();
        assert_eq!(draft.net_refund, Money::from_major(-6000));
        assert_eq!(draft.refund_status, RefundStatus::PendingApproval);
    }

    #[test]
    fn test_validation() {
        assert_matches!(
            calculator().calculate(Money::from_major(-1), Vec::new()),
            Err(LifecycleError::InvalidDeposit { .. })
        );
        assert_matches!(
            calculator().calculate(
                Money::from_major(1000),
                vec![Deduction::manual(DeductionCategory::Cleaning, Money::from_major(-5), "")]
            ),
            Err(LifecycleError::InvalidDeduction { .. })
        );
    }

    #[test]
    fn test_settle_merges_auto_and_manual_rows() {
        let checkout = CheckoutData::new(date(2024, 10, 15), Uuid::new_v4())
            .with_inspection(InspectionItem::new("kitchen door", ItemCondition::Damaged, Money::from_major(800)))
            .with_inspection(InspectionItem::new("remote", ItemCondition::Missing, Money::from_major(150)))
            .with_inspection(InspectionItem::new("sofa", ItemCondition::Good, Money::from_major(999)))
            .with_deduction(Deduction::manual(DeductionCategory::Cleaning, Money::from_major(400), "move-out clean"));

        let balances = [Money::from_major(2500), Money::from_major(-100), Money::from_str_exact("120.50").unwrap()];
        let draft = calculator().settle(&lease(20_000), &checkout, &balances).unwrap();

        let categories: Vec<_> = draft.deductions.iter().map(|d| d.category).collect();
        assert_eq!(
            categories,
            vec![
                DeductionCategory::UnpaidRent,
                DeductionCategory::DamageRepairs,
                DeductionCategory::EarlyTerminationPenalty,
                DeductionCategory::Cleaning,
            ]
        );

        assert_eq!(draft.deductions[0].amount, Money::from_str_exact("2620.50").unwrap());
        assert_eq!(draft.deductions[1].amount, Money::from_major(950));
        // 3 months left, capped at 2
        assert_eq!(draft.deductions[2].amount, Money::from_major(10_000));
        assert!(draft.deductions[..3].iter().all(|d| d.auto_calculated));
        assert!(!draft.deductions[3].auto_calculated);

        assert_eq!(draft.total_deductions, Money::from_str_exact("13970.50").unwrap());
        assert_eq!(draft.net_refund, Money::from_str_exact("6029.50").unwrap());
        assert_eq!(draft.penalty.map(|p| p.remaining_months), Some(3));
    }

    #[test]
    fn test_settle_rejects_negative_repair_cost() {
        let checkout = CheckoutData::new(date(2024, 12, 31), Uuid::new_v4())
            .with_inspection(InspectionItem::new("tap", ItemCondition::Damaged, Money::from_major(-10)));
        assert_matches!(
            calculator().settle(&lease(5000), &checkout, &[]),
            Err(LifecycleError::InvalidDeduction { .. })
        );
    }

    #[test]
    fn test_full_term_checkout_has_no_penalty_row() {
        let checkout = CheckoutData::new(date(2024, 12, 31), Uuid::new_v4());
        let draft = calculator().settle(&lease(5000), &checkout, &[]).unwrap();
        assert!(draft.deductions.is_empty());
        assert_eq!(draft.net_refund, Money::from_major(5000));
    }

    proptest! {
        #[test]
        fn prop_total_equals_sum(amounts in prop::collection::vec(0i64..10_000_000, 0..20)) {
            let rows: Vec<Deduction> = amounts
                .iter()
                .map(|cents| Deduction::manual(DeductionCategory::Other, Money::from_minor(*cents), ""))
                .collect();
            let expected: Money = rows.iter().map(|d| d.amount).sum();

            let draft = calculator().calculate(Money::from_major(50_000), rows).unwrap();
            prop_assert_eq!(draft.total_deductions, expected);
            prop_assert_eq!(draft.net_refund, Money::from_major(50_000) - expected);
        }
    }
}
