use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::state::QuotationAccount;

/// amounts due before move-in for a quotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirstPaymentBreakdown {
    pub first_month_rent: Money,
    pub service_charge: Money,
    pub parking: Money,
    pub security_deposit: Money,
    pub admin_fee: Money,
    pub total: Money,
}

impl FirstPaymentBreakdown {
    /// recurring part of the first payment, excluding one-off items
    pub fn monthly_portion(&self) -> Money {
        self.first_month_rent + self.service_charge + self.parking
    }
}

/// first payment = first month (rent + service + parking) + deposit + admin fee
pub fn first_payment(quotation: &QuotationAccount) -> FirstPaymentBreakdown {
    let parking = quotation.parking_fee_per_spot.times(quotation.parking_spots);
    let total = quotation.base_rent
        + quotation.service_charge
        + parking
        + quotation.security_deposit
        + quotation.admin_fee;

    FirstPaymentBreakdown {
        first_month_rent: quotation.base_rent,
        service_charge: quotation.service_charge,
        parking,
        security_deposit: quotation.security_deposit,
        admin_fee: quotation.admin_fee,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    #[test]
    fn test_first_payment_total() {
        let mut quotation = QuotationAccount::draft(
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            Money::from_str_exact("6250.50").unwrap(),
        );
        quotation.service_charge = Money::from_major(350);
        quotation.parking_spots = 2;
        quotation.parking_fee_per_spot = Money::from_major(250);
        quotation.security_deposit = Money::from_major(12_000);
        quotation.admin_fee = Money::from_major(1_050);

        let breakdown = first_payment(&quotation);
        assert_eq!(breakdown.parking, Money::from_major(500));
        assert_eq!(breakdown.monthly_portion(), Money::from_str_exact("7100.50").unwrap());
        assert_eq!(breakdown.total, Money::from_str_exact("20150.50").unwrap());
    }

    #[test]
    fn test_no_extras() {
        let quotation = QuotationAccount::draft(
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            Money::from_major(4000),
        );
        let breakdown = first_payment(&quotation);
        assert_eq!(breakdown.total, Money::from_major(4000));
        assert_eq!(breakdown.parking, Money::ZERO);
    }
}
