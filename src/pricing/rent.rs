use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LifecycleError, Result};
use crate::types::{AdjustmentType, RentAdjustment};

/// parking line added to the monthly total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkingCharge {
    pub spots: u32,
    pub fee_per_spot: Money,
}

impl ParkingCharge {
    pub fn monthly(&self) -> Money {
        self.fee_per_spot.times(self.spots)
    }
}

/// result of an extension rent calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentQuote {
    pub previous_base_rent: Money,
    pub new_base_rent: Money,
    pub service_charge: Money,
    pub parking: Money,
    pub new_total_monthly: Money,
    pub adjustment_type: AdjustmentType,
    pub adjustment_value: Decimal,
}

impl RentQuote {
    /// signed change in base rent
    pub fn rent_change(&self) -> Money {
        self.new_base_rent - self.previous_base_rent
    }
}

/// rent calculator for lease extensions
pub struct RentAdjustmentCalculator;

impl RentAdjustmentCalculator {
    /// new base rent and monthly total for an extension
    pub fn compute_extension(
        current_base_rent: Money,
        service_charge: Money,
        adjustment: RentAdjustment,
        parking: Option<ParkingCharge>,
    ) -> Result<RentQuote> {
        let new_base_rent = match adjustment {
            RentAdjustment::None => current_base_rent,
            RentAdjustment::Percentage(percent) => current_base_rent.adjust_by_percentage(percent),
            RentAdjustment::Flat(amount) => current_base_rent + amount,
            RentAdjustment::Custom(amount) => {
                if !amount.is_positive() {
                    return Err(LifecycleError::InvalidAmount {
                        amount,
                        message: "custom rent must be greater than zero".to_string(),
                    });
                }
                amount
            }
        };

        if !new_base_rent.is_positive() {
            return Err(LifecycleError::InvalidAmount {
                amount: new_base_rent,
                message: format!("{:?} adjustment leaves no rent", adjustment.adjustment_type()),
            });
        }

        // each persisted figure is already rounded by Money
        let parking = parking.map(|p| p.monthly()).unwrap_or(Money::ZERO);
        let new_total_monthly = new_base_rent + service_charge + parking;

        Ok(RentQuote {
            previous_base_rent: current_base_rent,
            new_base_rent,
            service_charge,
            parking,
            new_total_monthly,
            adjustment_type: adjustment.adjustment_type(),
            adjustment_value: adjustment.value(),
        })
    }
}
