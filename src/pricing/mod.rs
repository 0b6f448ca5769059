pub mod first_payment;
pub mod rent;

pub use first_payment::{first_payment, FirstPaymentBreakdown};
pub use rent::{ParkingCharge, RentAdjustmentCalculator, RentQuote};
