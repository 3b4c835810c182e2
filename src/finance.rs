//! General functions related to finance.
use crate::units::{Dimensionless, Money};

/// Months in a year
const MONTHS_PER_YEAR: u32 = 12;

/// Calculates the capital recovery factor (CRF) for a given number of periods and interest rate.
///
/// The CRF is the share of a loan's principal which must be paid each period to repay the loan
/// with interest over the given number of periods. For very long terms it tends towards `rate`.
pub fn capital_recovery_factor(periods: u32, rate: Dimensionless) -> Dimensionless {
    if periods == 0 {
        return Dimensionless(0.0);
    }
    if rate == Dimensionless(0.0) {
        return Dimensionless(1.0) / Dimensionless(f64::from(periods));
    }

    // Discount factor for the final period: (1 + r)^-n
    let discount = (Dimensionless(1.0) + rate).powf(-f64::from(periods));
    rate / (Dimensionless(1.0) - discount)
}

/// Calculates the monthly payment for a fixed-rate mortgage.
///
/// A term of zero years gives a payment of zero. Terms too long to count in months are treated
/// as the longest term which can be.
///
/// # Arguments
///
/// * `principal` - The amount borrowed
/// * `annual_rate` - Yearly interest rate (e.g. 0.03 for 3%)
/// * `years` - Term of the mortgage
pub fn mortgage_payment(principal: Money, annual_rate: Dimensionless, years: u32) -> Money {
    let monthly_rate = annual_rate / Dimensionless(f64::from(MONTHS_PER_YEAR));
    principal * capital_recovery_factor(years.saturating_mul(MONTHS_PER_YEAR), monthly_rate)
}
