//! Equated monthly installment (EMI) calculation
//!
//! Standard annuity amortization over a fixed number of monthly periods.

use crate::error::{LendingError, Result};
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

/// Annual percent to monthly fraction: 12 months x 100
const MONTHLY_RATE_DIVISOR: Decimal = dec!(1200);

/// Currency precision of installments
const CURRENCY_DP: u32 = 2;

pub struct EmiCalculator;

impl EmiCalculator {
    /// Fixed monthly installment for a loan.
    ///
    /// # Arguments
    /// * `principal` - Amount borrowed
    /// * `annual_rate` - Annual interest rate in percent (e.g., 12 for 12%)
    /// * `tenure_months` - Number of monthly installments
    ///
    /// EMI = P * r * (1+r)^n / ((1+r)^n - 1) with r the monthly rate.
    /// A zero rate repays principal in equal parts. Rounded to the cent.
    pub fn calculate_emi(principal: Decimal, annual_rate: Decimal, tenure_months: u32) -> Result<Decimal> {
        if tenure_months == 0 {
            return Err(LendingError::invalid("tenure must be at least one month"));
        }
        if principal < Decimal::ZERO {
            return Err(LendingError::invalid(format!("negative principal {}", principal)));
        }
        if annual_rate < Decimal::ZERO {
            return Err(LendingError::invalid(format!("negative interest rate {}", annual_rate)));
        }

        let n = Decimal::from(tenure_months);
        if annual_rate.is_zero() {
            return Ok((principal / n).round_dp(CURRENCY_DP));
        }

        let monthly_rate = annual_rate / MONTHLY_RATE_DIVISOR;
        let overflow = || {
            LendingError::invalid(format!(
                "installment overflows for rate {}% over {} months",
                annual_rate, tenure_months
            ))
        };

        let growth = (Decimal::ONE + monthly_rate)
            .checked_powu(tenure_months as u64)
            .ok_or_else(overflow)?;
        let emi = principal
            .checked_mul(monthly_rate)
            .and_then(|v| v.checked_mul(growth))
            .and_then(|v| v.checked_div(growth - Decimal::ONE))
            .ok_or_else(overflow)?;

        Ok(emi.round_dp(CURRENCY_DP))
    }

    /// Interest paid over the life of the loan: EMI x n - P
    pub fn total_interest(principal: Decimal, annual_rate: Decimal, tenure_months: u32) -> Result<Decimal> {
        let emi = Self::calculate_emi(principal, annual_rate, tenure_months)?;
        Ok(emi * Decimal::from(tenure_months) - principal)
    }
}
