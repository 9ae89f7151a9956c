//! Loan records from the lending book

use crate::error::{LendingError, Result};
use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Booked loans are scheduled in 30-day months
const DAYS_PER_BOOKED_MONTH: i64 = 30;

/// A single loan, active or closed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRecord {
    /// Unique loan identifier
    pub loan_id: u32,

    /// Owning customer
    pub customer_id: u32,

    /// Principal amount
    pub loan_amount: Decimal,

    /// Duration in months
    pub tenure: u32,

    /// Annual interest rate in percent
    pub interest_rate: Decimal,

    /// Fixed monthly installment (EMI)
    pub monthly_repayment: Decimal,

    /// Number of installments paid on time
    pub emis_paid_on_time: u32,

    pub start_date: NaiveDate,

    pub end_date: NaiveDate,

    pub is_active: bool,
}

impl LoanRecord {
    /// Create a new active loan starting on `start_date`, ending 30 days per
    /// month of tenure later
    pub fn booked(
        loan_id: u32,
        customer_id: u32,
        loan_amount: Decimal,
        tenure: u32,
        interest_rate: Decimal,
        monthly_repayment: Decimal,
        start_date: NaiveDate,
    ) -> Self {
        let end_date = start_date + Duration::days(DAYS_PER_BOOKED_MONTH * tenure as i64);
        Self {
            loan_id,
            customer_id,
            loan_amount,
            tenure,
            interest_rate,
            monthly_repayment,
            emis_paid_on_time: 0,
            start_date,
            end_date,
            is_active: true,
        }
    }

    /// Installments still to be paid
    pub fn repayments_left(&self) -> u32 {
        self.tenure.saturating_sub(self.emis_paid_on_time)
    }

    /// Whether the loan started or ended in the given calendar year
    pub fn touches_year(&self, year: i32) -> bool {
        self.start_date.year() == year || self.end_date.year() == year
    }

    /// Check tenure, payment count, and monetary invariants
    pub fn validate(&self) -> Result<()> {
        if self.tenure == 0 {
            return Err(LendingError::invalid(format!(
                "loan {} has zero tenure",
                self.loan_id
            )));
        }
        if self.emis_paid_on_time > self.tenure {
            return Err(LendingError::invalid(format!(
                "loan {} has {} on-time EMIs for a {}-month tenure",
                self.loan_id, self.emis_paid_on_time, self.tenure
            )));
        }
        if self.loan_amount < Decimal::ZERO
            || self.interest_rate < Decimal::ZERO
            || self.monthly_repayment < Decimal::ZERO
        {
            return Err(LendingError::invalid(format!(
                "loan {} has a negative amount, rate, or repayment",
                self.loan_id
            )));
        }
        Ok(())
    }
}
