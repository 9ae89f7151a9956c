//! Customer record as held by the loan book

use crate::error::{LendingError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Approved limit is this many months of salary
const LIMIT_SALARY_MULTIPLE: Decimal = dec!(36);

/// Approved limits are quoted in whole lakhs
const LAKH: Decimal = dec!(100000);

/// Credit limit granted at registration: 36 x monthly salary, rounded to the
/// nearest lakh (ties to even).
pub fn approved_limit_for(monthly_salary: Decimal) -> Decimal {
    (LIMIT_SALARY_MULTIPLE * monthly_salary / LAKH).round() * LAKH
}

/// A borrower on the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// Unique customer identifier
    pub customer_id: u32,

    pub first_name: String,

    pub last_name: String,

    /// Age in years, when known
    #[serde(default)]
    pub age: Option<u8>,

    pub phone_number: u64,

    /// Gross monthly salary
    pub monthly_salary: Decimal,

    /// Maximum aggregate active-loan exposure permitted
    pub approved_limit: Decimal,

    /// Outstanding repayments on loans booked through the platform
    #[serde(default)]
    pub current_debt: Decimal,
}

impl Customer {
    /// Create a customer with an explicit approved limit
    pub fn new(
        customer_id: u32,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        phone_number: u64,
        monthly_salary: Decimal,
        approved_limit: Decimal,
    ) -> Self {
        Self {
            customer_id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            age: None,
            phone_number,
            monthly_salary,
            approved_limit,
            current_debt: Decimal::ZERO,
        }
    }

    /// Register a new customer, deriving the approved limit from salary
    pub fn register(
        customer_id: u32,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        age: Option<u8>,
        phone_number: u64,
        monthly_salary: Decimal,
    ) -> Result<Self> {
        let mut customer = Self::new(
            customer_id,
            first_name,
            last_name,
            phone_number,
            monthly_salary,
            approved_limit_for(monthly_salary),
        );
        customer.age = age;
        customer.validate()?;
        Ok(customer)
    }

    /// Check the non-negativity invariants on the monetary fields
    pub fn validate(&self) -> Result<()> {
        if self.monthly_salary < Decimal::ZERO {
            return Err(LendingError::invalid(format!(
                "customer {} has negative monthly salary {}",
                self.customer_id, self.monthly_salary
            )));
        }
        if self.approved_limit < Decimal::ZERO {
            return Err(LendingError::invalid(format!(
                "customer {} has negative approved limit {}",
                self.customer_id, self.approved_limit
            )));
        }
        if self.current_debt < Decimal::ZERO {
            return Err(LendingError::invalid(format!(
                "customer {} has negative current debt {}",
                self.customer_id, self.current_debt
            )));
        }
        Ok(())
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
