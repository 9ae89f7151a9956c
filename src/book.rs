//! In-memory lending book
//!
//! The engine never touches storage directly. It reads customers and their
//! loans through [`LoanStore`]; [`LoanBook`] is the implementation backed by the
//! CSV extracts, and also books newly approved loans.

use crate::config::EngineConfig;
use crate::customer::{load_customers, save_customers, Customer};
use crate::engine::{
    CreditScoreCalculator, EligibilityPolicy, EligibilityResult, EligibilityService, EmiCalculator,
    ScoreBreakdown,
};
use crate::error::{LendingError, Result};
use crate::loan::{load_loans, save_loans, LoanRecord};
use chrono::NaiveDate;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const BOOKED_MESSAGE: &str = "Loan approved successfully";

/// Read access to customers and their loans
///
/// Implement this trait to score against another source of records.
pub trait LoanStore {
    fn get_customer(&self, customer_id: u32) -> Result<&Customer>;

    /// Every loan of the customer, active and closed
    fn get_loan_history(&self, customer: &Customer) -> &[LoanRecord];

    /// Policy applied by [`LoanStore::check_eligibility`]
    fn eligibility_policy(&self) -> EligibilityPolicy {
        EligibilityPolicy::default()
    }

    fn get_active_loans(&self, customer: &Customer) -> Vec<&LoanRecord> {
        self.get_loan_history(customer)
            .iter()
            .filter(|l| l.is_active)
            .collect()
    }

    /// Score a customer as of `reference_date`
    fn score(&self, customer_id: u32, reference_date: NaiveDate) -> Result<ScoreBreakdown> {
        let customer = self.get_customer(customer_id)?;
        let history = self.get_loan_history(customer);
        Ok(CreditScoreCalculator::new(reference_date).breakdown(customer, history))
    }

    /// Run an eligibility check for a loan request. The affordability check
    /// counts the installments of [`LoanStore::get_active_loans`].
    fn check_eligibility(
        &self,
        customer_id: u32,
        loan_amount: Decimal,
        interest_rate: Decimal,
        tenure: u32,
        reference_date: NaiveDate,
    ) -> Result<EligibilityResult> {
        let customer = self.get_customer(customer_id)?;
        let history = self.get_loan_history(customer);
        let current_emis = self
            .get_active_loans(customer)
            .iter()
            .map(|l| l.monthly_repayment)
            .sum();
        EligibilityService::new(customer, history, reference_date)
            .with_policy(self.eligibility_policy())
            .with_current_emis(current_emis)
            .check_eligibility(loan_amount, interest_rate, tenure)
    }
}

/// Customer fields shown alongside a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub id: u32,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: u64,
    pub age: Option<u8>,
}

impl From<&Customer> for CustomerSummary {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.customer_id,
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            phone_number: customer.phone_number,
            age: customer.age,
        }
    }
}

/// A single loan with its borrower
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanDetail {
    pub loan_id: u32,
    pub customer: CustomerSummary,
    pub loan_amount: Decimal,
    pub interest_rate: Decimal,
    pub monthly_installment: Decimal,
    pub tenure: u32,
}

/// One row of a customer's open loans
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveLoan {
    pub loan_id: u32,
    pub loan_amount: Decimal,
    pub interest_rate: Decimal,
    pub monthly_installment: Decimal,
    pub repayments_left: u32,
}

impl From<&LoanRecord> for ActiveLoan {
    fn from(loan: &LoanRecord) -> Self {
        Self {
            loan_id: loan.loan_id,
            loan_amount: loan.loan_amount,
            interest_rate: loan.interest_rate,
            monthly_installment: loan.monthly_repayment,
            repayments_left: loan.repayments_left(),
        }
    }
}

/// Result of trying to book a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingOutcome {
    /// Set only when the loan was booked
    pub loan_id: Option<u32>,
    pub customer_id: u32,
    pub loan_approved: bool,
    pub message: String,
    pub monthly_installment: Decimal,
}

/// Customers and loans held in memory, keyed by id
#[derive(Debug, Clone, Default)]
pub struct LoanBook {
    customers: BTreeMap<u32, Customer>,
    loans: BTreeMap<u32, Vec<LoanRecord>>,
    /// loan_id -> customer_id
    loan_owner: HashMap<u32, u32>,
    policy: EligibilityPolicy,
}

impl LoanBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a book from loaded records. Later rows with the same id replace
    /// earlier ones; loans of unknown customers are skipped.
    pub fn from_records(customers: Vec<Customer>, loans: Vec<LoanRecord>) -> Self {
        let mut book = Self::new();
        for customer in customers {
            book.upsert_customer(customer);
        }

        let mut skipped = 0;
        for loan in loans {
            if !book.upsert_loan(loan) {
                skipped += 1;
            }
        }
        if skipped > 0 {
            warn!("Skipped {} loans of unknown customers", skipped);
        }
        book
    }

    /// Load both extracts from the configured data directory
    pub fn load(config: &EngineConfig) -> Result<Self> {
        let customers = load_customers(config.customers_path())?;
        let loans = load_loans(config.loans_path())?;
        let book = Self::from_records(customers, loans);
        info!(
            "Loan book ready: {} customers, {} loans",
            book.customer_count(),
            book.loan_count()
        );
        Ok(book)
    }

    pub fn with_policy(mut self, policy: EligibilityPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Write both extracts back to the configured data directory
    pub fn save(&self, config: &EngineConfig) -> Result<()> {
        save_customers(config.customers_path(), self.customers())?;
        save_loans(config.loans_path(), self.loans())?;
        Ok(())
    }

    pub fn upsert_customer(&mut self, customer: Customer) {
        self.loans.entry(customer.customer_id).or_default();
        self.customers.insert(customer.customer_id, customer);
    }

    /// Insert or replace a loan. Returns false if its customer is unknown.
    pub fn upsert_loan(&mut self, loan: LoanRecord) -> bool {
        if !self.customers.contains_key(&loan.customer_id) {
            debug!("Loan {} references unknown customer {}", loan.loan_id, loan.customer_id);
            return false;
        }

        if let Some(previous_owner) = self.loan_owner.insert(loan.loan_id, loan.customer_id) {
            if let Some(list) = self.loans.get_mut(&previous_owner) {
                list.retain(|l| l.loan_id != loan.loan_id);
            }
        }
        self.loans.entry(loan.customer_id).or_default().push(loan);
        true
    }

    /// Register a new customer with a salary-derived approved limit
    pub fn register_customer(
        &mut self,
        first_name: &str,
        last_name: &str,
        age: Option<u8>,
        phone_number: u64,
        monthly_salary: Decimal,
    ) -> Result<&Customer> {
        if self.customers.values().any(|c| c.phone_number == phone_number) {
            return Err(LendingError::invalid(format!(
                "phone number {} already registered",
                phone_number
            )));
        }

        let customer_id = self.customers.keys().next_back().map_or(1, |id| id + 1);
        let customer = Customer::register(customer_id, first_name, last_name, age, phone_number, monthly_salary)?;
        info!(
            "Registered customer {} with approved limit {}",
            customer_id, customer.approved_limit
        );
        self.upsert_customer(customer);
        self.get_customer(customer_id)
    }

    pub fn customers(&self) -> impl Iterator<Item = &Customer> {
        self.customers.values()
    }

    /// All loans, grouped by customer id
    pub fn loans(&self) -> impl Iterator<Item = &LoanRecord> {
        self.loans.values().flatten()
    }

    pub fn customer_count(&self) -> usize {
        self.customers.len()
    }

    pub fn loan_count(&self) -> usize {
        self.loan_owner.len()
    }

    /// A loan together with its borrower
    pub fn loan(&self, loan_id: u32) -> Result<LoanDetail> {
        let customer_id = *self
            .loan_owner
            .get(&loan_id)
            .ok_or(LendingError::LoanNotFound(loan_id))?;
        let customer = self.get_customer(customer_id)?;
        let loan = self
            .get_loan_history(customer)
            .iter()
            .find(|l| l.loan_id == loan_id)
            .ok_or(LendingError::LoanNotFound(loan_id))?;

        Ok(LoanDetail {
            loan_id,
            customer: CustomerSummary::from(customer),
            loan_amount: loan.loan_amount,
            interest_rate: loan.interest_rate,
            monthly_installment: loan.monthly_repayment,
            tenure: loan.tenure,
        })
    }

    /// Open loans of a customer with remaining repayments
    pub fn active_loans_of(&self, customer_id: u32) -> Result<Vec<ActiveLoan>> {
        let customer = self.get_customer(customer_id)?;
        Ok(self
            .get_active_loans(customer)
            .into_iter()
            .map(ActiveLoan::from)
            .collect())
    }

    /// Check eligibility and, if approved, book the loan starting `today`.
    ///
    /// The booked loan carries the corrected rate and an installment priced at
    /// it. The customer's current debt grows by installment x tenure.
    pub fn book_loan(
        &mut self,
        customer_id: u32,
        loan_amount: Decimal,
        interest_rate: Decimal,
        tenure: u32,
        today: NaiveDate,
    ) -> Result<BookingOutcome> {
        let decision = self.check_eligibility(customer_id, loan_amount, interest_rate, tenure, today)?;

        if !decision.approval {
            info!("Customer {}: booking refused: {}", customer_id, decision.message);
            return Ok(BookingOutcome {
                loan_id: None,
                customer_id,
                loan_approved: false,
                message: decision.message,
                monthly_installment: decision.monthly_installment,
            });
        }

        let rate = decision.corrected_interest_rate;
        let installment = EmiCalculator::calculate_emi(loan_amount, rate, tenure)?;
        let loan_id = self.loan_owner.keys().max().map_or(1, |id| id + 1);
        let loan = LoanRecord::booked(loan_id, customer_id, loan_amount, tenure, rate, installment, today);

        if let Some(customer) = self.customers.get_mut(&customer_id) {
            customer.current_debt += installment * Decimal::from(tenure);
        }
        self.upsert_loan(loan);
        info!(
            "Customer {}: booked loan {} of {} at {}% for {} months",
            customer_id, loan_id, loan_amount, rate, tenure
        );

        Ok(BookingOutcome {
            loan_id: Some(loan_id),
            customer_id,
            loan_approved: true,
            message: BOOKED_MESSAGE.to_string(),
            monthly_installment: installment,
        })
    }
}

impl LoanStore for LoanBook {
    fn get_customer(&self, customer_id: u32) -> Result<&Customer> {
        self.customers
            .get(&customer_id)
            .ok_or(LendingError::CustomerNotFound(customer_id))
    }

    fn get_loan_history(&self, customer: &Customer) -> &[LoanRecord] {
        self.loans
            .get(&customer.customer_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn eligibility_policy(&self) -> EligibilityPolicy {
        self.policy.clone()
    }
}
