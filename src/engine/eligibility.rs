//! Loan eligibility decisions
//!
//! A single pass over one request: score the customer, price the request at the
//! asked-for rate, reject on a low score or on salary burden, otherwise correct
//! the rate to the floor of the customer's score band and approve.

use super::emi::EmiCalculator;
use super::score::CreditScoreCalculator;
use crate::customer::Customer;
use crate::error::Result;
use crate::loan::LoanRecord;
use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

pub const APPROVED_MESSAGE: &str = "Loan approved";

/// Thresholds and rate floors applied to a scored request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityPolicy {
    /// Scores at or below this are rejected outright
    pub reject_at_or_below: u8,

    /// Existing plus new EMIs may not exceed this share of monthly salary.
    /// The burden rejection message quotes it as a percentage.
    pub max_emi_to_salary: Decimal,

    /// Scores above this borrow at the requested rate
    pub prime_score: u8,

    /// Scores above this (up to `prime_score`) get `near_prime_rate_floor`;
    /// scores above `reject_at_or_below` and up to this get `subprime_rate_floor`
    pub near_prime_score: u8,

    /// Minimum annual rate in percent for the near-prime band
    pub near_prime_rate_floor: Decimal,

    /// Minimum annual rate in percent for the subprime band
    pub subprime_rate_floor: Decimal,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self {
            reject_at_or_below: 10,
            max_emi_to_salary: dec!(0.5),
            prime_score: 50,
            near_prime_score: 30,
            near_prime_rate_floor: dec!(12),
            subprime_rate_floor: dec!(16),
        }
    }
}

impl EligibilityPolicy {
    /// Rate the customer will actually be offered for a requested rate
    pub fn corrected_rate(&self, credit_score: u8, requested_rate: Decimal) -> Decimal {
        if credit_score > self.prime_score {
            requested_rate
        } else if credit_score > self.near_prime_score {
            requested_rate.max(self.near_prime_rate_floor)
        } else if credit_score > self.reject_at_or_below {
            requested_rate.max(self.subprime_rate_floor)
        } else {
            requested_rate
        }
    }

    /// Message returned with a rejection under this policy
    pub fn rejection_message(&self, reason: RejectionReason) -> String {
        match reason {
            RejectionReason::LowCreditScore => "Credit score too low. Loan rejected.".to_string(),
            RejectionReason::EmiBurden => format!(
                "Sum of current EMIs exceeds {}% of monthly salary. Loan rejected.",
                (self.max_emi_to_salary * dec!(100)).normalize()
            ),
        }
    }
}

/// Why a request was turned down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    LowCreditScore,
    EmiBurden,
}

/// Outcome of one eligibility check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityResult {
    pub approval: bool,

    /// Rate the installment was priced at (the requested rate when rejected)
    pub corrected_interest_rate: Decimal,

    pub monthly_installment: Decimal,

    pub message: String,

    pub credit_score: u8,
}

impl EligibilityResult {
    fn rejected(message: String, requested_rate: Decimal, installment: Decimal, credit_score: u8) -> Self {
        Self {
            approval: false,
            corrected_interest_rate: requested_rate,
            monthly_installment: installment,
            message,
            credit_score,
        }
    }

    fn approved(rate: Decimal, installment: Decimal, credit_score: u8) -> Self {
        Self {
            approval: true,
            corrected_interest_rate: rate,
            monthly_installment: installment,
            message: APPROVED_MESSAGE.to_string(),
            credit_score,
        }
    }
}

/// Evaluates loan requests for one customer against their loan history
pub struct EligibilityService<'a> {
    customer: &'a Customer,
    history: &'a [LoanRecord],
    scorer: CreditScoreCalculator,
    policy: EligibilityPolicy,
    current_emis: Decimal,
}

impl<'a> EligibilityService<'a> {
    /// `history` is every loan of the customer, active and closed
    pub fn new(customer: &'a Customer, history: &'a [LoanRecord], reference_date: NaiveDate) -> Self {
        Self {
            customer,
            history,
            scorer: CreditScoreCalculator::new(reference_date),
            policy: EligibilityPolicy::default(),
            current_emis: active_emi_total(history),
        }
    }

    pub fn with_policy(mut self, policy: EligibilityPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the existing-installment total taken from the history, for
    /// stores that track active loans separately
    pub fn with_current_emis(mut self, total: Decimal) -> Self {
        self.current_emis = total;
        self
    }

    /// Installments the customer already pays each month
    pub fn current_emis(&self) -> Decimal {
        self.current_emis
    }

    /// Decide a request for `loan_amount` at `interest_rate` percent over `tenure` months.
    ///
    /// Policy rejections are returned as results with `approval == false`;
    /// only invalid loan terms produce an error.
    pub fn check_eligibility(&self, loan_amount: Decimal, interest_rate: Decimal, tenure: u32) -> Result<EligibilityResult> {
        let customer_id = self.customer.customer_id;
        let credit_score = self.scorer.calculate(self.customer, self.history);
        let provisional = EmiCalculator::calculate_emi(loan_amount, interest_rate, tenure)?;

        if credit_score <= self.policy.reject_at_or_below {
            debug!("Customer {}: rejected, score {}", customer_id, credit_score);
            return Ok(EligibilityResult::rejected(
                self.policy.rejection_message(RejectionReason::LowCreditScore),
                interest_rate,
                provisional,
                credit_score,
            ));
        }

        let burden = self.current_emis() + provisional;
        let ceiling = self.policy.max_emi_to_salary * self.customer.monthly_salary;
        if burden > ceiling {
            debug!(
                "Customer {}: rejected, EMIs {} exceed {} of salary {}",
                customer_id, burden, self.policy.max_emi_to_salary, self.customer.monthly_salary
            );
            return Ok(EligibilityResult::rejected(
                self.policy.rejection_message(RejectionReason::EmiBurden),
                interest_rate,
                provisional,
                credit_score,
            ));
        }

        let corrected = self.policy.corrected_rate(credit_score, interest_rate);
        let installment = if corrected != interest_rate {
            EmiCalculator::calculate_emi(loan_amount, corrected, tenure)?
        } else {
            provisional
        };

        debug!(
            "Customer {}: approved at {}% (requested {}%), score {}, EMI {}",
            customer_id, corrected, interest_rate, credit_score, installment
        );
        Ok(EligibilityResult::approved(corrected, installment, credit_score))
    }
}

/// Sum of installments on the active loans in `history`
fn active_emi_total(history: &[LoanRecord]) -> Decimal {
    history
        .iter()
        .filter(|l| l.is_active)
        .map(|l| l.monthly_repayment)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn as_of() -> NaiveDate {
        date(2024, 6, 30)
    }

    fn customer(salary: Decimal, limit: Decimal) -> Customer {
        Customer::new(1, "Test", "Customer", 9000000001, salary, limit)
    }

    /// A closed 2019 loan of 50,000 over 12 months with `on_time` EMIs paid on time.
    /// Scores: payment 40*on_time/12 + count 20 + activity 5 + volume 5.
    fn closed_loan(on_time: u32) -> LoanRecord {
        LoanRecord {
            loan_id: 1,
            customer_id: 1,
            loan_amount: dec!(50000),
            tenure: 12,
            interest_rate: dec!(10),
            monthly_repayment: dec!(4395.79),
            emis_paid_on_time: on_time,
            start_date: date(2019, 1, 1),
            end_date: date(2020, 1, 1),
            is_active: false,
        }
    }

    fn active_loan(amount: Decimal, repayment: Decimal) -> LoanRecord {
        LoanRecord {
            loan_id: 2,
            customer_id: 1,
            loan_amount: amount,
            tenure: 24,
            interest_rate: dec!(10),
            monthly_repayment: repayment,
            emis_paid_on_time: 6,
            start_date: date(2023, 12, 1),
            end_date: date(2025, 12, 1),
            is_active: true,
        }
    }

    fn assert_near(actual: Decimal, expected: Decimal) {
        assert!((actual - expected).abs() <= dec!(0.02), "expected ~{}, got {}", expected, actual);
    }

    #[test]
    fn test_new_customer_worked_example() {
        let c = customer(dec!(100000), dec!(3600000));
        let service = EligibilityService::new(&c, &[], as_of());
        let result = service.check_eligibility(dec!(500000), dec!(10), 24).unwrap();

        assert_eq!(result.credit_score, 50);
        assert!(result.approval);
        assert_eq!(result.message, "Loan approved");
        // 50 is not above 50, so the 12% floor applies
        assert_eq!(result.corrected_interest_rate, dec!(12));
        assert_near(result.monthly_installment, dec!(23536.74));
    }

    #[test]
    fn test_low_score_rejected() {
        // Active exposure above the limit forces score 0
        let c = customer(dec!(100000), dec!(100000));
        let history = vec![active_loan(dec!(200000), dec!(9000))];
        let service = EligibilityService::new(&c, &history, as_of());
        let result = service.check_eligibility(dec!(10000), dec!(9), 12).unwrap();

        assert_eq!(result.credit_score, 0);
        assert!(!result.approval);
        assert_eq!(result.message, "Credit score too low. Loan rejected.");
        assert_eq!(result.corrected_interest_rate, dec!(9));
        assert_eq!(
            result.monthly_installment,
            EmiCalculator::calculate_emi(dec!(10000), dec!(9), 12).unwrap()
        );
    }

    #[test]
    fn test_emi_burden_rejected_at_requested_rate() {
        // Score 40 would lift 8% to 12%, but the burden check uses the requested 8%
        let c = customer(dec!(20000), dec!(1000000));
        let history = vec![closed_loan(3)];
        let service = EligibilityService::new(&c, &history, as_of());
        let result = service.check_eligibility(dec!(300000), dec!(8), 24).unwrap();

        assert_eq!(result.credit_score, 40);
        assert!(!result.approval);
        assert_eq!(result.message, "Sum of current EMIs exceeds 50% of monthly salary. Loan rejected.");
        assert_eq!(result.corrected_interest_rate, dec!(8));
        assert_eq!(
            result.monthly_installment,
            EmiCalculator::calculate_emi(dec!(300000), dec!(8), 24).unwrap()
        );
    }

    #[test]
    fn test_existing_emis_count_towards_burden() {
        let c = customer(dec!(40000), dec!(1000000));
        let history = vec![closed_loan(12), active_loan(dec!(200000), dec!(15000))];
        let service = EligibilityService::new(&c, &history, as_of());
        assert_eq!(service.current_emis(), dec!(15000));

        // 15,000 existing + ~5,000 new stays exactly at the 20,000 ceiling
        let at_limit = service.check_eligibility(dec!(60000), Decimal::ZERO, 12).unwrap();
        assert_eq!(at_limit.monthly_installment, dec!(5000));
        assert!(at_limit.approval);

        let over = service.check_eligibility(dec!(60012), Decimal::ZERO, 12).unwrap();
        assert!(!over.approval);
    }

    #[test]
    fn test_near_prime_band_floor() {
        let c = customer(dec!(100000), dec!(1000000));
        let history = vec![closed_loan(3)];
        let service = EligibilityService::new(&c, &history, as_of());

        let low = service.check_eligibility(dec!(100000), dec!(8), 12).unwrap();
        assert_eq!(low.credit_score, 40);
        assert!(low.approval);
        assert_eq!(low.corrected_interest_rate, dec!(12));
        assert_eq!(
            low.monthly_installment,
            EmiCalculator::calculate_emi(dec!(100000), dec!(12), 12).unwrap()
        );

        let high = service.check_eligibility(dec!(100000), dec!(14), 12).unwrap();
        assert_eq!(high.corrected_interest_rate, dec!(14));
        assert_eq!(
            high.monthly_installment,
            EmiCalculator::calculate_emi(dec!(100000), dec!(14), 12).unwrap()
        );
    }

    #[test]
    fn test_subprime_band_floor() {
        let c = customer(dec!(100000), dec!(1000000));
        let history = vec![closed_loan(0)];
        let service = EligibilityService::new(&c, &history, as_of());
        let result = service.check_eligibility(dec!(100000), dec!(11), 12).unwrap();

        assert_eq!(result.credit_score, 30);
        assert!(result.approval);
        assert_eq!(result.corrected_interest_rate, dec!(16));
    }

    #[test]
    fn test_prime_score_keeps_requested_rate() {
        let c = customer(dec!(100000), dec!(1000000));
        let history = vec![closed_loan(12)];
        let service = EligibilityService::new(&c, &history, as_of());
        let result = service.check_eligibility(dec!(100000), dec!(7.5), 12).unwrap();

        assert_eq!(result.credit_score, 70);
        assert!(result.approval);
        assert_eq!(result.corrected_interest_rate, dec!(7.5));
    }

    #[test]
    fn test_corrected_rate_bands() {
        let policy = EligibilityPolicy::default();
        assert_eq!(policy.corrected_rate(51, dec!(8)), dec!(8));
        assert_eq!(policy.corrected_rate(50, dec!(8)), dec!(12));
        assert_eq!(policy.corrected_rate(31, dec!(14)), dec!(14));
        assert_eq!(policy.corrected_rate(30, dec!(8)), dec!(16));
        assert_eq!(policy.corrected_rate(11, dec!(20)), dec!(20));
        assert_eq!(policy.corrected_rate(10, dec!(8)), dec!(8));
    }

    #[test]
    fn test_custom_policy() {
        let c = customer(dec!(100000), dec!(3600000));
        let policy = EligibilityPolicy {
            reject_at_or_below: 60,
            ..Default::default()
        };
        let service = EligibilityService::new(&c, &[], as_of()).with_policy(policy);
        let result = service.check_eligibility(dec!(1000), dec!(10), 6).unwrap();
        assert!(!result.approval);
        assert_eq!(result.message, "Credit score too low. Loan rejected.");
    }

    #[test]
    fn test_burden_message_quotes_configured_ratio() {
        let default = EligibilityPolicy::default();
        assert_eq!(
            default.rejection_message(RejectionReason::EmiBurden),
            "Sum of current EMIs exceeds 50% of monthly salary. Loan rejected."
        );

        let strict = EligibilityPolicy {
            max_emi_to_salary: dec!(0.1),
            ..Default::default()
        };
        let c = customer(dec!(100000), dec!(3600000));
        let service = EligibilityService::new(&c, &[], as_of()).with_policy(strict);
        let result = service.check_eligibility(dec!(500000), dec!(10), 24).unwrap();
        assert!(!result.approval);
        assert_eq!(result.message, "Sum of current EMIs exceeds 10% of monthly salary. Loan rejected.");
    }

    #[test]
    fn test_current_emis_override() {
        let c = customer(dec!(40000), dec!(1000000));
        let history = vec![closed_loan(12)];
        let service = EligibilityService::new(&c, &history, as_of());
        assert_eq!(service.current_emis(), Decimal::ZERO);
        assert!(service.check_eligibility(dec!(60000), Decimal::ZERO, 12).unwrap().approval);

        // 18,000 tracked elsewhere leaves no room for a 5,000 installment
        let service = service.with_current_emis(dec!(18000));
        let result = service.check_eligibility(dec!(60000), Decimal::ZERO, 12).unwrap();
        assert!(!result.approval);
        assert_eq!(result.corrected_interest_rate, Decimal::ZERO);
    }

    #[test]
    fn test_invalid_terms_are_errors() {
        let c = customer(dec!(100000), dec!(3600000));
        let service = EligibilityService::new(&c, &[], as_of());
        assert!(service.check_eligibility(dec!(1000), dec!(10), 0).is_err());
        assert!(service.check_eligibility(dec!(-1000), dec!(10), 12).is_err());
    }
}
