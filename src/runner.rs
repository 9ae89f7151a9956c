//! Batch scoring across the whole book
//!
//! Scores are independent per customer, so the book is scored in parallel
//! against one shared reference date.

use crate::book::{LoanBook, LoanStore};
use crate::engine::{CreditScoreCalculator, ScoreBreakdown};
use chrono::NaiveDate;
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Score of one customer in a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerScore {
    pub customer_id: u32,
    pub loan_count: usize,
    pub breakdown: ScoreBreakdown,
}

/// Distribution of scores across a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub customers: usize,
    pub mean_score: f64,
    pub min_score: u8,
    pub max_score: u8,
    /// Customers whose active exposure exceeded their approved limit
    pub limit_breaches: usize,
    /// Customers scored neutrally for lack of history
    pub without_history: usize,
}

impl ScoreSummary {
    pub fn from_scores(scores: &[CustomerScore]) -> Self {
        if scores.is_empty() {
            return Self {
                customers: 0,
                mean_score: 0.0,
                min_score: 0,
                max_score: 0,
                limit_breaches: 0,
                without_history: 0,
            };
        }

        let total: u64 = scores.iter().map(|s| s.breakdown.score as u64).sum();
        Self {
            customers: scores.len(),
            mean_score: total as f64 / scores.len() as f64,
            min_score: scores.iter().map(|s| s.breakdown.score).min().unwrap_or(0),
            max_score: scores.iter().map(|s| s.breakdown.score).max().unwrap_or(0),
            limit_breaches: scores.iter().filter(|s| s.breakdown.limit_breached).count(),
            without_history: scores.iter().filter(|s| s.breakdown.no_history).count(),
        }
    }
}

/// Scores every customer of a book as of a fixed date
///
/// # Example
/// ```ignore
/// let book = LoanBook::load(&config)?;
/// let runner = ScoringRunner::new(config.reference_date);
/// let scores = runner.run(&book);
/// println!("{:?}", ScoreSummary::from_scores(&scores));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ScoringRunner {
    calculator: CreditScoreCalculator,
}

impl ScoringRunner {
    pub fn new(reference_date: NaiveDate) -> Self {
        Self {
            calculator: CreditScoreCalculator::new(reference_date),
        }
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.calculator.reference_date()
    }

    /// Score all customers in parallel, ordered by customer id
    pub fn run(&self, book: &LoanBook) -> Vec<CustomerScore> {
        let start = Instant::now();
        let customers: Vec<_> = book.customers().collect();

        let scores: Vec<CustomerScore> = customers
            .par_iter()
            .map(|customer| {
                let history = book.get_loan_history(customer);
                CustomerScore {
                    customer_id: customer.customer_id,
                    loan_count: history.len(),
                    breakdown: self.calculator.breakdown(customer, history),
                }
            })
            .collect();

        info!(
            "Scored {} customers as of {} in {:?}",
            scores.len(),
            self.reference_date(),
            start.elapsed()
        );
        scores
    }
}
