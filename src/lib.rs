//! Lending Engine - credit scoring and loan eligibility for a consumer lending book
//!
//! This library provides:
//! - Monthly installment (EMI) pricing
//! - Credit scores (0-100) from a customer's loan history
//! - Eligibility decisions with affordability checks and rate correction
//! - An in-memory loan book loaded from CSV extracts, with loan booking
//! - Parallel batch scoring across the book

pub mod error;
pub mod config;
pub mod customer;
pub mod loan;
pub mod engine;
pub mod book;
pub mod runner;

// Re-export commonly used types
pub use error::{LendingError, Result};
pub use config::EngineConfig;
pub use customer::Customer;
pub use loan::LoanRecord;
pub use engine::{CreditScoreCalculator, EligibilityService, EligibilityResult, EmiCalculator};
pub use book::{LoanBook, LoanStore};
pub use runner::{ScoringRunner, ScoreSummary};
