//! Decision engine: installment pricing, credit scoring, and eligibility

mod emi;
mod score;
mod eligibility;

pub use emi::EmiCalculator;
pub use score::{
    CreditScoreCalculator, ScoreBreakdown, NEUTRAL_SCORE,
    payment_history_points, loan_count_points, current_year_points,
    loan_volume_points, exceeds_approved_limit,
};
pub use eligibility::{
    EligibilityService, EligibilityPolicy, EligibilityResult, RejectionReason,
    APPROVED_MESSAGE,
};
