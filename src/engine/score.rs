//! Credit score (0-100) from a customer's loan history
//!
//! The score is a sum of independent factor contributions:
//!
//! | Factor                 | Max |
//! |------------------------|-----|
//! | Payment history        | 40  |
//! | Number of loans        | 20  |
//! | Current-year activity  | 20  |
//! | Total loan volume      | 20  |
//!
//! Active exposure above the approved limit overrides the sum with zero.
//! A customer with no history at all gets a neutral 50.

use crate::customer::Customer;
use crate::loan::LoanRecord;
use chrono::{Datelike, NaiveDate};
use log::debug;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Score for customers without any loan history
pub const NEUTRAL_SCORE: u8 = 50;

pub const MIN_SCORE: Decimal = dec!(0);
pub const MAX_SCORE: Decimal = dec!(100);

/// Weight of the on-time payment ratio
const PAYMENT_HISTORY_WEIGHT: Decimal = dec!(40);

/// Loan count tiers: (maximum count, points); above the last tier earns the floor
const LOAN_COUNT_TIERS: [(usize, Decimal); 3] = [(2, dec!(20)), (5, dec!(15)), (10, dec!(10))];
const LOAN_COUNT_FLOOR: Decimal = dec!(5);

/// Volume tiers: (minimum total, points), checked from the top
const VOLUME_TIERS: [(Decimal, Decimal); 3] = [
    (dec!(1000000), dec!(20)),
    (dec!(500000), dec!(15)),
    (dec!(100000), dec!(10)),
];
const VOLUME_FLOOR: Decimal = dec!(5);

/// Up to this many active current-year loans earns full activity points
const HEALTHY_ACTIVE_LOANS: usize = 3;
const ACTIVITY_HEALTHY: Decimal = dec!(20);
const ACTIVITY_BUSY: Decimal = dec!(10);
const ACTIVITY_DORMANT: Decimal = dec!(5);

/// Per-factor contributions behind a score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Final score after override, clamping, and rounding
    pub score: u8,

    /// True when the customer had no loans and the neutral score was used
    pub no_history: bool,

    pub payment_history: Decimal,
    pub loan_count: Decimal,
    pub current_year_activity: Decimal,
    pub loan_volume: Decimal,

    /// Active exposure exceeded the approved limit, forcing the score to zero
    pub limit_breached: bool,
}

impl ScoreBreakdown {
    fn neutral() -> Self {
        Self {
            score: NEUTRAL_SCORE,
            no_history: true,
            payment_history: Decimal::ZERO,
            loan_count: Decimal::ZERO,
            current_year_activity: Decimal::ZERO,
            loan_volume: Decimal::ZERO,
            limit_breached: false,
        }
    }

    /// Sum of the factor contributions before override and clamping
    pub fn raw_total(&self) -> Decimal {
        self.payment_history + self.loan_count + self.current_year_activity + self.loan_volume
    }
}

/// Scores customers as of a fixed reference date.
///
/// The reference date decides which loans count as current-year activity, so
/// two calculators with dates in different years can disagree on the same
/// history.
#[derive(Debug, Clone, Copy)]
pub struct CreditScoreCalculator {
    reference_date: NaiveDate,
}

impl CreditScoreCalculator {
    pub fn new(reference_date: NaiveDate) -> Self {
        Self { reference_date }
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    /// Credit score in [0, 100] for a customer given all of their loans
    pub fn calculate(&self, customer: &Customer, history: &[LoanRecord]) -> u8 {
        self.breakdown(customer, history).score
    }

    /// Credit score with the contribution of each factor
    pub fn breakdown(&self, customer: &Customer, history: &[LoanRecord]) -> ScoreBreakdown {
        if history.is_empty() {
            debug!("Customer {}: no loan history, neutral score", customer.customer_id);
            return ScoreBreakdown::neutral();
        }

        let mut breakdown = ScoreBreakdown {
            score: 0,
            no_history: false,
            payment_history: payment_history_points(history),
            loan_count: loan_count_points(history.len()),
            current_year_activity: current_year_points(history, self.reference_date.year()),
            loan_volume: loan_volume_points(history),
            limit_breached: exceeds_approved_limit(customer, history),
        };

        let raw = if breakdown.limit_breached {
            Decimal::ZERO
        } else {
            breakdown.raw_total()
        };
        breakdown.score = finalize(raw);

        debug!(
            "Customer {}: payment={} count={} activity={} volume={} breached={} -> {}",
            customer.customer_id,
            breakdown.payment_history,
            breakdown.loan_count,
            breakdown.current_year_activity,
            breakdown.loan_volume,
            breakdown.limit_breached,
            breakdown.score,
        );

        breakdown
    }
}

/// Clamp into [0, 100] and round to the nearest integer (ties to even)
fn finalize(raw: Decimal) -> u8 {
    raw.clamp(MIN_SCORE, MAX_SCORE)
        .round()
        .to_u8()
        .unwrap_or_default()
}

/// Up to 40 points for the share of all scheduled EMIs that were paid on time
pub fn payment_history_points(history: &[LoanRecord]) -> Decimal {
    let total_emis: u64 = history.iter().map(|l| l.tenure as u64).sum();
    let on_time_emis: u64 = history.iter().map(|l| l.emis_paid_on_time as u64).sum();

    if total_emis == 0 {
        return Decimal::ZERO;
    }
    PAYMENT_HISTORY_WEIGHT * Decimal::from(on_time_emis) / Decimal::from(total_emis)
}

/// Fewer loans score higher: <=2: 20, <=5: 15, <=10: 10, else 5
pub fn loan_count_points(loan_count: usize) -> Decimal {
    LOAN_COUNT_TIERS
        .iter()
        .find(|(max, _)| loan_count <= *max)
        .map(|(_, points)| *points)
        .unwrap_or(LOAN_COUNT_FLOOR)
}

/// Activity among loans that started or ended in `year`.
///
/// No such loans: 5. One to three of them active: 20. More than three: 10.
/// Current-year loans that are all closed earn nothing.
pub fn current_year_points(history: &[LoanRecord], year: i32) -> Decimal {
    let mut current_year = history.iter().filter(|l| l.touches_year(year)).peekable();
    if current_year.peek().is_none() {
        return ACTIVITY_DORMANT;
    }

    match current_year.filter(|l| l.is_active).count() {
        0 => Decimal::ZERO,
        n if n <= HEALTHY_ACTIVE_LOANS => ACTIVITY_HEALTHY,
        _ => ACTIVITY_BUSY,
    }
}

/// Larger lifetime borrowing scores higher: >=10L: 20, >=5L: 15, >=1L: 10, else 5
pub fn loan_volume_points(history: &[LoanRecord]) -> Decimal {
    let total: Decimal = history.iter().map(|l| l.loan_amount).sum();
    VOLUME_TIERS
        .iter()
        .find(|(min, _)| total >= *min)
        .map(|(_, points)| *points)
        .unwrap_or(VOLUME_FLOOR)
}

/// Whether the principal of active loans is above the customer's approved limit
pub fn exceeds_approved_limit(customer: &Customer, history: &[LoanRecord]) -> bool {
    let active_exposure: Decimal = history
        .iter()
        .filter(|l| l.is_active)
        .map(|l| l.loan_amount)
        .sum();
    active_exposure > customer.approved_limit
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn customer(limit: Decimal) -> Customer {
        Customer::new(1, "Test", "Customer", 9000000001, dec!(100000), limit)
    }

    fn loan(id: u32, amount: Decimal, tenure: u32, on_time: u32, start: NaiveDate, end: NaiveDate, active: bool) -> LoanRecord {
        LoanRecord {
            loan_id: id,
            customer_id: 1,
            loan_amount: amount,
            tenure,
            interest_rate: dec!(10),
            monthly_repayment: dec!(1000),
            emis_paid_on_time: on_time,
            start_date: start,
            end_date: end,
            is_active: active,
        }
    }

    fn closed_loan(id: u32, amount: Decimal) -> LoanRecord {
        loan(id, amount, 12, 12, date(2018, 1, 1), date(2019, 1, 1), false)
    }

    fn as_of() -> NaiveDate {
        date(2024, 6, 30)
    }

    #[test]
    fn test_no_history_is_neutral() {
        let calc = CreditScoreCalculator::new(as_of());
        // Even with a zero limit the override does not apply
        let breakdown = calc.breakdown(&customer(Decimal::ZERO), &[]);
        assert_eq!(breakdown.score, 50);
        assert!(breakdown.no_history);
        assert!(!breakdown.limit_breached);
    }

    #[test]
    fn test_payment_history_ratio() {
        let history = vec![
            loan(1, dec!(1000), 10, 10, date(2018, 1, 1), date(2018, 11, 1), false),
            loan(2, dec!(1000), 30, 10, date(2019, 1, 1), date(2021, 7, 1), false),
        ];
        // 20 of 40 on time -> 20 points
        assert_eq!(payment_history_points(&history), dec!(20));
    }

    #[test]
    fn test_loan_count_tiers() {
        assert_eq!(loan_count_points(1), dec!(20));
        assert_eq!(loan_count_points(2), dec!(20));
        assert_eq!(loan_count_points(3), dec!(15));
        assert_eq!(loan_count_points(5), dec!(15));
        assert_eq!(loan_count_points(6), dec!(10));
        assert_eq!(loan_count_points(10), dec!(10));
        assert_eq!(loan_count_points(11), dec!(5));
    }

    #[test]
    fn test_loan_volume_tiers() {
        assert_eq!(loan_volume_points(&[closed_loan(1, dec!(99999.99))]), dec!(5));
        assert_eq!(loan_volume_points(&[closed_loan(1, dec!(100000))]), dec!(10));
        assert_eq!(loan_volume_points(&[closed_loan(1, dec!(300000)), closed_loan(2, dec!(200000))]), dec!(15));
        assert_eq!(loan_volume_points(&[closed_loan(1, dec!(1000000))]), dec!(20));
    }

    #[test]
    fn test_current_year_activity() {
        let year = 2024;
        let active_now = |id| loan(id, dec!(1000), 12, 0, date(2024, 2, 1), date(2025, 2, 1), true);

        // Nothing touching 2024
        assert_eq!(current_year_points(&[closed_loan(1, dec!(1000))], year), dec!(5));

        // 1..=3 active
        assert_eq!(current_year_points(&[active_now(1)], year), dec!(20));
        let three: Vec<_> = (1..=3).map(active_now).collect();
        assert_eq!(current_year_points(&three, year), dec!(20));

        // More than 3 active
        let four: Vec<_> = (1..=4).map(active_now).collect();
        assert_eq!(current_year_points(&four, year), dec!(10));

        // Ended this year but closed: current-year loans exist, none active
        let ended = loan(9, dec!(1000), 12, 12, date(2023, 3, 1), date(2024, 3, 1), false);
        assert_eq!(current_year_points(&[ended], year), Decimal::ZERO);
    }

    #[test]
    fn test_active_loans_outside_year_do_not_count_as_activity() {
        // Active, but neither starts nor ends in 2024
        let long = loan(1, dec!(1000), 60, 30, date(2021, 1, 1), date(2026, 1, 1), true);
        assert_eq!(current_year_points(&[long], 2024), dec!(5));
    }

    #[test]
    fn test_full_score_composition() {
        let history = vec![
            loan(1, dec!(600000), 24, 24, date(2021, 1, 1), date(2023, 1, 1), false),
            loan(2, dec!(500000), 12, 6, date(2024, 1, 10), date(2025, 1, 10), true),
        ];
        let calc = CreditScoreCalculator::new(as_of());
        let breakdown = calc.breakdown(&customer(dec!(1000000)), &history);

        // 30/36 on time -> 33.33; 2 loans -> 20; one active 2024 loan -> 20; 11L volume -> 20
        assert_eq!(breakdown.payment_history.round_dp(2), dec!(33.33));
        assert_eq!(breakdown.loan_count, dec!(20));
        assert_eq!(breakdown.current_year_activity, dec!(20));
        assert_eq!(breakdown.loan_volume, dec!(20));
        assert!(!breakdown.limit_breached);
        assert_eq!(breakdown.score, 93);
    }

    #[test]
    fn test_limit_breach_forces_zero() {
        let history = vec![
            loan(1, dec!(900000), 12, 12, date(2024, 1, 1), date(2025, 1, 1), true),
            loan(2, dec!(200000), 12, 12, date(2024, 2, 1), date(2025, 2, 1), true),
        ];
        let calc = CreditScoreCalculator::new(as_of());
        let breakdown = calc.breakdown(&customer(dec!(1000000)), &history);
        assert!(breakdown.limit_breached);
        assert!(breakdown.raw_total() > Decimal::ZERO);
        assert_eq!(breakdown.score, 0);
    }

    #[test]
    fn test_closed_loans_do_not_breach_limit() {
        let history = vec![closed_loan(1, dec!(5000000))];
        assert!(!exceeds_approved_limit(&customer(dec!(100000)), &history));
    }

    #[test]
    fn test_exposure_equal_to_limit_is_allowed() {
        let history = vec![loan(1, dec!(100000), 12, 0, date(2024, 1, 1), date(2025, 1, 1), true)];
        assert!(!exceeds_approved_limit(&customer(dec!(100000)), &history));
    }

    #[test]
    fn test_score_stays_in_range() {
        let calc = CreditScoreCalculator::new(as_of());
        let histories: Vec<Vec<LoanRecord>> = vec![
            (1..=15).map(|i| closed_loan(i, dec!(1))).collect(),
            (1..=3)
                .map(|i| loan(i, dec!(400000), 12, 12, date(2024, 1, 1), date(2025, 1, 1), true))
                .collect(),
            vec![loan(1, dec!(10), 600, 0, date(2010, 1, 1), date(2060, 1, 1), false)],
        ];
        for history in &histories {
            let score = calc.calculate(&customer(dec!(10000000)), history);
            assert!(score <= 100);
        }
    }

    #[test]
    fn test_reference_year_changes_activity() {
        let history = vec![loan(1, dec!(50000), 12, 12, date(2023, 5, 1), date(2024, 5, 1), true)];
        let c = customer(dec!(1000000));

        let in_2024 = CreditScoreCalculator::new(date(2024, 12, 31)).breakdown(&c, &history);
        let in_2026 = CreditScoreCalculator::new(date(2026, 1, 1)).breakdown(&c, &history);
        assert_eq!(in_2024.current_year_activity, dec!(20));
        assert_eq!(in_2026.current_year_activity, dec!(5));
        assert_eq!(in_2024.score - in_2026.score, 15);
    }

    #[test]
    fn test_rounding_ties_to_even() {
        assert_eq!(finalize(dec!(50.5)), 50);
        assert_eq!(finalize(dec!(51.5)), 52);
        assert_eq!(finalize(dec!(72.4)), 72);
        assert_eq!(finalize(dec!(-3)), 0);
        assert_eq!(finalize(dec!(140)), 100);
    }
}
