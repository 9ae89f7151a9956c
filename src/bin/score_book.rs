//! Score every customer in the book and write the breakdowns to CSV
//!
//! Usage: cargo run --release --bin score_book [output.csv]
//! Reads LENDING_DATA_DIR and LENDING_REFERENCE_DATE like the main CLI.

use anyhow::{Context, Result};
use lending_engine::runner::{ScoreSummary, ScoringRunner};
use lending_engine::{EngineConfig, LoanBook};
use std::env;
use std::time::Instant;

#[derive(serde::Serialize)]
struct OutputRow {
    customer_id: u32,
    loans: usize,
    payment_history: String,
    loan_count: String,
    current_year_activity: String,
    loan_volume: String,
    limit_breached: bool,
    score: u8,
}

fn main() -> Result<()> {
    env_logger::init();

    let start = Instant::now();
    let output_path = env::args().nth(1).unwrap_or_else(|| "credit_scores.csv".to_string());
    let config = EngineConfig::from_env();

    println!("Loading loan book from {}...", config.data_dir.display());
    let book = LoanBook::load(&config).context("loading loan book")?;
    println!(
        "Loaded {} customers and {} loans in {:?}",
        book.customer_count(),
        book.loan_count(),
        start.elapsed()
    );

    println!("Scoring as of {}...", config.reference_date);
    let scores = ScoringRunner::new(config.reference_date).run(&book);

    let mut writer = csv::Writer::from_path(&output_path)
        .with_context(|| format!("creating {}", output_path))?;
    for s in &scores {
        let b = &s.breakdown;
        writer.serialize(OutputRow {
            customer_id: s.customer_id,
            loans: s.loan_count,
            payment_history: b.payment_history.round_dp(2).to_string(),
            loan_count: b.loan_count.to_string(),
            current_year_activity: b.current_year_activity.to_string(),
            loan_volume: b.loan_volume.to_string(),
            limit_breached: b.limit_breached,
            score: b.score,
        })?;
    }
    writer.flush()?;
    println!("Output written to {}", output_path);

    let summary = ScoreSummary::from_scores(&scores);
    println!("\nBook Summary:");
    println!("  Customers:       {}", summary.customers);
    println!("  Mean score:      {:.2}", summary.mean_score);
    println!("  Min / Max:       {} / {}", summary.min_score, summary.max_score);
    println!("  Limit breaches:  {}", summary.limit_breaches);
    println!("  Without history: {}", summary.without_history);

    println!("\nTotal time: {:?}", start.elapsed());
    Ok(())
}
