//! Lending Engine CLI
//!
//! Score customers, check eligibility for a loan request, and book loans
//! against the customer and loan extracts in the data directory. `book` and
//! `register` write both extracts back when they change the book.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use lending_engine::book::{LoanBook, LoanStore};
use lending_engine::runner::{ScoreSummary, ScoringRunner};
use lending_engine::{EmiCalculator, EngineConfig};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "lending", about = "Credit scoring and loan eligibility for the lending book", version)]
struct Cli {
    /// Directory holding customer_data.csv and loan_data.csv (overrides LENDING_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<String>,

    /// Reference date as YYYY-MM-DD (overrides LENDING_REFERENCE_DATE, defaults to today)
    #[arg(long, global = true)]
    as_of: Option<NaiveDate>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Credit score of one customer, or of the whole book
    Score {
        /// Customer to score; omit to score everyone
        #[arg(long)]
        customer_id: Option<u32>,
    },
    /// Check eligibility for a loan request without booking it
    Check(RequestArgs),
    /// Check eligibility and book the loan if approved
    Book(RequestArgs),
    /// Register a new customer with a salary-derived approved limit
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        age: Option<u8>,
        #[arg(long)]
        phone_number: u64,
        /// Gross monthly salary
        #[arg(long)]
        monthly_salary: Decimal,
    },
    /// List the active loans of a customer
    Loans {
        #[arg(long)]
        customer_id: u32,
    },
    /// Show a single loan and its borrower
    Loan {
        #[arg(long)]
        loan_id: u32,
    },
}

#[derive(Args, Debug)]
struct RequestArgs {
    #[arg(long)]
    customer_id: u32,

    /// Principal requested
    #[arg(long)]
    amount: Decimal,

    /// Annual interest rate in percent
    #[arg(long)]
    rate: Decimal,

    /// Tenure in months
    #[arg(long)]
    tenure: u32,
}

fn emit<T: Serialize + std::fmt::Debug>(value: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{:#?}", value);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    let mut config = EngineConfig::from_env();
    if let Some(dir) = &cli.data_dir {
        config = config.with_data_dir(dir);
    }
    if let Some(date) = cli.as_of {
        config = config.as_of(date);
    }

    let mut book = LoanBook::load(&config)
        .with_context(|| format!("loading loan book from {}", config.data_dir.display()))?;
    let as_of = config.reference_date;

    match cli.command {
        Command::Score { customer_id: Some(id) } => {
            let breakdown = book.score(id, as_of)?;
            if cli.json {
                emit(&breakdown, true)?;
            } else {
                println!("Customer {} credit score as of {}: {}", id, as_of, breakdown.score);
                println!("  Payment history:       {:.2}", breakdown.payment_history);
                println!("  Loan count:            {}", breakdown.loan_count);
                println!("  Current-year activity: {}", breakdown.current_year_activity);
                println!("  Loan volume:           {}", breakdown.loan_volume);
                if breakdown.limit_breached {
                    println!("  Active loans exceed the approved limit: score forced to 0");
                }
                if breakdown.no_history {
                    println!("  No loan history: neutral score");
                }
            }
        }
        Command::Score { customer_id: None } => {
            let scores = ScoringRunner::new(as_of).run(&book);
            let summary = ScoreSummary::from_scores(&scores);
            if cli.json {
                emit(&scores, true)?;
            } else {
                println!("{:>8} {:>6} {:>6}", "Customer", "Loans", "Score");
                println!("{}", "-".repeat(22));
                for s in &scores {
                    println!("{:>8} {:>6} {:>6}", s.customer_id, s.loan_count, s.breakdown.score);
                }
                println!("\nSummary:");
                println!("  Customers:       {}", summary.customers);
                println!("  Mean score:      {:.2}", summary.mean_score);
                println!("  Range:           {} - {}", summary.min_score, summary.max_score);
                println!("  Limit breaches:  {}", summary.limit_breaches);
                println!("  Without history: {}", summary.without_history);
            }
        }
        Command::Check(req) => {
            let result = book.check_eligibility(req.customer_id, req.amount, req.rate, req.tenure, as_of)?;
            if cli.json {
                emit(&result, true)?;
            } else {
                println!("Customer {}: {}", req.customer_id, result.message);
                println!("  Credit score:      {}", result.credit_score);
                println!("  Requested rate:    {}%", req.rate);
                println!("  Corrected rate:    {}%", result.corrected_interest_rate);
                println!("  Tenure:            {} months", req.tenure);
                println!("  Monthly installment: {}", result.monthly_installment);
                if result.approval {
                    let interest =
                        EmiCalculator::total_interest(req.amount, result.corrected_interest_rate, req.tenure)?;
                    println!("  Total interest:    {}", interest);
                }
            }
        }
        Command::Book(req) => {
            let outcome = book.book_loan(req.customer_id, req.amount, req.rate, req.tenure, as_of)?;
            if outcome.loan_approved {
                book.save(&config)
                    .with_context(|| format!("saving loan book to {}", config.data_dir.display()))?;
            }
            emit(&outcome, cli.json)?;
        }
        Command::Register {
            first_name,
            last_name,
            age,
            phone_number,
            monthly_salary,
        } => {
            let customer = book
                .register_customer(&first_name, &last_name, age, phone_number, monthly_salary)?
                .clone();
            book.save(&config)
                .with_context(|| format!("saving loan book to {}", config.data_dir.display()))?;
            if cli.json {
                emit(&customer, true)?;
            } else {
                println!("Registered customer {}: {}", customer.customer_id, customer.full_name());
                println!("  Monthly salary: {}", customer.monthly_salary);
                println!("  Approved limit: {}", customer.approved_limit);
            }
        }
        Command::Loans { customer_id } => {
            let loans = book.active_loans_of(customer_id)?;
            emit(&loans, cli.json)?;
        }
        Command::Loan { loan_id } => {
            let detail = book.loan(loan_id)?;
            emit(&detail, cli.json)?;
        }
    }

    Ok(())
}
