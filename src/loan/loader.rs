//! Load loans from loan_data.csv

use super::LoanRecord;
use crate::customer::loader::parse_amount;
use crate::error::{LendingError, Result};
use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim, Writer};
use log::{debug, info};
use std::io::{Read, Write};
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw CSV row matching the loan extract columns
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "Customer ID")]
    customer_id: Option<u32>,
    #[serde(rename = "Loan ID")]
    loan_id: Option<u32>,
    #[serde(rename = "Loan Amount")]
    loan_amount: String,
    #[serde(rename = "Tenure")]
    tenure: Option<u32>,
    #[serde(rename = "Interest Rate")]
    interest_rate: String,
    #[serde(rename = "Monthly payment")]
    monthly_payment: String,
    #[serde(rename = "EMIs paid on Time")]
    emis_paid_on_time: Option<u32>,
    #[serde(rename = "Date of Approval")]
    date_of_approval: String,
    #[serde(rename = "End Date")]
    end_date: String,
    /// Extracts without this column describe the open book
    #[serde(rename = "Active", default)]
    active: Option<bool>,
}

/// Output row with the same columns the loader reads, plus `Active`
#[derive(Debug, serde::Serialize)]
struct OutputRow {
    #[serde(rename = "Customer ID")]
    customer_id: u32,
    #[serde(rename = "Loan ID")]
    loan_id: u32,
    #[serde(rename = "Loan Amount")]
    loan_amount: String,
    #[serde(rename = "Tenure")]
    tenure: u32,
    #[serde(rename = "Interest Rate")]
    interest_rate: String,
    #[serde(rename = "Monthly payment")]
    monthly_payment: String,
    #[serde(rename = "EMIs paid on Time")]
    emis_paid_on_time: u32,
    #[serde(rename = "Date of Approval")]
    date_of_approval: String,
    #[serde(rename = "End Date")]
    end_date: String,
    #[serde(rename = "Active")]
    active: bool,
}

impl From<&LoanRecord> for OutputRow {
    fn from(loan: &LoanRecord) -> Self {
        Self {
            customer_id: loan.customer_id,
            loan_id: loan.loan_id,
            loan_amount: loan.loan_amount.to_string(),
            tenure: loan.tenure,
            interest_rate: loan.interest_rate.to_string(),
            monthly_payment: loan.monthly_repayment.to_string(),
            emis_paid_on_time: loan.emis_paid_on_time,
            date_of_approval: loan.start_date.format(DATE_FORMAT).to_string(),
            end_date: loan.end_date.format(DATE_FORMAT).to_string(),
            active: loan.is_active,
        }
    }
}

fn parse_date(raw: &str, column: &str, row: usize) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|e| LendingError::Parse {
        row,
        message: format!("{} '{}': {}", column, raw, e),
    })
}

fn required<T>(value: Option<T>, column: &str, row: usize) -> Result<T> {
    value.ok_or_else(|| LendingError::Parse {
        row,
        message: format!("{} is empty", column),
    })
}

impl CsvRow {
    fn to_loan(self, customer_id: u32, row: usize) -> Result<LoanRecord> {
        let loan = LoanRecord {
            loan_id: required(self.loan_id, "Loan ID", row)?,
            customer_id,
            loan_amount: parse_amount(&self.loan_amount, "Loan Amount", row)?,
            tenure: required(self.tenure, "Tenure", row)?,
            interest_rate: parse_amount(&self.interest_rate, "Interest Rate", row)?,
            monthly_repayment: parse_amount(&self.monthly_payment, "Monthly payment", row)?,
            emis_paid_on_time: required(self.emis_paid_on_time, "EMIs paid on Time", row)?,
            start_date: parse_date(&self.date_of_approval, "Date of Approval", row)?,
            end_date: parse_date(&self.end_date, "End Date", row)?,
            is_active: self.active.unwrap_or(true),
        };
        loan.validate()?;
        Ok(loan)
    }
}

/// Load all loans from a CSV file
pub fn load_loans<P: AsRef<Path>>(path: P) -> Result<Vec<LoanRecord>> {
    let path = path.as_ref();
    info!("Loading loans from {}", path.display());
    let file = std::fs::File::open(path)?;
    load_loans_from_reader(file)
}

/// Load loans from any reader (e.g., string buffer, network stream).
/// Rows without a customer id are skipped.
pub fn load_loans_from_reader<R: Read>(reader: R) -> Result<Vec<LoanRecord>> {
    let mut csv_reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut loans = Vec::new();

    for (index, result) in csv_reader.deserialize().enumerate() {
        let row_number = index + 2;
        let row: CsvRow = result?;
        let Some(customer_id) = row.customer_id else {
            debug!("Skipping loan row {} without a customer id", row_number);
            continue;
        };
        loans.push(row.to_loan(customer_id, row_number)?);
    }

    info!("Loaded {} loans", loans.len());
    Ok(loans)
}

/// Write loans to a CSV file, replacing its contents
pub fn save_loans<'a, P, I>(path: P, loans: I) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = &'a LoanRecord>,
{
    let path = path.as_ref();
    let count = write_loans_to_writer(std::fs::File::create(path)?, loans)?;
    info!("Wrote {} loans to {}", count, path.display());
    Ok(())
}

/// Write loans in the extract layout to any writer
pub fn write_loans_to_writer<'a, W, I>(writer: W, loans: I) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a LoanRecord>,
{
    let mut csv_writer = Writer::from_writer(writer);
    let mut count = 0;
    for loan in loans {
        csv_writer.serialize(OutputRow::from(loan))?;
        count += 1;
    }
    csv_writer.flush()?;
    Ok(count)
}
