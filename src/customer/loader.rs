//! Load customers from customer_data.csv

use super::Customer;
use crate::error::{LendingError, Result};
use csv::{ReaderBuilder, Trim, Writer};
use log::{debug, info};
use rust_decimal::Decimal;
use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;

/// Raw CSV row matching the customer extract columns
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "Customer ID")]
    customer_id: Option<u32>,
    #[serde(rename = "First Name")]
    first_name: String,
    #[serde(rename = "Last Name")]
    last_name: String,
    #[serde(rename = "Age", default)]
    age: Option<u8>,
    #[serde(rename = "Phone Number")]
    phone_number: Option<u64>,
    #[serde(rename = "Monthly Salary")]
    monthly_salary: String,
    #[serde(rename = "Approved Limit")]
    approved_limit: String,
    #[serde(rename = "Current Debt", default)]
    current_debt: Option<String>,
}

/// Output row with the same columns the loader reads
#[derive(Debug, serde::Serialize)]
struct OutputRow<'a> {
    #[serde(rename = "Customer ID")]
    customer_id: u32,
    #[serde(rename = "First Name")]
    first_name: &'a str,
    #[serde(rename = "Last Name")]
    last_name: &'a str,
    #[serde(rename = "Age")]
    age: Option<u8>,
    #[serde(rename = "Phone Number")]
    phone_number: u64,
    #[serde(rename = "Monthly Salary")]
    monthly_salary: String,
    #[serde(rename = "Approved Limit")]
    approved_limit: String,
    #[serde(rename = "Current Debt")]
    current_debt: String,
}

impl<'a> From<&'a Customer> for OutputRow<'a> {
    fn from(customer: &'a Customer) -> Self {
        Self {
            customer_id: customer.customer_id,
            first_name: &customer.first_name,
            last_name: &customer.last_name,
            age: customer.age,
            phone_number: customer.phone_number,
            monthly_salary: customer.monthly_salary.to_string(),
            approved_limit: customer.approved_limit.to_string(),
            current_debt: customer.current_debt.to_string(),
        }
    }
}

/// Parse a currency column, reporting the 1-based file row on failure
pub(crate) fn parse_amount(raw: &str, column: &str, row: usize) -> Result<Decimal> {
    Decimal::from_str(raw.trim()).map_err(|e| LendingError::Parse {
        row,
        message: format!("{} '{}': {}", column, raw, e),
    })
}

impl CsvRow {
    fn to_customer(self, customer_id: u32, row: usize) -> Result<Customer> {
        let current_debt = match self.current_debt.as_deref().map(str::trim) {
            None | Some("") => Decimal::ZERO,
            Some(raw) => parse_amount(raw, "Current Debt", row)?,
        };

        let customer = Customer {
            customer_id,
            first_name: self.first_name,
            last_name: self.last_name,
            age: self.age,
            phone_number: self.phone_number.ok_or_else(|| LendingError::Parse {
                row,
                message: "Phone Number is empty".to_string(),
            })?,
            monthly_salary: parse_amount(&self.monthly_salary, "Monthly Salary", row)?,
            approved_limit: parse_amount(&self.approved_limit, "Approved Limit", row)?,
            current_debt,
        };
        customer.validate()?;
        Ok(customer)
    }
}

/// Load all customers from a CSV file
pub fn load_customers<P: AsRef<Path>>(path: P) -> Result<Vec<Customer>> {
    let path = path.as_ref();
    info!("Loading customers from {}", path.display());
    let file = std::fs::File::open(path)?;
    load_customers_from_reader(file)
}

/// Load customers from any reader (e.g., string buffer, network stream).
/// Rows without a customer id are skipped.
pub fn load_customers_from_reader<R: Read>(reader: R) -> Result<Vec<Customer>> {
    let mut csv_reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut customers = Vec::new();

    for (index, result) in csv_reader.deserialize().enumerate() {
        let row_number = index + 2;
        let row: CsvRow = result?;
        let Some(customer_id) = row.customer_id else {
            debug!("Skipping customer row {} without an id", row_number);
            continue;
        };
        customers.push(row.to_customer(customer_id, row_number)?);
    }

    info!("Loaded {} customers", customers.len());
    Ok(customers)
}

/// Write customers to a CSV file, replacing its contents
pub fn save_customers<'a, P, I>(path: P, customers: I) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = &'a Customer>,
{
    let path = path.as_ref();
    let count = write_customers_to_writer(std::fs::File::create(path)?, customers)?;
    info!("Wrote {} customers to {}", count, path.display());
    Ok(())
}

/// Write customers in the extract layout to any writer
pub fn write_customers_to_writer<'a, W, I>(writer: W, customers: I) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a Customer>,
{
    let mut csv_writer = Writer::from_writer(writer);
    let mut count = 0;
    for customer in customers {
        csv_writer.serialize(OutputRow::from(customer))?;
        count += 1;
    }
    csv_writer.flush()?;
    Ok(count)
}
