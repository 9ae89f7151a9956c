//! Runtime configuration for the binaries
//!
//! Values come from the environment with sensible defaults; command line
//! flags override them in `main`.

use chrono::{Local, NaiveDate};
use log::warn;
use std::env;
use std::path::{Path, PathBuf};

/// Default directory holding `customer_data.csv` and `loan_data.csv`
pub const DEFAULT_DATA_DIR: &str = "data";

pub const CUSTOMER_FILE: &str = "customer_data.csv";
pub const LOAN_FILE: &str = "loan_data.csv";

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Directory the customer and loan extracts are read from
    pub data_dir: PathBuf,

    /// Date used for the current-year activity factor and for booking loans
    pub reference_date: NaiveDate,
}

impl EngineConfig {
    /// Read `LENDING_DATA_DIR` and `LENDING_REFERENCE_DATE` (YYYY-MM-DD).
    /// Unset values fall back to the defaults; an unparseable date is logged
    /// and replaced by today.
    pub fn from_env() -> Self {
        let data_dir = env::var("LENDING_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));

        let reference_date = reference_date_or_today(env::var("LENDING_REFERENCE_DATE").ok().as_deref());

        Self { data_dir, reference_date }
    }

    pub fn customers_path(&self) -> PathBuf {
        self.data_dir.join(CUSTOMER_FILE)
    }

    pub fn loans_path(&self) -> PathBuf {
        self.data_dir.join(LOAN_FILE)
    }

    pub fn with_data_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.data_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn as_of(mut self, date: NaiveDate) -> Self {
        self.reference_date = date;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            reference_date: today(),
        }
    }
}

fn reference_date_or_today(raw: Option<&str>) -> NaiveDate {
    let Some(raw) = raw else {
        return today();
    };
    match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        Ok(date) => date,
        Err(e) => {
            let fallback = today();
            warn!(
                "Ignoring LENDING_REFERENCE_DATE '{}' ({}); scoring as of {}",
                raw, e, fallback
            );
            fallback
        }
    }
}

/// Local calendar date. The only wall-clock read in the crate.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
