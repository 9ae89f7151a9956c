//! Error types shared across the engine, loaders, and loan book

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LendingError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Customer {0} not found")]
    CustomerNotFound(u32),

    #[error("Loan {0} not found")]
    LoanNotFound(u32),

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid value in row {row}: {message}")]
    Parse { row: usize, message: String },
}

impl LendingError {
    pub fn invalid(message: impl Into<String>) -> Self {
        LendingError::InvalidArgument { message: message.into() }
    }
}

pub type Result<T> = std::result::Result<T, LendingError>;
