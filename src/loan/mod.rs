//! Loan records and extract loading

mod data;
pub mod loader;

pub use data::LoanRecord;
pub use loader::{load_loans, load_loans_from_reader, save_loans, write_loans_to_writer};
