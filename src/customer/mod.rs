//! Customer records and extract loading

mod data;
pub mod loader;

pub use data::{Customer, approved_limit_for};
pub use loader::{load_customers, load_customers_from_reader, save_customers, write_customers_to_writer};
