//! I/O module
//!
//! Handles CSV parsing and report output.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (row conversion, report serialization)
//! - `reader` - Streaming CSV reader with iterator interface

pub mod csv_format;
pub mod reader;

pub use csv_format::{
    convert_request_row, convert_seed_row, write_accounts_csv, write_ledger_csv, CsvRow,
    RequestRow, SeedRow,
};
pub use reader::{CsvReader, RequestReader, SeedReader};
