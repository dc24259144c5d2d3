//! Streaming CSV reader for replay inputs
//!
//! `CsvReader<R>` yields one converted value per CSV row, where the row type
//! `R` decides both the columns and the conversion (see
//! [`CsvRow`](crate::io::csv_format::CsvRow)):
//!
//! ```no_run
//! use balance_guard::io::RequestReader;
//! use std::path::Path;
//!
//! let reader = RequestReader::open(Path::new("requests.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(request) => println!("{:?}", request),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found) are returned from `open()`
//! - Individual row errors are yielded as `Err` items, prefixed with the line
//!   number, and iteration continues

use crate::io::csv_format::{CsvRow, RequestRow, SeedRow};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::marker::PhantomData;
use std::path::Path;

/// Reader over the requests file
pub type RequestReader = CsvReader<RequestRow, File>;

/// Reader over the accounts file
pub type SeedReader = CsvReader<SeedRow, File>;

#[derive(Debug)]
pub struct CsvReader<R, S: Read> {
    reader: csv::Reader<S>,
    line_num: usize,
    _row: PhantomData<R>,
}

impl<R: CsvRow> CsvReader<R, File> {
    /// Open a CSV file for streaming iteration
    ///
    /// # Returns
    ///
    /// * `Ok(CsvReader)` if the file opened successfully
    /// * `Err(String)` if the file could not be opened
    pub fn open(path: &Path) -> Result<Self, String> {
        let file = File::open(path)
            .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;
        Ok(Self::from_reader(file))
    }
}

impl<R: CsvRow, S: Read> CsvReader<R, S> {
    /// Wrap any reader; fields are trimmed and short rows are allowed
    pub fn from_reader(source: S) -> Self {
        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(source);

        Self {
            reader,
            line_num: 0,
            _row: PhantomData,
        }
    }
}

impl<R: CsvRow, S: Read> Iterator for CsvReader<R, S> {
    type Item = Result<R::Output, String>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.reader.deserialize::<R>().next()?;
        self.line_num += 1;
        // +1 for the header line
        let line = self.line_num + 1;

        Some(match row {
            Ok(row) => row.convert().map_err(|e| format!("Line {}: {}", line, e)),
            Err(e) => Err(format!("Line {}: CSV parse error: {}", line, e)),
        })
    }
}
