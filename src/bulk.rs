//! Bulk input: one vector per line, comma-separated unsigned integers.
//!
//! ```text
//! 1,2,3
//! 4, ,6
//! ```
//!
//! parses to `[[1, 2, 3], [4, 0, 6]]`. Empty or whitespace-only cells are 0,
//! blank lines are skipped. The whole table is parsed before anything is
//! returned, so a malformed cell anywhere rejects the file.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

pub const DELIMITER: char = ',';

/// Parse a whole table; row and column numbers in errors are 1-based
pub fn parse_table<R: BufRead>(reader: R) -> Result<Vec<Vec<u64>>> {
    let mut rows = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        rows.push(parse_row(line, index + 1)?);
    }
    Ok(rows)
}

fn parse_row(line: &str, row: usize) -> Result<Vec<u64>> {
    line.split(DELIMITER)
        .enumerate()
        .map(|(index, cell)| {
            let cell = cell.trim();
            if cell.is_empty() {
                return Ok(0);
            }
            cell.parse::<u64>().map_err(|e| Error::Parse {
                row,
                column: index + 1,
                reason: format!("{:?}: {}", cell, e),
            })
        })
        .collect()
}

/// Parse the table stored at `path`
pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<Vec<u64>>> {
    let path = path.as_ref();
    let rows = parse_table(BufReader::new(File::open(path)?))?;
    debug!("Parsed {} rows from {}", rows.len(), path.display());
    Ok(rows)
}
