use std::io::Read;

use gsheets_core::grid::Grid;
use gsheets_error::{Result, ResultExt};

/// Read csv input into a grid of raw cells.
///
/// Every record, including the first, becomes a row. Records may have
/// differing lengths.
pub fn read_csv_grid<R: Read>(input: R) -> Result<Grid> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("Failed to read csv record")?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Grid::from_rows("input", rows))
}
