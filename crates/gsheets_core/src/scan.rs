use gsheets_error::{Result, SheetsError};
use tracing::trace;

use crate::arrays::array::Array;
use crate::arrays::batch::Batch;
use crate::arrays::datatype::DataType;
use crate::arrays::field::ColumnSchema;
use crate::grid::Grid;
use crate::schema::{cast_cell, infer_column_schema};

/// Serves batches of rows from a fully materialized grid.
///
/// The schema is inferred once on creation and never revised.
#[derive(Debug)]
pub struct GridScanner {
    grid: Grid,
    schema: ColumnSchema,
    /// Number of leading rows skipped as header. Applied to both inference
    /// and scanning.
    header_offset: usize,
    /// Number of data rows emitted so far.
    cursor: usize,
    exhausted: bool,
}

impl GridScanner {
    /// Create a scanner, inferring the schema from the first data row.
    ///
    /// Every data cell is checked against the inferred schema up front. A cell
    /// that doesn't fit its column fails here, before any batch is produced.
    pub fn try_new(grid: Grid, header_present: bool) -> Result<Self> {
        Self::try_new_with(grid, header_present, infer_column_schema)
    }

    /// Create a scanner where every column is `Utf8`, cells pass through as
    /// written.
    pub fn try_new_as_text(grid: Grid, header_present: bool) -> Result<Self> {
        Self::try_new_with(grid, header_present, |grid, header_offset| {
            let mut schema = infer_column_schema(grid, header_offset);
            for field in &mut schema.fields {
                field.datatype = DataType::Utf8;
            }
            schema
        })
    }

    fn try_new_with(
        grid: Grid,
        header_present: bool,
        infer: impl FnOnce(&Grid, usize) -> ColumnSchema,
    ) -> Result<Self> {
        let grid = grid.into_row_major();
        let header_offset = if header_present && grid.num_rows() > 0 {
            1
        } else {
            0
        };
        let schema = infer(&grid, header_offset);
        check_cells(&grid, &schema, header_offset)?;
        let exhausted = grid.num_rows() == header_offset;

        trace!(
            rows = grid.num_rows(),
            columns = schema.num_columns(),
            %header_offset,
            "created grid scanner"
        );

        Ok(GridScanner {
            grid,
            schema,
            header_offset,
            cursor: 0,
            exhausted,
        })
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    /// Header row of the grid, if one was requested and present.
    pub fn header_row(&self) -> Option<&[String]> {
        if self.header_offset > 0 {
            self.grid.row(0)
        } else {
            None
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Number of data rows not yet emitted.
    pub fn remaining_rows(&self) -> usize {
        self.grid.num_rows() - self.header_offset - self.cursor
    }

    /// Produce the next batch of at most `max_rows` rows.
    ///
    /// Returns an empty batch once exhausted.
    pub fn scan_next(&mut self, max_rows: usize) -> Result<Batch> {
        if self.exhausted {
            return Ok(Batch::empty_with_types(self.schema.datatypes()));
        }

        let start = self.header_offset + self.cursor;
        let count = usize::min(max_rows, self.remaining_rows());

        let arrays = self
            .schema
            .fields
            .iter()
            .enumerate()
            .map(|(col_idx, field)| -> Result<Array> {
                let mut array = Array::with_capacity(field.datatype, count);
                for row_idx in start..(start + count) {
                    let cell = self.grid.cell(row_idx, col_idx);
                    let value = cast_cell(cell, field.datatype)
                        .map_err(|e| with_location(e, row_idx, &field.name))?;
                    array.push_value(value)?;
                }
                Ok(array)
            })
            .collect::<Result<Vec<_>>>()?;
        let batch = Batch::try_from_arrays(arrays)?;

        self.cursor += count;
        self.exhausted = self.cursor == self.grid.num_rows() - self.header_offset;

        trace!(rows = count, cursor = self.cursor, exhausted = self.exhausted, "scanned grid");

        Ok(batch)
    }
}

/// Check that every data cell casts to its column's type.
fn check_cells(grid: &Grid, schema: &ColumnSchema, header_offset: usize) -> Result<()> {
    for (col_idx, field) in schema.fields.iter().enumerate() {
        if matches!(field.datatype, DataType::Utf8 | DataType::Binary) {
            continue;
        }
        for row_idx in header_offset..grid.num_rows() {
            cast_cell(grid.cell(row_idx, col_idx), field.datatype)
                .map_err(|e| with_location(e, row_idx, &field.name))?;
        }
    }
    Ok(())
}

/// Attach the 1-based sheet row and the column name.
fn with_location(err: SheetsError, row_idx: usize, column: &str) -> SheetsError {
    err.with_field("row", row_idx + 1).with_field("column", column)
}
