//! Schema inference for grids.
//!
//! Types are inferred from a single sample row, the first data row. Later rows
//! never change the schema, a cell that doesn't fit its column's type is an
//! error.

use gsheets_error::{Result, SheetsError};

use crate::arrays::datatype::DataType;
use crate::arrays::field::{ColumnSchema, Field};
use crate::arrays::scalar::ScalarValue;
use crate::grid::Grid;

pub const TRUE_LITERAL: &str = "TRUE";
pub const FALSE_LITERAL: &str = "FALSE";

/// Infer the schema for a row-major grid.
///
/// `header_offset` is 1 when the first row holds column names, 0 otherwise.
pub fn infer_column_schema(grid: &Grid, header_offset: usize) -> ColumnSchema {
    let header = if header_offset > 0 { grid.row(0) } else { None };
    let sample = grid.row(header_offset);

    let header_width = header.map(|r| r.len()).unwrap_or(0);
    let sample_width = sample.map(|r| r.len()).unwrap_or(0);
    let num_columns = usize::max(header_width, sample_width);

    let fields = (0..num_columns).map(|idx| {
        let name = match header.and_then(|r| r.get(idx)) {
            Some(name) => name.clone(),
            None => format!("column{}", idx + 1),
        };

        let datatype = match sample.and_then(|r| r.get(idx)) {
            Some(cell) => infer_cell_type(cell),
            None => DataType::Utf8,
        };

        Field::new(name, datatype, true)
    });

    ColumnSchema::new(fields)
}

/// Infer the type of a single cell.
pub fn infer_cell_type(cell: &str) -> DataType {
    if cell == TRUE_LITERAL || cell == FALSE_LITERAL {
        DataType::Boolean
    } else if parse_finite(cell).is_some() {
        DataType::Float64
    } else {
        DataType::Utf8
    }
}

/// Parse a float, rejecting `NaN` and infinities.
fn parse_finite(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Cast a cell to a value of the given type.
///
/// Empty cells are always null.
pub fn cast_cell(cell: &str, datatype: DataType) -> Result<ScalarValue> {
    if cell.is_empty() {
        return Ok(ScalarValue::Null);
    }

    let value = match datatype {
        DataType::Boolean => match cell {
            TRUE_LITERAL => Some(ScalarValue::Boolean(true)),
            FALSE_LITERAL => Some(ScalarValue::Boolean(false)),
            _ => None,
        },
        DataType::Float64 => parse_finite(cell).map(ScalarValue::Float64),
        DataType::Int64 => cell.parse::<i64>().ok().map(ScalarValue::Int64),
        DataType::Utf8 => Some(ScalarValue::Utf8(cell.to_string())),
        DataType::Binary => Some(ScalarValue::Binary(cell.as_bytes().to_vec())),
    };

    value.ok_or_else(|| {
        SheetsError::type_cast("Failed to cast cell")
            .with_field("value", cell)
            .with_field("datatype", datatype)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Grid {
        Grid::from_rows(
            "Sheet1",
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn infer_with_header() {
        let g = grid(&[&["name", "score"], &["alice", "10.5"]]);
        let schema = infer_column_schema(&g, 1);
        assert_eq!(
            ColumnSchema::new([
                Field::new("name", DataType::Utf8, true),
                Field::new("score", DataType::Float64, true),
            ]),
            schema
        );
    }

    #[test]
    fn infer_without_header() {
        let g = grid(&[&["TRUE", "3", "x"], &["FALSE", "4", "y"]]);
        let schema = infer_column_schema(&g, 0);
        assert_eq!(
            ColumnSchema::new([
                Field::new("column1", DataType::Boolean, true),
                Field::new("column2", DataType::Float64, true),
                Field::new("column3", DataType::Utf8, true),
            ]),
            schema
        );
    }

    #[test]
    fn header_shorter_than_data() {
        let g = grid(&[&["a"], &["1", "TRUE", "z"]]);
        let schema = infer_column_schema(&g, 1);
        let names: Vec<_> = schema.names().collect();
        assert_eq!(vec!["a", "column2", "column3"], names);
        let types: Vec<_> = schema.datatypes().collect();
        assert_eq!(
            vec![DataType::Float64, DataType::Boolean, DataType::Utf8],
            types
        );
    }

    #[test]
    fn header_longer_than_data() {
        let g = grid(&[&["a", "b", "c"], &["1"]]);
        let schema = infer_column_schema(&g, 1);
        let types: Vec<_> = schema.datatypes().collect();
        assert_eq!(vec![DataType::Float64, DataType::Utf8, DataType::Utf8], types);
    }

    #[test]
    fn header_only() {
        let g = grid(&[&["a", "b"]]);
        let schema = infer_column_schema(&g, 1);
        assert_eq!(2, schema.num_columns());
        assert!(schema.datatypes().all(|t| t == DataType::Utf8));
    }

    #[test]
    fn empty_grid() {
        let g = grid(&[]);
        assert_eq!(0, infer_column_schema(&g, 0).num_columns());
    }

    #[test]
    fn cell_type_literals() {
        assert_eq!(DataType::Boolean, infer_cell_type("TRUE"));
        assert_eq!(DataType::Boolean, infer_cell_type("FALSE"));
        // Only the exact uppercase literals.
        assert_eq!(DataType::Utf8, infer_cell_type("true"));
        assert_eq!(DataType::Float64, infer_cell_type("-1.5e3"));
        assert_eq!(DataType::Float64, infer_cell_type("42"));
        assert_eq!(DataType::Utf8, infer_cell_type("42abc"));
        assert_eq!(DataType::Utf8, infer_cell_type("1-2"));
        assert_eq!(DataType::Utf8, infer_cell_type(""));
    }

    #[test]
    fn non_finite_literals_are_text() {
        for cell in ["Nan", "NaN", "inf", "Infinity", "-infinity", "1e400"] {
            assert_eq!(DataType::Utf8, infer_cell_type(cell), "cell: {cell}");
        }
        cast_cell("NaN", DataType::Float64).unwrap_err();
    }

    #[test]
    fn cast_cells() {
        assert_eq!(ScalarValue::Null, cast_cell("", DataType::Float64).unwrap());
        assert_eq!(ScalarValue::Null, cast_cell("", DataType::Utf8).unwrap());
        assert_eq!(
            ScalarValue::Boolean(false),
            cast_cell("FALSE", DataType::Boolean).unwrap()
        );
        assert_eq!(
            ScalarValue::Float64(10.5),
            cast_cell("10.5", DataType::Float64).unwrap()
        );
        assert_eq!(ScalarValue::from("x"), cast_cell("x", DataType::Utf8).unwrap());
    }

    #[test]
    fn cast_mismatch() {
        let err = cast_cell("n/a", DataType::Float64).unwrap_err();
        assert_eq!(&gsheets_error::ErrorKind::TypeCast, err.kind());
        cast_cell("yes", DataType::Boolean).unwrap_err();
    }
}
