//! Conversion of batches into values matrices for writing.

use gsheets_error::{Result, SheetsError};
use serde::Serialize;

use crate::arrays::array::ArrayData;
use crate::arrays::batch::Batch;
use crate::arrays::scalar::ScalarValue;
use crate::grid::MajorDimension;
use crate::schema::{FALSE_LITERAL, TRUE_LITERAL};

/// Request body for writing values to a range.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    pub range: String,
    pub major_dimension: MajorDimension,
    pub values: Vec<Vec<String>>,
}

/// Build a row-major values matrix from a batch.
///
/// If `header` is provided, it's written as the first row.
pub fn batch_to_values(batch: &Batch, header: Option<&[String]>) -> Result<Vec<Vec<String>>> {
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(batch.num_rows() + 1);
    if let Some(header) = header {
        rows.push(header.to_vec());
    }

    let offset = rows.len();
    rows.extend((0..batch.num_rows()).map(|_| Vec::with_capacity(batch.num_columns())));

    for (col_idx, array) in batch.arrays().iter().enumerate() {
        let rows = &mut rows[offset..];
        let result = match array.data() {
            ArrayData::Boolean(vals) => push_cells(rows, vals, |v| Ok(bool_to_cell(*v))),
            ArrayData::Int64(vals) => push_cells(rows, vals, |v| Ok(v.to_string())),
            ArrayData::Float64(vals) => push_cells(rows, vals, |v| Ok(v.to_string())),
            ArrayData::Utf8(vals) => push_cells(rows, vals, |v| Ok(v.clone())),
            ArrayData::Binary(vals) => push_cells(rows, vals, |v| binary_to_cell(v)),
        };
        result.map_err(|e| e.with_field("column", col_idx))?;
    }

    Ok(rows)
}

/// Display string for a single value. Null becomes an empty string.
pub fn scalar_to_cell(value: &ScalarValue) -> Result<String> {
    Ok(match value {
        ScalarValue::Null => String::new(),
        ScalarValue::Boolean(v) => bool_to_cell(*v),
        ScalarValue::Int64(v) => v.to_string(),
        ScalarValue::Float64(v) => v.to_string(),
        ScalarValue::Utf8(v) => v.clone(),
        ScalarValue::Binary(v) => binary_to_cell(v)?,
    })
}

fn push_cells<T, F>(rows: &mut [Vec<String>], vals: &[Option<T>], f: F) -> Result<()>
where
    F: Fn(&T) -> Result<String>,
{
    for (row_idx, (row, val)) in rows.iter_mut().zip(vals).enumerate() {
        let cell = match val {
            Some(v) => f(v).map_err(|e| e.with_field("row", row_idx))?,
            None => String::new(),
        };
        row.push(cell);
    }
    Ok(())
}

fn bool_to_cell(v: bool) -> String {
    if v {
        TRUE_LITERAL.to_string()
    } else {
        FALSE_LITERAL.to_string()
    }
}

fn binary_to_cell(v: &[u8]) -> Result<String> {
    match std::str::from_utf8(v) {
        Ok(s) => Ok(s.to_string()),
        Err(_) => Err(SheetsError::type_cast(
            "Binary value is not valid UTF-8 and cannot be written as a cell",
        )),
    }
}

#[cfg(test)]
mod tests {
    use gsheets_error::ErrorKind;

    use super::*;
    use crate::arrays::array::Array;

    fn strings(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn values_with_header() {
        let batch = Batch::try_from_arrays([
            Array::from(vec![Some("alice"), None]),
            Array::from(vec![Some(10.5_f64), Some(1.0)]),
            Array::from(vec![Some(true), Some(false)]),
            Array::from(vec![Some(7_i64), None]),
        ])
        .unwrap();

        let header = vec![
            "name".to_string(),
            "score".to_string(),
            "active".to_string(),
            "n".to_string(),
        ];
        let values = batch_to_values(&batch, Some(header.as_slice())).unwrap();

        assert_eq!(
            strings(&[
                &["name", "score", "active", "n"],
                &["alice", "10.5", "TRUE", "7"],
                &["", "1", "FALSE", ""],
            ]),
            values
        );
    }

    #[test]
    fn values_without_header() {
        let batch = Batch::try_from_arrays([Array::from(vec![Some("x")])]).unwrap();
        let values = batch_to_values(&batch, None).unwrap();
        assert_eq!(strings(&[&["x"]]), values);
    }

    #[test]
    fn header_only() {
        let batch = Batch::empty_with_types([crate::arrays::datatype::DataType::Utf8]);
        let header = vec!["a".to_string()];
        let values = batch_to_values(&batch, Some(header.as_slice())).unwrap();
        assert_eq!(strings(&[&["a"]]), values);
    }

    #[test]
    fn invalid_utf8_binary() {
        let batch =
            Batch::try_from_arrays([Array::from(vec![Some(vec![0xff_u8, 0xfe])])]).unwrap();
        let err = batch_to_values(&batch, None).unwrap_err();
        assert_eq!(&ErrorKind::TypeCast, err.kind());
    }

    #[test]
    fn scalar_cells() {
        assert_eq!("", scalar_to_cell(&ScalarValue::Null).unwrap());
        assert_eq!("TRUE", scalar_to_cell(&ScalarValue::Boolean(true)).unwrap());
        assert_eq!("-3", scalar_to_cell(&ScalarValue::Int64(-3)).unwrap());
        assert_eq!(
            "hi",
            scalar_to_cell(&ScalarValue::Binary(b"hi".to_vec())).unwrap()
        );
    }

    #[test]
    fn serialize_value_range() {
        let body = ValueRange {
            range: "Sheet1".to_string(),
            major_dimension: MajorDimension::Rows,
            values: strings(&[&["a"]]),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(
            r#"{"range":"Sheet1","majorDimension":"ROWS","values":[["a"]]}"#,
            json
        );
    }
}
