use gsheets_error::{Result, SheetsError};

use super::array::Array;
use super::datatype::DataType;
use super::scalar::ScalarValue;

/// A batch of equal length arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    arrays: Vec<Array>,
    num_rows: usize,
}

impl Batch {
    /// Create a batch with zero rows for the given types.
    pub fn empty_with_types(datatypes: impl IntoIterator<Item = DataType>) -> Self {
        Batch {
            arrays: datatypes
                .into_iter()
                .map(|datatype| Array::with_capacity(datatype, 0))
                .collect(),
            num_rows: 0,
        }
    }

    /// Create a batch from arrays.
    ///
    /// Errors if the arrays differ in length.
    pub fn try_from_arrays(arrays: impl IntoIterator<Item = Array>) -> Result<Self> {
        let arrays: Vec<_> = arrays.into_iter().collect();
        let num_rows = arrays.first().map(|a| a.len()).unwrap_or(0);

        for (idx, array) in arrays.iter().enumerate() {
            if array.len() != num_rows {
                return Err(SheetsError::new("Arrays in a batch must have the same length")
                    .with_field("expected", num_rows)
                    .with_field("got", array.len())
                    .with_field("column", idx));
            }
        }

        Ok(Batch { arrays, num_rows })
    }

    pub fn arrays(&self) -> &[Array] {
        &self.arrays
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.arrays.len()
    }

    pub fn datatypes(&self) -> impl Iterator<Item = DataType> + '_ {
        self.arrays.iter().map(|a| a.datatype())
    }

    /// Get the values for a single row.
    pub fn get_row(&self, row: usize) -> Result<Vec<ScalarValue>> {
        self.arrays.iter().map(|a| a.get_value(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_lengths() {
        Batch::try_from_arrays([
            Array::from(vec![Some(true)]),
            Array::from(vec![Some("a"), Some("b")]),
        ])
        .unwrap_err();
    }

    #[test]
    fn get_row_values() {
        let batch = Batch::try_from_arrays([
            Array::from(vec![Some(true), None]),
            Array::from(vec![Some("a"), Some("b")]),
        ])
        .unwrap();

        assert_eq!(2, batch.num_rows());
        assert_eq!(
            vec![ScalarValue::Null, ScalarValue::from("b")],
            batch.get_row(1).unwrap()
        );
    }

    #[test]
    fn empty_batch() {
        let batch = Batch::empty_with_types([DataType::Utf8, DataType::Float64]);
        assert_eq!(0, batch.num_rows());
        assert_eq!(2, batch.num_columns());
    }
}
