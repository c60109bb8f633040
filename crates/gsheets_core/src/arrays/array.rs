use gsheets_error::{Result, SheetsError};

use super::datatype::DataType;
use super::scalar::ScalarValue;

/// Column values, None indicating null.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Boolean(Vec<Option<bool>>),
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
    Utf8(Vec<Option<String>>),
    Binary(Vec<Option<Vec<u8>>>),
}

/// A single typed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    data: ArrayData,
}

impl Array {
    /// Create a new empty array with the given capacity.
    pub fn with_capacity(datatype: DataType, capacity: usize) -> Self {
        let data = match datatype {
            DataType::Boolean => ArrayData::Boolean(Vec::with_capacity(capacity)),
            DataType::Int64 => ArrayData::Int64(Vec::with_capacity(capacity)),
            DataType::Float64 => ArrayData::Float64(Vec::with_capacity(capacity)),
            DataType::Utf8 => ArrayData::Utf8(Vec::with_capacity(capacity)),
            DataType::Binary => ArrayData::Binary(Vec::with_capacity(capacity)),
        };
        Array { data }
    }

    /// Create an array from a sequence of scalars.
    ///
    /// Every non-null scalar must match `datatype`.
    pub fn try_from_scalars<I>(datatype: DataType, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = ScalarValue>,
    {
        let values = values.into_iter();
        let mut array = Array::with_capacity(datatype, values.size_hint().0);
        for value in values {
            array.push_value(value)?;
        }
        Ok(array)
    }

    pub fn datatype(&self) -> DataType {
        match &self.data {
            ArrayData::Boolean(_) => DataType::Boolean,
            ArrayData::Int64(_) => DataType::Int64,
            ArrayData::Float64(_) => DataType::Float64,
            ArrayData::Utf8(_) => DataType::Utf8,
            ArrayData::Binary(_) => DataType::Binary,
        }
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    pub fn len(&self) -> usize {
        match &self.data {
            ArrayData::Boolean(v) => v.len(),
            ArrayData::Int64(v) => v.len(),
            ArrayData::Float64(v) => v.len(),
            ArrayData::Utf8(v) => v.len(),
            ArrayData::Binary(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a value to the end of the array.
    pub fn push_value(&mut self, value: ScalarValue) -> Result<()> {
        match (&mut self.data, value) {
            (ArrayData::Boolean(v), ScalarValue::Null) => v.push(None),
            (ArrayData::Int64(v), ScalarValue::Null) => v.push(None),
            (ArrayData::Float64(v), ScalarValue::Null) => v.push(None),
            (ArrayData::Utf8(v), ScalarValue::Null) => v.push(None),
            (ArrayData::Binary(v), ScalarValue::Null) => v.push(None),
            (ArrayData::Boolean(v), ScalarValue::Boolean(b)) => v.push(Some(b)),
            (ArrayData::Int64(v), ScalarValue::Int64(i)) => v.push(Some(i)),
            (ArrayData::Float64(v), ScalarValue::Float64(f)) => v.push(Some(f)),
            (ArrayData::Utf8(v), ScalarValue::Utf8(s)) => v.push(Some(s)),
            (ArrayData::Binary(v), ScalarValue::Binary(b)) => v.push(Some(b)),
            (_, value) => {
                return Err(SheetsError::new("Value type does not match array type")
                    .with_field("array", self.datatype())
                    .with_field("value", value));
            }
        }
        Ok(())
    }

    /// Get the value at the given index.
    pub fn get_value(&self, idx: usize) -> Result<ScalarValue> {
        fn get<T: Clone>(v: &[Option<T>], idx: usize) -> Result<Option<T>> {
            v.get(idx).cloned().ok_or_else(|| {
                SheetsError::new("Index out of bounds")
                    .with_field("idx", idx)
                    .with_field("len", v.len())
            })
        }

        let value = match &self.data {
            ArrayData::Boolean(v) => get(v, idx)?.map(ScalarValue::Boolean),
            ArrayData::Int64(v) => get(v, idx)?.map(ScalarValue::Int64),
            ArrayData::Float64(v) => get(v, idx)?.map(ScalarValue::Float64),
            ArrayData::Utf8(v) => get(v, idx)?.map(ScalarValue::Utf8),
            ArrayData::Binary(v) => get(v, idx)?.map(ScalarValue::Binary),
        };

        Ok(value.unwrap_or(ScalarValue::Null))
    }
}

impl From<Vec<Option<bool>>> for Array {
    fn from(value: Vec<Option<bool>>) -> Self {
        Array {
            data: ArrayData::Boolean(value),
        }
    }
}

impl From<Vec<Option<i64>>> for Array {
    fn from(value: Vec<Option<i64>>) -> Self {
        Array {
            data: ArrayData::Int64(value),
        }
    }
}

impl From<Vec<Option<f64>>> for Array {
    fn from(value: Vec<Option<f64>>) -> Self {
        Array {
            data: ArrayData::Float64(value),
        }
    }
}

impl From<Vec<Option<String>>> for Array {
    fn from(value: Vec<Option<String>>) -> Self {
        Array {
            data: ArrayData::Utf8(value),
        }
    }
}

impl From<Vec<Option<&str>>> for Array {
    fn from(value: Vec<Option<&str>>) -> Self {
        Array {
            data: ArrayData::Utf8(value.into_iter().map(|v| v.map(String::from)).collect()),
        }
    }
}

impl From<Vec<Option<Vec<u8>>>> for Array {
    fn from(value: Vec<Option<Vec<u8>>>) -> Self {
        Array {
            data: ArrayData::Binary(value),
        }
    }
}
