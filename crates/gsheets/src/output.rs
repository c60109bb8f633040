use std::io::Write;

use clap::ValueEnum;
use gsheets_core::arrays::batch::Batch;
use gsheets_core::arrays::field::ColumnSchema;
use gsheets_core::arrays::scalar::ScalarValue;
use gsheets_core::values::scalar_to_cell;
use gsheets_error::{Result, ResultExt, SheetsError};
use serde_json::{Map, Number, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Comma separated values with a header row.
    Csv,
    /// One json object per row.
    Ndjson,
}

/// Writes scanned batches to an output.
#[derive(Debug)]
pub enum RowWriter<W: Write> {
    Csv(csv::Writer<W>),
    Ndjson { out: W, names: Vec<String> },
}

impl<W> RowWriter<W>
where
    W: Write,
{
    /// Create a writer for the schema. Csv output starts with the column
    /// names.
    pub fn try_new(format: OutputFormat, out: W, schema: &ColumnSchema) -> Result<Self> {
        match format {
            OutputFormat::Csv => {
                let mut writer = csv::Writer::from_writer(out);
                if schema.num_columns() > 0 {
                    writer
                        .write_record(schema.names())
                        .context("Failed to write csv header")?;
                }
                Ok(RowWriter::Csv(writer))
            }
            OutputFormat::Ndjson => Ok(RowWriter::Ndjson {
                out,
                names: schema.names().map(str::to_string).collect(),
            }),
        }
    }

    pub fn write_batch(&mut self, batch: &Batch) -> Result<()> {
        for row_idx in 0..batch.num_rows() {
            let row = batch.get_row(row_idx)?;
            match self {
                RowWriter::Csv(writer) => {
                    let cells = row.iter().map(scalar_to_cell).collect::<Result<Vec<_>>>()?;
                    writer
                        .write_record(&cells)
                        .context("Failed to write csv record")?;
                }
                RowWriter::Ndjson { out, names } => {
                    let object: Map<String, Value> = names
                        .iter()
                        .cloned()
                        .zip(row.into_iter().map(scalar_to_json))
                        .collect();
                    serde_json::to_writer(&mut *out, &object)
                        .context("Failed to write json row")?;
                    writeln!(out)?;
                }
            }
        }
        Ok(())
    }

    /// Flush all output, returning the underlying writer.
    pub fn finish(self) -> Result<W> {
        match self {
            RowWriter::Csv(writer) => writer.into_inner().map_err(|e| {
                SheetsError::with_source("Failed to flush csv output", Box::new(e.into_error()))
            }),
            RowWriter::Ndjson { mut out, .. } => {
                out.flush()?;
                Ok(out)
            }
        }
    }
}

fn scalar_to_json(value: ScalarValue) -> Value {
    match value {
        ScalarValue::Null => Value::Null,
        ScalarValue::Boolean(v) => Value::Bool(v),
        ScalarValue::Int64(v) => Value::from(v),
        ScalarValue::Float64(v) => Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null),
        ScalarValue::Utf8(v) => Value::String(v),
        ScalarValue::Binary(v) => Value::String(String::from_utf8_lossy(&v).into_owned()),
    }
}
