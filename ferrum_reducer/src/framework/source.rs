use crate::framework::errors::Result;
use arrow::array::{ArrayRef, StringArray};
use arrow::compute::concat_batches;
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use std::fs::File;
use std::io::{BufRead, Seek};
use std::path::Path;
use std::sync::Arc;

/// Reads a delimited text file into a single batch. Every column is read as
/// text; callers cast what they need.
pub fn read_delimited(
    path: impl AsRef<Path>,
    delimiter: u8,
    has_header: bool,
) -> Result<RecordBatch> {
    let mut file = File::open(path.as_ref())?;
    let format = Format::default()
        .with_header(has_header)
        .with_delimiter(delimiter);
    let (inferred, _) = format.infer_schema(&mut file, None)?;
    file.rewind()?;

    let fields: Vec<Field> = inferred
        .fields()
        .iter()
        .map(|field| Field::new(field.name(), DataType::Utf8, true))
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let reader = ReaderBuilder::new(schema.clone())
        .with_header(has_header)
        .with_delimiter(delimiter)
        .build(file)?;
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(concat_batches(&schema, &batches)?)
}

/// One `column` row per line of `reader`.
pub fn read_lines(reader: impl BufRead, column: &str) -> Result<RecordBatch> {
    let lines = reader.lines().collect::<std::io::Result<Vec<String>>>()?;
    let schema = Arc::new(Schema::new(vec![Field::new(column, DataType::Utf8, false)]));
    Ok(RecordBatch::try_new(
        schema,
        vec![Arc::new(StringArray::from(lines)) as ArrayRef],
    )?)
}
