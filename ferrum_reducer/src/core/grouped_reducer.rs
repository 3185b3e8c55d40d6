use crate::api::reduce::Reducer;
use crate::core::encoding::{decode_tuple, encode_tuples, numeric_prefix};
use crate::core::partition::{column_index, ensure_single_key};
use crate::framework::errors::{FerrumReducerError, Result};
use arrow::array::{Array, ArrayRef, AsArray, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// How the value column of one group is folded into a single encoded string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReductionPolicy {
    /// Keep the value whose leading token is the smallest integer.
    MinByEncodedPrefix,
    /// Collect every decoded tuple, in row order, into one encoded list.
    ConcatEncoded,
}

impl FromStr for ReductionPolicy {
    type Err = FerrumReducerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "min" | "min_by_encoded_prefix" => Ok(ReductionPolicy::MinByEncodedPrefix),
            "concat" | "concat_encoded" => Ok(ReductionPolicy::ConcatEncoded),
            other => Err(FerrumReducerError::ConfigError(format!(
                "unknown reduction policy '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for ReductionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReductionPolicy::MinByEncodedPrefix => write!(f, "min_by_encoded_prefix"),
            ReductionPolicy::ConcatEncoded => write!(f, "concat_encoded"),
        }
    }
}

/// Reduces a group of rows sharing one key to a single row, combining the
/// encoded values of the value column according to a [`ReductionPolicy`].
#[derive(Debug, Clone, Copy)]
pub struct GroupedColumnReducer {
    policy: ReductionPolicy,
}

impl GroupedColumnReducer {
    pub fn new(policy: ReductionPolicy) -> Self {
        GroupedColumnReducer { policy }
    }

    pub fn policy(&self) -> ReductionPolicy {
        self.policy
    }
}

impl Reducer for GroupedColumnReducer {
    fn output_schema(
        &self,
        input: &SchemaRef,
        key_column: &str,
        value_column: &str,
    ) -> Result<SchemaRef> {
        reduced_schema(input, key_column, value_column, DataType::Utf8)
    }

    fn reduce(
        &self,
        group: &RecordBatch,
        key_column: &str,
        value_column: &str,
    ) -> Result<RecordBatch> {
        match self.policy {
            ReductionPolicy::MinByEncodedPrefix => {
                reduce_min_by_encoded_prefix(group, key_column, value_column)
            }
            ReductionPolicy::ConcatEncoded => reduce_concat_encoded(group, key_column, value_column),
        }
    }
}

/// Key field passed through from `input`, followed by a non-null `value_column` of `value_type`.
pub(crate) fn reduced_schema(
    input: &SchemaRef,
    key_column: &str,
    value_column: &str,
    value_type: DataType,
) -> Result<SchemaRef> {
    if key_column == value_column {
        return Err(FerrumReducerError::SchemaMismatchError(format!(
            "key and value column are both '{}'",
            key_column
        )));
    }
    let key_field = input.field_with_name(key_column).map_err(|_| {
        FerrumReducerError::SchemaMismatchError(format!("column '{}' not found", key_column))
    })?;
    Ok(Arc::new(Schema::new(vec![
        key_field.clone(),
        Field::new(value_column, value_type, false),
    ])))
}

/// Validates a group and returns its key column index.
pub(crate) fn group_key_index(group: &RecordBatch, key_column: &str) -> Result<usize> {
    let key_index = column_index(group, key_column)?;
    if group.num_rows() == 0 {
        return Err(FerrumReducerError::EmptyGroupError(format!(
            "no rows to reduce for key column '{}'",
            key_column
        )));
    }
    ensure_single_key(group, key_index)?;
    Ok(key_index)
}

/// One-row batch holding the group's key and `value`.
pub(crate) fn emit(
    schema: SchemaRef,
    group: &RecordBatch,
    key_index: usize,
    value: ArrayRef,
) -> Result<RecordBatch> {
    let key = group.column(key_index).slice(0, 1);
    Ok(RecordBatch::try_new(schema, vec![key, value])?)
}

/// The value column as `Utf8`; large and view string columns are cast down.
fn string_values(group: &RecordBatch, value_column: &str) -> Result<StringArray> {
    let column = group.column(column_index(group, value_column)?);
    match column.data_type() {
        DataType::Utf8 => Ok(column.as_string::<i32>().clone()),
        DataType::LargeUtf8 | DataType::Utf8View => {
            Ok(cast(column.as_ref(), &DataType::Utf8)?.as_string::<i32>().clone())
        }
        other => Err(FerrumReducerError::SchemaMismatchError(format!(
            "value column '{}' has type {}, expected Utf8, LargeUtf8 or Utf8View",
            value_column, other
        ))),
    }
}

fn value_at<'a>(values: &'a StringArray, row: usize, value_column: &str) -> Result<&'a str> {
    if values.is_null(row) {
        return Err(FerrumReducerError::InvalidEncodingError(format!(
            "null value in column '{}' at row {}",
            value_column, row
        )));
    }
    Ok(values.value(row))
}

/// Keeps the value whose leading token parses to the smallest integer.
///
/// Rows are compared with `<=`, so among rows sharing the minimum the last
/// one wins. The winning value is emitted byte for byte as it was read.
pub fn reduce_min_by_encoded_prefix(
    group: &RecordBatch,
    key_column: &str,
    value_column: &str,
) -> Result<RecordBatch> {
    let schema = reduced_schema(group.schema_ref(), key_column, value_column, DataType::Utf8)?;
    let key_index = group_key_index(group, key_column)?;
    let values = string_values(group, value_column)?;

    let mut winner: Option<(i64, &str)> = None;
    for row in 0..values.len() {
        let current = value_at(&values, row, value_column)?;
        let prefix = numeric_prefix(current)?;
        if winner.map_or(true, |(min, _)| prefix <= min) {
            winner = Some((prefix, current));
        }
    }

    let (_, encoded) = winner.ok_or_else(|| {
        FerrumReducerError::EmptyGroupError(format!("no values in column '{}'", value_column))
    })?;
    emit(
        schema,
        group,
        key_index,
        Arc::new(StringArray::from(vec![encoded])),
    )
}

/// Decodes every value of the group and re-encodes them, in row order, as one list.
pub fn reduce_concat_encoded(
    group: &RecordBatch,
    key_column: &str,
    value_column: &str,
) -> Result<RecordBatch> {
    let schema = reduced_schema(group.schema_ref(), key_column, value_column, DataType::Utf8)?;
    let key_index = group_key_index(group, key_column)?;
    let values = string_values(group, value_column)?;

    let tuples = (0..values.len())
        .map(|row| decode_tuple(value_at(&values, row, value_column)?))
        .collect::<Result<Vec<_>>>()?;

    let encoded = encode_tuples(&tuples)?;
    emit(
        schema,
        group,
        key_index,
        Arc::new(StringArray::from(vec![encoded])),
    )
}
