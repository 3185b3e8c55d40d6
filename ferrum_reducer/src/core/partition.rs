use crate::framework::errors::{FerrumReducerError, Result};
use arrow::array::{ArrayRef, UInt32Array};
use arrow::compute::take_record_batch;
use arrow::record_batch::RecordBatch;
use arrow::row::{Row, RowConverter, Rows, SortField};
use std::collections::HashMap;
use std::sync::Arc;

/// Looks up a column by name, reporting the available columns when it is absent.
pub fn column_index(batch: &RecordBatch, name: &str) -> Result<usize> {
    let schema = batch.schema();
    schema.index_of(name).map_err(|_| {
        let available: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        FerrumReducerError::SchemaMismatchError(format!(
            "column '{}' not found, available columns: [{}]",
            name,
            available.join(", ")
        ))
    })
}

fn key_rows(column: &ArrayRef) -> Result<Rows> {
    let converter = RowConverter::new(vec![SortField::new(column.data_type().clone())])?;
    Ok(converter.convert_columns(&[Arc::clone(column)])?)
}

/// Splits `batch` into one batch per distinct value of `key_column`.
///
/// Groups come out in order of first appearance and rows inside a group keep
/// their input order. Null keys are collected into a single group.
pub fn partition_by_key(batch: &RecordBatch, key_column: &str) -> Result<Vec<RecordBatch>> {
    let key_index = column_index(batch, key_column)?;
    let rows = key_rows(batch.column(key_index))?;

    let mut positions: HashMap<Row<'_>, usize> = HashMap::new();
    let mut members: Vec<Vec<u32>> = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        let next = members.len();
        let group = *positions.entry(row).or_insert(next);
        if group == next {
            members.push(Vec::new());
        }
        members[group].push(index as u32);
    }

    members
        .into_iter()
        .map(|indices| Ok(take_record_batch(batch, &UInt32Array::from(indices))?))
        .collect()
}

/// Fails with a `GroupKeyError` unless every row of the key column holds the same value.
pub fn ensure_single_key(batch: &RecordBatch, key_index: usize) -> Result<()> {
    let rows = key_rows(batch.column(key_index))?;
    let mut iter = rows.iter();
    if let Some(first) = iter.next() {
        if let Some(offset) = iter.position(|row| row != first) {
            return Err(FerrumReducerError::GroupKeyError(format!(
                "row {} of column '{}' carries a different key than row 0",
                offset + 1,
                batch.schema().field(key_index).name()
            )));
        }
    }
    Ok(())
}
