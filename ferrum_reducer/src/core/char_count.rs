use crate::api::map::Mapper;
use crate::api::reduce::Reducer;
use crate::core::grouped_reducer::{emit, group_key_index, reduced_schema};
use crate::core::partition::column_index;
use crate::framework::errors::{FerrumReducerError, Result};
use crate::framework::refinery::Refinery;
use arrow::array::{Array, ArrayRef, AsArray, Int64Array, StringBuilder, UInt32Array};
use arrow::compute::{lexsort_to_indices, take_record_batch, SortColumn, SortOptions};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;
use tracing::info;

pub const WORD_COLUMN: &str = "word";
pub const CHARACTER_COLUMN: &str = "character";
pub const COUNT_COLUMN: &str = "count";

/// Explodes every `word` into one `character` row per char.
pub struct CharacterSplitter;

impl Mapper for CharacterSplitter {
    fn map(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        let column = batch.column(column_index(batch, WORD_COLUMN)?);
        let words = column.as_string_opt::<i32>().ok_or_else(|| {
            FerrumReducerError::SchemaMismatchError(format!(
                "column '{}' has type {}, expected Utf8",
                WORD_COLUMN,
                column.data_type()
            ))
        })?;

        let mut characters = StringBuilder::new();
        let mut buf = [0u8; 4];
        for word in words.iter().flatten() {
            for c in word.chars() {
                characters.append_value(c.encode_utf8(&mut buf));
            }
        }

        let schema = Arc::new(Schema::new(vec![Field::new(
            CHARACTER_COLUMN,
            DataType::Utf8,
            false,
        )]));
        Ok(RecordBatch::try_new(
            schema,
            vec![Arc::new(characters.finish()) as ArrayRef],
        )?)
    }
}

/// Emits the group key and how many rows carried it. The value column
/// argument names the emitted count column.
pub struct CountReducer;

impl Reducer for CountReducer {
    fn output_schema(
        &self,
        input: &SchemaRef,
        key_column: &str,
        value_column: &str,
    ) -> Result<SchemaRef> {
        reduced_schema(input, key_column, value_column, DataType::Int64)
    }

    fn reduce(
        &self,
        group: &RecordBatch,
        key_column: &str,
        value_column: &str,
    ) -> Result<RecordBatch> {
        let schema = self.output_schema(group.schema_ref(), key_column, value_column)?;
        let key_index = group_key_index(group, key_column)?;
        let count = Int64Array::from(vec![group.num_rows() as i64]);
        emit(schema, group, key_index, Arc::new(count))
    }
}

/// Orders `batch` by `column` descending. Ties keep their input order.
pub fn sort_descending(batch: &RecordBatch, column: &str) -> Result<RecordBatch> {
    let values = Arc::clone(batch.column(column_index(batch, column)?));
    let positions: ArrayRef = Arc::new(UInt32Array::from_iter_values(
        0..batch.num_rows() as u32,
    ));
    let indices = lexsort_to_indices(
        &[
            SortColumn {
                values,
                options: Some(SortOptions {
                    descending: true,
                    nulls_first: false,
                }),
            },
            SortColumn {
                values: positions,
                options: None,
            },
        ],
        None,
    )?;
    Ok(take_record_batch(batch, &indices)?)
}

/// Counts characters across a column of words, most frequent first.
pub struct CharacterCount {
    refinery: Refinery,
}

impl CharacterCount {
    pub fn new(refinery: Refinery) -> Self {
        CharacterCount { refinery }
    }

    pub async fn run(&self, words: &RecordBatch) -> Result<RecordBatch> {
        let characters = CharacterSplitter.map(words)?;
        info!(
            "char count: {} words exploded into {} characters",
            words.num_rows(),
            characters.num_rows()
        );

        let counts = self
            .refinery
            .refine(
                characters,
                CHARACTER_COLUMN,
                COUNT_COLUMN,
                Arc::new(CountReducer),
            )
            .await?;
        sort_descending(&counts, COUNT_COLUMN)
    }
}
