mod refinery_tests;

use arrow::array::{ArrayRef, Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

pub(crate) const KEY: &str = "key";
pub(crate) const VAL: &str = "val";

/// Batch of `(key, val)` rows with an Int32 key and Utf8 value column.
pub(crate) fn keyed_batch(rows: &[(i32, &str)]) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new(KEY, DataType::Int32, false),
        Field::new(VAL, DataType::Utf8, true),
    ]));
    let keys = Int32Array::from(rows.iter().map(|(key, _)| *key).collect::<Vec<_>>());
    let vals = StringArray::from(rows.iter().map(|(_, val)| *val).collect::<Vec<_>>());
    RecordBatch::try_new(schema, vec![Arc::new(keys) as ArrayRef, Arc::new(vals)]).unwrap()
}

pub(crate) fn string_at(batch: &RecordBatch, column: &str, row: usize) -> String {
    use arrow::array::AsArray;
    batch
        .column(batch.schema().index_of(column).unwrap())
        .as_string::<i32>()
        .value(row)
        .to_string()
}

pub(crate) fn int_at(batch: &RecordBatch, column: &str, row: usize) -> i64 {
    use arrow::array::AsArray;
    use arrow::compute::cast;
    let column = batch.column(batch.schema().index_of(column).unwrap());
    let ints = cast(column.as_ref(), &DataType::Int64).unwrap();
    ints.as_primitive::<arrow::datatypes::Int64Type>().value(row)
}
