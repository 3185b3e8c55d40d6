use crate::framework::errors::Result;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;

/// A Reducer receives every row that shares one group key and folds them into
/// the rows handed back to the refinery, normally exactly one.
///
/// Invocations are independent of each other, so a refinery is free to run
/// them concurrently on separate groups.
pub trait Reducer: Send + Sync {
    /// Schema of the batches `reduce` returns for an input of `input` schema.
    fn output_schema(
        &self,
        input: &SchemaRef,
        key_column: &str,
        value_column: &str,
    ) -> Result<SchemaRef>;

    fn reduce(
        &self,
        group: &RecordBatch,
        key_column: &str,
        value_column: &str,
    ) -> Result<RecordBatch>;
}
