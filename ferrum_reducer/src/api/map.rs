use crate::framework::errors::Result;
use arrow::record_batch::RecordBatch;

// Mapper is a row-wise projection, entire batch is already in memory
pub trait Mapper: Send + Sync {
    fn map(&self, batch: &RecordBatch) -> Result<RecordBatch>;
}
