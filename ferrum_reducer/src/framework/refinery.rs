use crate::api::reduce::Reducer;
use crate::config::refinery_config::RefineryConfig;
use crate::core::job::Job;
use crate::core::partition::partition_by_key;
use crate::framework::errors::{FerrumReducerError, Result};
use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, error, info};

/// Jobs kept by a refinery unless told otherwise.
pub const DEFAULT_HISTORY_LIMIT: usize = 256;

/// In-process grouped apply: splits a batch by key, hands every group to a
/// reducer and reassembles the reduced rows.
pub struct Refinery {
    pub max_parallel_groups: usize,
    history_limit: usize,
    history: Arc<Mutex<VecDeque<Job>>>,
}

impl Refinery {
    pub fn new(max_parallel_groups: usize) -> Result<Self> {
        if max_parallel_groups == 0 {
            return Err(FerrumReducerError::ConfigError(
                "max parallel groups must be at least 1".to_string(),
            ));
        }
        Ok(Refinery {
            max_parallel_groups,
            history_limit: DEFAULT_HISTORY_LIMIT,
            history: Arc::new(Mutex::new(VecDeque::new())),
        })
    }

    /// Keeps at most `limit` finished jobs; older ones are dropped first.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn from_config(config: &RefineryConfig) -> Result<Self> {
        Self::new(config.max_parallel_groups)
    }

    /// Recent jobs, oldest first.
    pub async fn history(&self) -> Vec<Job> {
        self.history.lock().await.iter().cloned().collect()
    }

    /// Takes the recorded jobs, leaving the history empty.
    pub async fn drain_history(&self) -> Vec<Job> {
        self.history.lock().await.drain(..).collect()
    }

    /// Reduces every key group of `batch` with `reducer`.
    ///
    /// A failure in any group fails the whole refine; no partial table is
    /// returned.
    pub async fn refine(
        &self,
        batch: RecordBatch,
        key_column: &str,
        value_column: &str,
        reducer: Arc<dyn Reducer>,
    ) -> Result<RecordBatch> {
        let mut job = Job::new(key_column, value_column, batch.num_rows());
        info!(
            "job: {} refining {} rows on key '{}'",
            job.id,
            batch.num_rows(),
            key_column
        );

        let outcome = self
            .run(&mut job, batch, key_column, value_column, reducer)
            .await;

        match &outcome {
            Ok(output) => {
                job.complete(output.num_rows());
                info!(
                    "job: {} reduced {} groups into {} rows in {:?}",
                    job.id,
                    job.num_groups,
                    job.output_rows,
                    job.elapsed().unwrap_or_default()
                );
            }
            Err(err) => {
                job.fail(err);
                error!("job: {} failed: {}", job.id, err);
            }
        }

        let mut history = self.history.lock().await;
        history.push_back(job);
        while history.len() > self.history_limit {
            history.pop_front();
        }
        drop(history);
        outcome
    }

    async fn run(
        &self,
        job: &mut Job,
        batch: RecordBatch,
        key_column: &str,
        value_column: &str,
        reducer: Arc<dyn Reducer>,
    ) -> Result<RecordBatch> {
        let schema = reducer.output_schema(batch.schema_ref(), key_column, value_column)?;
        let groups = partition_by_key(&batch, key_column)?;
        job.start(groups.len());

        let permits = Arc::new(Semaphore::new(self.max_parallel_groups));
        let mut handles = Vec::with_capacity(groups.len());
        for (position, group) in groups.into_iter().enumerate() {
            let permit = permits
                .clone()
                .acquire_owned()
                .await
                .map_err(|err| FerrumReducerError::TaskError(err.to_string()))?;
            let reducer = Arc::clone(&reducer);
            let key_column = key_column.to_string();
            let value_column = value_column.to_string();

            // reducers are CPU-bound, keep them off the async workers
            handles.push(tokio::task::spawn_blocking(move || {
                let _permit = permit;
                debug!("group {} reducing {} rows", position, group.num_rows());
                reducer.reduce(&group, &key_column, &value_column)
            }));
        }

        let mut outputs = Vec::with_capacity(handles.len());
        for (position, handle) in handles.into_iter().enumerate() {
            let output = handle.await??;
            if output.schema() != schema {
                return Err(FerrumReducerError::SchemaMismatchError(format!(
                    "group {} produced schema {:?}, expected {:?}",
                    position,
                    output.schema(),
                    schema
                )));
            }
            outputs.push(output);
        }

        Ok(concat_batches(&schema, &outputs)?)
    }
}
