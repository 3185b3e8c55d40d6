use crate::framework::errors::FerrumReducerError;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// A Job is one refine over a batch: the batch is split by key into groups,
/// every group is reduced, and the outputs are stitched back together.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub key_column: String,
    pub value_column: String,
    pub status: JobStatus,
    pub num_groups: usize,
    pub input_rows: usize,
    pub output_rows: usize,
    pub start_time: Option<Instant>,
    pub end_time: Option<Instant>,
    pub error: Option<String>,
}

impl Job {
    pub fn new(key_column: &str, value_column: &str, input_rows: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            key_column: key_column.to_string(),
            value_column: value_column.to_string(),
            status: JobStatus::Pending,
            num_groups: 0,
            input_rows,
            output_rows: 0,
            start_time: None,
            end_time: None,
            error: None,
        }
    }

    pub fn start(&mut self, num_groups: usize) {
        self.num_groups = num_groups;
        self.status = JobStatus::InProgress;
        self.start_time = Some(Instant::now());
    }

    pub fn complete(&mut self, output_rows: usize) {
        self.output_rows = output_rows;
        self.status = JobStatus::Completed;
        self.end_time = Some(Instant::now());
    }

    pub fn fail(&mut self, error: &FerrumReducerError) {
        self.error = Some(error.to_string());
        self.status = JobStatus::Failed;
        self.end_time = Some(Instant::now());
    }

    pub fn elapsed(&self) -> Option<Duration> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end.duration_since(start)),
            _ => None,
        }
    }
}
