use arrow::error::ArrowError;
use serde_xml_rs::Error;
use std::fmt;
use tokio::task::JoinError;

#[derive(Debug, PartialEq)]
pub enum FerrumReducerError {
    ConfigError(String),
    InvalidEncodingError(String),
    SchemaMismatchError(String),
    GroupKeyError(String),
    EmptyGroupError(String),
    ArrowError(String),
    IoError(String),
    TaskError(String),
}

impl fmt::Display for FerrumReducerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FerrumReducerError::ConfigError(msg) => write!(f, "config error: {}", msg),
            FerrumReducerError::InvalidEncodingError(msg) => {
                write!(f, "invalid encoding: {}", msg)
            }
            FerrumReducerError::SchemaMismatchError(msg) => write!(f, "schema mismatch: {}", msg),
            FerrumReducerError::GroupKeyError(msg) => write!(f, "group key error: {}", msg),
            FerrumReducerError::EmptyGroupError(msg) => write!(f, "empty group: {}", msg),
            FerrumReducerError::ArrowError(msg) => write!(f, "arrow error: {}", msg),
            FerrumReducerError::IoError(msg) => write!(f, "io error: {}", msg),
            FerrumReducerError::TaskError(msg) => write!(f, "task error: {}", msg),
        }
    }
}

impl std::error::Error for FerrumReducerError {}

impl From<Error> for FerrumReducerError {
    fn from(value: Error) -> Self {
        FerrumReducerError::ConfigError(value.to_string())
    }
}

impl From<serde_json::Error> for FerrumReducerError {
    fn from(value: serde_json::Error) -> Self {
        FerrumReducerError::InvalidEncodingError(value.to_string())
    }
}

impl From<ArrowError> for FerrumReducerError {
    fn from(value: ArrowError) -> Self {
        match value {
            // a missing column surfaces from Schema::index_of as SchemaError
            ArrowError::SchemaError(msg) => FerrumReducerError::SchemaMismatchError(msg),
            other => FerrumReducerError::ArrowError(other.to_string()),
        }
    }
}

impl From<std::io::Error> for FerrumReducerError {
    fn from(value: std::io::Error) -> Self {
        FerrumReducerError::IoError(value.to_string())
    }
}

impl From<JoinError> for FerrumReducerError {
    fn from(value: JoinError) -> Self {
        FerrumReducerError::TaskError(value.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FerrumReducerError>;
