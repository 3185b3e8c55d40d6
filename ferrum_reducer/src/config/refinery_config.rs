use crate::core::grouped_reducer::ReductionPolicy;
use crate::framework::errors::FerrumReducerError;

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RefineryConfig {
    #[serde(rename = "key.column")]
    pub key_column: String,

    #[serde(rename = "value.column")]
    pub value_column: String,

    #[serde(rename = "reduction.policy")]
    pub reduction_policy: String,

    #[serde(rename = "max.parallel.groups")]
    pub max_parallel_groups: usize,

    #[serde(rename = "input.delimiter")]
    pub input_delimiter: String,

    #[serde(rename = "input.header")]
    pub input_header: bool,

    #[serde(rename = "show.rows")]
    pub show_rows: usize,

    #[serde(rename = "show.truncate")]
    pub show_truncate: usize,
}

impl Default for RefineryConfig {
    fn default() -> Self {
        RefineryConfig {
            key_column: "_1".to_string(),
            value_column: "_2".to_string(),
            reduction_policy: ReductionPolicy::MinByEncodedPrefix.to_string(),
            max_parallel_groups: 40,
            input_delimiter: "\\t".to_string(),
            input_header: true,
            show_rows: 50,
            show_truncate: 50,
        }
    }
}

impl RefineryConfig {
    pub fn from_xml_file(file_path: &str) -> Result<Self, FerrumReducerError> {
        let xml_str = std::fs::read_to_string(file_path).map_err(|err| {
            FerrumReducerError::ConfigError(format!("cannot read {}: {}", file_path, err))
        })?;
        Self::from_xml_str(&xml_str)
    }

    pub fn from_xml_str(xml_str: &str) -> Result<Self, FerrumReducerError> {
        let config: RefineryConfig = serde_xml_rs::from_str(xml_str)?;
        if config.max_parallel_groups == 0 {
            return Err(FerrumReducerError::ConfigError(
                "max.parallel.groups must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn policy(&self) -> Result<ReductionPolicy, FerrumReducerError> {
        self.reduction_policy.parse()
    }

    /// `\t` and `tab` name the tab character; anything else must be one ASCII character.
    pub fn delimiter_byte(&self) -> Result<u8, FerrumReducerError> {
        match self.input_delimiter.as_str() {
            "\\t" | "tab" | "\t" => Ok(b'\t'),
            other if other.len() == 1 && other.is_ascii() => Ok(other.as_bytes()[0]),
            other => Err(FerrumReducerError::ConfigError(format!(
                "input.delimiter '{}' is not a single ASCII character",
                other
            ))),
        }
    }
}
