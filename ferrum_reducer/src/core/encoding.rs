//! Text encoding of small token tuples.
//!
//! Tuples travel through string columns as compact JSON arrays, e.g.
//! `["7","US","NY"]` or `[258,255]`. A collection of tuples is an array of
//! arrays: `[["x","US","NY"],["y","US","LA"]]`.

use crate::framework::errors::{FerrumReducerError, Result};
use serde::Serialize;

/// Decodes a tuple of string tokens.
pub fn decode_tuple(encoded: &str) -> Result<Vec<String>> {
    serde_json::from_str(encoded).map_err(|err| {
        FerrumReducerError::InvalidEncodingError(format!(
            "cannot decode '{}' as a string tuple: {}",
            encoded, err
        ))
    })
}

/// Decodes a tuple of integer tokens.
pub fn decode_int_tuple(encoded: &str) -> Result<Vec<i64>> {
    serde_json::from_str(encoded).map_err(|err| {
        FerrumReducerError::InvalidEncodingError(format!(
            "cannot decode '{}' as an integer tuple: {}",
            encoded, err
        ))
    })
}

/// Parses the first token of a string tuple as a signed integer.
pub fn numeric_prefix(encoded: &str) -> Result<i64> {
    let tokens = decode_tuple(encoded)?;
    let first = tokens.first().ok_or_else(|| {
        FerrumReducerError::InvalidEncodingError(format!("'{}' has no leading token", encoded))
    })?;
    first.trim().parse::<i64>().map_err(|err| {
        FerrumReducerError::InvalidEncodingError(format!(
            "leading token '{}' of '{}' is not an integer: {}",
            first, encoded, err
        ))
    })
}

pub fn encode_tuple<T: Serialize>(tokens: &[T]) -> Result<String> {
    Ok(serde_json::to_string(tokens)?)
}

pub fn encode_tuples(tuples: &[Vec<String>]) -> Result<String> {
    Ok(serde_json::to_string(tuples)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_string_tuple() {
        let tokens = decode_tuple(r#"["x","US","NY"]"#).unwrap();
        assert_eq!(tokens, vec!["x", "US", "NY"]);
    }

    #[test]
    fn rejects_numbers_where_strings_expected() {
        let err = decode_tuple("[1,2]").unwrap_err();
        assert!(matches!(err, FerrumReducerError::InvalidEncodingError(_)));
    }

    #[test]
    fn numeric_prefix_tolerates_padding_and_sign() {
        assert_eq!(numeric_prefix(r#"[" 12 ","a"]"#).unwrap(), 12);
        assert_eq!(numeric_prefix(r#"["-3","a"]"#).unwrap(), -3);
    }

    #[test]
    fn numeric_prefix_errors() {
        for bad in ["not-json", "[]", r#"["ten","a"]"#, "{}"] {
            assert!(
                matches!(
                    numeric_prefix(bad),
                    Err(FerrumReducerError::InvalidEncodingError(_))
                ),
                "expected failure for {}",
                bad
            );
        }
    }

    #[test]
    fn int_tuple_encoding_is_compact() {
        assert_eq!(encode_tuple(&[258i64, 255]).unwrap(), "[258,255]");
        assert_eq!(decode_int_tuple("[258, 255]").unwrap(), vec![258, 255]);
    }

    #[test]
    fn nested_tuples_survive_reencoding() {
        let text = r#"[["255","[\"7\",\"US\",\"NY\"]"],["127","é"]]"#;
        let tuples: Vec<Vec<String>> = serde_json::from_str(text).unwrap();
        assert_eq!(tuples[0][1], r#"["7","US","NY"]"#);
        assert_eq!(encode_tuples(&tuples).unwrap(), text);
    }
}
