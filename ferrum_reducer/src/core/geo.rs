//! Reverse-IP geo lookup table.
//!
//! Raw ranges `(FirstOctet, SecondOctet, MinThirdOctet, MaxThirdOctet,
//! CountryIsoCode, CityName)` are folded into one row per `/16` prefix
//! (`FirstOctet * 256 + SecondOctet`), whose value lists every third-octet
//! range under that prefix as `[max_third_octet, [min_third_octet, country, city]]`.
//!
//! Two passes through the refinery do the work:
//!
//! 1. rows keyed by `[key_octet, max_third_octet]` keep the range with the
//!    smallest `min_third_octet`;
//! 2. rows keyed by `key_octet` are concatenated into the final list.

use crate::api::map::Mapper;
use crate::core::encoding::{decode_int_tuple, encode_tuple};
use crate::core::grouped_reducer::{GroupedColumnReducer, ReductionPolicy};
use crate::core::partition::column_index;
use crate::framework::errors::{FerrumReducerError, Result};
use crate::framework::refinery::Refinery;
use arrow::array::{
    Array, ArrayRef, AsArray, Int32Builder, Int64Array, StringArray, StringBuilder,
};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Int64Type, Schema};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;
use tracing::info;

pub const FIRST_OCTET: &str = "FirstOctet";
pub const SECOND_OCTET: &str = "SecondOctet";
pub const MIN_THIRD_OCTET: &str = "MinThirdOctet";
pub const MAX_THIRD_OCTET: &str = "MaxThirdOctet";
pub const COUNTRY_ISO_CODE: &str = "CountryIsoCode";
pub const CITY_NAME: &str = "CityName";

pub const KEY_COLUMN: &str = "_1";
pub const VALUE_COLUMN: &str = "_2";

fn cast_column(batch: &RecordBatch, name: &str, to: &DataType) -> Result<ArrayRef> {
    let column = batch.column(column_index(batch, name)?);
    Ok(cast(column.as_ref(), to)?)
}

/// Integer text as a delimited file carries it: surrounding whitespace is
/// ignored and a fractional part is truncated.
fn parse_octet(text: &str) -> Option<i64> {
    let text = text.trim();
    text.parse::<i64>().ok().or_else(|| {
        text.parse::<f64>()
            .ok()
            .filter(|value| value.is_finite() && value.abs() < i64::MAX as f64)
            .map(|value| value.trunc() as i64)
    })
}

/// Octet column as Int64; unparseable text becomes null.
fn octet_column(batch: &RecordBatch, name: &str) -> Result<ArrayRef> {
    let column = batch.column(column_index(batch, name)?);
    match column.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => {
            let text = cast(column.as_ref(), &DataType::Utf8)?;
            let octets: Int64Array = text
                .as_string::<i32>()
                .iter()
                .map(|value| value.and_then(parse_octet))
                .collect();
            Ok(Arc::new(octets))
        }
        _ => Ok(cast(column.as_ref(), &DataType::Int64)?),
    }
}

fn octet(column: &ArrayRef, name: &str, row: usize) -> Result<i64> {
    let octets = column.as_primitive::<Int64Type>();
    if octets.is_null(row) {
        return Err(FerrumReducerError::InvalidEncodingError(format!(
            "{} at row {} is missing or not an integer",
            name, row
        )));
    }
    Ok(octets.value(row))
}

/// `first * 256 + second`, refusing octets too large to combine.
fn combine_octets(first: i64, second: i64, row: usize) -> Result<i64> {
    first
        .checked_mul(256)
        .and_then(|shifted| shifted.checked_add(second))
        .ok_or_else(|| {
            FerrumReducerError::InvalidEncodingError(format!(
                "key octet {} * 256 + {} at row {} overflows",
                first, second, row
            ))
        })
}

fn text<'a>(column: &'a ArrayRef, row: usize) -> &'a str {
    let values = column.as_string::<i32>();
    if values.is_null(row) {
        ""
    } else {
        values.value(row)
    }
}

fn encoded_pair_schema(key_type: DataType) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new(KEY_COLUMN, key_type, false),
        Field::new(VALUE_COLUMN, DataType::Utf8, false),
    ]))
}

/// Encodes raw geo ranges into `_1 = [key_octet, max_third_octet]` and
/// `_2 = [min_third_octet, country, city]`.
///
/// Octet columns may be integers or text; text that does not parse as a
/// number, or octets whose key would overflow, are encoding errors.
pub struct GeoRangeEncoder;

impl Mapper for GeoRangeEncoder {
    fn map(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        let first = octet_column(batch, FIRST_OCTET)?;
        let second = octet_column(batch, SECOND_OCTET)?;
        let min_third = octet_column(batch, MIN_THIRD_OCTET)?;
        let max_third = octet_column(batch, MAX_THIRD_OCTET)?;
        let country = cast_column(batch, COUNTRY_ISO_CODE, &DataType::Utf8)?;
        let city = cast_column(batch, CITY_NAME, &DataType::Utf8)?;

        let mut keys = StringBuilder::new();
        let mut values = StringBuilder::new();
        for row in 0..batch.num_rows() {
            let key_octet = combine_octets(
                octet(&first, FIRST_OCTET, row)?,
                octet(&second, SECOND_OCTET, row)?,
                row,
            )?;
            let low = octet(&min_third, MIN_THIRD_OCTET, row)?;
            let high = octet(&max_third, MAX_THIRD_OCTET, row)?;
            let (low, high) = if low <= high { (low, high) } else { (high, low) };

            keys.append_value(encode_tuple(&[key_octet, high])?);
            values.append_value(encode_tuple(&[
                low.to_string(),
                text(&country, row).to_string(),
                text(&city, row).to_string(),
            ])?);
        }

        Ok(RecordBatch::try_new(
            encoded_pair_schema(DataType::Utf8),
            vec![
                Arc::new(keys.finish()) as ArrayRef,
                Arc::new(values.finish()) as ArrayRef,
            ],
        )?)
    }
}

/// Turns `_1 = [key_octet, max_third_octet]`, `_2 = range` into the
/// dictionary entry `_1 = key_octet`, `_2 = [max_third_octet, range]`.
pub struct DictionaryEntryEncoder;

impl Mapper for DictionaryEntryEncoder {
    fn map(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        let keys = string_column(batch, KEY_COLUMN)?;
        let values = string_column(batch, VALUE_COLUMN)?;

        let mut key_octets = Int32Builder::with_capacity(batch.num_rows());
        let mut entries = StringBuilder::new();
        for row in 0..batch.num_rows() {
            if keys.is_null(row) || values.is_null(row) {
                return Err(FerrumReducerError::InvalidEncodingError(format!(
                    "null dictionary entry at row {}",
                    row
                )));
            }
            let pair = decode_int_tuple(keys.value(row))?;
            let (key_octet, max_third) = match pair.as_slice() {
                [key_octet, max_third, ..] => (*key_octet, *max_third),
                _ => {
                    return Err(FerrumReducerError::InvalidEncodingError(format!(
                        "'{}' does not hold a key octet and a max third octet",
                        keys.value(row)
                    )))
                }
            };
            let key_octet = i32::try_from(key_octet).map_err(|_| {
                FerrumReducerError::InvalidEncodingError(format!(
                    "key octet {} does not fit a 32-bit integer",
                    key_octet
                ))
            })?;

            key_octets.append_value(key_octet);
            entries.append_value(encode_tuple(&[
                max_third.to_string(),
                values.value(row).to_string(),
            ])?);
        }

        Ok(RecordBatch::try_new(
            encoded_pair_schema(DataType::Int32),
            vec![
                Arc::new(key_octets.finish()) as ArrayRef,
                Arc::new(entries.finish()) as ArrayRef,
            ],
        )?)
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    let column = batch.column(column_index(batch, name)?);
    column.as_string_opt::<i32>().ok_or_else(|| {
        FerrumReducerError::SchemaMismatchError(format!(
            "column '{}' has type {}, expected Utf8",
            name,
            column.data_type()
        ))
    })
}

/// Builds the geo lookup table from raw ranges.
pub struct GeoLookup {
    refinery: Refinery,
}

impl GeoLookup {
    pub fn new(refinery: Refinery) -> Self {
        GeoLookup { refinery }
    }

    pub fn refinery(&self) -> &Refinery {
        &self.refinery
    }

    pub async fn run(&self, ranges: &RecordBatch) -> Result<RecordBatch> {
        let encoded = GeoRangeEncoder.map(ranges)?;
        info!("geo lookup: encoded {} ranges", encoded.num_rows());

        let narrowest = self
            .refinery
            .refine(
                encoded,
                KEY_COLUMN,
                VALUE_COLUMN,
                Arc::new(GroupedColumnReducer::new(ReductionPolicy::MinByEncodedPrefix)),
            )
            .await?;

        let entries = DictionaryEntryEncoder.map(&narrowest)?;
        self.refinery
            .refine(
                entries,
                KEY_COLUMN,
                VALUE_COLUMN,
                Arc::new(GroupedColumnReducer::new(ReductionPolicy::ConcatEncoded)),
            )
            .await
    }
}
