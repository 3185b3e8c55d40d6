use crate::api::reduce::Reducer;
use crate::core::grouped_reducer::{GroupedColumnReducer, ReductionPolicy};
use crate::core::job::JobStatus;
use crate::core::partition::partition_by_key;
use crate::framework::errors::{FerrumReducerError, Result};
use crate::framework::refinery::Refinery;
use crate::tests::{int_at, keyed_batch, string_at, KEY, VAL};
use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

fn min_reducer() -> Arc<dyn Reducer> {
    Arc::new(GroupedColumnReducer::new(ReductionPolicy::MinByEncodedPrefix))
}

fn concat_reducer() -> Arc<dyn Reducer> {
    Arc::new(GroupedColumnReducer::new(ReductionPolicy::ConcatEncoded))
}

/// Claims a Utf8 value column but emits a batch with the value column renamed.
struct MislabelledReducer;

impl Reducer for MislabelledReducer {
    fn output_schema(&self, input: &SchemaRef, key_column: &str, _: &str) -> Result<SchemaRef> {
        let key = input.field_with_name(key_column).unwrap().clone();
        Ok(Arc::new(Schema::new(vec![
            key,
            Field::new("expected", DataType::Utf8, false),
        ])))
    }

    fn reduce(&self, group: &RecordBatch, key_column: &str, _: &str) -> Result<RecordBatch> {
        let index = group.schema().index_of(key_column).unwrap();
        let key_field = group.schema().field(index).clone();
        let schema = Arc::new(Schema::new(vec![
            key_field,
            Field::new("actual", DataType::Utf8, false),
        ]));
        Ok(RecordBatch::try_new(
            schema,
            vec![
                group.column(index).slice(0, 1),
                Arc::new(StringArray::from(vec!["x"])) as ArrayRef,
            ],
        )?)
    }
}

#[test]
fn partitions_keep_first_appearance_and_row_order() {
    let batch = keyed_batch(&[(3, "a"), (1, "b"), (3, "c"), (2, "d"), (1, "e")]);

    let groups = assert_ok!(partition_by_key(&batch, KEY));

    assert_eq!(groups.len(), 3);
    let keys: Vec<i64> = groups.iter().map(|g| int_at(g, KEY, 0)).collect();
    assert_eq!(keys, vec![3, 1, 2]);
    assert_eq!(string_at(&groups[0], VAL, 0), "a");
    assert_eq!(string_at(&groups[0], VAL, 1), "c");
    assert_eq!(string_at(&groups[1], VAL, 1), "e");
    assert_eq!(groups[2].num_rows(), 1);
}

#[test]
fn partitions_collect_null_keys_together() {
    let schema = Arc::new(Schema::new(vec![
        Field::new(KEY, DataType::Utf8, true),
        Field::new(VAL, DataType::Utf8, false),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(vec![None, Some("k"), None])) as ArrayRef,
            Arc::new(StringArray::from(vec!["a", "b", "c"])),
        ],
    )
    .unwrap();

    let groups = assert_ok!(partition_by_key(&batch, KEY));

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].num_rows(), 2);
    assert_eq!(string_at(&groups[0], VAL, 1), "c");
}

#[tokio::test]
async fn refine_emits_one_row_per_key() {
    let refinery = Refinery::new(4).unwrap();
    let batch = keyed_batch(&[
        (5, r#"["10","a"]"#),
        (6, r#"["3","z"]"#),
        (5, r#"["7","b"]"#),
        (5, r#"["7","c"]"#),
        (6, r#"["4","y"]"#),
    ]);

    let reduced = assert_ok!(refinery.refine(batch, KEY, VAL, min_reducer()).await);

    assert_eq!(reduced.num_rows(), 2);
    assert_eq!(int_at(&reduced, KEY, 0), 5);
    assert_eq!(string_at(&reduced, VAL, 0), r#"["7","c"]"#);
    assert_eq!(int_at(&reduced, KEY, 1), 6);
    assert_eq!(string_at(&reduced, VAL, 1), r#"["3","z"]"#);

    let history = refinery.history().await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, JobStatus::Completed);
    assert_eq!(history[0].num_groups, 2);
    assert_eq!(history[0].input_rows, 5);
    assert_eq!(history[0].output_rows, 2);
    assert!(history[0].elapsed().is_some());
}

#[tokio::test]
async fn refine_with_a_single_slot_matches_wide_parallelism() {
    let rows: Vec<(i32, String)> = (0..64)
        .map(|i| (i % 7, format!(r#"["{}","v{}"]"#, i, i)))
        .collect();
    let rows: Vec<(i32, &str)> = rows.iter().map(|(k, v)| (*k, v.as_str())).collect();

    let narrow = Refinery::new(1).unwrap();
    let wide = Refinery::new(16).unwrap();
    let expected = assert_ok!(narrow.refine(keyed_batch(&rows), KEY, VAL, concat_reducer()).await);
    let actual = assert_ok!(wide.refine(keyed_batch(&rows), KEY, VAL, concat_reducer()).await);

    assert_eq!(expected.num_rows(), 7);
    assert_eq!(expected, actual);
}

#[tokio::test]
async fn one_bad_group_fails_the_whole_refine() {
    let refinery = Refinery::new(2).unwrap();
    let batch = keyed_batch(&[(1, r#"["1","a"]"#), (2, "not-json"), (3, r#"["2","c"]"#)]);

    let err = assert_err!(refinery.refine(batch, KEY, VAL, min_reducer()).await);

    assert!(matches!(err, FerrumReducerError::InvalidEncodingError(_)));
    let history = refinery.history().await;
    assert_eq!(history[0].status, JobStatus::Failed);
    assert!(history[0].error.is_some());
}

#[tokio::test]
async fn empty_input_yields_an_empty_table() {
    let refinery = Refinery::new(2).unwrap();

    let reduced = assert_ok!(refinery.refine(keyed_batch(&[]), KEY, VAL, concat_reducer()).await);

    assert_eq!(reduced.num_rows(), 0);
    assert_eq!(reduced.schema().field(0).name(), KEY);
    assert_eq!(reduced.schema().field(1).name(), VAL);
}

#[tokio::test]
async fn output_schema_drift_is_reported() {
    let refinery = Refinery::new(2).unwrap();
    let batch = keyed_batch(&[(1, "a")]);

    let err = assert_err!(
        refinery
            .refine(batch, KEY, VAL, Arc::new(MislabelledReducer))
            .await
    );

    assert!(matches!(err, FerrumReducerError::SchemaMismatchError(_)));
}

#[tokio::test]
async fn missing_key_column_fails_before_dispatch() {
    let refinery = Refinery::new(2).unwrap();

    let err = assert_err!(
        refinery
            .refine(keyed_batch(&[(1, "a")]), "nope", VAL, min_reducer())
            .await
    );

    assert!(matches!(err, FerrumReducerError::SchemaMismatchError(_)));
    assert_eq!(refinery.history().await[0].num_groups, 0);
}

#[test]
fn zero_parallelism_is_a_config_error() {
    assert!(matches!(
        Refinery::new(0),
        Err(FerrumReducerError::ConfigError(_))
    ));
}

#[tokio::test]
async fn history_keeps_only_the_most_recent_jobs() {
    let refinery = Refinery::new(2).unwrap().with_history_limit(2);

    for rows in 1..=3 {
        let batch = keyed_batch(&vec![(1, r#"["1","a"]"#); rows]);
        assert_ok!(refinery.refine(batch, KEY, VAL, min_reducer()).await);
    }

    let history = refinery.history().await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].input_rows, 2);
    assert_eq!(history[1].input_rows, 3);
}

#[tokio::test]
async fn draining_history_empties_it() {
    let refinery = Refinery::new(2).unwrap();
    assert_ok!(
        refinery
            .refine(keyed_batch(&[(1, r#"["1","a"]"#)]), KEY, VAL, min_reducer())
            .await
    );

    let drained = refinery.drain_history().await;

    assert_eq!(drained.len(), 1);
    assert_eq!(drained[0].status, JobStatus::Completed);
    assert!(refinery.history().await.is_empty());
}
