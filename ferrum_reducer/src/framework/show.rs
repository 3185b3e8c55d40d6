use crate::framework::errors::Result;
use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use arrow::util::pretty::pretty_format_batches;
use std::sync::Arc;

fn type_name(data_type: &DataType) -> String {
    match data_type {
        DataType::Utf8 | DataType::LargeUtf8 => "string".to_string(),
        DataType::Int8 => "byte".to_string(),
        DataType::Int16 => "short".to_string(),
        DataType::Int32 => "integer".to_string(),
        DataType::Int64 => "long".to_string(),
        DataType::Float32 => "float".to_string(),
        DataType::Float64 => "double".to_string(),
        DataType::Boolean => "boolean".to_string(),
        other => other.to_string().to_lowercase(),
    }
}

/// Renders a schema as an indented tree:
///
/// ```text
/// root
///  |-- _1: integer (nullable = false)
///  |-- _2: string (nullable = false)
/// ```
pub fn schema_tree(schema: &Schema) -> String {
    let mut tree = String::from("root\n");
    for field in schema.fields() {
        tree.push_str(&format!(
            " |-- {}: {} (nullable = {})\n",
            field.name(),
            type_name(field.data_type()),
            field.is_nullable()
        ));
    }
    tree
}

fn truncate_cell(cell: String, truncate: usize) -> String {
    if truncate == 0 || cell.chars().count() <= truncate {
        return cell;
    }
    if truncate < 4 {
        return cell.chars().take(truncate).collect();
    }
    let kept: String = cell.chars().take(truncate - 3).collect();
    format!("{}...", kept)
}

/// Renders the first `num_rows` rows of `batch` as a table. Cells longer than
/// `truncate` characters are cut short; zero disables truncation.
pub fn show(batch: &RecordBatch, num_rows: usize, truncate: usize) -> Result<String> {
    let shown = batch.slice(0, num_rows.min(batch.num_rows()));
    let options = FormatOptions::default().with_null("null");

    let mut fields = Vec::with_capacity(shown.num_columns());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(shown.num_columns());
    for (field, column) in shown.schema().fields().iter().zip(shown.columns()) {
        let formatter = ArrayFormatter::try_new(column.as_ref(), &options)?;
        let cells: StringArray = (0..shown.num_rows())
            .map(|row| Some(truncate_cell(formatter.value(row).to_string(), truncate)))
            .collect();
        fields.push(Field::new(field.name(), DataType::Utf8, false));
        columns.push(Arc::new(cells));
    }

    let table = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
    let mut rendered = pretty_format_batches(&[table])?.to_string();
    if batch.num_rows() > num_rows {
        rendered.push_str(&format!("\nonly showing top {} rows", num_rows));
    }
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_like_a_console_table() {
        assert_eq!(truncate_cell("abcdefgh".to_string(), 6), "abc...");
        assert_eq!(truncate_cell("abcdefgh".to_string(), 3), "abc");
        assert_eq!(truncate_cell("abc".to_string(), 6), "abc");
        assert_eq!(truncate_cell("abcdefgh".to_string(), 0), "abcdefgh");
    }
}
