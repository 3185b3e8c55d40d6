use arrow::array::{ArrayRef, Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use ferrum_reducer::core::geo::GeoLookup;
use ferrum_reducer::framework::errors::Result;
use ferrum_reducer::framework::refinery::Refinery;
use ferrum_reducer::framework::show::{schema_tree, show};
use std::sync::Arc;

fn sample_ranges() -> Result<RecordBatch> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("FirstOctet", DataType::Int32, false),
        Field::new("SecondOctet", DataType::Int32, false),
        Field::new("MinThirdOctet", DataType::Int32, false),
        Field::new("MaxThirdOctet", DataType::Int32, false),
        Field::new("CountryIsoCode", DataType::Utf8, true),
        Field::new("CityName", DataType::Utf8, true),
    ]));
    Ok(RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int32Array::from(vec![1, 1, 1, 1, 5])) as ArrayRef,
            Arc::new(Int32Array::from(vec![0, 0, 0, 0, 9])),
            Arc::new(Int32Array::from(vec![0, 64, 200, 128, 0])),
            Arc::new(Int32Array::from(vec![127, 127, 128, 255, 255])),
            Arc::new(StringArray::from(vec![
                Some("AU"),
                Some("AU"),
                Some("CN"),
                Some("CN"),
                Some("FR"),
            ])),
            Arc::new(StringArray::from(vec![
                Some("Sydney"),
                Some("Melbourne"),
                None,
                Some("Fuzhou"),
                Some("Paris"),
            ])),
        ],
    )?)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // create a refinery
    let refinery = Refinery::new(4)?;

    // build the lookup table
    let table = GeoLookup::new(refinery).run(&sample_ranges()?).await?;

    println!("{}", schema_tree(&table.schema()));
    println!("{}", show(&table, 50, 50)?);
    Ok(())
}
