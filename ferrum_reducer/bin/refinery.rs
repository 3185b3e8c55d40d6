use chrono::Local;
use clap::{Parser, Subcommand};
use ferrum_reducer::config::refinery_config::RefineryConfig;
use ferrum_reducer::core::char_count::CharacterCount;
use ferrum_reducer::core::geo::GeoLookup;
use ferrum_reducer::core::grouped_reducer::{GroupedColumnReducer, ReductionPolicy};
use ferrum_reducer::framework::refinery::Refinery;
use ferrum_reducer::framework::show::{schema_tree, show};
use ferrum_reducer::framework::source::{read_delimited, read_lines};
use arrow::record_batch::RecordBatch;
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// XML refinery configuration
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Group a delimited file by key and reduce each group's encoded values
    Reduce {
        #[arg(short, long)]
        input: String,
        #[arg(short, long)]
        policy: Option<ReductionPolicy>,
        #[arg(short, long)]
        key: Option<String>,
        #[arg(long)]
        value: Option<String>,
    },
    /// Build the reverse-IP geo lookup table from a delimited ranges file
    GeoLookup {
        #[arg(short, long)]
        input: String,
    },
    /// Count characters across the lines of a file, or stdin
    CharCount {
        #[arg(short, long)]
        input: Option<String>,
        #[arg(short, long, default_value_t = 100)]
        top: usize,
    },
}

fn print_table(batch: &RecordBatch, rows: usize, truncate: usize) -> anyhow::Result<()> {
    println!("{}", schema_tree(&batch.schema()));
    println!("{}", show(batch, rows, truncate)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // add logging
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_span_events(FmtSpan::CLOSE)
        .init();

    let config = match &args.config {
        Some(path) => RefineryConfig::from_xml_file(path)?,
        None => RefineryConfig::default(),
    };
    let refinery = Refinery::from_config(&config)?;

    let now = Local::now();
    info!("Time: {}", now.format("%Y-%m-%d %H:%M:%S"));

    match args.command {
        Commands::Reduce {
            input,
            policy,
            key,
            value,
        } => {
            let policy = match policy {
                Some(policy) => policy,
                None => config.policy()?,
            };
            let key = key.unwrap_or_else(|| config.key_column.clone());
            let value = value.unwrap_or_else(|| config.value_column.clone());

            let batch = read_delimited(&input, config.delimiter_byte()?, config.input_header)?;
            info!("read {} rows from {}", batch.num_rows(), input);

            let reduced = refinery
                .refine(
                    batch,
                    &key,
                    &value,
                    Arc::new(GroupedColumnReducer::new(policy)),
                )
                .await?;
            print_table(&reduced, config.show_rows, config.show_truncate)?;
        }
        Commands::GeoLookup { input } => {
            let batch = read_delimited(&input, config.delimiter_byte()?, config.input_header)?;
            info!("read {} ranges from {}", batch.num_rows(), input);

            let table = GeoLookup::new(refinery).run(&batch).await?;
            print_table(&table, config.show_rows, config.show_truncate)?;
        }
        Commands::CharCount { input, top } => {
            let words = match input {
                Some(path) => read_lines(BufReader::new(File::open(path)?), "word")?,
                None => read_lines(std::io::stdin().lock(), "word")?,
            };

            let counts = CharacterCount::new(refinery).run(&words).await?;
            println!("Top {} rows:", top);
            println!("{}", show(&counts, top, config.show_truncate)?);
        }
    }

    Ok(())
}
