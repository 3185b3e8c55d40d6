use ferrum_reducer::core::char_count::CharacterCount;
use ferrum_reducer::framework::errors::Result;
use ferrum_reducer::framework::refinery::Refinery;
use ferrum_reducer::framework::show::show;
use ferrum_reducer::framework::source::read_lines;
use std::io::Cursor;

const LINES: &str = "the quick brown fox\njumps over\nthe lazy dog\n";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let words = read_lines(Cursor::new(LINES), "word")?;
    let counts = CharacterCount::new(Refinery::new(8)?).run(&words).await?;

    println!("Top 100 rows:");
    println!("{}", show(&counts, 100, 20)?);
    Ok(())
}
