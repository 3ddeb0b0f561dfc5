//! Print the shape, schema and full contents of a snapshot file.
//!
//! ```text
//! inspect-snapshot cleaned_flight_data.parquet
//! ```

use std::path::PathBuf;

use clap::Parser;
use flight_market::loader::read_frame;

#[derive(Parser)]
#[command(name = "inspect-snapshot", about = "Inspect a parquet or CSV snapshot")]
struct Cli {
    /// Parquet file (CSV when the extension is .csv)
    path: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    // Print every row and column.
    std::env::set_var("POLARS_FMT_MAX_ROWS", "-1");
    std::env::set_var("POLARS_FMT_MAX_COLS", "-1");
    std::env::set_var("POLARS_FMT_STR_LEN", "100");

    println!("=== Loading {} ===", cli.path.display());
    let df = read_frame(&cli.path)?;

    println!("Rows: {}", df.height());
    println!("Columns: {}", df.width());
    println!();
    println!("=== Column names ===");
    for name in df.get_column_names() {
        println!("  {name}");
    }
    println!();
    println!("=== Dtypes ===");
    for (name, dtype) in df.get_column_names().iter().zip(df.dtypes()) {
        println!("  {name}: {dtype}");
    }
    println!();
    println!("=== Data ===");
    println!("{df}");

    Ok(())
}
