//! Command-line front end for the market dashboard.
//!
//! ```text
//! flight-dashboard modes
//! flight-dashboard routes
//! flight-dashboard trend LAX-LAS [--metric volume]
//! flight-dashboard forecast JFK-MCO
//! flight-dashboard map [--kpi volume] [--output route_map.html]
//! flight-dashboard view market-map
//! ```

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use flight_market::{AnalysisMode, Dashboard, DashboardConfig, MapKpi, Metric, View};

#[derive(Parser)]
#[command(
    name = "flight-dashboard",
    about = "Airline market trends and KPI route map"
)]
struct Cli {
    /// TOML config file (built-in defaults when omitted)
    #[arg(long, short)]
    config: Option<PathBuf>,
    /// Snapshot file, overrides the configured path
    #[arg(long, short)]
    snapshot: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the analysis modes
    Modes,
    /// List the canonical routes
    Routes,
    /// Print a trend chart description as JSON
    Trend {
        /// Route as ORIGIN-DEST
        route: String,
        /// `fare` (monthly average) or `volume` (quarterly sum)
        #[arg(long, default_value = "fare")]
        metric: Metric,
    },
    /// Print the price forecast placeholder as JSON
    Forecast {
        /// Route as ORIGIN-DEST
        route: String,
    },
    /// Render the KPI route map to an HTML file
    Map {
        /// KPI layer shown initially
        #[arg(long, default_value = "fare")]
        kpi: MapKpi,
        #[arg(long, short, default_value = "route_map.html")]
        output: PathBuf,
    },
    /// Resolve a dashboard selection and print the view as JSON
    View {
        /// fare-trend, volume-trend, price-forecast or market-map
        mode: AnalysisMode,
        route: Option<String>,
        #[arg(long, default_value = "fare")]
        kpi: MapKpi,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let mut config = DashboardConfig::load(cli.config.as_deref())?;
    if let Some(snapshot) = cli.snapshot {
        config.snapshot_path = snapshot;
    }
    let dashboard = Dashboard::from_config(config)?;

    match cli.command {
        Commands::Modes => {
            for mode in dashboard.mode_options() {
                let route = if mode.shows_route_selector { "route" } else { "-" };
                println!("{:<16} {:<28} {route}", mode.key, mode.label);
            }
        }
        Commands::Routes => {
            for route in dashboard.route_options() {
                println!("{route}");
            }
        }
        Commands::Trend { route, metric } => {
            let chart = dashboard.trend(&route, metric)?;
            println!("{}", serde_json::to_string_pretty(&chart)?);
        }
        Commands::Forecast { route } => {
            let view = dashboard.view(AnalysisMode::PriceForecast, Some(&route), MapKpi::Fare);
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Commands::Map { kpi, output } => match dashboard.view(AnalysisMode::MarketMap, None, kpi) {
            View::Map(map) => {
                fs::write(&output, &map.document)?;
                println!("{}", map.heading);
                for line in map.legend.iter().chain(&map.diagnostics) {
                    println!("  {line}");
                }
                println!("Wrote {}", output.display());
            }
            other => println!("{}", serde_json::to_string_pretty(&other)?),
        },
        Commands::View { mode, route, kpi } => {
            let view = dashboard.view(mode, route.as_deref(), kpi);
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
    }

    Ok(())
}
