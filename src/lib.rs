pub mod aggregation;
pub mod chart;
pub mod colormap;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod kpi;
pub mod loader;
pub mod network;
pub mod schema;
pub mod visualization;

#[cfg(feature = "python")]
mod python;
#[cfg(test)]
mod test_support;

pub use aggregation::{aggregate, Metric, Trend, TrendPoint, TrendSeries};
pub use chart::{price_forecast_chart, trend_chart, ChartDescription};
pub use config::DashboardConfig;
pub use dashboard::{AnalysisMode, Dashboard, MapKpi, MapView, ModeOption, View};
pub use error::MarketError;
pub use kpi::{compute_layer, KpiOutcome, KpiSpec};
pub use loader::Snapshot;
pub use network::{RouteId, RouteNetwork};
pub use visualization::{render_map, MapRender};

#[cfg(feature = "python")]
use pyo3::prelude::*;

#[cfg(feature = "python")]
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<python::FlightDashboard>()?;
    python::add_schema_exports(m)?;
    Ok(())
}
