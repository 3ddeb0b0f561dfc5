use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyModule;
use pyo3_polars::PyDataFrame;

use crate::aggregation::Metric;
use crate::chart::price_forecast_chart;
use crate::config::DashboardConfig;
use crate::dashboard::{AnalysisMode, Dashboard, MapKpi};
use crate::error::MarketError;
use crate::schema;

#[pyclass]
pub struct FlightDashboard {
    inner: Dashboard,
}

#[pymethods]
impl FlightDashboard {
    /// Load the config (built-in defaults when omitted) and the snapshot.
    ///
    /// A missing or unreadable snapshot leaves the dashboard empty; every
    /// view then reports "no data loaded." instead of raising.
    #[new]
    #[pyo3(signature = (snapshot_path=None, config_path=None))]
    fn new(snapshot_path: Option<String>, config_path: Option<String>) -> PyResult<Self> {
        let mut config = DashboardConfig::load(config_path.as_deref().map(std::path::Path::new))?;
        if let Some(path) = snapshot_path {
            config.snapshot_path = PathBuf::from(path);
        }
        Ok(Self {
            inner: Dashboard::from_config(config)?,
        })
    }

    /// The loaded snapshot as a polars DataFrame.
    #[getter]
    fn table(&self) -> PyResult<PyDataFrame> {
        let snapshot = self.inner.snapshot();
        if snapshot.is_empty() {
            return Err(MarketError::NotLoaded("snapshot".into()).into());
        }
        Ok(PyDataFrame(snapshot.frame().clone()))
    }

    /// `(key, label, shows_route_selector)` per analysis mode.
    #[getter]
    fn modes(&self) -> Vec<(String, String, bool)> {
        self.inner
            .mode_options()
            .into_iter()
            .map(|m| (m.key, m.label.to_string(), m.shows_route_selector))
            .collect()
    }

    #[getter]
    fn routes(&self) -> Vec<String> {
        self.inner.route_options()
    }

    /// Monthly average fare chart for one direction, as JSON.
    fn fare_trend(&self, route: &str) -> PyResult<String> {
        Ok(self.inner.trend(route, Metric::Fare)?.to_json()?)
    }

    /// Quarterly passenger volume chart for both directions, as JSON.
    fn volume_trend(&self, route: &str) -> PyResult<String> {
        Ok(self.inner.trend(route, Metric::Volume)?.to_json()?)
    }

    fn price_forecast(&self, route: &str) -> PyResult<String> {
        let route = self.inner.network().parse_route(route)?;
        Ok(price_forecast_chart(&route).to_json()?)
    }

    /// Render the KPI route map.
    ///
    /// Returns the HTML document and a `{kpi_key: status}` dict. Use with
    /// `IPython.display.HTML(html)` in Jupyter.
    #[pyo3(signature = (map_kpi = "fare"))]
    fn market_map(&self, map_kpi: &str) -> PyResult<(String, HashMap<String, String>)> {
        let kpi = parse_map_kpi(map_kpi)?;
        let render = self.inner.market_map(kpi);
        let statuses = render.statuses().into_iter().collect();
        Ok((render.document, statuses))
    }

    /// Resolve a selection (`fare-trend`, `volume-trend`, `price-forecast`,
    /// `market-map`) into a JSON view description.
    #[pyo3(signature = (mode, route=None, map_kpi = "fare"))]
    fn view(&self, mode: &str, route: Option<&str>, map_kpi: &str) -> PyResult<String> {
        let mode = AnalysisMode::from_str(mode)
            .map_err(|_| PyValueError::new_err(format!("Unknown analysis mode: {mode}")))?;
        let kpi = parse_map_kpi(map_kpi)?;
        let view = self.inner.view(mode, route, kpi);
        Ok(serde_json::to_string(&view).map_err(MarketError::from)?)
    }
}

fn parse_map_kpi(value: &str) -> PyResult<MapKpi> {
    MapKpi::from_str(value).map_err(|_| PyValueError::new_err(format!("Unknown map KPI: {value}")))
}

/// Export schema constants as Python submodules
pub(crate) fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let snapshot = PyModule::new(m.py(), "snapshot")?;
    snapshot.add("ORIGIN", schema::snapshot::ORIGIN)?;
    snapshot.add("DEST", schema::snapshot::DEST)?;
    snapshot.add("DATE", schema::snapshot::DATE)?;
    snapshot.add("FARE", schema::snapshot::FARE)?;
    snapshot.add("PASSENGERS", schema::snapshot::PASSENGERS)?;
    snapshot.add("YEAR", schema::snapshot::YEAR)?;
    snapshot.add("QUARTER", schema::snapshot::QUARTER)?;
    snapshot.add("ROUTE", schema::snapshot::ROUTE)?;
    m.add_submodule(&snapshot)?;

    let trend = PyModule::new(m.py(), "trend")?;
    trend.add("AVG_FARE", schema::trend::AVG_FARE)?;
    trend.add("TOTAL_PASSENGERS", schema::trend::TOTAL_PASSENGERS)?;
    m.add_submodule(&trend)?;

    Ok(())
}
