//! Selection → view dispatch.
//!
//! The presentation layer hands over the current analysis mode, route and
//! map KPI; [`Dashboard::view`] answers with what to show. All failures come
//! back as a [`View::Notice`], never as an error.

use std::sync::Arc;

use serde::Serialize;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use crate::aggregation::Metric;
use crate::chart::{price_forecast_chart, trend_chart, ChartDescription};
use crate::colormap::Polarity;
use crate::config::DashboardConfig;
use crate::error::MarketError;
use crate::kpi::{default_kpis, KpiOutcome, KpiSpec};
use crate::loader::Snapshot;
use crate::network::RouteNetwork;
use crate::visualization::{render_map, MapRender};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum AnalysisMode {
    FareTrend,
    VolumeTrend,
    PriceForecast,
    MarketMap,
}

impl AnalysisMode {
    pub fn label(self) -> &'static str {
        match self {
            AnalysisMode::FareTrend => "1. Average Fare Trend",
            AnalysisMode::VolumeTrend => "2. Passenger Volume Trend",
            AnalysisMode::PriceForecast => "3. Price Forecast",
            AnalysisMode::MarketMap => "4. Market Map",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            AnalysisMode::FareTrend => "Average Fare Trend",
            AnalysisMode::VolumeTrend => "Total Passenger Volume Trend",
            AnalysisMode::PriceForecast => "Price Forecast",
            AnalysisMode::MarketMap => "Overview of Major Routes",
        }
    }

    /// The map covers every canonical route, so it takes no route input.
    pub fn shows_route_selector(self) -> bool {
        self != AnalysisMode::MarketMap
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum MapKpi {
    #[default]
    Fare,
    Volume,
}

/// One entry of the analysis-mode selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeOption {
    pub key: String,
    pub label: &'static str,
    pub shows_route_selector: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum View {
    Chart {
        heading: String,
        chart: ChartDescription,
    },
    Map(MapView),
    Notice {
        message: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct MapView {
    pub heading: String,
    /// One line per KPI, e.g. `Avg Fare: low (120, Green) → high (300, Red)`.
    pub legend: Vec<String>,
    /// One line per KPI layer, e.g. `Avg Fare Routes layer: rendered 6 routes`.
    pub diagnostics: Vec<String>,
    pub document: String,
}

pub struct Dashboard {
    snapshot: Arc<Snapshot>,
    network: RouteNetwork,
    config: DashboardConfig,
    kpis: Vec<KpiSpec>,
}

impl Dashboard {
    pub fn new(snapshot: Arc<Snapshot>, config: DashboardConfig) -> Result<Self, MarketError> {
        let network = RouteNetwork::from_config(&config)?;
        Ok(Self {
            snapshot,
            network,
            config,
            kpis: default_kpis(),
        })
    }

    /// Load the configured snapshot (empty on failure) and build the dashboard.
    pub fn from_config(config: DashboardConfig) -> Result<Self, MarketError> {
        let snapshot = Snapshot::load_or_empty(&config.snapshot_path);
        Self::new(Arc::new(snapshot), config)
    }

    pub fn snapshot(&self) -> &Arc<Snapshot> {
        &self.snapshot
    }

    pub fn network(&self) -> &RouteNetwork {
        &self.network
    }

    /// Selector entries in display order. The map-KPI selector is never
    /// shown; the map always starts on its default overlay.
    pub fn mode_options(&self) -> Vec<ModeOption> {
        AnalysisMode::iter()
            .map(|mode| ModeOption {
                key: mode.to_string(),
                label: mode.label(),
                shows_route_selector: mode.shows_route_selector(),
            })
            .collect()
    }

    pub fn route_options(&self) -> Vec<String> {
        self.network.routes().iter().map(|r| r.to_string()).collect()
    }

    pub fn trend(&self, route: &str, metric: Metric) -> Result<ChartDescription, MarketError> {
        trend_chart(&self.snapshot, &self.network, route, metric)
    }

    pub fn market_map(&self, shown: MapKpi) -> MapRender {
        render_map(
            &self.snapshot,
            &self.network,
            &self.kpis,
            &self.config.map,
            shown.as_ref(),
        )
    }

    pub fn view(&self, mode: AnalysisMode, route: Option<&str>, map_kpi: MapKpi) -> View {
        let metric = match mode {
            AnalysisMode::MarketMap => return View::Map(self.map_view(map_kpi)),
            AnalysisMode::FareTrend => Some(Metric::Fare),
            AnalysisMode::VolumeTrend => Some(Metric::Volume),
            AnalysisMode::PriceForecast => None,
        };

        let Some(route) = route.map(str::trim).filter(|r| !r.is_empty()) else {
            return View::Notice {
                message: "Please select a route to display the results.".into(),
            };
        };

        let parsed = self.network.parse_route(route).and_then(|route_id| {
            let chart = match metric {
                Some(metric) => self.trend(&route_id.to_string(), metric)?,
                None => price_forecast_chart(&route_id),
            };
            Ok((route_id, chart))
        });

        match parsed {
            Ok((route_id, chart)) => View::Chart {
                heading: format!("Analysis Results: {} – {route_id}", mode.title()),
                chart,
            },
            Err(e) => {
                log::warn!("{mode} view for {route} failed: {e}");
                View::Notice {
                    message: e.to_string(),
                }
            }
        }
    }

    fn map_view(&self, shown: MapKpi) -> MapView {
        let render = self.market_map(shown);
        let legend = render
            .layers
            .iter()
            .map(|(spec, outcome)| legend_line(spec, outcome))
            .collect();
        let diagnostics = render
            .layers
            .iter()
            .map(|(spec, outcome)| format!("{} layer: {}", spec.name, outcome.status()))
            .collect();
        MapView {
            heading: AnalysisMode::MarketMap.title().into(),
            legend,
            diagnostics,
            document: render.document,
        }
    }
}

fn legend_line(spec: &KpiSpec, outcome: &KpiOutcome) -> String {
    let Some(layer) = outcome.layer() else {
        return format!("{}: Failed to display", spec.short_label);
    };
    let (low, high) = match spec.polarity {
        Polarity::LowerIsBetter => ("Green", "Red"),
        Polarity::HigherIsBetter => ("Red", "Green"),
    };
    format!(
        "{}: low ({}, {low}) → high ({}, {high})",
        spec.short_label,
        spec.format.format_bound(layer.range.min),
        spec.format.format_bound(layer.range.max),
    )
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::test_support::market_snapshot;

    fn dashboard(snapshot: Snapshot) -> Dashboard {
        Dashboard::new(Arc::new(snapshot), DashboardConfig::default()).unwrap()
    }

    #[test]
    fn modes_parse_from_kebab_case() {
        assert_eq!(AnalysisMode::from_str("fare-trend").unwrap(), AnalysisMode::FareTrend);
        assert_eq!(AnalysisMode::from_str("market-map").unwrap(), AnalysisMode::MarketMap);
        assert_eq!(AnalysisMode::PriceForecast.to_string(), "price-forecast");
        assert!(AnalysisMode::from_str("heatmap").is_err());
        assert_eq!(MapKpi::from_str("volume").unwrap(), MapKpi::Volume);
        assert_eq!(Metric::from_str("fare").unwrap(), Metric::Fare);
    }

    #[test]
    fn route_selector_hidden_for_map() {
        let modes = dashboard(market_snapshot()).mode_options();
        let keys: Vec<&str> = modes.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, ["fare-trend", "volume-trend", "price-forecast", "market-map"]);
        assert_eq!(modes[0].label, "1. Average Fare Trend");
        assert!(modes[..3].iter().all(|m| m.shows_route_selector));
        assert!(!modes[3].shows_route_selector);
    }

    #[test]
    fn heading_uses_normalized_route() {
        let view = dashboard(market_snapshot()).view(
            AnalysisMode::PriceForecast,
            Some("JFK - MCO"),
            MapKpi::Fare,
        );
        match view {
            View::Chart { heading, chart } => {
                assert_eq!(heading, "Analysis Results: Price Forecast – JFK-MCO");
                assert_eq!(chart.title, "price forecast: JFK-MCO - model integration pending");
            }
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn trend_without_route_asks_for_one() {
        let view = dashboard(market_snapshot()).view(AnalysisMode::FareTrend, None, MapKpi::Fare);
        assert!(matches!(view, View::Notice { message } if message.contains("select a route")));
    }

    #[test]
    fn fare_trend_view_has_heading() {
        let view = dashboard(market_snapshot()).view(
            AnalysisMode::FareTrend,
            Some("LAX-LAS"),
            MapKpi::Fare,
        );
        match view {
            View::Chart { heading, chart } => {
                assert_eq!(heading, "Analysis Results: Average Fare Trend – LAX-LAS");
                assert_eq!(chart.series.len(), 1);
            }
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn invalid_route_becomes_notice() {
        let view = dashboard(market_snapshot()).view(
            AnalysisMode::PriceForecast,
            Some("LAX+LAS"),
            MapKpi::Fare,
        );
        assert!(matches!(view, View::Notice { message } if message.starts_with("Invalid route")));
    }

    #[test]
    fn map_view_legend_follows_polarity() {
        let view = dashboard(market_snapshot()).view(AnalysisMode::MarketMap, None, MapKpi::Fare);
        let View::Map(map) = view else {
            panic!("expected map view");
        };
        assert_eq!(
            map.legend,
            vec![
                "Avg Fare: low (125, Green) → high (300, Red)".to_string(),
                "Total Volume: low (0, Red) → high (150, Green)".to_string(),
            ]
        );
        assert_eq!(map.diagnostics[0], "Avg Fare Routes layer: rendered 4 routes");
    }

    #[test]
    fn map_view_without_snapshot_reports_failures() {
        let view = dashboard(Snapshot::empty()).view(AnalysisMode::MarketMap, None, MapKpi::Fare);
        let View::Map(map) = view else {
            panic!("expected map view");
        };
        assert_eq!(map.legend[0], "Avg Fare: Failed to display");
        assert_eq!(
            map.diagnostics[1],
            "Total Passenger Volume Routes layer: snapshot empty"
        );
        assert!(!map.document.is_empty());
    }

    #[test]
    fn route_options_match_network() {
        let options = dashboard(market_snapshot()).route_options();
        assert_eq!(options.first().map(String::as_str), Some("LAX-LAS"));
        assert_eq!(options.len(), 6);
    }
}
