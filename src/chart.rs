//! Chart descriptions for the trend views.
//!
//! A description is backend-neutral: series, axis labels, a title, and
//! optional annotations. Placeholders are descriptions with no series.

use serde::Serialize;

use crate::aggregation::{aggregate, Metric, Trend, TrendSeries};
use crate::error::MarketError;
use crate::loader::Snapshot;
use crate::network::{RouteId, RouteNetwork};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDescription {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend_title: Option<String>,
    /// d3-style tick format for the y axis, e.g. `,.0f`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_tick_format: Option<String>,
    pub series: Vec<TrendSeries>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<String>,
}

impl ChartDescription {
    pub fn placeholder(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_label: None,
            y_label: None,
            legend_title: None,
            y_tick_format: None,
            series: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.series.is_empty()
    }

    pub fn to_json(&self) -> Result<String, MarketError> {
        Ok(serde_json::to_string(self)?)
    }
}

pub const NO_DATA_LOADED: &str = "no data loaded.";

/// Build the chart for a trend metric.
///
/// Only an invalid route (or an unexpected polars failure) is an error; an
/// empty snapshot, a route without rows, or a missing column all produce a
/// placeholder.
pub fn trend_chart(
    snapshot: &Snapshot,
    network: &RouteNetwork,
    route: &str,
    metric: Metric,
) -> Result<ChartDescription, MarketError> {
    let route = network.parse_route(route)?;
    let route_label = route.to_string();
    let trend = match aggregate(snapshot, network, &route_label, metric) {
        Ok(trend) => trend,
        Err(MarketError::MissingColumn(column)) => {
            log::warn!("{route_label}: missing column {column}");
            return Ok(ChartDescription::placeholder(format!(
                "data error: missing required column for time series grouping ({column})"
            )));
        }
        Err(e) => return Err(e),
    };

    let series = match trend {
        Trend::NoSnapshot => return Ok(ChartDescription::placeholder(NO_DATA_LOADED)),
        Trend::NoMatches => {
            let title = match metric {
                Metric::Fare => format!("no data found for route: {route_label}"),
                Metric::Volume => format!("no passenger data available for route: {route_label}"),
            };
            return Ok(ChartDescription::placeholder(title));
        }
        Trend::Series(series) => series,
    };

    let chart = match metric {
        Metric::Fare => {
            ChartDescription {
                title: format!(
                    "market fare trend: {} → {} (monthly average)",
                    route.origin(),
                    route.dest()
                ),
                x_label: Some("date".into()),
                y_label: Some("average fare ($)".into()),
                legend_title: None,
                y_tick_format: None,
                series,
                annotations: Vec::new(),
            }
        }
        Metric::Volume => ChartDescription {
            title: format!("quarterly total passenger volume trend for {route_label}"),
            x_label: Some("quarter".into()),
            y_label: Some("total passengers (sum)".into()),
            legend_title: Some("route direction".into()),
            y_tick_format: Some(",.0f".into()),
            series,
            annotations: Vec::new(),
        },
    };
    Ok(chart)
}

/// The forecast model is not wired in yet; this is its placeholder.
pub fn price_forecast_chart(route: &RouteId) -> ChartDescription {
    let mut chart = ChartDescription::placeholder(format!(
        "price forecast: {route} - model integration pending"
    ));
    chart
        .annotations
        .push("next, your price prediction model will be integrated here.".into());
    chart
}
