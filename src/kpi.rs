//! KPI layers: per-route aggregates over the canonical route set, mapped
//! onto a color scale and a line-weight range.

use std::collections::HashMap;
use std::fmt;

use polars::prelude::*;
use serde::Serialize;

use crate::colormap::{ColorScale, Polarity, Rgb, ValueRange};
use crate::error::MarketError;
use crate::loader::Snapshot;
use crate::network::{RouteId, RouteNetwork};
use crate::schema::{kpi, snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiAggregation {
    Mean,
    Sum,
}

impl KpiAggregation {
    fn expr(self, column: &str) -> Expr {
        match self {
            KpiAggregation::Mean => col(column).mean(),
            KpiAggregation::Sum => col(column).sum(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueFormat {
    /// `$1234.50`
    Currency,
    /// `1,235`
    Count,
}

impl ValueFormat {
    pub fn format(self, value: f64) -> String {
        match self {
            ValueFormat::Currency => format!("${value:.2}"),
            ValueFormat::Count => group_thousands(value),
        }
    }

    /// Compact form for legends: no decimals, no symbol.
    pub fn format_bound(self, value: f64) -> String {
        match self {
            ValueFormat::Currency => format!("{value:.0}"),
            ValueFormat::Count => group_thousands(value),
        }
    }
}

/// Rounds to an integer and inserts `,` between thousands.
pub fn group_thousands(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSpec {
    /// Stable identifier, e.g. `fare`.
    pub key: &'static str,
    /// Overlay name shown in the layer control.
    pub name: &'static str,
    /// Legend caption and tooltip label.
    pub caption: &'static str,
    /// Short label for the dashboard legend text.
    pub short_label: &'static str,
    pub column: &'static str,
    pub aggregation: KpiAggregation,
    pub polarity: Polarity,
    pub format: ValueFormat,
}

impl KpiSpec {
    pub fn fare() -> Self {
        Self {
            key: "fare",
            name: "Avg Fare Routes",
            caption: "Average Market Fare ($)",
            short_label: "Avg Fare",
            column: snapshot::FARE,
            aggregation: KpiAggregation::Mean,
            polarity: Polarity::LowerIsBetter,
            format: ValueFormat::Currency,
        }
    }

    pub fn volume() -> Self {
        Self {
            key: "volume",
            name: "Total Passenger Volume Routes",
            caption: "Total Passenger Volume",
            short_label: "Total Volume",
            column: snapshot::PASSENGERS,
            aggregation: KpiAggregation::Sum,
            polarity: Polarity::HigherIsBetter,
            format: ValueFormat::Count,
        }
    }
}

pub fn default_kpis() -> Vec<KpiSpec> {
    vec![KpiSpec::fare(), KpiSpec::volume()]
}

/// Bounds for route line thickness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineWeights {
    pub min: f64,
    pub max: f64,
}

impl Default for LineWeights {
    fn default() -> Self {
        Self { min: 2.0, max: 8.0 }
    }
}

impl LineWeights {
    pub fn at(&self, normalized: f64) -> f64 {
        self.min + normalized * (self.max - self.min)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteLine {
    pub route: String,
    /// `[[lat, lon], [lat, lon]]`, origin first.
    pub path: [[f64; 2]; 2],
    pub value: f64,
    pub color: String,
    pub weight: f64,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KpiLayer {
    pub range: ValueRange,
    /// Every canonical route with its aggregate, `None` when there is no data.
    pub values: Vec<(RouteId, Option<f64>)>,
    pub lines: Vec<RouteLine>,
    pub low_color: Rgb,
    pub high_color: Rgb,
    pub gradient: String,
}

impl KpiLayer {
    pub fn value(&self, route: &RouteId) -> Option<f64> {
        self.values
            .iter()
            .find(|(r, _)| r == route)
            .and_then(|(_, v)| *v)
    }

    pub fn line(&self, route: &str) -> Option<&RouteLine> {
        self.lines.iter().find(|l| l.route == route)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Degradation {
    EmptySnapshot,
    MissingColumn(String),
    /// No canonical route has a usable value for the named KPI.
    NoValues(String),
    Aggregation(String),
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degradation::EmptySnapshot => write!(f, "snapshot empty"),
            Degradation::MissingColumn(c) => write!(f, "missing column: {c}"),
            Degradation::NoValues(name) => {
                write!(f, "no valid values for {name}; check the route filter")
            }
            Degradation::Aggregation(e) => write!(f, "aggregation failed: {e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum KpiOutcome {
    Rendered(KpiLayer),
    Degraded(Degradation),
}

impl KpiOutcome {
    pub fn layer(&self) -> Option<&KpiLayer> {
        match self {
            KpiOutcome::Rendered(layer) => Some(layer),
            KpiOutcome::Degraded(_) => None,
        }
    }

    pub fn status(&self) -> String {
        match self {
            KpiOutcome::Rendered(layer) => format!("rendered {} routes", layer.lines.len()),
            KpiOutcome::Degraded(reason) => reason.to_string(),
        }
    }
}

/// Compute one KPI layer. Never fails: every problem becomes a
/// [`Degradation`] so sibling layers are unaffected.
pub fn compute_layer(
    snapshot: &Snapshot,
    network: &RouteNetwork,
    spec: &KpiSpec,
    weights: LineWeights,
) -> KpiOutcome {
    log::info!("processing KPI layer: {} (column: {})", spec.name, spec.column);

    if snapshot.is_empty() {
        return KpiOutcome::Degraded(Degradation::EmptySnapshot);
    }
    if !snapshot.has_column(spec.column) {
        log::warn!("{}: column {} not found", spec.name, spec.column);
        return KpiOutcome::Degraded(Degradation::MissingColumn(spec.column.to_string()));
    }

    let stats = match route_stats(snapshot, spec) {
        Ok(stats) => stats,
        Err(e) => {
            log::warn!("{}: aggregation failed: {e}", spec.name);
            return KpiOutcome::Degraded(Degradation::Aggregation(e.to_string()));
        }
    };
    log::debug!("{}: {} route groups after aggregation", spec.name, stats.len());

    let values: Vec<(RouteId, Option<f64>)> = network
        .routes()
        .into_iter()
        .map(|route| {
            let value = stats.get(&route).copied().filter(|v| v.is_finite());
            (route, value)
        })
        .collect();

    let Some(range) = ValueRange::observed(values.iter().filter_map(|(_, v)| *v)) else {
        let reason = Degradation::NoValues(spec.name.to_string());
        log::warn!("{}: {reason}", spec.name);
        return KpiOutcome::Degraded(reason);
    };
    log::info!(
        "{}: KPI range over canonical routes min={:.2} max={:.2}",
        spec.name,
        range.min,
        range.max
    );

    let scale = ColorScale::red_yellow_green(range, spec.polarity);
    let mut lines = Vec::new();
    for (route, from, to) in network.route_segments() {
        let Some(value) = values
            .iter()
            .find(|(r, _)| r == route)
            .and_then(|(_, v)| *v)
        else {
            log::debug!("{}: route {route} has no value, skipping", spec.name);
            continue;
        };

        lines.push(RouteLine {
            route: route.to_string(),
            path: [from.location(), to.location()],
            value,
            color: scale.color(value).to_hex(),
            weight: weights.at(range.normalize(value)),
            tooltip: format!(
                "Route: {route}<br>{}: {}",
                spec.caption,
                spec.format.format(value)
            ),
        });
    }
    log::info!("{}: drew {} routes", spec.name, lines.len());

    KpiOutcome::Rendered(KpiLayer {
        range,
        values,
        lines,
        low_color: scale.low_color(),
        high_color: scale.high_color(),
        gradient: scale.css_gradient(),
    })
}

/// Aggregate `spec.column` per (Origin, Dest) over the whole snapshot.
fn route_stats(
    snapshot: &Snapshot,
    spec: &KpiSpec,
) -> Result<HashMap<RouteId, f64>, MarketError> {
    let df = snapshot
        .lazy()
        .group_by([col(snapshot::ORIGIN), col(snapshot::DEST)])
        .agg([spec
            .aggregation
            .expr(spec.column)
            .cast(DataType::Float64)
            .alias(kpi::KPI_VALUE)])
        .collect()?;

    let origins = df.column(snapshot::ORIGIN)?.str()?;
    let dests = df.column(snapshot::DEST)?.str()?;
    let values = df.column(kpi::KPI_VALUE)?.f64()?;

    let mut stats = HashMap::with_capacity(df.height());
    for i in 0..df.height() {
        if let (Some(o), Some(d), Some(v)) = (origins.get(i), dests.get(i), values.get(i)) {
            stats.insert(RouteId::new(o, d), v);
        }
    }
    Ok(stats)
}
