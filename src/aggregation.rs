use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use strum::{Display, EnumString};

use crate::error::MarketError;
use crate::loader::Snapshot;
use crate::network::{RouteId, RouteNetwork};
use crate::schema::{snapshot, trend};

/// Metric selector for route trends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Metric {
    /// Monthly mean fare, one direction.
    Fare,
    /// Quarterly passenger sum, both directions kept apart.
    Volume,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// First day of the month or quarter.
    pub bucket: NaiveDate,
    pub value: f64,
}

/// One direction of a route over time. Buckets strictly increase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    pub label: String,
    pub points: Vec<TrendPoint>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Trend {
    /// The snapshot holds no rows at all.
    NoSnapshot,
    /// The snapshot has data, but none for this route.
    NoMatches,
    Series(Vec<TrendSeries>),
}

impl Trend {
    pub fn series(&self) -> &[TrendSeries] {
        match self {
            Trend::Series(s) => s,
            Trend::NoSnapshot | Trend::NoMatches => &[],
        }
    }
}

/// Aggregate `route` into a time series for `metric`.
///
/// Fails only on an invalid route or a missing column; an empty snapshot or
/// a route without rows is reported through [`Trend`].
pub fn aggregate(
    snapshot: &Snapshot,
    network: &RouteNetwork,
    route: &str,
    metric: Metric,
) -> Result<Trend, MarketError> {
    let route = network.parse_route(route)?;
    if snapshot.is_empty() {
        return Ok(Trend::NoSnapshot);
    }
    match metric {
        Metric::Fare => fare_trend(snapshot, &route),
        Metric::Volume => volume_trend(snapshot, &route),
    }
}

fn direction(route: &RouteId) -> Expr {
    col(snapshot::ORIGIN)
        .eq(lit(route.origin()))
        .and(col(snapshot::DEST).eq(lit(route.dest())))
}

fn fare_trend(snapshot: &Snapshot, route: &RouteId) -> Result<Trend, MarketError> {
    snapshot.require_columns(&[snapshot::FARE])?;

    let df = snapshot
        .lazy()
        .filter(direction(route))
        .group_by([
            col(snapshot::DATE)
                .dt()
                .year()
                .cast(DataType::Int32)
                .alias(trend::BUCKET_YEAR),
            col(snapshot::DATE)
                .dt()
                .month()
                .cast(DataType::Int32)
                .alias(trend::BUCKET_MONTH),
        ])
        .agg([col(snapshot::FARE).mean().alias(trend::AVG_FARE)])
        .sort(
            [trend::BUCKET_YEAR, trend::BUCKET_MONTH],
            SortMultipleOptions::default(),
        )
        .collect()?;

    if df.height() == 0 {
        return Ok(Trend::NoMatches);
    }

    let years = df.column(trend::BUCKET_YEAR)?.i32()?;
    let months = df.column(trend::BUCKET_MONTH)?.i32()?;
    let fares = df.column(trend::AVG_FARE)?.f64()?;

    // A month whose rows carry no fare at all has a null mean; drop it.
    let points: Vec<TrendPoint> = years
        .into_iter()
        .zip(months)
        .zip(fares)
        .filter_map(|((y, m), fare)| {
            let bucket = NaiveDate::from_ymd_opt(y?, u32::try_from(m?).ok()?, 1)?;
            let value = fare.filter(|v| !v.is_nan())?;
            Some(TrendPoint { bucket, value })
        })
        .collect();
    if points.is_empty() {
        log::debug!("{route}: rows found but no fares observed");
        return Ok(Trend::NoMatches);
    }

    Ok(Trend::Series(vec![TrendSeries {
        label: route.to_string(),
        points,
    }]))
}

fn volume_trend(snapshot: &Snapshot, route: &RouteId) -> Result<Trend, MarketError> {
    snapshot.require_columns(&[snapshot::YEAR, snapshot::QUARTER, snapshot::PASSENGERS])?;

    let reverse = route.reversed();
    let df = snapshot
        .lazy()
        .filter(direction(route).or(direction(&reverse)))
        .group_by([
            col(snapshot::YEAR),
            col(snapshot::QUARTER),
            col(snapshot::ORIGIN),
            col(snapshot::DEST),
        ])
        .agg([col(snapshot::PASSENGERS)
            .sum()
            .cast(DataType::Int64)
            .alias(trend::TOTAL_PASSENGERS)])
        .sort(
            [snapshot::YEAR, snapshot::QUARTER],
            SortMultipleOptions::default(),
        )
        .collect()?;

    if df.height() == 0 {
        return Ok(Trend::NoMatches);
    }

    let years = df.column(snapshot::YEAR)?.i32()?;
    let quarters = df.column(snapshot::QUARTER)?.i32()?;
    let origins = df.column(snapshot::ORIGIN)?.str()?;
    let totals = df.column(trend::TOTAL_PASSENGERS)?.i64()?;

    let mut forward = TrendSeries {
        label: route.to_string(),
        points: Vec::new(),
    };
    let mut backward = TrendSeries {
        label: reverse.to_string(),
        points: Vec::new(),
    };

    for i in 0..df.height() {
        let (Some(year), Some(quarter)) = (years.get(i), quarters.get(i)) else {
            continue;
        };
        let Some(bucket) = quarter_start(year, quarter) else {
            log::debug!("skipping {route} row with year {year} quarter {quarter}");
            continue;
        };
        let point = TrendPoint {
            bucket,
            value: totals.get(i).unwrap_or(0) as f64,
        };
        if origins.get(i) == Some(route.origin()) {
            forward.points.push(point);
        } else {
            backward.points.push(point);
        }
    }

    let series: Vec<TrendSeries> = [forward, backward]
        .into_iter()
        .filter(|s| !s.points.is_empty())
        .collect();
    if series.is_empty() {
        return Ok(Trend::NoMatches);
    }
    Ok(Trend::Series(series))
}

/// First day of `quarter` (1-4) in `year`.
pub fn quarter_start(year: i32, quarter: i32) -> Option<NaiveDate> {
    if !(1..=4).contains(&quarter) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, (quarter * 3 - 2) as u32, 1)
}
