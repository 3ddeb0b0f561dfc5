use chrono::NaiveDate;
use polars::prelude::*;

use crate::config::DashboardConfig;
use crate::loader::Snapshot;
use crate::network::RouteNetwork;
use crate::schema::snapshot;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Small market sample.
///
/// Per canonical route: LAX-LAS mean fare 125 / 42 passengers, DEN-JFK 300 /
/// 150, ORD-DFW 200 / 0 (passengers missing), JFK-MCO 180 / 60. LAX-SFO and
/// SFO-SEA have no rows. LAS-LAX is the reverse direction of LAX-LAS.
pub fn market_frame() -> DataFrame {
    df!(
        snapshot::ORIGIN => ["LAX", "LAX", "LAX", "LAX", "LAS", "LAS", "DEN", "DEN", "ORD", "JFK"],
        snapshot::DEST => ["LAS", "LAS", "LAS", "LAS", "LAX", "LAX", "JFK", "JFK", "DFW", "MCO"],
        snapshot::DATE => [
            date(2023, 1, 5),
            date(2023, 1, 20),
            date(2023, 2, 10),
            date(2023, 4, 2),
            date(2023, 1, 15),
            date(2023, 5, 15),
            date(2023, 3, 1),
            date(2023, 7, 1),
            date(2023, 2, 1),
            date(2022, 11, 11),
        ],
        snapshot::FARE => [
            Some(100.0), Some(120.0), Some(150.0), Some(130.0), Some(90.0),
            Some(95.0), Some(300.0), None, Some(200.0), Some(180.0),
        ],
        snapshot::PASSENGERS => [
            Some(10i64), Some(20), Some(5), Some(7), Some(30),
            Some(40), Some(100), Some(50), None, Some(60),
        ],
        snapshot::YEAR => [2023i32, 2023, 2023, 2023, 2023, 2023, 2023, 2023, 2023, 2022],
        snapshot::QUARTER => [1i32, 1, 1, 2, 1, 2, 1, 3, 1, 4],
    )
    .unwrap()
}

pub fn market_snapshot() -> Snapshot {
    Snapshot::from_frame(market_frame()).unwrap()
}

pub fn network() -> RouteNetwork {
    RouteNetwork::from_config(&DashboardConfig::default()).unwrap()
}
