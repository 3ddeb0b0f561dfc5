//! Snapshot loading and type normalization.
//!
//! The snapshot is read once and never mutated afterwards. Callers share it
//! through an `Arc<Snapshot>`; every aggregation works on a cheap clone of the
//! underlying frame.

use std::fs::File;
use std::io;
use std::path::Path;

use polars::datatypes::TimeUnit;
use polars::prelude::StrptimeOptions;
use polars::prelude::*;

use crate::error::MarketError;
use crate::schema::snapshot;

#[derive(Debug, Clone)]
pub struct Snapshot {
    frame: DataFrame,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self {
            frame: DataFrame::empty(),
        }
    }

    /// Read and normalize the snapshot at `path`.
    pub fn load(path: &Path) -> Result<Self, MarketError> {
        log::info!("loading flight data from {}...", path.display());
        let raw = read_frame(path)?;
        let snapshot = Self::from_frame(raw)?;
        log::info!(
            "data loaded successfully. total rows: {}",
            snapshot.frame.height()
        );
        Ok(snapshot)
    }

    /// Like [`Snapshot::load`], but any failure is logged and yields an
    /// empty snapshot so downstream views degrade to placeholders.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(s) => s,
            Err(MarketError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                log::error!("{} not found!", path.display());
                Self::empty()
            }
            Err(e) => {
                log::error!("an error occurred during data loading: {e}");
                Self::empty()
            }
        }
    }

    /// Normalize a raw frame.
    ///
    /// Required columns: Origin, Dest, random_date.
    /// random_date becomes Datetime(µs); MktFare becomes Float64 with
    /// unparseable values as null; Passengers becomes Int64 with nulls as 0;
    /// Year and Quarter become Int32. Route is derived from Origin and Dest.
    pub fn from_frame(mut df: DataFrame) -> Result<Self, MarketError> {
        // Trim whitespace from column names
        let trimmed: Vec<String> = df
            .get_column_names_str()
            .iter()
            .map(|c| c.trim().to_string())
            .collect();
        df.set_column_names(trimmed.as_slice())?;

        require_columns(&df, &snapshot::REQUIRED)?;

        let mut exprs = vec![
            normalize_date(&df)?,
            col(snapshot::ORIGIN).cast(DataType::String),
            col(snapshot::DEST).cast(DataType::String),
        ];

        if let Ok(fare) = df.column(snapshot::FARE) {
            // NaN marks a missing fare, same as null.
            exprs.push(
                numeric(snapshot::FARE, fare.dtype(), DataType::Float64)
                    .fill_nan(lit(NULL))
                    .alias(snapshot::FARE),
            );
        }
        if let Ok(passengers) = df.column(snapshot::PASSENGERS) {
            exprs.push(
                numeric(snapshot::PASSENGERS, passengers.dtype(), DataType::Int64)
                    .fill_null(lit(0i64))
                    .alias(snapshot::PASSENGERS),
            );
        }
        for name in [snapshot::YEAR, snapshot::QUARTER] {
            if let Ok(c) = df.column(name) {
                exprs.push(numeric(name, c.dtype(), DataType::Int32));
            }
        }

        let frame = df
            .lazy()
            .with_columns(exprs)
            .with_column(
                concat_str([col(snapshot::ORIGIN), col(snapshot::DEST)], "-", false)
                    .alias(snapshot::ROUTE),
            )
            .collect()?;

        Ok(Self { frame })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn lazy(&self) -> LazyFrame {
        self.frame.clone().lazy()
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.column(name).is_ok()
    }

    pub fn require_columns(&self, required: &[&str]) -> Result<(), MarketError> {
        require_columns(&self.frame, required)
    }
}

/// Read a snapshot file without normalization. `.csv` files go through the
/// CSV reader; anything else is treated as parquet.
pub fn read_frame(path: &Path) -> Result<DataFrame, MarketError> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    if is_csv {
        // Surface a missing file as an io::Error rather than a polars one.
        std::fs::metadata(path)?;
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;
        Ok(df)
    } else {
        let file = File::open(path)?;
        Ok(ParquetReader::new(file).finish()?)
    }
}

fn require_columns(df: &DataFrame, required: &[&str]) -> Result<(), MarketError> {
    for &col_name in required {
        if df.column(col_name).is_err() {
            return Err(MarketError::MissingColumn(col_name.to_string()));
        }
    }
    Ok(())
}

fn normalize_date(df: &DataFrame) -> Result<Expr, MarketError> {
    let target = DataType::Datetime(TimeUnit::Microseconds, None);
    let expr = match df.column(snapshot::DATE)?.dtype() {
        DataType::String => col(snapshot::DATE)
            .str()
            .strip_chars(lit(" \t\r\n"))
            .str()
            .to_datetime(
                Some(TimeUnit::Microseconds),
                None,
                StrptimeOptions {
                    format: None,
                    strict: false,
                    ..Default::default()
                },
                lit("raise"),
            ),
        DataType::Date | DataType::Datetime(_, _) => col(snapshot::DATE).cast(target),
        other => {
            return Err(MarketError::InvalidData(format!(
                "column '{}' has unsupported type {other}",
                snapshot::DATE
            )))
        }
    };
    Ok(expr.alias(snapshot::DATE))
}

/// Coercing numeric cast: values that cannot be parsed become null.
fn numeric(name: &str, dtype: &DataType, target: DataType) -> Expr {
    let base = if *dtype == DataType::String {
        col(name).str().strip_chars(lit(" \t\r\n"))
    } else {
        col(name)
    };
    base.cast(target).alias(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{date, market_frame};

    #[test]
    fn normalizes_types_and_derives_route() {
        let snap = Snapshot::from_frame(market_frame()).unwrap();
        let df = snap.frame();

        assert_eq!(
            df.column(snapshot::DATE).unwrap().dtype(),
            &DataType::Datetime(TimeUnit::Microseconds, None)
        );
        assert_eq!(df.column(snapshot::FARE).unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column(snapshot::YEAR).unwrap().dtype(), &DataType::Int32);

        let routes = df.column(snapshot::ROUTE).unwrap().str().unwrap();
        assert_eq!(routes.get(0), Some("LAX-LAS"));
        assert_eq!(routes.get(4), Some("LAS-LAX"));
    }

    #[test]
    fn missing_passengers_become_zero() {
        let snap = Snapshot::from_frame(market_frame()).unwrap();
        let passengers = snap.frame().column(snapshot::PASSENGERS).unwrap();
        assert_eq!(passengers.dtype(), &DataType::Int64);
        assert_eq!(passengers.null_count(), 0);
        assert_eq!(passengers.i64().unwrap().get(8), Some(0));
    }

    #[test]
    fn unparseable_fares_become_null() {
        let df = df!(
            snapshot::ORIGIN => ["LAX", "LAX"],
            snapshot::DEST => ["LAS", "LAS"],
            snapshot::DATE => [date(2023, 1, 1), date(2023, 1, 2)],
            snapshot::FARE => ["120.5", "n/a"],
        )
        .unwrap();
        let snap = Snapshot::from_frame(df).unwrap();
        let fares = snap.frame().column(snapshot::FARE).unwrap().f64().unwrap();
        assert_eq!(fares.get(0), Some(120.5));
        assert_eq!(fares.get(1), None);
    }

    #[test]
    fn nan_fares_become_null() {
        let df = df!(
            snapshot::ORIGIN => ["LAX", "LAX", "LAX"],
            snapshot::DEST => ["LAS", "LAS", "LAS"],
            snapshot::DATE => [date(2023, 1, 1), date(2023, 1, 2), date(2023, 1, 3)],
            snapshot::FARE => [Some(100.0), Some(f64::NAN), None],
        )
        .unwrap();
        let snap = Snapshot::from_frame(df).unwrap();
        let fares = snap.frame().column(snapshot::FARE).unwrap().f64().unwrap();
        assert_eq!(fares.get(0), Some(100.0));
        assert_eq!(fares.get(1), None);
        assert_eq!(fares.null_count(), 2);
    }

    #[test]
    fn string_dates_are_parsed() {
        let df = df!(
            snapshot::ORIGIN => ["LAX"],
            snapshot::DEST => ["LAS"],
            snapshot::DATE => ["2023-03-04 10:00:00"],
        )
        .unwrap();
        let snap = Snapshot::from_frame(df).unwrap();
        let dates = snap.frame().column(snapshot::DATE).unwrap();
        assert_eq!(dates.dtype(), &DataType::Datetime(TimeUnit::Microseconds, None));
        assert_eq!(dates.null_count(), 0);
    }

    #[test]
    fn missing_date_column_is_rejected() {
        let df = df!(
            snapshot::ORIGIN => ["LAX"],
            snapshot::DEST => ["LAS"],
        )
        .unwrap();
        let err = Snapshot::from_frame(df).unwrap_err();
        assert!(matches!(err, MarketError::MissingColumn(c) if c == snapshot::DATE));
    }

    #[test]
    fn optional_kpi_columns_may_be_absent() {
        let mut df = market_frame();
        let _ = df.drop_in_place(snapshot::PASSENGERS).unwrap();
        let snap = Snapshot::from_frame(df).unwrap();
        assert!(!snap.has_column(snapshot::PASSENGERS));
        assert!(snap.has_column(snapshot::FARE));
    }

    #[test]
    fn parquet_round_trip() {
        let path = std::env::temp_dir().join(format!("market-{}.parquet", uuid::Uuid::new_v4()));
        let mut df = market_frame();
        {
            let mut file = File::create(&path).unwrap();
            ParquetWriter::new(&mut file).finish(&mut df).unwrap();
        }

        let snap = Snapshot::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(snap.height(), df.height());
        assert!(snap.has_column(snapshot::ROUTE));
    }

    #[test]
    fn absent_file_degrades_to_empty() {
        let path = std::env::temp_dir().join(format!("missing-{}.parquet", uuid::Uuid::new_v4()));
        let snap = Snapshot::load_or_empty(&path);
        assert!(snap.is_empty());
        assert!(matches!(Snapshot::load(&path), Err(MarketError::Io(_))));
    }
}
