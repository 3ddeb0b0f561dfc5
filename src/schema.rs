/// Column-name constants for the market snapshot and derived frames.
/// Single source of truth - exported to Python via PyO3.

// ── Snapshot columns ────────────────────────────────────────────────────────
pub mod snapshot {
    pub const ORIGIN: &str = "Origin";
    pub const DEST: &str = "Dest";
    pub const DATE: &str = "random_date";
    pub const FARE: &str = "MktFare";
    pub const PASSENGERS: &str = "Passengers";
    pub const YEAR: &str = "Year";
    pub const QUARTER: &str = "Quarter";
    /// Derived at load time: `Origin + "-" + Dest`.
    pub const ROUTE: &str = "Route";

    pub const REQUIRED: [&str; 3] = [ORIGIN, DEST, DATE];
}

// ── Intermediate trend columns ──────────────────────────────────────────────
pub mod trend {
    pub const BUCKET_YEAR: &str = "bucket_year";
    pub const BUCKET_MONTH: &str = "bucket_month";
    pub const AVG_FARE: &str = "AvgFare";
    pub const TOTAL_PASSENGERS: &str = "Total_Passengers_Sum";
}

// ── KPI aggregation columns ─────────────────────────────────────────────────
pub mod kpi {
    pub const KPI_VALUE: &str = "KPI_Value";
}
