/// Visualization module: KPI route map.
///
/// Produces a self-contained HTML document with inline JS that handles:
/// - Base tiles with an alternative simple base map
/// - One overlay per rendered KPI layer (colored, weighted route lines)
/// - Airport markers with mean-fare popups
/// - Legends, a layer control and a delayed resize for iframe embedding
///
/// All Leaflet rendering is done client-side by route_map.js.
/// This module computes the layers, serializes them to JSON, and emits
/// the HTML shell.
use polars::prelude::*;
use serde::Serialize;

use crate::config::MapConfig;
use crate::kpi::{compute_layer, KpiOutcome, KpiSpec, LineWeights};
use crate::loader::Snapshot;
use crate::network::RouteNetwork;
use crate::schema::snapshot;

const MAP_JS: &str = include_str!("route_map.js");

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";

const AIRPORT_LAYER_NAME: &str = "Airport Markers";

// ── Output ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirportMarker {
    pub code: String,
    pub location: [f64; 2],
    pub popup: String,
    #[serde(skip)]
    pub mean_fare: Option<f64>,
}

/// Result of one map render.
pub struct MapRender {
    /// Self-contained HTML document.
    pub document: String,
    pub layers: Vec<(KpiSpec, KpiOutcome)>,
    pub markers: Vec<AirportMarker>,
}

impl MapRender {
    pub fn outcome(&self, key: &str) -> Option<&KpiOutcome> {
        self.layers
            .iter()
            .find(|(spec, _)| spec.key == key)
            .map(|(_, outcome)| outcome)
    }

    pub fn status(&self, key: &str) -> Option<String> {
        self.outcome(key).map(KpiOutcome::status)
    }

    /// `(key, status)` per KPI layer, in render order.
    pub fn statuses(&self) -> Vec<(String, String)> {
        self.layers
            .iter()
            .map(|(spec, outcome)| (spec.key.to_string(), outcome.status()))
            .collect()
    }
}

// ── Payload passed to route_map.js ──────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MapPayload<'a> {
    map_id: &'a str,
    center: [f64; 2],
    zoom: u8,
    line_opacity: f64,
    marker_radius: u32,
    resize_delay_ms: u32,
    tiles: &'static [TileLayer],
    overlays: Vec<Overlay<'a>>,
    airports: AirportGroup<'a>,
    legends: Vec<Legend>,
}

#[derive(Serialize)]
struct TileLayer {
    name: &'static str,
    url: &'static str,
    attribution: &'static str,
}

#[derive(Serialize)]
struct Overlay<'a> {
    name: &'a str,
    show: bool,
    lines: &'a [crate::kpi::RouteLine],
}

#[derive(Serialize)]
struct AirportGroup<'a> {
    name: &'a str,
    markers: &'a [AirportMarker],
}

#[derive(Serialize)]
struct Legend {
    caption: String,
    low: String,
    high: String,
    gradient: String,
}

static TILES: [TileLayer; 2] = [
    TileLayer {
        name: "CartoDB positron",
        url: "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png",
        attribution: "&copy; OpenStreetMap contributors &copy; CARTO",
    },
    TileLayer {
        name: "Base Map (Simple)",
        url: "https://tiles.stadiamaps.com/tiles/stamen_toner_lite/{z}/{x}/{y}{r}.png",
        attribution: "&copy; Stadia Maps &copy; Stamen Design &copy; OpenStreetMap contributors",
    },
];

// ── Rendering ───────────────────────────────────────────────────────────────

/// Main entry point: computes every KPI layer and the airport markers, then
/// emits the HTML document.
///
/// Never fails. KPI layers that cannot be computed are reported through
/// their [`KpiOutcome`] and left off the map; the base map and the airport
/// markers are always present. `shown_kpi` is the key of the overlay that
/// starts visible.
pub fn render_map(
    snapshot: &Snapshot,
    network: &RouteNetwork,
    kpis: &[KpiSpec],
    config: &MapConfig,
    shown_kpi: &str,
) -> MapRender {
    if snapshot.is_empty() {
        log::warn!("snapshot is empty; rendering base map only");
    } else {
        log::info!("rendering route map over {} rows", snapshot.height());
    }

    let weights = LineWeights {
        min: config.min_line_weight,
        max: config.max_line_weight,
    };
    let layers: Vec<(KpiSpec, KpiOutcome)> = kpis
        .iter()
        .map(|spec| (spec.clone(), compute_layer(snapshot, network, spec, weights)))
        .collect();
    for (spec, outcome) in &layers {
        log::info!("{} status: {}", spec.key, outcome.status());
    }

    let markers = airport_markers(snapshot, network);
    log::info!("drew {} airport markers", markers.len());

    let map_id = format!("map_{}", uuid::Uuid::new_v4().simple());
    let document = emit_document(&map_id, config, &layers, &markers, shown_kpi);

    MapRender {
        document,
        layers,
        markers,
    }
}

/// One marker per known airport; the popup carries the mean fare over rows
/// touching the airport when there is one.
fn airport_markers(snapshot: &Snapshot, network: &RouteNetwork) -> Vec<AirportMarker> {
    network
        .airports()
        .map(|airport| {
            let mean_fare = airport_mean_fare(snapshot, &airport.code);
            let popup = match mean_fare {
                Some(fare) => format!("{}<br>Avg Fare: ${fare:.2}", airport.code),
                None => airport.code.clone(),
            };
            AirportMarker {
                code: airport.code.clone(),
                location: airport.location(),
                popup,
                mean_fare,
            }
        })
        .collect()
}

fn airport_mean_fare(snapshot: &Snapshot, code: &str) -> Option<f64> {
    if snapshot.is_empty() || !snapshot.has_column(snapshot::FARE) {
        return None;
    }
    let result = snapshot
        .lazy()
        .filter(
            col(snapshot::ORIGIN)
                .eq(lit(code))
                .or(col(snapshot::DEST).eq(lit(code))),
        )
        .select([col(snapshot::FARE).mean().alias(snapshot::FARE)])
        .collect();

    let df = match result {
        Ok(df) => df,
        Err(e) => {
            log::warn!("airport {code}: mean fare failed: {e}");
            return None;
        }
    };
    let fare = df
        .column(snapshot::FARE)
        .ok()?
        .f64()
        .ok()?
        .get(0)
        .filter(|v| !v.is_nan());
    if fare.is_none() {
        log::debug!("airport {code} has no fare records");
    }
    fare
}

fn emit_document(
    map_id: &str,
    config: &MapConfig,
    layers: &[(KpiSpec, KpiOutcome)],
    markers: &[AirportMarker],
    shown_kpi: &str,
) -> String {
    let mut overlays = Vec::new();
    let mut legends = Vec::new();
    for (spec, outcome) in layers {
        let Some(layer) = outcome.layer() else {
            continue;
        };
        overlays.push(Overlay {
            name: spec.name,
            show: spec.key == shown_kpi,
            lines: &layer.lines,
        });
        legends.push(Legend {
            caption: spec.caption.to_string(),
            low: spec.format.format_bound(layer.range.min),
            high: spec.format.format_bound(layer.range.max),
            gradient: layer.gradient.clone(),
        });
    }

    let payload = MapPayload {
        map_id,
        center: config.center,
        zoom: config.zoom_start,
        line_opacity: config.line_opacity,
        marker_radius: config.marker_radius,
        resize_delay_ms: config.resize_delay_ms,
        tiles: &TILES,
        overlays,
        airports: AirportGroup {
            name: AIRPORT_LAYER_NAME,
            markers,
        },
        legends,
    };
    let payload_json = match serde_json::to_string(&payload) {
        Ok(json) => script_safe(&json),
        Err(e) => {
            log::error!("failed to serialize map payload: {e}");
            "null".to_string()
        }
    };

    format!(
        r##"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8" />
<meta name="viewport" content="width=device-width, initial-scale=1.0" />
<link rel="stylesheet" href="{leaflet_css}" />
<script src="{leaflet_js}"></script>
<style>
  html, body {{ width: 100%; height: 100%; margin: 0; padding: 0; }}
  #{map_id} {{ position: absolute; top: 0; bottom: 0; right: 0; left: 0; }}
  .route-map-legend {{ background: rgba(255,255,255,0.85); padding: 6px 8px; border-radius: 4px; font-family: sans-serif; font-size: 11px; color: #333; min-width: 180px; }}
  .route-map-legend-caption {{ font-weight: 600; margin-bottom: 4px; }}
  .route-map-legend-bar {{ height: 10px; border: 1px solid #999; }}
  .route-map-legend-labels {{ display: flex; justify-content: space-between; margin-top: 2px; }}
</style>
</head>
<body>
<div id="{map_id}"></div>
<script>
{map_js}
RouteMap.create({payload_json});
</script>
</body>
</html>
"##,
        leaflet_css = LEAFLET_CSS,
        leaflet_js = LEAFLET_JS,
        map_id = map_id,
        map_js = MAP_JS,
        payload_json = payload_json,
    )
}

/// JSON inside a `<script>` block must not close the block early.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::kpi::{default_kpis, Degradation};
    use crate::test_support::{market_frame, market_snapshot, network};

    fn render(snap: &Snapshot) -> MapRender {
        render_map(snap, &network(), &default_kpis(), &MapConfig::default(), "fare")
    }

    #[test]
    fn full_render_has_both_layers_and_markers() {
        let map = render(&market_snapshot());
        assert_eq!(map.status("fare").unwrap(), "rendered 4 routes");
        assert_eq!(map.status("volume").unwrap(), "rendered 4 routes");
        assert_eq!(map.markers.len(), 9);
        assert!(map.document.contains("RouteMap.create("));
        assert!(map.document.contains("Avg Fare Routes"));
        assert!(map.document.contains("Total Passenger Volume Routes"));
    }

    #[test]
    fn airport_popup_shows_mean_fare() {
        let map = render(&market_snapshot());
        let lax = map.markers.iter().find(|m| m.code == "LAX").unwrap();
        assert_eq!(lax.popup, "LAX<br>Avg Fare: $114.17");
        let sfo = map.markers.iter().find(|m| m.code == "SFO").unwrap();
        assert_eq!(sfo.popup, "SFO");
        assert_eq!(sfo.mean_fare, None);
    }

    #[test]
    fn absent_snapshot_still_renders_base_map() {
        let map = render(&Snapshot::empty());
        assert!(!map.document.is_empty());
        assert!(map.document.contains("RouteMap.create("));
        assert_eq!(
            map.outcome("fare"),
            Some(&KpiOutcome::Degraded(Degradation::EmptySnapshot))
        );
        assert_eq!(map.status("fare"), map.status("volume"));
        assert_eq!(map.status("volume").unwrap(), "snapshot empty");
        assert_eq!(map.markers.len(), 9);
        assert!(map.markers.iter().all(|m| m.popup == m.code));
    }

    #[test]
    fn missing_kpi_column_leaves_siblings_intact() {
        let mut df = market_frame();
        let _ = df.drop_in_place(snapshot::PASSENGERS).unwrap();
        let map = render(&Snapshot::from_frame(df).unwrap());

        assert_eq!(map.status("volume").unwrap(), "missing column: Passengers");
        assert_eq!(map.status("fare").unwrap(), "rendered 4 routes");
        assert!(map.markers.iter().any(|m| m.mean_fare.is_some()));
        assert!(!map.document.contains("Total Passenger Volume Routes"));
    }

    #[test]
    fn shown_kpi_controls_initial_overlay() {
        let snap = market_snapshot();
        let map = render_map(&snap, &network(), &default_kpis(), &MapConfig::default(), "volume");
        assert!(map
            .document
            .contains(r#""name":"Total Passenger Volume Routes","show":true"#));
        assert!(map.document.contains(r#""name":"Avg Fare Routes","show":false"#));
    }

    #[test]
    fn repeated_renders_assign_same_ranges_and_styles() {
        let snap = market_snapshot();
        let a = render(&snap);
        let b = render(&snap);
        for key in ["fare", "volume"] {
            assert_eq!(a.outcome(key), b.outcome(key));
        }
        assert_eq!(a.markers, b.markers);
    }

    #[test]
    fn script_safe_escapes_closing_tags() {
        assert_eq!(script_safe(r#"{"a":"</script>"}"#), r#"{"a":"<\/script>"}"#);
    }
}
