use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use petgraph::graph::{DiGraph, NodeIndex};

use crate::config::DashboardConfig;
use crate::error::MarketError;

pub const ROUTE_DELIMITER: char = '-';

#[derive(Debug, Clone, PartialEq)]
pub struct Airport {
    pub code: String,
    pub lat: f64,
    pub lon: f64,
}

impl Airport {
    pub fn location(&self) -> [f64; 2] {
        [self.lat, self.lon]
    }
}

/// An ordered origin/destination pair, written `ORIGIN-DEST`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId {
    origin: String,
    dest: String,
}

impl RouteId {
    pub fn new(origin: impl Into<String>, dest: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            dest: dest.into(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn dest(&self) -> &str {
        &self.dest
    }

    pub fn reversed(&self) -> Self {
        Self::new(self.dest.clone(), self.origin.clone())
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.origin, ROUTE_DELIMITER, self.dest)
    }
}

/// Syntactic parse only: exactly two non-empty codes around one delimiter.
/// Use [`RouteNetwork::parse_route`] to also check the codes are known.
impl FromStr for RouteId {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut parts = trimmed.split(ROUTE_DELIMITER);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(o), Some(d), None) if !o.trim().is_empty() && !d.trim().is_empty() => {
                Ok(Self::new(o.trim(), d.trim()))
            }
            _ => Err(MarketError::InvalidRoute(format!(
                "'{s}' is not of the form ORIGIN{ROUTE_DELIMITER}DEST"
            ))),
        }
    }
}

/// Known airports and the canonical route set.
///
/// Airports are nodes, canonical routes are edges. Iteration order of both
/// follows the configuration, so rendered layers are stable across calls.
pub struct RouteNetwork {
    graph: DiGraph<Airport, RouteId>,
    /// Map from airport code → NodeIndex for fast lookup.
    node_map: HashMap<String, NodeIndex>,
}

impl RouteNetwork {
    pub fn from_config(config: &DashboardConfig) -> Result<Self, MarketError> {
        let mut graph = DiGraph::new();
        let mut node_map: HashMap<String, NodeIndex> = HashMap::new();

        for a in &config.airports {
            let code = a.code.trim().to_string();
            if node_map.contains_key(&code) {
                return Err(MarketError::Config(format!("duplicate airport code {code}")));
            }
            let idx = graph.add_node(Airport {
                code: code.clone(),
                lat: a.lat,
                lon: a.lon,
            });
            node_map.insert(code, idx);
        }

        for raw in &config.routes {
            let route: RouteId = raw
                .parse()
                .map_err(|e: MarketError| MarketError::Config(e.to_string()))?;
            let src = *node_map.get(route.origin()).ok_or_else(|| {
                MarketError::Config(format!("route {route} uses unknown airport {}", route.origin()))
            })?;
            let dst = *node_map.get(route.dest()).ok_or_else(|| {
                MarketError::Config(format!("route {route} uses unknown airport {}", route.dest()))
            })?;
            graph.add_edge(src, dst, route);
        }

        Ok(Self { graph, node_map })
    }

    pub fn airports(&self) -> impl Iterator<Item = &Airport> {
        self.graph.node_weights()
    }

    /// Canonical routes in configuration order.
    pub fn routes(&self) -> Vec<RouteId> {
        self.graph.edge_weights().cloned().collect()
    }

    /// Canonical routes paired with their endpoint airports.
    pub fn route_segments(&self) -> Vec<(&RouteId, &Airport, &Airport)> {
        self.graph
            .edge_indices()
            .filter_map(|e| {
                let (src, dst) = self.graph.edge_endpoints(e)?;
                Some((&self.graph[e], &self.graph[src], &self.graph[dst]))
            })
            .collect()
    }

    /// Parse `ORIGIN-DEST` and check both codes are known airports.
    pub fn parse_route(&self, s: &str) -> Result<RouteId, MarketError> {
        let route: RouteId = s.parse()?;
        for code in [route.origin(), route.dest()] {
            if !self.node_map.contains_key(code) {
                return Err(MarketError::InvalidRoute(format!(
                    "'{s}': unknown airport code {code}"
                )));
            }
        }
        Ok(route)
    }
}
