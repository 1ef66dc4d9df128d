use foundation::geo::GeoPosition;
use serde::{Deserialize, Serialize};

use crate::graph::{NodeContent, TourGraph, build_graph};

/// Declarative description of one panorama viewpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    /// Opaque resource locator handed through to the rendering backend.
    pub panorama: String,
    pub name: String,
    pub caption: String,
    pub lat_deg: f64,
    pub lon_deg: f64,
    #[serde(default)]
    pub alt_m: f64,
}

/// Deployment configuration for a tour.
///
/// This is the whole configuration surface: node definitions, unordered
/// adjacency pairs (each pair yields one link in each direction), and the
/// starting node id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourConfig {
    pub nodes: Vec<NodeSpec>,
    pub adjacency: Vec<(String, String)>,
    pub start_node: String,
}

impl TourConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))
    }

    /// Build the immutable tour graph this configuration describes.
    pub fn build(&self) -> Result<TourGraph, ConfigError> {
        let positions: Vec<(String, GeoPosition)> = self
            .nodes
            .iter()
            .map(|n| {
                (
                    n.id.clone(),
                    GeoPosition::with_altitude(n.lat_deg, n.lon_deg, n.alt_m),
                )
            })
            .collect();
        let content: Vec<(String, NodeContent)> = self
            .nodes
            .iter()
            .map(|n| {
                (
                    n.id.clone(),
                    NodeContent {
                        panorama: n.panorama.clone(),
                        name: n.name.clone(),
                        caption: n.caption.clone(),
                    },
                )
            })
            .collect();

        build_graph(&positions, &content, &self.adjacency, &self.start_node)
    }
}

/// Malformed or inconsistent tour definition. Fatal: surfaced before any
/// rendering attempt, and no partial graph is ever produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Malformed(String),
    DuplicateNode { id: String },
    UnknownAdjacentNode { id: String },
    SelfLink { id: String },
    IncompleteNode { id: String, missing: &'static str },
    UnknownStartNode { id: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Malformed(msg) => write!(f, "malformed tour config: {msg}"),
            ConfigError::DuplicateNode { id } => write!(f, "duplicate node id: {id}"),
            ConfigError::UnknownAdjacentNode { id } => {
                write!(f, "adjacency references undeclared node: {id}")
            }
            ConfigError::SelfLink { id } => write!(f, "node linked to itself: {id}"),
            ConfigError::IncompleteNode { id, missing } => {
                write!(f, "node {id} has no {missing}")
            }
            ConfigError::UnknownStartNode { id } => write!(f, "unknown start node: {id}"),
        }
    }
}

impl std::error::Error for ConfigError {}
