use std::collections::BTreeMap;

use foundation::geo::{GeoPosition, initial_bearing};

use crate::config::ConfigError;

/// A directed navigation arrow from one node toward an adjacent node.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub target: String,
    /// Denormalized copy of the target node's position; equal by
    /// construction, never mutated afterwards.
    pub target_position: GeoPosition,
    /// Viewer yaw in radians, raw `atan2` range `(-π, π]`, 0 = north.
    pub yaw_rad: f64,
    /// Fixed 0: links are coplanar in this deployment.
    pub pitch_rad: f64,
}

/// One panorama viewpoint and its outgoing links, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub panorama: String,
    pub name: String,
    pub caption: String,
    pub position: GeoPosition,
    pub links: Vec<Link>,
}

/// Display metadata and panorama reference for one node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeContent {
    pub panorama: String,
    pub name: String,
    pub caption: String,
}

/// Immutable tour graph. Built once from static configuration; the rendering
/// backend receives a read-only view and nothing mutates nodes or links for
/// the lifetime of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct TourGraph {
    nodes: Vec<Node>,
    index: BTreeMap<String, usize>,
    start_node: String,
}

impl TourGraph {
    /// Nodes in declaration order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn start_node(&self) -> &str {
        &self.start_node
    }

    pub fn link_count(&self) -> usize {
        self.nodes.iter().map(|n| n.links.len()).sum()
    }
}

/// Assemble a tour graph from positions, node content, and unordered
/// adjacency pairs.
///
/// Each pair `(a, b)` produces two links, one at each endpoint, and each
/// link's yaw is computed from its own source→target coordinates; the
/// reverse yaw is not derived from the forward one (great-circle bearings
/// are not antisymmetric). Construction is all-or-nothing: any inconsistency
/// returns `ConfigError` and no graph.
pub fn build_graph(
    positions: &[(String, GeoPosition)],
    content: &[(String, NodeContent)],
    adjacency: &[(String, String)],
    start_node: &str,
) -> Result<TourGraph, ConfigError> {
    let mut index: BTreeMap<String, usize> = BTreeMap::new();
    for (i, (id, _)) in positions.iter().enumerate() {
        if index.insert(id.clone(), i).is_some() {
            return Err(ConfigError::DuplicateNode { id: id.clone() });
        }
    }

    let mut content_by_id: BTreeMap<&str, &NodeContent> = BTreeMap::new();
    for (id, c) in content {
        if !index.contains_key(id.as_str()) {
            return Err(ConfigError::IncompleteNode {
                id: id.clone(),
                missing: "coordinate",
            });
        }
        if content_by_id.insert(id.as_str(), c).is_some() {
            return Err(ConfigError::DuplicateNode { id: id.clone() });
        }
    }

    let mut nodes: Vec<Node> = Vec::with_capacity(positions.len());
    for (id, position) in positions {
        let Some(c) = content_by_id.get(id.as_str()) else {
            return Err(ConfigError::IncompleteNode {
                id: id.clone(),
                missing: "panorama",
            });
        };
        nodes.push(Node {
            id: id.clone(),
            panorama: c.panorama.clone(),
            name: c.name.clone(),
            caption: c.caption.clone(),
            position: *position,
            links: Vec::new(),
        });
    }

    for (a, b) in adjacency {
        if a == b {
            return Err(ConfigError::SelfLink { id: a.clone() });
        }
        let (Some(&ia), Some(&ib)) = (index.get(a.as_str()), index.get(b.as_str())) else {
            let missing = if index.contains_key(a.as_str()) { b } else { a };
            return Err(ConfigError::UnknownAdjacentNode {
                id: missing.clone(),
            });
        };

        let pos_a = nodes[ia].position;
        let pos_b = nodes[ib].position;
        nodes[ia].links.push(Link {
            target: b.clone(),
            target_position: pos_b,
            yaw_rad: initial_bearing(pos_a, pos_b),
            pitch_rad: 0.0,
        });
        nodes[ib].links.push(Link {
            target: a.clone(),
            target_position: pos_a,
            yaw_rad: initial_bearing(pos_b, pos_a),
            pitch_rad: 0.0,
        });
    }

    if !index.contains_key(start_node) {
        return Err(ConfigError::UnknownStartNode {
            id: start_node.to_string(),
        });
    }

    Ok(TourGraph {
        nodes,
        index,
        start_node: start_node.to_string(),
    })
}
