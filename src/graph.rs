use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::database::entities::{catalog_entities, EntityType};
use crate::services::relationship_service::RelationshipView;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
pub struct CatalogGraph {
    pub name: String,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
pub struct GraphNode {
    pub id: i32,
    /// Identifier safe to use in DOT and Mermaid output
    pub key: String,
    pub label: String,
    pub entity_type: String,
    pub color: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
pub struct GraphEdge {
    pub id: i32,
    pub source: i32,
    pub target: i32,
    pub source_key: String,
    pub target_key: String,
    pub relationship_type: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub nodes_by_type: BTreeMap<String, usize>,
    pub edges_by_type: BTreeMap<String, usize>,
}

pub fn node_key(id: i32) -> String {
    format!("n{}", id)
}

impl GraphNode {
    pub fn new(
        id: i32,
        label: String,
        entity_type: String,
        description: Option<String>,
        tags: Vec<String>,
    ) -> Self {
        let color = EntityType::from_str(&entity_type)
            .map(|t| t.color())
            .unwrap_or("#808080")
            .to_string();
        Self {
            id,
            key: node_key(id),
            label,
            entity_type,
            color,
            description,
            tags,
        }
    }

    pub fn from_model(model: &catalog_entities::Model, tags: Vec<String>) -> Self {
        Self::new(
            model.id,
            model.name.clone(),
            model.entity_type.clone(),
            model.description.clone(),
            tags,
        )
    }
}

impl GraphEdge {
    pub fn from_view(view: &RelationshipView) -> Self {
        Self {
            id: view.id,
            source: view.source_id,
            target: view.target_id,
            source_key: node_key(view.source_id),
            target_key: node_key(view.target_id),
            relationship_type: view.relationship_type.clone(),
        }
    }
}

impl CatalogGraph {
    /// Build a graph, dropping edges whose endpoints are not both present.
    pub fn new(name: impl Into<String>, nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        let node_ids: HashSet<i32> = nodes.iter().map(|n| n.id).collect();
        let total = edges.len();
        let edges: Vec<GraphEdge> = edges
            .into_iter()
            .filter(|e| node_ids.contains(&e.source) && node_ids.contains(&e.target))
            .collect();

        if edges.len() < total {
            debug!(
                "Dropped {} edges with an endpoint outside the node set",
                total - edges.len()
            );
        }

        Self {
            name: name.into(),
            nodes,
            edges,
        }
    }

    pub fn get_node_by_id(&self, id: i32) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Number of edges touching each node. Nodes without edges are absent.
    pub fn connection_counts(&self) -> HashMap<i32, usize> {
        let mut counts = HashMap::new();
        for edge in &self.edges {
            *counts.entry(edge.source).or_insert(0) += 1;
            *counts.entry(edge.target).or_insert(0) += 1;
        }
        counts
    }

    /// Keep nodes with at least `min` edges, then drop edges left dangling.
    /// Counts are taken once, before any node is removed.
    pub fn retain_min_connections(&mut self, min: usize) {
        if min == 0 {
            return;
        }
        let counts = self.connection_counts();
        self.nodes
            .retain(|n| counts.get(&n.id).copied().unwrap_or(0) >= min);

        let node_ids: HashSet<i32> = self.nodes.iter().map(|n| n.id).collect();
        self.edges
            .retain(|e| node_ids.contains(&e.source) && node_ids.contains(&e.target));
    }

    pub fn clear_edges(&mut self) {
        self.edges.clear();
    }

    pub fn stats(&self) -> GraphStats {
        let mut nodes_by_type = BTreeMap::new();
        for node in &self.nodes {
            *nodes_by_type.entry(node.entity_type.clone()).or_insert(0) += 1;
        }
        let mut edges_by_type = BTreeMap::new();
        for edge in &self.edges {
            *edges_by_type
                .entry(edge.relationship_type.clone())
                .or_insert(0) += 1;
        }
        GraphStats {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            nodes_by_type,
            edges_by_type,
        }
    }

    /// Edges paired with their endpoint labels, for templates.
    pub fn labelled_edges(&self) -> Vec<LabelledEdge<'_>> {
        let labels: HashMap<i32, &str> = self
            .nodes
            .iter()
            .map(|n| (n.id, n.label.as_str()))
            .collect();
        self.edges
            .iter()
            .map(|edge| LabelledEdge {
                edge,
                source_label: labels.get(&edge.source).copied().unwrap_or_default(),
                target_label: labels.get(&edge.target).copied().unwrap_or_default(),
            })
            .collect()
    }
}

#[derive(Serialize, Debug)]
pub struct LabelledEdge<'a> {
    #[serde(flatten)]
    pub edge: &'a GraphEdge,
    pub source_label: &'a str,
    pub target_label: &'a str,
}
