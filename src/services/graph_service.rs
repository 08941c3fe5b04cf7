use sea_orm::DatabaseConnection;
use tracing::debug;

use crate::database::entities::RelationshipType;
use crate::errors::CatalogResult;
use crate::graph::{CatalogGraph, GraphEdge, GraphNode};
use crate::services::entity_service::{EntityFilter, EntityService};
use crate::services::relationship_service::{RelationshipFilter, RelationshipService};

#[derive(Debug, Clone)]
pub struct GraphFilter {
    pub entities: EntityFilter,
    pub relationship_types: Vec<RelationshipType>,
    pub show_relationships: bool,
    pub min_connections: usize,
}

impl Default for GraphFilter {
    fn default() -> Self {
        Self {
            entities: EntityFilter::default(),
            relationship_types: Vec::new(),
            show_relationships: true,
            min_connections: 0,
        }
    }
}

#[derive(Clone)]
pub struct GraphService {
    entities: EntityService,
    relationships: RelationshipService,
}

impl GraphService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            entities: EntityService::new(db.clone()),
            relationships: RelationshipService::new(db),
        }
    }

    pub async fn build_graph(&self, filter: &GraphFilter) -> CatalogResult<CatalogGraph> {
        let nodes: Vec<GraphNode> = self
            .entities
            .list_entities(&filter.entities)
            .await?
            .into_iter()
            .map(|e| GraphNode::new(e.id, e.name, e.entity_type, e.description, e.tags))
            .collect();

        let edges: Vec<GraphEdge> = if filter.show_relationships {
            let relationship_filter = RelationshipFilter {
                relationship_types: filter.relationship_types.clone(),
                ..Default::default()
            };
            self.relationships
                .list_relationships(&relationship_filter)
                .await?
                .iter()
                .map(GraphEdge::from_view)
                .collect()
        } else {
            Vec::new()
        };

        let mut graph = CatalogGraph::new("EA Catalog", nodes, edges);
        graph.retain_min_connections(filter.min_connections);

        debug!(
            "Built graph with {} nodes and {} edges",
            graph.nodes.len(),
            graph.edges.len()
        );
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AdminActor, AdminRole};
    use crate::database::entities::EntityType;
    use crate::database::test_utils::setup_test_db;
    use crate::services::entity_service::EntityInput;
    use crate::services::relationship_service::RelationshipInput;

    async fn seed(db: &DatabaseConnection) -> (i32, i32, i32) {
        let actor = AdminActor::new("alice", AdminRole::Admin);
        let entities = EntityService::new(db.clone());
        let relationships = RelationshipService::new(db.clone());

        let mut ids = Vec::new();
        for (name, entity_type) in [
            ("Cloud Migration", "capability"),
            ("Kubernetes", "tool"),
            ("AWS", "product"),
        ] {
            let view = entities
                .create_entity(
                    &actor,
                    EntityInput {
                        name: name.to_string(),
                        entity_type: entity_type.to_string(),
                        description: None,
                        metadata: None,
                        tags: vec![],
                    },
                )
                .await
                .unwrap();
            ids.push(view.id);
        }

        for (source, target, relationship_type) in
            [(ids[1], ids[0], "enables"), (ids[2], ids[1], "powered by")]
        {
            relationships
                .create_relationship(
                    &actor,
                    RelationshipInput {
                        source_id: source,
                        target_id: target,
                        relationship_type: relationship_type.to_string(),
                    },
                )
                .await
                .unwrap();
        }

        (ids[0], ids[1], ids[2])
    }

    #[tokio::test]
    async fn type_filter_drops_edges_to_hidden_nodes() {
        let (db, _dir) = setup_test_db().await;
        seed(&db).await;
        let service = GraphService::new(db);

        let full = service.build_graph(&GraphFilter::default()).await.unwrap();
        assert_eq!(full.nodes.len(), 3);
        assert_eq!(full.edges.len(), 2);

        let tools_only = service
            .build_graph(&GraphFilter {
                entities: EntityFilter {
                    entity_type: Some(EntityType::Tool),
                    ..Default::default()
                },
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(tools_only.nodes.len(), 1);
        assert!(tools_only.edges.is_empty());
    }

    #[tokio::test]
    async fn relationship_type_and_min_connection_filters() {
        let (db, _dir) = setup_test_db().await;
        let (_, kubernetes, _) = seed(&db).await;
        let service = GraphService::new(db);

        let graph = service
            .build_graph(&GraphFilter {
                relationship_types: vec![RelationshipType::Enables],
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].relationship_type, "enables");

        let hubs = service
            .build_graph(&GraphFilter {
                min_connections: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        let ids: Vec<i32> = hubs.nodes.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![kubernetes]);

        let hidden = service
            .build_graph(&GraphFilter {
                show_relationships: false,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(hidden.nodes.len(), 3);
        assert!(hidden.edges.is_empty());
    }
}
