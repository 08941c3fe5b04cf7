use anyhow::Result;
use sea_orm::*;
use serde_json::json;
use tracing::info;

use crate::database::entities::{catalog_entities, relationships, EntityType, RelationshipType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub entities_created: usize,
    pub relationships_created: usize,
}

struct SampleEntity {
    name: &'static str,
    entity_type: EntityType,
    metadata: Option<serde_json::Value>,
}

fn sample_entities() -> Vec<SampleEntity> {
    let capability = |name: &'static str, domain: &str, maturity: &str, stack: [&str; 2]| SampleEntity {
        name,
        entity_type: EntityType::Capability,
        metadata: Some(json!({
            "domain": domain,
            "maturity": maturity,
            "criticality": "High",
            "technology_stack": stack,
        })),
    };
    let use_case = |name: &'static str, domain: &str, complexity: &str, stack: [&str; 2]| SampleEntity {
        name,
        entity_type: EntityType::UseCase,
        metadata: Some(json!({
            "domain": domain,
            "complexity": complexity,
            "priority": "High",
            "technology_stack": stack,
        })),
    };
    let tool = |name: &'static str, vendor: &str, deployment: &str, stack: [&str; 2]| SampleEntity {
        name,
        entity_type: EntityType::Tool,
        metadata: Some(json!({
            "vendor": vendor,
            "deployment": deployment,
            "technology_stack": stack,
        })),
    };
    let product = |name: &'static str| SampleEntity {
        name,
        entity_type: EntityType::Product,
        metadata: None,
    };

    vec![
        capability("Cloud Infrastructure Management", "Infrastructure", "High", ["Cloud", "DevOps"]),
        capability("Data Analytics Platform", "Analytics", "Medium", ["Big Data", "Analytics"]),
        capability("Security & Compliance", "Security", "High", ["Security", "Compliance"]),
        capability("API Management", "Integration", "High", ["API", "Integration"]),
        use_case("Real-time Data Processing", "Analytics", "High", ["Big Data", "Stream Processing"]),
        use_case("User Authentication", "Security", "Medium", ["Security", "IAM"]),
        use_case("Resource Monitoring", "Infrastructure", "Medium", ["Monitoring", "DevOps"]),
        use_case("API Gateway Integration", "Integration", "High", ["API", "Integration"]),
        tool("AWS Cloud Services", "AWS", "Cloud", ["Cloud", "Infrastructure"]),
        tool("Kubernetes", "CNCF", "Hybrid", ["Container", "DevOps"]),
        tool("Elasticsearch", "Elastic", "Hybrid", ["Search", "Analytics"]),
        tool("Kong API Gateway", "Kong", "Hybrid", ["API", "Integration"]),
        product("Customer Portal"),
        product("Analytics Dashboard"),
        product("Mobile App"),
        product("Payment Gateway"),
    ]
}

const SAMPLE_RELATIONSHIPS: [(&str, &str, RelationshipType); 9] = [
    ("Cloud Infrastructure Management", "Resource Monitoring", RelationshipType::Enables),
    ("Cloud Infrastructure Management", "AWS Cloud Services", RelationshipType::ImplementedBy),
    ("Cloud Infrastructure Management", "Kubernetes", RelationshipType::Uses),
    ("Data Analytics Platform", "Real-time Data Processing", RelationshipType::Supports),
    ("Data Analytics Platform", "Elasticsearch", RelationshipType::PoweredBy),
    ("Data Analytics Platform", "Analytics Dashboard", RelationshipType::Delivers),
    ("API Management", "API Gateway Integration", RelationshipType::Enables),
    ("API Management", "Kong API Gateway", RelationshipType::ImplementedBy),
    ("API Management", "Customer Portal", RelationshipType::Supports),
];

fn sample_description(entity: &SampleEntity) -> String {
    match entity.entity_type {
        EntityType::Capability => format!("Enterprise capability for {}", entity.name),
        EntityType::UseCase => format!("Use case for {}", entity.name),
        EntityType::Tool => format!("Implementation tool: {}", entity.name),
        EntityType::Product => format!("{} solution", entity.name),
    }
}

/// Load the sample catalog. Entities are matched by name and type, so running
/// this twice creates nothing the second time.
pub async fn seed_sample_catalog(db: &DatabaseConnection) -> Result<SeedSummary> {
    let txn = db.begin().await?;
    let mut summary = SeedSummary::default();
    let mut ids = std::collections::HashMap::new();

    for sample in sample_entities() {
        let existing = catalog_entities::Entity::find()
            .filter(catalog_entities::Column::Name.eq(sample.name))
            .filter(catalog_entities::Column::EntityType.eq(sample.entity_type.as_str()))
            .one(&txn)
            .await?;

        let id = match existing {
            Some(entity) => entity.id,
            None => {
                let mut model =
                    catalog_entities::ActiveModel::new(sample.name.to_string(), sample.entity_type);
                model.description = Set(Some(sample_description(&sample)));
                model.metadata = Set(sample.metadata.clone());
                let created = model.insert(&txn).await?;
                summary.entities_created += 1;
                created.id
            }
        };
        ids.insert(sample.name, id);
    }

    for (source, target, relationship_type) in SAMPLE_RELATIONSHIPS {
        let (Some(&source_id), Some(&target_id)) = (ids.get(source), ids.get(target)) else {
            continue;
        };

        let exists = relationships::Entity::find()
            .filter(relationships::Column::SourceId.eq(source_id))
            .filter(relationships::Column::TargetId.eq(target_id))
            .filter(relationships::Column::RelationshipType.eq(relationship_type.as_str()))
            .one(&txn)
            .await?
            .is_some();

        if !exists {
            relationships::ActiveModel::new(source_id, target_id, relationship_type)
                .insert(&txn)
                .await?;
            summary.relationships_created += 1;
        }
    }

    txn.commit().await?;

    info!(
        "Sample data loaded: {} entities and {} relationships created",
        summary.entities_created, summary.relationships_created
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let (db, _dir) = setup_test_db().await;

        let first = seed_sample_catalog(&db).await.unwrap();
        assert_eq!(first.entities_created, 16);
        assert_eq!(first.relationships_created, 9);

        let second = seed_sample_catalog(&db).await.unwrap();
        assert_eq!(second, SeedSummary::default());

        let count = catalog_entities::Entity::find().count(&db).await.unwrap();
        assert_eq!(count, 16);
    }
}
