//! Database and service integration tests
//!
//! Schema constraints, cascades, audit pairing and account lockout against a
//! migrated SQLite file.

use anyhow::Result;
use ea_catalog::auth::{AdminActor, AdminRole};
use ea_catalog::common::db_errors::DbErrorKind;
use ea_catalog::config::{AuthConfig, DatabaseConfig};
use ea_catalog::database::entities::*;
use ea_catalog::database::setup_database;
use ea_catalog::services::entity_service::{EntityInput, EntityUpdate};
use ea_catalog::services::relationship_service::RelationshipInput;
use ea_catalog::services::{
    AdminService, AuthService, EntityService, RelationshipService, TagService,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, Set,
};
use tempfile::NamedTempFile;

/// Create a test database connection with migrations
async fn setup_test_db() -> Result<(DatabaseConnection, NamedTempFile)> {
    let temp_file = NamedTempFile::new()?;
    let config = DatabaseConfig::new(format!("sqlite://{}?mode=rwc", temp_file.path().display()));
    let db = setup_database(&config).await?;
    Ok((db, temp_file))
}

fn admin() -> AdminActor {
    AdminActor::new("alice", AdminRole::Admin)
}

fn entity_input(name: &str, entity_type: &str) -> EntityInput {
    EntityInput {
        name: name.to_string(),
        entity_type: entity_type.to_string(),
        ..Default::default()
    }
}

async fn audit_count(db: &DatabaseConnection) -> Result<u64> {
    Ok(audit_log::Entity::find().count(db).await?)
}

#[tokio::test]
async fn test_database_migrations() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;

    assert_eq!(catalog_entities::Entity::find().count(&db).await?, 0);
    assert_eq!(relationships::Entity::find().count(&db).await?, 0);
    assert_eq!(tags::Entity::find().count(&db).await?, 0);
    assert_eq!(entity_tags::Entity::find().count(&db).await?, 0);
    assert_eq!(audit_log::Entity::find().count(&db).await?, 0);
    assert_eq!(admin_users::Entity::find().count(&db).await?, 0);
    assert_eq!(admin_sessions::Entity::find().count(&db).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_entity_type_is_constrained() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;

    // Schema rejects unknown types even when the service is bypassed
    let mut raw = catalog_entities::ActiveModel::new("Mystery".to_string(), EntityType::Tool);
    raw.entity_type = Set("service".to_string());
    assert!(raw.insert(&db).await.is_err());

    let service = EntityService::new(db.clone());
    let err = service
        .create_entity(&admin(), entity_input("Mystery", "service"))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = service
        .create_entity(&admin(), entity_input("   ", "tool"))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    for (name, entity_type) in [
        ("A", "capability"),
        ("B", "Use Case"),
        ("C", "TOOL"),
        ("D", "product"),
    ] {
        service.create_entity(&admin(), entity_input(name, entity_type)).await?;
    }

    let stored: Vec<String> = catalog_entities::Entity::find()
        .all(&db)
        .await?
        .into_iter()
        .map(|e| e.entity_type)
        .collect();
    for entity_type in stored {
        assert!(EntityType::from_str(&entity_type).is_some());
        assert!(["capability", "use case", "tool", "product"].contains(&entity_type.as_str()));
    }

    Ok(())
}

#[tokio::test]
async fn test_relationship_uniqueness_scenario() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let entities = EntityService::new(db.clone());
    let relationships = RelationshipService::new(db.clone());

    let cloud = entities
        .create_entity(&admin(), entity_input("Cloud Migration", "capability"))
        .await?;
    let kubernetes = entities
        .create_entity(&admin(), entity_input("Kubernetes", "tool"))
        .await?;
    assert_eq!(cloud.id, 1);
    assert_eq!(kubernetes.id, 2);

    let input = RelationshipInput {
        source_id: 2,
        target_id: 1,
        relationship_type: "enables".to_string(),
    };
    relationships.create_relationship(&admin(), input.clone()).await?;

    let err = relationships
        .create_relationship(&admin(), input)
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(err.http_status_code(), 409);

    // The unique index holds without the service check too
    let raw = relationships::ActiveModel::new(2, 1, RelationshipType::Enables)
        .insert(&db)
        .await
        .unwrap_err();
    assert_eq!(DbErrorKind::from_db_err(&raw), DbErrorKind::UniqueViolation);

    // A different type between the same pair is allowed
    relationships
        .create_relationship(
            &admin(),
            RelationshipInput {
                source_id: 2,
                target_id: 1,
                relationship_type: "supports".to_string(),
            },
        )
        .await?;
    assert_eq!(relationships::Entity::find().count(&db).await?, 2);

    Ok(())
}

#[tokio::test]
async fn test_tag_names_are_unique() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;

    tags::ActiveModel::new("cloud".to_string()).insert(&db).await?;
    let err = tags::ActiveModel::new("cloud".to_string())
        .insert(&db)
        .await
        .unwrap_err();
    assert_eq!(DbErrorKind::from_db_err(&err), DbErrorKind::UniqueViolation);

    let err = TagService::new(db.clone())
        .create_tag(&admin(), "cloud")
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    Ok(())
}

#[tokio::test]
async fn test_entity_delete_cascades() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let entities = EntityService::new(db.clone());
    let relationships = RelationshipService::new(db.clone());

    let cloud = entities
        .create_entity(
            &admin(),
            EntityInput {
                tags: vec!["cloud".to_string(), "strategy".to_string()],
                ..entity_input("Cloud Migration", "capability")
            },
        )
        .await?;
    let kubernetes = entities
        .create_entity(
            &admin(),
            EntityInput {
                tags: vec!["cloud".to_string()],
                ..entity_input("Kubernetes", "tool")
            },
        )
        .await?;
    let aws = entities.create_entity(&admin(), entity_input("AWS", "product")).await?;

    for (source, target, relationship_type) in [
        (kubernetes.id, cloud.id, "enables"),
        (cloud.id, aws.id, "uses"),
        (aws.id, kubernetes.id, "powered by"),
    ] {
        relationships
            .create_relationship(
                &admin(),
                RelationshipInput {
                    source_id: source,
                    target_id: target,
                    relationship_type: relationship_type.to_string(),
                },
            )
            .await?;
    }

    entities.delete_entity(&admin(), cloud.id).await?;

    let remaining = relationships::Entity::find().all(&db).await?;
    assert_eq!(remaining.len(), 1);
    assert!(remaining
        .iter()
        .all(|r| r.source_id != cloud.id && r.target_id != cloud.id));

    let links = entity_tags::Entity::find()
        .filter(entity_tags::Column::EntityId.eq(cloud.id))
        .count(&db)
        .await?;
    assert_eq!(links, 0);

    // Tags themselves survive
    assert_eq!(tags::Entity::find().count(&db).await?, 2);

    let err = entities.delete_entity(&admin(), cloud.id).await.unwrap_err();
    assert!(err.is_not_found());

    Ok(())
}

#[tokio::test]
async fn test_each_mutation_writes_one_audit_row() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let entities = EntityService::new(db.clone());
    let relationships = RelationshipService::new(db.clone());
    let tags = TagService::new(db.clone());

    let cloud = entities
        .create_entity(&admin(), entity_input("Cloud Migration", "capability"))
        .await?;
    assert_eq!(audit_count(&db).await?, 1);

    let kubernetes = entities
        .create_entity(&admin(), entity_input("Kubernetes", "tool"))
        .await?;
    assert_eq!(audit_count(&db).await?, 2);

    entities
        .update_entity(
            &admin(),
            kubernetes.id,
            EntityUpdate {
                description: Some("Container orchestration".to_string()),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(audit_count(&db).await?, 3);

    let relationship = relationships
        .create_relationship(
            &admin(),
            RelationshipInput {
                source_id: kubernetes.id,
                target_id: cloud.id,
                relationship_type: "enables".to_string(),
            },
        )
        .await?;
    assert_eq!(audit_count(&db).await?, 4);

    relationships.delete_relationship(&admin(), relationship.id).await?;
    assert_eq!(audit_count(&db).await?, 5);

    let tag = tags.create_tag(&admin(), "containers").await?;
    tags.delete_tag(&admin(), tag.id).await?;
    assert_eq!(audit_count(&db).await?, 7);

    entities.delete_entity(&admin(), cloud.id).await?;
    assert_eq!(audit_count(&db).await?, 8);

    // Failed mutations leave no trace
    let _ = entities.update_entity(&admin(), 999, EntityUpdate::default()).await;
    let _ = entities
        .create_entity(&admin(), entity_input("Bad", "service"))
        .await;
    assert_eq!(audit_count(&db).await?, 8);

    let actions: Vec<String> = audit_log::Entity::find()
        .all(&db)
        .await?
        .into_iter()
        .map(|row| row.action_type)
        .collect();
    assert_eq!(
        actions,
        vec![
            "create_entity",
            "create_entity",
            "update_entity",
            "create_relationship",
            "delete_relationship",
            "create_tag",
            "delete_tag",
            "delete_entity",
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_mutation_rolls_back_when_audit_fails() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    db.execute_unprepared("DROP TABLE audit_log").await?;

    let result = EntityService::new(db.clone())
        .create_entity(&admin(), entity_input("Cloud Migration", "capability"))
        .await;
    assert!(result.is_err());
    assert_eq!(catalog_entities::Entity::find().count(&db).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_bulk_delete_requires_super_admin() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let entities = EntityService::new(db.clone());

    let mut ids = Vec::new();
    for name in ["One", "Two", "Three"] {
        ids.push(entities.create_entity(&admin(), entity_input(name, "tool")).await?.id);
    }

    let err = entities
        .bulk_delete_entities(&admin(), &ids)
        .await
        .unwrap_err();
    assert_eq!(err.http_status_code(), 403);

    let root = AdminActor::new("root", AdminRole::SuperAdmin);
    let deleted = entities.bulk_delete_entities(&root, &ids).await?;
    assert_eq!(deleted, 3);

    let bulk_rows = audit_log::Entity::find()
        .filter(audit_log::Column::ActionType.eq("bulk_delete"))
        .count(&db)
        .await?;
    assert_eq!(bulk_rows, 1);

    Ok(())
}

#[tokio::test]
async fn test_five_wrong_passwords_lock_the_account() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let config = AuthConfig {
        bcrypt_cost: 4,
        bootstrap_password: Some("correct-password".to_string()),
        ..AuthConfig::default()
    };
    let auth = AuthService::new(db.clone(), config);
    assert!(auth.ensure_super_admin().await?);

    for attempt in 1..=5 {
        let err = auth.login("superadmin", "wrong-password").await.unwrap_err();
        let expected = if attempt < 5 { 401 } else { 423 };
        assert_eq!(err.http_status_code(), expected);
    }

    let user = admin_users::Entity::find_by_id("superadmin".to_string())
        .one(&db)
        .await?
        .expect("bootstrap admin exists");
    assert!(user.account_locked);
    assert_eq!(user.failed_attempts, 5);
    assert!(user.last_failed_attempt.is_some());

    let err = auth.login("superadmin", "correct-password").await.unwrap_err();
    assert_eq!(err.error_code(), "ACCOUNT_LOCKED");

    // A super admin can lift the lock early
    AdminService::new(db.clone(), 4)
        .unlock_admin(&AdminActor::system(), "superadmin")
        .await?;
    let session = auth.login("superadmin", "correct-password").await?;
    assert_eq!(session.role, AdminRole::SuperAdmin);

    Ok(())
}
