pub mod admin_sessions;
pub mod admin_users;
pub mod audit_log;
pub mod catalog_entities;
pub mod entity_tags;
pub mod relationships;
pub mod tags;

pub use catalog_entities::EntityType;
pub use relationships::RelationshipType;
