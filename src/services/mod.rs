pub mod admin_service;
pub mod audit_service;
pub mod auth_service;
pub mod entity_service;
pub mod export_service;
pub mod graph_service;
pub mod relationship_service;
pub mod tag_service;
pub mod validation;

pub use admin_service::{AdminService, AdminView};
pub use audit_service::{AuditLogFilter, AuditService, AuditSummary};
pub use auth_service::{AuthService, SessionInfo};
pub use entity_service::{EntityFilter, EntityService};
pub use export_service::ExportService;
pub use graph_service::{GraphFilter, GraphService};
pub use relationship_service::{RelationshipFilter, RelationshipService};
pub use tag_service::TagService;
pub use validation::ValidationService;
