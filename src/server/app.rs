use anyhow::Result;
use axum::{
    http::HeaderValue,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::handlers::{admins, audit, auth, entities, graph, health, relationships, tags};
use crate::config::AuthConfig;
use crate::services::{
    AdminService, AuditService, AuthService, EntityService, ExportService, GraphService,
    RelationshipService, TagService,
};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub entities: EntityService,
    pub relationships: RelationshipService,
    pub tags: TagService,
    pub graphs: GraphService,
    pub exports: ExportService,
    pub audit: AuditService,
    pub auth: AuthService,
    pub admins: AdminService,
}

impl AppState {
    pub fn new(db: DatabaseConnection, auth_config: &AuthConfig) -> Self {
        Self {
            entities: EntityService::new(db.clone()),
            relationships: RelationshipService::new(db.clone()),
            tags: TagService::new(db.clone()),
            graphs: GraphService::new(db.clone()),
            exports: ExportService::new(db.clone()),
            audit: AuditService::new(db.clone()),
            auth: AuthService::new(db.clone(), auth_config.clone()),
            admins: AdminService::new(db.clone(), auth_config.bcrypt_cost),
            db,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::logout,
        auth::me,
        entities::list_entities,
        entities::get_entity,
        entities::create_entity,
        entities::update_entity,
        entities::delete_entity,
        entities::bulk_delete_entities,
        relationships::list_relationships,
        relationships::get_relationship,
        relationships::create_relationship,
        relationships::update_relationship,
        relationships::delete_relationship,
        relationships::bulk_delete_relationships,
        tags::list_tags,
        tags::create_tag,
        tags::delete_tag,
        graph::get_graph,
        graph::export_graph,
        admins::list_admins,
        admins::create_admin,
        admins::reset_password,
        admins::unlock_admin,
        admins::delete_admin,
        audit::list_audit_logs,
        audit::audit_summary,
    ),
    components(schemas(
        crate::server::error::ErrorBody,
        crate::auth::AdminRole,
        crate::services::SessionInfo,
        crate::services::AdminView,
        crate::services::AuditSummary,
        crate::services::entity_service::EntityInput,
        crate::services::entity_service::EntityUpdate,
        crate::services::entity_service::EntityView,
        crate::services::entity_service::EntityDetail,
        crate::services::entity_service::EntityRelationship,
        crate::services::entity_service::SearchField,
        crate::services::relationship_service::RelationshipInput,
        crate::services::relationship_service::RelationshipUpdate,
        crate::services::relationship_service::RelationshipView,
        crate::services::tag_service::TagView,
        crate::graph::CatalogGraph,
        crate::graph::GraphNode,
        crate::graph::GraphEdge,
        crate::export::ExportFormat,
        crate::database::entities::audit_log::Model,
        auth::LoginRequest,
        auth::MeResponse,
        entities::BulkDeleteRequest,
        entities::BulkDeleteResponse,
        tags::CreateTagRequest,
        admins::CreateAdminRequest,
        admins::ResetPasswordRequest,
    )),
    modifiers(&SessionSecurity),
    tags(
        (name = "catalog", description = "Entities, relationships and tags"),
        (name = "admin", description = "Authentication, admin accounts and audit log"),
    )
)]
pub struct ApiDoc;

struct SessionSecurity;

impl Modify for SessionSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

pub async fn create_app(state: AppState, cors_origin: Option<&str>) -> Result<Router> {
    let cors = match cors_origin.filter(|origin| *origin != "*") {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(health::health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api/v1", api_v1_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state);

    Ok(app)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))

        // Auth
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))

        // Entities
        .route("/entities", get(entities::list_entities))
        .route("/entities", post(entities::create_entity))
        .route("/entities/bulk-delete", post(entities::bulk_delete_entities))
        .route("/entities/:id", get(entities::get_entity))
        .route("/entities/:id", put(entities::update_entity))
        .route("/entities/:id", delete(entities::delete_entity))

        // Relationships
        .route("/relationships", get(relationships::list_relationships))
        .route("/relationships", post(relationships::create_relationship))
        .route("/relationships/bulk-delete", post(relationships::bulk_delete_relationships))
        .route("/relationships/:id", get(relationships::get_relationship))
        .route("/relationships/:id", put(relationships::update_relationship))
        .route("/relationships/:id", delete(relationships::delete_relationship))

        // Tags
        .route("/tags", get(tags::list_tags))
        .route("/tags", post(tags::create_tag))
        .route("/tags/:id", delete(tags::delete_tag))

        // Graph
        .route("/graph", get(graph::get_graph))
        .route("/graph/export/:format", get(graph::export_graph))

        // Admin accounts
        .route("/admins", get(admins::list_admins))
        .route("/admins", post(admins::create_admin))
        .route("/admins/:username", delete(admins::delete_admin))
        .route("/admins/:username/password", put(admins::reset_password))
        .route("/admins/:username/unlock", post(admins::unlock_admin))

        // Audit log
        .route("/audit-logs", get(audit::list_audit_logs))
        .route("/audit-logs/summary", get(audit::audit_summary))
}
