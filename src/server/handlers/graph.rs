use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

use super::entities::{split_list, EntityQuery};
use crate::export::ExportFormat;
use crate::graph::CatalogGraph;
use crate::server::app::AppState;
use crate::server::error::{ApiError, ApiResult, ErrorBody};
use crate::services::entity_service::SearchField;
use crate::services::{GraphFilter, ValidationService};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GraphQuery {
    #[serde(rename = "type")]
    pub entity_type: Option<String>,
    pub search: Option<String>,
    pub search_in: Option<SearchField>,
    pub tags: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    /// Comma separated relationship types
    pub relationship_types: Option<String>,
    /// Defaults to true
    pub show_relationships: Option<bool>,
    /// Drop nodes with fewer edges than this
    pub min_connections: Option<usize>,
}

impl GraphQuery {
    pub fn to_filter(&self) -> ApiResult<GraphFilter> {
        let entities = EntityQuery {
            entity_type: self.entity_type.clone(),
            search: self.search.clone(),
            search_in: self.search_in,
            tags: self.tags.clone(),
            created_after: self.created_after,
            created_before: self.created_before,
        }
        .to_filter()?;

        let relationship_types = split_list(self.relationship_types.as_deref())
            .iter()
            .map(|t| ValidationService::parse_relationship_type(t))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(GraphFilter {
            entities,
            relationship_types,
            show_relationships: self.show_relationships.unwrap_or(true),
            min_connections: self.min_connections.unwrap_or(0),
        })
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/graph",
    tag = "catalog",
    params(GraphQuery),
    responses(
        (status = 200, description = "Filtered catalog graph", body = CatalogGraph),
        (status = 400, description = "Invalid filter", body = ErrorBody)
    )
)]
pub async fn get_graph(
    State(state): State<AppState>,
    Query(query): Query<GraphQuery>,
) -> ApiResult<Json<CatalogGraph>> {
    let filter = query.to_filter()?;
    Ok(Json(state.graphs.build_graph(&filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/graph/export/{format}",
    tag = "catalog",
    params(
        ("format" = String, Path, description = "json, dot, mermaid, csv-nodes or csv-edges"),
        GraphQuery
    ),
    responses(
        (status = 200, description = "Rendered graph"),
        (status = 400, description = "Unknown format or invalid filter", body = ErrorBody)
    )
)]
pub async fn export_graph(
    State(state): State<AppState>,
    Path(format): Path<String>,
    Query(query): Query<GraphQuery>,
) -> ApiResult<Response> {
    let format = ExportFormat::from_name(&format)
        .ok_or_else(|| ApiError::BadRequest(format!("Unsupported export format '{}'", format)))?;
    let filter = query.to_filter()?;

    let body = state.exports.export_graph(format, &filter).await?;
    let disposition = format!(
        "attachment; filename=\"ea-catalog.{}\"",
        format.file_extension()
    );

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
