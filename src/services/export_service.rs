use sea_orm::DatabaseConnection;
use tracing::info;

use crate::errors::{CatalogError, CatalogResult};
use crate::export::ExportFormat;
use crate::services::graph_service::{GraphFilter, GraphService};

#[derive(Clone)]
pub struct ExportService {
    graphs: GraphService,
}

impl ExportService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            graphs: GraphService::new(db),
        }
    }

    /// Render the filtered catalog graph in the requested format.
    pub async fn export_graph(
        &self,
        format: ExportFormat,
        filter: &GraphFilter,
    ) -> CatalogResult<String> {
        let graph = self.graphs.build_graph(filter).await?;
        let rendered = format
            .render(&graph)
            .map_err(|e| CatalogError::Internal(format!("Failed to render {:?}: {}", format, e)))?;

        info!(
            "Exported {} nodes and {} edges as {:?}",
            graph.nodes.len(),
            graph.edges.len(),
            format
        );
        Ok(rendered)
    }
}
