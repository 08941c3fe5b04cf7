pub mod to_csv_edges;
pub mod to_csv_nodes;
pub mod to_dot;
pub mod to_json;
pub mod to_mermaid;

use std::error::Error;

use serde::{Deserialize, Serialize};

use crate::graph::CatalogGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
pub enum ExportFormat {
    Json,
    Dot,
    Mermaid,
    CsvNodes,
    CsvEdges,
}

impl ExportFormat {
    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace('_', "-").as_str() {
            "json" => Some(ExportFormat::Json),
            "dot" | "graphviz" => Some(ExportFormat::Dot),
            "mermaid" | "mmd" => Some(ExportFormat::Mermaid),
            "csv-nodes" => Some(ExportFormat::CsvNodes),
            "csv-edges" => Some(ExportFormat::CsvEdges),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Dot => "text/vnd.graphviz",
            ExportFormat::Mermaid => "text/plain; charset=utf-8",
            ExportFormat::CsvNodes | ExportFormat::CsvEdges => "text/csv; charset=utf-8",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Dot => "dot",
            ExportFormat::Mermaid => "mmd",
            ExportFormat::CsvNodes | ExportFormat::CsvEdges => "csv",
        }
    }

    pub fn render(&self, graph: &CatalogGraph) -> Result<String, Box<dyn Error>> {
        match self {
            ExportFormat::Json => to_json::render(graph),
            ExportFormat::Dot => to_dot::render(graph),
            ExportFormat::Mermaid => to_mermaid::render(graph),
            ExportFormat::CsvNodes => to_csv_nodes::render(graph),
            ExportFormat::CsvEdges => to_csv_edges::render(graph),
        }
    }
}

/// Common rendering for the template-based exporters
pub mod renderer {
    use crate::graph::CatalogGraph;
    use serde_json::{json, Value};
    use std::error::Error;

    pub fn render_template(graph: &CatalogGraph, template: &str) -> Result<String, Box<dyn Error>> {
        let handlebars = crate::common::get_handlebars();
        let context = create_standard_context(graph);
        let res = handlebars.render_template(template, &context)?;
        Ok(res)
    }

    pub fn create_standard_context(graph: &CatalogGraph) -> Value {
        json!({
            "graph_name": graph.name,
            "nodes": graph.nodes,
            "edges": graph.labelled_edges(),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_names() {
        assert_eq!(ExportFormat::from_name("csv_nodes"), Some(ExportFormat::CsvNodes));
        assert_eq!(ExportFormat::from_name("Graphviz"), Some(ExportFormat::Dot));
        assert_eq!(ExportFormat::from_name("gml"), None);
        assert_eq!(ExportFormat::Mermaid.file_extension(), "mmd");
    }
}
