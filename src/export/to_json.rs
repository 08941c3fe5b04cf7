use crate::graph::CatalogGraph;
use std::error::Error;

pub fn render(graph: &CatalogGraph) -> Result<String, Box<dyn Error>> {
    use serde_json::json;

    let res = json!({
        "name": graph.name,
        "nodes": graph.nodes,
        "edges": graph.edges,
        "stats": graph.stats(),
    });
    Ok(serde_json::to_string_pretty(&res)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::test_graph;
    use serde_json::Value;

    #[test]
    fn renders_nodes_edges_and_stats() {
        let res = render(&test_graph::sample()).expect("This to render");
        let value: Value = serde_json::from_str(&res).unwrap();

        assert_eq!(value["nodes"].as_array().unwrap().len(), 2);
        assert_eq!(value["nodes"][0]["color"], "#ff7f0e");
        assert_eq!(value["edges"][0]["relationship_type"], "enables");
        assert_eq!(value["stats"]["edge_count"], 1);
    }
}
