use crate::export::renderer;
use crate::graph::CatalogGraph;
use std::error::Error;

pub fn render(graph: &CatalogGraph) -> Result<String, Box<dyn Error>> {
    renderer::render_template(graph, &get_template())
}

pub fn get_template() -> String {
    let template = r##"digraph "{{quote graph_name}}" {
    rankdir="LR";
    splines=true;
    overlap=false;
    fontname="Lato";
    node [ shape="box" style="filled, rounded" fontname="Lato" fontcolor="#ffffff" margin=0.2 ]
    edge [ fontname="Lato" color="#2B303A" ]

{{#each nodes as |node|}}
    {{node.key}} [label="{{quote node.label}}" fillcolor="{{node.color}}" tooltip="{{quote node.entity_type}}{{#if (exists node.description)}}: {{quote node.description}}{{/if}}"];
{{/each}}

{{#each edges as |edge|}}
    {{edge.source_key}} -> {{edge.target_key}} [label="{{quote edge.relationship_type}}"];
{{/each}}
}
"##;

    template.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::test_graph;

    #[test]
    fn renders_nodes_and_edges() {
        let res = render(&test_graph::sample()).expect("This to render");

        assert!(res.starts_with("digraph \"EA Catalog\" {"));
        assert!(res.contains(r##"n1 [label="Cloud Migration" fillcolor="#ff7f0e" tooltip="capability: Move workloads \"as is\""];"##));
        assert!(res.contains(r##"n2 [label="Kubernetes" fillcolor="#2ca02c" tooltip="tool"];"##));
        assert!(res.contains(r#"n2 -> n1 [label="enables"];"#));
        assert!(res.trim_end().ends_with('}'));
    }
}
