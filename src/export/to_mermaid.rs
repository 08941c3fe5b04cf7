use crate::export::renderer;
use crate::graph::CatalogGraph;
use std::error::Error;

pub fn render(graph: &CatalogGraph) -> Result<String, Box<dyn Error>> {
    renderer::render_template(graph, &get_template())
}

pub fn get_template() -> String {
    let template = r##"flowchart LR
  classDef capability fill:#ff7f0e,color:#fff
  classDef usecase fill:#1f77b4,color:#fff
  classDef tool fill:#2ca02c,color:#fff
  classDef product fill:#d62728,color:#fff

{{#each nodes as |node|}}
  {{node.key}}["{{mermaid_text node.label}}"]:::{{#if (stringeq node.entity_type "use case")}}usecase{{else}}{{node.entity_type}}{{/if}}
{{/each}}
{{#each edges as |edge|}}
  {{edge.source_key}} -->|{{mermaid_text edge.relationship_type}}| {{edge.target_key}}
{{/each}}
"##;

    template.to_string()
}
