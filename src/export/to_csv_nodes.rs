use crate::graph::CatalogGraph;
use csv::Writer;
use std::error::Error;

pub fn render(graph: &CatalogGraph) -> Result<String, Box<dyn Error>> {
    let mut wtr = Writer::from_writer(vec![]);

    wtr.write_record(["id", "name", "type", "description", "tags", "color"])?;

    for node in &graph.nodes {
        wtr.write_record([
            node.id.to_string(),
            node.label.clone(),
            node.entity_type.clone(),
            node.description.clone().unwrap_or_default(),
            node.tags.join(";"),
            node.color.clone(),
        ])?;
    }

    let data = wtr.into_inner()?;
    let csv_string = String::from_utf8(data)?;

    Ok(csv_string)
}
