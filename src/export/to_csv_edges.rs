use crate::graph::CatalogGraph;
use csv::Writer;
use std::error::Error;

pub fn render(graph: &CatalogGraph) -> Result<String, Box<dyn Error>> {
    let mut wtr = Writer::from_writer(vec![]);

    wtr.write_record([
        "id",
        "source_id",
        "source_name",
        "target_id",
        "target_name",
        "relationship_type",
    ])?;

    for labelled in graph.labelled_edges() {
        wtr.write_record([
            labelled.edge.id.to_string(),
            labelled.edge.source.to_string(),
            labelled.source_label.to_string(),
            labelled.edge.target.to_string(),
            labelled.target_label.to_string(),
            labelled.edge.relationship_type.clone(),
        ])?;
    }

    let data = wtr.into_inner()?;
    let csv_string = String::from_utf8(data)?;

    Ok(csv_string)
}
