use handlebars::{handlebars_helper, no_escape, Handlebars};
use serde_json::Value;
use tracing::info;

use std::fs::File;
use std::io::Write;
use std::path::Path;

pub fn create_path_if_not_exists(path: &str) -> anyhow::Result<()> {
    let parent = match Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => return Ok(()),
    };
    if !parent.exists() {
        info!("Creating path: {:?}", parent);
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub fn write_string_to_file(filename: &str, content: &str) -> anyhow::Result<()> {
    create_path_if_not_exists(filename)?;
    let path = Path::new(filename);
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Handlebars registry for the text exporters.
///
/// HTML escaping is disabled: DOT and Mermaid are not HTML, and labels such
/// as "Security & Compliance" must survive verbatim. Use the `quote` and
/// `mermaid_text` helpers for format-specific escaping.
pub fn get_handlebars() -> Handlebars<'static> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(no_escape);

    handlebars_helper!(exists: |v: Value| {
        match v {
            serde_json::Value::Null => false,
            serde_json::Value::String(s) => !s.trim().is_empty(),
            _ => true,
        }
    });
    handlebars.register_helper("exists", Box::new(exists));

    handlebars_helper!(stringeq: |s1: String, s2: String| s1.eq(&s2));
    handlebars.register_helper("stringeq", Box::new(stringeq));

    handlebars_helper!(quote: |s: String| s.replace('\\', "\\\\").replace('"', "\\\""));
    handlebars.register_helper("quote", Box::new(quote));

    handlebars_helper!(mermaid_text: |s: String| s.replace('"', "#quot;"));
    handlebars.register_helper("mermaid_text", Box::new(mermaid_text));

    handlebars
}
