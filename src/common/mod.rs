//! Common utilities shared by the services, exporters and the HTTP layer

pub mod db_errors;
pub mod handlebars;

pub use handlebars::{get_handlebars, write_string_to_file};
