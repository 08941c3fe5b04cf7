pub mod auth;
pub mod common;
pub mod config;
pub mod database;
pub mod errors;
pub mod export;
pub mod graph;
pub mod services;

#[cfg(feature = "server")]
pub mod server;
