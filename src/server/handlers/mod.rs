pub mod admins;
pub mod audit;
pub mod auth;
pub mod entities;
pub mod graph;
pub mod health;
pub mod relationships;
pub mod tags;
