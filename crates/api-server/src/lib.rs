//! Thin REST surface over the recommendation agents.

pub mod rest;
pub mod server;

pub use rest::AppState;
pub use server::ApiServer;
