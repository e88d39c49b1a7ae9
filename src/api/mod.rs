//! HTTP transport for the delivery service

pub mod routes;
pub mod server;

pub use routes::AppState;
pub use server::{ApiServer, ApiServerConfig};
