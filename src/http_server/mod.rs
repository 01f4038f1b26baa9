//! HTTP façade: admin (console) and client (runtime) surfaces

pub mod admin_routes;
pub mod client_routes;
pub mod config;
pub mod errors;
pub mod server;

pub use config::HttpServerConfig;
pub use errors::{ApiError, ApiResult, ErrorResponse};
pub use server::HttpServer;
