//! HTTP server for the asset registry.
//!
//! Exposes every registry operation as a JSON endpoint under `/v1`. The
//! caller identity comes from a header set by an authenticating proxy, and
//! the logical sequence either from a second header or, when that is
//! absent, from the registry as it serializes the operation.

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use auth::{CallerResolver, HeaderCallerResolver};
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::AregServer;
pub use state::AppState;
