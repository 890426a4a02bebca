//! HTTP binding for the roundlot auction engine.
//!
//! Maps the engine's operations one-to-one onto REST endpoints, with the
//! error taxonomy translated to HTTP status codes. The server owns no
//! auction logic: handlers validate ids, call the engine, and shape
//! responses.

mod app;
mod error;
mod state;

pub mod routes;

pub use app::{create_app, ServerConfig};
pub use error::{AppError, AppResult};
pub use state::{ServerMetrics, ServerState};
