//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request id, metrics)
//!     → handlers.rs / websocket.rs / admin (admission through the pipeline)
//!     → error.rs (uniform error body)
//!     → Send to client
//! ```

pub mod error;
pub mod handlers;
pub mod request;
pub mod server;
pub mod websocket;

pub use error::{ApiError, ErrorBody, ErrorCode};
pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer, ServerError};
