//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (assign and propagate x-request-id)
//!     → identity.rs (caller from X-User-ID)
//!     → handlers.rs (checkout, order status, payment callback, health)
//!     → response.rs ({message, data} envelope, status mapping)
//!     → Send to client
//! ```

pub mod handlers;
pub mod identity;
pub mod request;
pub mod response;
pub mod server;

pub use identity::CallerIdentity;
pub use request::X_REQUEST_ID;
pub use response::Envelope;
pub use server::{AppState, HttpServer};
