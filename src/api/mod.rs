//! HTTP surface of the screening service.
//!
//! `screening_router()` returns a `Router` that can be mounted on any axum
//! server; `server::start_server` runs it on a bound listener.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::screening_router;
pub use server::{start_server, ScreeningServer, ServerSession};
pub use types::ApiContext;
