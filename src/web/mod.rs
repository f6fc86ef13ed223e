//! HTTP API and the embedded browser frontend.

pub mod frontend;
pub mod handlers;
pub mod server;

pub use server::{build_router, start_web_server, WebState};
