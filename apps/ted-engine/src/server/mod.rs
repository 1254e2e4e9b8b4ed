//! HTTP/JSON API server.

mod http;

pub use http::{AppState, create_router};
