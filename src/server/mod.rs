//! HTTP server for tollgate

pub mod http;

pub use http::{run, AppState};
