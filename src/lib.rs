//! Reloadable HTTP mock server.
//!
//! Serves canned responses described by JSON mapping files, keyed by exact
//! (method, path) under a configurable prefix, and swaps in a freshly loaded
//! route table on demand without dropping traffic.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod mapping;
pub mod observability;
pub mod routing;

pub use admin::Reloader;
pub use config::MockConfig;
pub use http::MockServer;
pub use lifecycle::Shutdown;
