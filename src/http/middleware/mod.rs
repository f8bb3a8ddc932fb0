//! Request interceptors wrapped around dispatch.
//!
//! Neither participates in routing decisions; both are configured once at
//! startup from immutable values.

pub mod access_log;
pub mod cors;

pub use access_log::{access_log_middleware, AccessLog};
pub use cors::{cors_middleware, CorsPolicy};
