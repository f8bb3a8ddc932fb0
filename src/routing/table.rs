//! Route table compilation.
//!
//! # Responsibilities
//! - Validate mapping records (status, method, path, headers)
//! - Key records by (uppercase method, prefix + path)
//! - Resolve duplicate keys: last definition wins
//! - Register the admin routes into every table that asks for them
//!
//! # Design Decisions
//! - All-or-nothing: one malformed record fails the whole build
//! - Pure function of its input, no I/O
//! - Responses are compiled into `http` types up front so serving cannot fail

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use thiserror::Error;

use crate::mapping::MappingRecord;

/// Path suffix (after the prefix) of the reload endpoint.
pub const ADMIN_RELOAD_SUFFIX: &str = "/__admin/reload";

/// Path suffix (after the prefix) of the route listing endpoint.
pub const ADMIN_ROUTES_SUFFIX: &str = "/__admin/routes";

/// Errors raised while compiling mapping records into a table.
///
/// `index` is the record's position in traversal order.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("mapping #{index} ({method} {path}): invalid status code {status}")]
    InvalidStatus {
        index: usize,
        method: String,
        path: String,
        status: u16,
    },

    #[error("mapping #{index} ({method} {path}): invalid method")]
    InvalidMethod { index: usize, method: String, path: String },

    #[error("mapping #{index} ({method} {path}): path must start with '/'")]
    InvalidPath { index: usize, method: String, path: String },

    #[error("mapping #{index} ({method} {path}): invalid header {name:?}")]
    InvalidHeader {
        index: usize,
        method: String,
        path: String,
        name: String,
    },
}

/// Lookup key: uppercase method and full path (prefix included).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteKey {
    method: String,
    path: String,
}

impl RouteKey {
    pub fn new(method: &str, path: impl Into<String>) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            path: path.into(),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// A mapping response compiled into HTTP types.
#[derive(Debug, Clone, PartialEq)]
pub struct CannedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// Built-in administrative actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    Reload,
    ListRoutes,
}

/// What a matched key dispatches to.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteTarget {
    Canned(Arc<CannedResponse>),
    Admin(AdminAction),
}

/// Immutable dispatch table. A reload builds a new one; nothing mutates it.
#[derive(Debug, Default)]
pub struct RouteTable {
    entries: HashMap<RouteKey, RouteTarget>,
    generation: u64,
    records: usize,
    overridden: usize,
}

impl RouteTable {
    /// An always-miss table.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn lookup(&self, method: &str, path: &str) -> Option<&RouteTarget> {
        self.entries.get(&RouteKey::new(method, path))
    }

    /// Number of distinct keys, admin routes included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of keys backed by a mapping (admin routes excluded).
    pub fn mapped_routes(&self) -> usize {
        self.entries
            .values()
            .filter(|t| matches!(t, RouteTarget::Canned(_)))
            .count()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Records the table was compiled from.
    pub fn source_records(&self) -> usize {
        self.records
    }

    /// Records that were superseded by a later record with the same key.
    pub fn overridden(&self) -> usize {
        self.overridden
    }

    /// All entries sorted by path, then method.
    pub fn routes(&self) -> Vec<(&RouteKey, &RouteTarget)> {
        let mut routes: Vec<_> = self.entries.iter().collect();
        routes.sort_by(|a, b| (a.0.path(), a.0.method()).cmp(&(b.0.path(), b.0.method())));
        routes
    }
}

/// Tables are equivalent when they hold the same keys and responses.
/// Generation and build statistics are ignored.
impl PartialEq for RouteTable {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

/// Compiles mapping records into a `RouteTable`.
#[derive(Debug, Clone)]
pub struct RouteTableBuilder {
    prefix: String,
    admin_routes: bool,
    generation: u64,
}

impl RouteTableBuilder {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            admin_routes: false,
            generation: 0,
        }
    }

    /// Register `POST <prefix>/__admin/reload` and `GET <prefix>/__admin/routes`.
    pub fn with_admin_routes(mut self) -> Self {
        self.admin_routes = true;
        self
    }

    pub fn generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn build(&self, records: &[MappingRecord]) -> Result<RouteTable, BuildError> {
        let mut entries: HashMap<RouteKey, (usize, RouteTarget)> = HashMap::with_capacity(records.len() + 2);
        let mut overridden = 0;

        for (index, record) in records.iter().enumerate() {
            let (key, canned) = compile(index, &self.prefix, record)?;

            if let Some((previous, _)) = entries.insert(key.clone(), (index, RouteTarget::Canned(Arc::new(canned)))) {
                overridden += 1;
                tracing::warn!(
                    method = %key.method(),
                    path = %key.path(),
                    previous,
                    winner = index,
                    "Duplicate route, later mapping wins"
                );
            }
        }

        if self.admin_routes {
            for (method, suffix, action) in [
                (Method::POST, ADMIN_RELOAD_SUFFIX, AdminAction::Reload),
                (Method::GET, ADMIN_ROUTES_SUFFIX, AdminAction::ListRoutes),
            ] {
                let key = RouteKey::new(method.as_str(), format!("{}{}", self.prefix, suffix));
                if let Some((shadowed, _)) = entries.insert(key.clone(), (usize::MAX, RouteTarget::Admin(action))) {
                    tracing::warn!(
                        method = %key.method(),
                        path = %key.path(),
                        mapping = shadowed,
                        "Mapping collides with an admin route and is ignored"
                    );
                }
            }
        }

        Ok(RouteTable {
            entries: entries.into_iter().map(|(k, (_, t))| (k, t)).collect(),
            generation: self.generation,
            records: records.len(),
            overridden,
        })
    }
}

/// Compile `records` under `prefix` into a table without admin routes.
pub fn build(records: &[MappingRecord], prefix: &str) -> Result<RouteTable, BuildError> {
    RouteTableBuilder::new(prefix).build(records)
}

fn compile(index: usize, prefix: &str, record: &MappingRecord) -> Result<(RouteKey, CannedResponse), BuildError> {
    let method = record.method.as_str();
    let path = record.path.as_str();

    let status_code = record.response.status_code;
    let status = match StatusCode::from_u16(status_code) {
        Ok(s) if (100..=599).contains(&status_code) => s,
        _ => {
            return Err(BuildError::InvalidStatus {
                index,
                method: method.into(),
                path: path.into(),
                status: status_code,
            })
        }
    };

    if Method::from_bytes(method.to_ascii_uppercase().as_bytes()).is_err() {
        return Err(BuildError::InvalidMethod {
            index,
            method: method.into(),
            path: path.into(),
        });
    }

    if !path.starts_with('/') {
        return Err(BuildError::InvalidPath {
            index,
            method: method.into(),
            path: path.into(),
        });
    }

    let mut headers = HeaderMap::with_capacity(record.response.headers.len());
    for (name, value) in &record.response.headers {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => {
                return Err(BuildError::InvalidHeader {
                    index,
                    method: method.into(),
                    path: path.into(),
                    name: name.clone(),
                })
            }
        }
    }

    let canned = CannedResponse {
        status,
        headers,
        body: record.response.body.as_ref().map(|b| b.bytes()),
    };

    Ok((RouteKey::new(method, format!("{}{}", prefix, path)), canned))
}
