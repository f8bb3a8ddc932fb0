//! Mapping source subsystem.
//!
//! # Data Flow
//! ```text
//! mappings/ directory (*.json, any depth)
//!     → loader.rs (walk in lexicographic order, parse each file)
//!     → Vec<MappingRecord> (traversal order preserved)
//!     → routing::table (compile into a RouteTable)
//!
//! On change:
//!     watcher.rs detects a write under the directory
//!     → reload trigger sent to the admin reloader
//! ```
//!
//! # Design Decisions
//! - Records are plain values; nothing here interprets a response body
//! - Traversal order is part of the contract (last definition wins later on)
//! - Loading is behind the `MappingSource` trait so reloads are testable

pub mod compare;
pub mod loader;
pub mod types;
pub mod watcher;

pub use compare::mappings_equal;
pub use loader::{load_mappings_from_dir, load_mappings_from_file, DirectorySource, MappingError, MappingSource};
pub use types::{MappingRecord, MockResponse, RawBody};
pub use watcher::{MappingWatcher, ReloadTrigger};
