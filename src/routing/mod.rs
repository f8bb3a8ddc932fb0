//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (load current table snapshot)
//!     → table.rs (exact (METHOD, path) lookup)
//!     → Return: Matched(target) or Unmatched
//!
//! Route Compilation (startup and every reload):
//!     MappingRecord[]
//!     → Validate and compile responses
//!     → Key by (METHOD, prefix + path), last definition wins
//!     → Register admin routes
//!     → Freeze as immutable RouteTable
//!     → ReloadableRouter::replace
//! ```
//!
//! # Design Decisions
//! - Tables are immutable; a reload publishes a whole new table
//! - Exact matching only, no wildcards or regex
//! - Deterministic: same records in the same order build the same table

pub mod router;
pub mod table;

pub use router::{Dispatch, ReloadableRouter};
pub use table::{
    build, AdminAction, BuildError, CannedResponse, RouteKey, RouteTable, RouteTableBuilder, RouteTarget,
    ADMIN_RELOAD_SUFFIX, ADMIN_ROUTES_SUFFIX,
};
