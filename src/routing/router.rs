//! Reloadable route dispatch.
//!
//! # Responsibilities
//! - Hold the current `RouteTable`
//! - Look up (method, path) against one consistent snapshot
//! - Publish a replacement table atomically
//!
//! # Design Decisions
//! - `ArcSwap` gives wait-free reads; readers never take a lock
//! - A request pins the `Arc<RouteTable>` it loaded, so a concurrent swap can
//!   neither tear its view nor free the table under it
//! - Replacing cannot fail; everything that can fail happens before it

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::routing::table::{RouteTable, RouteTarget};

/// Outcome of a lookup.
#[derive(Debug, Clone)]
pub enum Dispatch {
    /// Key found. `table` is the snapshot the lookup ran against.
    Matched { table: Arc<RouteTable>, target: RouteTarget },
    /// Key absent from the current table.
    Unmatched { generation: u64 },
}

impl Dispatch {
    pub fn found(&self) -> bool {
        matches!(self, Dispatch::Matched { .. })
    }

    pub fn generation(&self) -> u64 {
        match self {
            Dispatch::Matched { table, .. } => table.generation(),
            Dispatch::Unmatched { generation } => *generation,
        }
    }
}

/// Concurrency-safe holder of the current route table.
#[derive(Debug)]
pub struct ReloadableRouter {
    current: ArcSwap<RouteTable>,
}

impl ReloadableRouter {
    pub fn new(initial: RouteTable) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    /// Look up a request against the current table.
    pub fn serve(&self, method: &str, path: &str) -> Dispatch {
        let table = self.current.load_full();
        match table.lookup(method, path).cloned() {
            Some(target) => Dispatch::Matched { table, target },
            None => Dispatch::Unmatched {
                generation: table.generation(),
            },
        }
    }

    /// Install `table` as current and return the table it replaced.
    ///
    /// Lookups that start after this returns see `table`; lookups already in
    /// flight finish on whichever snapshot they loaded.
    pub fn replace(&self, table: RouteTable) -> Arc<RouteTable> {
        let previous = self.current.swap(Arc::new(table));
        tracing::debug!(
            previous_generation = previous.generation(),
            generation = self.current.load().generation(),
            "Route table replaced"
        );
        previous
    }

    /// The table currently in service.
    pub fn snapshot(&self) -> Arc<RouteTable> {
        self.current.load_full()
    }
}

impl Default for ReloadableRouter {
    fn default() -> Self {
        Self::new(RouteTable::empty())
    }
}
