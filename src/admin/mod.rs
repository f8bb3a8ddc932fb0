//! Administrative endpoints.
//!
//! Both routes live under the configured prefix and are compiled into every
//! route table, so they are dispatched by the same lookup as user mappings and
//! survive every reload:
//!
//! - `POST <prefix>/__admin/reload` re-reads the mappings and swaps the table
//! - `GET <prefix>/__admin/routes` lists the table currently in service

pub mod handlers;
pub mod reload;

pub use reload::{run_trigger_loop, ReloadError, ReloadSummary, Reloader};
