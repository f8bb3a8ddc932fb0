//! Mapping directory watcher for automatic reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

/// Why a reload was requested, for logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadTrigger {
    /// A `*.json` file under the mapping directory changed.
    FileChange,
    /// The process received SIGHUP.
    Signal,
}

impl ReloadTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReloadTrigger::FileChange => "file_change",
            ReloadTrigger::Signal => "signal",
        }
    }
}

/// Watches the mapping directory and emits a trigger for every relevant change.
///
/// The watcher only signals; loading and swapping happen on the reload task,
/// which also debounces bursts of events from editors.
pub struct MappingWatcher {
    dir: PathBuf,
    trigger_tx: mpsc::UnboundedSender<ReloadTrigger>,
}

impl MappingWatcher {
    pub fn new(dir: &Path, trigger_tx: mpsc::UnboundedSender<ReloadTrigger>) -> Self {
        Self {
            dir: dir.to_path_buf(),
            trigger_tx,
        }
    }

    /// Start watching in the background. Dropping the returned watcher stops it.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.trigger_tx.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let relevant = event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove();
                    if relevant && event.paths.iter().any(|p| touches_mappings(p)) {
                        tracing::debug!(paths = ?event.paths, "Mapping change detected");
                        if tx.send(ReloadTrigger::FileChange).is_err() {
                            tracing::debug!("Reload task gone, dropping change event");
                        }
                    }
                }
                Err(e) => tracing::error!(error = %e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.dir, RecursiveMode::Recursive)?;

        tracing::info!(dir = %self.dir.display(), "Mapping watcher started");
        Ok(watcher)
    }
}

fn touches_mappings(path: &Path) -> bool {
    // Removed directories have no extension but may have held mapping files.
    match path.extension() {
        Some(ext) => ext == "json",
        None => true,
    }
}
