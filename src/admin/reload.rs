//! Serialized reload of the route table.
//!
//! # Responsibilities
//! - Re-read the mapping source and compile a new table
//! - Publish it through `ReloadableRouter::replace`
//! - Keep the generation counter
//!
//! # Design Decisions
//! - One reload at a time: the generation mutex is held from load to swap
//! - File I/O runs on the blocking pool, never on a request worker
//! - Any failure returns before `replace`; the serving table is untouched
//! - No automatic retry

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, Mutex};

use crate::mapping::{MappingError, MappingSource, ReloadTrigger};
use crate::observability::metrics;
use crate::routing::{BuildError, ReloadableRouter, RouteTable, RouteTableBuilder};

/// Errors that abort a reload. The previous table stays in service.
#[derive(Debug, Error)]
pub enum ReloadError {
    #[error("loading mappings from {location}: {source}")]
    Load {
        location: String,
        #[source]
        source: MappingError,
    },

    #[error("building route table: {0}")]
    Build(#[from] BuildError),

    #[error("reload task aborted: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result of a successful reload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadSummary {
    pub generation: u64,
    /// Routes backed by mappings (admin routes excluded).
    pub routes: usize,
    pub records: usize,
    pub overridden: usize,
    pub elapsed_ms: u128,
}

impl ReloadSummary {
    fn of(table: &RouteTable, started: Instant) -> Self {
        Self {
            generation: table.generation(),
            routes: table.mapped_routes(),
            records: table.source_records(),
            overridden: table.overridden(),
            elapsed_ms: started.elapsed().as_millis(),
        }
    }
}

/// The single writer of a `ReloadableRouter`.
#[derive(Debug)]
pub struct Reloader {
    source: Arc<dyn MappingSource>,
    prefix: String,
    router: Arc<ReloadableRouter>,
    /// Generation of the last published table.
    generation: Mutex<u64>,
}

impl Reloader {
    /// Perform the startup load (generation 0) and create the router it serves from.
    pub fn bootstrap(source: Arc<dyn MappingSource>, prefix: impl Into<String>) -> Result<Self, ReloadError> {
        let prefix = prefix.into();
        let started = Instant::now();
        let table = load_table(source.as_ref(), &prefix, 0)?;
        let summary = ReloadSummary::of(&table, started);

        tracing::info!(
            source = %source.describe(),
            prefix = %prefix,
            routes = summary.routes,
            records = summary.records,
            overridden = summary.overridden,
            "Initial mappings loaded"
        );
        metrics::set_active_routes(summary.routes);

        Ok(Self::new(source, prefix, Arc::new(ReloadableRouter::new(table))))
    }

    /// Wrap an existing router. Generations continue from the router's current table.
    pub fn new(source: Arc<dyn MappingSource>, prefix: impl Into<String>, router: Arc<ReloadableRouter>) -> Self {
        let generation = router.snapshot().generation();
        Self {
            source,
            prefix: prefix.into(),
            router,
            generation: Mutex::new(generation),
        }
    }

    pub fn router(&self) -> &Arc<ReloadableRouter> {
        &self.router
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Re-read the source and atomically publish the new table.
    pub async fn reload(&self) -> Result<ReloadSummary, ReloadError> {
        let mut generation = self.generation.lock().await;
        let started = Instant::now();
        let next = *generation + 1;

        let source = Arc::clone(&self.source);
        let prefix = self.prefix.clone();
        let built = tokio::task::spawn_blocking(move || load_table(source.as_ref(), &prefix, next))
            .await
            .map_err(ReloadError::from)
            .and_then(|result| result);

        let table = match built {
            Ok(table) => table,
            Err(e) => {
                metrics::record_reload(false);
                tracing::error!(
                    error = %e,
                    current_generation = *generation,
                    "Reload failed, keeping current route table"
                );
                return Err(e);
            }
        };

        let summary = ReloadSummary::of(&table, started);
        self.router.replace(table);
        *generation = next;

        metrics::record_reload(true);
        metrics::set_active_routes(summary.routes);
        tracing::info!(
            generation = summary.generation,
            routes = summary.routes,
            overridden = summary.overridden,
            elapsed_ms = summary.elapsed_ms as u64,
            "Mappings reloaded"
        );

        Ok(summary)
    }
}

/// Consume reload triggers until shutdown.
///
/// Triggers arriving within `debounce` of each other are coalesced into a
/// single reload, so an editor writing a file several times reloads once.
pub async fn run_trigger_loop(
    reloader: Arc<Reloader>,
    mut triggers: mpsc::UnboundedReceiver<ReloadTrigger>,
    debounce: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        let trigger = tokio::select! {
            received = triggers.recv() => match received {
                Some(trigger) => trigger,
                None => break,
            },
            _ = shutdown.recv() => break,
        };

        let mut coalesced = 0usize;
        while let Ok(Some(_)) = tokio::time::timeout(debounce, triggers.recv()).await {
            coalesced += 1;
        }

        tracing::info!(trigger = trigger.as_str(), coalesced, "Reload triggered");
        // Failures are logged by `reload`; the previous table keeps serving.
        let _ = reloader.reload().await;
    }

    tracing::debug!("Reload trigger loop stopped");
}

fn load_table(source: &dyn MappingSource, prefix: &str, generation: u64) -> Result<RouteTable, ReloadError> {
    let records = source.load().map_err(|e| ReloadError::Load {
        location: source.describe(),
        source: e,
    })?;

    let table = RouteTableBuilder::new(prefix)
        .with_admin_routes()
        .generation(generation)
        .build(&records)?;

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{MappingRecord, MockResponse};
    use crate::routing::{AdminAction, RouteTarget};
    use std::sync::Mutex as StdMutex;

    /// Source whose contents can be swapped between loads.
    #[derive(Debug, Default)]
    struct StaticSource {
        records: StdMutex<Option<Vec<MappingRecord>>>,
    }

    impl StaticSource {
        fn with(records: Vec<MappingRecord>) -> Arc<Self> {
            Arc::new(Self {
                records: StdMutex::new(Some(records)),
            })
        }

        fn set(&self, records: Option<Vec<MappingRecord>>) {
            *self.records.lock().unwrap() = records;
        }
    }

    impl MappingSource for StaticSource {
        fn load(&self) -> Result<Vec<MappingRecord>, MappingError> {
            self.records.lock().unwrap().clone().ok_or_else(|| MappingError::Io {
                path: "static".into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            })
        }

        fn describe(&self) -> String {
            "static".into()
        }
    }

    fn hello(body: &'static str) -> Vec<MappingRecord> {
        vec![MappingRecord::new("GET", "/hello", MockResponse::new(200).body(body))]
    }

    #[tokio::test]
    async fn test_bootstrap_registers_admin_routes() {
        let reloader = Reloader::bootstrap(StaticSource::with(hello(r#""hi""#)), "/mock").unwrap();
        let table = reloader.router().snapshot();

        assert_eq!(table.generation(), 0);
        assert_eq!(
            table.lookup("POST", "/mock/__admin/reload"),
            Some(&RouteTarget::Admin(AdminAction::Reload))
        );
        assert!(table.lookup("GET", "/mock/hello").is_some());
    }

    #[tokio::test]
    async fn test_reload_publishes_new_generation() {
        let source = StaticSource::with(hello(r#""hi""#));
        let reloader = Reloader::bootstrap(source.clone(), "/mock").unwrap();

        source.set(Some(vec![MappingRecord::new("GET", "/bye", MockResponse::new(200))]));
        let summary = reloader.reload().await.unwrap();

        assert_eq!(summary.generation, 1);
        assert_eq!(summary.routes, 1);
        let table = reloader.router().snapshot();
        assert!(table.lookup("GET", "/mock/hello").is_none());
        assert!(table.lookup("GET", "/mock/bye").is_some());
        // Admin route survives its own reload.
        assert!(table.lookup("POST", "/mock/__admin/reload").is_some());
    }

    #[tokio::test]
    async fn test_unchanged_source_reloads_to_equivalent_table() {
        let reloader = Reloader::bootstrap(StaticSource::with(hello(r#""hi""#)), "/mock").unwrap();

        let before = reloader.router().snapshot();
        reloader.reload().await.unwrap();
        reloader.reload().await.unwrap();
        let after = reloader.router().snapshot();

        assert_eq!(*before, *after);
        assert_eq!(after.generation(), 2);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_current_table() {
        let source = StaticSource::with(hello(r#""hi""#));
        let reloader = Reloader::bootstrap(source.clone(), "/mock").unwrap();

        source.set(None);
        let err = reloader.reload().await.unwrap_err();

        assert!(matches!(err, ReloadError::Load { .. }));
        let table = reloader.router().snapshot();
        assert_eq!(table.generation(), 0);
        assert!(table.lookup("GET", "/mock/hello").is_some());
    }

    #[tokio::test]
    async fn test_failed_build_keeps_current_table_and_generation() {
        let source = StaticSource::with(hello(r#""hi""#));
        let reloader = Reloader::bootstrap(source.clone(), "/mock").unwrap();

        source.set(Some(vec![MappingRecord::new("GET", "/bad", MockResponse::new(1000))]));
        assert!(matches!(reloader.reload().await, Err(ReloadError::Build(_))));

        source.set(Some(hello(r#""again""#)));
        let summary = reloader.reload().await.unwrap();
        assert_eq!(summary.generation, 1);
    }

    #[tokio::test]
    async fn test_concurrent_reloads_are_serialized() {
        let reloader = Arc::new(Reloader::bootstrap(StaticSource::with(hello(r#""hi""#)), "/mock").unwrap());

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let reloader = reloader.clone();
            tasks.spawn(async move { reloader.reload().await.unwrap().generation });
        }

        let mut generations = Vec::new();
        while let Some(g) = tasks.join_next().await {
            generations.push(g.unwrap());
        }
        generations.sort_unstable();

        assert_eq!(generations, (1..=8).collect::<Vec<u64>>());
        assert_eq!(reloader.router().snapshot().generation(), 8);
    }

    #[tokio::test]
    async fn test_trigger_burst_reloads_once() {
        let reloader = Arc::new(Reloader::bootstrap(StaticSource::with(hello(r#""hi""#)), "/mock").unwrap());
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task = tokio::spawn(run_trigger_loop(
            reloader.clone(),
            rx,
            Duration::from_millis(100),
            shutdown_rx,
        ));

        for _ in 0..5 {
            tx.send(ReloadTrigger::FileChange).unwrap();
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(reloader.router().snapshot().generation(), 1);

        tx.send(ReloadTrigger::Signal).unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(reloader.router().snapshot().generation(), 2);

        shutdown_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
    }

    #[test]
    fn test_bootstrap_failure_is_reported() {
        let source = StaticSource::with(Vec::new());
        source.set(None);
        assert!(Reloader::bootstrap(source, "/mock").is_err());
    }
}
