//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: a single fallback that dispatches every request
//!   through the reloadable route table
//! - Wire up middleware (tracing, request ID, limits, timeout, access log, CORS)
//! - Run reload triggers (file watcher, SIGHUP) alongside the listener
//! - Serve until shutdown, draining in-flight requests

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Method, Uri},
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::{self, handlers, Reloader};
use crate::config::MockConfig;
use crate::http::middleware::{access_log_middleware, cors_middleware, AccessLog, CorsPolicy};
use crate::http::request::{UuidRequestId, X_REQUEST_ID};
use crate::http::response::{emit, not_found};
use crate::lifecycle::signals;
use crate::mapping::MappingWatcher;
use crate::observability::metrics;
use crate::routing::{AdminAction, Dispatch, RouteTarget};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub reloader: Arc<Reloader>,
}

/// HTTP server for the mock API.
pub struct MockServer {
    router: Router,
    config: MockConfig,
    reloader: Arc<Reloader>,
}

impl MockServer {
    /// Create a server serving from `reloader`'s route table.
    pub fn new(config: MockConfig, reloader: Arc<Reloader>) -> Self {
        let state = AppState {
            reloader: reloader.clone(),
        };
        let router = Self::build_router(&config, state);

        Self {
            router,
            config,
            reloader,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &MockConfig, state: AppState) -> Router {
        let x_request_id = HeaderName::from_static(X_REQUEST_ID);

        let mut router = Router::new().fallback(dispatch_handler).with_state(state);

        if config.cors.enabled {
            let policy = Arc::new(CorsPolicy::from_config(&config.cors));
            router = router.layer(middleware::from_fn_with_state(policy, cors_middleware));
        }

        let access_log = AccessLog {
            log_bodies: config.observability.log_response_bodies,
        };

        router
            .layer(middleware::from_fn_with_state(access_log, access_log_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(x_request_id, UuidRequestId))
    }

    /// Run the server, accepting connections on the given listener until shutdown.
    pub async fn run(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            prefix = %self.reloader.prefix(),
            "HTTP server starting"
        );

        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();

        // Dropping the watcher stops it, so it lives until `run` returns.
        let _watcher = if self.config.mappings.watch {
            match MappingWatcher::new(&self.config.mappings.dir, trigger_tx.clone()).run() {
                Ok(w) => Some(w),
                Err(e) => {
                    tracing::error!(error = %e, dir = %self.config.mappings.dir.display(), "Failed to start mapping watcher");
                    None
                }
            }
        } else {
            None
        };

        signals::spawn_hangup_listener(trigger_tx, shutdown.resubscribe());

        tokio::spawn(admin::run_trigger_loop(
            self.reloader.clone(),
            trigger_rx,
            Duration::from_millis(self.config.mappings.watch_debounce_ms),
            shutdown.resubscribe(),
        ));

        let mut shutdown = shutdown;
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn reloader(&self) -> &Arc<Reloader> {
        &self.reloader
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &MockConfig {
        &self.config
    }
}

/// Dispatch every request through the current route table.
async fn dispatch_handler(State(state): State<AppState>, method: Method, uri: Uri) -> Response<Body> {
    let start = Instant::now();

    let (response, outcome) = match state.reloader.router().serve(method.as_str(), uri.path()) {
        Dispatch::Matched {
            target: RouteTarget::Canned(canned),
            ..
        } => {
            let mut response = Response::new(Body::empty());
            emit(&mut response, &canned);
            (response, "matched")
        }
        Dispatch::Matched {
            target: RouteTarget::Admin(AdminAction::Reload),
            ..
        } => (handlers::reload(&state.reloader).await, "admin"),
        Dispatch::Matched {
            target: RouteTarget::Admin(AdminAction::ListRoutes),
            table,
        } => (handlers::list_routes(&table).into_response(), "admin"),
        Dispatch::Unmatched { generation } => {
            tracing::debug!(method = %method, path = %uri.path(), generation, "No mapping matched");
            (not_found(), "unmatched")
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), outcome, start);
    response
}
