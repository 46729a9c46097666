//! HTTP application
//!
//! Owns the routing table, the listener and the process lifecycle. An `App`
//! moves through `Unstarted -> Running -> ShuttingDown -> Stopped` exactly
//! once; the current state is published on a `watch` channel which also
//! drives graceful shutdown of the server.

use axum::{
    extract::Request,
    handler::Handler,
    middleware::Next,
    response::Response,
    routing::{any, MethodRouter},
    Router,
};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::DEFAULT_SHUTDOWN_GRACE_SECS;

/// Lifecycle state of an [`App`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Created, not yet serving
    Unstarted,
    /// Accepting connections
    Running,
    /// No longer accepting, draining in-flight requests
    ShuttingDown,
    /// Listener closed
    Stopped,
}

/// Errors raised while starting or stopping the server
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// The listen address could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested
        addr: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The server loop failed
    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),

    /// `start` was called on an app that is not `Unstarted`
    #[error("App cannot start from state {0:?}")]
    InvalidState(LifecycleState),

    /// In-flight requests did not finish within the grace period
    #[error("Shutdown did not complete within {0:?}")]
    ShutdownTimeout(Duration),

    /// The background shutdown task panicked or was cancelled
    #[error("Shutdown task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// HTTP server with signal-driven graceful shutdown
#[derive(Debug)]
pub struct App {
    router: Router,
    shutdown_grace: Duration,
    lifecycle: watch::Sender<LifecycleState>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Create an app with no routes and the default grace period
    pub fn new() -> Self {
        let (lifecycle, _) = watch::channel(LifecycleState::Unstarted);
        Self {
            router: Router::new(),
            shutdown_grace: Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECS),
            lifecycle,
        }
    }

    /// Set how long `stop` waits for in-flight requests
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Register a method-dispatching service on `path`
    pub fn handle(mut self, path: &str, service: MethodRouter) -> Self {
        self.router = self.router.route(path, service);
        self
    }

    /// Register a single handler function on `path` for every method
    pub fn handle_fn<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.handle(path, any(handler))
    }

    /// Current lifecycle state
    pub fn state(&self) -> LifecycleState {
        *self.lifecycle.borrow()
    }

    /// Watch lifecycle transitions
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.lifecycle.subscribe()
    }

    /// Configured shutdown grace period
    pub fn shutdown_grace(&self) -> Duration {
        self.shutdown_grace
    }

    /// Bind `addr` and serve until the app is stopped
    pub async fn start(&self, addr: &str) -> Result<(), LifecycleError> {
        let state = self.state();
        if state != LifecycleState::Unstarted {
            return Err(LifecycleError::InvalidState(state));
        }

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| LifecycleError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        self.serve(listener).await
    }

    /// Serve on an already bound listener until the app is stopped
    ///
    /// Returns once every connection has drained, or once `stop` gives up
    /// waiting and force-closes the server.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), LifecycleError> {
        let mut previous = LifecycleState::Unstarted;
        let started = self.lifecycle.send_if_modified(|state| {
            previous = *state;
            if *state == LifecycleState::Unstarted {
                *state = LifecycleState::Running;
                true
            } else {
                false
            }
        });
        if !started {
            return Err(LifecycleError::InvalidState(previous));
        }

        match listener.local_addr() {
            Ok(addr) => info!("🚀 Server running on http://{}", addr),
            Err(e) => warn!("Server running, local address unknown: {}", e),
        }

        let mut drain_rx = self.lifecycle.subscribe();
        let drain = async move {
            let _ = drain_rx
                .wait_for(|state| *state != LifecycleState::Running)
                .await;
        };

        let mut force_rx = self.lifecycle.subscribe();
        let forced = async move {
            let _ = force_rx
                .wait_for(|state| *state == LifecycleState::Stopped)
                .await;
        };

        let server = axum::serve(listener, self.build_router())
            .with_graceful_shutdown(drain)
            .into_future();

        let result = tokio::select! {
            result = server => result.map_err(LifecycleError::from),
            _ = forced => {
                warn!("Grace period elapsed, closing remaining connections");
                Ok(())
            }
        };

        self.lifecycle.send_replace(LifecycleState::Stopped);
        result
    }

    /// Stop accepting connections and drain in-flight requests
    ///
    /// Waits at most the grace period. If requests are still running after
    /// that the server is closed anyway and `ShutdownTimeout` is returned.
    pub async fn stop(&self) -> Result<(), LifecycleError> {
        let mut previous = LifecycleState::Unstarted;
        self.lifecycle.send_modify(|state| {
            previous = *state;
            *state = match *state {
                LifecycleState::Unstarted => LifecycleState::Stopped,
                LifecycleState::Running => LifecycleState::ShuttingDown,
                other => other,
            };
        });

        if previous == LifecycleState::Unstarted || previous == LifecycleState::Stopped {
            return Ok(());
        }

        info!(grace_ms = self.shutdown_grace.as_millis(), "Shutting down");
        let mut rx = self.lifecycle.subscribe();
        let drained = tokio::time::timeout(self.shutdown_grace, async move {
            let _ = rx
                .wait_for(|state| *state == LifecycleState::Stopped)
                .await;
        })
        .await;

        match drained {
            Ok(()) => {
                info!("Server shutdown complete");
                Ok(())
            }
            Err(_) => {
                self.lifecycle.send_replace(LifecycleState::Stopped);
                Err(LifecycleError::ShutdownTimeout(self.shutdown_grace))
            }
        }
    }

    /// Serve on `addr` until an interrupt signal arrives, then stop
    ///
    /// The signal is awaited on a separate task which calls [`App::stop`].
    /// Errors from either side are returned to the caller.
    pub async fn run(self: Arc<Self>, addr: &str) -> Result<(), LifecycleError> {
        let stopper = {
            let app = Arc::clone(&self);
            tokio::spawn(async move {
                shutdown_signal().await;
                app.stop().await
            })
        };

        if let Err(e) = self.start(addr).await {
            stopper.abort();
            return Err(e);
        }

        stopper.await?
    }

    fn build_router(&self) -> Router {
        self.router
            .clone()
            // Middleware (order matters - request logging should be first)
            .layer(axum::middleware::from_fn(request_log_middleware))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request| {
                    info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                }),
            )
    }
}

/// Request logging middleware - logs each request line before dispatch and
/// its outcome afterwards, tagged with a unique request ID
async fn request_log_middleware(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    info!(request_id = %request_id, "{} {}", method, uri);

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    let response = next.run(request).instrument(span).await;

    let duration = start.elapsed();
    info!(
        request_id = %request_id,
        status = %response.status().as_u16(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    response
}

/// Wait for an interrupt (Ctrl+C) or, on Unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
