//! Server lifecycle: run the synthesized routes on a dedicated worker.
//!
//! The listener runs on its own OS thread with a current-thread tokio
//! runtime, so controlling a state never blocks the owning process's main
//! control flow. Stopping signals the worker and then joins it, blocking the
//! caller until the worker has fully exited.

use crate::config::ControlConfig;
use crate::error::{ControlError, ControlResult};
use crate::routes::{synthesize, RouteCatalog};
use crate::session::ControlSession;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tiller_state::{Controllable, StateResult};
use tokio::sync::broadcast;

/// Put a state under remote control.
///
/// Attaches a control session, synthesizes the routes for the state's shape
/// and — unless `config.serve` is `false` — starts serving them on a
/// dedicated worker thread. With `serve: false`, call [`Controller::serve`]
/// later or take the [`Controller::router`] and drive the listener yourself.
///
/// # Examples
///
/// ```no_run
/// use serde::{Deserialize, Serialize};
/// use tiller_control::{control, ControlConfig};
/// use tiller_state::Controllable;
///
/// #[derive(Clone, Serialize, Deserialize, Controllable)]
/// struct TrainState {
///     lr: f64,
///     training_stopped: bool,
/// }
///
/// let state = TrainState { lr: 1e-3, training_stopped: false };
/// let mut controller = control(&state, ControlConfig::default()).unwrap();
///
/// // ... training loop reads controller.state::<TrainState>() ...
///
/// controller.stop().unwrap();
/// ```
pub fn control<T: Controllable>(state: &T, config: ControlConfig) -> ControlResult<Controller> {
    let session = Arc::new(ControlSession::attach(state)?);
    let (router, catalog) = synthesize(session.clone(), &config);

    let mut controller = Controller {
        session,
        config,
        router,
        catalog,
        worker: None,
        addr: None,
    };

    if controller.config.serve {
        controller.serve()?;
    }

    Ok(controller)
}

/// Handle to a controlled state and its (optional) server.
///
/// Dropping a serving controller without calling [`stop`](Controller::stop)
/// leaves the worker running until the process exits, mirroring a daemon
/// thread.
pub struct Controller {
    session: Arc<ControlSession>,
    config: ControlConfig,
    router: Router,
    catalog: RouteCatalog,
    worker: Option<std::thread::JoinHandle<()>>,
    addr: Option<SocketAddr>,
}

impl Controller {
    /// Start the serving worker, blocking until the listener is bound.
    ///
    /// Returns the bound address (useful with `port: 0`). Calling this while
    /// already serving returns the existing address.
    pub fn serve(&mut self) -> ControlResult<SocketAddr> {
        if let Some(addr) = self.addr {
            return Ok(addr);
        }

        let router = self.router.clone();
        let bind = self.config.bind_addr();
        let shutdown_rx = self.session.subscribe_shutdown();
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<SocketAddr, String>>();

        let handle = std::thread::Builder::new()
            .name("tiller-control".into())
            .spawn(move || serve_worker(bind, router, shutdown_rx, ready_tx))
            .map_err(|e| ControlError::Internal(format!("failed to spawn control worker: {e}")))?;

        let addr = ready_rx
            .recv()
            .map_err(|_| ControlError::Internal("control worker exited before binding".into()))?
            .map_err(ControlError::Internal)?;

        self.worker = Some(handle);
        self.addr = Some(addr);
        tracing::info!(target: "tiller::control", %addr, "control server listening");
        Ok(addr)
    }

    /// Stop the session and tear down the listener.
    ///
    /// Signals shutdown, then joins the worker thread: this blocks until the
    /// worker has fully exited, bounded only by the worker noticing the
    /// signal. Idempotent — stopping an already-stopped controller is a
    /// no-op.
    pub fn stop(&mut self) -> ControlResult<()> {
        self.session.stop()?;
        if let Some(handle) = self.worker.take() {
            handle
                .join()
                .map_err(|_| ControlError::Internal("control worker panicked".into()))?;
        }
        self.addr = None;
        Ok(())
    }

    /// The control session backing this controller.
    pub fn session(&self) -> &Arc<ControlSession> {
        &self.session
    }

    /// The owning process's typed view of the live state.
    pub fn state<T: Controllable>(&self) -> StateResult<T> {
        self.session.current()
    }

    /// The bound address, when serving.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.addr
    }

    /// A clone of the synthesized router, for caller-driven serving.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The synthesized route catalog.
    pub fn catalog(&self) -> &RouteCatalog {
        &self.catalog
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("addr", &self.addr)
            .field("serving", &self.worker.is_some())
            .finish_non_exhaustive()
    }
}

/// Body of the dedicated serving thread.
fn serve_worker(
    bind: String,
    router: Router,
    mut shutdown_rx: broadcast::Receiver<()>,
    ready_tx: std::sync::mpsc::Sender<Result<SocketAddr, String>>,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            let _ = ready_tx.send(Err(format!("failed to build control runtime: {e}")));
            return;
        }
    };

    runtime.block_on(async move {
        let listener = match tokio::net::TcpListener::bind(&bind).await {
            Ok(listener) => listener,
            Err(e) => {
                let _ = ready_tx.send(Err(format!("failed to bind {bind}: {e}")));
                return;
            }
        };
        let addr = match listener.local_addr() {
            Ok(addr) => addr,
            Err(e) => {
                let _ = ready_tx.send(Err(format!("failed to read bound address: {e}")));
                return;
            }
        };
        let _ = ready_tx.send(Ok(addr));

        let shutdown = async move {
            let _ = shutdown_rx.recv().await;
        };
        if let Err(e) = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
        {
            tracing::error!(target: "tiller::control", error = %e, "control server crashed");
        }
        tracing::debug!(target: "tiller::control", "control worker exited");
    });
}
