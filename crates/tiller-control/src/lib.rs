//! Remote control of a running process's state over HTTP.
//!
//! Hand a state struct to [`control`] and every field of it — at every
//! nesting depth — becomes readable and writable over HTTP while the process
//! keeps running: adjust the hyperparameters of a training loop, flip a
//! shutdown flag, retune a worker pool, all without restarting.
//!
//! The serving side runs on a dedicated worker thread; the owning process
//! keeps a live, typed view of the same state instance, so remote writes are
//! visible to it immediately.
//!
//! ```no_run
//! use serde::{Deserialize, Serialize};
//! use tiller_control::{control, ControlConfig};
//! use tiller_state::Controllable;
//!
//! #[derive(Clone, Serialize, Deserialize, Controllable)]
//! struct Checkpoints {
//!     every_epochs: u32,
//!     save_dir: String,
//! }
//!
//! #[derive(Clone, Serialize, Deserialize, Controllable)]
//! struct TrainState {
//!     training_stopped: bool,
//!     lr: f64,
//!     #[control(nested)]
//!     checkpoints: Checkpoints,
//! }
//!
//! let state = TrainState {
//!     training_stopped: false,
//!     lr: 1e-3,
//!     checkpoints: Checkpoints { every_epochs: 2, save_dir: "checkpoints".into() },
//! };
//!
//! let mut controller = control(&state, ControlConfig::default()).unwrap();
//!
//! while !controller.state::<TrainState>().unwrap().training_stopped {
//!     // one epoch with the current (possibly remotely updated) settings
//! }
//!
//! controller.stop().unwrap();
//! ```
//!
//! # HTTP surface
//!
//! | Method | Path | Semantics |
//! |---|---|---|
//! | GET | `/get` | whole-state read |
//! | PATCH | `/set` | whole-state partial merge |
//! | DELETE | `/reset` | restore the initial state |
//! | GET | `/get_from_path?path=a.b.c` | read at a dotted path |
//! | GET | `/get/<slash/path>` | read at a registered path |
//! | PUT | `/set/<slash/path>` | full replace (leaf fields) |
//! | PATCH | `/set/<slash/path>` | partial merge (composite fields) |
//! | POST | `/stop` | stop the session and listener |
//!
//! Partial merges touch only the fields present in the payload; absent
//! fields keep their current values.
//!
//! # Concurrency
//!
//! Remote writes and the owning process's own reads of the same fields are
//! not mutually ordered: within one request the state is updated field by
//! field, and a concurrent reader may observe a partially-updated composite.
//! Callers that need cross-process consistency (e.g. broadcasting state to
//! distributed workers) must add their own synchronization barrier.

mod config;
mod error;
mod routes;
mod server;
mod session;

pub use config::ControlConfig;
pub use error::{ControlError, ControlResult};
pub use routes::{synthesize, RouteCatalog, RouteEntry};
pub use server::{control, Controller};
pub use session::{ControlSession, SessionPhase};
