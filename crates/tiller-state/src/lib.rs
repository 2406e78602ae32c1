//! State engine for remote control of a running process's state.
//!
//! `tiller-state` provides the pieces needed to expose a typed, nested state
//! object for live inspection and mutation: dot-separated access paths, a
//! path accessor, a presence-aware partial merger, a static schema
//! descriptor per state type, and a shared live-state cell.
//!
//! # Core Concepts
//!
//! - **Path**: an ordered list of field names addressing a node in the state
//!   tree, parsed from `"model.head.activation"` form.
//! - **Schema**: the fixed shape of a state type — field names, declared
//!   order, leaf vs composite — built once via `#[derive(Controllable)]`.
//! - **StateCell**: the single live instance of the state document, shared
//!   between the serving side and the owning process.
//! - **Partial merge**: updates carry only the fields they change; absent
//!   fields keep their current values, never reverting to defaults.
//!
//! # Quick Start
//!
//! ```
//! use tiller_state::{path, Schema, SchemaField, StateCell};
//! use serde_json::json;
//!
//! let cell = StateCell::new(json!({
//!     "lr": 0.001,
//!     "checkpoints": {"every_epochs": 2, "save_dir": "checkpoints"}
//! }));
//!
//! let schema = Schema::composite(vec![
//!     SchemaField::new("every_epochs", Schema::Leaf),
//!     SchemaField::new("save_dir", Schema::Leaf),
//! ]);
//!
//! // a sparse update touches only the fields it names
//! cell.merge_at(&path!("checkpoints"), &json!({"every_epochs": 3}), &schema)
//!     .unwrap();
//!
//! assert_eq!(
//!     cell.value_at(&path!("checkpoints")).unwrap(),
//!     json!({"every_epochs": 3, "save_dir": "checkpoints"})
//! );
//! ```

mod accessor;
mod cell;
mod error;
mod merge;
mod path;
mod schema;

pub use accessor::{get_at_path, get_at_path_mut, set_at_path};
pub use cell::StateCell;
pub use error::{value_type_name, StateError, StateResult};
pub use merge::{merge_value, merge_value_at};
pub use path::Path;
pub use schema::{Controllable, Schema, SchemaField};

// Re-export derive macro when the feature is enabled
#[cfg(feature = "derive")]
pub use tiller_state_derive::Controllable;

// Re-export serde_json::Value for convenience
pub use serde_json::Value;
