//! Control sessions: ownership of the live state and its initial snapshot.
//!
//! A session takes a state value at setup, snapshots it for reset, derives
//! its schema, and then services the operations forwarded from the transport
//! layer: whole-state and per-path reads, merges and replacements, reset and
//! stop.

use crate::error::{ControlError, ControlResult};
use std::sync::Mutex;
use tiller_state::{Controllable, Path, Schema, StateCell, StateResult, Value};
use tokio::sync::broadcast;

/// Lifecycle phase of a control session.
///
/// `Stopped` is terminal: once a session stops, inbound operations fail and
/// the listener is torn down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionPhase {
    /// No state attached yet.
    #[default]
    Uninitialized,
    /// Live state attached; operations are serviced.
    Controlling,
    /// Stopped; inbound operations are rejected.
    Stopped,
}

/// A control session over one live state instance.
///
/// The session holds the only [`StateCell`] for its state; every synthesized
/// handler and the owning process share it, so all sides observe the same
/// instance and mutations are immediately visible everywhere.
pub struct ControlSession {
    cell: StateCell,
    initial: Value,
    schema: Schema,
    phase: Mutex<SessionPhase>,
    shutdown_tx: broadcast::Sender<()>,
}

impl ControlSession {
    /// Attach a state value and enter the `Controlling` phase.
    ///
    /// Serializes the state into the live document, takes the deep initial
    /// snapshot used by reset, and derives the schema the route synthesizer
    /// and merge validation walk.
    pub fn attach<T: Controllable>(state: &T) -> StateResult<Self> {
        let doc = state.to_value()?;
        let (shutdown_tx, _) = broadcast::channel(4);
        let session = Self {
            initial: doc.clone(),
            cell: StateCell::new(doc),
            schema: T::schema(),
            phase: Mutex::new(SessionPhase::Uninitialized),
            shutdown_tx,
        };
        session.transition(SessionPhase::Controlling);
        Ok(session)
    }

    fn transition(&self, next: SessionPhase) {
        let mut phase = self.phase.lock().unwrap();
        tracing::debug!(
            target: "tiller::control",
            from = ?*phase,
            to = ?next,
            "session phase transition"
        );
        *phase = next;
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        *self.phase.lock().unwrap()
    }

    fn ensure_controlling(&self) -> ControlResult<()> {
        match self.phase() {
            SessionPhase::Controlling => Ok(()),
            _ => Err(ControlError::NotServing),
        }
    }

    /// Read the whole current state.
    pub fn read_state(&self) -> ControlResult<Value> {
        self.ensure_controlling()?;
        Ok(self.cell.snapshot()?)
    }

    /// Read the value at a path.
    ///
    /// The path is resolved against the schema first, so only fields that
    /// are part of the controlled shape are readable.
    pub fn read_path(&self, path: &Path) -> ControlResult<Value> {
        self.ensure_controlling()?;
        self.schema.node_at(path)?;
        Ok(self.cell.value_at(path)?)
    }

    /// Merge a partial update onto the whole state.
    ///
    /// A full-shape payload (every field present) acts as a full replace.
    pub fn merge_state(&self, update: &Value) -> ControlResult<()> {
        self.ensure_controlling()?;
        let before = self.cell.snapshot()?;
        self.cell.merge_at(&Path::root(), update, &self.schema)?;
        let after = self.cell.snapshot()?;
        tracing::info!(
            target: "tiller::control",
            before = %before,
            after = %after,
            "patched whole state"
        );
        Ok(())
    }

    /// Write the field at a path: full replacement for leaves, partial merge
    /// for composites.
    pub fn write_path(&self, path: &Path, payload: Value) -> ControlResult<()> {
        self.ensure_controlling()?;
        let node = self.schema.node_at(path)?;
        let before = self.cell.value_at(path)?;

        if node.is_leaf() {
            self.cell.replace_at(path, payload.clone())?;
            tracing::info!(
                target: "tiller::control",
                path = %path,
                before = %before,
                after = %payload,
                "set value"
            );
        } else {
            self.cell.merge_at(path, &payload, node)?;
            let after = self.cell.value_at(path)?;
            tracing::info!(
                target: "tiller::control",
                path = %path,
                before = %before,
                after = %after,
                "patched value"
            );
        }
        Ok(())
    }

    /// Restore the live state, field by field, to the initial snapshot.
    ///
    /// Implemented as a full-shape merge of a fresh copy of the snapshot onto
    /// the live root, so the root and every composite keep their identity.
    /// Only controlled fields are restored; fields outside the schema were
    /// never remotely writable and keep their live values.
    pub fn reset(&self) -> ControlResult<()> {
        self.ensure_controlling()?;
        let before = self.cell.snapshot()?;
        let restore = controlled_projection(&self.initial, &self.schema);
        self.cell.merge_at(&Path::root(), &restore, &self.schema)?;
        tracing::info!(
            target: "tiller::control",
            before = %before,
            after = %restore,
            "reset state to initial"
        );
        Ok(())
    }

    /// Stop the session.
    ///
    /// One-way and idempotent: the first call transitions to `Stopped` and
    /// signals the listener to shut down; later calls are no-ops.
    pub fn stop(&self) -> ControlResult<()> {
        {
            let mut phase = self.phase.lock().unwrap();
            if *phase == SessionPhase::Stopped {
                return Ok(());
            }
            *phase = SessionPhase::Stopped;
        }
        // Nobody listening just means no server was started.
        let _ = self.shutdown_tx.send(());
        tracing::info!(target: "tiller::control", "control session stopped");
        Ok(())
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// The owning process's typed view of the live state.
    ///
    /// Available in every phase: the owning process keeps its access to the
    /// state it handed over, even after remote control has stopped.
    pub fn current<T: Controllable>(&self) -> StateResult<T> {
        self.cell.read_as()
    }

    /// The shared live-state cell.
    pub fn cell(&self) -> &StateCell {
        &self.cell
    }

    /// The schema the session was set up with.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The initial snapshot taken at setup.
    pub fn initial(&self) -> &Value {
        &self.initial
    }
}

/// Project a document onto the fields the schema controls, dropping
/// everything else (e.g. `#[control(skip)]` fields present in the
/// serialized state).
fn controlled_projection(value: &Value, schema: &Schema) -> Value {
    match schema {
        Schema::Leaf => value.clone(),
        Schema::Composite(fields) => {
            let src = value.as_object();
            let mut obj = serde_json::Map::new();
            for field in fields {
                if let Some(child) = src.and_then(|o| o.get(&field.name)) {
                    obj.insert(
                        field.name.clone(),
                        controlled_projection(child, &field.schema),
                    );
                }
            }
            Value::Object(obj)
        }
    }
}

impl std::fmt::Debug for ControlSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlSession")
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}
