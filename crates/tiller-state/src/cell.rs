//! Shared live-state cell.
//!
//! `StateCell` wraps the state document in a `Mutex` so the serving worker
//! and the owning process observe one instance: every write mutates the
//! document in place and is visible to the next read from either side.

use crate::accessor::{get_at_path, get_at_path_mut, set_at_path};
use crate::error::{StateError, StateResult};
use crate::merge::merge_value_at;
use crate::{Controllable, Path, Schema};
use serde_json::Value;

/// The shared, mutable live state of a control session.
///
/// All operations lock, perform a synchronous in-memory mutation or read, and
/// unlock; no I/O or suspension happens under the lock. There is no
/// cross-operation mutual exclusion beyond the single lock: a caller
/// coordinating state across process boundaries (e.g. broadcasting to
/// distributed workers) must add its own synchronization barrier before
/// trusting a snapshot.
pub struct StateCell(std::sync::Mutex<Value>);

impl StateCell {
    /// Create a cell holding the given document.
    pub fn new(value: Value) -> Self {
        Self(std::sync::Mutex::new(value))
    }

    /// Create a cell from a controllable state value.
    pub fn from_state<T: Controllable>(state: &T) -> StateResult<Self> {
        Ok(Self::new(state.to_value()?))
    }

    fn lock(&self) -> StateResult<std::sync::MutexGuard<'_, Value>> {
        self.0.lock().map_err(|_| StateError::Poisoned)
    }

    /// Clone the current document.
    pub fn snapshot(&self) -> StateResult<Value> {
        Ok(self.lock()?.clone())
    }

    /// Deserialize the current document into the state type.
    ///
    /// This is the owning process's typed view of the live state.
    pub fn read_as<T: Controllable>(&self) -> StateResult<T> {
        let guard = self.lock()?;
        T::from_value(&guard)
    }

    /// Clone the value at a path.
    pub fn value_at(&self, path: &Path) -> StateResult<Value> {
        let guard = self.lock()?;
        get_at_path(&guard, path).cloned()
    }

    /// Replace the value of the field at a non-empty path.
    pub fn replace_at(&self, path: &Path, value: Value) -> StateResult<()> {
        let mut guard = self.lock()?;
        set_at_path(&mut guard, path, value)
    }

    /// Merge a partial update into the composite at a path.
    ///
    /// `schema` must be the descriptor of the node at `path`. The merge is
    /// validated in full before any field is written.
    pub fn merge_at(&self, path: &Path, update: &Value, schema: &Schema) -> StateResult<()> {
        let mut guard = self.lock()?;
        let target = get_at_path_mut(&mut guard, path)?;
        merge_value_at(target, update, schema, path)
    }

    /// Consume the cell and return the inner document.
    pub fn into_inner(self) -> StateResult<Value> {
        self.0.into_inner().map_err(|_| StateError::Poisoned)
    }
}

impl std::fmt::Debug for StateCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StateCell").field(&"<Value>").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{path, SchemaField};
    use serde_json::json;

    fn cell() -> StateCell {
        StateCell::new(json!({
            "lr": 0.001,
            "checkpoints": {"every_epochs": 2, "save_dir": "checkpoints"}
        }))
    }

    #[test]
    fn test_snapshot_and_value_at() {
        let cell = cell();
        assert_eq!(cell.value_at(&path!("lr")).unwrap(), json!(0.001));
        assert_eq!(
            cell.snapshot().unwrap()["checkpoints"]["save_dir"],
            json!("checkpoints")
        );
    }

    #[test]
    fn test_replace_is_visible_to_next_read() {
        let cell = cell();
        cell.replace_at(&path!("lr"), json!(2.0)).unwrap();
        assert_eq!(cell.value_at(&path!("lr")).unwrap(), json!(2.0));
    }

    #[test]
    fn test_merge_at_subtree() {
        let cell = cell();
        let schema = Schema::composite(vec![
            SchemaField::new("every_epochs", Schema::Leaf),
            SchemaField::new("save_dir", Schema::Leaf),
        ]);
        cell.merge_at(&path!("checkpoints"), &json!({"every_epochs": 3}), &schema)
            .unwrap();
        assert_eq!(
            cell.value_at(&path!("checkpoints")).unwrap(),
            json!({"every_epochs": 3, "save_dir": "checkpoints"})
        );
    }

    #[test]
    fn test_shared_between_threads() {
        let cell = std::sync::Arc::new(cell());
        let writer = {
            let cell = cell.clone();
            std::thread::spawn(move || {
                cell.replace_at(&path!("lr"), json!(5.0)).unwrap();
            })
        };
        writer.join().unwrap();
        assert_eq!(cell.value_at(&path!("lr")).unwrap(), json!(5.0));
    }
}
