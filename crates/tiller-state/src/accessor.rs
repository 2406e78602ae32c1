//! Path-based access into a state document.
//!
//! The accessor resolves dot paths against a live `serde_json::Value`
//! document. The controlled shape is fixed after setup, so a segment that
//! fails to resolve is an error, never a cue to create intermediate objects.

use crate::error::{value_type_name, StateError, StateResult};
use crate::Path;
use serde_json::Value;

/// Get a reference to the value at a path.
///
/// The empty path resolves to the document root. Any segment naming a field
/// that does not exist fails with [`StateError::PathNotFound`]; descending
/// through a leaf fails with [`StateError::NotAnObject`].
///
/// # Examples
///
/// ```
/// use tiller_state::{get_at_path, path};
/// use serde_json::json;
///
/// let doc = json!({"model": {"head": {"activation": "relu"}}});
/// let value = get_at_path(&doc, &path!("model", "head", "activation")).unwrap();
/// assert_eq!(value, &json!("relu"));
/// ```
pub fn get_at_path<'a>(doc: &'a Value, path: &Path) -> StateResult<&'a Value> {
    let mut current = doc;
    for (depth, segment) in path.iter().enumerate() {
        let obj = match current.as_object() {
            Some(obj) => obj,
            None => {
                return Err(StateError::not_an_object(
                    path.prefix(depth),
                    value_type_name(current),
                ))
            }
        };
        current = obj
            .get(segment)
            .ok_or_else(|| StateError::path_not_found(path.prefix(depth + 1)))?;
    }
    Ok(current)
}

/// Get a mutable reference to the value at a path.
///
/// Same resolution rules as [`get_at_path`].
pub fn get_at_path_mut<'a>(doc: &'a mut Value, path: &Path) -> StateResult<&'a mut Value> {
    let mut current = doc;
    for (depth, segment) in path.iter().enumerate() {
        // Check type first to avoid borrow issues
        if !current.is_object() {
            return Err(StateError::not_an_object(
                path.prefix(depth),
                value_type_name(current),
            ));
        }
        let obj = current.as_object_mut().unwrap();
        current = obj
            .get_mut(segment)
            .ok_or_else(|| StateError::path_not_found(path.prefix(depth + 1)))?;
    }
    Ok(current)
}

/// Replace the value of the field named by the last path segment.
///
/// Resolves all but the last segment to reach the containing composite, then
/// assigns the named field in place. The containing composite itself is never
/// replaced, so references into it stay valid and observe the new field
/// value. The path must be non-empty and must name an existing field.
///
/// # Examples
///
/// ```
/// use tiller_state::{set_at_path, path};
/// use serde_json::json;
///
/// let mut doc = json!({"lr": 0.001, "checkpoints": {"every_epochs": 2}});
/// set_at_path(&mut doc, &path!("lr"), json!(2.0)).unwrap();
/// assert_eq!(doc["lr"], json!(2.0));
/// ```
pub fn set_at_path(doc: &mut Value, path: &Path, value: Value) -> StateResult<()> {
    let last = match path.last() {
        Some(last) => last.to_owned(),
        None => {
            return Err(StateError::invalid_path(
                "cannot set the root through a path; merge onto the root instead",
            ))
        }
    };

    let parent_path = path.prefix(path.len() - 1);
    let parent = get_at_path_mut(doc, &parent_path)?;

    // Check type first to avoid borrow issues
    if !parent.is_object() {
        return Err(StateError::not_an_object(
            parent_path,
            value_type_name(parent),
        ));
    }
    let obj = parent.as_object_mut().unwrap();

    match obj.get_mut(&last) {
        Some(slot) => {
            *slot = value;
            Ok(())
        }
        None => Err(StateError::path_not_found(path.clone())),
    }
}
