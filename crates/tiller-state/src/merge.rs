//! Partial merge of sparse update payloads onto a state document.
//!
//! A partial update is a JSON object carrying only the fields it wants to
//! change. Key absence is the unset marker: absent fields are left exactly as
//! they are, never reset to a default. Present leaf fields are overwritten
//! wholesale; present composite fields are merged recursively into the
//! existing sub-object, so no object identity is ever replaced.
//!
//! The merge is two-phase: the whole payload is validated against the schema
//! before anything is written, so a rejected merge leaves the target
//! untouched.

use crate::error::{value_type_name, StateError, StateResult};
use crate::{Path, Schema};
use serde_json::Value;

/// Merge a partial update onto a target document in place.
///
/// Equivalent to [`merge_value_at`] with the root path as the error-reporting
/// base.
///
/// # Examples
///
/// ```
/// use tiller_state::{merge_value, Schema, SchemaField};
/// use serde_json::json;
///
/// let schema = Schema::composite(vec![
///     SchemaField::new("every_epochs", Schema::Leaf),
///     SchemaField::new("save_dir", Schema::Leaf),
/// ]);
/// let mut target = json!({"every_epochs": 2, "save_dir": "checkpoints"});
///
/// merge_value(&mut target, &json!({"every_epochs": 3}), &schema).unwrap();
///
/// // the omitted field keeps its current value
/// assert_eq!(target, json!({"every_epochs": 3, "save_dir": "checkpoints"}));
/// ```
pub fn merge_value(target: &mut Value, update: &Value, schema: &Schema) -> StateResult<()> {
    merge_value_at(target, update, schema, &Path::root())
}

/// Merge a partial update onto a target document in place, reporting errors
/// relative to `base` (the path at which `target` sits in the full tree).
///
/// Rules, per field present in `update`:
/// - leaf per schema: overwrite the target's field with the update's value.
/// - composite per schema: recurse into the target's sub-object. The
///   sub-object reference is preserved; only its fields change.
/// - unknown to the schema: the whole merge is rejected with
///   [`StateError::UnknownField`].
///
/// Fields absent from `update` are left completely untouched.
///
/// Validation runs over the entire payload before any mutation, so on error
/// the target is byte-identical to what it was before the call.
pub fn merge_value_at(
    target: &mut Value,
    update: &Value,
    schema: &Schema,
    base: &Path,
) -> StateResult<()> {
    let mut at = base.clone();
    validate(target, update, schema, &mut at)?;
    apply(target, update, schema, base)
}

/// Check the update against the schema and the target's materialized shape.
/// Read-only; no mutation happens here.
fn validate(target: &Value, update: &Value, schema: &Schema, at: &mut Path) -> StateResult<()> {
    // Leaves are replaced wholesale; any JSON value is acceptable.
    if schema.is_leaf() {
        return Ok(());
    }

    let update_obj = update.as_object().ok_or_else(|| {
        StateError::shape_mismatch(at.clone(), "object", value_type_name(update))
    })?;
    let target_obj = target
        .as_object()
        .ok_or_else(|| StateError::not_an_object(at.clone(), value_type_name(target)))?;

    for (name, child_update) in update_obj {
        let name = name.as_str();
        let child_schema = schema
            .field(name)
            .ok_or_else(|| StateError::unknown_field(at.clone(), name))?;
        let child_target = target_obj
            .get(name)
            .ok_or_else(|| StateError::path_not_found(at.clone().key(name)))?;
        at.push(name);
        validate(child_target, child_update, child_schema, at)?;
        at.pop();
    }

    Ok(())
}

/// Write the validated update into the target. Mutates objects in place;
/// never replaces a composite wholesale.
fn apply(target: &mut Value, update: &Value, schema: &Schema, at: &Path) -> StateResult<()> {
    if schema.is_leaf() {
        *target = update.clone();
        return Ok(());
    }

    let update_obj = update.as_object().ok_or_else(|| {
        StateError::shape_mismatch(at.clone(), "object", value_type_name(update))
    })?;
    // Check type first to avoid borrow issues
    if !target.is_object() {
        return Err(StateError::not_an_object(
            at.clone(),
            value_type_name(target),
        ));
    }
    let target_obj = target.as_object_mut().unwrap();

    for (name, child_update) in update_obj {
        let name = name.as_str();
        let child_schema = schema
            .field(name)
            .ok_or_else(|| StateError::unknown_field(at.clone(), name))?;
        let slot = target_obj
            .get_mut(name)
            .ok_or_else(|| StateError::path_not_found(at.clone().key(name)))?;
        if child_schema.is_leaf() {
            *slot = child_update.clone();
        } else {
            apply(slot, child_update, child_schema, &at.clone().key(name))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{path, SchemaField};
    use serde_json::json;

    fn train_schema() -> Schema {
        Schema::composite(vec![
            SchemaField::new("lr", Schema::Leaf),
            SchemaField::new(
                "checkpoints",
                Schema::composite(vec![
                    SchemaField::new("every_epochs", Schema::Leaf),
                    SchemaField::new("save_dir", Schema::Leaf),
                ]),
            ),
            SchemaField::new(
                "model",
                Schema::composite(vec![
                    SchemaField::new("hidden_dim", Schema::Leaf),
                    SchemaField::new(
                        "head",
                        Schema::composite(vec![SchemaField::new("activation", Schema::Leaf)]),
                    ),
                ]),
            ),
        ])
    }

    fn train_doc() -> Value {
        json!({
            "lr": 0.001,
            "checkpoints": {"every_epochs": 2, "save_dir": "checkpoints"},
            "model": {"hidden_dim": [128, 256, 512], "head": {"activation": "relu"}}
        })
    }

    #[test]
    fn test_merge_overwrites_present_leaf() {
        let mut doc = train_doc();
        merge_value(&mut doc, &json!({"lr": 2.0}), &train_schema()).unwrap();
        assert_eq!(doc["lr"], json!(2.0));
    }

    #[test]
    fn test_merge_preserves_omitted_fields() {
        let mut doc = train_doc();
        merge_value(
            &mut doc,
            &json!({"checkpoints": {"every_epochs": 3}}),
            &train_schema(),
        )
        .unwrap();
        assert_eq!(doc["checkpoints"]["every_epochs"], json!(3));
        // absent means "leave as is", not "revert to default"
        assert_eq!(doc["checkpoints"]["save_dir"], json!("checkpoints"));
    }

    #[test]
    fn test_sequential_partial_merges_accumulate() {
        let mut doc = train_doc();
        let schema = train_schema();
        merge_value(&mut doc, &json!({"checkpoints": {"every_epochs": 3}}), &schema).unwrap();
        merge_value(
            &mut doc,
            &json!({"checkpoints": {"save_dir": "other_dir"}}),
            &schema,
        )
        .unwrap();
        // the earlier partial update is not reverted
        assert_eq!(
            doc["checkpoints"],
            json!({"every_epochs": 3, "save_dir": "other_dir"})
        );
    }

    #[test]
    fn test_merge_does_not_touch_unrelated_subtrees() {
        let mut doc = train_doc();
        let before_model = doc["model"].clone();
        merge_value(&mut doc, &json!({"lr": 10.0}), &train_schema()).unwrap();
        assert_eq!(doc["model"], before_model);
    }

    #[test]
    fn test_merge_recurses_into_nested_composites() {
        let mut doc = train_doc();
        merge_value(
            &mut doc,
            &json!({"model": {"head": {"activation": "sigmoid"}}}),
            &train_schema(),
        )
        .unwrap();
        assert_eq!(doc["model"]["head"]["activation"], json!("sigmoid"));
        assert_eq!(doc["model"]["hidden_dim"], json!([128, 256, 512]));
    }

    #[test]
    fn test_merge_leaf_sequence_replaced_wholesale() {
        let mut doc = train_doc();
        merge_value(
            &mut doc,
            &json!({"model": {"hidden_dim": [256, 512, 1024]}}),
            &train_schema(),
        )
        .unwrap();
        assert_eq!(doc["model"]["hidden_dim"], json!([256, 512, 1024]));
    }

    #[test]
    fn test_merge_full_shape_equals_replacement() {
        let mut doc = train_doc();
        let replacement = json!({
            "lr": 2.0,
            "checkpoints": {"every_epochs": 5, "save_dir": "elsewhere"},
            "model": {"hidden_dim": [64], "head": {"activation": "tanh"}}
        });
        merge_value(&mut doc, &replacement, &train_schema()).unwrap();
        assert_eq!(doc, replacement);
    }

    #[test]
    fn test_merge_unknown_field_rejected() {
        let mut doc = train_doc();
        let err = merge_value(&mut doc, &json!({"lrr": 2.0}), &train_schema()).unwrap_err();
        assert!(matches!(err, StateError::UnknownField { ref field, .. } if field == "lrr"));
    }

    #[test]
    fn test_merge_non_object_payload_for_composite_rejected() {
        let mut doc = train_doc();
        let err =
            merge_value(&mut doc, &json!({"checkpoints": 3}), &train_schema()).unwrap_err();
        assert!(matches!(err, StateError::ShapeMismatch { .. }));

        let err =
            merge_value(&mut doc, &json!({"checkpoints": null}), &train_schema()).unwrap_err();
        assert!(matches!(err, StateError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_rejected_merge_leaves_target_untouched() {
        let mut doc = train_doc();
        let before = doc.clone();
        // first field is valid, second is not; nothing may be applied
        let update = json!({"lr": 99.0, "checkpoints": {"typo_field": 1}});
        let err = merge_value(&mut doc, &update, &train_schema()).unwrap_err();
        assert!(matches!(err, StateError::UnknownField { .. }));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_merge_at_reports_full_paths() {
        let mut doc = json!({"activation": "relu"});
        let schema = Schema::composite(vec![SchemaField::new("activation", Schema::Leaf)]);
        let err = merge_value_at(
            &mut doc,
            &json!({"nope": 1}),
            &schema,
            &path!("model", "head"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("model.head"));
    }

    #[test]
    fn test_merge_empty_update_is_noop() {
        let mut doc = train_doc();
        let before = doc.clone();
        merge_value(&mut doc, &json!({}), &train_schema()).unwrap();
        assert_eq!(doc, before);
    }
}
