//! Static schema descriptors for controlled state types.
//!
//! A [`Schema`] describes the fixed shape of a state tree: field names, their
//! declared order, and whether each field is a leaf or a composite. It is
//! built once per state type — via `#[derive(Controllable)]` — and then
//! walked by route synthesis and merge validation, so no runtime type
//! introspection is ever needed.

use crate::error::{StateError, StateResult};
use crate::Path;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// The shape of one node in a controlled state tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Schema {
    /// A terminal field holding a primitive or primitive-sequence value.
    Leaf,
    /// A named collection of further fields, in declared order.
    Composite(Vec<SchemaField>),
}

/// A named field inside a composite, together with its shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaField {
    /// The field name as it appears in paths and payloads.
    pub name: String,
    /// The field's shape.
    pub schema: Schema,
}

impl SchemaField {
    /// Create a schema field.
    #[inline]
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

impl Schema {
    /// Create a composite schema from fields in declared order.
    #[inline]
    pub fn composite(fields: Vec<SchemaField>) -> Self {
        Schema::Composite(fields)
    }

    /// Returns true if this node is a leaf.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Schema::Leaf)
    }

    /// Returns true if this node is a composite.
    #[inline]
    pub fn is_composite(&self) -> bool {
        matches!(self, Schema::Composite(_))
    }

    /// Get the fields of a composite (empty for leaves).
    pub fn fields(&self) -> &[SchemaField] {
        match self {
            Schema::Leaf => &[],
            Schema::Composite(fields) => fields,
        }
    }

    /// Look up a direct child field by name.
    pub fn field(&self, name: &str) -> Option<&Schema> {
        self.fields()
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.schema)
    }

    /// Resolve a path against this schema and return the node it names.
    ///
    /// Fails with [`StateError::PathNotFound`] when a segment names a field
    /// the shape does not have, and with [`StateError::NotAnObject`] when a
    /// segment tries to descend through a leaf.
    pub fn node_at(&self, path: &Path) -> StateResult<&Schema> {
        let mut current = self;
        for (depth, segment) in path.iter().enumerate() {
            if current.is_leaf() {
                return Err(StateError::not_an_object(path.prefix(depth), "leaf"));
            }
            current = current
                .field(segment)
                .ok_or_else(|| StateError::path_not_found(path.prefix(depth + 1)))?;
        }
        Ok(current)
    }

    /// Walk the schema depth-first, parent before children, fields in
    /// declared order. The visitor receives each node's path (root included)
    /// and shape.
    pub fn visit<F>(&self, f: &mut F)
    where
        F: FnMut(&Path, &Schema),
    {
        let mut path = Path::root();
        self.visit_inner(&mut path, f);
    }

    fn visit_inner<F>(&self, path: &mut Path, f: &mut F)
    where
        F: FnMut(&Path, &Schema),
    {
        f(path, self);
        if let Schema::Composite(fields) = self {
            for field in fields {
                path.push(field.name.clone());
                field.schema.visit_inner(path, f);
                path.pop();
            }
        }
    }
}

/// Trait for types whose shape can be placed under remote control.
///
/// Typically implemented via `#[derive(Controllable)]`, which builds the
/// static [`Schema`] from the struct's declared fields: fields marked
/// `#[control(nested)]` become composites, everything else is a leaf.
///
/// # Example
///
/// ```ignore
/// use serde::{Deserialize, Serialize};
/// use tiller_state::Controllable;
///
/// #[derive(Clone, Serialize, Deserialize, Controllable)]
/// struct Checkpoints {
///     every_epochs: u32,
///     save_dir: String,
/// }
///
/// #[derive(Clone, Serialize, Deserialize, Controllable)]
/// struct TrainState {
///     lr: f64,
///     #[control(nested)]
///     checkpoints: Checkpoints,
/// }
/// ```
pub trait Controllable: Serialize + DeserializeOwned {
    /// The static shape descriptor for this type.
    fn schema() -> Schema;

    /// Serialize this value into a state document.
    fn to_value(&self) -> StateResult<Value> {
        serde_json::to_value(self).map_err(StateError::from)
    }

    /// Deserialize a state document back into this type.
    fn from_value(value: &Value) -> StateResult<Self> {
        serde_json::from_value(value.clone()).map_err(StateError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;

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

    #[test]
    fn test_field_lookup() {
        let schema = train_schema();
        assert!(schema.field("lr").unwrap().is_leaf());
        assert!(schema.field("checkpoints").unwrap().is_composite());
        assert!(schema.field("nope").is_none());
    }

    #[test]
    fn test_node_at() {
        let schema = train_schema();
        assert!(schema.node_at(&Path::root()).unwrap().is_composite());
        assert!(schema.node_at(&path!("lr")).unwrap().is_leaf());
        assert!(schema
            .node_at(&path!("model", "head"))
            .unwrap()
            .is_composite());
        assert!(schema
            .node_at(&path!("model", "head", "activation"))
            .unwrap()
            .is_leaf());
    }

    #[test]
    fn test_node_at_missing() {
        let schema = train_schema();
        let err = schema.node_at(&path!("model", "tail")).unwrap_err();
        assert!(matches!(err, StateError::PathNotFound { .. }));
    }

    #[test]
    fn test_node_at_through_leaf() {
        let schema = train_schema();
        let err = schema.node_at(&path!("lr", "inner")).unwrap_err();
        assert!(matches!(err, StateError::NotAnObject { .. }));
    }

    #[test]
    fn test_visit_order_parent_before_children() {
        let schema = train_schema();
        let mut seen = Vec::new();
        schema.visit(&mut |path, _| seen.push(path.to_string()));

        assert_eq!(
            seen,
            vec![
                "$",
                "lr",
                "checkpoints",
                "checkpoints.every_epochs",
                "checkpoints.save_dir",
                "model",
                "model.hidden_dim",
                "model.head",
                "model.head.activation",
            ]
        );
    }

    #[test]
    fn test_empty_composite_visits_only_itself() {
        let schema = Schema::composite(vec![SchemaField::new(
            "empty",
            Schema::composite(Vec::new()),
        )]);
        let mut seen = Vec::new();
        schema.visit(&mut |path, _| seen.push(path.to_string()));
        assert_eq!(seen, vec!["$", "empty"]);
    }
}
