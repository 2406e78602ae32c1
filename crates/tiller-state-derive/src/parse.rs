//! Parsing logic for the Controllable derive macro.

use darling::{ast, FromDeriveInput, FromField};
use syn::{Generics, Ident, Type};

/// Parsed struct-level options.
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(control), supports(struct_named))]
pub struct ControllableInput {
    /// The struct identifier.
    pub ident: Ident,

    /// Generic parameters.
    #[allow(dead_code)]
    pub generics: Generics,

    /// Struct data (fields).
    pub data: ast::Data<(), FieldInput>,
}

impl ControllableInput {
    /// Get the fields as a vector.
    pub fn fields(&self) -> Vec<&FieldInput> {
        self.data
            .as_ref()
            .take_struct()
            .map(|s| s.fields.to_vec())
            .unwrap_or_default()
    }
}

/// Parsed field-level options.
#[derive(Debug, FromField)]
#[darling(attributes(control))]
pub struct FieldInput {
    /// Field identifier.
    pub ident: Option<Ident>,

    /// Field type.
    pub ty: Type,

    /// Rename the field in paths and payloads.
    #[darling(default)]
    pub rename: Option<String>,

    /// Exclude the field from the controlled shape.
    #[darling(default)]
    pub skip: bool,

    /// Treat the field as a nested composite.
    #[darling(default)]
    pub nested: bool,
}

impl FieldInput {
    /// Get the field identifier (panics if None).
    pub fn ident(&self) -> &Ident {
        self.ident.as_ref().expect("named field required")
    }

    /// Get the path/payload name for this field.
    pub fn field_name(&self) -> String {
        self.rename
            .clone()
            .unwrap_or_else(|| self.ident().to_string())
    }

    /// Check if this field is part of the controlled shape.
    pub fn is_included(&self) -> bool {
        !self.skip
    }
}
