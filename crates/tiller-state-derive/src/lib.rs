//! Derive macro for the tiller-state `Controllable` trait.
//!
//! Generates the static schema descriptor for a struct from its declared
//! fields: field names in declaration order, each classified as a leaf or —
//! when marked `#[control(nested)]` — as a composite described by the field
//! type's own `Controllable` implementation.
//!
//! # Usage
//!
//! ```ignore
//! use serde::{Deserialize, Serialize};
//! use tiller_state_derive::Controllable;
//!
//! #[derive(Clone, Serialize, Deserialize, Controllable)]
//! struct TrainState {
//!     lr: f64,
//!     #[control(nested)]
//!     checkpoints: Checkpoints,
//! }
//! ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod codegen;
mod parse;

/// Derive the `Controllable` trait for a struct.
///
/// # Field Attributes
///
/// - `#[control(nested)]`: the field is a composite; its shape comes from
///   the field type's own `Controllable::schema()`. Without this, the field
///   is a leaf and its value is read and replaced wholesale.
/// - `#[control(rename = "json_name")]`: use a different name in paths and
///   payloads (pair it with the matching `#[serde(rename)]`).
/// - `#[control(skip)]`: exclude the field from the controlled shape.
#[proc_macro_derive(Controllable, attributes(control))]
pub fn derive_controllable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match codegen::expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
