//! Schema descriptor code generation.

use crate::parse::ControllableInput;
use darling::FromDeriveInput;
use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

/// Generate the `Controllable` implementation.
pub fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let parsed = match ControllableInput::from_derive_input(input) {
        Ok(parsed) => parsed,
        Err(err) => return Ok(err.write_errors()),
    };

    let struct_name = &parsed.ident;

    let field_descriptors: Vec<TokenStream> = parsed
        .fields()
        .into_iter()
        .filter(|f| f.is_included())
        .map(|field| {
            let name = field.field_name();
            if field.nested {
                let ty = &field.ty;
                quote! {
                    ::tiller_state::SchemaField::new(
                        #name,
                        <#ty as ::tiller_state::Controllable>::schema(),
                    )
                }
            } else {
                quote! {
                    ::tiller_state::SchemaField::new(#name, ::tiller_state::Schema::Leaf)
                }
            }
        })
        .collect();

    Ok(quote! {
        impl ::tiller_state::Controllable for #struct_name {
            fn schema() -> ::tiller_state::Schema {
                ::tiller_state::Schema::composite(::std::vec![
                    #(#field_descriptors),*
                ])
            }
        }
    })
}
