//! `#[derive(Entity)]`: compiles a struct's `#[relmap(...)]`-annotated
//! shape into a static `EntityDescriptor` plus per-field accessor
//! function pointers (spec §3.1 "accessor plan").
//!
//! Grounded on the teacher's attribute-parsing style
//! (`procmacros/src/postgres/table/attributes.rs`: `syn::Meta`-driven
//! parsing of a table/column attribute vocabulary) and its top-level
//! derive dispatch (`procmacros/src/lib.rs`: parse, match `Ok`/`Err`,
//! `to_compile_error()` on failure).

mod entity;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

#[proc_macro_derive(Entity, attributes(relmap))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match entity::expand(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
