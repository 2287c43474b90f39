//! Projection Translator (spec §4.5): the `SELECT` list, either the
//! identity shape (every mapped column, primary key first, plus aliased
//! remote columns) or a caller-constructed shape.

use crate::context::TranslationContext;
use crate::entity::RemoteKind;
use crate::error::{RelmapError, Result};
use crate::expr::Expr;
use crate::registry::TypeMapping;
use crate::value::SqlValue;

/// One binding in a shaped (non-identity) projection: a target name paired
/// with the expression that produces it.
#[derive(Debug, Clone)]
pub struct Binding {
    pub target_name: &'static str,
    pub value: Expr,
}

#[derive(Debug, Clone)]
pub enum Projection {
    /// `SELECT` every mapped column of the source entity, PK first, plus
    /// any remote properties declared on it (spec §4.5).
    Identity,
    /// `SELECT` a caller-constructed shape of named bindings.
    Shaped(Vec<Binding>),
}

/// One resolved SELECT item: its SQL text and the name the Materializer
/// should bind the resulting column to.
#[derive(Debug, Clone)]
pub struct SelectItem {
    pub sql: String,
    pub target_name: String,
}

pub fn translate(ctx: &mut TranslationContext, projection: &Projection) -> Result<Vec<SelectItem>> {
    match projection {
        Projection::Identity => translate_identity(ctx),
        Projection::Shaped(bindings) => translate_shaped(ctx, bindings),
    }
}

fn translate_identity(ctx: &mut TranslationContext) -> Result<Vec<SelectItem>> {
    let mapping: &TypeMapping = &ctx.mapping.clone();
    let mut items = Vec::with_capacity(mapping.columns.len() + mapping.remote.len());

    for column in &mapping.columns {
        items.push(SelectItem {
            sql: ctx.local_column(&column.column_name),
            target_name: mapping.descriptor.fields[column.field_index]
                .rust_name
                .to_string(),
        });
    }

    // Only `Key`/`Property` markers are virtual, projection-only columns;
    // `Link` markers are ordinary local FK columns already covered by the
    // loop above (spec §4.5: "plus any remote properties declared on it").
    for (&field_index, marker) in &mapping.remote {
        if matches!(marker.kind, RemoteKind::Link) {
            continue;
        }
        let field = &mapping.descriptor.fields[field_index];
        let sql = ctx.resolve_column(field.rust_name)?;
        items.push(SelectItem {
            sql,
            target_name: field.rust_name.to_string(),
        });
    }

    Ok(items)
}

fn translate_shaped(ctx: &mut TranslationContext, bindings: &[Binding]) -> Result<Vec<SelectItem>> {
    let mut items = Vec::with_capacity(bindings.len());
    for binding in bindings {
        reject_mapped_column_assignment(ctx, binding)?;
        let sql = super::predicate::scalar(ctx, &binding.value)?;
        // Boolean constants are cast to the backend's boolean/bit type
        // (spec §4.5) — a bare `1`/`0` literal would otherwise project as
        // an untyped integer rather than a `BIT` column.
        let sql = if matches!(binding.value, Expr::Constant(SqlValue::Bool(_))) {
            format!("CAST({sql} AS BIT)")
        } else {
            sql
        };
        items.push(SelectItem {
            sql,
            target_name: binding.target_name.to_string(),
        });
    }
    Ok(items)
}

/// Assigning a computed (non-identity) expression into the name of a
/// mapped, persisted column is a translation error (spec §4.5: "the
/// projection must not compute into persisted columns"). A binding whose
/// value is itself exactly `Expr::Column(same_name)` is a harmless rename
/// and is allowed.
fn reject_mapped_column_assignment(ctx: &TranslationContext, binding: &Binding) -> Result<()> {
    if ctx.mapping.column_of(binding.target_name).is_none() {
        return Ok(());
    }
    if matches!(binding.value, Expr::Column(name) if name == binding.target_name) {
        return Ok(());
    }
    Err(RelmapError::translation(format!(
        "projection cannot compute into mapped column `{}`",
        binding.target_name
    )))
}
