//! Static entity descriptors (spec §3.1, §3.2, §6.1).
//!
//! Rust has no runtime reflection, so the *shape* of an entity (field
//! names, column overrides, markers) is captured at compile time by
//! `#[derive(Entity)]` in `relmap-macros`. The registry (`crate::registry`)
//! is what performs the runtime "first use discovery" spec §4.1 describes:
//! primary-key convention search, column-name normalization, conflict
//! detection, and remote-path resolution, all cached per type after the
//! first resolution.

use crate::value::SqlValue;
use core::any::Any;

/// One of the three remote-property markers from spec §3.2.
#[derive(Debug, Clone, Copy)]
pub enum RemoteKind {
    /// `Link(target_type)`: a local scalar column is an FK to `target_type`.
    Link,
    /// `Key(remote_type, key_path)`: projects the PK of a row in
    /// `remote_type` reached via `key_path`.
    Key,
    /// `Property(remote_type, key_path)`: projects an arbitrary column of a
    /// row in `remote_type` reached via `key_path`.
    Property,
}

/// A remote marker attached to a property, as declared by
/// `#[relmap(link(..))]` / `#[relmap(remote_key(..))]` /
/// `#[relmap(remote_property(..))]`.
#[derive(Debug, Clone, Copy)]
pub struct RemoteMarker {
    pub kind: RemoteKind,
    /// The remote entity's descriptor accessor. `Link` markers only need
    /// the target type for FK-graph edges; `Key`/`Property` markers use it
    /// as the final hop of `key_path`.
    pub target: fn() -> &'static EntityDescriptor,
    /// Ordered, possibly-empty sequence of property names (spec §3.2).
    /// Empty/one-segment means "inferred mode"; 2+ segments means
    /// "explicit mode" where the last segment is the target column name.
    pub key_path: &'static [&'static str],
}

/// Compiled getter/setter pair for one mapped field — the "accessor plan"
/// of spec §4.1/§9, replacing per-call reflection with function pointers.
#[derive(Clone, Copy)]
pub struct FieldDescriptor {
    /// Rust field name (used for convention-based column/PK matching).
    pub rust_name: &'static str,
    /// Explicit column-name override, if `#[relmap(column = "...")]` was
    /// given; `None` means "derive from `rust_name`" (spec §3.1).
    pub column_override: Option<&'static str>,
    pub is_primary_key: bool,
    pub is_identity: bool,
    pub is_not_mapped: bool,
    pub nullable: bool,
    pub remote: Option<RemoteMarker>,
    /// Reads this field's current value out of an owning entity, already
    /// type-erased to `&dyn Any` so the registry can store descriptors
    /// without a type parameter.
    pub get: fn(&dyn Any) -> SqlValue,
    /// Writes a decoded column value into an owning entity.
    pub set: fn(&mut dyn Any, SqlValue) -> crate::error::Result<()>,
}

impl core::fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("rust_name", &self.rust_name)
            .field("column_override", &self.column_override)
            .field("is_primary_key", &self.is_primary_key)
            .field("is_identity", &self.is_identity)
            .field("is_not_mapped", &self.is_not_mapped)
            .finish()
    }
}

/// The compile-time-derived shape of an entity type, emitted by
/// `#[derive(Entity)]`.
#[derive(Debug, Clone, Copy)]
pub struct EntityDescriptor {
    /// Rust type's simple name.
    pub type_name: &'static str,
    /// Explicit table-name override from `#[relmap(table = "...")]`.
    pub table_override: Option<&'static str>,
    pub fields: &'static [FieldDescriptor],
}

/// A user-defined record type mapped one-to-one with a table row.
///
/// Implemented by `#[derive(Entity)]`. `descriptor()` returns compile-time
/// shape data; `new_boxed`/`downcast` let the materializer construct and
/// populate fresh instances without knowing the concrete type at the call
/// site of the generic registry code.
pub trait Entity: Any + Sized + Send + Sync + 'static {
    fn descriptor() -> &'static EntityDescriptor;

    /// Builds a default-initialized instance ready for field-by-field
    /// population by the materializer.
    fn blank() -> Self;
}
