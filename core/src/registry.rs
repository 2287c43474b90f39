//! Metadata Registry (spec §4.1): per-type discovery and caching of table
//! name, primary key, column map, unmapped set, and remote-attribute
//! index.
//!
//! Grounded on the teacher's dyn-trait runtime metadata pattern
//! (`core/src/traits/{column,primary_key,foreign_key}.rs`), generalized
//! from per-type compile-time codegen into a process-wide cache resolved
//! once per type at first use (spec §4.1, §5: "concurrent, read-mostly,
//! first-write-wins").
//!
//! Cached by the *address* of the type's `&'static EntityDescriptor`
//! rather than `TypeId`: every `#[derive(Entity)]` type emits exactly one
//! descriptor static, so the address is already a stable per-type key, and
//! keying on it (instead of `TypeId::of::<T>()`) lets the Path Resolver
//! (`crate::path`) resolve a *remote* type's mapping from the
//! `fn() -> &'static EntityDescriptor` stored in a `RemoteMarker` without
//! needing that remote type's concrete Rust type parameter in scope.

use crate::entity::{Entity, EntityDescriptor, FieldDescriptor, RemoteKind, RemoteMarker};
use crate::error::{RelmapError, Result};
use compact_str::CompactString;
use core::any::Any;
use hashbrown::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

/// One mapped column: which field it reads/writes and its resolved SQL
/// column name.
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    pub field_index: usize,
    pub column_name: CompactString,
}

/// The resolved correspondence between an entity type and a table (spec
/// §3.1).
#[derive(Debug)]
pub struct TypeMapping {
    pub descriptor: &'static EntityDescriptor,
    pub table_name: CompactString,
    /// Index into `descriptor.fields` (and into `columns`, in declaration
    /// order) of the primary key, if one was resolved.
    pub primary_key_field: Option<usize>,
    pub identity: bool,
    /// Mapped columns, in declaration order with the primary key first
    /// (spec §4.5: "every mapped column of the entity in a stable order,
    /// primary key first").
    pub columns: Vec<ColumnMapping>,
    /// Field indices excluded from persistence (spec §3.1 "unmapped set").
    pub unmapped: Vec<usize>,
    /// Field index -> remote marker, for fields carrying Link/Key/Property.
    pub remote: HashMap<usize, RemoteMarker>,
}

impl TypeMapping {
    /// The column name for a mapped field, by Rust field name.
    pub fn column_of(&self, rust_name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| self.descriptor.fields[c.field_index].rust_name == rust_name)
            .map(|c| c.column_name.as_str())
    }

    pub fn primary_key_field(&self) -> Option<&FieldDescriptor> {
        self.primary_key_field.map(|i| &self.descriptor.fields[i])
    }

    pub fn primary_key_column(&self) -> Option<&str> {
        let idx = self.primary_key_field?;
        self.columns
            .iter()
            .find(|c| c.field_index == idx)
            .map(|c| c.column_name.as_str())
    }

    pub fn remote_info(&self, rust_name: &str) -> Option<&RemoteMarker> {
        let idx = self
            .descriptor
            .fields
            .iter()
            .position(|f| f.rust_name == rust_name)?;
        self.remote.get(&idx)
    }
}

/// Canonicalizes a name for case/underscore-insensitive matching: lowercase
/// after removing all `_` (spec §3.1, §9).
pub fn canonical(name: &str) -> CompactString {
    let mut out = CompactString::with_capacity(name.len());
    for ch in name.chars() {
        if ch != '_' {
            out.extend(ch.to_lowercase());
        }
    }
    out
}

type DescriptorKey = usize;
type RegistryMap = HashMap<DescriptorKey, Arc<TypeMapping>>;

static REGISTRY: OnceLock<RwLock<RegistryMap>> = OnceLock::new();

fn registry() -> &'static RwLock<RegistryMap> {
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

fn descriptor_key(descriptor: &'static EntityDescriptor) -> DescriptorKey {
    descriptor as *const EntityDescriptor as usize
}

/// Resolves (and caches) the `TypeMapping` for `T`. Lock-free after the
/// first call for a given type (spec §4.1: "subsequent access is
/// lock-free read" — approximated here with an uncontended `RwLock` read,
/// since relmap targets a connection-borrowed synchronous engine rather
/// than a true lock-free structure).
pub fn resolve<T: Entity>() -> Result<Arc<TypeMapping>> {
    resolve_descriptor(T::descriptor())
}

/// Resolves (and caches) the `TypeMapping` for a bare descriptor, without
/// requiring the caller to know the concrete `Entity` type. Used by the
/// Path Resolver to look up a remote type reached only via a
/// `RemoteMarker::target` function pointer.
pub fn resolve_descriptor(descriptor: &'static EntityDescriptor) -> Result<Arc<TypeMapping>> {
    let key = descriptor_key(descriptor);

    if let Some(existing) = registry().read().unwrap().get(&key) {
        return Ok(existing.clone());
    }

    let mapping = Arc::new(build_mapping(descriptor)?);

    let mut guard = registry().write().unwrap();
    // First write wins: if another thread raced us, keep its mapping.
    let mapping = guard.entry(key).or_insert(mapping).clone();
    Ok(mapping)
}

fn build_mapping(descriptor: &'static EntityDescriptor) -> Result<TypeMapping> {
    let table_name = descriptor
        .table_override
        .map(CompactString::from)
        .unwrap_or_else(|| CompactString::from(descriptor.type_name));

    let mut columns = Vec::new();
    let mut unmapped = Vec::new();
    let mut remote = HashMap::new();
    let mut seen_columns: HashMap<CompactString, &'static str> = HashMap::new();
    let mut primary_key_field = None;
    let mut identity = false;

    for (idx, field) in descriptor.fields.iter().enumerate() {
        if let Some(marker) = &field.remote {
            remote.insert(idx, *marker);
        }

        // `Key`/`Property` markers are virtual: the field has no backing
        // column of its own and is only reachable through the resolved
        // join chain. `Link` markers are ordinary local FK columns and
        // fall through to normal column mapping below.
        let is_virtual_remote = matches!(
            field.remote,
            Some(RemoteMarker {
                kind: RemoteKind::Key | RemoteKind::Property,
                ..
            })
        );

        if field.is_not_mapped || is_virtual_remote {
            unmapped.push(idx);
            continue;
        }

        let column_name = field
            .column_override
            .map(CompactString::from)
            .unwrap_or_else(|| CompactString::from(field.rust_name));

        let key = canonical(&column_name);
        if let Some(previous) = seen_columns.insert(key, field.rust_name) {
            return Err(RelmapError::metadata(format!(
                "type `{}`: fields `{}` and `{}` both resolve to column `{}`",
                descriptor.type_name, previous, field.rust_name, column_name
            )));
        }

        if field.is_primary_key {
            if primary_key_field.is_some() {
                return Err(RelmapError::metadata(format!(
                    "type `{}`: more than one field marked as primary key",
                    descriptor.type_name
                )));
            }
            primary_key_field = Some(idx);
            identity = field.is_identity;
        }

        columns.push(ColumnMapping {
            field_index: idx,
            column_name,
        });
    }

    // Convention-based PK search, tried in order, if no marker was found:
    // `Id`, `<TypeName>Id`, `<TypeName>_Id` (spec §3.1).
    if primary_key_field.is_none() {
        let candidates = [
            CompactString::from("id"),
            canonical(&format!("{}id", descriptor.type_name)),
            canonical(&format!("{}_id", descriptor.type_name)),
        ];
        for mapping in &columns {
            let field = &descriptor.fields[mapping.field_index];
            let canon = canonical(field.rust_name);
            if candidates.iter().any(|c| *c == canon) {
                primary_key_field = Some(mapping.field_index);
                identity = descriptor.fields[mapping.field_index].is_identity;
                break;
            }
        }
    }

    let Some(primary_key_field) = primary_key_field else {
        return Err(RelmapError::metadata(format!(
            "type `{}`: no primary key found (tried [Key] marker, `Id`, `{}Id`, `{}_Id`)",
            descriptor.type_name, descriptor.type_name, descriptor.type_name
        )));
    };

    // Stable order, primary key first (spec §4.5).
    columns.sort_by_key(|c| (c.field_index != primary_key_field, c.field_index));

    Ok(TypeMapping {
        descriptor,
        table_name,
        primary_key_field: Some(primary_key_field),
        identity,
        columns,
        unmapped,
        remote,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::FieldDescriptor;
    use crate::value::SqlValue;

    struct Person {
        id: i64,
        first_name: CompactString,
    }

    fn get_id(obj: &dyn Any) -> SqlValue {
        SqlValue::BigInt(obj.downcast_ref::<Person>().unwrap().id)
    }
    fn set_id(obj: &mut dyn Any, v: SqlValue) -> Result<()> {
        if let SqlValue::BigInt(n) = v {
            obj.downcast_mut::<Person>().unwrap().id = n;
        }
        Ok(())
    }
    fn get_first_name(obj: &dyn Any) -> SqlValue {
        SqlValue::Text(obj.downcast_ref::<Person>().unwrap().first_name.clone())
    }
    fn set_first_name(obj: &mut dyn Any, v: SqlValue) -> Result<()> {
        if let SqlValue::Text(s) = v {
            obj.downcast_mut::<Person>().unwrap().first_name = s;
        }
        Ok(())
    }

    static PERSON_FIELDS: &[FieldDescriptor] = &[
        FieldDescriptor {
            rust_name: "id",
            column_override: None,
            is_primary_key: false,
            is_identity: false,
            is_not_mapped: false,
            nullable: false,
            remote: None,
            get: get_id,
            set: set_id,
        },
        FieldDescriptor {
            rust_name: "first_name",
            column_override: None,
            is_primary_key: false,
            is_identity: false,
            is_not_mapped: false,
            nullable: false,
            remote: None,
            get: get_first_name,
            set: set_first_name,
        },
    ];

    static PERSON_DESCRIPTOR: EntityDescriptor = EntityDescriptor {
        type_name: "Person",
        table_override: None,
        fields: PERSON_FIELDS,
    };

    impl Entity for Person {
        fn descriptor() -> &'static EntityDescriptor {
            &PERSON_DESCRIPTOR
        }
        fn blank() -> Self {
            Person {
                id: 0,
                first_name: CompactString::default(),
            }
        }
    }

    #[test]
    fn resolves_pk_by_convention_and_caches_result() {
        let first = resolve::<Person>().unwrap();
        assert_eq!(first.table_name.as_str(), "Person");
        assert_eq!(first.primary_key_column(), Some("id"));

        let second = resolve::<Person>().unwrap();
        assert!(Arc::ptr_eq(&first, &second), "metadata must be idempotent");
    }

    #[test]
    fn canonical_form_strips_underscores_and_lowercases() {
        assert_eq!(canonical("First_Name").as_str(), "firstname");
        assert_eq!(canonical("FIRSTNAME").as_str(), "firstname");
    }
}
