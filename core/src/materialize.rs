//! Materializer (spec §4.9): builds a cached ordinal→setter plan per
//! result-column shape and streams rows into fresh entity instances.
//!
//! Coercion (null→default, nullable wrapping, enum widening, numeric
//! widening, string/uuid pass-through) lives in each field's generated
//! `set` accessor (spec §3.1 "accessor plan"), since only the concrete
//! field type knows how to perform it; the Materializer's own job is
//! purely the ordinal→property lookup and its caching (spec §4.9: "build a
//! plan ... locate the target property by name-normalized match").

use crate::connection::RowCursor;
use crate::entity::{Entity, EntityDescriptor};
use crate::error::{RelmapError, Result};
use crate::registry::canonical;
use compact_str::CompactString;
use core::any::Any;
use hashbrown::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

/// One ordinal's resolved target: the field index to write through.
#[derive(Debug, Clone, Copy)]
struct SetterSlot {
    field_index: usize,
}

/// Cached ordinal→field mapping for one result shape (one cursor's column
/// list) against one entity type.
struct Plan {
    slots: Vec<SetterSlot>,
}

type PlanKey = (usize, CompactString);
static PLAN_CACHE: OnceLock<RwLock<HashMap<PlanKey, Arc<Plan>>>> = OnceLock::new();

fn plan_cache() -> &'static RwLock<HashMap<PlanKey, Arc<Plan>>> {
    PLAN_CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

fn descriptor_key(descriptor: &'static EntityDescriptor) -> usize {
    descriptor as *const _ as usize
}

fn build_plan(descriptor: &'static EntityDescriptor, cursor: &dyn RowCursor) -> Result<Plan> {
    let mut slots = Vec::with_capacity(cursor.column_count());
    for ord in 0..cursor.column_count() {
        let name = cursor.column_name(ord);
        let canon = canonical(name);
        let field_index = descriptor
            .fields
            .iter()
            .position(|f| canonical(f.rust_name) == canon)
            .ok_or_else(|| {
                RelmapError::translation(format!(
                    "type `{}`: result column `{}` does not match any mapped or aliased property",
                    descriptor.type_name, name
                ))
            })?;
        slots.push(SetterSlot { field_index });
    }
    Ok(Plan { slots })
}

fn plan_for(descriptor: &'static EntityDescriptor, cursor: &dyn RowCursor) -> Result<Arc<Plan>> {
    let mut shape_key = CompactString::default();
    for ord in 0..cursor.column_count() {
        shape_key.push_str(cursor.column_name(ord));
        shape_key.push('|');
    }
    let key = (descriptor_key(descriptor), shape_key);

    if let Some(existing) = plan_cache().read().unwrap().get(&key) {
        return Ok(existing.clone());
    }

    let plan = Arc::new(build_plan(descriptor, cursor)?);
    let mut guard = plan_cache().write().unwrap();
    let plan = guard.entry(key).or_insert(plan).clone();
    Ok(plan)
}

/// Streams the remainder of `cursor` into freshly-blanked `T` instances
/// (spec §4.9: "iteration is single-pass and non-restartable").
pub fn materialize<T: Entity>(cursor: &mut dyn RowCursor) -> Result<Vec<T>> {
    let descriptor = T::descriptor();
    let mut out = Vec::new();

    while cursor.advance()? {
        let plan = plan_for(descriptor, cursor)?;
        let mut instance = T::blank();
        {
            let any_ref: &mut dyn Any = &mut instance;
            for (ord, slot) in plan.slots.iter().enumerate() {
                let value = cursor.value(ord)?;
                let field = &descriptor.fields[slot.field_index];
                (field.set)(any_ref, value)?;
            }
        }
        out.push(instance);
    }

    Ok(out)
}

/// Materializes at most the first row, for `First`/`FirstOrDefault`-style
/// terminal calls.
pub fn materialize_one<T: Entity>(cursor: &mut dyn RowCursor) -> Result<Option<T>> {
    let descriptor = T::descriptor();
    if !cursor.advance()? {
        return Ok(None);
    }
    let plan = plan_for(descriptor, cursor)?;
    let mut instance = T::blank();
    {
        let any_ref: &mut dyn Any = &mut instance;
        for (ord, slot) in plan.slots.iter().enumerate() {
            let value = cursor.value(ord)?;
            let field = &descriptor.fields[slot.field_index];
            (field.set)(any_ref, value)?;
        }
    }
    Ok(Some(instance))
}
