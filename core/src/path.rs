//! Path Resolver (spec §4.7): resolves a `RemoteMarker`'s `(remote_type,
//! key_path)` to an ordered join chain.
//!
//! The spec's FK-graph edges are "every property carrying a `Link` marker
//! or following the `<TargetType>Id` convention." Rust has no runtime
//! reflection, so a name like `EmployerId` cannot be resolved to a
//! concrete remote type unless that type is already known from context —
//! there is no global name→type registry to consult. relmap resolves this
//! by tracking the set of types already *known* during a single
//! resolution (the declared remote target, plus every type reached so far
//! via an explicit `Link` edge) and only accepting a convention-named
//! field as an edge to one of those known types. Explicit-mode
//! intermediate hops (spec §3.2) always require a `Link` marker, since
//! resolving segment *N+1* needs segment *N*'s target type in hand.
//! This adaptation is recorded in `DESIGN.md`.

use crate::entity::{EntityDescriptor, FieldDescriptor, RemoteKind, RemoteMarker};
use crate::error::{RelmapError, Result};
use crate::registry::{self, canonical};
use compact_str::CompactString;
use smallvec::SmallVec;

/// A FK chain never exceeds `resolve_inferred`'s search depth, so each
/// candidate path is kept inline rather than heap-allocated.
type HopPath = SmallVec<[Hop; 6]>;

/// One FK hop discovered while resolving a remote marker.
#[derive(Debug, Clone, Copy)]
struct Hop {
    from: &'static EntityDescriptor,
    field: &'static FieldDescriptor,
    to: &'static EntityDescriptor,
}

/// One join the Command Builder must emit (spec §4.7 output).
#[derive(Debug, Clone)]
pub struct JoinStep {
    pub from_alias: CompactString,
    pub from_column: CompactString,
    pub to_descriptor: &'static EntityDescriptor,
    pub to_table: CompactString,
    pub to_alias: CompactString,
    pub to_pk_column: CompactString,
}

/// The fully-resolved shape of a remote property reference.
#[derive(Debug, Clone)]
pub struct ResolvedPath {
    /// Ordered join chain (spec §4.7: "all joins are LEFT OUTER joins").
    pub joins: Vec<JoinStep>,
    /// The column to select on the final table in the chain (or on the
    /// declaring table itself, if `joins` is empty).
    pub select_column: CompactString,
}

impl ResolvedPath {
    /// A stable key identifying this join chain, so two remote properties
    /// sharing a prefix — or an identical chain — share the same emitted
    /// joins (spec §4.7, §9 "Remote join de-duplication").
    pub fn chain_key(&self) -> CompactString {
        let mut key = CompactString::default();
        for join in &self.joins {
            key.push_str(join.from_alias.as_str());
            key.push('>');
            key.push_str(join.to_table.as_str());
            key.push('|');
        }
        key
    }
}

fn ptr_eq(a: &'static EntityDescriptor, b: &'static EntityDescriptor) -> bool {
    core::ptr::eq(a, b)
}

/// Resolves a remote marker declared on `declaring` into a join chain and
/// select column, given a table-alias allocator (`alias_for`) shared
/// across the whole translation so repeated chains collapse to the same
/// alias (spec §4.7, §9).
pub fn resolve_remote(
    declaring: &'static EntityDescriptor,
    marker: &RemoteMarker,
    alias_for: &mut impl FnMut(&'static EntityDescriptor) -> CompactString,
) -> Result<ResolvedPath> {
    let remote = (marker.target)();

    let hops = if marker.key_path.len() > 1 {
        resolve_explicit(declaring, marker.key_path, remote)?
    } else {
        resolve_inferred(declaring, remote)?
    };

    let column_name = *marker.key_path.last().unwrap_or(&"Id");

    let mut joins = Vec::with_capacity(hops.len());
    let mut current_alias = alias_for(declaring);
    for hop in &hops {
        let from_mapping = registry::resolve_descriptor(hop.from)?;
        let from_column = from_mapping
            .column_of(hop.field.rust_name)
            .ok_or_else(|| {
                RelmapError::metadata(format!(
                    "type `{}`: FK field `{}` is not a mapped column",
                    hop.from.type_name, hop.field.rust_name
                ))
            })?
            .into();
        let to_mapping = registry::resolve_descriptor(hop.to)?;
        let to_pk_column = to_mapping.primary_key_column().ok_or_else(|| {
            RelmapError::metadata(format!(
                "type `{}`: has no primary key, cannot be joined to",
                hop.to.type_name
            ))
        })?;
        let to_alias = alias_for(hop.to);
        joins.push(JoinStep {
            from_alias: current_alias.clone(),
            from_column,
            to_descriptor: hop.to,
            to_table: to_mapping.table_name.clone(),
            to_alias: to_alias.clone(),
            to_pk_column: to_pk_column.into(),
        });
        current_alias = to_alias;
    }

    let target_mapping = registry::resolve_descriptor(remote)?;
    let select_column = match marker.kind {
        RemoteKind::Key => target_mapping
            .primary_key_column()
            .map(CompactString::from)
            .ok_or_else(|| {
                RelmapError::metadata(format!(
                    "type `{}`: has no primary key to project",
                    remote.type_name
                ))
            })?,
        _ => target_mapping
            .column_of(column_name)
            .map(CompactString::from)
            .ok_or_else(|| {
                RelmapError::metadata(format!(
                    "type `{}`: has no column `{}`",
                    remote.type_name, column_name
                ))
            })?,
    };

    Ok(ResolvedPath {
        joins,
        select_column,
    })
}

/// Returns every FK edge out of `node`: explicit `Link` fields, plus any
/// mapped field whose canonical name matches `<TargetType>Id` for a
/// `known` target (see module docs).
fn edges(
    node: &'static EntityDescriptor,
    known: &[&'static EntityDescriptor],
) -> Result<Vec<Hop>> {
    let mapping = registry::resolve_descriptor(node)?;
    let mut out = Vec::new();
    for column in &mapping.columns {
        let field = &node.fields[column.field_index];
        match &field.remote {
            Some(RemoteMarker {
                kind: RemoteKind::Link,
                target,
                ..
            }) => out.push(Hop {
                from: node,
                field,
                to: target(),
            }),
            _ => {
                for candidate in known {
                    let expected = canonical(&format!("{}Id", candidate.type_name));
                    if canonical(field.rust_name) == expected {
                        out.push(Hop {
                            from: node,
                            field,
                            to: candidate,
                        });
                        break;
                    }
                }
            }
        }
    }
    Ok(out)
}

fn resolve_explicit(
    declaring: &'static EntityDescriptor,
    key_path: &'static [&'static str],
    remote: &'static EntityDescriptor,
) -> Result<HopPath> {
    let mut current = declaring;
    let mut hops = HopPath::new();

    for segment in &key_path[..key_path.len() - 1] {
        let mapping = registry::resolve_descriptor(current)?;
        let field = current
            .fields
            .iter()
            .find(|f| f.rust_name == *segment)
            .ok_or_else(|| {
                RelmapError::metadata(format!(
                    "type `{}`: explicit path segment `{}` is not a field",
                    current.type_name, segment
                ))
            })?;
        let _ = &mapping; // ensures the intermediate type is resolvable
        let target = match &field.remote {
            Some(RemoteMarker {
                kind: RemoteKind::Link,
                target,
                ..
            }) => target(),
            _ => {
                return Err(RelmapError::metadata(format!(
                    "type `{}`: explicit path segment `{}` is not a Link-marked FK property",
                    current.type_name, segment
                )));
            }
        };
        hops.push(Hop {
            from: current,
            field,
            to: target,
        });
        current = target;
    }

    if !ptr_eq(current, remote) {
        return Err(RelmapError::metadata(format!(
            "explicit path from `{}` does not terminate at `{}`",
            declaring.type_name, remote.type_name
        )));
    }

    Ok(hops)
}

fn resolve_inferred(
    declaring: &'static EntityDescriptor,
    remote: &'static EntityDescriptor,
) -> Result<HopPath> {
    const MAX_DEPTH: usize = 6;

    if ptr_eq(declaring, remote) {
        return Ok(HopPath::new());
    }

    let mut known: Vec<&'static EntityDescriptor> = vec![remote];
    let mut frontier: Vec<HopPath> = vec![HopPath::new()];
    let mut frontier_nodes: Vec<&'static EntityDescriptor> = vec![declaring];

    for _ in 0..MAX_DEPTH {
        let mut completed = Vec::new();
        for (node, path) in frontier_nodes.iter().zip(frontier.iter()) {
            if !path.is_empty() && ptr_eq(node, remote) {
                completed.push(path.clone());
            }
        }
        if !completed.is_empty() {
            if completed.len() == 1 {
                return Ok(completed.into_iter().next().unwrap());
            }
            return Err(RelmapError::AmbiguousMatch {
                from: declaring.type_name.into(),
                to: remote.type_name.into(),
                count: completed.len(),
            });
        }

        let mut next_paths = Vec::new();
        let mut next_nodes = Vec::new();
        for (node, path) in frontier_nodes.iter().zip(frontier.iter()) {
            if ptr_eq(node, remote) {
                continue;
            }
            for hop in edges(node, &known)? {
                if !known.iter().any(|k| ptr_eq(k, hop.to)) {
                    known.push(hop.to);
                }
                let mut new_path = path.clone();
                new_path.push(hop);
                next_nodes.push(hop.to);
                next_paths.push(new_path);
            }
        }
        if next_paths.is_empty() {
            return Err(RelmapError::PathNotFound {
                from: declaring.type_name.into(),
                to: remote.type_name.into(),
            });
        }
        frontier = next_paths;
        frontier_nodes = next_nodes;
    }

    Err(RelmapError::PathNotFound {
        from: declaring.type_name.into(),
        to: remote.type_name.into(),
    })
}
