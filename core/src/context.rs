//! The shared state threaded through every translator during one
//! translation: the parameter counter, the dialect, and the join chains
//! discovered so far (spec §4.3 "the referenced path is registered for
//! later join emission", §9 "Remote join de-duplication").

use crate::dialect::SqlServerDialect;
use crate::error::{RelmapError, Result};
use crate::param::{ParamCounter, Parameter};
use crate::path::{self, JoinStep};
use crate::registry::TypeMapping;
use crate::value::SqlValue;
use compact_str::CompactString;
use hashbrown::HashMap;
use std::sync::Arc;

/// One translation's worth of shared, mutable state. A single instance is
/// created per terminal call (spec §3.4 "consumed at most once at the
/// first terminal call") and threaded through the Predicate, Order, and
/// Projection translators so their parameter counters and join chains
/// share one namespace (spec §4.8 parameter integration, §9 "each
/// translator instance owns its own counter").
pub struct TranslationContext {
    pub dialect: SqlServerDialect,
    pub mapping: Arc<TypeMapping>,
    pub base_alias: CompactString,
    pub counter: ParamCounter,
    pub params: Vec<Parameter>,
    pub joins: Vec<JoinStep>,
    alias_map: HashMap<usize, CompactString>,
    alias_seq: usize,
}

impl TranslationContext {
    pub fn new(mapping: Arc<TypeMapping>) -> Self {
        let base_alias = CompactString::from("t0");
        let mut alias_map = HashMap::new();
        alias_map.insert(descriptor_key(mapping.descriptor), base_alias.clone());
        Self {
            dialect: SqlServerDialect,
            mapping,
            base_alias,
            counter: ParamCounter::new(),
            params: Vec::new(),
            joins: Vec::new(),
            alias_map,
            alias_seq: 1,
        }
    }

    /// Quotes `<alias>.<column>` for a local (non-remote) column.
    pub fn local_column(&self, column: &str) -> String {
        self.dialect
            .quote_qualified(&self.base_alias, column)
            .to_string()
    }

    /// Resolves `Expr::Column(name)` to its fully-qualified, quoted SQL
    /// text. Registers any join chain required for a remote property
    /// (spec §4.3, §4.7).
    pub fn resolve_column(&mut self, name: &'static str) -> Result<String> {
        if let Some(col) = self.mapping.column_of(name) {
            return Ok(self.local_column(col));
        }

        let marker = self.mapping.remote_info(name).cloned().ok_or_else(|| {
            RelmapError::translation(format!(
                "the expression `{name}` is not supported in a Where clause"
            ))
        })?;

        let declaring = self.mapping.descriptor;
        let resolved = {
            let alias_map = &mut self.alias_map;
            let alias_seq = &mut self.alias_seq;
            path::resolve_remote(declaring, &marker, &mut |d| {
                alloc_alias(alias_map, alias_seq, d)
            })?
        };

        for join in &resolved.joins {
            if !self.joins.iter().any(|j| j.to_alias == join.to_alias) {
                self.joins.push(join.clone());
            }
        }

        let final_alias = resolved
            .joins
            .last()
            .map(|j| j.to_alias.clone())
            .unwrap_or_else(|| self.base_alias.clone());

        Ok(self
            .dialect
            .quote_qualified(&final_alias, &resolved.select_column)
            .to_string())
    }

    /// Binds a captured value to a freshly minted parameter name (spec
    /// §3.5). The same value always gets a new parameter.
    pub fn bind(&mut self, value: SqlValue) -> String {
        let parameter = self.counter.bind(value);
        let name = parameter.name.to_string();
        self.params.push(parameter);
        name
    }
}

fn descriptor_key(descriptor: &'static crate::entity::EntityDescriptor) -> usize {
    descriptor as *const _ as usize
}

fn alloc_alias(
    map: &mut HashMap<usize, CompactString>,
    seq: &mut usize,
    descriptor: &'static crate::entity::EntityDescriptor,
) -> CompactString {
    let key = descriptor_key(descriptor);
    if let Some(existing) = map.get(&key) {
        return existing.clone();
    }
    let alias = CompactString::from(format!("t{seq}"));
    *seq += 1;
    map.insert(key, alias.clone());
    alias
}
