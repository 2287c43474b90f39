//! Query IR (spec §3.4): the accumulated state of a deferred query before
//! a terminal call translates and executes it.

use crate::entity::Entity;
use crate::expr::Expr;
use crate::registry::{self, TypeMapping};
use crate::translate::order::OrderKey;
use crate::translate::projection::Projection;
use core::marker::PhantomData;
use std::sync::Arc;

/// Accumulated, not-yet-translated state of one query over `T`.
///
/// Not `Clone`: the spec's "consumed at most once at the first terminal
/// call" (§3.4) is enforced by Rust's move semantics rather than a runtime
/// flag — every terminal method on the facade takes `self` by value.
pub struct QueryState<T: Entity> {
    pub mapping: Arc<TypeMapping>,
    /// Implicitly AND-combined, in chaining order (spec §3.4, §8 "chained
    /// Where = AND").
    pub predicates: Vec<Expr>,
    pub order: Vec<OrderKey>,
    pub skip: Option<u64>,
    pub take: Option<u64>,
    pub projection: Option<Projection>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> QueryState<T> {
    pub fn new() -> crate::error::Result<Self> {
        Ok(Self {
            mapping: registry::resolve::<T>()?,
            predicates: Vec::new(),
            order: Vec::new(),
            skip: None,
            take: None,
            projection: None,
            _marker: PhantomData,
        })
    }

    pub fn combined_predicate(&self) -> Option<Expr> {
        Expr::fold_and(self.predicates.iter().cloned())
    }
}
