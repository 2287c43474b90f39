//! Query Facade (spec §4.10): the chainable deferred-query builder.
//! Non-terminal methods return a new, mutated `Query<T>`; terminal
//! methods consume it, triggering exactly one translation and execution.

use crate::command::{self, Command};
use crate::connection::Executor;
use crate::context::TranslationContext;
use crate::dialect::SqlServerDialect;
use crate::entity::Entity;
use crate::error::{RelmapError, Result};
use crate::expr::Expr;
use crate::materialize;
use crate::query::QueryState;
use crate::registry::{self, TypeMapping};
use crate::translate::aggregate::{self, Aggregate};
use crate::translate::order::{self, OrderKey};
use crate::translate::projection::{Binding, Projection};
use crate::translate::predicate;
use crate::value::SqlValue;
use core::any::Any;

/// The deferred query builder over entity type `T` (spec §4.10).
pub struct Query<T: Entity> {
    state: QueryState<T>,
}

impl<T: Entity> Query<T> {
    pub fn new() -> Result<Self> {
        Ok(Self {
            state: QueryState::new()?,
        })
    }

    pub fn filter(mut self, predicate: Expr) -> Self {
        self.state.predicates.push(predicate);
        self
    }

    pub fn order_by(mut self, key: Expr) -> Self {
        self.state.order.push(OrderKey::asc(key));
        self
    }

    pub fn order_by_descending(mut self, key: Expr) -> Self {
        self.state.order.push(OrderKey::desc(key));
        self
    }

    pub fn then_by(self, key: Expr) -> Self {
        self.order_by(key)
    }

    pub fn then_by_descending(self, key: Expr) -> Self {
        self.order_by_descending(key)
    }

    pub fn skip(mut self, n: u64) -> Self {
        self.state.skip = Some(n);
        self
    }

    pub fn take(mut self, n: u64) -> Self {
        self.state.take = Some(n);
        self
    }

    pub fn select(mut self, bindings: Vec<Binding>) -> Self {
        self.state.projection = Some(Projection::Shaped(bindings));
        self
    }

    fn context(&self) -> TranslationContext {
        TranslationContext::new(self.state.mapping.clone())
    }

    /// Translates every accumulated `Where` plus an optional extra
    /// predicate (the argument some terminal methods accept directly,
    /// e.g. `First(p)`) into WHERE fragments, registering any joins they
    /// need along the way.
    fn translate_predicates(&self, ctx: &mut TranslationContext, extra: Option<&Expr>) -> Result<Vec<String>> {
        let mut fragments = Vec::with_capacity(self.state.predicates.len() + 1);
        for expr in &self.state.predicates {
            fragments.push(predicate::translate(ctx, expr)?);
        }
        if let Some(expr) = extra {
            fragments.push(predicate::translate(ctx, expr)?);
        }
        Ok(fragments)
    }

    fn select_command(&self, extra_predicate: Option<&Expr>, reverse_for_last: bool, limit: Option<u64>) -> Result<Command> {
        let mut ctx = self.context();
        let where_fragments = self.translate_predicates(&mut ctx, extra_predicate)?;
        let projection = self
            .state
            .projection
            .clone()
            .unwrap_or(Projection::Identity);
        let items = crate::translate::projection::translate(&mut ctx, &projection)?;
        let order_sql = order::translate(
            &mut ctx,
            self.state.order.clone(),
            self.state.skip,
            limit.or(self.state.take),
            reverse_for_last,
        )?;
        Ok(command::select(ctx, &items, &where_fragments, &order_sql))
    }

    /// `ToList` (spec §4.10): executes and materializes every matching row.
    pub fn to_list(self, exec: &mut impl Executor) -> Result<Vec<T>> {
        let cmd = self.select_command(None, false, None)?;
        let mut cursor = exec.execute_reader(&cmd)?;
        materialize::materialize::<T>(cursor.as_mut())
    }

    /// `First` (spec §4.10): errors if no row matches.
    pub fn first(self, exec: &mut impl Executor, predicate: Option<Expr>) -> Result<T> {
        self.first_or_default(exec, predicate)?
            .ok_or_else(|| RelmapError::EmptySequence)
    }

    /// `FirstOrDefault`.
    pub fn first_or_default(self, exec: &mut impl Executor, predicate: Option<Expr>) -> Result<Option<T>> {
        let cmd = self.select_command(predicate.as_ref(), false, Some(1))?;
        let mut cursor = exec.execute_reader(&cmd)?;
        materialize::materialize_one::<T>(cursor.as_mut())
    }

    /// `Last` (spec §4.10, §4.4: "reverses the ordering ... maps to First").
    pub fn last(self, exec: &mut impl Executor, predicate: Option<Expr>) -> Result<T> {
        self.last_or_default(exec, predicate)?
            .ok_or_else(|| RelmapError::EmptySequence)
    }

    pub fn last_or_default(self, exec: &mut impl Executor, predicate: Option<Expr>) -> Result<Option<T>> {
        let cmd = self.select_command(predicate.as_ref(), true, Some(1))?;
        let mut cursor = exec.execute_reader(&cmd)?;
        materialize::materialize_one::<T>(cursor.as_mut())
    }

    fn aggregate_command(&self, kind: Aggregate, extra_predicate: Option<&Expr>) -> Result<Command> {
        let mut ctx = self.context();
        let where_fragments = self.translate_predicates(&mut ctx, extra_predicate)?;
        let table_from = command::render_from(&ctx);
        let where_clause = if where_fragments.is_empty() {
            None
        } else {
            Some(crate::command::combine_and(&where_fragments))
        };
        let plan = aggregate::translate(&mut ctx, &kind, &table_from, where_clause.as_deref())?;
        Ok(command::aggregate(ctx, plan.select_clause))
    }

    pub fn count(self, exec: &mut impl Executor, predicate: Option<Expr>) -> Result<i64> {
        let cmd = self.aggregate_command(Aggregate::Count, predicate.as_ref())?;
        match exec.execute_scalar(&cmd)? {
            crate::value::SqlValue::BigInt(n) => Ok(n),
            crate::value::SqlValue::Int(n) => Ok(n as i64),
            other => Err(RelmapError::translation(format!(
                "COUNT returned an unexpected value of type `{}`",
                other.type_name()
            ))),
        }
    }

    pub fn any(self, exec: &mut impl Executor, predicate: Option<Expr>) -> Result<bool> {
        let cmd = self.aggregate_command(Aggregate::Any, predicate.as_ref())?;
        Ok(scalar_to_bool(exec.execute_scalar(&cmd)?)?)
    }

    pub fn all(self, exec: &mut impl Executor, predicate: Expr) -> Result<bool> {
        let cmd = self.aggregate_command(Aggregate::All(predicate), None)?;
        Ok(scalar_to_bool(exec.execute_scalar(&cmd)?)?)
    }

    pub fn min(self, exec: &mut impl Executor, selector: Expr) -> Result<crate::value::SqlValue> {
        let nullable = self.selector_nullable(&selector);
        let cmd = self.aggregate_command(Aggregate::Min(selector), None)?;
        non_empty_scalar(exec.execute_scalar(&cmd)?, nullable)
    }

    pub fn max(self, exec: &mut impl Executor, selector: Expr) -> Result<crate::value::SqlValue> {
        let nullable = self.selector_nullable(&selector);
        let cmd = self.aggregate_command(Aggregate::Max(selector), None)?;
        non_empty_scalar(exec.execute_scalar(&cmd)?, nullable)
    }

    pub fn avg(self, exec: &mut impl Executor, selector: Expr) -> Result<crate::value::SqlValue> {
        let nullable = self.selector_nullable(&selector);
        let cmd = self.aggregate_command(Aggregate::Avg(selector), None)?;
        non_empty_scalar(exec.execute_scalar(&cmd)?, nullable)
    }

    /// Whether `selector` (a simple mapped-column reference, per
    /// `translate::aggregate::simple_column`) is nullable, per the backing
    /// field's `FieldDescriptor.nullable` (spec §4.6: `DBNull` → error for
    /// non-nullable selectors, `null` for nullable ones). Anything else
    /// (a selector the aggregate translator will itself reject) is treated
    /// as non-nullable.
    fn selector_nullable(&self, selector: &Expr) -> bool {
        let Expr::Column(name) = selector else {
            return false;
        };
        self.state
            .mapping
            .descriptor
            .fields
            .iter()
            .find(|f| f.rust_name == *name)
            .is_some_and(|f| f.nullable)
    }

    /// `Delete` is not part of spec §4.10's enumerated chain, but is the
    /// write-side counterpart guarded by the transaction requirement in
    /// spec §5 ("Delete must be invoked within an active transaction").
    pub fn delete(self, exec: &mut impl Executor) -> Result<u64> {
        if !exec.in_transaction() {
            return Err(RelmapError::NoActiveTransaction);
        }
        let predicate = self
            .state
            .combined_predicate()
            .ok_or_else(|| RelmapError::translation("DELETE requires a WHERE clause".to_string()))?;
        let mut ctx = self.context();
        let where_sql = predicate::translate(&mut ctx, &predicate)?;
        let cmd = command::delete(ctx, &predicate, where_sql)?;
        exec.execute_non_query(&cmd)
    }

    /// `Insert` (spec §4.10, §8 Scenario 6): builds an `INSERT` from
    /// `entity`'s current field values, executes it, and — for an
    /// identity-keyed entity — writes the returned identity scalar back
    /// into the entity's primary key field.
    pub fn insert(exec: &mut impl Executor, entity: &mut T) -> Result<()> {
        let mapping = registry::resolve::<T>()?;
        let dialect = SqlServerDialect;
        let values = collect_values(&mapping, entity);
        let cmd = command::insert(&dialect, &mapping, &values)?;

        if mapping.identity {
            let identity = exec.execute_scalar(&cmd)?;
            let pk_field = mapping.primary_key_field().ok_or_else(|| {
                RelmapError::metadata(format!(
                    "type `{}`: identity insert requires a primary key",
                    mapping.descriptor.type_name
                ))
            })?;
            (pk_field.set)(entity as &mut dyn Any, identity)?;
        } else {
            exec.execute_non_query(&cmd)?;
        }
        Ok(())
    }
}

/// Reads every mapped column's current value off `entity`, in the same
/// stable, PK-first order `TypeMapping::columns` carries (spec §4.5).
fn collect_values<T: Entity>(mapping: &TypeMapping, entity: &T) -> Vec<(String, SqlValue)> {
    mapping
        .columns
        .iter()
        .map(|c| {
            let field = &mapping.descriptor.fields[c.field_index];
            (c.column_name.to_string(), (field.get)(entity as &dyn Any))
        })
        .collect()
}

fn scalar_to_bool(value: crate::value::SqlValue) -> Result<bool> {
    use crate::value::SqlValue;
    match value {
        SqlValue::Bool(b) => Ok(b),
        SqlValue::Int(n) => Ok(n != 0),
        SqlValue::BigInt(n) => Ok(n != 0),
        SqlValue::SmallInt(n) => Ok(n != 0),
        other => Err(RelmapError::translation(format!(
            "expected a boolean-convertible scalar, got `{}`",
            other.type_name()
        ))),
    }
}

fn non_empty_scalar(value: crate::value::SqlValue, selector_nullable: bool) -> Result<crate::value::SqlValue> {
    if value.is_null() {
        if selector_nullable {
            return Ok(crate::value::SqlValue::Null);
        }
        return Err(RelmapError::EmptySequence);
    }
    Ok(value)
}
