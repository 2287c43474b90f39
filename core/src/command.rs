//! Command Builder (spec §4.8): assembles the final SELECT/INSERT/UPDATE/
//! DELETE text and parameter list from translator fragments.
//!
//! Grounded on the teacher's chunk-based `SQL<'a, V>` builder
//! (`core/src/expressions/sql.rs`), simplified to a single `String`
//! accumulator since relmap targets one concrete dialect and one concrete
//! parameter value type rather than a generic, multi-dialect chunk list.

use crate::context::TranslationContext;
use crate::error::{RelmapError, Result};
use crate::expr::Expr;
use crate::param::Parameter;
use crate::path::JoinStep;
use crate::registry::TypeMapping;
use crate::translate::projection::SelectItem;
use crate::value::SqlValue;

/// A fully-assembled statement ready to hand to an external driver.
#[derive(Debug, Clone)]
pub struct Command {
    pub sql: String,
    pub parameters: Vec<Parameter>,
}

/// Renders the `FROM <table> AS <alias> [LEFT JOIN ...]*` clause shared by
/// every read statement (spec §4.8 assembly order).
pub fn render_from(ctx: &TranslationContext) -> String {
    let mut out = format!(
        "FROM {} AS {}",
        ctx.dialect.quote(&ctx.mapping.table_name),
        ctx.dialect.quote(&ctx.base_alias)
    );
    for join in &ctx.joins {
        render_join(&mut out, ctx, join);
    }
    out
}

fn render_join(out: &mut String, ctx: &TranslationContext, join: &JoinStep) {
    out.push_str(" LEFT JOIN ");
    out.push_str(&ctx.dialect.quote(&join.to_table));
    out.push_str(" AS ");
    out.push_str(&ctx.dialect.quote(&join.to_alias));
    out.push_str(" ON ");
    out.push_str(&ctx.dialect.quote_qualified(&join.from_alias, &join.from_column));
    out.push_str(" = ");
    out.push_str(&ctx.dialect.quote_qualified(&join.to_alias, &join.to_pk_column));
}

/// Assembles a `SELECT` (spec §4.8: "SELECT projection-or-columns ... FROM
/// ... JOIN ... WHERE ... ORDER BY ... OFFSET/FETCH").
pub fn select(
    ctx: TranslationContext,
    items: &[SelectItem],
    where_fragments: &[String],
    order_clause: &str,
) -> Command {
    let select_list = items
        .iter()
        .map(|item| format!("{} AS {}", item.sql, ctx.dialect.quote(&item.target_name)))
        .collect::<Vec<_>>()
        .join(", ");

    let mut sql = format!("SELECT {select_list} {}", render_from(&ctx));

    if !where_fragments.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&combine_and(where_fragments));
    }

    if !order_clause.is_empty() {
        sql.push(' ');
        sql.push_str(order_clause);
    }

    Command {
        sql,
        parameters: ctx.params,
    }
}

/// Assembles a scalar aggregate statement (spec §4.6). `select_clause`
/// already includes `SELECT ... FROM ... [WHERE ...]` text produced by
/// `translate::aggregate::translate`.
pub fn aggregate(ctx: TranslationContext, select_clause: String) -> Command {
    Command {
        sql: select_clause,
        parameters: ctx.params,
    }
}

pub(crate) fn combine_and(fragments: &[String]) -> String {
    fragments
        .iter()
        .map(|f| format!("({f})"))
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// `INSERT` (spec §4.8): an identity-key entity omits the PK column and
/// fetches `SCOPE_IDENTITY()`; a non-identity key includes the PK and uses
/// the supplied value.
pub fn insert(
    dialect: &crate::dialect::SqlServerDialect,
    mapping: &TypeMapping,
    values: &[(String, SqlValue)],
) -> Result<Command> {
    mapping.primary_key_field().ok_or_else(|| {
        RelmapError::metadata(format!(
            "type `{}`: has no primary key, cannot build INSERT",
            mapping.descriptor.type_name
        ))
    })?;
    let pk_column = mapping.primary_key_column().unwrap();

    let mut counter = crate::param::ParamCounter::new();
    let mut columns = Vec::new();
    let mut placeholders = Vec::new();
    let mut parameters = Vec::new();

    for (column_name, value) in values {
        if mapping.identity && column_name == pk_column {
            continue;
        }
        columns.push(dialect.quote(column_name));
        let bound = counter.bind(value.clone());
        placeholders.push(bound.name.to_string());
        parameters.push(bound);
    }

    let table = dialect.quote(&mapping.table_name);
    let mut sql = format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        columns.join(", "),
        placeholders.join(", ")
    );

    if mapping.identity {
        sql.push_str("; SELECT SCOPE_IDENTITY()");
    }

    Ok(Command { sql, parameters })
}

/// `UPDATE` (spec §4.8): writes every mapped column except the PK; the PK
/// appears in the `WHERE`.
pub fn update(
    dialect: &crate::dialect::SqlServerDialect,
    mapping: &TypeMapping,
    values: &[(String, SqlValue)],
    pk_value: SqlValue,
) -> Result<Command> {
    let pk_column = mapping.primary_key_column().ok_or_else(|| {
        RelmapError::metadata(format!(
            "type `{}`: has no primary key, cannot build UPDATE",
            mapping.descriptor.type_name
        ))
    })?;

    let mut counter = crate::param::ParamCounter::new();
    let mut assignments = Vec::new();
    let mut parameters = Vec::new();

    for (column_name, value) in values {
        if column_name == pk_column {
            continue;
        }
        let bound = counter.bind(value.clone());
        assignments.push(format!("{} = {}", dialect.quote(column_name), bound.name));
        parameters.push(bound);
    }

    let pk_bound = counter.bind(pk_value);
    let table = dialect.quote(&mapping.table_name);
    let sql = format!(
        "UPDATE {table} SET {} WHERE {} = {}",
        assignments.join(", "),
        dialect.quote(pk_column),
        pk_bound.name
    );
    parameters.push(pk_bound);

    Ok(Command { sql, parameters })
}

/// `DELETE` (spec §4.8): refuses a trivially-true `WHERE` as a best-effort
/// guard against accidental full-table deletes.
pub fn delete(ctx: TranslationContext, predicate: &Expr, where_sql: String) -> Result<Command> {
    if predicate.is_trivially_true() {
        return Err(RelmapError::translation(
            "refusing to build a DELETE with a trivially-true WHERE clause".to_string(),
        ));
    }
    let mut referenced = Vec::new();
    predicate.referenced_columns(&mut referenced);
    if referenced.is_empty() {
        return Err(RelmapError::translation(
            "DELETE predicate must reference at least one mapped column".to_string(),
        ));
    }

    let alias = ctx.dialect.quote(&ctx.base_alias);
    let from = render_from(&ctx);
    let sql = format!("DELETE {alias} {from} WHERE {where_sql}");
    Ok(Command {
        sql,
        parameters: ctx.params,
    })
}
