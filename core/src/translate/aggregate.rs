//! Aggregate Planner (spec §4.6): rewrites a terminal aggregate call into
//! a single scalar SQL statement body (the `SELECT ...` clause, to be
//! wrapped with `FROM`/`WHERE` by the Command Builder).

use crate::context::TranslationContext;
use crate::error::{RelmapError, Result};
use crate::expr::Expr;

#[derive(Debug, Clone)]
pub enum Aggregate {
    Count,
    Any,
    /// `All(pred)`: the predicate every row must satisfy.
    All(Expr),
    Min(Expr),
    Max(Expr),
    Avg(Expr),
}

/// The emitted scalar `SELECT` clause, plus (for `All`) the extra WHERE
/// fragment the Command Builder must combine with the query's own
/// predicates via `NOT (...)` inside the nested `EXISTS`.
pub struct Plan {
    pub select_clause: String,
}

/// `selector` must be a simple mapped column reference (spec §4.6: "else
/// error"); remote/computed selectors are rejected.
fn simple_column(ctx: &TranslationContext, selector: &Expr) -> Result<String> {
    let Expr::Column(name) = selector else {
        return Err(RelmapError::translation(
            "aggregate selector must be a simple column reference".to_string(),
        ));
    };
    let column = ctx.mapping.column_of(name).ok_or_else(|| {
        RelmapError::translation(format!(
            "aggregate selector `{name}` must be a locally mapped column, not a remote property"
        ))
    })?;
    Ok(ctx.local_column(column))
}

/// `table_from` is the already-quoted, already-joined `FROM ... [JOIN ...]`
/// clause text the Command Builder assembled; `where_clause` is the
/// combined predicate text (without the leading `WHERE`), if any.
pub fn translate(
    ctx: &mut TranslationContext,
    aggregate: &Aggregate,
    table_from: &str,
    where_clause: Option<&str>,
) -> Result<Plan> {
    let select_clause = match aggregate {
        Aggregate::Count => {
            let mut sql = format!("SELECT COUNT(*) {table_from}");
            if let Some(w) = where_clause {
                sql.push_str(" WHERE ");
                sql.push_str(w);
            }
            sql
        }
        Aggregate::Any => {
            let mut inner = format!("SELECT 1 {table_from}");
            if let Some(w) = where_clause {
                inner.push_str(" WHERE ");
                inner.push_str(w);
            }
            format!("SELECT CASE WHEN EXISTS ({inner}) THEN 1 ELSE 0 END")
        }
        Aggregate::All(predicate) => {
            let negated = super::predicate::translate(ctx, predicate)?;
            let mut inner = format!("SELECT 1 {table_from} WHERE NOT ({negated})");
            if let Some(w) = where_clause {
                inner.push_str(" AND (");
                inner.push_str(w);
                inner.push(')');
            }
            format!("SELECT CASE WHEN EXISTS ({inner}) THEN 0 ELSE 1 END")
        }
        Aggregate::Min(selector) => {
            let column = simple_column(ctx, selector)?;
            wrap_scalar_aggregate("MIN", &column, table_from, where_clause)
        }
        Aggregate::Max(selector) => {
            let column = simple_column(ctx, selector)?;
            wrap_scalar_aggregate("MAX", &column, table_from, where_clause)
        }
        Aggregate::Avg(selector) => {
            let column = simple_column(ctx, selector)?;
            wrap_scalar_aggregate("AVG", &column, table_from, where_clause)
        }
    };
    Ok(Plan { select_clause })
}

fn wrap_scalar_aggregate(
    func: &str,
    column: &str,
    table_from: &str,
    where_clause: Option<&str>,
) -> String {
    let mut sql = format!("SELECT {func}({column}) {table_from}");
    if let Some(w) = where_clause {
        sql.push_str(" WHERE ");
        sql.push_str(w);
    }
    sql
}
