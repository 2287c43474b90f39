//! Predicate Translator (spec §4.3): walks an `Expr` tree and emits a
//! parenthesized boolean SQL fragment plus the parameters it binds.

use crate::context::TranslationContext;
use crate::error::Result;
use crate::expr::{null, CompareOp, Expr, LikeKind};
use crate::value::SqlValue;

/// Translates a boolean-valued `Expr` into a SQL fragment, writing bound
/// parameters into `ctx`. The returned text is safe to splice directly
/// into a `WHERE`/`ON`/`HAVING` clause without further parenthesization.
pub fn translate(ctx: &mut TranslationContext, expr: &Expr) -> Result<String> {
    // Null-comparison law: `col == null` / `col != null` must never become
    // `= NULL`, which SQL Server treats as unknown rather than a match
    // (spec §4.3, §8 "Null comparison law").
    if let Some((inner, is_eq)) = null::as_null_comparison(expr) {
        let column = scalar(ctx, inner)?;
        return Ok(format!(
            "{column} IS {}NULL",
            if is_eq { "" } else { "NOT " }
        ));
    }

    match expr {
        Expr::And(left, right) => Ok(format!(
            "({}) AND ({})",
            translate(ctx, left)?,
            translate(ctx, right)?
        )),
        Expr::Or(left, right) => Ok(format!(
            "({}) OR ({})",
            translate(ctx, left)?,
            translate(ctx, right)?
        )),
        Expr::Not(inner) => Ok(format!("NOT ({})", translate(ctx, inner)?)),

        Expr::Compare { op, left, right } => {
            let lhs = scalar(ctx, left)?;
            let rhs = scalar(ctx, right)?;
            Ok(format!("{lhs} {} {rhs}", op.as_sql()))
        }

        Expr::HasValue(inner) => Ok(format!("{} IS NOT NULL", scalar(ctx, inner)?)),

        Expr::In { needle, haystack } => translate_in(ctx, needle, haystack),

        Expr::Like {
            kind,
            column,
            pattern,
        } => translate_like(ctx, *kind, column, pattern),

        Expr::DatePart { .. } | Expr::Column(_) | Expr::Constant(_) | Expr::Conditional { .. } => {
            // A bare scalar used directly as a boolean predicate, e.g. a
            // `bool` column referenced without an explicit comparison.
            Ok(format!("{} = 1", scalar(ctx, expr)?))
        }
    }
}

/// Translates a non-boolean leaf expression (column reference, constant,
/// date part, or conditional) to its scalar SQL text. Shared with the
/// Order and Projection translators, which need the same leaf handling
/// for order keys and non-conditional projection bindings.
pub(crate) fn scalar(ctx: &mut TranslationContext, expr: &Expr) -> Result<String> {
    match expr {
        Expr::Column(name) => ctx.resolve_column(name),
        Expr::Constant(value) => Ok(ctx.bind(value.clone())),
        Expr::DatePart { part, column } => {
            Ok(format!("{}({})", part.sql_function(), scalar(ctx, column)?))
        }
        Expr::Conditional {
            test,
            if_true,
            if_false,
        } => Ok(format!(
            "CASE WHEN {} THEN {} ELSE {} END",
            translate(ctx, test)?,
            scalar(ctx, if_true)?,
            scalar(ctx, if_false)?
        )),
        other => translate(ctx, other),
    }
}

/// `collection.Contains(value)` → `value IN (...)`. An empty or
/// all-null haystack can never match anything, so it collapses to the
/// unsatisfiable literal `1 = 0` rather than emitting `IN ()`, which
/// SQL Server rejects (spec §4.3, §8 "IN emptiness").
fn translate_in(ctx: &mut TranslationContext, needle: &Expr, haystack: &[Expr]) -> Result<String> {
    let all_null = haystack
        .iter()
        .all(|e| matches!(e, Expr::Constant(SqlValue::Null)));
    if haystack.is_empty() || all_null {
        return Ok("1 = 0".to_string());
    }

    let needle_sql = scalar(ctx, needle)?;
    let mut items = Vec::with_capacity(haystack.len());
    for item in haystack {
        if matches!(item, Expr::Constant(SqlValue::Null)) {
            continue;
        }
        items.push(scalar(ctx, item)?);
    }
    Ok(format!("{needle_sql} IN ({})", items.join(", ")))
}

/// Wildcard placement happens at the SQL level (`<param> + '%'` etc., spec
/// §4.3), not by baking `%`/`_` into the bound value — the parameter only
/// ever carries the escaped substring itself.
fn translate_like(
    ctx: &mut TranslationContext,
    kind: LikeKind,
    column: &Expr,
    pattern: &Expr,
) -> Result<String> {
    let column_sql = scalar(ctx, column)?;

    let pattern_sql = match pattern {
        Expr::Constant(SqlValue::Text(s)) => {
            let escaped = crate::expr::string::escape_like_pattern(s.as_str());
            ctx.bind(SqlValue::Text(escaped.into()))
        }
        // A non-literal pattern (e.g. a captured variable) cannot be
        // escaped at translation time without inspecting its runtime
        // value; callers are expected to have already escaped it when
        // building the `Expr::Constant` (spec §4.3 note on captured
        // values having already been evaluated).
        _ => scalar(ctx, pattern)?,
    };

    Ok(format!(
        "{column_sql} LIKE {} ESCAPE '{}'",
        like_concat(kind, &pattern_sql),
        crate::expr::string::LIKE_ESCAPE_CHAR
    ))
}

fn like_concat(kind: LikeKind, param: &str) -> String {
    match kind {
        LikeKind::StartsWith => format!("{param} + '%'"),
        LikeKind::EndsWith => format!("'%' + {param}"),
        LikeKind::Contains => format!("'%' + {param} + '%'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entity, EntityDescriptor, FieldDescriptor};
    use crate::registry::resolve;
    use compact_str::CompactString;
    use core::any::Any;
    use std::sync::Arc;

    struct Widget {
        id: i64,
        name: CompactString,
    }

    fn get_id(o: &dyn Any) -> SqlValue {
        SqlValue::BigInt(o.downcast_ref::<Widget>().unwrap().id)
    }
    fn set_id(o: &mut dyn Any, v: SqlValue) -> Result<()> {
        if let SqlValue::BigInt(n) = v {
            o.downcast_mut::<Widget>().unwrap().id = n;
        }
        Ok(())
    }
    fn get_name(o: &dyn Any) -> SqlValue {
        SqlValue::Text(o.downcast_ref::<Widget>().unwrap().name.clone())
    }
    fn set_name(o: &mut dyn Any, v: SqlValue) -> Result<()> {
        if let SqlValue::Text(s) = v {
            o.downcast_mut::<Widget>().unwrap().name = s;
        }
        Ok(())
    }

    static WIDGET_FIELDS: &[FieldDescriptor] = &[
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
            rust_name: "name",
            column_override: None,
            is_primary_key: false,
            is_identity: false,
            is_not_mapped: false,
            nullable: false,
            remote: None,
            get: get_name,
            set: set_name,
        },
    ];

    static WIDGET_DESCRIPTOR: EntityDescriptor = EntityDescriptor {
        type_name: "Widget",
        table_override: None,
        fields: WIDGET_FIELDS,
    };

    impl Entity for Widget {
        fn descriptor() -> &'static EntityDescriptor {
            &WIDGET_DESCRIPTOR
        }
        fn blank() -> Self {
            Widget {
                id: 0,
                name: CompactString::default(),
            }
        }
    }

    fn ctx() -> TranslationContext {
        let mapping = resolve::<Widget>().unwrap();
        TranslationContext::new(Arc::clone(&mapping))
    }

    #[test]
    fn null_equality_lowers_to_is_null() {
        let mut c = ctx();
        let predicate = crate::expr::cmp::eq(Expr::col("name"), Expr::Constant(SqlValue::Null));
        let sql = translate(&mut c, &predicate).unwrap();
        assert_eq!(sql, "[t0].[name] IS NULL");
    }

    #[test]
    fn in_list_of_all_null_collapses_to_false() {
        let mut c = ctx();
        let predicate = Expr::In {
            needle: Box::new(Expr::col("id")),
            haystack: vec![Expr::Constant(SqlValue::Null)],
        };
        assert_eq!(translate(&mut c, &predicate).unwrap(), "1 = 0");
    }

    #[test]
    fn contains_emits_like_with_sql_level_wildcard_concat() {
        let mut c = ctx();
        let predicate = crate::expr::string::contains(
            Expr::col("name"),
            Expr::Constant(SqlValue::Text("50%off".into())),
        );
        let sql = translate(&mut c, &predicate).unwrap();
        assert_eq!(
            sql,
            "[t0].[name] LIKE '%' + @p__linq__0 + '%' ESCAPE '\\'"
        );
        assert_eq!(c.params[0].value, SqlValue::Text("50\\%off".into()));
    }

    #[test]
    fn starts_with_emits_like_param_plus_percent() {
        let mut c = ctx();
        let predicate = crate::expr::string::starts_with(
            Expr::col("name"),
            Expr::Constant(SqlValue::Text("D".into())),
        );
        let sql = translate(&mut c, &predicate).unwrap();
        assert_eq!(sql, "[t0].[name] LIKE @p__linq__0 + '%' ESCAPE '\\'");
        assert_eq!(c.params[0].value, SqlValue::Text("D".into()));
    }
}
