//! Order / Paging Translator (spec §4.4): `ORDER BY` emission, the
//! deterministic primary-key fallback, and `OFFSET`/`FETCH NEXT` paging.

use crate::context::TranslationContext;
use crate::error::{RelmapError, Result};
use crate::expr::Expr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    fn reversed(self) -> Direction {
        match self {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        }
    }

    fn sql_suffix(self) -> &'static str {
        match self {
            Direction::Ascending => "",
            Direction::Descending => " DESC",
        }
    }
}

/// One `OrderBy`/`ThenBy` key (spec §3.4): order of insertion is
/// significant and preserved verbatim in the emitted `ORDER BY`.
#[derive(Debug, Clone)]
pub struct OrderKey {
    pub key: Expr,
    pub direction: Direction,
}

impl OrderKey {
    pub fn asc(key: Expr) -> Self {
        Self {
            key,
            direction: Direction::Ascending,
        }
    }

    pub fn desc(key: Expr) -> Self {
        Self {
            key,
            direction: Direction::Descending,
        }
    }
}

/// Renders `ORDER BY` plus an optional `OFFSET`/`FETCH NEXT` suffix.
///
/// `keys` is taken by value so the `Last`/`LastOrDefault` reversal (spec
/// §4.4: "the translator reverses the ordering ... and maps the call to
/// First/FirstOrDefault semantics") can mutate a local copy without
/// disturbing the caller's accumulated `Query` state.
pub fn translate(
    ctx: &mut TranslationContext,
    mut keys: Vec<OrderKey>,
    skip: Option<u64>,
    take: Option<u64>,
    reverse_for_last: bool,
) -> Result<String> {
    if keys.is_empty() && (skip.is_some() || take.is_some() || reverse_for_last) {
        keys.push(primary_key_fallback(ctx, Direction::Ascending)?);
    }

    if reverse_for_last {
        if keys.is_empty() {
            keys.push(primary_key_fallback(ctx, Direction::Descending)?);
        } else {
            for key in &mut keys {
                key.direction = key.direction.reversed();
            }
        }
    }

    if keys.is_empty() {
        return Ok(String::new());
    }

    let mut out = String::from("ORDER BY ");
    for (i, key) in keys.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&super::predicate::scalar(ctx, &key.key)?);
        out.push_str(key.direction.sql_suffix());
    }

    if skip.is_some() || take.is_some() {
        out.push(' ');
        ctx.dialect.write_paging(&mut out, skip.unwrap_or(0), take);
    }

    Ok(out)
}

fn primary_key_fallback(ctx: &TranslationContext, direction: Direction) -> Result<OrderKey> {
    let field = ctx.mapping.primary_key_field().ok_or_else(|| {
        RelmapError::translation(format!(
            "type `{}`: paging requires an explicit order or a primary key to fall back on",
            ctx.mapping.descriptor.type_name
        ))
    })?;
    Ok(OrderKey {
        key: Expr::Column(field.rust_name),
        direction,
    })
}
