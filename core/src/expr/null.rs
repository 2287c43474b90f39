//! NULL semantics (spec §3.3, §4.3): equality against `null` must lower to
//! `IS [NOT] NULL`, never `= NULL`.

use super::{CompareOp, Expr};
use crate::value::SqlValue;

/// `true` if this node is the literal `null` constant.
pub fn is_null_literal(expr: &Expr) -> bool {
    matches!(expr, Expr::Constant(SqlValue::Null))
}

/// If `expr` is an equality/inequality comparison against a literal
/// `null` on either side, returns `(column_expr, is_equality)` so the
/// Predicate Translator can emit `IS NULL` / `IS NOT NULL` instead of
/// `= NULL` (spec §4.3, §8 "Null comparison law").
pub fn as_null_comparison(expr: &Expr) -> Option<(&Expr, bool)> {
    let Expr::Compare { op, left, right } = expr else {
        return None;
    };
    if !matches!(op, CompareOp::Eq | CompareOp::Ne) {
        return None;
    }
    let is_eq = matches!(op, CompareOp::Eq);
    if is_null_literal(right) {
        Some((left, is_eq))
    } else if is_null_literal(left) {
        Some((right, is_eq))
    } else {
        None
    }
}

/// `Nullable<T>.HasValue` → `IS NOT NULL` (spec §4.3).
pub fn has_value(column: Expr) -> Expr {
    Expr::HasValue(Box::new(column))
}
