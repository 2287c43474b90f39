//! Expression Tree Model (spec §3.3): a language-neutral IR for
//! predicates, orderings, and projections.
//!
//! Represented as a sealed tagged variant (spec §9 design note: "Dynamic
//! dispatch over expression nodes ... implement translators as structural
//! matches over the variant. No inheritance needed beyond a shared visitor
//! helper"). Translators in `crate::translate` walk this tree; they never
//! evaluate user code — by the time an `Expr::Constant` node exists, the
//! captured value has already been evaluated once at IR-construction time
//! (spec §9 "Captured closures").

pub mod case;
pub mod cmp;
pub mod datetime;
pub mod null;
pub mod string;

pub use cmp::CompareOp;
pub use datetime::DatePart;
pub use string::LikeKind;

use crate::value::SqlValue;

/// The expression IR. Every predicate, order key, and projection binding
/// the Query Facade accepts is built from these nodes.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Member access on the query's source entity, by Rust field name.
    /// Resolved against the source type's `TypeMapping` at translation
    /// time; may resolve to a local column or (via the remote-attribute
    /// index) an aliased join column.
    Column(&'static str),

    /// A value lifted to a parameter at IR-construction time. Constant
    /// literals and captured closure values both become this node (spec
    /// §3.3 invariant: "A constant captured by a predicate must become a
    /// parameter, never inlined SQL").
    Constant(SqlValue),

    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),

    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// `collection.Contains(value)`: `value IN (...)` over a captured,
    /// already-evaluated list of constants (spec §3.3, §3.4).
    In {
        needle: Box<Expr>,
        haystack: Vec<Expr>,
    },

    Like {
        kind: LikeKind,
        column: Box<Expr>,
        pattern: Box<Expr>,
    },

    /// Nullable-value "has value" predicate → `IS NOT NULL`.
    HasValue(Box<Expr>),

    DatePart {
        part: DatePart,
        column: Box<Expr>,
    },

    /// `if-then-else` → `CASE WHEN ... THEN ... ELSE ... END`.
    Conditional {
        test: Box<Expr>,
        if_true: Box<Expr>,
        if_false: Box<Expr>,
    },
}

impl Expr {
    pub fn col(name: &'static str) -> Self {
        Expr::Column(name)
    }

    pub fn val(value: impl Into<SqlValue>) -> Self {
        Expr::Constant(value.into())
    }

    pub fn and(self, other: Expr) -> Expr {
        Expr::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Expr) -> Expr {
        Expr::Or(Box::new(self), Box::new(other))
    }

    pub fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }

    /// Folds a non-empty sequence of predicates with AND, left to right,
    /// preserving chaining order (spec §8 "Chained Where = AND").
    pub fn fold_and(mut exprs: impl Iterator<Item = Expr>) -> Option<Expr> {
        let first = exprs.next()?;
        Some(exprs.fold(first, |acc, next| acc.and(next)))
    }

    /// `true` if this node is a bare `Constant(Bool(true))`, used by the
    /// Command Builder's DELETE guard (spec §4.8, §8 "Delete guard").
    pub fn is_trivially_true(&self) -> bool {
        match self {
            Expr::Constant(SqlValue::Bool(true)) => true,
            Expr::Compare {
                op: CompareOp::Eq,
                left,
                right,
            } => matches!((left.as_ref(), right.as_ref()), (Expr::Column(a), Expr::Column(b)) if a == b),
            _ => false,
        }
    }

    /// Every `Expr::Column` name referenced anywhere in this tree, used by
    /// the delete guard's "references at least one mapped column" check
    /// (spec §8).
    pub fn referenced_columns(&self, out: &mut Vec<&'static str>) {
        match self {
            Expr::Column(name) => out.push(name),
            Expr::Constant(_) => {}
            Expr::And(l, r) | Expr::Or(l, r) => {
                l.referenced_columns(out);
                r.referenced_columns(out);
            }
            Expr::Not(e) | Expr::HasValue(e) => e.referenced_columns(out),
            Expr::Compare { left, right, .. } => {
                left.referenced_columns(out);
                right.referenced_columns(out);
            }
            Expr::In { needle, haystack } => {
                needle.referenced_columns(out);
                for h in haystack {
                    h.referenced_columns(out);
                }
            }
            Expr::Like {
                column, pattern, ..
            } => {
                column.referenced_columns(out);
                pattern.referenced_columns(out);
            }
            Expr::DatePart { column, .. } => column.referenced_columns(out),
            Expr::Conditional {
                test,
                if_true,
                if_false,
            } => {
                test.referenced_columns(out);
                if_true.referenced_columns(out);
                if_false.referenced_columns(out);
            }
        }
    }
}
