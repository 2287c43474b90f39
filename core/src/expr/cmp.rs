//! Binary comparison operators (spec §3.3).

use super::Expr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    /// The T-SQL operator text, used by the Predicate Translator.
    pub fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    /// The operator to use when reversed (`a < b` == `b > a`), used when
    /// normalizing `null == col` to `col == null`.
    pub fn flipped(self) -> CompareOp {
        match self {
            CompareOp::Eq => CompareOp::Eq,
            CompareOp::Ne => CompareOp::Ne,
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::Le => CompareOp::Ge,
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::Ge => CompareOp::Le,
        }
    }
}

fn compare(op: CompareOp, left: Expr, right: Expr) -> Expr {
    Expr::Compare {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

pub fn eq(left: Expr, right: Expr) -> Expr {
    compare(CompareOp::Eq, left, right)
}

pub fn ne(left: Expr, right: Expr) -> Expr {
    compare(CompareOp::Ne, left, right)
}

pub fn lt(left: Expr, right: Expr) -> Expr {
    compare(CompareOp::Lt, left, right)
}

pub fn le(left: Expr, right: Expr) -> Expr {
    compare(CompareOp::Le, left, right)
}

pub fn gt(left: Expr, right: Expr) -> Expr {
    compare(CompareOp::Gt, left, right)
}

pub fn ge(left: Expr, right: Expr) -> Expr {
    compare(CompareOp::Ge, left, right)
}
