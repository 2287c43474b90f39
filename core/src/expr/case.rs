//! Conditional projection (spec §3.3, §4.5): `if-then-else` →
//! `CASE WHEN <test> THEN <iftrue> ELSE <iffalse> END`.

use super::Expr;

pub fn case_when(test: Expr, if_true: Expr, if_false: Expr) -> Expr {
    Expr::Conditional {
        test: Box::new(test),
        if_true: Box::new(if_true),
        if_false: Box::new(if_false),
    }
}
