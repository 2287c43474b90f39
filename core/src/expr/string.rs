//! String pattern matching (spec §3.3, §4.3): `StartsWith`/`EndsWith`/
//! `Contains` lower to `LIKE` with escaped wildcard placement.

use super::Expr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeKind {
    StartsWith,
    EndsWith,
    Contains,
}

pub fn starts_with(column: Expr, value: Expr) -> Expr {
    Expr::Like {
        kind: LikeKind::StartsWith,
        column: Box::new(column),
        pattern: Box::new(value),
    }
}

pub fn ends_with(column: Expr, value: Expr) -> Expr {
    Expr::Like {
        kind: LikeKind::EndsWith,
        column: Box::new(column),
        pattern: Box::new(value),
    }
}

pub fn contains(column: Expr, value: Expr) -> Expr {
    Expr::Like {
        kind: LikeKind::Contains,
        column: Box::new(column),
        pattern: Box::new(value),
    }
}

/// The LIKE escape character mandated by spec §9 (Open Questions):
/// "spec mandates escaping the two standard wildcards and the escape
/// character itself." Fixed, not user-configurable.
pub const LIKE_ESCAPE_CHAR: char = '\\';

/// Escapes `%`, `_`, and the escape character itself in a user-supplied
/// LIKE substring, per the standard LIKE escape convention (spec §4.3,
/// §6.2).
pub fn escape_like_pattern(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch == '%' || ch == '_' || ch == LIKE_ESCAPE_CHAR {
            out.push(LIKE_ESCAPE_CHAR);
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_wildcards_and_escape_char() {
        assert_eq!(escape_like_pattern("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like_pattern("a\\b"), "a\\\\b");
        assert_eq!(escape_like_pattern("plain"), "plain");
    }
}
