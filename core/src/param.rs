//! Parameters (spec §3.5): symbolic names and the per-translation counter
//! that mints them.

use crate::dialect::SqlServerDialect;
use crate::value::SqlValue;
use compact_str::CompactString;

/// A single bound parameter: a stable symbolic name and its value.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: CompactString,
    pub value: SqlValue,
}

/// Mints `@p__linq__<seq>` names, monotonically increasing, owned by a
/// single translator instance (spec §3.5, §9: "each translator instance
/// owns its own counter").
#[derive(Debug, Default)]
pub struct ParamCounter {
    next: usize,
    dialect: SqlServerDialect,
}

impl ParamCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints the next parameter name and pairs it with `value`, advancing
    /// the counter. The same captured value always produces a *new*
    /// parameter (spec §4.3 invariant: "no accidental reuse").
    pub fn bind(&mut self, value: SqlValue) -> Parameter {
        let name = self.dialect.mint_param(self.next);
        self.next += 1;
        Parameter { name, value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_is_monotonic_and_never_reuses_names() {
        let mut counter = ParamCounter::new();
        let a = counter.bind(SqlValue::Int(1));
        let b = counter.bind(SqlValue::Int(1));
        assert_ne!(a.name, b.name);
        assert_eq!(a.name.as_str(), "@p__linq__0");
        assert_eq!(b.name.as_str(), "@p__linq__1");
    }
}
