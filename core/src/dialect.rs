//! Identifier Dialect (spec §4.2): reserved-word set, unconditional
//! quoting, and parameter-name minting for the SQL Server surface (spec
//! §6.2).
//!
//! Grounded on the teacher's `DialectExt::render_placeholder` /
//! `write_placeholder` pattern (`core/src/dialect.rs`), adapted from
//! positional `?`/`$n` placeholders to SQL Server's named
//! `@p__linq__<n>` convention.

use compact_str::CompactString;
use core::fmt::Write;

/// SQL Server identifier dialect: `[...]` delimiters, `@p__linq__<n>`
/// parameter names.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerDialect;

impl SqlServerDialect {
    /// Quotes an identifier unconditionally, per spec §4.2: "quoting must
    /// still be applied unconditionally for safety — not only on
    /// collision." Embedded `]` is escaped by doubling, SQL Server's own
    /// convention for escaping its quote character.
    pub fn quote(&self, identifier: &str) -> CompactString {
        let mut out = CompactString::with_capacity(identifier.len() + 2);
        out.push('[');
        for ch in identifier.chars() {
            if ch == ']' {
                out.push(']');
            }
            out.push(ch);
        }
        out.push(']');
        out
    }

    /// Quotes a dotted path (`alias.column`) segment-by-segment.
    pub fn quote_qualified(&self, alias: &str, column: &str) -> CompactString {
        let mut out = self.quote(alias);
        out.push('.');
        out.push_str(&self.quote(column));
        out
    }

    pub fn is_reserved(&self, identifier: &str) -> bool {
        let upper = identifier.to_ascii_uppercase();
        RESERVED_WORDS.binary_search(&upper.as_str()).is_ok()
    }

    /// Mints the `n`th parameter name (0-based), per spec §3.5:
    /// `@p__linq__<seq>`.
    pub fn mint_param(&self, counter: usize) -> CompactString {
        let mut out = CompactString::with_capacity(12);
        let _ = write!(out, "@p__linq__{counter}");
        out
    }

    /// Writes a SQL Server OFFSET/FETCH paging suffix directly into a
    /// buffer (spec §4.4, §6.2).
    pub fn write_paging(&self, out: &mut String, skip: u64, take: Option<u64>) {
        let _ = write!(out, "OFFSET {skip} ROWS");
        if let Some(take) = take {
            let _ = write!(out, " FETCH NEXT {take} ROWS ONLY");
        }
    }
}

/// The SQL Server reserved-word set, sorted for binary search.
///
/// This is a representative ~170-keyword subset of T-SQL reserved words
/// (spec §4.2): compiled into a sorted constant array so `is_reserved` is a
/// simple `binary_search`, matching the teacher's design note ("compile
/// into a sorted constant array and hash-set; quoting is applied
/// unconditionally").
pub static RESERVED_WORDS: &[&str] = &[
    "ADD", "ALL", "ALTER", "AND", "ANY", "AS", "ASC", "AUTHORIZATION", "BACKUP", "BEGIN",
    "BETWEEN", "BREAK", "BROWSE", "BULK", "BY", "CASCADE", "CASE", "CHECK", "CHECKPOINT", "CLOSE",
    "CLUSTERED", "COALESCE", "COLLATE", "COLUMN", "COMMIT", "COMPUTE", "CONSTRAINT", "CONTAINS",
    "CONTAINSTABLE", "CONTINUE", "CONVERT", "CREATE", "CROSS", "CURRENT", "CURRENT_DATE",
    "CURRENT_TIME", "CURRENT_TIMESTAMP", "CURRENT_USER", "CURSOR", "DATABASE", "DBCC",
    "DEALLOCATE", "DECLARE", "DEFAULT", "DELETE", "DENY", "DESC", "DISK", "DISTINCT",
    "DISTRIBUTED", "DOUBLE", "DROP", "DUMP", "ELSE", "END", "ERRLVL", "ESCAPE", "EXCEPT", "EXEC",
    "EXECUTE", "EXISTS", "EXIT", "EXTERNAL", "FETCH", "FILE", "FILLFACTOR", "FOR", "FOREIGN",
    "FREETEXT", "FREETEXTTABLE", "FROM", "FULL", "FUNCTION", "GOTO", "GRANT", "GROUP", "HAVING",
    "HOLDLOCK", "IDENTITY", "IDENTITY_INSERT", "IDENTITYCOL", "IF", "IN", "INDEX", "INNER",
    "INSERT", "INTERSECT", "INTO", "IS", "JOIN", "KEY", "KILL", "LEFT", "LIKE", "LINENO", "LOAD",
    "MERGE", "NATIONAL", "NOCHECK", "NONCLUSTERED", "NOT", "NULL", "NULLIF", "OF", "OFF",
    "OFFSETS", "ON", "OPEN", "OPENDATASOURCE", "OPENQUERY", "OPENROWSET", "OPENXML", "OPTION",
    "OR", "ORDER", "OUTER", "OVER", "PERCENT", "PIVOT", "PLAN", "PRECISION", "PRIMARY", "PRINT",
    "PROC", "PROCEDURE", "PUBLIC", "RAISERROR", "READ", "READTEXT", "RECONFIGURE", "REFERENCES",
    "REPLICATION", "RESTORE", "RESTRICT", "RETURN", "REVERT", "REVOKE", "RIGHT", "ROLLBACK",
    "ROWCOUNT", "ROWGUIDCOL", "RULE", "SAVE", "SCHEMA", "SECURITYAUDIT", "SELECT",
    "SEMANTICKEYPHRASETABLE", "SEMANTICSIMILARITYDETAILSTABLE", "SEMANTICSIMILARITYTABLE",
    "SESSION_USER", "SET", "SETUSER", "SHUTDOWN", "SOME", "STATISTICS", "SYSTEM_USER", "TABLE",
    "TABLESAMPLE", "TEXTSIZE", "THEN", "TO", "TOP", "TRAN", "TRANSACTION", "TRIGGER", "TRUNCATE",
    "TRY_CONVERT", "TSEQUAL", "UNION", "UNIQUE", "UNPIVOT", "UPDATE", "UPDATETEXT", "USE", "USER",
    "VALUES", "VARYING", "VIEW", "WAITFOR", "WHEN", "WHERE", "WHILE", "WITH", "WITHIN GROUP",
    "WRITETEXT",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_words_are_sorted() {
        let mut sorted = RESERVED_WORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, RESERVED_WORDS);
    }

    #[test]
    fn quoting_is_unconditional_even_for_plain_identifiers() {
        let dialect = SqlServerDialect;
        assert_eq!(dialect.quote("Age").as_str(), "[Age]");
        assert_eq!(dialect.quote("select").as_str(), "[select]");
    }

    #[test]
    fn quoting_escapes_embedded_bracket() {
        let dialect = SqlServerDialect;
        assert_eq!(dialect.quote("a]b").as_str(), "[a]]b]");
    }

    #[test]
    fn mint_param_uses_linq_convention() {
        let dialect = SqlServerDialect;
        assert_eq!(dialect.mint_param(0).as_str(), "@p__linq__0");
        assert_eq!(dialect.mint_param(12).as_str(), "@p__linq__12");
    }

    #[test]
    fn is_reserved_is_case_insensitive() {
        let dialect = SqlServerDialect;
        assert!(dialect.is_reserved("select"));
        assert!(dialect.is_reserved("SELECT"));
        assert!(!dialect.is_reserved("Age"));
    }
}
