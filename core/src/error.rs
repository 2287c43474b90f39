//! Error taxonomy surfaced to callers (spec §6.4, §7).

use compact_str::CompactString;
use thiserror::Error;

/// Core error type for relmap operations.
///
/// Translation errors are deterministic and local: each node that cannot be
/// lowered names itself in the message. The engine never attempts partial
/// execution once a translation has failed.
#[derive(Debug, Error)]
pub enum RelmapError {
    /// No primary key could be resolved for a type, or the column map has a
    /// duplicate/ambiguous entry.
    #[error("metadata error: {0}")]
    Metadata(CompactString),

    /// An expression node could not be lowered to SQL, or a projection wrote
    /// into a mapped column, or a DELETE predicate was rejected.
    #[error("translation error: {0}")]
    Translation(CompactString),

    /// A remote property's inferred path has no FK chain connecting the
    /// declaring type to the remote type.
    #[error("no foreign-key path from `{from}` to `{to}`")]
    PathNotFound {
        from: CompactString,
        to: CompactString,
    },

    /// A remote property's inferred path has two or more equally-short
    /// candidate chains.
    #[error(
        "ambiguous foreign-key path from `{from}` to `{to}`: {count} equally-short chains found, use an explicit path"
    )]
    AmbiguousMatch {
        from: CompactString,
        to: CompactString,
        count: usize,
    },

    /// `First`/`Min`/`Max` found no matching row where one was required.
    #[error("sequence contains no elements")]
    EmptySequence,

    /// The underlying driver/connection failed. Carries the SQL text and
    /// parameter placeholder names (never values) for diagnostics.
    #[error("driver error executing `{sql}` ({placeholders:?}): {source}")]
    Driver {
        sql: CompactString,
        placeholders: Vec<CompactString>,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A delete was attempted without an active transaction.
    #[error("DELETE requires an active transaction")]
    NoActiveTransaction,

    /// Integer conversion error surfaced while coercing a column value.
    #[error("integer conversion error: {0}")]
    TryFromInt(#[from] core::num::TryFromIntError),

    /// Parse error surfaced while coercing a textual column value.
    #[error("parse error: {0}")]
    Parse(CompactString),
}

/// Result type for relmap operations.
pub type Result<T> = core::result::Result<T, RelmapError>;

impl RelmapError {
    pub fn metadata(msg: impl Into<CompactString>) -> Self {
        Self::Metadata(msg.into())
    }

    pub fn translation(msg: impl Into<CompactString>) -> Self {
        Self::Translation(msg.into())
    }
}
