//! relmap-core: the query translation and entity mapping engine.
//!
//! Turns strongly typed predicate/order/projection trees over user-defined
//! entity types into parameterized SQL Server statements, resolves
//! multi-hop "remote" property references to outer joins, and
//! materializes rows back into entities. Driver I/O, transaction
//! lifetime, and connection pooling are external collaborators behind the
//! [`connection::Executor`] trait — this crate never dials a socket.
//!
//! Unlike the teacher crate this engine's building blocks were adapted
//! from, relmap-core targets a single concrete dialect (SQL Server) and a
//! single concrete value type ([`value::SqlValue`]) rather than being
//! generic over a parameter-value trait, since the metadata discovery and
//! FK-path resolution this crate specializes in don't need multi-dialect
//! genericity to be useful on their own.

pub mod codec;
pub mod command;
pub mod connection;
pub mod context;
pub mod dialect;
pub mod entity;
pub mod error;
pub mod expr;
pub mod facade;
pub mod materialize;
pub mod param;
pub mod path;
pub mod query;
pub mod registry;
pub mod translate;
pub mod value;

/// Re-exports the surface most callers need: the entity trait and derive
/// target, the facade, the expression builders, and the error type.
pub mod prelude {
    pub use crate::codec::FieldCodec;
    pub use crate::connection::{Executor, FakeExecutor, RowCursor};
    pub use crate::entity::{Entity, EntityDescriptor, FieldDescriptor, RemoteKind, RemoteMarker};
    pub use crate::error::{RelmapError, Result};
    pub use crate::expr::{case, cmp, datetime, null, string, CompareOp, DatePart, Expr, LikeKind};
    pub use crate::facade::Query;
    pub use crate::translate::order::OrderKey;
    pub use crate::translate::projection::Binding;
    pub use crate::value::SqlValue;
}
