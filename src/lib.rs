//! relmap: a lightweight ORM translating typed predicate trees into
//! parameterized SQL Server statements.
//!
//! The engine itself lives in `relmap-core` and never depends on a
//! concrete driver. This crate re-exports its surface and, behind the
//! `tiberius` feature, wires up a concrete [`connection::Executor`]
//! backed by the `tiberius` SQL Server driver.

pub use relmap_core::*;
pub use relmap_macros::Entity;

#[cfg(feature = "tiberius")]
pub mod tiberius_executor;
