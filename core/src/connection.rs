//! Executor contract (spec §6.3): the external driver collaborator the
//! engine borrows for the duration of one command. relmap-core ships only
//! the trait surface plus an in-memory fake used by its own tests,
//! grounded on how the teacher's `core/tests/` fixtures exercise the
//! builder without a live database.

use crate::command::Command;
use crate::error::Result;
use crate::value::SqlValue;

/// A borrowed database connection capable of executing a `Command`.
/// Transaction lifetime is external: `begin`/`commit`/`rollback` forward
/// to whatever scope the caller manages (spec §5 "a transaction scope, if
/// present, is also external").
pub trait Executor {
    fn execute_reader(&mut self, cmd: &Command) -> Result<Box<dyn RowCursor>>;
    fn execute_scalar(&mut self, cmd: &Command) -> Result<SqlValue>;
    fn execute_non_query(&mut self, cmd: &Command) -> Result<u64>;
    fn begin(&mut self) -> Result<()>;
    fn commit(&mut self) -> Result<()>;
    fn rollback(&mut self) -> Result<()>;
    /// `true` once `begin` has succeeded and neither `commit` nor
    /// `rollback` has run yet; the facade consults this before Delete
    /// (spec §5 "Delete must be invoked within an active transaction").
    fn in_transaction(&self) -> bool;
}

/// A single row's worth of column values, advanced one at a time
/// (spec §4.9: "iteration is single-pass and non-restartable").
pub trait RowCursor {
    fn advance(&mut self) -> Result<bool>;
    fn column_count(&self) -> usize;
    fn column_name(&self, ord: usize) -> &str;
    fn value(&self, ord: usize) -> Result<SqlValue>;
}

/// An in-memory stand-in for a driver, used by relmap-core's own test
/// suite. Rows are supplied up front as `(column_name, SqlValue)` tuples;
/// `execute_reader` ignores the command's SQL text entirely and simply
/// replays whatever rows were queued, which is enough to exercise the
/// Materializer without touching SQL Server.
#[derive(Default)]
pub struct FakeExecutor {
    pub queued_rows: Vec<Vec<(String, SqlValue)>>,
    pub last_command: Option<Command>,
    transaction_open: bool,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Vec<(String, SqlValue)>>) -> Self {
        Self {
            queued_rows: rows,
            last_command: None,
            transaction_open: false,
        }
    }
}

pub struct FakeCursor {
    rows: Vec<Vec<(String, SqlValue)>>,
    position: isize,
}

impl Executor for FakeExecutor {
    fn execute_reader(&mut self, cmd: &Command) -> Result<Box<dyn RowCursor>> {
        self.last_command = Some(cmd.clone());
        Ok(Box::new(FakeCursor {
            rows: core::mem::take(&mut self.queued_rows),
            position: -1,
        }))
    }

    fn execute_scalar(&mut self, cmd: &Command) -> Result<SqlValue> {
        self.last_command = Some(cmd.clone());
        Ok(self
            .queued_rows
            .first()
            .and_then(|row| row.first())
            .map(|(_, v)| v.clone())
            .unwrap_or(SqlValue::Null))
    }

    fn execute_non_query(&mut self, cmd: &Command) -> Result<u64> {
        self.last_command = Some(cmd.clone());
        Ok(1)
    }

    fn begin(&mut self) -> Result<()> {
        self.transaction_open = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.transaction_open = false;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.transaction_open = false;
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.transaction_open
    }
}

impl RowCursor for FakeCursor {
    fn advance(&mut self) -> Result<bool> {
        self.position += 1;
        Ok((self.position as usize) < self.rows.len())
    }

    fn column_count(&self) -> usize {
        self.rows
            .get(self.position.max(0) as usize)
            .map(|r| r.len())
            .unwrap_or(0)
    }

    fn column_name(&self, ord: usize) -> &str {
        &self.rows[self.position as usize][ord].0
    }

    fn value(&self, ord: usize) -> Result<SqlValue> {
        Ok(self.rows[self.position as usize][ord].1.clone())
    }
}
