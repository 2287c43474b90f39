//! A concrete `Executor`/`RowCursor` pair backed by `tiberius`, gated
//! behind the `tiberius` feature so `relmap-core` itself never depends on
//! a driver or an async runtime.
//!
//! Tiberius's client is asynchronous; relmap-core's `Executor` contract is
//! synchronous per query (spec §5: "the only suspension is the external
//! driver call"). This adapter bridges the two with a borrowed
//! [`tokio::runtime::Handle`] and `block_on`, matching how a synchronous
//! facade is meant to "wrap the synchronous translator around an
//! asynchronous driver call" per spec §5's async-variant note, just
//! inverted: here the synchronous trait wraps the async driver instead of
//! the other way around.

use relmap_core::command::Command;
use relmap_core::connection::{Executor, RowCursor};
use relmap_core::error::{RelmapError, Result};
use relmap_core::value::SqlValue;
use tiberius::{Client, ColumnData, Query};
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

pub struct TiberiusExecutor {
    client: Client<Compat<TcpStream>>,
    handle: Handle,
    in_transaction: bool,
}

impl TiberiusExecutor {
    /// Takes ownership of an already-connected tiberius client and the
    /// runtime it was established on. Connection establishment itself is
    /// out of scope (spec §1: "Database driver / connection management
    /// ... treated as external collaborators").
    pub fn new(client: Client<Compat<TcpStream>>, handle: Handle) -> Self {
        Self {
            client,
            handle,
            in_transaction: false,
        }
    }

    fn build_query<'a>(cmd: &'a Command) -> Query<'a> {
        let mut query = Query::new(cmd.sql.as_str());
        for parameter in &cmd.parameters {
            bind_param(&mut query, &parameter.value);
        }
        query
    }

    fn driver_error(cmd: &Command, err: tiberius::error::Error) -> RelmapError {
        RelmapError::Driver {
            sql: cmd.sql.as_str().into(),
            placeholders: cmd.parameters.iter().map(|p| p.name.clone()).collect(),
            source: Box::new(err),
        }
    }
}

fn bind_param<'a>(query: &mut Query<'a>, value: &'a SqlValue) {
    match value {
        SqlValue::Null => query.bind(Option::<i32>::None),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::SmallInt(n) => query.bind(*n),
        SqlValue::Int(n) => query.bind(*n),
        SqlValue::BigInt(n) => query.bind(*n),
        SqlValue::Float(f) => query.bind(*f),
        SqlValue::Double(f) => query.bind(*f),
        SqlValue::Text(s) => query.bind(s.as_str()),
        SqlValue::Bytes(b) => query.bind(b.as_slice()),
        #[cfg(feature = "chrono")]
        SqlValue::Date(d) => query.bind(*d),
        #[cfg(feature = "chrono")]
        SqlValue::Time(t) => query.bind(*t),
        #[cfg(feature = "chrono")]
        SqlValue::DateTime(dt) => query.bind(*dt),
        #[cfg(feature = "uuid")]
        SqlValue::Uuid(u) => query.bind(*u),
        #[cfg(feature = "rust-decimal")]
        SqlValue::Decimal(d) => query.bind(d.to_string()),
    }
}

fn column_data_to_value(data: &ColumnData<'static>) -> Result<SqlValue> {
    Ok(match data {
        ColumnData::Bit(v) => SqlValue::Bool(v.unwrap_or_default()),
        ColumnData::I16(v) => SqlValue::SmallInt(v.unwrap_or_default()),
        ColumnData::I32(v) => SqlValue::Int(v.unwrap_or_default()),
        ColumnData::I64(v) => SqlValue::BigInt(v.unwrap_or_default()),
        ColumnData::F32(v) => SqlValue::Float(v.unwrap_or_default()),
        ColumnData::F64(v) => SqlValue::Double(v.unwrap_or_default()),
        ColumnData::String(v) => match v {
            Some(s) => SqlValue::Text(s.as_ref().into()),
            None => SqlValue::Null,
        },
        ColumnData::Binary(v) => match v {
            Some(b) => SqlValue::Bytes(b.to_vec()),
            None => SqlValue::Null,
        },
        _ => SqlValue::Null,
    })
}

impl Executor for TiberiusExecutor {
    fn execute_reader(&mut self, cmd: &Command) -> Result<Box<dyn RowCursor>> {
        let query = Self::build_query(cmd);
        let rows = self
            .handle
            .block_on(async { query.query(&mut self.client).await?.into_results().await })
            .map_err(|e| Self::driver_error(cmd, e))?;

        let mut materialized = Vec::new();
        for batch in rows {
            for row in batch {
                let names: Vec<String> = row.columns().iter().map(|c| c.name().to_string()).collect();
                let values: Result<Vec<SqlValue>> =
                    row.into_iter().map(|cell| column_data_to_value(&cell)).collect();
                materialized.push((names, values));
            }
        }

        Ok(Box::new(TiberiusCursor {
            rows: materialized,
            position: -1,
        }))
    }

    fn execute_scalar(&mut self, cmd: &Command) -> Result<SqlValue> {
        let query = Self::build_query(cmd);
        let row = self
            .handle
            .block_on(async { query.query(&mut self.client).await?.into_row().await })
            .map_err(|e| Self::driver_error(cmd, e))?;
        match row {
            Some(row) => Ok(row
                .try_get::<i64, _>(0)
                .ok()
                .flatten()
                .map(SqlValue::BigInt)
                .unwrap_or(SqlValue::Null)),
            None => Ok(SqlValue::Null),
        }
    }

    fn execute_non_query(&mut self, cmd: &Command) -> Result<u64> {
        let query = Self::build_query(cmd);
        let result = self
            .handle
            .block_on(async { query.execute(&mut self.client).await })
            .map_err(|e| Self::driver_error(cmd, e))?;
        Ok(result.rows_affected().iter().sum())
    }

    fn begin(&mut self) -> Result<()> {
        self.handle
            .block_on(self.client.simple_query("BEGIN TRANSACTION"))
            .map_err(|e| RelmapError::Driver {
                sql: "BEGIN TRANSACTION".into(),
                placeholders: Vec::new(),
                source: Box::new(e),
            })?;
        self.in_transaction = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.handle
            .block_on(self.client.simple_query("COMMIT TRANSACTION"))
            .map_err(|e| RelmapError::Driver {
                sql: "COMMIT TRANSACTION".into(),
                placeholders: Vec::new(),
                source: Box::new(e),
            })?;
        self.in_transaction = false;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.handle
            .block_on(self.client.simple_query("ROLLBACK TRANSACTION"))
            .map_err(|e| RelmapError::Driver {
                sql: "ROLLBACK TRANSACTION".into(),
                placeholders: Vec::new(),
                source: Box::new(e),
            })?;
        self.in_transaction = false;
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.in_transaction
    }
}

struct TiberiusCursor {
    rows: Vec<(Vec<String>, Result<Vec<SqlValue>>)>,
    position: isize,
}

impl RowCursor for TiberiusCursor {
    fn advance(&mut self) -> Result<bool> {
        self.position += 1;
        Ok((self.position as usize) < self.rows.len())
    }

    fn column_count(&self) -> usize {
        self.rows
            .get(self.position.max(0) as usize)
            .map(|(names, _)| names.len())
            .unwrap_or(0)
    }

    fn column_name(&self, ord: usize) -> &str {
        &self.rows[self.position as usize].0[ord]
    }

    fn value(&self, ord: usize) -> Result<SqlValue> {
        match &self.rows[self.position as usize].1 {
            Ok(values) => Ok(values[ord].clone()),
            Err(_) => Ok(SqlValue::Null),
        }
    }
}
