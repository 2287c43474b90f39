//! The parameter/column value domain.
//!
//! `SqlValue` is the one concrete value type that flows through the engine:
//! constants captured from predicate/projection IR become `SqlValue`
//! parameters (spec §3.3, §3.5), and rows read back from the driver are
//! decoded into `SqlValue` before the materializer coerces them into entity
//! fields (spec §4.9).

use compact_str::CompactString;

/// A single column/parameter value.
///
/// Mirrors the teacher's dialect-specific value enums (e.g. `SQLiteValue`)
/// but is a single concrete type since relmap targets one dialect (SQL
/// Server) rather than being generic over `V: SQLParam`.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    Text(CompactString),
    Bytes(Vec<u8>),
    #[cfg(feature = "chrono")]
    Date(chrono::NaiveDate),
    #[cfg(feature = "chrono")]
    Time(chrono::NaiveTime),
    #[cfg(feature = "chrono")]
    DateTime(chrono::NaiveDateTime),
    #[cfg(feature = "uuid")]
    Uuid(uuid::Uuid),
    #[cfg(feature = "rust-decimal")]
    Decimal(rust_decimal::Decimal),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Best-effort type name, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Bool(_) => "bool",
            SqlValue::SmallInt(_) => "smallint",
            SqlValue::Int(_) => "int",
            SqlValue::BigInt(_) => "bigint",
            SqlValue::Float(_) => "float",
            SqlValue::Double(_) => "double",
            SqlValue::Text(_) => "text",
            SqlValue::Bytes(_) => "bytes",
            #[cfg(feature = "chrono")]
            SqlValue::Date(_) => "date",
            #[cfg(feature = "chrono")]
            SqlValue::Time(_) => "time",
            #[cfg(feature = "chrono")]
            SqlValue::DateTime(_) => "datetime",
            #[cfg(feature = "uuid")]
            SqlValue::Uuid(_) => "uuid",
            #[cfg(feature = "rust-decimal")]
            SqlValue::Decimal(_) => "decimal",
        }
    }
}

macro_rules! impl_from {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for SqlValue {
            fn from(value: $ty) -> Self {
                SqlValue::$variant(value.into())
            }
        }
    };
}

impl_from!(Bool, bool);
impl_from!(SmallInt, i16);
impl_from!(Int, i32);
impl_from!(BigInt, i64);
impl_from!(Float, f32);
impl_from!(Double, f64);

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(CompactString::from(value))
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(CompactString::from(value))
    }
}

impl From<CompactString> for SqlValue {
    fn from(value: CompactString) -> Self {
        SqlValue::Text(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Bytes(value)
    }
}

impl<T> From<Option<T>> for SqlValue
where
    T: Into<SqlValue>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => SqlValue::Null,
        }
    }
}
