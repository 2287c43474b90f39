//! Field codec (spec §4.9 "accessor plan" / coercions): the trait
//! `#[derive(Entity)]`-generated accessors use to convert between a
//! field's native Rust type and [`crate::value::SqlValue`].
//!
//! Centralizing the null→default, nullable-wrapping, and numeric-widening
//! rules here (rather than inlining them at each derive-macro call site)
//! keeps them testable on their own and lets a user opt a custom type
//! (e.g. an integer-backed enum, spec §4.9 "enum widening") into field
//! mapping by implementing `FieldCodec` themselves.

use crate::error::{RelmapError, Result};
use crate::value::SqlValue;
use compact_str::CompactString;

/// Converts a mapped field's native type to and from [`SqlValue`].
pub trait FieldCodec: Sized {
    fn to_sql_value(&self) -> SqlValue;
    fn from_sql_value(value: SqlValue) -> Result<Self>;
}

macro_rules! impl_codec_int {
    ($ty:ty, $variant:ident) => {
        impl FieldCodec for $ty {
            fn to_sql_value(&self) -> SqlValue {
                SqlValue::$variant(*self)
            }
            fn from_sql_value(value: SqlValue) -> Result<Self> {
                match value {
                    SqlValue::Null => Ok(<$ty>::default()),
                    SqlValue::$variant(v) => Ok(v),
                    SqlValue::SmallInt(v) => Ok(v as $ty),
                    SqlValue::Int(v) => Ok(v as $ty),
                    SqlValue::BigInt(v) => Ok(v as $ty),
                    other => Err(RelmapError::translation(format!(
                        "cannot coerce `{}` into `{}`",
                        other.type_name(),
                        stringify!($ty)
                    ))),
                }
            }
        }
    };
}

impl_codec_int!(i16, SmallInt);
impl_codec_int!(i32, Int);
impl_codec_int!(i64, BigInt);

impl FieldCodec for bool {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Bool(*self)
    }
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Null => Ok(false),
            SqlValue::Bool(v) => Ok(v),
            SqlValue::Int(v) => Ok(v != 0),
            SqlValue::SmallInt(v) => Ok(v != 0),
            SqlValue::BigInt(v) => Ok(v != 0),
            other => Err(RelmapError::translation(format!(
                "cannot coerce `{}` into `bool`",
                other.type_name()
            ))),
        }
    }
}

impl FieldCodec for f32 {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Float(*self)
    }
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Null => Ok(0.0),
            SqlValue::Float(v) => Ok(v),
            SqlValue::Double(v) => Ok(v as f32),
            other => Err(RelmapError::translation(format!(
                "cannot coerce `{}` into `f32`",
                other.type_name()
            ))),
        }
    }
}

impl FieldCodec for f64 {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Double(*self)
    }
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Null => Ok(0.0),
            SqlValue::Double(v) => Ok(v),
            SqlValue::Float(v) => Ok(v as f64),
            other => Err(RelmapError::translation(format!(
                "cannot coerce `{}` into `f64`",
                other.type_name()
            ))),
        }
    }
}

impl FieldCodec for CompactString {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Text(self.clone())
    }
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Null => Ok(CompactString::default()),
            SqlValue::Text(s) => Ok(s),
            other => Err(RelmapError::translation(format!(
                "cannot coerce `{}` into text",
                other.type_name()
            ))),
        }
    }
}

impl FieldCodec for String {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Text(CompactString::from(self.as_str()))
    }
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        CompactString::from_sql_value(value).map(|s| s.to_string())
    }
}

impl FieldCodec for Vec<u8> {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Bytes(self.clone())
    }
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Null => Ok(Vec::new()),
            SqlValue::Bytes(b) => Ok(b),
            other => Err(RelmapError::translation(format!(
                "cannot coerce `{}` into bytes",
                other.type_name()
            ))),
        }
    }
}

/// Nullable-wrapping (spec §4.9: "nullable wrapping for nullable
/// primitives"): `Option<T>` round-trips `SqlValue::Null` to `None`
/// instead of `T`'s non-nullable default.
impl<T: FieldCodec> FieldCodec for Option<T> {
    fn to_sql_value(&self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            Ok(Some(T::from_sql_value(value)?))
        }
    }
}

#[cfg(feature = "uuid")]
impl FieldCodec for uuid::Uuid {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Uuid(*self)
    }
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Uuid(u) => Ok(u),
            SqlValue::Text(s) => s
                .parse()
                .map_err(|_| RelmapError::Parse(format!("invalid uuid: `{s}`").into())),
            other => Err(RelmapError::translation(format!(
                "cannot coerce `{}` into uuid",
                other.type_name()
            ))),
        }
    }
}

#[cfg(feature = "chrono")]
impl FieldCodec for chrono::NaiveDateTime {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::DateTime(*self)
    }
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::DateTime(dt) => Ok(dt),
            other => Err(RelmapError::translation(format!(
                "cannot coerce `{}` into datetime",
                other.type_name()
            ))),
        }
    }
}

#[cfg(feature = "rust-decimal")]
impl FieldCodec for rust_decimal::Decimal {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Decimal(*self)
    }
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Decimal(d) => Ok(d),
            other => Err(RelmapError::translation(format!(
                "cannot coerce `{}` into decimal",
                other.type_name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_widens_to_default_for_non_nullable_int() {
        assert_eq!(i64::from_sql_value(SqlValue::Null).unwrap(), 0);
    }

    #[test]
    fn null_widens_to_none_for_option() {
        assert_eq!(Option::<i64>::from_sql_value(SqlValue::Null).unwrap(), None);
    }

    #[test]
    fn smallint_widens_to_bigint() {
        assert_eq!(i64::from_sql_value(SqlValue::SmallInt(7)).unwrap(), 7);
    }
}
