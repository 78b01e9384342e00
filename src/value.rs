//! Cell values and conversions for relorm
//!
//! [`Value`] is the dynamically-typed holder a cursor fills for every column.
//! [`IntoValue`] turns Rust values into statement parameters, and
//! [`FromValue`] coerces a cell into the static type of an entity field.

use crate::error::CoercionError;

type Coerced<T> = std::result::Result<Option<T>, CoercionError>;

/// A single database cell or statement parameter
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Text form of the cell as reported in coercion errors
    pub fn raw_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(v) => v.to_string(),
            Value::Integer(v) => v.to_string(),
            Value::Unsigned(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Text(v) => v.clone(),
            Value::Bytes(v) => String::from_utf8_lossy(v).into_owned(),
        }
    }
}

impl From<turso::Value> for Value {
    fn from(value: turso::Value) -> Self {
        match value {
            turso::Value::Null => Value::Null,
            turso::Value::Integer(v) => Value::Integer(v),
            turso::Value::Real(v) => Value::Float(v),
            turso::Value::Text(v) => Value::Text(v),
            turso::Value::Blob(v) => Value::Bytes(v),
        }
    }
}

impl From<Value> for turso::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => turso::Value::Null,
            Value::Bool(v) => turso::Value::Integer(i64::from(v)),
            Value::Integer(v) => turso::Value::Integer(v),
            Value::Unsigned(v) => match i64::try_from(v) {
                Ok(v) => turso::Value::Integer(v),
                Err(_) => turso::Value::Text(v.to_string()),
            },
            Value::Float(v) => turso::Value::Real(v),
            Value::Text(v) => turso::Value::Text(v),
            Value::Bytes(v) => turso::Value::Blob(v),
        }
    }
}

/// Trait for converting Rust types into statement parameters
///
/// ```ignore
/// let value: Value = 42i64.into_value();
/// let text: Value = "hello".into_value();
/// ```
pub trait IntoValue {
    fn into_value(self) -> Value;
}

/// Trait for coercing a database cell into a field's static type
///
/// Returning `Ok(None)` leaves the destination field untouched, which is how
/// unconvertible shapes are skipped. Only text that fails to parse into a
/// numeric target is an error.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Coerced<Self>;
}

macro_rules! impl_into_value {
    ($variant:ident as $repr:ty: $($ty:ty),*) => {$(
        impl IntoValue for $ty {
            fn into_value(self) -> Value {
                Value::$variant(self as $repr)
            }
        }
    )*};
}

impl_into_value!(Integer as i64: i8, i16, i32, i64, isize, u8, u16, u32);
impl_into_value!(Unsigned as u64: u64, usize);
impl_into_value!(Float as f64: f32, f64);

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Text(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::Text(self.to_string())
    }
}

impl IntoValue for &String {
    fn into_value(self) -> Value {
        Value::Text(self.clone())
    }
}

impl IntoValue for Vec<u8> {
    fn into_value(self) -> Value {
        Value::Bytes(self)
    }
}

impl IntoValue for &[u8] {
    fn into_value(self) -> Value {
        Value::Bytes(self.to_vec())
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

/// Parses a decimal or `0x`/`0o`/`0b` prefixed integer literal with an optional sign
pub(crate) fn parse_integer_literal(text: &str) -> std::result::Result<i64, String> {
    let (negative, body) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let (radix, digits) = match body.get(..2) {
        Some("0x" | "0X") => (16, &body[2..]),
        Some("0o" | "0O") => (8, &body[2..]),
        Some("0b" | "0B") => (2, &body[2..]),
        _ => (10, body),
    };

    if digits.starts_with(['+', '-']) {
        return Err("invalid digit found in string".to_string());
    }

    let magnitude = u64::from_str_radix(digits, radix).map_err(|e| e.to_string())?;

    if negative {
        if magnitude > i64::MIN.unsigned_abs() {
            return Err("number too small to fit in target type".to_string());
        }
        Ok((magnitude as i64).wrapping_neg())
    } else {
        i64::try_from(magnitude).map_err(|_| "number too large to fit in target type".to_string())
    }
}

fn integer_bits(value: &Value) -> Coerced<i64> {
    match value {
        Value::Integer(v) => Ok(Some(*v)),
        Value::Unsigned(v) => Ok(Some(*v as i64)),
        Value::Float(v) => Ok(Some(*v as i64)),
        Value::Bool(true) => Ok(Some(1)),
        Value::Text(_) | Value::Bytes(_) => {
            let raw = value.raw_text();
            parse_integer_literal(&raw).map(Some).map_err(|cause| CoercionError::new(raw, cause))
        }
        Value::Bool(false) | Value::Null => Ok(None),
    }
}

fn float_bits(value: &Value) -> Coerced<f64> {
    match value {
        Value::Integer(v) => Ok(Some(*v as f64)),
        Value::Unsigned(v) => Ok(Some(*v as f64)),
        Value::Float(v) => Ok(Some(*v)),
        Value::Bool(true) => Ok(Some(1.0)),
        Value::Text(_) | Value::Bytes(_) => {
            let raw = value.raw_text();
            raw.parse::<f64>().map(Some).map_err(|e| CoercionError::new(raw, e))
        }
        Value::Bool(false) | Value::Null => Ok(None),
    }
}

macro_rules! impl_from_value_integer {
    ($($ty:ty),*) => {$(
        impl FromValue for $ty {
            fn from_value(value: &Value) -> Coerced<Self> {
                Ok(integer_bits(value)?.map(|v| v as $ty))
            }
        }
    )*};
}

impl_from_value_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: &Value) -> Coerced<Self> {
        float_bits(value)
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Coerced<Self> {
        Ok(float_bits(value)?.map(|v| v as f32))
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Coerced<Self> {
        let truthy = match value {
            Value::Bool(v) => return Ok(Some(*v)),
            Value::Integer(v) => *v > 0,
            Value::Unsigned(v) => *v > 0,
            Value::Float(v) => *v > 0.0,
            Value::Text(v) => !v.is_empty(),
            Value::Bytes(v) => !v.is_empty(),
            Value::Null => false,
        };
        Ok(truthy.then_some(true))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Coerced<Self> {
        Ok(match value {
            Value::Null => None,
            other => Some(other.raw_text()),
        })
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Coerced<Self> {
        Ok(match value {
            Value::Bytes(v) => Some(v.clone()),
            Value::Text(v) => Some(v.as_bytes().to_vec()),
            _ => None,
        })
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Coerced<Self> {
        Ok(T::from_value(value)?.map(Some))
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Coerced<Self> {
        Ok(Some(value.clone()))
    }
}

#[cfg(feature = "with-chrono")]
mod chrono_impl {
    use chrono::DateTime;
    use chrono::NaiveDate;
    use chrono::NaiveDateTime;
    use chrono::NaiveTime;
    use chrono::Utc;

    use super::*;

    impl IntoValue for NaiveDateTime {
        fn into_value(self) -> Value {
            Value::Text(self.format("%Y-%m-%d %H:%M:%S").to_string())
        }
    }

    impl FromValue for NaiveDateTime {
        fn from_value(value: &Value) -> Coerced<Self> {
            Ok(match value {
                Value::Text(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                    .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
                    .ok(),
                Value::Integer(secs) => DateTime::from_timestamp(*secs, 0).map(|dt| dt.naive_utc()),
                _ => None,
            })
        }
    }

    impl IntoValue for DateTime<Utc> {
        fn into_value(self) -> Value {
            Value::Text(self.format("%Y-%m-%d %H:%M:%S").to_string())
        }
    }

    impl FromValue for DateTime<Utc> {
        fn from_value(value: &Value) -> Coerced<Self> {
            Ok(NaiveDateTime::from_value(value)?.map(|ndt| DateTime::from_naive_utc_and_offset(ndt, Utc)))
        }
    }

    impl IntoValue for NaiveDate {
        fn into_value(self) -> Value {
            Value::Text(self.format("%Y-%m-%d").to_string())
        }
    }

    impl FromValue for NaiveDate {
        fn from_value(value: &Value) -> Coerced<Self> {
            Ok(match value {
                Value::Text(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").ok(),
                _ => None,
            })
        }
    }

    impl IntoValue for NaiveTime {
        fn into_value(self) -> Value {
            Value::Text(self.format("%H:%M:%S").to_string())
        }
    }

    impl FromValue for NaiveTime {
        fn from_value(value: &Value) -> Coerced<Self> {
            Ok(match value {
                Value::Text(s) => NaiveTime::parse_from_str(s, "%H:%M:%S").ok(),
                _ => None,
            })
        }
    }
}

#[cfg(feature = "with-uuid")]
mod uuid_impl {
    use uuid::Uuid;

    use super::*;

    impl IntoValue for Uuid {
        fn into_value(self) -> Value {
            Value::Text(self.to_string())
        }
    }

    impl FromValue for Uuid {
        fn from_value(value: &Value) -> Coerced<Self> {
            Ok(match value {
                Value::Text(s) => Uuid::parse_str(s).ok(),
                Value::Bytes(b) => Uuid::from_slice(b).ok(),
                _ => None,
            })
        }
    }
}

#[cfg(feature = "with-json")]
pub use json_impl::Json;

#[cfg(feature = "with-json")]
mod json_impl {
    use serde::Serialize;
    use serde::de::DeserializeOwned;

    use super::*;

    /// Column stored as JSON text
    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct Json<T>(pub T);

    impl<T: Serialize> IntoValue for Json<T> {
        fn into_value(self) -> Value {
            match serde_json::to_string(&self.0) {
                Ok(s) => Value::Text(s),
                Err(_) => Value::Null,
            }
        }
    }

    impl<T: DeserializeOwned> FromValue for Json<T> {
        fn from_value(value: &Value) -> Coerced<Self> {
            match value {
                Value::Text(_) | Value::Bytes(_) => {
                    let raw = value.raw_text();
                    serde_json::from_str(&raw).map(|v| Some(Json(v))).map_err(|e| CoercionError::new(raw, e))
                }
                _ => Ok(None),
            }
        }
    }
}
