//! Storage values and the conversions between them and Rust field types.
//!
//! Decoding is lenient in the way a loosely typed driver needs: a field first
//! accepts its exact storage type, then falls back to a typed coercion
//! (integer or text to `bool`, text to JSON, text to numbers, numbers to
//! text). Only values that cannot be coerced at all produce a [`DecodeError`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// A single value as stored in, or bound to, the database.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    /// Composite value, written as JSON text
    Json(serde_json::Value),
}

/// Binding hint passed to the driver alongside each parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Bool,
    Int,
    Str,
}

impl Value {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null | Self::Json(serde_json::Value::Null))
    }

    pub fn param_type(&self) -> ParamType {
        match self {
            Self::Bool(_) => ParamType::Bool,
            Self::Integer(_) => ParamType::Int,
            _ => ParamType::Str,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Text(_) => "text",
            Self::Json(_) => "json",
        }
    }

    /// Whether the write path drops this value from the outgoing column list.
    ///
    /// Empty values that are neither numeric nor boolean are omitted, so an
    /// unset field and an empty string both mean "leave this column alone".
    /// Composite values are always written, even when empty.
    pub fn is_omitted_on_write(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.is_empty(),
            Self::Json(j) => j.is_null(),
            Self::Bool(_) | Self::Integer(_) | Self::Real(_) => false,
        }
    }

    /// Storage form of the value: composite values become JSON text.
    pub fn encode(self) -> Self {
        match self {
            Self::Json(j) => Self::Text(j.to_string()),
            other => other,
        }
    }

    /// Converts a wire JSON scalar or container into a value.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => n.as_f64().map_or(Self::Null, Self::Real),
            },
            serde_json::Value::String(s) => Self::Text(s),
            composite => Self::Json(composite),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Integer(i) => serde_json::Value::from(*i),
            Self::Real(r) => serde_json::Value::from(*r),
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Json(j) => j.clone(),
        }
    }

    fn mismatch(&self, expected: &'static str) -> DecodeError {
        if self.is_null() {
            DecodeError::UnexpectedNull
        } else {
            DecodeError::TypeMismatch {
                expected,
                found: self.type_name(),
            }
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Real(r) => write!(f, "{r}"),
            Self::Text(s) => f.write_str(s),
            Self::Json(j) => write!(f, "{j}"),
        }
    }
}

/// Encodes the column map for a write, dropping omitted values and
/// serializing composites.
pub fn encode_fields<K>(fields: impl IntoIterator<Item = (K, Value)>) -> Vec<(K, Value)> {
    fields
        .into_iter()
        .filter(|(_, value)| !value.is_omitted_on_write())
        .map(|(key, value)| (key, value.encode()))
        .collect()
}

//------------------------------------------------------------------------------
// Field conversions
//------------------------------------------------------------------------------

/// Converts a field into its storage value.
pub trait ToValue {
    fn to_value(&self) -> Value;
}

/// Builds a field from a storage value, coercing where the types differ.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, DecodeError>;
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        Ok(value)
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl ToValue for &str {
    fn to_value(&self) -> Value {
        Value::Text((*self).to_owned())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Text(s) => Ok(s),
            Value::Integer(i) => Ok(i.to_string()),
            Value::Real(r) => Ok(r.to_string()),
            Value::Bool(b) => Ok(if b { "1" } else { "0" }.to_owned()),
            Value::Json(serde_json::Value::String(s)) => Ok(s),
            Value::Json(j) if !j.is_null() => Ok(j.to_string()),
            other => Err(other.mismatch("text")),
        }
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Integer(i) => Ok(i != 0),
            Value::Real(r) => Ok(r != 0.0),
            Value::Text(s) => Ok(!(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false"))),
            Value::Json(serde_json::Value::Bool(b)) => Ok(b),
            other => Err(other.mismatch("bool")),
        }
    }
}

impl ToValue for i64 {
    fn to_value(&self) -> Value {
        Value::Integer(*self)
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Integer(i) => Ok(i),
            Value::Bool(b) => Ok(i64::from(b)),
            Value::Real(r) if r.fract() == 0.0 => Ok(r as i64),
            Value::Text(ref s) => s.trim().parse().map_err(|_| value.mismatch("integer")),
            Value::Json(serde_json::Value::Number(ref n)) => {
                n.as_i64().ok_or_else(|| value.mismatch("integer"))
            }
            other => Err(other.mismatch("integer")),
        }
    }
}

macro_rules! narrow_integer {
    ($($ty:ty),*) => {$(
        impl ToValue for $ty {
            fn to_value(&self) -> Value {
                Value::Integer(i64::from(*self))
            }
        }

        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self, DecodeError> {
                let wide = i64::from_value(value)?;
                <$ty>::try_from(wide).map_err(|_| DecodeError::TypeMismatch {
                    expected: stringify!($ty),
                    found: "integer",
                })
            }
        }
    )*};
}

narrow_integer!(i32, u32, i16, u16, u8);

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Real(*self)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Real(r) => Ok(r),
            Value::Integer(i) => Ok(i as f64),
            Value::Text(ref s) => s.trim().parse().map_err(|_| value.mismatch("real")),
            Value::Json(serde_json::Value::Number(ref n)) => {
                n.as_f64().ok_or_else(|| value.mismatch("real"))
            }
            other => Err(other.mismatch("real")),
        }
    }
}

impl ToValue for serde_json::Value {
    fn to_value(&self) -> Value {
        Value::Json(self.clone())
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Json(j) => Ok(j),
            Value::Text(s) => serde_json::from_str(&s).map_err(|e| DecodeError::Json(e.to_string())),
            Value::Null => Err(DecodeError::UnexpectedNull),
            scalar => Ok(scalar.to_json()),
        }
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, ToValue::to_value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

/// Composite field stored as a JSON document.
///
/// ```ignore
/// #[derive(Model, Default)]
/// #[model(table = "events", primary_key = "event_id")]
/// struct Event {
///     event_id: Option<i64>,
///     tags: Json<Vec<String>>,
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Json<T>(pub T);

impl<T> std::ops::Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: Serialize> ToValue for Json<T> {
    fn to_value(&self) -> Value {
        // Only maps with non-string keys fail here; they are written as NULL.
        serde_json::to_value(&self.0).map_or(Value::Null, Value::Json)
    }
}

impl<T: DeserializeOwned> FromValue for Json<T> {
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        let json = serde_json::Value::from_value(value)?;
        serde_json::from_value(json)
            .map(Json)
            .map_err(|e| DecodeError::Json(e.to_string()))
    }
}

//------------------------------------------------------------------------------
// Literal conversions
//------------------------------------------------------------------------------

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Self::from_json(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
