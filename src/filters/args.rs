use crate::value::Map;
use crate::Value;

pub type Result<T> = std::result::Result<T, ArgError>;

/// Why a value could not be converted into a filter argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgError {
    /// When there is a type mismatch.
    Type(
        /// Expected
        &'static str,
        /// Got
        &'static str,
    ),
}

/// A type a filter argument can be converted into.
///
/// Conversions follow Liquid's loose typing: numbers parse from strings,
/// anything renders into a string and `nil` is an empty array.
pub trait FilterArg: Sized {
    fn from_value(v: Value) -> Result<Self>;
}

impl FilterArg for Value {
    fn from_value(v: Value) -> Result<Self> {
        Ok(v)
    }
}

impl FilterArg for bool {
    fn from_value(v: Value) -> Result<Self> {
        match v.to_primitive() {
            Value::Bool(b) => Ok(b),
            Value::Nil => Ok(false),
            v => Err(ArgError::Type("bool", v.human())),
        }
    }
}

impl FilterArg for i64 {
    fn from_value(v: Value) -> Result<Self> {
        match v {
            Value::Nil => Ok(0),
            v => v.as_i64().ok_or(ArgError::Type("integer", v.human())),
        }
    }
}

impl FilterArg for f64 {
    fn from_value(v: Value) -> Result<Self> {
        match v {
            Value::Nil => Ok(0.0),
            v => v.as_f64().ok_or(ArgError::Type("float", v.human())),
        }
    }
}

impl FilterArg for String {
    fn from_value(v: Value) -> Result<Self> {
        match v {
            Value::String(s) => Ok(s),
            v => Ok(v.to_string()),
        }
    }
}

impl FilterArg for Vec<Value> {
    fn from_value(v: Value) -> Result<Self> {
        match v.to_primitive() {
            Value::Array(a) => Ok(a),
            Value::Nil => Ok(Vec::new()),
            v => Ok(vec![v]),
        }
    }
}

impl FilterArg for Map {
    fn from_value(v: Value) -> Result<Self> {
        match v.to_primitive() {
            Value::Object(o) => Ok(o),
            v => Err(ArgError::Type("object", v.human())),
        }
    }
}

impl<T> FilterArg for Option<T>
where
    T: FilterArg,
{
    fn from_value(v: Value) -> Result<Self> {
        if v.is_nil() {
            return Ok(None);
        }
        T::from_value(v).map(Some)
    }
}
