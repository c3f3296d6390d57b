//! Defines the [`Value`] enum, representing any valid renderable data.

mod drops;
mod from;

use std::fmt;

pub use indexmap::IndexMap;

pub use crate::value::drops::{
    BlockDrop, Comparable, DropValue, ForloopDrop, LiquidDrop, TablerowloopDrop,
};

/// Converts any serializable data into a [`Value`].
///
/// Struct fields and map entries keep their declaration order.
pub fn to_value<T>(value: T) -> crate::Result<Value>
where
    T: serde::Serialize,
{
    serde_json::to_value(value)
        .map(Value::from)
        .map_err(|err| crate::Error::new(crate::ErrorKind::Serialize(err.to_string())))
}

/// An insertion ordered map of values.
pub type Map = IndexMap<String, Value>;

/// Data to be rendered represented as a recursive enum.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Object(Map),
    Drop(DropValue),
}

/// The result of reading a property from a value.
pub(crate) enum Property {
    Found(Value),
    Missing,
    /// `block.super` which has to be rendered.
    Super(BlockDrop),
}

impl Value {
    /// Returns a human readable name for the type of this value.
    pub fn human(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Drop(d) => d.human(),
        }
    }

    /// Whether this is `nil` or the `nil` literal.
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil | Value::Drop(DropValue::Nil))
    }

    /// Converts a drop into the primitive it represents.
    pub fn to_primitive(&self) -> Value {
        match self {
            Value::Drop(d) => d.as_drop().value_of(),
            v => v.clone(),
        }
    }

    /// Liquid truthiness: only `false` and `nil` are falsy.
    ///
    /// With `js_truthy` the empty string, zero and `NaN` are falsy too.
    pub fn is_truthy(&self, js_truthy: bool) -> bool {
        let v = self.to_primitive();
        if js_truthy {
            return match v {
                Value::Nil | Value::Bool(false) => false,
                Value::Integer(0) => false,
                Value::Float(f) => f != 0.0 && !f.is_nan(),
                Value::String(s) => !s.is_empty(),
                _ => true,
            };
        }
        !matches!(v, Value::Nil | Value::Bool(false))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Interprets the value as a number, parsing strings.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::String(s) => s.trim().parse().ok(),
            Value::Bool(_) | Value::Nil | Value::Array(_) | Value::Object(_) => None,
            Value::Drop(d) => d.as_drop().value_of().as_f64(),
        }
    }

    /// Interprets the value as an integer, truncating floats and parsing
    /// strings.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            Value::String(s) => {
                let s = s.trim();
                s.parse()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(|f| f.trunc() as i64))
            }
            _ => None,
        }
    }

    /// The `size` of a string, array or object.
    pub fn size(&self) -> usize {
        match self {
            Value::String(s) => s.chars().count(),
            Value::Array(a) => a.len(),
            Value::Object(o) => o.len(),
            _ => 0,
        }
    }

    /// Converts the value into a sequence for iteration.
    ///
    /// Objects iterate as `[key, value]` pairs and a non-empty string is a
    /// sequence of one element.
    pub fn into_enumerable(self) -> Vec<Value> {
        match self {
            Value::Array(a) => a,
            Value::String(s) if !s.is_empty() => vec![Value::String(s)],
            Value::Object(o) => o
                .into_iter()
                .map(|(k, v)| Value::Array(vec![Value::String(k), v]))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Reads a member using Liquid property semantics.
    pub(crate) fn read_property(&self, key: &Value) -> Property {
        let found = |v: Option<&Value>| match v {
            Some(v) => Property::Found(v.clone()),
            None => Property::Missing,
        };
        match self {
            Value::Array(a) => {
                if let Some(i) = array_index(key, a.len()) {
                    return found(a.get(i));
                }
                match key.as_str() {
                    Some("size") => Property::Found(Value::from(a.len())),
                    Some("first") => found(a.first()),
                    Some("last") => found(a.last()),
                    _ => Property::Missing,
                }
            }
            Value::Object(o) => {
                let name = key.to_string();
                if let Some(v) = o.get(&name) {
                    return Property::Found(v.clone());
                }
                match name.as_str() {
                    "size" => Property::Found(Value::from(o.len())),
                    _ => Property::Missing,
                }
            }
            Value::String(s) => match key.as_str() {
                Some("size") => Property::Found(Value::from(s.chars().count())),
                Some("first") => found(s.chars().next().map(Value::from).as_ref()),
                Some("last") => found(s.chars().next_back().map(Value::from).as_ref()),
                _ => Property::Missing,
            },
            Value::Drop(DropValue::Block(block)) if key.as_str() == Some("super") => {
                Property::Super(block.clone())
            }
            Value::Drop(d) => {
                let drop = d.as_drop();
                let name = key.to_string();
                match drop.member(&name).or_else(|| drop.resolve_missing(&name)) {
                    Some(v) => Property::Found(v),
                    None => Property::Missing,
                }
            }
            _ => Property::Missing,
        }
    }
}

fn array_index(key: &Value, len: usize) -> Option<usize> {
    let i = match key {
        Value::Integer(i) => *i,
        Value::Float(f) if f.fract() == 0.0 => *f as i64,
        Value::String(s) => s.parse().ok()?,
        _ => return None,
    };
    if i < 0 {
        let back = usize::try_from(i.unsigned_abs()).ok()?;
        len.checked_sub(back)
    } else {
        usize::try_from(i).ok()
    }
}

/// Formats a float the way Liquid prints numbers.
pub(crate) fn fmt_float(f: f64, out: &mut fmt::Formatter<'_>) -> fmt::Result {
    if f.is_infinite() {
        let s = if f > 0.0 { "Infinity" } else { "-Infinity" };
        return out.write_str(s);
    }
    write!(out, "{}", f)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(n) => fmt_float(*n, f),
            Value::String(s) => f.write_str(s),
            Value::Array(a) => a.iter().try_for_each(|v| write!(f, "{}", v)),
            Value::Object(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
            Value::Drop(d) => match d.as_drop().value_of() {
                Value::Object(_) => Ok(()),
                v => write!(f, "{}", v),
            },
        }
    }
}

impl serde::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Value::Nil => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(n) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(a) => serializer.collect_seq(a),
            Value::Object(o) => serializer.collect_map(o),
            Value::Drop(d) => d.as_drop().value_of().serialize(serializer),
        }
    }
}
