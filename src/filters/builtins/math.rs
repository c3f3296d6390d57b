//! Math filters.
//!
//! Integer operands produce integers and anything involving a float
//! produces a float. Strings are parsed and `nil` counts as zero.

use crate::{Error, Result, Value};

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn from_value(v: &Value) -> Result<Self> {
        match v.to_primitive() {
            Value::Nil => Ok(Self::Int(0)),
            Value::Integer(i) => Ok(Self::Int(i)),
            Value::Float(f) => Ok(Self::Float(f)),
            Value::String(s) => {
                let s = s.trim();
                if let Ok(i) = s.parse() {
                    return Ok(Self::Int(i));
                }
                s.parse()
                    .map(Self::Float)
                    .map_err(|_| Error::filter(format!("invalid number \"{}\"", s)))
            }
            v => Err(Error::filter(format!("expected a number, found {}", v.human()))),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        match n {
            Number::Int(i) => Value::Integer(i),
            Number::Float(f) => Value::Float(f),
        }
    }
}

fn arith(
    a: &Value,
    b: &Value,
    int: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
) -> Result<Value> {
    let (a, b) = (Number::from_value(a)?, Number::from_value(b)?);
    let n = match (a, b) {
        (Number::Int(x), Number::Int(y)) => match int(x, y) {
            Some(i) => Number::Int(i),
            None => Number::Float(float(x as f64, y as f64)),
        },
        (a, b) => Number::Float(float(a.as_f64(), b.as_f64())),
    };
    Ok(n.into())
}

pub fn plus(a: Value, b: Value) -> Result<Value> {
    arith(&a, &b, i64::checked_add, |x, y| x + y)
}

pub fn minus(a: Value, b: Value) -> Result<Value> {
    arith(&a, &b, i64::checked_sub, |x, y| x - y)
}

pub fn times(a: Value, b: Value) -> Result<Value> {
    arith(&a, &b, i64::checked_mul, |x, y| x * y)
}

/// Divides, rounding down when both operands are integers.
pub fn divided_by(a: Value, b: Value) -> Result<Value> {
    if Number::from_value(&b)?.as_f64() == 0.0 {
        return Err(Error::filter("divided by 0"));
    }
    arith(&a, &b, i64::checked_div_euclid, |x, y| x / y)
}

/// The remainder with the sign of the divisor.
pub fn modulo(a: Value, b: Value) -> Result<Value> {
    if Number::from_value(&b)?.as_f64() == 0.0 {
        return Err(Error::filter("divided by 0"));
    }
    arith(
        &a,
        &b,
        |x, y| x.checked_rem(y).map(|r| if r != 0 && (r < 0) != (y < 0) { r + y } else { r }),
        |x, y| x - y * (x / y).floor(),
    )
}

pub fn abs(a: Value) -> Result<Value> {
    let n = match Number::from_value(&a)? {
        Number::Int(i) => Number::Int(i.saturating_abs()),
        Number::Float(f) => Number::Float(f.abs()),
    };
    Ok(n.into())
}

/// Rounds to an integer, or to `digits` decimal places.
pub fn round(a: Value, digits: Option<i64>) -> Result<Value> {
    let n = Number::from_value(&a)?;
    match (n, digits) {
        (Number::Int(i), _) => Ok(Value::Integer(i)),
        (Number::Float(f), None | Some(0)) => Ok(float_to_int(f.round())),
        (Number::Float(f), Some(d)) => {
            let scale = 10f64.powi(d.clamp(-15, 15) as i32);
            Ok(Value::Float((f * scale).round() / scale))
        }
    }
}

pub fn ceil(a: Value) -> Result<Value> {
    Ok(float_to_int(Number::from_value(&a)?.as_f64().ceil()))
}

pub fn floor(a: Value) -> Result<Value> {
    Ok(float_to_int(Number::from_value(&a)?.as_f64().floor()))
}

pub fn at_least(a: Value, b: Value) -> Result<Value> {
    let (x, y) = (Number::from_value(&a)?, Number::from_value(&b)?);
    Ok(if x.as_f64() >= y.as_f64() { x } else { y }.into())
}

pub fn at_most(a: Value, b: Value) -> Result<Value> {
    let (x, y) = (Number::from_value(&a)?, Number::from_value(&b)?);
    Ok(if x.as_f64() <= y.as_f64() { x } else { y }.into())
}

fn float_to_int(f: f64) -> Value {
    if f.is_finite() && f.abs() < i64::MAX as f64 {
        Value::Integer(f as i64)
    } else {
        Value::Float(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_keeps_integers() {
        assert_eq!(plus(1.into(), 2.into()).unwrap(), Value::Integer(3));
        assert_eq!(plus(1.into(), 2.5.into()).unwrap(), Value::Float(3.5));
        assert_eq!(minus("10".into(), 4.into()).unwrap(), Value::Integer(6));
        assert_eq!(times(Value::Nil, 4.into()).unwrap(), Value::Integer(0));
    }

    #[test]
    fn division() {
        assert_eq!(divided_by(7.into(), 2.into()).unwrap(), Value::Integer(3));
        assert_eq!(divided_by((-7).into(), 2.into()).unwrap(), Value::Integer(-4));
        assert_eq!(divided_by(7.into(), 2.0.into()).unwrap(), Value::Float(3.5));
        assert_eq!(divided_by(1.into(), 0.into()).unwrap_err().to_string(), "divided by 0");
    }

    #[test]
    fn modulo_sign_follows_divisor() {
        assert_eq!(modulo(7.into(), 3.into()).unwrap(), Value::Integer(1));
        assert_eq!(modulo((-7).into(), 3.into()).unwrap(), Value::Integer(2));
        assert_eq!(modulo(5.5.into(), 2.into()).unwrap(), Value::Float(1.5));
    }

    #[test]
    fn rounding() {
        assert_eq!(round(2.7.into(), None).unwrap(), Value::Integer(3));
        assert_eq!(round(183.357.into(), Some(2)).unwrap(), Value::Float(183.36));
        assert_eq!(ceil("1.2".into()).unwrap(), Value::Integer(2));
        assert_eq!(floor((-1.2).into()).unwrap(), Value::Integer(-2));
    }

    #[test]
    fn bounds() {
        assert_eq!(at_least(4.into(), 5.into()).unwrap(), Value::Integer(5));
        assert_eq!(at_most(4.into(), 5.into()).unwrap(), Value::Integer(4));
        assert_eq!(abs((-3).into()).unwrap(), Value::Integer(3));
    }

    #[test]
    fn invalid_number() {
        let err = plus("abc".into(), 1.into()).unwrap_err();
        assert_eq!(err.to_string(), "invalid number \"abc\"");
    }
}
