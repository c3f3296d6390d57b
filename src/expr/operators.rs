//! The operator table used by conditions.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::render::Context;
use crate::value::Value;

type UnaryFn = dyn Fn(&Value, &Context) -> Value + Send + Sync;
type BinaryFn = dyn Fn(&Value, &Value, &Context) -> Value + Send + Sync;

/// An operator usable in expressions, for example `==` or `contains`.
///
/// Operators with a higher precedence bind tighter. Operators of equal
/// precedence group to the right, so `a and b or c` is `a and (b or c)`.
pub struct Operator {
    name: String,
    precedence: u8,
    handler: OperatorFn,
}

pub(crate) enum OperatorFn {
    Unary(Box<UnaryFn>),
    Binary(Box<BinaryFn>),
}

impl Operator {
    /// Constructs an operator taking a single operand on its right.
    pub fn unary<F>(name: impl Into<String>, precedence: u8, f: F) -> Self
    where
        F: Fn(&Value, &Context) -> Value + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            precedence,
            handler: OperatorFn::Unary(Box::new(f)),
        }
    }

    /// Constructs an operator taking an operand on either side.
    pub fn binary<F>(name: impl Into<String>, precedence: u8, f: F) -> Self
    where
        F: Fn(&Value, &Value, &Context) -> Value + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            precedence,
            handler: OperatorFn::Binary(Box::new(f)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn precedence(&self) -> u8 {
        self.precedence
    }

    pub(crate) fn handler(&self) -> &OperatorFn {
        &self.handler
    }
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arity = match self.handler {
            OperatorFn::Unary(_) => "unary",
            OperatorFn::Binary(_) => "binary",
        };
        f.debug_struct("Operator")
            .field("name", &self.name)
            .field("precedence", &self.precedence)
            .field("arity", &arity)
            .finish()
    }
}

/// The builtin operators keyed by name.
pub(crate) fn defaults() -> IndexMap<String, Arc<Operator>> {
    let ops = [
        Operator::binary("==", 2, |l, r, _| Value::Bool(equals(l, r))),
        Operator::binary("!=", 2, |l, r, _| Value::Bool(!equals(l, r))),
        Operator::binary("<>", 2, |l, r, _| Value::Bool(!equals(l, r))),
        Operator::binary(">", 2, |l, r, _| Value::Bool(gt(l, r))),
        Operator::binary("<", 2, |l, r, _| Value::Bool(gt(r, l))),
        Operator::binary(">=", 2, |l, r, _| Value::Bool(geq(l, r))),
        Operator::binary("<=", 2, |l, r, _| Value::Bool(geq(r, l))),
        Operator::binary("contains", 2, |l, r, _| Value::Bool(contains(l, r))),
        Operator::unary("not", 1, |v, ctx| Value::Bool(!v.is_truthy(ctx.opts().js_truthy()))),
        Operator::binary("and", 0, |l, r, ctx| {
            let js = ctx.opts().js_truthy();
            Value::Bool(l.is_truthy(js) && r.is_truthy(js))
        }),
        Operator::binary("or", 0, |l, r, ctx| {
            let js = ctx.opts().js_truthy();
            Value::Bool(l.is_truthy(js) || r.is_truthy(js))
        }),
    ];
    ops.into_iter()
        .map(|op| (op.name.clone(), Arc::new(op)))
        .collect()
}

/// Value equality as used by `==`, `case` and the `where` filters.
pub fn equals(lhs: &Value, rhs: &Value) -> bool {
    if let Value::Drop(d) = lhs {
        if let Some(c) = d.as_comparable() {
            return c.equals(rhs);
        }
    }
    if let Value::Drop(d) = rhs {
        if let Some(c) = d.as_comparable() {
            return c.equals(lhs);
        }
    }
    primitive_equals(&lhs.to_primitive(), &rhs.to_primitive())
}

fn primitive_equals(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| equals(a, b))
        }
        (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
            *a as f64 == *b
        }
        (a, b) => a == b,
    }
}

fn gt(lhs: &Value, rhs: &Value) -> bool {
    if let Some(c) = comparable(lhs) {
        return c.gt(rhs);
    }
    if let Some(c) = comparable(rhs) {
        return c.lt(lhs);
    }
    compare(lhs, rhs) == Some(Ordering::Greater)
}

fn geq(lhs: &Value, rhs: &Value) -> bool {
    if let Some(c) = comparable(lhs) {
        return c.geq(rhs);
    }
    if let Some(c) = comparable(rhs) {
        return c.leq(lhs);
    }
    matches!(compare(lhs, rhs), Some(Ordering::Greater | Ordering::Equal))
}

fn comparable(v: &Value) -> Option<&dyn crate::value::Comparable> {
    match v {
        Value::Drop(d) => d.as_comparable(),
        _ => None,
    }
}

/// Orders two primitives. Strings compare with strings, anything else is
/// compared numerically when both sides are numbers.
fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    let (lhs, rhs) = (lhs.to_primitive(), rhs.to_primitive());
    match (&lhs, &rhs) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        _ => lhs.as_f64()?.partial_cmp(&rhs.as_f64()?),
    }
}

fn contains(lhs: &Value, rhs: &Value) -> bool {
    match lhs.to_primitive() {
        Value::Array(items) => items.iter().any(|item| equals(item, rhs)),
        Value::String(s) => s.contains(rhs.to_primitive().to_string().as_str()),
        _ => false,
    }
}
