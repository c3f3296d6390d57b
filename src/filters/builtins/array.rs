//! Array filters.

use std::cmp::Ordering;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::expr::{equals, Expression};
use crate::filters::builtins::math;
use crate::filters::{FilterCall, FilterHandler};
use crate::value::{Map, Property};
use crate::{Result, Value};

pub fn join(v: Vec<Value>, sep: Option<String>) -> String {
    let sep = sep.unwrap_or_else(|| String::from(" "));
    v.iter().map(Value::to_string).collect::<Vec<_>>().join(&sep)
}

pub fn first(v: Value) -> Value {
    match v.to_primitive() {
        Value::Array(a) => a.into_iter().next().unwrap_or_default(),
        Value::String(s) => s.chars().next().map(Value::from).unwrap_or_default(),
        _ => Value::Nil,
    }
}

pub fn last(v: Value) -> Value {
    match v.to_primitive() {
        Value::Array(mut a) => a.pop().unwrap_or_default(),
        Value::String(s) => s.chars().next_back().map(Value::from).unwrap_or_default(),
        _ => Value::Nil,
    }
}

pub fn size(v: Value) -> usize {
    v.to_primitive().size()
}

pub fn reverse(mut v: Vec<Value>) -> Vec<Value> {
    v.reverse();
    v
}

/// Sorts by value, or by the property `key` of each item. `nil` sorts last.
pub fn sort(mut v: Vec<Value>, key: Option<String>) -> Vec<Value> {
    match key {
        Some(key) => v.sort_by(|a, b| compare(&property(a, &key), &property(b, &key))),
        None => v.sort_by(compare),
    }
    v
}

/// Like `sort` but case insensitive.
pub fn sort_natural(mut v: Vec<Value>, key: Option<String>) -> Vec<Value> {
    let fold = |v: Value| match v.to_primitive() {
        Value::String(s) => Value::String(s.to_lowercase()),
        v => v,
    };
    match key {
        Some(key) => v.sort_by(|a, b| compare(&fold(property(a, &key)), &fold(property(b, &key)))),
        None => v.sort_by(|a, b| compare(&fold(a.clone()), &fold(b.clone()))),
    }
    v
}

pub fn uniq(v: Vec<Value>) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::with_capacity(v.len());
    for item in v {
        if !out.iter().any(|seen| equals(seen, &item)) {
            out.push(item);
        }
    }
    out
}

pub fn compact(v: Vec<Value>, key: Option<String>) -> Vec<Value> {
    v.into_iter()
        .filter(|item| match &key {
            Some(key) => !property(item, key).is_nil(),
            None => !item.is_nil(),
        })
        .collect()
}

pub fn map(v: Vec<Value>, key: String) -> Vec<Value> {
    v.iter().map(|item| property(item, &key)).collect()
}

pub fn concat(mut v: Vec<Value>, other: Vec<Value>) -> Vec<Value> {
    v.extend(other);
    v
}

pub fn push(mut v: Vec<Value>, item: Value) -> Vec<Value> {
    v.push(item);
    v
}

pub fn pop(mut v: Vec<Value>) -> Vec<Value> {
    v.pop();
    v
}

pub fn shift(mut v: Vec<Value>) -> Vec<Value> {
    if !v.is_empty() {
        v.remove(0);
    }
    v
}

pub fn unshift(mut v: Vec<Value>, item: Value) -> Vec<Value> {
    v.insert(0, item);
    v
}

/// A substring or subarray. A negative `start` counts from the end and the
/// length defaults to one.
pub fn slice(v: Value, start: i64, len: Option<i64>) -> Value {
    let len = len.unwrap_or(1).max(0) as usize;
    let bounds = |n: usize| {
        let begin = if start < 0 {
            n.saturating_sub(start.unsigned_abs() as usize)
        } else {
            (start as usize).min(n)
        };
        (begin, begin.saturating_add(len).min(n))
    };
    match v.to_primitive() {
        Value::Array(a) => {
            let (begin, end) = bounds(a.len());
            Value::Array(a[begin..end].to_vec())
        }
        v => {
            let chars: Vec<char> = v.to_string().chars().collect();
            let (begin, end) = bounds(chars.len());
            Value::String(chars[begin..end].iter().collect())
        }
    }
}

/// Items whose property `key` equals `value`, or is truthy when no value is
/// given.
pub fn where_(v: Vec<Value>, key: String, value: Option<Value>) -> Vec<Value> {
    v.into_iter().filter(|item| matches(item, &key, value.as_ref())).collect()
}

pub fn reject(v: Vec<Value>, key: String, value: Option<Value>) -> Vec<Value> {
    v.into_iter().filter(|item| !matches(item, &key, value.as_ref())).collect()
}

pub fn find(v: Vec<Value>, key: String, value: Option<Value>) -> Value {
    v.into_iter()
        .find(|item| matches(item, &key, value.as_ref()))
        .unwrap_or_default()
}

pub fn find_index(v: Vec<Value>, key: String, value: Option<Value>) -> Value {
    v.iter()
        .position(|item| matches(item, &key, value.as_ref()))
        .map(Value::from)
        .unwrap_or_default()
}

pub fn has(v: Vec<Value>, key: String, value: Option<Value>) -> bool {
    v.iter().any(|item| matches(item, &key, value.as_ref()))
}

/// Groups items by their property `key` into `{name, items}` objects, in
/// order of first appearance.
pub fn group_by(v: Vec<Value>, key: String) -> Vec<Value> {
    let mut groups: Vec<(Value, Vec<Value>)> = Vec::new();
    for item in v {
        let name = property(&item, &key);
        push_group(&mut groups, name, item);
    }
    into_groups(groups)
}

pub fn sum(v: Vec<Value>, key: Option<String>) -> Result<Value> {
    v.iter().try_fold(Value::Integer(0), |acc, item| {
        let n = match &key {
            Some(key) => property(item, key),
            None => item.clone(),
        };
        let n = if n.to_primitive().as_f64().is_some() { n } else { Value::Nil };
        math::plus(acc, n)
    })
}

pub fn array_to_sentence_string(v: Vec<Value>, connector: Option<String>) -> String {
    let connector = connector.unwrap_or_else(|| String::from("and"));
    let items: Vec<String> = v.iter().map(Value::to_string).collect();
    match items.as_slice() {
        [] => String::new(),
        [one] => one.clone(),
        [a, b] => format!("{} {} {}", a, connector, b),
        [init @ .., last] => format!("{}, {} {}", init.join(", "), connector, last),
    }
}

fn matches(item: &Value, key: &str, value: Option<&Value>) -> bool {
    let found = property(item, key);
    match value {
        Some(value) => equals(&found, value),
        None => found.is_truthy(false),
    }
}

/// Reads a dotted property path, `nil` when any segment is missing.
fn property(item: &Value, path: &str) -> Value {
    let mut current = item.clone();
    for segment in path.split('.') {
        current = match current.read_property(&Value::from(segment)) {
            Property::Found(v) => v,
            Property::Missing | Property::Super(_) => return Value::Nil,
        };
    }
    current
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a.is_nil(), b.is_nil()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }
    let (a, b) = (a.to_primitive(), b.to_primitive());
    match (&a, &b) {
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Integer(x), Value::Integer(y)) => x.cmp(y),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => a.to_string().cmp(&b.to_string()),
        },
    }
}

fn push_group(groups: &mut Vec<(Value, Vec<Value>)>, name: Value, item: Value) {
    match groups.iter_mut().find(|(n, _)| equals(n, &name)) {
        Some((_, items)) => items.push(item),
        None => groups.push((name, vec![item])),
    }
}

fn into_groups(groups: Vec<(Value, Vec<Value>)>) -> Vec<Value> {
    groups
        .into_iter()
        .map(|(name, items)| {
            let mut group = Map::new();
            group.insert(String::from("name"), name);
            group.insert(String::from("items"), Value::Array(items));
            Value::Object(group)
        })
        .collect()
}

fn to_array(v: Value) -> Vec<Value> {
    match v.to_primitive() {
        Value::Array(a) => a,
        Value::Nil => Vec::new(),
        v => vec![v],
    }
}

/// What an expression filter does with the items its expression selects.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ExpMode {
    Where,
    Reject,
    Find,
    FindIndex,
    Has,
    GroupBy,
}

/// The `*_exp` filters: `{{ items | where_exp: "item", "item.price > 10" }}`.
///
/// Each item is bound to the named variable in a spawned context, so the
/// expression sees the item and the globals but none of the caller's
/// variables.
pub(crate) struct ExpFilter(pub(crate) ExpMode);

impl FilterHandler for ExpFilter {
    fn call<'a>(&'a self, call: FilterCall<'a>) -> BoxFuture<'a, Result<Value>> {
        async move {
            let items = to_array(call.input);
            let var = call.args.first().map(Value::to_string).unwrap_or_default();
            let source = call.args.get(1).map(Value::to_string).unwrap_or_default();
            let expr = Expression::parse(&source, &call.context.engine().grammar)?;
            let js_truthy = call.context.opts().js_truthy();
            let mut ctx = call.context.spawn(Map::new());

            let mut selected = Vec::new();
            let mut groups = Vec::new();
            for (i, item) in items.into_iter().enumerate() {
                ctx.push(Map::from_iter([(var.clone(), item.clone())]));
                let result = expr.evaluate(&mut ctx, false).await;
                ctx.pop();
                let result = result?;
                match self.0 {
                    ExpMode::GroupBy => push_group(&mut groups, result, item),
                    ExpMode::Reject if !result.is_truthy(js_truthy) => selected.push(item),
                    ExpMode::Reject => {}
                    _ if !result.is_truthy(js_truthy) => {}
                    ExpMode::Find => return Ok(item),
                    ExpMode::FindIndex => return Ok(Value::from(i)),
                    ExpMode::Has => return Ok(Value::Bool(true)),
                    ExpMode::Where => selected.push(item),
                }
            }
            Ok(match self.0 {
                ExpMode::Where | ExpMode::Reject => Value::Array(selected),
                ExpMode::GroupBy => Value::Array(into_groups(groups)),
                ExpMode::Has => Value::Bool(false),
                ExpMode::Find | ExpMode::FindIndex => Value::Nil,
            })
        }
        .boxed()
    }
}
