//! Special wrapper values ("drops").
//!
//! Drops model the `nil`, `empty` and `blank` literals, loop state and the
//! block inheritance handle. They expose members by name and may answer
//! lookups that miss through [`LiquidDrop::resolve_missing`].

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::render::{Context, Emitter, StringEmitter};
use crate::value::{Map, Value};
use crate::Result;

/// Comparison capability used by the expression operators before falling
/// back to comparing primitive values.
pub trait Comparable {
    fn equals(&self, rhs: &Value) -> bool;
    fn gt(&self, _rhs: &Value) -> bool {
        false
    }
    fn geq(&self, _rhs: &Value) -> bool {
        false
    }
    fn lt(&self, _rhs: &Value) -> bool {
        false
    }
    fn leq(&self, _rhs: &Value) -> bool {
        false
    }
}

/// Member access capability shared by every drop.
pub trait LiquidDrop {
    /// Returns a named member of the drop.
    fn member(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Called when [`member`][LiquidDrop::member] has no answer.
    fn resolve_missing(&self, _name: &str) -> Option<Value> {
        None
    }

    /// The primitive this drop stands for when printed or compared.
    fn value_of(&self) -> Value;
}

/// The closed set of drops.
#[derive(Clone)]
pub enum DropValue {
    Nil,
    Empty,
    Blank,
    Forloop(ForloopDrop),
    Tablerowloop(TablerowloopDrop),
    Block(BlockDrop),
}

impl DropValue {
    pub fn as_comparable(&self) -> Option<&dyn Comparable> {
        match self {
            Self::Nil => Some(&NilDrop),
            Self::Empty => Some(&EmptyDrop),
            Self::Blank => Some(&BlankDrop),
            _ => None,
        }
    }

    pub fn as_drop(&self) -> &dyn LiquidDrop {
        match self {
            Self::Nil => &NilDrop,
            Self::Empty => &EmptyDrop,
            Self::Blank => &BlankDrop,
            Self::Forloop(d) => d,
            Self::Tablerowloop(d) => d,
            Self::Block(d) => d,
        }
    }

    pub(crate) fn human(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Empty => "empty",
            Self::Blank => "blank",
            Self::Forloop(_) => "forloop",
            Self::Tablerowloop(_) => "tablerowloop",
            Self::Block(_) => "block",
        }
    }
}

impl PartialEq for DropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) | (Self::Empty, Self::Empty) | (Self::Blank, Self::Blank) => {
                true
            }
            (Self::Forloop(a), Self::Forloop(b)) => a == b,
            (Self::Tablerowloop(a), Self::Tablerowloop(b)) => a == b,
            (Self::Block(a), Self::Block(b)) => a.same(b),
            _ => false,
        }
    }
}

impl fmt::Debug for DropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forloop(d) => d.fmt(f),
            Self::Tablerowloop(d) => d.fmt(f),
            d => write!(f, "{}", d.human()),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// nil, empty and blank
////////////////////////////////////////////////////////////////////////////////

struct NilDrop;

impl Comparable for NilDrop {
    fn equals(&self, rhs: &Value) -> bool {
        rhs.to_primitive().is_nil()
    }
}

impl LiquidDrop for NilDrop {
    fn value_of(&self) -> Value {
        Value::Nil
    }
}

struct EmptyDrop;

impl Comparable for EmptyDrop {
    fn equals(&self, rhs: &Value) -> bool {
        if let Value::Drop(DropValue::Empty) = rhs {
            return false;
        }
        match rhs.to_primitive() {
            Value::String(s) => s.is_empty(),
            Value::Array(a) => a.is_empty(),
            Value::Object(o) => o.is_empty(),
            _ => false,
        }
    }
}

impl LiquidDrop for EmptyDrop {
    fn value_of(&self) -> Value {
        Value::String(String::new())
    }
}

struct BlankDrop;

impl Comparable for BlankDrop {
    fn equals(&self, rhs: &Value) -> bool {
        match rhs.to_primitive() {
            Value::Bool(false) | Value::Nil => true,
            Value::String(s) => s.trim().is_empty(),
            _ => EmptyDrop.equals(rhs),
        }
    }
}

impl LiquidDrop for BlankDrop {
    fn value_of(&self) -> Value {
        Value::String(String::new())
    }
}

////////////////////////////////////////////////////////////////////////////////
// forloop and tablerowloop
////////////////////////////////////////////////////////////////////////////////

/// The `forloop` object available inside a `for` body.
#[derive(Debug, Clone, PartialEq)]
pub struct ForloopDrop {
    i: usize,
    length: usize,
    name: String,
}

impl ForloopDrop {
    pub fn new(length: usize, collection: &str, variable: &str) -> Self {
        Self {
            i: 0,
            length,
            name: format!("{}-{}", variable, collection),
        }
    }

    /// Advances to the next iteration.
    pub fn next(&mut self) {
        self.i += 1;
    }

    pub fn index0(&self) -> usize {
        self.i
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl LiquidDrop for ForloopDrop {
    fn member(&self, name: &str) -> Option<Value> {
        let i = self.i;
        let len = self.length;
        let v = match name {
            "index0" => Value::from(i),
            "index" => Value::from(i + 1),
            "first" => Value::Bool(i == 0),
            "last" => Value::Bool(i + 1 == len),
            "rindex" => Value::from(len.saturating_sub(i)),
            "rindex0" => Value::from(len.saturating_sub(i + 1)),
            "length" => Value::from(len),
            "name" => Value::from(self.name.as_str()),
            _ => return None,
        };
        Some(v)
    }

    fn value_of(&self) -> Value {
        let mut map = Map::new();
        for key in ["name", "length", "index", "index0", "rindex", "rindex0", "first", "last"] {
            if let Some(v) = self.member(key) {
                map.insert(String::from(key), v);
            }
        }
        Value::Object(map)
    }
}

/// The `tablerowloop` object available inside a `tablerow` body.
#[derive(Debug, Clone, PartialEq)]
pub struct TablerowloopDrop {
    forloop: ForloopDrop,
    cols: usize,
}

impl TablerowloopDrop {
    pub fn new(length: usize, cols: usize, collection: &str, variable: &str) -> Self {
        Self {
            forloop: ForloopDrop::new(length, collection, variable),
            cols: cols.max(1),
        }
    }

    pub fn next(&mut self) {
        self.forloop.next();
    }

    pub fn row(&self) -> usize {
        self.forloop.i / self.cols + 1
    }

    pub fn col0(&self) -> usize {
        self.forloop.i % self.cols
    }

    pub fn col(&self) -> usize {
        self.col0() + 1
    }
}

impl LiquidDrop for TablerowloopDrop {
    fn member(&self, name: &str) -> Option<Value> {
        let v = match name {
            "row" => Value::from(self.row()),
            "col" => Value::from(self.col()),
            "col0" => Value::from(self.col0()),
            "col_first" => Value::Bool(self.col0() == 0),
            "col_last" => Value::Bool(self.col() == self.cols),
            name => return self.forloop.member(name),
        };
        Some(v)
    }

    fn value_of(&self) -> Value {
        self.forloop.value_of()
    }
}

////////////////////////////////////////////////////////////////////////////////
// block
////////////////////////////////////////////////////////////////////////////////

type SuperFn = dyn for<'a> Fn(&'a mut Context, &'a mut dyn Emitter) -> BoxFuture<'a, Result<()>>
    + Send
    + Sync;

/// The `block` object available inside a `{% block %}` body.
///
/// Reading `block.super` renders the parent template's version of the block.
#[derive(Clone, Default)]
pub struct BlockDrop {
    parent: Option<Arc<SuperFn>>,
}

impl BlockDrop {
    pub(crate) fn new<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a mut Context, &'a mut dyn Emitter) -> BoxFuture<'a, Result<()>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            parent: Some(Arc::new(f)),
        }
    }

    /// Renders the parent block into a string.
    pub(crate) async fn render_super(&self, ctx: &mut Context) -> Result<String> {
        match &self.parent {
            Some(parent) => {
                let mut emitter = StringEmitter::new();
                (parent.as_ref())(ctx, &mut emitter).await?;
                Ok(emitter.into_string())
            }
            None => Ok(String::new()),
        }
    }

    fn same(&self, other: &Self) -> bool {
        match (&self.parent, &other.parent) {
            (Some(a), Some(b)) => Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const (),
            (None, None) => true,
            _ => false,
        }
    }
}

impl LiquidDrop for BlockDrop {
    fn value_of(&self) -> Value {
        Value::String(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forloop_members() {
        let mut f = ForloopDrop::new(3, "(1..3)", "x");
        assert_eq!(f.member("first"), Some(Value::Bool(true)));
        assert_eq!(f.member("index"), Some(Value::Integer(1)));
        f.next();
        f.next();
        assert_eq!(f.member("last"), Some(Value::Bool(true)));
        assert_eq!(f.member("rindex"), Some(Value::Integer(1)));
        assert_eq!(f.member("rindex0"), Some(Value::Integer(0)));
        assert_eq!(f.member("name"), Some(Value::from("x-(1..3)")));
        assert_eq!(f.member("missing"), None);
    }

    #[test]
    fn tablerowloop_members() {
        let mut t = TablerowloopDrop::new(5, 2, "items", "i");
        assert_eq!(t.member("col_first"), Some(Value::Bool(true)));
        t.next();
        assert_eq!(t.member("col_last"), Some(Value::Bool(true)));
        assert_eq!(t.member("row"), Some(Value::Integer(1)));
        t.next();
        assert_eq!(t.member("row"), Some(Value::Integer(2)));
        assert_eq!(t.member("col"), Some(Value::Integer(1)));
        assert_eq!(t.member("index"), Some(Value::Integer(3)));
    }

    #[test]
    fn empty_equals() {
        let empty = DropValue::Empty;
        let c = empty.as_comparable().unwrap();
        assert!(c.equals(&Value::from("")));
        assert!(c.equals(&Value::Array(vec![])));
        assert!(c.equals(&Value::Object(Map::new())));
        assert!(!c.equals(&Value::from("a")));
        assert!(!c.equals(&Value::Drop(DropValue::Empty)));
        assert!(!c.gt(&Value::from("")));
    }

    #[test]
    fn blank_equals() {
        let blank = DropValue::Blank;
        let c = blank.as_comparable().unwrap();
        assert!(c.equals(&Value::from("  \n")));
        assert!(c.equals(&Value::Bool(false)));
        assert!(c.equals(&Value::Nil));
        assert!(!c.equals(&Value::Bool(true)));
        assert!(!c.equals(&Value::from("x")));
    }

    #[test]
    fn nil_equals() {
        let c = DropValue::Nil;
        let c = c.as_comparable().unwrap();
        assert!(c.equals(&Value::Nil));
        assert!(c.equals(&Value::Drop(DropValue::Nil)));
        assert!(!c.equals(&Value::from(0)));
    }
}
