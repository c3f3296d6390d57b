use std::sync::Arc;

use crate::render::limiter::{Deadline, Limiter};
use crate::render::registers::Registers;
use crate::types::options::{Options, RenderOptions};
use crate::value::{Map, Property};
use crate::{Inner, Result, Value};

/// The variables and per render state visible to a template.
///
/// Variables are looked up in the scope stack from the innermost scope
/// outwards, then in the environment (the data passed to the render call)
/// and finally in the engine globals. Assignments always go to the outermost
/// scope.
pub struct Context {
    engine: Arc<Inner>,
    scopes: Vec<Map>,
    environments: Map,
    globals: Arc<Map>,
    registers: Registers,
    strict_variables: bool,
    own_property_only: bool,
    sync: bool,
    deadline: Arc<Deadline>,
    memory: Arc<Limiter>,
}

/// The outcome of resolving a variable path.
pub(crate) enum Resolved {
    Value(Value),
    /// The path up to and including the first missing segment.
    Undefined(String),
}

impl Context {
    pub(crate) fn new(engine: Arc<Inner>, env: Map, opts: &RenderOptions, sync: bool) -> Self {
        let options = &engine.options;
        let globals = match &opts.globals {
            Some(globals) => Arc::new(globals.clone()),
            None => Arc::clone(&options.globals),
        };
        let strict_variables = opts.strict_variables.unwrap_or(options.strict_variables);
        let own_property_only = opts.own_property_only.unwrap_or(options.own_property_only);
        let deadline = Deadline::new(opts.render_limit.or(options.render_limit));
        let memory = Limiter::new("memory alloc", opts.memory_limit.unwrap_or(options.memory_limit));
        Self {
            engine,
            scopes: vec![Map::new()],
            environments: env,
            globals,
            registers: Registers::default(),
            strict_variables,
            own_property_only,
            sync,
            deadline: Arc::new(deadline),
            memory: Arc::new(memory),
        }
    }

    /// A context for rendering in isolation, for example a `render` partial.
    ///
    /// The new context sees `scope` as its environment and the same globals.
    /// It shares the render limits of this context but has fresh registers.
    pub fn spawn(&self, scope: Map) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            scopes: vec![Map::new()],
            environments: scope,
            globals: Arc::clone(&self.globals),
            registers: Registers::default(),
            strict_variables: self.strict_variables,
            own_property_only: self.own_property_only,
            sync: self.sync,
            deadline: Arc::clone(&self.deadline),
            memory: Arc::clone(&self.memory),
        }
    }

    pub fn opts(&self) -> &Options {
        &self.engine.options
    }

    pub(crate) fn engine(&self) -> &Arc<Inner> {
        &self.engine
    }

    /// Whether file system access uses the blocking methods.
    pub fn is_sync(&self) -> bool {
        self.sync
    }

    pub fn strict_variables(&self) -> bool {
        self.strict_variables
    }

    pub fn own_property_only(&self) -> bool {
        self.own_property_only
    }

    pub fn memory(&self) -> &Limiter {
        &self.memory
    }

    pub(crate) fn check_deadline(&self) -> Result<()> {
        self.deadline.check()
    }

    pub(crate) fn registers(&self) -> &Registers {
        &self.registers
    }

    pub(crate) fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }

    pub fn push(&mut self, scope: Map) {
        self.scopes.push(scope);
    }

    pub fn pop(&mut self) -> Option<Map> {
        self.scopes.pop()
    }

    /// The innermost scope.
    pub fn top_mut(&mut self) -> &mut Map {
        if self.scopes.is_empty() {
            self.scopes.push(Map::new());
        }
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    /// The outermost scope, where assignments are stored.
    pub fn bottom_mut(&mut self) -> &mut Map {
        if self.scopes.is_empty() {
            self.scopes.push(Map::new());
        }
        &mut self.scopes[0]
    }

    pub fn environments_mut(&mut self) -> &mut Map {
        &mut self.environments
    }

    /// The scope a variable named `key` is read from.
    pub(crate) fn find_scope(&self, key: &str) -> &Map {
        if let Some(scope) = self.scopes.iter().rev().find(|s| s.contains_key(key)) {
            return scope;
        }
        if self.environments.contains_key(key) {
            return &self.environments;
        }
        &self.globals
    }

    /// Returns a top level variable.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.find_scope(key).get(key)
    }

    /// Reads `keys` starting from `root`, or from the scopes when there is no
    /// root.
    ///
    /// Reading from `nil` produces `nil`. With strict variables the first
    /// missing segment ends the lookup as undefined, otherwise undefined
    /// values become `nil`.
    pub(crate) async fn resolve(&mut self, root: Option<Value>, keys: &[Value]) -> Result<Resolved> {
        let mut start = 0;
        let mut current = match root {
            Some(root) => Some(root),
            None => {
                let Some(first) = keys.first() else {
                    return Ok(Resolved::Value(Value::Nil));
                };
                let key = first.to_string();
                start = 1;
                self.find_scope(&key).get(&key).cloned()
            }
        };
        if self.strict_variables && current.is_none() {
            return Ok(Resolved::Undefined(join_path(&keys[..start])));
        }
        for (i, key) in keys.iter().enumerate().skip(start) {
            current = match current {
                None => None,
                Some(v) if v.is_nil() => Some(Value::Nil),
                Some(v) => match v.read_property(key) {
                    Property::Found(v) => Some(v),
                    Property::Missing => None,
                    Property::Super(block) => Some(Value::String(block.render_super(self).await?)),
                },
            };
            if self.strict_variables && current.is_none() {
                return Ok(Resolved::Undefined(join_path(&keys[..=i])));
            }
        }
        Ok(Resolved::Value(current.unwrap_or_default()))
    }
}

fn join_path(keys: &[Value]) -> String {
    keys.iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("scopes", &self.scopes)
            .field("environments", &self.environments)
            .field("registers", &self.registers)
            .field("strict_variables", &self.strict_variables)
            .field("sync", &self.sync)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(env: Value, strict: bool) -> Context {
        let Value::Object(env) = env else {
            panic!("expected object")
        };
        let opts = RenderOptions {
            strict_variables: Some(strict),
            ..Default::default()
        };
        Context::new(Arc::new(Inner::default()), env, &opts, true)
    }

    fn resolve(ctx: &mut Context, path: &[&str]) -> Resolved {
        let keys: Vec<Value> = path.iter().map(|k| Value::from(*k)).collect();
        let fut = ctx.resolve(None, &keys);
        pollster::block_on(fut).unwrap()
    }

    #[test]
    fn scopes_shadow_environment() {
        let mut c = ctx(crate::value! { a: 1, b: 2 }, false);
        c.push(Map::from_iter([(String::from("a"), Value::from(10))]));
        assert_eq!(c.get("a"), Some(&Value::from(10)));
        assert_eq!(c.get("b"), Some(&Value::from(2)));
        c.pop();
        assert_eq!(c.get("a"), Some(&Value::from(1)));
    }

    #[test]
    fn assignments_go_to_bottom() {
        let mut c = ctx(crate::value!({}), false);
        c.push(Map::new());
        c.bottom_mut().insert(String::from("x"), Value::from(1));
        c.pop();
        assert_eq!(c.get("x"), Some(&Value::from(1)));
    }

    #[test]
    fn resolve_nested() {
        let mut c = ctx(crate::value! { user: { name: "Jo", tags: ["a", "b"] } }, false);
        assert!(matches!(
            resolve(&mut c, &["user", "name"]),
            Resolved::Value(Value::String(s)) if s == "Jo"
        ));
        assert!(matches!(
            resolve(&mut c, &["user", "tags", "size"]),
            Resolved::Value(Value::Integer(2))
        ));
        assert!(matches!(
            resolve(&mut c, &["user", "missing", "deeper"]),
            Resolved::Value(Value::Nil)
        ));
    }

    #[test]
    fn resolve_strict() {
        let mut c = ctx(crate::value! { user: { name: nil } }, true);
        assert!(matches!(
            resolve(&mut c, &["user", "missing", "deeper"]),
            Resolved::Undefined(path) if path == "user.missing"
        ));
        assert!(matches!(
            resolve(&mut c, &["nope"]),
            Resolved::Undefined(path) if path == "nope"
        ));
        assert!(matches!(
            resolve(&mut c, &["user", "name", "first"]),
            Resolved::Value(Value::Nil)
        ));
    }

    #[test]
    fn spawn_isolates_scopes() {
        let mut c = ctx(crate::value! { a: 1 }, false);
        c.bottom_mut().insert(String::from("b"), Value::from(2));
        let child = c.spawn(Map::from_iter([(String::from("c"), Value::from(3))]));
        assert_eq!(child.get("a"), None);
        assert_eq!(child.get("b"), None);
        assert_eq!(child.get("c"), Some(&Value::from(3)));
    }
}
