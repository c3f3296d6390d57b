use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::expr::{eval_token, Expression};
use crate::filters::{FilterCall, FilterHandler};
use crate::render::Context;
use crate::types::token::{FilterArgToken, FilterToken, FilteredValueToken, Token};
use crate::{Error, Inner, Result, Value};

/// A filter application within a [`FilteredValue`].
///
/// A filter whose name is not registered passes its input through unchanged.
#[derive(Clone)]
pub struct Filter {
    name: String,
    handler: Option<Arc<dyn FilterHandler>>,
    args: Vec<FilterArgToken>,
    token: Option<Token>,
}

impl Filter {
    pub(crate) fn new(token: FilterToken, engine: &Inner) -> Result<Self> {
        let handler = engine.filters.get(&token.name).cloned();
        if handler.is_none() && engine.options.strict_filters {
            return Err(Error::assertion(format!("undefined filter: {}", token.name)));
        }
        Ok(Self {
            name: token.name,
            handler,
            args: token.args,
            token: Some(token.token),
        })
    }

    /// A filter without arguments, used for output escaping.
    pub(crate) fn named(name: &str, engine: &Inner) -> Result<Self> {
        let handler = engine.filters.get(name).cloned();
        if handler.is_none() && engine.options.strict_filters {
            return Err(Error::assertion(format!("undefined filter: {}", name)));
        }
        Ok(Self {
            name: name.to_owned(),
            handler,
            args: Vec::new(),
            token: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    async fn render(&self, input: Value, ctx: &mut Context) -> Result<Value> {
        let Some(handler) = &self.handler else {
            return Ok(input);
        };
        let mut args = Vec::new();
        let mut named = Vec::new();
        for arg in &self.args {
            match arg {
                FilterArgToken::Positional(token) => args.push(eval_token(token, ctx, false).await?),
                FilterArgToken::Named(key, value) => {
                    let value = match value {
                        Some(token) => eval_token(token, ctx, false).await?,
                        None => Value::Nil,
                    };
                    named.push((key.clone(), value));
                }
            }
        }
        tracing::trace!(filter = %self.name, args = args.len(), "apply filter");
        let call = FilterCall {
            input,
            args,
            named,
            context: &*ctx,
        };
        let result = handler.call(call).await;
        let value = match (result, &self.token) {
            (Ok(value), _) => value,
            (Err(err), Some(token)) => return Err(err.into_render_error(token)),
            (Err(err), None) => return Err(err),
        };
        ctx.memory().use_(allocation(&value))?;
        Ok(value)
    }
}

impl std::fmt::Debug for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Filter")
            .field("name", &self.name)
            .field("registered", &self.handler.is_some())
            .field("args", &self.args)
            .finish()
    }
}

/// The size a filter result is charged against the memory limit.
fn allocation(value: &Value) -> u64 {
    let n = match value {
        Value::String(s) => s.len(),
        Value::Array(a) => a.len(),
        Value::Object(o) => o.len(),
        _ => 0,
    };
    n as u64
}

/// An expression followed by any number of filters, as found in outputs and
/// in the arguments of `assign`, `echo`, `if` and friends.
#[derive(Debug, Clone)]
pub struct FilteredValue {
    initial: Expression,
    filters: Vec<Filter>,
}

impl FilteredValue {
    pub(crate) fn new(token: FilteredValueToken, engine: &Inner) -> Result<Self> {
        let filters = token
            .filters
            .into_iter()
            .map(|f| Filter::new(f, engine))
            .collect::<Result<_>>()?;
        Ok(Self {
            initial: Expression::new(token.initial),
            filters,
        })
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Appends the output escape filter unless the last filter is `raw`.
    pub(crate) fn escape_with(&mut self, name: &str, engine: &Inner) -> Result<()> {
        if self.filters.last().map_or(false, |f| f.name == "raw") {
            return Ok(());
        }
        self.filters.push(Filter::named(name, engine)?);
        Ok(())
    }

    /// Evaluates the expression and applies each filter in turn.
    pub fn value<'a>(&'a self, ctx: &'a mut Context, lenient: bool) -> BoxFuture<'a, Result<Value>> {
        async move {
            let lenient = lenient
                || (ctx.opts().lenient_if
                    && self.filters.first().map_or(false, |f| f.name == "default"));
            let mut value = self.initial.evaluate(ctx, lenient).await?;
            for filter in &self.filters {
                value = filter.render(value, ctx).await?;
            }
            Ok(value)
        }
        .boxed()
    }
}
