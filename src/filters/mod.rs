mod args;
#[cfg(feature = "builtins")]
pub(crate) mod builtins;

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use futures::future::{self, BoxFuture};
use futures::FutureExt;

pub use crate::filters::args::{ArgError, FilterArg};
use crate::render::Context;
use crate::{Error, Result, Value};

/// The input of a single filter application.
pub struct FilterCall<'a> {
    /// The piped value.
    pub input: Value,
    /// Positional arguments in order.
    pub args: Vec<Value>,
    /// Named `key: value` arguments in order.
    pub named: Vec<(String, Value)>,
    /// The context the filter is applied in.
    pub context: &'a Context,
}

impl FilterCall<'_> {
    /// Returns the last named argument called `key`.
    pub fn named(&self, key: &str) -> Option<&Value> {
        self.named.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// The lowest level filter interface.
///
/// Most filters are better written as plain functions, see [`Filter`].
/// Implement this trait directly when a filter needs named arguments or
/// access to the render context.
pub trait FilterHandler: Send + Sync {
    fn call<'a>(&'a self, call: FilterCall<'a>) -> BoxFuture<'a, Result<Value>>;
}

/// Wraps a typed filter function.
pub fn new<F, R, A>(f: F) -> Arc<dyn FilterHandler>
where
    F: Filter<R, A>,
    R: FilterReturn + 'static,
    A: FilterArgs + 'static,
{
    Arc::new(TypedFilter {
        f,
        _marker: PhantomData,
    })
}

/// Wraps an asynchronous filter function.
pub fn new_async<F, Fut>(f: F) -> Arc<dyn FilterHandler>
where
    F: Fn(Value, Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    Arc::new(AsyncFilter(f))
}

struct TypedFilter<F, R, A> {
    f: F,
    _marker: PhantomData<fn(A) -> R>,
}

impl<F, R, A> FilterHandler for TypedFilter<F, R, A>
where
    F: Filter<R, A>,
    R: FilterReturn + 'static,
    A: FilterArgs + 'static,
{
    fn call<'a>(&'a self, call: FilterCall<'a>) -> BoxFuture<'a, Result<Value>> {
        let result = A::from_call(call).and_then(|args| self.f.filter(args).to_value());
        future::ready(result).boxed()
    }
}

struct AsyncFilter<F>(F);

impl<F, Fut> FilterHandler for AsyncFilter<F>
where
    F: Fn(Value, Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    fn call<'a>(&'a self, call: FilterCall<'a>) -> BoxFuture<'a, Result<Value>> {
        (self.0)(call.input, call.args).boxed()
    }
}

/// Represents any typed filter function.
///
/// This trait is used by [`Engine::register_filter`][crate::Engine::register_filter]
/// to abstract over functions and closures with different argument types,
/// return types and arity. The first argument receives the piped value and
/// up to four more arguments receive the positional filter arguments. A
/// missing argument is passed as `nil`, so `Option<T>` is the natural type
/// for optional arguments. Passing more arguments than the function takes
/// is an error.
///
/// [`Filter`] is implemented for functions that return any of the following
/// types.
///
/// - `R` where `R` implements `Into<Value>`
/// - `Result<R>` where `R` implements `Into<Value>`
///
/// [`Filter`] is implemented for functions that take any of the following
/// owned types as arguments.
/// - [`bool`]
/// - [`i64`]
/// - [`f64`]
/// - [`String`]
/// - [`Vec<Value>`]
/// - [`Map`][crate::Map]
/// - [`Value`]
/// - `Option<T>` of any of the above
///
/// ## Examples
///
/// Consider the following template.
///
/// ```text
/// {{ user.name | shout: 3 }}
/// ```
///
/// We could implement the `shout` filter like this:
///
/// ```rust
/// let mut engine = tincture::Engine::new();
/// engine.register_filter("shout", shout);
///
/// fn shout(s: String, times: Option<i64>) -> String {
///     let bangs = "!".repeat(times.unwrap_or(1).max(0) as usize);
///     format!("{}{}", s.to_uppercase(), bangs)
/// }
/// ```
pub trait Filter<R, A>: Send + Sync + 'static {
    #[doc(hidden)]
    fn filter(&self, args: A) -> R;
}

/// Converts the input of a filter call into typed arguments.
pub trait FilterArgs: Sized {
    fn from_call(call: FilterCall<'_>) -> Result<Self>;
}

/// Converts the result of a typed filter into a value.
pub trait FilterReturn {
    fn to_value(self) -> Result<Value>;
}

////////////////////////////////////////////////////////////////////////////////
// Filter
////////////////////////////////////////////////////////////////////////////////

macro_rules! impl_filter {
    ($n:literal; $($arg:ident $var:ident)*) => {
        impl<Func, R, V, $($arg,)*> Filter<R, (V, $($arg,)*)> for Func
        where
            Func: Fn(V, $($arg,)*) -> R + Send + Sync + 'static,
            R: FilterReturn,
            V: FilterArg,
            $($arg: FilterArg,)*
        {
            #[doc(hidden)]
            fn filter(&self, (v, $($var,)*): (V, $($arg,)*)) -> R {
                self(v, $($var,)*)
            }
        }

        impl<V, $($arg,)*> FilterArgs for (V, $($arg,)*)
        where
            V: FilterArg,
            $($arg: FilterArg,)*
        {
            #[allow(unused_mut, unused_variables)]
            fn from_call(call: FilterCall<'_>) -> Result<Self> {
                if call.args.len() > $n {
                    return Err(Error::filter(format!(
                        "filter expected {} arguments, found {}",
                        $n,
                        call.args.len()
                    )));
                }
                let v = V::from_value(call.input).map_err(err_expected_val)?;
                let mut args = call.args.into_iter();
                $(
                    let $var = $arg::from_value(args.next().unwrap_or_default())
                        .map_err(err_expected_arg)?;
                )*
                Ok((v, $($var,)*))
            }
        }
    };
}

impl_filter! { 0; }
impl_filter! { 1; A a }
impl_filter! { 2; A a B b }
impl_filter! { 3; A a B b C c }
impl_filter! { 4; A a B b C c D d }

fn err_expected_arg(err: ArgError) -> Error {
    let ArgError::Type(exp, got) = err;
    Error::filter(format!("filter expected {} argument, found {}", exp, got))
}

fn err_expected_val(err: ArgError) -> Error {
    let ArgError::Type(exp, got) = err;
    Error::filter(format!("filter expected {} value, found {}", exp, got))
}

////////////////////////////////////////////////////////////////////////////////
// FilterReturn
////////////////////////////////////////////////////////////////////////////////

impl<T> FilterReturn for T
where
    T: Into<Value>,
{
    fn to_value(self) -> Result<Value> {
        Ok(self.into())
    }
}

impl<T> FilterReturn for Result<T>
where
    T: Into<Value>,
{
    fn to_value(self) -> Result<Value> {
        self.map(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::options::RenderOptions;
    use crate::value::Map;
    use crate::Inner;

    fn call(handler: &Arc<dyn FilterHandler>, input: Value, args: Vec<Value>) -> Result<Value> {
        let ctx = Context::new(Arc::new(Inner::default()), Map::new(), &RenderOptions::default(), true);
        let call = FilterCall {
            input,
            args,
            named: Vec::new(),
            context: &ctx,
        };
        pollster::block_on(handler.call(call))
    }

    #[test]
    fn typed_filter_arguments() {
        let f = new(|s: String, n: i64| s.repeat(n as usize));
        assert_eq!(call(&f, "ab".into(), vec![2.into()]).unwrap(), Value::from("abab"));
        assert_eq!(call(&f, "ab".into(), vec!["3".into()]).unwrap(), Value::from("ababab"));
    }

    #[test]
    fn typed_filter_missing_argument_is_nil() {
        let f = new(|s: String, suffix: Option<String>| s + &suffix.unwrap_or_default());
        assert_eq!(call(&f, "a".into(), vec![]).unwrap(), Value::from("a"));
    }

    #[test]
    fn typed_filter_too_many_arguments() {
        let f = new(|v: Value| v);
        let err = call(&f, Value::Nil, vec![1.into()]).unwrap_err();
        assert_eq!(err.to_string(), "filter expected 0 arguments, found 1");
    }

    #[test]
    fn typed_filter_type_error() {
        let f = new(|v: Vec<Value>, n: i64| v.len() as i64 + n);
        let err = call(&f, Value::Nil, vec![vec![1].into()]).unwrap_err();
        assert_eq!(err.to_string(), "filter expected integer argument, found array");
    }

    #[test]
    fn typed_filter_result() {
        let f = new(|_: Value| -> Result<Value> { Err(Error::filter("nope")) });
        assert_eq!(call(&f, Value::Nil, vec![]).unwrap_err().to_string(), "nope");
    }

    #[test]
    fn async_filter() {
        let f = new_async(|v: Value, args: Vec<Value>| async move {
            Ok(Value::from(format!("{}{}", v, args.len())))
        });
        assert_eq!(call(&f, "x".into(), vec![Value::Nil]).unwrap(), Value::from("x1"));
    }
}
