//! A Liquid template engine with a shared synchronous and asynchronous
//! render path.
//!
//! # Features
//!
//! ### Syntax
//!
//! - Outputs: `{{ user.name }}`
//! - Conditionals: `{% if user.enabled %} ... {% elsif admin %} ... {% endif %}`
//! - Loops: `{% for user in users limit: 3 %} ... {% else %} ... {% endfor %}`
//! - Partials: `{% include "nested" %}`, `{% render "card" with user %}`
//! - Layouts: `{% layout "base" %}{% block content %} ... {% endblock %}`
//! - Filters: `{{ user.name | replace: "\t", " " | upcase }}`
//! - Whitespace control: `{%- if a -%}` and `{{- a -}}`
//! - Configurable delimiters: `<% if a %>`, `<? a ?>`
//!
//! ### Engine
//!
//! - Every render runs the same code blocking or `async`
//! - Filters, tags and operators are registered at runtime
//! - Render using any [`serde`] serializable values or the [`value!`] macro
//! - Render to a [`String`], a [`Value`] or any [`std::io::Write`] implementor
//! - Parse length, render time and memory limits
//! - Parsed template files are cached with concurrent lookups sharing a
//!   single parse
//!
//! # Getting started
//!
//! Your entry point is the [`Engine`] struct. The engine stores the options,
//! filters, tags and operators. Generally, you only need to construct one
//! engine during the lifetime of a program. It is cheap to clone.
//!
//! ```
//! let engine = tincture::Engine::new();
//! ```
//!
//! Next, [`.parse`][Engine::parse] is used to compile a template.
//!
//! ```
//! # let engine = tincture::Engine::new();
//! let template = engine.parse("Hello {{ user.name }}!")?;
//! # Ok::<(), tincture::Error>(())
//! ```
//!
//! Finally, the template is rendered with [`.render`][Engine::render] which
//! returns a [`Renderer`].
//!
//! ```
//! # let engine = tincture::Engine::new();
//! # let template = engine.parse("Hello {{ user.name }}!")?;
//! let result = engine
//!     .render(&template, tincture::value! { user: { name: "John Smith" } })
//!     .to_string_sync()?;
//! assert_eq!(result, "Hello John Smith!");
//! # Ok::<(), tincture::Error>(())
//! ```
//!
//! # Examples
//!
//! ### Render using structured data
//!
//! Here is the same example as above except using derived data.
//!
//! ```
//! #[derive(serde::Serialize)]
//! struct Data { user: User }
//!
//! #[derive(serde::Serialize)]
//! struct User { name: String }
//!
//! let data = Data { user: User { name: "John Smith".into() } };
//!
//! let result = tincture::Engine::new().parse_and_render_sync("Hello {{ user.name }}", &data)?;
//!
//! assert_eq!(result, "Hello John Smith");
//! # Ok::<(), tincture::Error>(())
//! ```
//!
//! ### Transform data using filters
//!
//! Data can be transformed using registered filters.
//!
//! ```
//! let mut engine = tincture::Engine::new();
//! engine.register_filter("lower", |s: String| s.to_lowercase());
//!
//! let result = engine.parse_and_render_sync(
//!     "Hello {{ value | lower }}",
//!     tincture::value! { value: "WORLD!" },
//! )?;
//!
//! assert_eq!(result, "Hello world!");
//! # Ok::<(), tincture::Error>(())
//! ```
//!
//! See the [`Filter`] trait documentation for more information on filters.
//!
//! ### Render a template using custom delimiters
//!
//! ```
//! let options = tincture::Options::builder()
//!     .tag_delimiters("<%", "%>")
//!     .output_delimiters("<?", "?>")
//!     .build();
//!
//! let result = tincture::Engine::with_options(options)
//!     .parse_and_render_sync("<% if user %>Hello <? user.name ?><% endif %>", tincture::value! {
//!         user: { name: "John Smith" }
//!     })?;
//!
//! assert_eq!(result, "Hello John Smith");
//! # Ok::<(), tincture::Error>(())
//! ```
//!
//! ### Render a template to an `impl io::Write`
//!
//! ```
//! use std::io;
//!
//! let engine = tincture::Engine::new();
//! let template = engine.parse("Hello {{ user.name }}")?;
//!
//! let stdout = io::BufWriter::new(io::stdout());
//! engine
//!     .render(&template, tincture::value! { user: { name: "John Smith" } })
//!     .to_writer(stdout)?;
//! # Ok::<(), tincture::Error>(())
//! ```
//!
//! ### Load templates from files
//!
//! Files are looked up in the `root`, `partials` and `layouts` directories
//! through a [`FileSystem`]. The default reads the local disk, the following
//! example uses an in memory one.
//!
//! ```
//! let mut fs = tincture::MemoryFileSystem::new();
//! fs.insert("/views/page.liquid", "{% render 'title', text: name %}!");
//! fs.insert("/views/title.liquid", "<h1>{{ text }}</h1>");
//!
//! let options = tincture::Options::builder()
//!     .root(["/views"])
//!     .extname(".liquid")
//!     .fs(fs)
//!     .build();
//! let engine = tincture::Engine::with_options(options);
//!
//! let result = engine.render_file_sync("page", tincture::value! { name: "Tincture" })?;
//! assert_eq!(result, "<h1>Tincture</h1>!");
//! # Ok::<(), tincture::Error>(())
//! ```

#[macro_use]
mod macros;

mod compile;
mod error;
mod expr;
mod filters;
mod fs;
mod render;
mod tags;
mod types;
mod value;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

pub use crate::compile::cache::{CacheEntry, LruCache, ParseCache};
pub use crate::compile::{Event, LookupType, ParseStream, Parser, TokenQueue, Tokenizer};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::expr::{equals, eval_token, Expression, FilteredValue, Grammar, Hash, Operator};
pub use crate::filters::{
    ArgError, Filter, FilterArg, FilterArgs, FilterCall, FilterHandler, FilterReturn,
};
pub use crate::fs::{FileSystem, LocalFileSystem, MemoryFileSystem};
pub use crate::render::{
    render_nodes, render_to_string, Context, Emitter, KeepTypeEmitter, Limiter, Renderer, Signal,
    StringEmitter, WriterEmitter,
};
pub use crate::tags::{Tag, TagFactory, TagKind};
pub use crate::types::options::{Cache, Options, OptionsBuilder, OutputEscape, RenderOptions};
pub use crate::types::span::Span;
pub use crate::types::template::{Node, Template};
pub use crate::types::token::{ExprToken, TagToken, Token, TopLevelToken};
pub use crate::value::{to_value, DropValue, Map, Value};

use crate::render::block_on;

/// The parsing and rendering engine.
///
/// Registering a filter, tag or operator only affects templates parsed
/// afterwards. Cloning an engine is cheap, clones share their registries
/// until one of them registers something.
#[derive(Clone, Default)]
pub struct Engine {
    inner: Arc<Inner>,
}

/// The registries and configuration shared by parsers and renderers.
#[derive(Clone)]
pub(crate) struct Inner {
    pub(crate) options: Options,
    pub(crate) operators: IndexMap<String, Arc<Operator>>,
    pub(crate) grammar: Arc<Grammar>,
    pub(crate) filters: HashMap<String, Arc<dyn FilterHandler>>,
    pub(crate) tags: HashMap<String, TagFactory>,
}

impl Default for Inner {
    fn default() -> Self {
        let operators = expr::default_operators();
        let grammar = Arc::new(Grammar::new(&operators));
        #[cfg(feature = "builtins")]
        let filters = filters::builtins::defaults();
        #[cfg(not(feature = "builtins"))]
        let filters = HashMap::new();
        Self {
            options: Options::default(),
            operators,
            grammar,
            filters,
            tags: tags::defaults(),
        }
    }
}

impl Engine {
    /// Construct a new engine with the default options.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a new engine with custom options.
    ///
    /// # Examples
    ///
    /// ```
    /// use tincture::{Engine, Options};
    ///
    /// let options = Options::builder().strict_variables(true).build();
    /// let engine = Engine::with_options(options);
    /// ```
    pub fn with_options(options: Options) -> Self {
        let mut inner = Inner::default();
        inner.options = options;
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Returns the options of this engine.
    #[inline]
    pub fn options(&self) -> &Options {
        &self.inner.options
    }

    fn inner_mut(&mut self) -> &mut Inner {
        Arc::make_mut(&mut self.inner)
    }

    /// Register a typed filter function.
    ///
    /// A filter registered under the name of a builtin replaces it.
    #[inline]
    pub fn register_filter<F, R, A>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Filter<R, A>,
        R: FilterReturn + 'static,
        A: FilterArgs + 'static,
    {
        self.register_filter_handler(name, filters::new(f))
    }

    /// Register an asynchronous filter.
    ///
    /// The filter receives the piped value and the positional arguments.
    /// Rendering such a filter with a `*_sync` method fails unless the
    /// returned future completes immediately.
    pub fn register_async_filter<F, Fut>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn(Value, Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<Value>> + Send + 'static,
    {
        self.register_filter_handler(name, filters::new_async(f))
    }

    /// Register a filter implementing the low level [`FilterHandler`].
    pub fn register_filter_handler(
        &mut self,
        name: &str,
        handler: Arc<dyn FilterHandler>,
    ) -> &mut Self {
        tracing::debug!(filter = name, "register filter");
        self.inner_mut().filters.insert(name.to_owned(), handler);
        self
    }

    /// Register a tag.
    ///
    /// The factory is called once for every occurrence of `{% name ... %}`
    /// while parsing. It may take the tokens of a body from the queue, see
    /// [`Parser::parse_stream`].
    ///
    /// # Examples
    ///
    /// ```
    /// use futures::future::{self, BoxFuture, FutureExt};
    /// use tincture::{Context, Emitter, Engine, Result, Tag};
    ///
    /// struct Hello;
    ///
    /// impl Tag for Hello {
    ///     fn render<'a>(
    ///         &'a self,
    ///         _: &'a mut Context,
    ///         emitter: &'a mut dyn Emitter,
    ///     ) -> BoxFuture<'a, Result<()>> {
    ///         emitter.write_str("hello");
    ///         future::ready(Ok(())).boxed()
    ///     }
    /// }
    ///
    /// let mut engine = Engine::new();
    /// engine.register_tag("hello", |_, _, _| Ok(Hello));
    /// let result = engine.parse_and_render_sync("{% hello %} world", tincture::value!({}))?;
    /// assert_eq!(result, "hello world");
    /// # Ok::<(), tincture::Error>(())
    /// ```
    pub fn register_tag<F, T>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn(&TagToken, &mut TokenQueue, &Parser<'_>) -> Result<T> + Send + Sync + 'static,
        T: Tag + 'static,
    {
        let factory: TagFactory = Arc::new(
            move |token: &TagToken, queue: &mut TokenQueue, parser: &Parser<'_>| {
                f(token, queue, parser).map(|tag| TagKind::Custom(Box::new(tag)))
            },
        );
        tracing::debug!(tag = name, "register tag");
        self.inner_mut().tags.insert(name.to_owned(), factory);
        self
    }

    /// Register an operator for use in conditions.
    ///
    /// An operator with the name of an existing one replaces it.
    ///
    /// # Examples
    ///
    /// ```
    /// use tincture::{Engine, Operator, Value};
    ///
    /// let mut engine = Engine::new();
    /// engine.register_operator(Operator::binary("divides", 2, |l, r, _| {
    ///     match (l.as_i64(), r.as_i64()) {
    ///         (Some(l), Some(r)) if l != 0 => Value::Bool(r % l == 0),
    ///         _ => Value::Bool(false),
    ///     }
    /// }));
    /// let result = engine.parse_and_render_sync("{% if 3 divides 9 %}yes{% endif %}", tincture::value!({}))?;
    /// assert_eq!(result, "yes");
    /// # Ok::<(), tincture::Error>(())
    /// ```
    pub fn register_operator(&mut self, operator: Operator) -> &mut Self {
        let inner = self.inner_mut();
        inner
            .operators
            .insert(operator.name().to_owned(), Arc::new(operator));
        inner.grammar = Arc::new(Grammar::new(&inner.operators));
        self
    }

    /// Parse template source.
    #[inline]
    pub fn parse(&self, source: &str) -> Result<Template> {
        Parser::new(&self.inner).parse(source, None).map(Template::new)
    }

    /// Find, read and parse a template file from the `root` directories.
    pub async fn parse_file(&self, file: &str) -> Result<Template> {
        self.parse_file_impl(file, false).await
    }

    /// Find, read and parse a template file using the blocking file system
    /// methods.
    pub fn parse_file_sync(&self, file: &str) -> Result<Template> {
        block_on(self.parse_file_impl(file, true))
    }

    fn parse_file_impl(
        &self,
        file: &str,
        sync: bool,
    ) -> futures::future::BoxFuture<'static, Result<Template>> {
        compile::parse_file(
            Arc::clone(&self.inner),
            file.to_owned(),
            None,
            LookupType::Root,
            sync,
        )
    }

    /// Prepare to render a template with serializable data.
    ///
    /// The data must serialize to a map or nothing.
    #[inline]
    pub fn render<'render, S>(&'render self, template: &'render Template, data: S) -> Renderer<'render>
    where
        S: Serialize,
    {
        Renderer::new(&self.inner, template, to_value(data))
    }

    /// Prepare to render a template with data that is already a [`Map`].
    #[inline]
    pub fn render_from<'render>(&'render self, template: &'render Template, data: Map) -> Renderer<'render> {
        Renderer::new(&self.inner, template, Ok(Value::Object(data)))
    }

    /// Parse and render a template file.
    pub async fn render_file<S>(&self, file: &str, data: S) -> Result<String>
    where
        S: Serialize,
    {
        let data = to_value(data);
        let template = self.parse_file(file).await?;
        Renderer::new(&self.inner, &template, data).to_string().await
    }

    /// Parse and render a template file without awaiting.
    pub fn render_file_sync<S>(&self, file: &str, data: S) -> Result<String>
    where
        S: Serialize,
    {
        let template = self.parse_file_sync(file)?;
        self.render(&template, data).to_string_sync()
    }

    /// Parse and render template source.
    pub async fn parse_and_render<S>(&self, source: &str, data: S) -> Result<String>
    where
        S: Serialize,
    {
        let data = to_value(data);
        let template = self.parse(source)?;
        Renderer::new(&self.inner, &template, data).to_string().await
    }

    /// Parse and render template source without awaiting.
    pub fn parse_and_render_sync<S>(&self, source: &str, data: S) -> Result<String>
    where
        S: Serialize,
    {
        let template = self.parse(source)?;
        self.render(&template, data).to_string_sync()
    }

    /// Evaluate a single output expression, for example `a.b | upcase`,
    /// against `scope`.
    pub async fn eval_value(&self, source: &str, scope: Map) -> Result<Value> {
        self.eval_value_impl(source, scope, false).await
    }

    /// Evaluate a single output expression without awaiting.
    pub fn eval_value_sync(&self, source: &str, scope: Map) -> Result<Value> {
        block_on(self.eval_value_impl(source, scope, true))
    }

    async fn eval_value_impl(&self, source: &str, scope: Map, sync: bool) -> Result<Value> {
        let input: Arc<str> = Arc::from(source);
        let mut tokenizer = Tokenizer::new(
            &input,
            &self.inner.grammar,
            None,
            Span::from(0..source.len()),
        );
        let value = FilteredValue::new(tokenizer.read_filtered_value()?, &self.inner)?;
        let mut ctx = Context::new(Arc::clone(&self.inner), scope, &RenderOptions::default(), sync);
        value.value(&mut ctx, false).await
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut filters: Vec<_> = self.inner.filters.keys().collect();
        filters.sort();
        let mut tags: Vec<_> = self.inner.tags.keys().collect();
        tags.sort();
        f.debug_struct("Engine")
            .field("options", &self.inner.options)
            .field("operators", &self.inner.operators.keys())
            .field("filters", &filters)
            .field("tags", &tags)
            .finish()
    }
}
