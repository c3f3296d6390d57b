mod context;
mod emitter;
mod limiter;
mod registers;

use std::future::Future;
use std::io;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

pub use crate::render::context::Context;
pub(crate) use crate::render::context::Resolved;
pub use crate::render::emitter::{Emitter, KeepTypeEmitter, Signal, StringEmitter, WriterEmitter};
pub use crate::render::limiter::Limiter;
pub(crate) use crate::render::registers::{block_render, BlockMode, BlockRender};
use crate::types::options::RenderOptions;
use crate::types::template::{Node, Template};
use crate::value::Map;
use crate::{Error, ErrorKind, Inner, Result, Value};

/// A renderer that interprets a compiled [`Template`].
///
/// This struct is created by [`Engine::render`][crate::Engine::render] and
/// [`Engine::render_from`][crate::Engine::render_from]. Every output method
/// exists as an `async` function and a blocking `_sync` twin. Both run the
/// same code, the blocking version fails with a pending error if a
/// collaborator such as an asynchronous filter does not complete
/// immediately.
#[must_use = "must call one of the `.to_*()` methods on the renderer"]
pub struct Renderer<'render> {
    engine: &'render Arc<Inner>,
    template: &'render Template,
    data: Result<Map>,
    options: RenderOptions,
}

impl<'render> Renderer<'render> {
    pub(crate) fn new(engine: &'render Arc<Inner>, template: &'render Template, data: Result<Value>) -> Self {
        Self {
            engine,
            template,
            data: data.and_then(into_env),
            options: RenderOptions::default(),
        }
    }

    /// Override engine options for this render only.
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Render the template to a string.
    pub async fn to_string(self) -> Result<String> {
        let mut emitter = StringEmitter::new();
        self.emit(&mut emitter, false).await?;
        Ok(emitter.into_string())
    }

    /// Render the template to a string without awaiting.
    pub fn to_string_sync(self) -> Result<String> {
        let mut emitter = StringEmitter::new();
        block_on(self.emit(&mut emitter, true))?;
        Ok(emitter.into_string())
    }

    /// Render the template to a value.
    ///
    /// With `keep_output_type` enabled a template consisting of a single
    /// output keeps the type of that output, otherwise this is the string
    /// rendering.
    pub async fn to_value(self) -> Result<Value> {
        if self.engine.options.keep_output_type {
            let mut emitter = KeepTypeEmitter::new();
            self.emit(&mut emitter, false).await?;
            Ok(emitter.into_value())
        } else {
            self.to_string().await.map(Value::String)
        }
    }

    /// Render the template to a value without awaiting.
    pub fn to_value_sync(self) -> Result<Value> {
        if self.engine.options.keep_output_type {
            let mut emitter = KeepTypeEmitter::new();
            block_on(self.emit(&mut emitter, true))?;
            Ok(emitter.into_value())
        } else {
            self.to_string_sync().map(Value::String)
        }
    }

    /// Render the template to the given writer without awaiting.
    pub fn to_writer<W>(self, w: W) -> Result<()>
    where
        W: io::Write + Send,
    {
        let mut emitter = WriterEmitter::new(w);
        let result = block_on(self.emit(&mut emitter, true));
        match emitter.take_err() {
            Some(err) => Err(Error::new(ErrorKind::Io(err.to_string()))),
            None => result,
        }
    }

    async fn emit(self, emitter: &mut dyn Emitter, sync: bool) -> Result<()> {
        let env = self.data?;
        tracing::debug!(sync, nodes = self.template.nodes().len(), "render template");
        let mut ctx = Context::new(Arc::clone(self.engine), env, &self.options, sync);
        render_nodes(self.template.nodes(), &mut ctx, emitter).await
    }
}

fn into_env(data: Value) -> Result<Map> {
    match data {
        Value::Object(map) => Ok(map),
        Value::Nil => Ok(Map::new()),
        other => Err(Error::new(ErrorKind::Serialize(format!(
            "render data must be an object, found {}",
            other.human()
        )))),
    }
}

/// Renders a list of nodes in order.
///
/// The render time limit is checked before every node. Rendering stops
/// early when a `break` or `continue` has been signalled. With
/// `catch_all_errors` enabled the failing nodes are skipped and their errors
/// returned together once every node has been visited.
pub fn render_nodes<'a>(
    nodes: &'a [Node],
    ctx: &'a mut Context,
    emitter: &'a mut dyn Emitter,
) -> BoxFuture<'a, Result<()>> {
    async move {
        let mut errors = Vec::new();
        for node in nodes {
            ctx.check_deadline()?;
            if let Err(err) = render_node(node, ctx, emitter).await {
                let err = err.into_render_error(node.token());
                if !ctx.opts().catch_all_errors {
                    return Err(err);
                }
                errors.push(err);
            }
            if emitter.signal().is_set() {
                break;
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::multiple(errors))
        }
    }
    .boxed()
}

async fn render_node(node: &Node, ctx: &mut Context, emitter: &mut dyn Emitter) -> Result<()> {
    match node {
        Node::Html(html) => {
            emitter.write_str(html.value());
            Ok(())
        }
        Node::Output { value, .. } => {
            let value = value.value(ctx, false).await?;
            emitter.write(&value);
            Ok(())
        }
        Node::Tag { token, tag } => {
            tracing::trace!(tag = %token.name, "render tag");
            tag.render(ctx, emitter).await
        }
    }
}

/// Renders nodes into a string, as used by `capture` and `block`.
pub async fn render_to_string(nodes: &[Node], ctx: &mut Context) -> Result<String> {
    let mut emitter = StringEmitter::new();
    render_nodes(nodes, ctx, &mut emitter).await?;
    Ok(emitter.into_string())
}

/// Drives a future that is expected to complete without waiting.
pub(crate) fn block_on<F, T>(fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    fut.now_or_never().unwrap_or_else(|| Err(Error::pending()))
}
