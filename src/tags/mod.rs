//! Tags: the `{% name args %}` constructs of a template.
//!
//! Every tag is parsed once by a factory registered under its name and
//! rendered on each pass. The builtin tags are the variants of [`TagKind`],
//! anything registered through [`Engine::register_tag`] is a
//! [`TagKind::Custom`] holding a [`Tag`].
//!
//! [`Engine::register_tag`]: crate::Engine::register_tag

mod assign;
mod capture;
mod case;
mod comment;
mod conditional;
mod counter;
mod cycle;
mod echo;
mod for_loop;
mod inheritance;
mod liquid;
mod partial;
mod raw;
mod tablerow;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::{self, BoxFuture};
use futures::FutureExt;

pub use crate::tags::assign::Assign;
pub use crate::tags::capture::Capture;
pub use crate::tags::case::Case;
pub use crate::tags::comment::InlineComment;
pub use crate::tags::conditional::Conditional;
pub use crate::tags::counter::Counter;
pub use crate::tags::cycle::Cycle;
pub use crate::tags::echo::Echo;
pub use crate::tags::for_loop::For;
pub use crate::tags::inheritance::{Block, Layout};
pub use crate::tags::liquid::Liquid;
pub use crate::tags::partial::{Include, Render};
pub use crate::tags::raw::Raw;
pub use crate::tags::tablerow::Tablerow;

use crate::compile::{Event, Parser, TokenQueue, Tokenizer};
use crate::render::{Context, Emitter};
use crate::types::template::Node;
use crate::types::token::{ExprToken, TagToken, Token};
use crate::{Error, ErrorKind, Result};

/// A user defined tag.
///
/// A tag is constructed once per occurrence in a template by the factory
/// given to [`Engine::register_tag`][crate::Engine::register_tag] and then
/// rendered any number of times.
pub trait Tag: Send + Sync {
    fn render<'a>(
        &'a self,
        ctx: &'a mut Context,
        emitter: &'a mut dyn Emitter,
    ) -> BoxFuture<'a, Result<()>>;
}

/// Constructs a tag from its token. The factory may claim further tokens,
/// for example a body, from the queue.
pub type TagFactory =
    Arc<dyn Fn(&TagToken, &mut TokenQueue, &Parser<'_>) -> Result<TagKind> + Send + Sync>;

/// A parsed tag.
pub enum TagKind {
    Assign(Assign),
    Block(Block),
    Break,
    Capture(Capture),
    Case(Case),
    Comment,
    Continue,
    Counter(Counter),
    Cycle(Cycle),
    Echo(Echo),
    For(For),
    If(Conditional),
    Include(Include),
    InlineComment(InlineComment),
    Layout(Layout),
    Liquid(Liquid),
    Raw(Raw),
    Render(Render),
    Tablerow(Tablerow),
    Custom(Box<dyn Tag>),
}

impl TagKind {
    /// Renders the tag.
    pub fn render<'a>(
        &'a self,
        ctx: &'a mut Context,
        emitter: &'a mut dyn Emitter,
    ) -> BoxFuture<'a, Result<()>> {
        match self {
            Self::Assign(t) => t.render(ctx).boxed(),
            Self::Block(t) => t.render(ctx, emitter).boxed(),
            Self::Break => {
                emitter.signal().broke = true;
                future::ready(Ok(())).boxed()
            }
            Self::Capture(t) => t.render(ctx).boxed(),
            Self::Case(t) => t.render(ctx, emitter).boxed(),
            Self::Comment | Self::InlineComment(_) => future::ready(Ok(())).boxed(),
            Self::Continue => {
                emitter.signal().continued = true;
                future::ready(Ok(())).boxed()
            }
            Self::Counter(t) => future::ready(t.render(ctx, emitter)).boxed(),
            Self::Cycle(t) => t.render(ctx, emitter).boxed(),
            Self::Echo(t) => t.render(ctx, emitter).boxed(),
            Self::For(t) => t.render(ctx, emitter).boxed(),
            Self::If(t) => t.render(ctx, emitter).boxed(),
            Self::Include(t) => t.render(ctx, emitter).boxed(),
            Self::Layout(t) => t.render(ctx, emitter).boxed(),
            Self::Liquid(t) => t.render(ctx, emitter),
            Self::Raw(t) => {
                emitter.write_str(t.text());
                future::ready(Ok(())).boxed()
            }
            Self::Render(t) => t.render(ctx, emitter).boxed(),
            Self::Tablerow(t) => t.render(ctx, emitter).boxed(),
            Self::Custom(t) => t.render(ctx, emitter),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Assign(_) => "assign",
            Self::Block(_) => "block",
            Self::Break => "break",
            Self::Capture(_) => "capture",
            Self::Case(_) => "case",
            Self::Comment => "comment",
            Self::Continue => "continue",
            Self::Counter(_) => "counter",
            Self::Cycle(_) => "cycle",
            Self::Echo(_) => "echo",
            Self::For(_) => "for",
            Self::If(_) => "if",
            Self::Include(_) => "include",
            Self::InlineComment(_) => "#",
            Self::Layout(_) => "layout",
            Self::Liquid(_) => "liquid",
            Self::Raw(_) => "raw",
            Self::Render(_) => "render",
            Self::Tablerow(_) => "tablerow",
            Self::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TagKind").field(&self.name()).finish()
    }
}

/// The builtin tags keyed by name.
pub(crate) fn defaults() -> HashMap<String, TagFactory> {
    fn factory<F>(f: F) -> TagFactory
    where
        F: Fn(&TagToken, &mut TokenQueue, &Parser<'_>) -> Result<TagKind> + Send + Sync + 'static,
    {
        Arc::new(f)
    }

    let tags = [
        ("assign", factory(assign::parse)),
        ("block", factory(inheritance::parse_block)),
        ("break", factory(|_, _, _| Ok(TagKind::Break))),
        ("capture", factory(capture::parse)),
        ("case", factory(case::parse)),
        ("comment", factory(comment::parse)),
        ("continue", factory(|_, _, _| Ok(TagKind::Continue))),
        ("cycle", factory(cycle::parse)),
        ("decrement", factory(counter::parse_decrement)),
        ("echo", factory(echo::parse)),
        ("for", factory(for_loop::parse)),
        ("if", factory(conditional::parse_if)),
        ("include", factory(partial::parse_include)),
        ("increment", factory(counter::parse_increment)),
        ("layout", factory(inheritance::parse_layout)),
        ("liquid", factory(liquid::parse)),
        ("raw", factory(raw::parse)),
        ("render", factory(partial::parse_render)),
        ("tablerow", factory(tablerow::parse)),
        ("unless", factory(conditional::parse_unless)),
        ("#", factory(comment::parse_inline)),
    ];
    tags.into_iter()
        .map(|(name, f)| (name.to_owned(), f))
        .collect()
}

////////////////////////////////////////////////////////////////////////////////
// Helpers shared by the builtin tags
////////////////////////////////////////////////////////////////////////////////

/// A parse error pointing at `token`.
fn syntax_error(token: &Token, msg: impl Into<String>) -> Error {
    Error::new(ErrorKind::Parse(msg.into())).with_token(token)
}

/// Parses the body of `tag` up to the closing tag `end`.
fn parse_body(
    tag: &TagToken,
    queue: &mut TokenQueue,
    parser: &Parser<'_>,
    end: &'static [&'static str],
) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    let mut stream = parser.parse_stream(queue).on_tags(end);
    while let Some(event) = stream.next()? {
        match event {
            Event::Tag(_) => stream.stop(),
            Event::Template(node) => nodes.push(node),
        }
    }
    stream.finish(tag)?;
    Ok(nodes)
}

/// Reads an identifier or a quoted string naming a variable.
fn read_variable_name(t: &mut Tokenizer<'_>) -> Option<String> {
    let word = t.read_identifier();
    if !word.text().is_empty() {
        return Some(word.text().to_owned());
    }
    let begin = t.position();
    match t.read_value() {
        Ok(Some(ExprToken::Quoted { value, .. })) => Some(value),
        _ => {
            t.reset(begin);
            None
        }
    }
}
