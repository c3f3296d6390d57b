use futures::future::BoxFuture;

use crate::compile::{Parser, TokenQueue};
use crate::render::{render_nodes, Context, Emitter};
use crate::tags::TagKind;
use crate::types::template::Node;
use crate::types::token::TagToken;
use crate::Result;

/// `{% liquid %}`: one tag per line without delimiters.
///
/// ```text
/// {% liquid
///   assign n = items | size
///   if n > 0
///     echo n
///   endif
/// %}
/// ```
pub struct Liquid {
    body: Vec<Node>,
}

pub(super) fn parse(token: &TagToken, _: &mut TokenQueue, parser: &Parser<'_>) -> Result<TagKind> {
    let tokens = parser.tokenizer(token).read_liquid_tag_tokens()?;
    let body = parser.parse_tokens(tokens)?;
    Ok(TagKind::Liquid(Liquid { body }))
}

impl Liquid {
    pub(super) fn render<'a>(&'a self, ctx: &'a mut Context, emitter: &'a mut dyn Emitter) -> BoxFuture<'a, Result<()>> {
        render_nodes(&self.body, ctx, emitter)
    }
}
