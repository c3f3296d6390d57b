use std::sync::Arc;

use futures::future;
use futures::FutureExt;

use crate::compile::{self, LookupType, Parser, TokenQueue};
use crate::expr::Hash;
use crate::render::{block_render, render_nodes, render_to_string, BlockMode, BlockRender, Context, Emitter};
use crate::tags::partial::{parse_file_path, render_file_path, FilePath};
use crate::tags::{syntax_error, TagKind};
use crate::types::template::Template;
use crate::types::token::{TagToken, TopLevelToken};
use crate::value::{BlockDrop, DropValue, Map};
use crate::{Result, Value};

/// `{% layout "file" key: value %}`
///
/// Claims the rest of the template. The `block` tags in it are recorded
/// and the layout file is rendered with them; everything else in the
/// template becomes the anonymous block. `{% layout none %}` renders the
/// rest of the template as is.
pub struct Layout {
    file: FilePath,
    current: Option<String>,
    args: Hash,
    body: Template,
}

pub(super) fn parse_layout(token: &TagToken, queue: &mut TokenQueue, parser: &Parser<'_>) -> Result<TagKind> {
    let mut t = parser.tokenizer(token);
    let file = parse_file_path(&mut t, parser, token)?;
    let args = Hash::parse(&mut t, &parser.options().key_value_separator)?;
    let rest: Vec<TopLevelToken> = queue.drain(..).collect();
    let body = Template::new(parser.parse_tokens(rest)?);
    Ok(TagKind::Layout(Layout {
        file,
        current: token.file().map(|f| f.to_string()),
        args,
        body,
    }))
}

impl Layout {
    pub(super) async fn render(&self, ctx: &mut Context, emitter: &mut dyn Emitter) -> Result<()> {
        let Some(file) = render_file_path(&self.file, ctx).await? else {
            ctx.registers_mut().block_mode = BlockMode::Output;
            return render_nodes(self.body.nodes(), ctx, emitter).await;
        };
        let layout = compile::parse_file(
            Arc::clone(ctx.engine()),
            file,
            self.current.clone(),
            LookupType::Layouts,
            ctx.is_sync(),
        )
        .await?;

        ctx.registers_mut().block_mode = BlockMode::Store;
        let html = render_to_string(self.body.nodes(), ctx).await?;
        let registers = ctx.registers_mut();
        registers.blocks.entry(String::new()).or_insert_with(|| {
            block_render(move |_, _, emitter| {
                emitter.write_str(&html);
                future::ready(Ok(())).boxed()
            })
        });
        registers.block_mode = BlockMode::Output;

        let scope = self.args.render(ctx).await?;
        ctx.push(scope);
        let result = render_nodes(layout.nodes(), ctx, emitter).await;
        ctx.pop();
        result
    }
}

/// `{% block name %}default{% endblock %}`
///
/// Inside a template with a layout the block is recorded, in the layout it
/// renders the child's version of the block if there is one. The body can
/// render the parent version through `block.super`.
pub struct Block {
    name: String,
    body: Template,
}

pub(super) fn parse_block(token: &TagToken, queue: &mut TokenQueue, parser: &Parser<'_>) -> Result<TagKind> {
    let name: String = token
        .args()
        .chars()
        .skip_while(|c| !is_word(*c))
        .take_while(|c| is_word(*c))
        .collect();
    let mut nodes = Vec::new();
    while let Some(next) = queue.pop_front() {
        if let TopLevelToken::Tag(tag) = &next {
            if tag.name == "endblock" {
                let body = Template::new(nodes);
                return Ok(TagKind::Block(Block { name, body }));
            }
        }
        nodes.push(parser.parse_token(next, queue)?);
    }
    let msg = format!("tag {} not closed", token.token.text());
    Err(syntax_error(&token.token, msg))
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl Block {
    pub(super) async fn render(&self, ctx: &mut Context, emitter: &mut dyn Emitter) -> Result<()> {
        let render = self.block_render(ctx);
        if ctx.registers().block_mode == BlockMode::Store {
            ctx.registers_mut().blocks.insert(self.name.clone(), render);
            return Ok(());
        }
        (render.as_ref())(ctx, BlockDrop::default(), emitter).await
    }

    /// This block's body, wrapped by the child's version when a child
    /// template defined one.
    fn block_render(&self, ctx: &Context) -> BlockRender {
        let body = self.body.clone();
        let current = block_render(move |ctx, parent, emitter| {
            let body = body.clone();
            async move {
                let block = Value::Drop(DropValue::Block(parent));
                ctx.push(Map::from_iter([(String::from("block"), block)]));
                let result = render_nodes(body.nodes(), ctx, emitter).await;
                ctx.pop();
                result
            }
            .boxed()
        });
        let Some(child) = ctx.registers().blocks.get(&self.name) else {
            return current;
        };
        let child = Arc::clone(child);
        block_render(move |ctx, parent, emitter| {
            let current = Arc::clone(&current);
            let parent = BlockDrop::new(move |ctx, emitter| (current.as_ref())(ctx, parent.clone(), emitter));
            (child.as_ref())(ctx, parent, emitter)
        })
    }
}
