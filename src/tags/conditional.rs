use crate::compile::{Event, Parser, TokenQueue};
use crate::expr::FilteredValue;
use crate::render::{render_nodes, Context, Emitter};
use crate::tags::{syntax_error, TagKind};
use crate::types::template::Node;
use crate::types::token::TagToken;
use crate::{Error, Result};

/// `{% if %}` and `{% unless %}` with any number of `elsif` branches and an
/// optional `else`.
///
/// The first branch whose condition holds is rendered. For `unless` the
/// first condition is negated, the `elsif` branches are not.
pub struct Conditional {
    negate_first: bool,
    branches: Vec<Branch>,
    otherwise: Option<Vec<Node>>,
}

struct Branch {
    condition: FilteredValue,
    body: Vec<Node>,
}

pub(super) fn parse_if(token: &TagToken, queue: &mut TokenQueue, parser: &Parser<'_>) -> Result<TagKind> {
    parse(token, queue, parser, false, &["elsif", "else", "endif"])
}

pub(super) fn parse_unless(token: &TagToken, queue: &mut TokenQueue, parser: &Parser<'_>) -> Result<TagKind> {
    parse(token, queue, parser, true, &["elsif", "else", "endunless"])
}

fn parse(
    token: &TagToken,
    queue: &mut TokenQueue,
    parser: &Parser<'_>,
    negate_first: bool,
    watched: &'static [&'static str],
) -> Result<TagKind> {
    let mut branches = vec![Branch {
        condition: condition(token, parser)?,
        body: Vec::new(),
    }];
    let mut otherwise: Option<Vec<Node>> = None;

    let mut stream = parser.parse_stream(queue).on_tags(watched);
    while let Some(event) = stream.next()? {
        match event {
            Event::Tag(tag) if tag.name == "elsif" => {
                if otherwise.is_some() {
                    return Err(syntax_error(&tag.token, "unexpected elsif after else"));
                }
                branches.push(Branch {
                    condition: condition(&tag, parser)?,
                    body: Vec::new(),
                });
            }
            Event::Tag(tag) if tag.name == "else" => {
                if otherwise.is_some() {
                    return Err(Error::assertion("duplicated else"));
                }
                otherwise = Some(Vec::new());
            }
            Event::Tag(_) => stream.stop(),
            Event::Template(node) => match (&mut otherwise, branches.last_mut()) {
                (Some(body), _) | (None, Some(Branch { body, .. })) => body.push(node),
                (None, None) => {}
            },
        }
    }
    stream.finish(token)?;

    Ok(TagKind::If(Conditional {
        negate_first,
        branches,
        otherwise,
    }))
}

fn condition(tag: &TagToken, parser: &Parser<'_>) -> Result<FilteredValue> {
    let token = parser.tokenizer(tag).read_filtered_value()?;
    FilteredValue::new(token, parser.engine())
}

impl Conditional {
    pub(super) async fn render(&self, ctx: &mut Context, emitter: &mut dyn Emitter) -> Result<()> {
        let lenient = ctx.opts().lenient_if;
        let js_truthy = ctx.opts().js_truthy();
        for (i, branch) in self.branches.iter().enumerate() {
            let value = branch.condition.value(ctx, lenient).await?;
            let negate = i == 0 && self.negate_first;
            if value.is_truthy(js_truthy) != negate {
                return render_nodes(&branch.body, ctx, emitter).await;
            }
        }
        match &self.otherwise {
            Some(body) => render_nodes(body, ctx, emitter).await,
            None => Ok(()),
        }
    }
}
