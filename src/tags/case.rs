use crate::compile::{Event, Parser, TokenQueue};
use crate::expr::{equals, eval_token, FilteredValue};
use crate::render::{render_nodes, Context, Emitter};
use crate::tags::TagKind;
use crate::types::template::Node;
use crate::types::token::{ExprToken, TagToken};
use crate::Result;

/// `{% case value %}{% when a, b %}...{% else %}...{% endcase %}`
///
/// Renders the first `when` branch with a value equal to the target, or the
/// `else` branch when none matches. Markup between `case` and the first
/// `when` is ignored.
pub struct Case {
    value: FilteredValue,
    branches: Vec<(Vec<ExprToken>, Vec<Node>)>,
    otherwise: Vec<Node>,
}

enum Target {
    Ignored,
    When,
    Else,
}

pub(super) fn parse(token: &TagToken, queue: &mut TokenQueue, parser: &Parser<'_>) -> Result<TagKind> {
    let value = FilteredValue::new(parser.tokenizer(token).read_filtered_value()?, parser.engine())?;
    let mut branches: Vec<(Vec<ExprToken>, Vec<Node>)> = Vec::new();
    let mut otherwise = Vec::new();
    let mut target = Target::Ignored;

    let mut stream = parser.parse_stream(queue).on_tags(&["when", "else", "endcase"]);
    while let Some(event) = stream.next()? {
        match event {
            Event::Tag(tag) if tag.name == "when" => {
                if matches!(target, Target::Else) {
                    continue;
                }
                branches.push((when_values(&tag, parser)?, Vec::new()));
                target = Target::When;
            }
            Event::Tag(tag) if tag.name == "else" => target = Target::Else,
            Event::Tag(_) => stream.stop(),
            Event::Template(node) => match target {
                Target::Ignored => {}
                Target::When => {
                    if let Some((_, body)) = branches.last_mut() {
                        body.push(node);
                    }
                }
                Target::Else => otherwise.push(node),
            },
        }
    }
    stream.finish(token)?;

    Ok(TagKind::Case(Case {
        value,
        branches,
        otherwise,
    }))
}

/// Values are separated by commas or `or`.
fn when_values(tag: &TagToken, parser: &Parser<'_>) -> Result<Vec<ExprToken>> {
    let mut t = parser.tokenizer(tag);
    let mut values = Vec::new();
    while !t.end() {
        values.push(t.read_value_or_error()?);
        t.skip_blank();
        if !t.eat(",") {
            t.skip_past("or");
        }
    }
    Ok(values)
}

impl Case {
    pub(super) async fn render(&self, ctx: &mut Context, emitter: &mut dyn Emitter) -> Result<()> {
        let lenient = ctx.opts().lenient_if;
        let target = self.value.value(ctx, lenient).await?;
        for (values, body) in &self.branches {
            for value in values {
                let value = eval_token(value, ctx, lenient).await?;
                if equals(&target, &value) {
                    return render_nodes(body, ctx, emitter).await;
                }
            }
        }
        render_nodes(&self.otherwise, ctx, emitter).await
    }
}
