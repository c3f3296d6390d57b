use crate::compile::{Event, Parser, TokenQueue};
use crate::expr::{eval_token, Hash};
use crate::render::{render_nodes, Context, Emitter};
use crate::tags::{syntax_error, TagKind};
use crate::types::template::Node;
use crate::types::token::{ExprToken, TagToken};
use crate::value::{DropValue, ForloopDrop, Map};
use crate::{Result, Value};

const MODIFIERS: [&str; 3] = ["offset", "limit", "reversed"];

/// `{% for item in collection offset: 1 limit: 2 reversed %}...{% else %}...{% endfor %}`
///
/// The modifiers are applied in the order `offset`, `limit`, `reversed`, or
/// in the order they are written with `ordered_filter_parameters` enabled.
/// `offset: continue` resumes where the previous loop over the same
/// collection with the same variable stopped.
pub struct For {
    variable: String,
    collection: ExprToken,
    hash: Hash,
    body: Vec<Node>,
    otherwise: Vec<Node>,
}

pub(super) fn parse(token: &TagToken, queue: &mut TokenQueue, parser: &Parser<'_>) -> Result<TagKind> {
    let mut t = parser.tokenizer(token);
    let variable = t.read_identifier().text().to_owned();
    let keyword = t.read_identifier();
    let collection = t.read_value()?;
    let collection = match collection {
        Some(c) if !variable.is_empty() && keyword.text() == "in" => c,
        _ => {
            let msg = format!("illegal tag: {}", token.token.text());
            return Err(syntax_error(&token.token, msg));
        }
    };
    let hash = Hash::parse(&mut t, &parser.options().key_value_separator)?;

    let mut body = Vec::new();
    let mut otherwise = Vec::new();
    let mut in_else = false;
    let mut stream = parser.parse_stream(queue).on_tags(&["else", "endfor"]);
    while let Some(event) = stream.next()? {
        match event {
            Event::Tag(tag) if tag.name == "else" => in_else = true,
            Event::Tag(_) => stream.stop(),
            Event::Template(node) if in_else => otherwise.push(node),
            Event::Template(node) => body.push(node),
        }
    }
    stream.finish(token)?;

    Ok(TagKind::For(For {
        variable,
        collection,
        hash,
        body,
        otherwise,
    }))
}

impl For {
    pub(super) async fn render(&self, ctx: &mut Context, emitter: &mut dyn Emitter) -> Result<()> {
        let collection = eval_token(&self.collection, ctx, false).await?;
        let mut items = collection.into_enumerable();
        if items.is_empty() {
            return render_nodes(&self.otherwise, ctx, emitter).await;
        }

        let continue_key = format!("continue-{}-{}", self.variable, self.collection.text());
        let resume = ctx
            .registers()
            .for_continue
            .get(&continue_key)
            .map_or(Value::Nil, |&n| Value::from(n));
        ctx.push(Map::from_iter([(String::from("continue"), resume)]));
        let hash = self.hash.render(ctx).await;
        ctx.pop();
        let hash = hash?;

        let modifiers: Vec<&str> = if ctx.opts().ordered_filter_parameters {
            hash.keys()
                .map(String::as_str)
                .filter(|k| MODIFIERS.contains(k))
                .collect()
        } else {
            MODIFIERS
                .into_iter()
                .filter(|k| hash.contains_key(*k))
                .collect()
        };
        for modifier in modifiers {
            items = match modifier {
                "offset" => offset(items, &hash[modifier]),
                "limit" => limit(items, &hash[modifier]),
                _ => reversed(items),
            };
        }

        let start = hash.get("offset").and_then(Value::as_i64).unwrap_or(0).max(0) as usize;
        ctx.registers_mut()
            .for_continue
            .insert(continue_key, start + items.len());

        let mut forloop = ForloopDrop::new(items.len(), self.collection.text(), &self.variable);
        ctx.push(Map::new());
        let mut result = Ok(());
        for item in items {
            let scope = ctx.top_mut();
            scope.insert(String::from("forloop"), Value::Drop(DropValue::Forloop(forloop.clone())));
            scope.insert(self.variable.clone(), item);
            result = render_nodes(&self.body, ctx, emitter).await;
            if result.is_err() {
                break;
            }
            let signal = emitter.signal();
            if signal.broke {
                signal.broke = false;
                break;
            }
            signal.continued = false;
            forloop.next();
        }
        ctx.pop();
        result
    }
}

fn offset(items: Vec<Value>, n: &Value) -> Vec<Value> {
    let n = n.as_i64().unwrap_or(0).max(0) as usize;
    items.into_iter().skip(n).collect()
}

fn limit(items: Vec<Value>, n: &Value) -> Vec<Value> {
    let n = n.as_i64().unwrap_or(0).max(0) as usize;
    items.into_iter().take(n).collect()
}

fn reversed(mut items: Vec<Value>) -> Vec<Value> {
    items.reverse();
    items
}
