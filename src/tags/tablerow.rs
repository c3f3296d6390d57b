use crate::compile::{Parser, TokenQueue};
use crate::expr::{eval_token, Hash};
use crate::render::{render_nodes, Context, Emitter};
use crate::tags::{parse_body, syntax_error, TagKind};
use crate::types::template::Node;
use crate::types::token::{ExprToken, TagToken};
use crate::value::{DropValue, Map, TablerowloopDrop};
use crate::{Result, Value};

/// `{% tablerow item in collection cols: 3 offset: 1 limit: 6 %}`
///
/// Wraps each item in a `<td>` and every `cols` items in a `<tr>`.
pub struct Tablerow {
    variable: String,
    collection: ExprToken,
    hash: Hash,
    body: Vec<Node>,
}

pub(super) fn parse(token: &TagToken, queue: &mut TokenQueue, parser: &Parser<'_>) -> Result<TagKind> {
    let mut t = parser.tokenizer(token);
    let variable = t.read_identifier().text().to_owned();
    let keyword = t.read_identifier();
    let collection = match t.read_value()? {
        Some(c) if !variable.is_empty() && keyword.text() == "in" => c,
        _ => {
            let msg = format!("illegal tag: {}", token.token.text());
            return Err(syntax_error(&token.token, msg));
        }
    };
    let hash = Hash::parse(&mut t, &parser.options().key_value_separator)?;
    let body = parse_body(token, queue, parser, &["endtablerow"])?;
    Ok(TagKind::Tablerow(Tablerow {
        variable,
        collection,
        hash,
        body,
    }))
}

impl Tablerow {
    pub(super) async fn render(&self, ctx: &mut Context, emitter: &mut dyn Emitter) -> Result<()> {
        let items = eval_token(&self.collection, ctx, false).await?.into_enumerable();
        let hash = self.hash.render(ctx).await?;
        let number = |key: &str| hash.get(key).and_then(Value::as_i64).map(|n| n.max(0) as usize);

        let offset = number("offset").unwrap_or(0);
        let limit = number("limit").unwrap_or(items.len());
        let items: Vec<Value> = items.into_iter().skip(offset).take(limit).collect();
        let cols = match number("cols") {
            Some(n) if n > 0 => n,
            _ => items.len(),
        };

        let mut tablerowloop =
            TablerowloopDrop::new(items.len(), cols, self.collection.text(), &self.variable);
        let empty = items.is_empty();
        ctx.push(Map::new());
        let mut result = Ok(());
        for item in items {
            let scope = ctx.top_mut();
            scope.insert(
                String::from("tablerowloop"),
                Value::Drop(DropValue::Tablerowloop(tablerowloop.clone())),
            );
            scope.insert(self.variable.clone(), item);
            if tablerowloop.col0() == 0 {
                if tablerowloop.row() != 1 {
                    emitter.write_str("</tr>");
                }
                emitter.write_str(&format!("<tr class=\"row{}\">", tablerowloop.row()));
            }
            emitter.write_str(&format!("<td class=\"col{}\">", tablerowloop.col()));
            result = render_nodes(&self.body, ctx, emitter).await;
            if result.is_err() {
                break;
            }
            emitter.write_str("</td>");
            tablerowloop.next();
        }
        if !empty && result.is_ok() {
            emitter.write_str("</tr>");
        }
        ctx.pop();
        result
    }
}
