use crate::compile::{Parser, TokenQueue};
use crate::render::{render_to_string, Context};
use crate::tags::{parse_body, read_variable_name, syntax_error, TagKind};
use crate::types::template::Node;
use crate::types::token::TagToken;
use crate::{Result, Value};

/// `{% capture name %}body{% endcapture %}`
///
/// Renders the body into a string and assigns it.
pub struct Capture {
    name: String,
    body: Vec<Node>,
}

pub(super) fn parse(token: &TagToken, queue: &mut TokenQueue, parser: &Parser<'_>) -> Result<TagKind> {
    let mut t = parser.tokenizer(token);
    let Some(name) = read_variable_name(&mut t) else {
        let msg = format!("{} not valid identifier", token.args());
        return Err(syntax_error(&token.token, msg));
    };
    let body = parse_body(token, queue, parser, &["endcapture"])?;
    Ok(TagKind::Capture(Capture { name, body }))
}

impl Capture {
    pub(super) async fn render(&self, ctx: &mut Context) -> Result<()> {
        let html = render_to_string(&self.body, ctx).await?;
        ctx.bottom_mut().insert(self.name.clone(), Value::String(html));
        Ok(())
    }
}
