use crate::compile::{Parser, TokenQueue};
use crate::expr::FilteredValue;
use crate::render::Context;
use crate::tags::TagKind;
use crate::types::token::TagToken;
use crate::Result;

/// `{% assign name = value | filters %}`
pub struct Assign {
    key: String,
    value: FilteredValue,
}

pub(super) fn parse(token: &TagToken, _: &mut TokenQueue, parser: &Parser<'_>) -> Result<TagKind> {
    let mut t = parser.tokenizer(token);
    let key = t.read_identifier().text().to_owned();
    if key.is_empty() {
        return Err(t.error("expected variable name"));
    }
    if !t.eat("=") {
        return Err(t.error("expected \"=\""));
    }
    let value = FilteredValue::new(t.read_filtered_value()?, parser.engine())?;
    Ok(TagKind::Assign(Assign { key, value }))
}

impl Assign {
    pub(super) async fn render(&self, ctx: &mut Context) -> Result<()> {
        let lenient = ctx.opts().lenient_if;
        let value = self.value.value(ctx, lenient).await?;
        ctx.bottom_mut().insert(self.key.clone(), value);
        Ok(())
    }
}
