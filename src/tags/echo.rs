use crate::compile::{Parser, TokenQueue};
use crate::expr::FilteredValue;
use crate::render::{Context, Emitter};
use crate::tags::TagKind;
use crate::types::token::TagToken;
use crate::Result;

/// `{% echo value | filters %}`, the tag form of an output.
pub struct Echo {
    value: Option<FilteredValue>,
}

pub(super) fn parse(token: &TagToken, _: &mut TokenQueue, parser: &Parser<'_>) -> Result<TagKind> {
    let mut t = parser.tokenizer(token);
    t.skip_blank();
    if t.end() {
        return Ok(TagKind::Echo(Echo { value: None }));
    }
    let mut value = FilteredValue::new(t.read_filtered_value()?, parser.engine())?;
    if let Some(name) = parser.options().output_escape.filter_name() {
        value.escape_with(name, parser.engine())?;
    }
    Ok(TagKind::Echo(Echo { value: Some(value) }))
}

impl Echo {
    pub(super) async fn render(&self, ctx: &mut Context, emitter: &mut dyn Emitter) -> Result<()> {
        if let Some(value) = &self.value {
            let value = value.value(ctx, false).await?;
            emitter.write(&value);
        }
        Ok(())
    }
}
