use crate::compile::{Parser, TokenQueue};
use crate::render::{Context, Emitter};
use crate::tags::TagKind;
use crate::types::token::TagToken;
use crate::{Result, Value};

/// `{% increment name %}` and `{% decrement name %}`
///
/// Counters live in the environment, separate from variables created by
/// `assign`, and start at zero. `increment` outputs the value before adding
/// one, `decrement` the value after subtracting one.
pub struct Counter {
    name: String,
    step: i64,
}

pub(super) fn parse_increment(token: &TagToken, _: &mut TokenQueue, parser: &Parser<'_>) -> Result<TagKind> {
    Ok(TagKind::Counter(Counter::new(token, parser, 1)))
}

pub(super) fn parse_decrement(token: &TagToken, _: &mut TokenQueue, parser: &Parser<'_>) -> Result<TagKind> {
    Ok(TagKind::Counter(Counter::new(token, parser, -1)))
}

impl Counter {
    fn new(token: &TagToken, parser: &Parser<'_>, step: i64) -> Self {
        let name = parser.tokenizer(token).read_identifier().text().to_owned();
        Self { name, step }
    }

    pub(super) fn render(&self, ctx: &mut Context, emitter: &mut dyn Emitter) -> Result<()> {
        let env = ctx.environments_mut();
        let current = match env.get(&self.name) {
            Some(Value::Integer(i)) => *i,
            Some(Value::Float(f)) => *f as i64,
            _ => 0,
        };
        let next = current.saturating_add(self.step);
        env.insert(self.name.clone(), Value::Integer(next));
        let shown = if self.step > 0 { current } else { next };
        emitter.write(&Value::Integer(shown));
        Ok(())
    }
}
