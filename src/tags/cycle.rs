use crate::compile::{Parser, TokenQueue};
use crate::expr::eval_token;
use crate::render::{Context, Emitter};
use crate::tags::TagKind;
use crate::types::token::{ExprToken, TagToken};
use crate::{Error, Result};

/// `{% cycle "odd", "even" %}` or `{% cycle group: "a", "b" %}`
///
/// Each render outputs the next candidate. Occurrences with the same group
/// and candidates share their position.
pub struct Cycle {
    group: Option<ExprToken>,
    candidates: Vec<ExprToken>,
}

pub(super) fn parse(token: &TagToken, _: &mut TokenQueue, parser: &Parser<'_>) -> Result<TagKind> {
    let mut t = parser.tokenizer(token);
    let mut group = None;
    let mut candidates = Vec::new();
    if let Some(first) = t.read_value()? {
        t.skip_blank();
        if t.peek() == Some(':') {
            t.eat(":");
            group = Some(first);
        } else {
            candidates.push(first);
        }
    }
    while !t.end() {
        if let Some(value) = t.read_value()? {
            candidates.push(value);
        }
        t.skip_past(",");
    }
    if candidates.is_empty() {
        return Err(Error::assertion(format!(
            "empty candidates: \"{}\"",
            token.token.text()
        )));
    }
    Ok(TagKind::Cycle(Cycle { group, candidates }))
}

impl Cycle {
    pub(super) async fn render(&self, ctx: &mut Context, emitter: &mut dyn Emitter) -> Result<()> {
        let group = match &self.group {
            Some(group) => eval_token(group, ctx, false).await?.to_string(),
            None => String::new(),
        };
        let candidates: Vec<&str> = self.candidates.iter().map(|c| c.text()).collect();
        let key = format!("cycle:{}:{}", group, candidates.join(","));
        let positions = &mut ctx.registers_mut().cycle;
        let idx = *positions.get(&key).unwrap_or(&0) % self.candidates.len();
        positions.insert(key, (idx + 1) % self.candidates.len());
        let value = eval_token(&self.candidates[idx], ctx, false).await?;
        emitter.write(&value);
        Ok(())
    }
}
