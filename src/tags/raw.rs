use crate::compile::{Parser, TokenQueue};
use crate::tags::{syntax_error, TagKind};
use crate::types::token::{TagToken, TopLevelToken};
use crate::Result;

/// `{% raw %}text{% endraw %}`, output verbatim.
pub struct Raw {
    text: String,
}

impl Raw {
    pub(super) fn text(&self) -> &str {
        &self.text
    }
}

pub(super) fn parse(token: &TagToken, queue: &mut TokenQueue, _: &Parser<'_>) -> Result<TagKind> {
    let mut text = String::new();
    while let Some(next) = queue.pop_front() {
        match next {
            TopLevelToken::Tag(tag) if tag.name == "endraw" => {
                return Ok(TagKind::Raw(Raw { text }));
            }
            TopLevelToken::Html(html) => text.push_str(html.value()),
            other => text.push_str(other.token().text()),
        }
    }
    let msg = format!("tag {} not closed", token.token.text());
    Err(syntax_error(&token.token, msg))
}
