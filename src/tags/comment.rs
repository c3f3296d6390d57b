use crate::compile::{Parser, TokenQueue};
use crate::tags::{syntax_error, TagKind};
use crate::types::token::{TagToken, TopLevelToken};
use crate::{Error, Result};

/// `{% # note %}`
pub struct InlineComment;

/// Skips everything up to the matching `endcomment`. Comments nest.
pub(super) fn parse(token: &TagToken, queue: &mut TokenQueue, _: &Parser<'_>) -> Result<TagKind> {
    let mut depth = 1;
    while let Some(next) = queue.pop_front() {
        let TopLevelToken::Tag(tag) = next else {
            continue;
        };
        match tag.name.as_str() {
            "comment" => depth += 1,
            "endcomment" => {
                depth -= 1;
                if depth == 0 {
                    return Ok(TagKind::Comment);
                }
            }
            _ => {}
        }
    }
    let msg = format!("tag {} not closed", token.token.text());
    Err(syntax_error(&token.token, msg))
}

pub(super) fn parse_inline(token: &TagToken, _: &mut TokenQueue, _: &Parser<'_>) -> Result<TagKind> {
    let continued = token.args().lines().skip(1).any(|line| {
        let line = line.trim_start();
        !line.is_empty() && !line.starts_with('#')
    });
    if continued {
        return Err(Error::assertion(
            "every line of an inline comment must start with a '#' character",
        ));
    }
    Ok(TagKind::InlineComment(InlineComment))
}
