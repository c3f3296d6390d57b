//! Whitespace control applied to top level tokens.
//!
//! A `-` just inside a delimiter trims the neighbouring markup. Greedy
//! trimming removes all blanks including newlines, otherwise only inline
//! blanks and a single trailing newline are removed on the right.

use std::sync::Arc;

use crate::compile::chars::{class, BLANK, INLINE_BLANK};
use crate::types::token::{HtmlToken, TopLevelToken};

pub(crate) fn control(tokens: &mut [TopLevelToken], greedy: bool) {
    let mask = if greedy { BLANK } else { INLINE_BLANK };
    let mut in_raw = false;
    for i in 0..tokens.len() {
        if !tokens[i].is_delimited() {
            continue;
        }
        let (trim_left, trim_right) = tokens[i].trim_markers();
        if !in_raw && trim_left && i > 0 {
            if let TopLevelToken::Html(html) = &mut tokens[i - 1] {
                trim_end(html, mask);
            }
        }
        if let TopLevelToken::Tag(tag) = &tokens[i] {
            match tag.name.as_str() {
                "raw" => in_raw = true,
                "endraw" => in_raw = false,
                _ => {}
            }
        }
        if !in_raw && trim_right {
            if let Some(TopLevelToken::Html(html)) = tokens.get_mut(i + 1) {
                trim_start(html, mask);
            }
        }
    }
}

fn trim_end(html: &mut HtmlToken, mask: u8) {
    let input = Arc::clone(&html.token.input);
    let visible = &input[html.visible()];
    let trimmed = visible.trim_end_matches(|c| class(c) & mask != 0);
    html.trim_right += visible.len() - trimmed.len();
}

fn trim_start(html: &mut HtmlToken, mask: u8) {
    let input = Arc::clone(&html.token.input);
    let visible = &input[html.visible()];
    let trimmed = visible.trim_start_matches(|c| class(c) & mask != 0);
    html.trim_left += visible.len() - trimmed.len();
    if trimmed.starts_with('\n') {
        html.trim_left += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::compile::tokenizer::Tokenizer;
    use crate::expr::Grammar;
    use crate::types::options::Options;
    use crate::types::span::Span;
    use crate::types::token::TopLevelToken;

    fn html(source: &str, greedy: bool) -> Vec<String> {
        let options = Options::builder().greedy(greedy).build();
        let grammar = Grammar::default();
        let input: Arc<str> = Arc::from(source);
        Tokenizer::new(&input, &grammar, None, Span::from(0..source.len()))
            .read_top_level_tokens(&options)
            .unwrap()
            .iter()
            .filter_map(|t| match t {
                TopLevelToken::Html(h) => Some(h.value().to_owned()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn trim_greedy() {
        assert_eq!(html("a \n {%- if x -%} \n\n b", true), ["a", "b"]);
    }

    #[test]
    fn trim_non_greedy() {
        assert_eq!(
            html("a \n {%- if x -%} \n\n b", false),
            ["a \n", "\n b"]
        );
    }

    #[test]
    fn trim_output_markers() {
        assert_eq!(html("a {{- x -}} b", true), ["a", "b"]);
    }

    #[test]
    fn trim_skips_raw_body() {
        assert_eq!(
            html("{%- raw -%} a {%- endraw -%} b", true),
            [" a ", "b"]
        );
    }
}
