use std::sync::Arc;

use crate::compile::chars::{self, class, BLANK, NUMBER, QUOTE, SIGN};
use crate::compile::whitespace;
use crate::expr::Grammar;
use crate::types::options::Options;
use crate::types::span::Span;
use crate::types::token::{
    ExprToken, FilterArgToken, FilterToken, FilteredValueToken, HashToken, HtmlToken,
    OutputToken, TagToken, Token, TokenKind, TopLevelToken,
};
use crate::{Error, Result, Value};

/// A cursor over a range of template source.
///
/// The same tokenizer reads the top level markup of a template and the
/// expressions inside tags and outputs. Tag implementations are handed a
/// tokenizer positioned at the start of their arguments.
pub struct Tokenizer<'g> {
    /// The complete template source.
    input: Arc<str>,

    /// The cursor, a byte offset into `input`.
    p: usize,

    /// The end of the range being read.
    n: usize,

    /// The file the source was read from.
    file: Option<Arc<str>>,

    /// Operator and literal matchers.
    grammar: &'g Grammar,

    /// The start of the `raw` tag whose body is being read.
    raw_begin_at: Option<usize>,
}

impl<'g> Tokenizer<'g> {
    /// Construct a new tokenizer over `range` of `input`.
    pub(crate) fn new(
        input: &Arc<str>,
        grammar: &'g Grammar,
        file: Option<Arc<str>>,
        range: Span,
    ) -> Self {
        Self {
            input: Arc::clone(input),
            p: range.m,
            n: range.n,
            file,
            grammar,
            raw_begin_at: None,
        }
    }

    ////////////////////////////////////////////////////////////////////////
    // Cursor
    ////////////////////////////////////////////////////////////////////////

    /// Whether the whole range has been consumed.
    pub fn end(&self) -> bool {
        self.p >= self.n
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, k: usize) -> Option<char> {
        self.rest().chars().nth(k)
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.p += c.len_utf8();
        }
    }

    /// The unread part of the range.
    pub fn remaining(&self) -> &str {
        self.rest()
    }

    fn rest(&self) -> &str {
        &self.input[self.p.min(self.n)..self.n]
    }

    fn matches(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    /// Whether the text just before the cursor is `s`.
    fn rmatch(&self, s: &str) -> bool {
        self.input[..self.p].ends_with(s)
    }

    pub fn skip_blank(&mut self) {
        while chars::is(self.peek(), BLANK) {
            self.bump();
        }
    }

    /// Advances past the next occurrence of `s`, returning the new cursor.
    ///
    /// When `s` does not occur the cursor is left at the end.
    fn read_to(&mut self, s: &str) -> Option<usize> {
        while self.p < self.n {
            self.bump();
            if self.rmatch(s) {
                return Some(self.p);
            }
        }
        None
    }

    fn token(&self, kind: TokenKind, begin: usize, end: usize) -> Token {
        Token::new(kind, &self.input, begin, end, &self.file)
    }

    /// An error pointing from the cursor to the end of the range.
    pub fn error(&self, msg: impl Into<String>) -> Error {
        self.error_at(msg, self.p)
    }

    fn error_at(&self, msg: impl Into<String>, begin: usize) -> Error {
        let begin = begin.min(self.n);
        Error::tokenization(msg, &self.token(TokenKind::Word, begin, self.n))
    }

    /// The source from `begin`, quoted and shortened for error messages.
    fn snapshot(&self, begin: usize) -> String {
        let text = &self.input[begin.min(self.n)..self.n];
        let text = ellipsis(text, 32);
        serde_json::to_string(&text).unwrap_or(text)
    }

    ////////////////////////////////////////////////////////////////////////
    // Top level
    ////////////////////////////////////////////////////////////////////////

    /// Reads the whole range as markup and applies whitespace control.
    pub(crate) fn read_top_level_tokens(&mut self, options: &Options) -> Result<Vec<TopLevelToken>> {
        let mut tokens = Vec::new();
        while self.p < self.n {
            tokens.push(self.read_top_level_token(options)?);
        }
        whitespace::control(&mut tokens, options.greedy);
        Ok(tokens)
    }

    fn read_top_level_token(&mut self, options: &Options) -> Result<TopLevelToken> {
        if self.raw_begin_at.is_some() {
            return self.read_endraw_or_raw_content(options);
        }
        if self.matches(&options.tag_delimiter_left) {
            return self.read_tag_token(options).map(TopLevelToken::Tag);
        }
        if self.matches(&options.output_delimiter_left) {
            return self.read_output_token(options).map(TopLevelToken::Output);
        }
        let stops = [
            options.tag_delimiter_left.as_str(),
            options.output_delimiter_left.as_str(),
        ];
        Ok(TopLevelToken::Html(self.read_html_token(&stops)))
    }

    fn read_html_token(&mut self, stops: &[&str]) -> HtmlToken {
        let begin = self.p;
        while self.p < self.n {
            if stops.iter().any(|s| self.matches(s)) {
                break;
            }
            self.bump();
        }
        HtmlToken::new(self.token(TokenKind::Html, begin, self.p))
    }

    fn read_tag_token(&mut self, options: &Options) -> Result<TagToken> {
        let begin = self.p;
        if self.read_to_delimiter(&options.tag_delimiter_right, false).is_none() {
            let msg = format!("tag {} not closed", self.snapshot(begin));
            return Err(self.error_at(msg, begin));
        }
        let token = self.tag_token(
            begin,
            self.p,
            options.tag_delimiter_left.len(),
            options.tag_delimiter_right.len(),
            (options.trim_tag_left, options.trim_tag_right),
        )?;
        if token.name == "raw" {
            self.raw_begin_at = Some(begin);
        }
        Ok(token)
    }

    fn read_output_token(&mut self, options: &Options) -> Result<OutputToken> {
        let begin = self.p;
        if self.read_to_delimiter(&options.output_delimiter_right, true).is_none() {
            let msg = format!("output {} not closed", self.snapshot(begin));
            return Err(self.error_at(msg, begin));
        }
        let end = self.p;
        let (content, trim_left, trim_right) = self.delimited(
            begin + options.output_delimiter_left.len(),
            end.saturating_sub(options.output_delimiter_right.len()),
        );
        Ok(OutputToken {
            token: self.token(TokenKind::Output, begin, end),
            content,
            trim_left: trim_left || options.trim_output_left,
            trim_right: trim_right || options.trim_output_right,
        })
    }

    fn read_to_delimiter(&mut self, delimiter: &str, respect_quoted: bool) -> Option<usize> {
        self.skip_blank();
        while self.p < self.n {
            if respect_quoted && chars::is(self.peek(), QUOTE) {
                self.read_quoted();
                continue;
            }
            self.bump();
            if self.rmatch(delimiter) {
                return Some(self.p);
            }
        }
        None
    }

    /// Reads the body of a `raw` tag: either the markup before the next
    /// `endraw` tag or the `endraw` tag itself.
    fn read_endraw_or_raw_content(&mut self, options: &Options) -> Result<TopLevelToken> {
        let left = options.tag_delimiter_left.as_str();
        let right = options.tag_delimiter_right.as_str();
        let begin = self.p;
        let mut left_pos = self.read_to(left).map(|p| p - left.len());
        while let Some(lp) = left_pos {
            if self.peek() == Some('-') {
                self.bump();
            }
            if self.read_identifier().text() != "endraw" {
                left_pos = self.read_to(left).map(|p| p - left.len());
                continue;
            }
            while self.p <= self.n {
                if self.rmatch(right) {
                    let end = self.p;
                    if begin == lp {
                        self.raw_begin_at = None;
                        let token = self.tag_token(
                            begin,
                            end,
                            left.len(),
                            right.len(),
                            (options.trim_tag_left, options.trim_tag_right),
                        )?;
                        return Ok(TopLevelToken::Tag(token));
                    }
                    self.p = lp;
                    let html = HtmlToken::new(self.token(TokenKind::Html, begin, lp));
                    return Ok(TopLevelToken::Html(html));
                }
                if self.end() {
                    break;
                }
                self.bump();
            }
            break;
        }
        let raw = self.raw_begin_at.unwrap_or(begin);
        let msg = format!("raw {} not closed", self.snapshot(raw));
        Err(self.error_at(msg, begin))
    }

    /// Computes the content range of a delimited token between `l` and `r`,
    /// stripping trim markers and surrounding blanks.
    fn delimited(&self, l: usize, r: usize) -> (Span, bool, bool) {
        let bytes = self.input.as_bytes();
        let r = r.max(l);
        let trim_left = l < r && bytes[l] == b'-';
        let mut l = if trim_left { l + 1 } else { l };
        let trim_right = r > l && bytes[r - 1] == b'-';
        let mut r = if trim_right { r - 1 } else { r };
        let content = &self.input[l..r];
        let stripped = content.trim_start_matches(|c| class(c) & BLANK != 0);
        l += content.len() - stripped.len();
        let stripped = stripped.trim_end_matches(|c| class(c) & BLANK != 0);
        r = l + stripped.len();
        (Span::from(l..r), trim_left, trim_right)
    }

    fn tag_token(
        &self,
        begin: usize,
        end: usize,
        left_len: usize,
        right_len: usize,
        (trim_tag_left, trim_tag_right): (bool, bool),
    ) -> Result<TagToken> {
        let (content, trim_left, trim_right) =
            self.delimited(begin + left_len, end.saturating_sub(right_len));
        let token = self.token(TokenKind::Tag, begin, end);
        self.named_tag(token, content, trim_left || trim_tag_left, trim_right || trim_tag_right)
    }

    fn named_tag(
        &self,
        token: Token,
        content: Span,
        trim_left: bool,
        trim_right: bool,
    ) -> Result<TagToken> {
        let mut t = Tokenizer::new(&self.input, self.grammar, self.file.clone(), content);
        let name = t.read_tag_name();
        if name.is_empty() {
            return Err(Error::tokenization(
                "illegal tag syntax, tag name expected",
                &token,
            ));
        }
        t.skip_blank();
        Ok(TagToken {
            token,
            name,
            args: Span::from(t.p..content.n),
            trim_left,
            trim_right,
        })
    }

    fn read_tag_name(&mut self) -> String {
        self.skip_blank();
        if self.peek() == Some('#') {
            self.bump();
            return String::from("#");
        }
        self.read_identifier().text().to_owned()
    }

    /// Reads one tag per line, as used by the `liquid` tag.
    pub(crate) fn read_liquid_tag_tokens(&mut self) -> Result<Vec<TopLevelToken>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_blank();
            if self.end() {
                return Ok(tokens);
            }
            let begin = self.p;
            if self.read_to_delimiter("\n", false).is_none() {
                self.p = self.n;
            }
            let (content, _, _) = self.delimited_blanks(begin, self.p);
            let token = self.token(TokenKind::Tag, begin, self.p);
            tokens.push(TopLevelToken::Tag(self.named_tag(token, content, false, false)?));
        }
    }

    fn delimited_blanks(&self, l: usize, r: usize) -> (Span, bool, bool) {
        let content = &self.input[l..r];
        let start = l + (content.len() - content.trim_start_matches(|c| class(c) & BLANK != 0).len());
        let end = l + content.trim_end_matches(|c| class(c) & BLANK != 0).len();
        (Span::from(start..end.max(start)), false, false)
    }

    /// Reads a file name made of markup and outputs, stopping at a blank or
    /// a comma. Used when file names are not expressions.
    pub(crate) fn read_file_name_template(&mut self, options: &Options) -> Result<Vec<TopLevelToken>> {
        self.skip_blank();
        let stops = [",", " ", options.output_delimiter_left.as_str()];
        let mut tokens = Vec::new();
        while self.p < self.n && !matches!(self.peek(), Some(',' | ' ')) {
            if self.matches(&options.output_delimiter_left) {
                tokens.push(TopLevelToken::Output(self.read_output_token(options)?));
            } else {
                tokens.push(TopLevelToken::Html(self.read_html_token(&stops)));
            }
        }
        Ok(tokens)
    }

    ////////////////////////////////////////////////////////////////////////
    // Expressions
    ////////////////////////////////////////////////////////////////////////

    /// Reads an expression followed by any number of filters.
    pub fn read_filtered_value(&mut self) -> Result<FilteredValueToken> {
        self.skip_blank();
        let begin = self.p;
        let initial = self.read_expression_tokens()?;
        let end = self.p;
        let filters = self.read_filters()?;
        Ok(FilteredValueToken {
            token: self.token(TokenKind::FilteredValue, begin, end.max(self.p)),
            initial,
            filters,
        })
    }

    /// Reads alternating operators and operands until neither matches.
    pub fn read_expression_tokens(&mut self) -> Result<Vec<ExprToken>> {
        let mut tokens = Vec::new();
        while self.p < self.n {
            if let Some(op) = self.read_operator() {
                tokens.push(op);
                continue;
            }
            match self.read_value()? {
                Some(value) => tokens.push(value),
                None => break,
            }
        }
        Ok(tokens)
    }

    fn read_operator(&mut self) -> Option<ExprToken> {
        self.skip_blank();
        let m = self.grammar.operators.find(self.rest())?;
        let begin = self.p;
        self.p += m.len;
        Some(ExprToken::Operator {
            token: self.token(TokenKind::Operator, begin, self.p),
            operator: Arc::clone(m.data),
        })
    }

    fn read_filters(&mut self) -> Result<Vec<FilterToken>> {
        let mut filters = Vec::new();
        while let Some(filter) = self.read_filter()? {
            filters.push(filter);
        }
        Ok(filters)
    }

    fn read_filter(&mut self) -> Result<Option<FilterToken>> {
        self.skip_blank();
        if self.end() {
            return Ok(None);
        }
        if self.peek() != Some('|') {
            return Err(self.error("expected \"|\" before filter"));
        }
        self.bump();
        let begin = self.p;
        let name = self.read_identifier();
        if name.text().is_empty() {
            if !self.end() {
                return Err(self.error("expected filter name"));
            }
            return Ok(None);
        }
        let mut args = Vec::new();
        self.skip_blank();
        if self.peek() == Some(':') {
            loop {
                self.bump();
                if let Some(arg) = self.read_filter_arg()? {
                    args.push(arg);
                }
                self.skip_blank();
                if !(self.end() || matches!(self.peek(), Some(',' | '|'))) {
                    let msg = format!("unexpected character {}", self.snapshot(self.p));
                    return Err(self.error(msg));
                }
                if self.peek() != Some(',') {
                    break;
                }
            }
        } else if !(self.end() || self.peek() == Some('|')) {
            return Err(self.error("expected \":\" after filter name"));
        }
        Ok(Some(FilterToken {
            token: self.token(TokenKind::Filter, begin, self.p),
            name: name.text().to_owned(),
            args,
        }))
    }

    fn read_filter_arg(&mut self) -> Result<Option<FilterArgToken>> {
        let key = match self.read_value()? {
            Some(key) => key,
            None => return Ok(None),
        };
        self.skip_blank();
        if self.peek() != Some(':') {
            return Ok(Some(FilterArgToken::Positional(key)));
        }
        self.bump();
        let value = self.read_value()?;
        Ok(Some(FilterArgToken::Named(key.text().to_owned(), value)))
    }

    /// Reads `name: value` pairs separated by blanks or commas.
    pub fn read_hashes(&mut self, separator: &str) -> Result<Vec<HashToken>> {
        let mut hashes = Vec::new();
        while let Some(hash) = self.read_hash(separator)? {
            hashes.push(hash);
        }
        Ok(hashes)
    }

    fn read_hash(&mut self, separator: &str) -> Result<Option<HashToken>> {
        self.skip_blank();
        if self.peek() == Some(',') {
            self.bump();
        }
        let begin = self.p;
        let name = match self.read_non_empty_identifier() {
            Some(name) => name,
            None => return Ok(None),
        };
        self.skip_blank();
        let mut value = None;
        if self.matches(separator) {
            self.p += separator.len();
            value = self.read_value()?;
        }
        Ok(Some(HashToken {
            token: self.token(TokenKind::Hash, begin, self.p),
            name: name.text().to_owned(),
            value,
        }))
    }

    /// Reads a single operand: a literal, string, range, number or property
    /// access.
    pub fn read_value(&mut self) -> Result<Option<ExprToken>> {
        self.skip_blank();
        let begin = self.p;
        let variable = match self.read_literal() {
            Some(v) => Some(v),
            None => match self.read_quoted() {
                Some(v) => Some(v),
                None => match self.read_range()? {
                    Some(v) => Some(v),
                    None => self.read_number(),
                },
            },
        };
        let props = self.read_properties(variable.is_none())?;
        if props.is_empty() {
            return Ok(variable);
        }
        Ok(Some(ExprToken::PropertyAccess {
            token: self.token(TokenKind::PropertyAccess, begin, self.p),
            variable: variable.map(Box::new),
            props,
        }))
    }

    pub(crate) fn read_value_or_error(&mut self) -> Result<ExprToken> {
        match self.read_value()? {
            Some(value) => Ok(value),
            None => {
                let msg = format!("unexpected token {}, value expected", self.snapshot(self.p));
                Err(self.error(msg))
            }
        }
    }

    fn read_properties(&mut self, is_begin: bool) -> Result<Vec<ExprToken>> {
        let mut props = Vec::new();
        loop {
            if self.peek() == Some('[') {
                self.bump();
                let prop = match self.read_value()? {
                    Some(prop) => prop,
                    None => ExprToken::Word(self.token(TokenKind::Word, self.p, self.p)),
                };
                if self.read_to("]").is_none() {
                    return Err(self.error("[ not closed"));
                }
                props.push(prop);
                continue;
            }
            if is_begin && props.is_empty() {
                if let Some(prop) = self.read_non_empty_identifier() {
                    props.push(ExprToken::Word(prop));
                    continue;
                }
            }
            if self.peek() == Some('.') && self.peek_nth(1) != Some('.') {
                self.bump();
                match self.read_non_empty_identifier() {
                    Some(prop) => props.push(ExprToken::Word(prop)),
                    None => break,
                }
                continue;
            }
            break;
        }
        Ok(props)
    }

    fn read_literal(&mut self) -> Option<ExprToken> {
        self.skip_blank();
        let m = self.grammar.literals.find(self.rest())?;
        let begin = self.p;
        self.p += m.len;
        Some(ExprToken::Literal {
            token: self.token(TokenKind::Literal, begin, self.p),
            value: m.data.clone(),
        })
    }

    fn read_quoted(&mut self) -> Option<ExprToken> {
        self.skip_blank();
        let begin = self.p;
        let quote = self.peek().filter(|c| class(*c) & QUOTE != 0)?;
        self.bump();
        let mut escaped = false;
        let mut closed = false;
        while let Some(c) = self.peek() {
            self.bump();
            if c == quote && !escaped {
                closed = true;
                break;
            }
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            }
        }
        let inner_begin = begin + quote.len_utf8();
        let inner_end = if closed { self.p - quote.len_utf8() } else { self.p };
        Some(ExprToken::Quoted {
            token: self.token(TokenKind::Quoted, begin, self.p),
            value: parse_string_literal(&self.input[inner_begin..inner_end.max(inner_begin)]),
        })
    }

    fn read_range(&mut self) -> Result<Option<ExprToken>> {
        self.skip_blank();
        let begin = self.p;
        if self.peek() != Some('(') {
            return Ok(None);
        }
        self.bump();
        let lhs = self.read_value_or_error()?;
        self.skip_blank();
        if !self.matches("..") {
            return Err(self.error("invalid range syntax"));
        }
        self.p += 2;
        let rhs = self.read_value_or_error()?;
        self.skip_blank();
        if self.peek() != Some(')') {
            return Err(self.error("invalid range syntax"));
        }
        self.bump();
        Ok(Some(ExprToken::Range {
            token: self.token(TokenKind::Range, begin, self.p),
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }))
    }

    fn read_number(&mut self) -> Option<ExprToken> {
        self.skip_blank();
        let rest = self.rest().as_bytes();
        let mut len = 0;
        let mut decimal = false;
        let mut digit = false;
        if rest.first().map_or(false, |b| class(*b as char) & SIGN != 0) {
            len += 1;
        }
        while let Some(&b) = rest.get(len) {
            if class(b as char) & NUMBER != 0 && b.is_ascii() {
                digit = true;
            } else if b == b'.' && rest.get(len + 1) != Some(&b'.') {
                if decimal || !digit {
                    return None;
                }
                decimal = true;
            } else {
                break;
            }
            len += 1;
        }
        let next = self.rest()[len..].chars().next();
        if !digit || next.map_or(false, chars::is_word) {
            return None;
        }
        let begin = self.p;
        self.p += len;
        let text = &self.input[begin..self.p];
        let value = match text.parse::<i64>() {
            Ok(i) if !decimal => Value::Integer(i),
            _ => Value::Float(text.parse().unwrap_or(f64::NAN)),
        };
        Some(ExprToken::Number {
            token: self.token(TokenKind::Number, begin, self.p),
            value,
        })
    }

    /// Reads a possibly empty run of word characters.
    pub fn read_identifier(&mut self) -> Token {
        self.skip_blank();
        let begin = self.p;
        while self.peek().map_or(false, chars::is_word) {
            self.bump();
        }
        self.token(TokenKind::Word, begin, self.p)
    }

    pub fn read_non_empty_identifier(&mut self) -> Option<Token> {
        let id = self.read_identifier();
        if id.text().is_empty() {
            None
        } else {
            Some(id)
        }
    }

    /// Moves the cursor back to a position returned by [`position`][Self::position].
    pub fn reset(&mut self, p: usize) {
        self.p = p;
    }

    pub fn position(&self) -> usize {
        self.p
    }

    /// Advances past a single `s` if it is next, ignoring blanks.
    pub(crate) fn eat(&mut self, s: &str) -> bool {
        self.skip_blank();
        if self.matches(s) {
            self.p += s.len();
            true
        } else {
            false
        }
    }

    /// Advances past the next occurrence of `s` or to the end.
    pub(crate) fn skip_past(&mut self, s: &str) {
        if self.read_to(s).is_none() {
            self.p = self.n;
        }
    }
}

fn ellipsis(s: &str, n: usize) -> String {
    if s.chars().count() > n {
        let mut out: String = s.chars().take(n - 3).collect();
        out.push_str("...");
        out
    } else {
        s.to_owned()
    }
}

/// Resolves backslash escapes in the body of a quoted string.
fn parse_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut iter = s.chars().peekable();
    while let Some(c) = iter.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match iter.peek().copied() {
            Some(e @ ('b' | 'f' | 'n' | 'r' | 't' | 'v')) => {
                iter.next();
                out.push(match e {
                    'b' => '\u{8}',
                    'f' => '\u{c}',
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    _ => '\u{b}',
                });
            }
            Some('u') => {
                iter.next();
                let mut code = 0;
                for _ in 0..4 {
                    match iter.peek().and_then(|c| c.to_digit(16)) {
                        Some(d) => {
                            code = code * 16 + d;
                            iter.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            Some(d) if d.is_digit(8) => {
                let mut code = 0;
                for _ in 0..3 {
                    match iter.peek().and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            iter.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            Some(other) => {
                iter.next();
                out.push(other);
            }
            None => {}
        }
    }
    out
}
