//! Lexical tokens produced by the tokenizer.
//!
//! Every token is an immutable view over a byte range of the original
//! template source. The source is shared through an [`Arc`] so tokens can be
//! stored inside parsed templates and in errors without copying the input.

use std::fmt;
use std::sync::Arc;

use crate::expr::Operator;
use crate::types::span::Span;
use crate::Value;

/// The kind of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Html,
    Tag,
    Output,
    Number,
    Literal,
    Word,
    PropertyAccess,
    Filter,
    Hash,
    Range,
    Quoted,
    Operator,
    FilteredValue,
}

/// A region of template source.
#[derive(Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub input: Arc<str>,
    pub begin: usize,
    pub end: usize,
    pub file: Option<Arc<str>>,
}

impl Token {
    pub(crate) fn new(
        kind: TokenKind,
        input: &Arc<str>,
        begin: usize,
        end: usize,
        file: &Option<Arc<str>>,
    ) -> Self {
        Self {
            kind,
            input: Arc::clone(input),
            begin,
            end,
            file: file.clone(),
        }
    }

    /// The original source text covered by this token.
    pub fn text(&self) -> &str {
        &self.input[self.begin..self.end]
    }

    pub fn span(&self) -> Span {
        Span::from(self.begin..self.end)
    }

    /// Returns the one-based line and column of the start of this token.
    pub fn position(&self) -> (usize, usize) {
        let before = &self.input[..self.begin];
        let line = before.matches('\n').count() + 1;
        let col = match before.rfind('\n') {
            Some(i) => before[i + 1..].chars().count() + 1,
            None => before.chars().count() + 1,
        };
        (line, col)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("kind", &self.kind)
            .field("text", &self.text())
            .field("begin", &self.begin)
            .field("end", &self.end)
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Top level tokens
////////////////////////////////////////////////////////////////////////////////

/// A token at the top level of a template.
#[derive(Debug, Clone)]
pub enum TopLevelToken {
    Html(HtmlToken),
    Tag(TagToken),
    Output(OutputToken),
}

impl TopLevelToken {
    pub fn token(&self) -> &Token {
        match self {
            Self::Html(t) => &t.token,
            Self::Tag(t) => &t.token,
            Self::Output(t) => &t.token,
        }
    }

    pub(crate) fn is_delimited(&self) -> bool {
        !matches!(self, Self::Html(_))
    }

    pub(crate) fn trim_markers(&self) -> (bool, bool) {
        match self {
            Self::Html(_) => (false, false),
            Self::Tag(t) => (t.trim_left, t.trim_right),
            Self::Output(t) => (t.trim_left, t.trim_right),
        }
    }
}

/// A run of literal markup.
///
/// Whitespace control trims the token from either end without modifying the
/// underlying source range.
#[derive(Debug, Clone)]
pub struct HtmlToken {
    pub token: Token,
    pub trim_left: usize,
    pub trim_right: usize,
}

impl HtmlToken {
    pub(crate) fn new(token: Token) -> Self {
        Self {
            token,
            trim_left: 0,
            trim_right: 0,
        }
    }

    /// The markup with whitespace control applied.
    pub fn value(&self) -> &str {
        let begin = self.token.begin + self.trim_left;
        let end = self.token.end - self.trim_right;
        if begin >= end {
            return "";
        }
        &self.token.input[begin..end]
    }

    /// The part of the token that has not been trimmed from either side.
    pub(crate) fn visible(&self) -> Span {
        let m = self.token.begin + self.trim_left;
        let n = self.token.end - self.trim_right;
        Span::from(m..n.max(m))
    }
}

/// A `{% name args %}` tag.
#[derive(Debug, Clone)]
pub struct TagToken {
    pub token: Token,
    pub name: String,
    /// The argument text following the tag name.
    pub args: Span,
    pub trim_left: bool,
    pub trim_right: bool,
}

impl TagToken {
    pub fn args(&self) -> &str {
        &self.token.input[self.args]
    }

    pub fn file(&self) -> Option<&Arc<str>> {
        self.token.file.as_ref()
    }
}

/// A `{{ expression }}` output.
#[derive(Debug, Clone)]
pub struct OutputToken {
    pub token: Token,
    /// The expression text with delimiters and trim markers removed.
    pub content: Span,
    pub trim_left: bool,
    pub trim_right: bool,
}

////////////////////////////////////////////////////////////////////////////////
// Expression tokens
////////////////////////////////////////////////////////////////////////////////

/// A token inside a tag or output expression.
#[derive(Debug, Clone)]
pub enum ExprToken {
    Number {
        token: Token,
        value: Value,
    },
    Literal {
        token: Token,
        value: Value,
    },
    Word(Token),
    Quoted {
        token: Token,
        value: String,
    },
    PropertyAccess {
        token: Token,
        variable: Option<Box<ExprToken>>,
        props: Vec<ExprToken>,
    },
    Range {
        token: Token,
        lhs: Box<ExprToken>,
        rhs: Box<ExprToken>,
    },
    Operator {
        token: Token,
        operator: Arc<Operator>,
    },
}

impl ExprToken {
    pub fn token(&self) -> &Token {
        match self {
            Self::Number { token, .. }
            | Self::Literal { token, .. }
            | Self::Word(token)
            | Self::Quoted { token, .. }
            | Self::PropertyAccess { token, .. }
            | Self::Range { token, .. }
            | Self::Operator { token, .. } => token,
        }
    }

    pub fn text(&self) -> &str {
        self.token().text()
    }

    pub fn kind(&self) -> TokenKind {
        self.token().kind
    }

    pub fn is_operator(&self) -> bool {
        matches!(self, Self::Operator { .. })
    }
}

impl fmt::Display for ExprToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// An argument to a filter: either positional or `key: value`.
#[derive(Debug, Clone)]
pub enum FilterArgToken {
    Positional(ExprToken),
    Named(String, Option<ExprToken>),
}

/// A `| name: args` filter application.
#[derive(Debug, Clone)]
pub struct FilterToken {
    pub token: Token,
    pub name: String,
    pub args: Vec<FilterArgToken>,
}

/// A `name: value` pair in tag arguments.
#[derive(Debug, Clone)]
pub struct HashToken {
    pub token: Token,
    pub name: String,
    pub value: Option<ExprToken>,
}

/// An expression followed by zero or more filters.
#[derive(Debug, Clone)]
pub struct FilteredValueToken {
    pub token: Token,
    pub initial: Vec<ExprToken>,
    pub filters: Vec<FilterToken>,
}
