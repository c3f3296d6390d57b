use std::cmp::max;
use std::fmt;
use std::sync::Arc;

use crate::types::span::Span;
use crate::types::token::Token;

/// A convenient type alias for results in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The category of an [`Error`].
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Malformed lexical structure, for example an unclosed tag.
    #[error("{0}")]
    Tokenization(String),

    /// Malformed tag structure given valid tokens.
    #[error("{0}")]
    Parse(String),

    /// A failure while rendering a node.
    #[error("{0}")]
    Render(String),

    /// A missing variable was accessed with strict variables enabled.
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),

    /// Malformed tag arguments or a missing required token.
    #[error("{0}")]
    Assertion(String),

    /// A resource budget was exceeded.
    #[error("{resource} limit exceeded")]
    Limit { resource: &'static str },

    /// No candidate path for a template exists.
    #[error("ENOENT: Failed to lookup \"{file}\" in \"{}\"", .dirs.join(","))]
    Lookup { file: String, dirs: Vec<String> },

    /// A filter rejected its input or arguments.
    #[error("{0}")]
    Filter(String),

    /// Reading a template failed.
    #[error("{0}")]
    Io(String),

    /// A synchronous render met an operation that did not complete.
    #[error("{0}")]
    Pending(String),

    /// Converting render data failed.
    #[error("{0}")]
    Serialize(String),

    /// Several errors collected with `catch_all_errors` enabled.
    #[error("{}", summarize(.0))]
    Multiple(Vec<Error>),
}

/// An error that can occur during template parsing or rendering.
///
/// Errors raised against template source carry the offending token. The
/// `Display` implementation appends the line and column, and the alternate
/// form (`{:#}`) prints an annotated excerpt of the source.
#[derive(Clone)]
pub struct Error {
    kind: ErrorKind,
    span: Option<(Arc<str>, Span)>,
    file: Option<Arc<str>>,
    cause: Option<Box<Error>>,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            span: None,
            file: None,
            cause: None,
        }
    }

    pub(crate) fn with_token(mut self, token: &Token) -> Self {
        self.span = Some((Arc::clone(&token.input), token.span()));
        self.file = token.file.clone();
        self
    }

    pub(crate) fn tokenization(msg: impl Into<String>, token: &Token) -> Self {
        Self::new(ErrorKind::Tokenization(msg.into())).with_token(token)
    }

    pub(crate) fn assertion(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Assertion(msg.into()))
    }

    pub(crate) fn filter(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Filter(msg.into()))
    }

    pub(crate) fn limit(resource: &'static str) -> Self {
        Self::new(ErrorKind::Limit { resource })
    }

    pub(crate) fn io(path: &str, err: std::io::Error) -> Self {
        Self::new(ErrorKind::Io(format!("{}: {}", path, err)))
    }

    pub(crate) fn pending() -> Self {
        Self::new(ErrorKind::Pending(String::from(
            "asynchronous operation encountered during synchronous render",
        )))
    }

    pub(crate) fn multiple(errors: Vec<Error>) -> Self {
        Self::new(ErrorKind::Multiple(errors))
    }

    /// Wraps an error raised while parsing `token` unless it already points
    /// at template source.
    pub(crate) fn into_parse_error(self, token: &Token) -> Self {
        self.wrap(token, ErrorKind::Parse)
    }

    /// Wraps an error raised while rendering `token` unless it already points
    /// at template source. Limit errors are never wrapped.
    pub(crate) fn into_render_error(self, token: &Token) -> Self {
        self.wrap(token, ErrorKind::Render)
    }

    fn wrap(self, token: &Token, kind: fn(String) -> ErrorKind) -> Self {
        if self.span.is_some() || matches!(self.kind, ErrorKind::Multiple(_) | ErrorKind::Limit { .. })
        {
            return self;
        }
        Self {
            kind: kind(self.kind.to_string()),
            span: None,
            file: None,
            cause: Some(Box::new(self)),
        }
        .with_token(token)
    }

    /// Returns the category of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns the one-based line and column of the offending token.
    pub fn position(&self) -> Option<(usize, usize)> {
        self.span
            .as_ref()
            .map(|(source, span)| line_col(source, span.m))
    }

    /// Returns the file the offending token was read from.
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// Returns the collected errors when this is an aggregate error.
    pub fn errors(&self) -> &[Error] {
        match &self.kind {
            ErrorKind::Multiple(errors) => errors,
            _ => &[],
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span {
            Some((source, span)) => fmt_pretty(&self.kind.to_string(), source, *span, f),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span {
            Some((source, span)) => {
                if f.alternate() {
                    if let Some(file) = &self.file {
                        write!(f, "{}:", file)?;
                    }
                    fmt_pretty(&self.kind.to_string(), source, *span, f)
                } else {
                    let (line, col) = line_col(source, span.m);
                    write!(f, "{}", self.kind)?;
                    if let Some(file) = &self.file {
                        write!(f, ", file:{}", file)?;
                    }
                    write!(f, ", line:{}, col:{}", line, col)
                }
            }
            None => write!(f, "{}", self.kind),
        }
    }
}

fn summarize(errors: &[Error]) -> String {
    match errors {
        [] => String::from("no errors"),
        [first] => first.to_string(),
        [first, rest @ ..] => format!("{} (and {} more errors)", first, rest.len()),
    }
}

fn fmt_pretty(msg: &str, source: &str, span: Span, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let lines: Vec<_> = source.split_terminator('\n').collect();
    let (line, col) = line_col(source, span.m);
    let line = line - 1;
    let code = match lines.get(line).or_else(|| lines.last()) {
        Some(code) => *code,
        None => "",
    };
    let excerpt = &source[span.m..span.n.min(source.len())];
    let excerpt = excerpt.split('\n').next().unwrap_or("");
    let width = max(1, text_width(excerpt));
    let col = text_width(code.get(..byte_col(code, col)).unwrap_or(code));

    let num = (line + 1).to_string();
    let pad = text_width(&num);
    let pipe = "|";
    let underline = "^".repeat(width);

    write!(
        f,
        "\n \
        {0:pad$} {pipe}\n \
        {num:>} {pipe} {code}\n \
        {0:pad$} {pipe} {underline:>width$} {msg}\n",
        "",
        pad = pad,
        pipe = pipe,
        num = num,
        code = code,
        underline = underline,
        width = col + width,
        msg = msg
    )
}

/// One-based line and column (in characters) of a byte offset.
fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    (line, before[start..].chars().count() + 1)
}

/// Converts a one-based character column into a byte offset within `line`.
fn byte_col(line: &str, col: usize) -> usize {
    line.char_indices()
        .nth(col - 1)
        .map(|(i, _)| i)
        .unwrap_or(line.len())
}

#[cfg(feature = "unicode")]
fn text_width(s: &str) -> usize {
    unicode_width::UnicodeWidthStr::width(s)
}

#[cfg(not(feature = "unicode"))]
fn text_width(s: &str) -> usize {
    s.chars().count()
}
