//! Compile template source into a tree of nodes.
//!
//! This process has two stages:
//! - The tokenizer chunks the source into markup, tag and output tokens and
//!   applies whitespace control.
//! - The parser turns each token into a node. Tags claim the tokens of their
//!   bodies from the queue of remaining tokens.

pub(crate) mod cache;
pub(crate) mod chars;
mod loader;
mod stream;
mod tokenizer;
pub(crate) mod trie;
mod whitespace;

use std::collections::VecDeque;
use std::sync::Arc;

use futures::future::{self, BoxFuture};
use futures::FutureExt;

use crate::compile::cache::CacheEntry;
pub use crate::compile::loader::LookupType;
pub use crate::compile::stream::{Event, ParseStream};
pub use crate::compile::tokenizer::Tokenizer;
use crate::expr::{FilteredValue, Grammar};
use crate::render::Limiter;
use crate::types::options::Options;
use crate::types::span::Span;
use crate::types::template::{Node, Template};
use crate::types::token::{TagToken, TopLevelToken};
use crate::{Error, ErrorKind, Inner, Result};

/// The tokens of a template that have not been parsed yet.
pub type TokenQueue = VecDeque<TopLevelToken>;

/// Turns tokens into nodes using the tags and filters of an engine.
///
/// Tag factories receive the parser so they can parse the tokens of their
/// bodies.
pub struct Parser<'engine> {
    engine: &'engine Inner,
}

impl<'engine> Parser<'engine> {
    pub(crate) fn new(engine: &'engine Inner) -> Self {
        Self { engine }
    }

    /// Parses template source. `file` is recorded in tokens for error
    /// messages and relative lookups.
    pub fn parse(&self, source: &str, file: Option<&str>) -> Result<Vec<Node>> {
        let options = &self.engine.options;
        Limiter::new("parse length", options.parse_limit as u64).use_(source.len() as u64)?;
        let input: Arc<str> = Arc::from(source);
        let mut tokenizer = Tokenizer::new(
            &input,
            &self.engine.grammar,
            file.map(Arc::from),
            Span::from(0..source.len()),
        );
        let tokens = tokenizer.read_top_level_tokens(options)?;
        self.parse_tokens(tokens)
    }

    /// Parses a complete token list.
    ///
    /// With `catch_all_errors` enabled every failing token is skipped and
    /// the errors are returned together at the end.
    pub fn parse_tokens(&self, tokens: Vec<TopLevelToken>) -> Result<Vec<Node>> {
        let mut queue: TokenQueue = tokens.into();
        let mut nodes = Vec::with_capacity(queue.len());
        let mut errors = Vec::new();
        while let Some(token) = queue.pop_front() {
            match self.parse_token(token, &mut queue) {
                Ok(node) => nodes.push(node),
                Err(err) if self.engine.options.catch_all_errors => errors.push(err),
                Err(err) => return Err(err),
            }
        }
        if !errors.is_empty() {
            return Err(Error::multiple(errors));
        }
        Ok(nodes)
    }

    /// Parses a single token. A tag may take further tokens from `queue`.
    pub fn parse_token(&self, token: TopLevelToken, queue: &mut TokenQueue) -> Result<Node> {
        match token {
            TopLevelToken::Tag(tag) => {
                let Some(factory) = self.engine.tags.get(&tag.name) else {
                    let msg = format!("tag \"{}\" not found", tag.name);
                    return Err(Error::new(ErrorKind::Parse(msg)).with_token(&tag.token));
                };
                tracing::trace!(tag = %tag.name, "parse tag");
                let kind = factory(&tag, queue, self).map_err(|err| err.into_parse_error(&tag.token))?;
                Ok(Node::Tag { token: tag, tag: kind })
            }
            TopLevelToken::Output(output) => {
                let mut tokenizer = Tokenizer::new(
                    &output.token.input,
                    &self.engine.grammar,
                    output.token.file.clone(),
                    output.content,
                );
                let parsed = tokenizer
                    .read_filtered_value()
                    .and_then(|token| FilteredValue::new(token, self.engine))
                    .and_then(|mut value| {
                        if let Some(name) = self.engine.options.output_escape.filter_name() {
                            value.escape_with(name, self.engine)?;
                        }
                        Ok(value)
                    });
                let value = parsed.map_err(|err| err.into_parse_error(&output.token))?;
                Ok(Node::Output {
                    token: output.token,
                    value,
                })
            }
            TopLevelToken::Html(html) => Ok(Node::Html(html)),
        }
    }

    /// Starts an event stream over `queue` for parsing a tag body.
    pub fn parse_stream<'q>(&'q self, queue: &'q mut TokenQueue) -> ParseStream<'q, 'engine> {
        ParseStream::new(self, queue)
    }

    /// A tokenizer over the arguments of `tag`.
    pub fn tokenizer(&self, tag: &TagToken) -> Tokenizer<'engine> {
        let engine: &'engine Inner = self.engine;
        Tokenizer::new(
            &tag.token.input,
            &engine.grammar,
            tag.token.file.clone(),
            tag.args,
        )
    }

    pub fn grammar(&self) -> &'engine Grammar {
        let engine: &'engine Inner = self.engine;
        &engine.grammar
    }

    pub fn options(&self) -> &'engine Options {
        let engine: &'engine Inner = self.engine;
        &engine.options
    }

    pub(crate) fn engine(&self) -> &'engine Inner {
        self.engine
    }
}

/// Finds, reads and parses a template file.
///
/// `current` is the file doing the lookup, used to resolve relative
/// references. With a cache configured the pending parse is stored before
/// it is awaited, so concurrent calls for the same file share one read and
/// parse. A failed parse is evicted again.
pub(crate) fn parse_file(
    engine: Arc<Inner>,
    file: String,
    current: Option<String>,
    lookup: LookupType,
    sync: bool,
) -> BoxFuture<'static, Result<Template>> {
    async move {
        let Some(cache) = engine.options.cache.clone() else {
            return load(engine, file, current, lookup, sync).await;
        };
        let key = cache_key(&engine.options, &file, current.as_deref(), lookup);
        if let Some(entry) = cache.read(&key) {
            tracing::debug!(%key, "template cache hit");
            return entry.await;
        }
        tracing::debug!(%key, "template cache miss");
        let task = load(Arc::clone(&engine), file, current, lookup, sync);
        let entry: CacheEntry = if sync {
            let result = task.now_or_never().unwrap_or_else(|| Err(Error::pending()));
            future::ready(result).boxed().shared()
        } else {
            task.shared()
        };
        cache.write(&key, entry.clone());
        let result = entry.await;
        if result.is_err() {
            tracing::debug!(%key, "evict failed parse");
            cache.remove(&key);
        }
        result
    }
    .boxed()
}

fn load(
    engine: Arc<Inner>,
    file: String,
    current: Option<String>,
    lookup: LookupType,
    sync: bool,
) -> BoxFuture<'static, Result<Template>> {
    async move {
        let options = &engine.options;
        let path = loader::lookup(options, &file, current.as_deref(), lookup, sync).await?;
        let source = if sync {
            options.fs.read_file_sync(&path)
        } else {
            options.fs.read_file(&path).await
        }
        .map_err(|err| Error::io(&path, err))?;
        let nodes = Parser::new(&engine).parse(&source, Some(&path))?;
        Ok(Template::new(nodes))
    }
    .boxed()
}

fn cache_key(options: &Options, file: &str, current: Option<&str>, lookup: LookupType) -> String {
    match current {
        Some(current) if options.relative_reference && loader::looks_relative(file, options.fs.sep()) => {
            format!("{},{}", current, file)
        }
        _ => format!("{}:{}", lookup, file),
    }
}
