use crate::compile::{Parser, TokenQueue};
use crate::types::template::Node;
use crate::types::token::{TagToken, TopLevelToken};
use crate::{Error, ErrorKind, Result};

/// What a [`ParseStream`] produced next.
#[derive(Debug)]
pub enum Event {
    /// One of the watched tags, for example `else` or `endif`.
    Tag(TagToken),
    /// Any other token, already parsed.
    Template(Node),
}

/// Parses the body of a block tag one event at a time.
///
/// The stream reports the tags it watches and parses everything else into
/// nodes. Once the closing tag has been seen the owner calls
/// [`stop`][Self::stop] and any remaining tokens are left for the caller.
///
/// ```text
/// let mut stream = parser.parse_stream(queue).on_tags(&["else", "endfor"]);
/// while let Some(event) = stream.next()? { ... }
/// stream.finish(token)?;
/// ```
pub struct ParseStream<'q, 'engine> {
    parser: &'q Parser<'engine>,
    queue: &'q mut TokenQueue,
    watched: &'static [&'static str],
    stopped: bool,
}

impl<'q, 'engine> ParseStream<'q, 'engine> {
    pub(crate) fn new(parser: &'q Parser<'engine>, queue: &'q mut TokenQueue) -> Self {
        Self {
            parser,
            queue,
            watched: &[],
            stopped: false,
        }
    }

    /// Report the named tags as [`Event::Tag`] instead of parsing them.
    pub fn on_tags(mut self, names: &'static [&'static str]) -> Self {
        self.watched = names;
        self
    }

    pub fn next(&mut self) -> Result<Option<Event>> {
        if self.stopped {
            return Ok(None);
        }
        let Some(token) = self.queue.pop_front() else {
            return Ok(None);
        };
        match token {
            TopLevelToken::Tag(tag) if self.watched.contains(&tag.name.as_str()) => {
                Ok(Some(Event::Tag(tag)))
            }
            token => {
                let node = self.parser.parse_token(token, self.queue)?;
                Ok(Some(Event::Template(node)))
            }
        }
    }

    /// Ends the stream, leaving the remaining tokens in the queue.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Fails unless the stream was stopped, meaning the closing tag of
    /// `opening` was never found.
    pub fn finish(self, opening: &TagToken) -> Result<()> {
        if self.stopped {
            return Ok(());
        }
        let msg = format!("tag {} not closed", opening.token.text());
        Err(Error::new(ErrorKind::Parse(msg)).with_token(&opening.token))
    }
}
