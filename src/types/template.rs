use std::fmt;
use std::sync::Arc;

use crate::expr::FilteredValue;
use crate::tags::TagKind;
use crate::types::token::{HtmlToken, TagToken, Token};

/// A compiled template.
///
/// Cloning a template is cheap, the nodes are shared.
#[derive(Clone, Default)]
pub struct Template {
    nodes: Arc<Vec<Node>>,
}

/// A single element of a compiled template.
pub enum Node {
    /// Literal markup, with whitespace control applied.
    Html(HtmlToken),
    /// An `{{ expression }}`.
    Output { token: Token, value: FilteredValue },
    /// A tag together with any body it claimed while parsing.
    Tag { token: TagToken, tag: TagKind },
}

impl Template {
    pub(crate) fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes: Arc::new(nodes),
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Node {
    /// The source token the node was parsed from.
    pub fn token(&self) -> &Token {
        match self {
            Self::Html(html) => &html.token,
            Self::Output { token, .. } => token,
            Self::Tag { token, .. } => &token.token,
        }
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.nodes.iter()).finish()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Html(html) => f.debug_tuple("Html").field(&html.value()).finish(),
            Self::Output { value, .. } => f.debug_tuple("Output").field(value).finish(),
            Self::Tag { token, .. } => f.debug_tuple("Tag").field(&token.name).finish(),
        }
    }
}
