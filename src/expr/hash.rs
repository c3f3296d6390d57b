use indexmap::IndexMap;

use crate::compile::Tokenizer;
use crate::expr::eval_token;
use crate::render::Context;
use crate::types::token::ExprToken;
use crate::value::Map;
use crate::{Result, Value};

/// Named tag arguments, `key: value` or `key=value`.
///
/// A key without a value renders as `true`.
#[derive(Debug, Clone, Default)]
pub struct Hash {
    entries: IndexMap<String, Option<ExprToken>>,
}

impl Hash {
    /// Reads the remaining arguments of `tokenizer` as a hash.
    pub fn parse(tokenizer: &mut Tokenizer<'_>, separator: &str) -> Result<Self> {
        let entries = tokenizer
            .read_hashes(separator)?
            .into_iter()
            .map(|h| (h.name, h.value))
            .collect();
        Ok(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Option<ExprToken>> {
        self.entries.get(key)
    }

    /// Evaluates every value in order.
    pub async fn render(&self, ctx: &mut Context) -> Result<Map> {
        let mut map = Map::with_capacity(self.entries.len());
        for (key, value) in &self.entries {
            let value = match value {
                Some(token) => eval_token(token, ctx, false).await?,
                None => Value::Bool(true),
            };
            map.insert(key.clone(), value);
        }
        Ok(map)
    }
}
