//! Expressions: operands joined by operators, optionally followed by filters.

mod filtered;
mod hash;
mod operators;

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use indexmap::IndexMap;

pub use crate::expr::filtered::FilteredValue;
pub use crate::expr::hash::Hash;
pub(crate) use crate::expr::operators::OperatorFn;
pub use crate::expr::operators::{equals, Operator};

use crate::compile::trie::Trie;
use crate::compile::Tokenizer;
use crate::render::{Context, Resolved};
use crate::types::span::Span;
use crate::types::token::ExprToken;
use crate::value::DropValue;
use crate::{Error, ErrorKind, Result, Value};

/// Matchers for the operators and reserved literals of an engine.
///
/// The tries are built from a snapshot of the operator table and rebuilt
/// whenever an operator is registered.
pub struct Grammar {
    pub(crate) operators: Trie<Arc<Operator>>,
    pub(crate) literals: Trie<Value>,
}

impl Grammar {
    pub(crate) fn new(operators: &IndexMap<String, Arc<Operator>>) -> Self {
        let literals = [
            ("true", Value::Bool(true)),
            ("false", Value::Bool(false)),
            ("nil", Value::Drop(DropValue::Nil)),
            ("null", Value::Drop(DropValue::Nil)),
            ("empty", Value::Drop(DropValue::Empty)),
            ("blank", Value::Drop(DropValue::Blank)),
        ];
        Self {
            operators: Trie::new(operators.iter().map(|(k, v)| (k.as_str(), Arc::clone(v)))),
            literals: Trie::new(literals),
        }
    }
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new(&operators::defaults())
    }
}

pub(crate) fn default_operators() -> IndexMap<String, Arc<Operator>> {
    operators::defaults()
}

/// An expression rewritten to postfix order.
#[derive(Debug, Clone)]
pub struct Expression {
    postfix: Vec<ExprToken>,
}

impl Expression {
    pub fn new(tokens: Vec<ExprToken>) -> Self {
        Self {
            postfix: to_postfix(tokens),
        }
    }

    /// Reads an expression from the start of `source`.
    pub fn parse(source: &str, grammar: &Grammar) -> Result<Self> {
        let input: Arc<str> = Arc::from(source);
        let mut tokenizer = Tokenizer::new(&input, grammar, None, Span::from(0..source.len()));
        Ok(Self::new(tokenizer.read_expression_tokens()?))
    }

    pub fn is_empty(&self) -> bool {
        self.postfix.is_empty()
    }

    /// Evaluates the expression.
    ///
    /// When `lenient` is set undefined variables evaluate to `nil` even with
    /// strict variables enabled.
    pub fn evaluate<'a>(&'a self, ctx: &'a mut Context, lenient: bool) -> BoxFuture<'a, Result<Value>> {
        async move {
            let mut operands: Vec<Value> = Vec::new();
            for token in &self.postfix {
                let ExprToken::Operator { operator, .. } = token else {
                    operands.push(eval_token(token, ctx, lenient).await?);
                    continue;
                };
                let rhs = operands.pop().unwrap_or_default();
                let result = match operator.handler() {
                    OperatorFn::Unary(f) => f(&rhs, ctx),
                    OperatorFn::Binary(f) => {
                        let lhs = operands.pop().unwrap_or_default();
                        f(&lhs, &rhs, ctx)
                    }
                };
                operands.push(result);
            }
            Ok(operands.into_iter().next().unwrap_or_default())
        }
        .boxed()
    }
}

/// Shunting yard without parentheses. An operator is popped only when the
/// one on the stack binds strictly tighter.
fn to_postfix(tokens: Vec<ExprToken>) -> Vec<ExprToken> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut ops: Vec<ExprToken> = Vec::new();
    for token in tokens {
        if let ExprToken::Operator { operator, .. } = &token {
            let precedence = operator.precedence();
            while let Some(ExprToken::Operator { operator: top, .. }) = ops.last() {
                if top.precedence() <= precedence {
                    break;
                }
                out.extend(ops.pop());
            }
            ops.push(token);
        } else {
            out.push(token);
        }
    }
    out.extend(ops.into_iter().rev());
    out
}

/// Evaluates a single operand.
pub fn eval_token<'a>(
    token: &'a ExprToken,
    ctx: &'a mut Context,
    lenient: bool,
) -> BoxFuture<'a, Result<Value>> {
    async move {
        match token {
            ExprToken::Number { value, .. } | ExprToken::Literal { value, .. } => Ok(value.clone()),
            ExprToken::Word(token) => Ok(Value::from(token.text())),
            ExprToken::Quoted { value, .. } => Ok(Value::from(value.as_str())),
            ExprToken::Range { lhs, rhs, .. } => {
                let low = eval_token(lhs, ctx, lenient).await?;
                let high = eval_token(rhs, ctx, lenient).await?;
                let (Some(low), Some(high)) = (low.as_i64(), high.as_i64()) else {
                    return Ok(Value::Array(Vec::new()));
                };
                let len = u64::try_from(high.saturating_sub(low).saturating_add(1)).unwrap_or(0);
                ctx.memory().use_(len)?;
                Ok((low..=high).map(Value::Integer).collect())
            }
            ExprToken::PropertyAccess {
                token,
                variable,
                props,
            } => {
                let mut keys = Vec::with_capacity(props.len());
                for prop in props {
                    keys.push(eval_token(prop, ctx, false).await?);
                }
                let root = match variable {
                    Some(variable) => Some(eval_token(variable, ctx, lenient).await?),
                    None => None,
                };
                match ctx.resolve(root, &keys).await? {
                    Resolved::Value(v) => Ok(v),
                    Resolved::Undefined(_) if lenient => Ok(Value::Nil),
                    Resolved::Undefined(path) => {
                        Err(Error::new(ErrorKind::UndefinedVariable(path)).with_token(token))
                    }
                }
            }
            ExprToken::Operator { token, .. } => Err(Error::tokenization(
                format!("unexpected operator {}", token.text()),
                token,
            )),
        }
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn postfix(source: &str) -> Vec<String> {
        Expression::parse(source, &Grammar::default())
            .unwrap()
            .postfix
            .iter()
            .map(|t| t.text().to_owned())
            .collect()
    }

    #[test]
    fn postfix_precedence() {
        assert_eq!(postfix("a == 1 and b"), ["a", "1", "==", "b", "and"]);
        assert_eq!(postfix("not a == b"), ["a", "b", "==", "not"]);
    }

    #[test]
    fn postfix_equal_precedence_groups_right() {
        assert_eq!(postfix("a and b or c"), ["a", "b", "c", "or", "and"]);
    }

    #[test]
    fn literals_are_drops() {
        let g = Grammar::default();
        let m = g.literals.find("empty").unwrap();
        assert_eq!(*m.data, Value::Drop(DropValue::Empty));
        assert!(g.literals.find("emptyish").is_none());
    }
}
