//! A prefix trie used to match operators and reserved literals.
//!
//! The trie is built once from a frozen set of patterns and then only read.
//! Consider the patterns `<`, `<=` and `and`:
//!
//! ```text
//!      < - S1* - = - S2*
//!     /
//! S0 - a - S3 - n - S4 - d - S5*
//! ```
//!
//! Matching walks the states from `S0` as far as the input allows and
//! remembers the last accepting state seen, giving the longest match. When a
//! pattern ends in a word character its accepting state is flagged as needing
//! a word boundary, so `and` does not match the start of `android`.

use crate::compile::chars::is_word;

type S = usize;

const START: S = 0;

struct State<T> {
    trans: Vec<(char, S)>,
    accept: Option<Accept<T>>,
}

struct Accept<T> {
    data: T,
    needs_boundary: bool,
}

impl<T> State<T> {
    fn new() -> Self {
        Self {
            trans: Vec::new(),
            accept: None,
        }
    }

    fn next_state(&self, c: char) -> Option<S> {
        self.trans.iter().find(|(t, _)| *t == c).map(|(_, s)| *s)
    }
}

/// A successful match at the start of some input.
#[derive(Debug)]
pub struct Match<'t, T> {
    /// The length of the match in bytes.
    pub len: usize,
    pub data: &'t T,
}

pub struct Trie<T> {
    states: Vec<State<T>>,
}

impl<T> Trie<T> {
    pub fn new<I, P>(patterns: I) -> Self
    where
        I: IntoIterator<Item = (P, T)>,
        P: AsRef<str>,
    {
        let mut states = vec![State::new()];
        for (pattern, data) in patterns {
            let pattern = pattern.as_ref();
            let mut s = START;
            for c in pattern.chars() {
                s = match states[s].next_state(c) {
                    Some(next) => next,
                    None => {
                        states.push(State::new());
                        let next = states.len() - 1;
                        states[s].trans.push((c, next));
                        next
                    }
                };
            }
            let needs_boundary = pattern.chars().next_back().map_or(false, is_word);
            states[s].accept = Some(Accept {
                data,
                needs_boundary,
            });
        }
        Self { states }
    }

    /// Matches the longest pattern at the start of `input`.
    ///
    /// If the longest match requires a word boundary and the following
    /// character is a word character then there is no match.
    pub fn find<'t>(&'t self, input: &str) -> Option<Match<'t, T>> {
        let mut s = START;
        let mut last = None;
        for (i, c) in input.char_indices() {
            match self.states[s].next_state(c) {
                Some(next) => s = next,
                None => break,
            }
            if let Some(accept) = &self.states[s].accept {
                last = Some((i + c.len_utf8(), accept));
            }
        }
        let (len, accept) = last?;
        if accept.needs_boundary && input[len..].chars().next().map_or(false, is_word) {
            return None;
        }
        Some(Match {
            len,
            data: &accept.data,
        })
    }
}
