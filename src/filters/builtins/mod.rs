//! The builtin filter catalog, registered on every new engine.

mod array;
mod math;
mod string;

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{self, BoxFuture};
use futures::FutureExt;
use serde::Serialize;

use crate::filters::builtins::array::{ExpFilter, ExpMode};
use crate::filters::{self, FilterCall, FilterHandler};
use crate::{Error, ErrorKind, Result, Value};

pub(crate) fn defaults() -> HashMap<String, Arc<dyn FilterHandler>> {
    let mut map: HashMap<String, Arc<dyn FilterHandler>> = HashMap::new();
    let mut add = |name: &str, handler: Arc<dyn FilterHandler>| {
        map.insert(name.to_owned(), handler);
    };

    add("append", filters::new(string::append));
    add("prepend", filters::new(string::prepend));
    add("capitalize", filters::new(string::capitalize));
    add("downcase", filters::new(string::downcase));
    add("upcase", filters::new(string::upcase));
    add("strip", filters::new(string::strip));
    add("lstrip", filters::new(string::lstrip));
    add("rstrip", filters::new(string::rstrip));
    add("replace", filters::new(string::replace));
    add("replace_first", filters::new(string::replace_first));
    add("remove", filters::new(string::remove));
    add("remove_first", filters::new(string::remove_first));
    add("split", filters::new(string::split));
    add("truncate", filters::new(string::truncate));
    add("truncatewords", filters::new(string::truncatewords));
    add("newline_to_br", filters::new(string::newline_to_br));
    add("strip_html", filters::new(string::strip_html));
    add("strip_newlines", filters::new(string::strip_newlines));
    add("escape", filters::new(string::escape));
    add("escape_once", filters::new(string::escape_once));
    add("url_encode", filters::new(string::url_encode));
    add("url_decode", filters::new(string::url_decode));

    add("plus", filters::new(math::plus));
    add("minus", filters::new(math::minus));
    add("times", filters::new(math::times));
    add("divided_by", filters::new(math::divided_by));
    add("modulo", filters::new(math::modulo));
    add("abs", filters::new(math::abs));
    add("round", filters::new(math::round));
    add("ceil", filters::new(math::ceil));
    add("floor", filters::new(math::floor));
    add("at_least", filters::new(math::at_least));
    add("at_most", filters::new(math::at_most));

    add("join", filters::new(array::join));
    add("first", filters::new(array::first));
    add("last", filters::new(array::last));
    add("size", filters::new(array::size));
    add("reverse", filters::new(array::reverse));
    add("sort", filters::new(array::sort));
    add("sort_natural", filters::new(array::sort_natural));
    add("uniq", filters::new(array::uniq));
    add("compact", filters::new(array::compact));
    add("map", filters::new(array::map));
    add("concat", filters::new(array::concat));
    add("push", filters::new(array::push));
    add("pop", filters::new(array::pop));
    add("shift", filters::new(array::shift));
    add("unshift", filters::new(array::unshift));
    add("slice", filters::new(array::slice));
    add("where", filters::new(array::where_));
    add("reject", filters::new(array::reject));
    add("find", filters::new(array::find));
    add("find_index", filters::new(array::find_index));
    add("has", filters::new(array::has));
    add("group_by", filters::new(array::group_by));
    add("sum", filters::new(array::sum));
    add("array_to_sentence_string", filters::new(array::array_to_sentence_string));
    add("where_exp", Arc::new(ExpFilter(ExpMode::Where)));
    add("reject_exp", Arc::new(ExpFilter(ExpMode::Reject)));
    add("find_exp", Arc::new(ExpFilter(ExpMode::Find)));
    add("find_index_exp", Arc::new(ExpFilter(ExpMode::FindIndex)));
    add("has_exp", Arc::new(ExpFilter(ExpMode::Has)));
    add("group_by_exp", Arc::new(ExpFilter(ExpMode::GroupBy)));

    add("default", Arc::new(DefaultFilter));
    add("json", filters::new(json));
    add("jsonify", filters::new(json));
    add("raw", filters::new(|v: Value| v));

    map
}

/// `{{ value | default: fallback, allow_false: true }}`
///
/// Falls back when the input is `nil`, `false` or empty. With `allow_false`
/// a `false` input is kept.
struct DefaultFilter;

impl FilterHandler for DefaultFilter {
    fn call<'a>(&'a self, call: FilterCall<'a>) -> BoxFuture<'a, Result<Value>> {
        let allow_false = call
            .named("allow_false")
            .map_or(false, |v| v.is_truthy(false));
        let input = call.input.to_primitive();
        let fallback = match &input {
            Value::Bool(false) => !allow_false,
            Value::String(s) => s.is_empty(),
            Value::Array(a) => a.is_empty(),
            Value::Object(o) => o.is_empty(),
            v => v.is_nil(),
        };
        let value = if fallback {
            call.args.into_iter().next().unwrap_or_default()
        } else {
            call.input
        };
        future::ready(Ok(value)).boxed()
    }
}

/// The widest indent `json` pretty prints with.
const MAX_JSON_INDENT: i64 = 10;

/// Serializes the input as JSON, pretty printed when an indent is given.
/// Indents wider than ten spaces are clamped.
fn json(v: Value, indent: Option<i64>) -> Result<String> {
    let to_err = |err: serde_json::Error| Error::new(ErrorKind::Serialize(err.to_string()));
    match indent {
        Some(n) if n > 0 => {
            let indent = vec![b' '; n.min(MAX_JSON_INDENT) as usize];
            let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
            let mut buf = Vec::new();
            let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
            v.serialize(&mut ser).map_err(to_err)?;
            String::from_utf8(buf).map_err(|err| Error::new(ErrorKind::Serialize(err.to_string())))
        }
        _ => serde_json::to_string(&v).map_err(to_err),
    }
}
