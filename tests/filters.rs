use std::sync::Arc;

use futures::future::{self, BoxFuture};
use futures::FutureExt;
use tincture::{
    value, Engine, Error, ErrorKind, FilterCall, FilterHandler, Map, Options, OutputEscape, Result,
    Value,
};

fn render(engine: &Engine, source: &str, data: Value) -> String {
    engine.parse_and_render_sync(source, data).unwrap()
}

#[test]
fn filter_arity() {
    let mut engine = Engine::new();
    engine
        .register_filter("zero", |v: Value| v)
        .register_filter("one", |s: String, a: String| format!("{s}{a}"))
        .register_filter("two", |a: i64, b: i64, c: i64| a + b + c)
        .register_filter("opt", |s: String, a: Option<String>| {
            s + &a.unwrap_or_else(|| String::from("?"))
        });
    let result = render(
        &engine,
        "{{ x | zero }} {{ x | one: 'b' }} {{ 1 | two: 2, 3 }} {{ x | opt }}",
        value! { x: "a" },
    );
    assert_eq!(result, "a ab 6 a?");
}

#[test]
fn filter_err_too_many_arguments() {
    let mut engine = Engine::new();
    engine.register_filter("zero", |v: Value| v);
    let err = engine
        .parse_and_render_sync("{{ x | zero: 1 }}", value!({}))
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Render(_)));
    assert!(
        err.to_string().starts_with("filter expected 0 arguments, found 1"),
        "{}",
        err
    );
}

#[test]
fn filter_returning_result() {
    let mut engine = Engine::new();
    engine.register_filter("check", |n: i64| -> Result<i64> {
        if n < 0 {
            Err(Error::from(ErrorKind::Filter(String::from("negative"))))
        } else {
            Ok(n)
        }
    });
    assert_eq!(render(&engine, "{{ n | check }}", value! { n: 3 }), "3");
    let err = engine
        .parse_and_render_sync("{{ n | check }}", value! { n: -3 })
        .unwrap_err();
    assert_eq!(err.to_string(), "negative, line:1, col:7");
}

#[test]
fn filter_overrides_builtin() {
    let mut engine = Engine::new();
    engine.register_filter("upcase", |s: String| format!("<{s}>"));
    assert_eq!(render(&engine, "{{ 'a' | upcase }}", value!({})), "<a>");
}

#[test]
fn filter_registered_after_parse_is_not_seen() {
    let mut engine = Engine::new();
    let template = engine.parse("{{ 'a' | shout }}").unwrap();
    engine.register_filter("shout", |s: String| s.to_uppercase());
    assert_eq!(engine.render(&template, value!({})).to_string_sync().unwrap(), "a");
    let template = engine.parse("{{ 'a' | shout }}").unwrap();
    assert_eq!(engine.render(&template, value!({})).to_string_sync().unwrap(), "A");
}

#[test]
fn filter_async() {
    let mut engine = Engine::new();
    engine.register_async_filter("later", |v: Value, args: Vec<Value>| async move {
        Ok(Value::from(format!("{}:{}", v, args.len())))
    });
    let result =
        pollster::block_on(engine.parse_and_render("{{ 'a' | later: 1, 2 }}", value!({}))).unwrap();
    assert_eq!(result, "a:2");
}

#[test]
fn filter_async_pending_in_sync_render() {
    let mut engine = Engine::new();
    engine.register_async_filter("never", |_: Value, _: Vec<Value>| {
        future::pending::<Result<Value>>()
    });
    let err = engine
        .parse_and_render_sync("{{ 'a' | never }}", value!({}))
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Pending(_)), "{:?}", err);
    assert!(err.to_string().starts_with("asynchronous operation"), "{}", err);
}

struct Greet;

impl FilterHandler for Greet {
    fn call<'a>(&'a self, call: FilterCall<'a>) -> BoxFuture<'a, Result<Value>> {
        let greeting = call
            .named("greeting")
            .map(Value::to_string)
            .unwrap_or_else(|| String::from("Hello"));
        let site = call
            .context
            .get("site")
            .map(Value::to_string)
            .unwrap_or_default();
        future::ready(Ok(Value::from(format!("{greeting} {} from {site}", call.input)))).boxed()
    }
}

#[test]
fn filter_handler_named_arguments() {
    let mut engine = Engine::new();
    engine.register_filter_handler("greet", Arc::new(Greet));
    let data = value! { name: "Jo", site: "tincture" };
    assert_eq!(
        render(&engine, "{{ name | greet }}", data.clone()),
        "Hello Jo from tincture"
    );
    assert_eq!(
        render(&engine, "{{ name | greet: greeting: 'Hi' }}", data),
        "Hi Jo from tincture"
    );
}

#[test]
fn filter_unknown_is_identity() {
    let engine = Engine::new();
    assert_eq!(render(&engine, "{{ 'a' | nope: 1 }}", value!({})), "a");
}

#[test]
fn filter_err_strict_filters() {
    let options = Options::builder().strict_filters(true).build();
    let err = Engine::with_options(options)
        .parse("{{ 'a' | nope }}")
        .unwrap_err();
    assert!(err.to_string().starts_with("undefined filter: nope"), "{}", err);
}

#[test]
fn filter_err_divided_by_zero() {
    let engine = Engine::new();
    let err = engine
        .parse_and_render_sync("{{ 1 | divided_by: 0 }}", value!({}))
        .unwrap_err();
    assert!(err.to_string().starts_with("divided by 0"), "{}", err);
    assert_eq!(err.position(), Some((1, 7)));
}

#[test]
fn filter_chain() {
    let engine = Engine::new();
    let result = render(
        &engine,
        "{{ ' Hello World ' | strip | downcase | replace: 'world', 'there' | append: '!' }}",
        value!({}),
    );
    assert_eq!(result, "hello there!");
}

#[test]
fn filter_builtins() {
    let engine = Engine::new();
    let data = value! {
        products: [
            { title: "Vase", "type": "decor", price: 20 },
            { title: "Lamp", "type": "light", price: 35 },
            { title: "Rug", "type": "decor", price: 50 },
        ],
        words: "a b c",
        html: "<p>Hi <b>there</b></p>",
    };
    let tests = [
        ("{{ products | map: 'title' | join: ', ' }}", "Vase, Lamp, Rug"),
        ("{{ products | where: 'type', 'decor' | size }}", "2"),
        ("{{ products | sort: 'price' | last | map: 'title' }}", "Rug"),
        ("{{ products | find: 'title', 'Lamp' | map: 'price' }}", "35"),
        ("{{ products | sum: 'price' }}", "105"),
        ("{{ words | split: ' ' | reverse | join }}", "c b a"),
        ("{{ html | strip_html }}", "Hi there"),
        ("{{ '<a>' | escape }}", "&lt;a&gt;"),
        ("{{ 'a b' | url_encode }}", "a+b"),
        ("{{ 'Ground control' | truncate: 10 }}", "Ground ..."),
        ("{{ 10 | minus: 2.5 }}", "7.5"),
        ("{{ 7 | divided_by: 2 }}", "3"),
        ("{{ 183.357 | round: 2 }}", "183.36"),
        ("{{ nil | default: 'x' }}", "x"),
        ("{{ false | default: 'x', allow_false: true }}", "false"),
        ("{{ products[0] | json }}", r#"{"title":"Vase","type":"decor","price":20}"#),
    ];
    for (source, expected) in tests {
        assert_eq!(render(&engine, source, data.clone()), expected, "{}", source);
    }
}

#[test]
fn filter_where_exp() {
    let engine = Engine::new();
    let data = value! {
        products: [
            { title: "Vase", price: 20 },
            { title: "Lamp", price: 35 },
            { title: "Rug", price: 50 },
        ],
    };
    let result = render(
        &engine,
        "{{ products | where_exp: 'p', 'p.price > 30' | map: 'title' | join: ',' }}",
        data,
    );
    assert_eq!(result, "Lamp,Rug");
}

#[test]
fn filter_exp_filters_run_in_isolated_scope() {
    let engine = Engine::new();
    let data = value! { list: [1, 2, 3], limit: 1 };
    let tests = [
        ("{% assign t = 1 %}{{ list | where_exp: 'i', 'i > t' | size }}", "0"),
        ("{{ list | where_exp: 'i', 'i > limit' | size }}", "0"),
        ("{{ list | find_exp: 'i', 'i > limit' }}", ""),
        ("{{ list | where_exp: 'i', 'i > 1' | size }}", "2"),
    ];
    for (source, expected) in tests {
        assert_eq!(render(&engine, source, data.clone()), expected, "{}", source);
    }
}

#[test]
fn filter_exp_filters_see_globals() {
    let mut globals = Map::new();
    globals.insert("limit".into(), Value::from(1));
    let options = Options::builder().globals(globals).build();
    let engine = Engine::with_options(options);
    let result = render(
        &engine,
        "{{ list | where_exp: 'i', 'i > limit' | join: ',' }}",
        value! { list: [1, 2, 3] },
    );
    assert_eq!(result, "2,3");
}

#[test]
fn filter_output_escape() {
    let options = Options::builder().output_escape(OutputEscape::Escape).build();
    let engine = Engine::with_options(options);
    let data = value! { s: "<b>" };
    assert_eq!(render(&engine, "{{ s }}", data.clone()), "&lt;b&gt;");
    assert_eq!(render(&engine, "{{ s | raw }}", data), "<b>");
}
