mod helpers;

use tincture::{value, Engine, ErrorKind, Map, Options, RenderOptions, Value};

use crate::helpers::Writer;

fn render(source: &str, data: Value) -> String {
    Engine::new().parse_and_render_sync(source, data).unwrap()
}

#[test]
fn render_scalars() {
    let result = render(
        "{{ a }}|{{ b }}|{{ c }}|{{ d }}|{{ e }}",
        value! { a: true, b: 123, c: 1.5, d: nil, e: "lorem" },
    );
    assert_eq!(result, "true|123|1.5||lorem");
}

#[test]
fn render_integral_float() {
    assert_eq!(render("{{ f }}", value! { f: 3.0 }), "3");
}

#[test]
fn render_array_concatenates() {
    assert_eq!(render("{{ a }}", value! { a: [1, 2, "x"] }), "12x");
}

#[test]
fn render_object_as_json() {
    assert_eq!(
        render("{{ o }}", value! { o: { a: 1, b: "x" } }),
        r#"{"a":1,"b":"x"}"#
    );
}

#[test]
fn render_property_access() {
    let data = value! { user: { name: "Jo" }, list: [1, 2, 3] };
    let result = render(
        r#"{{ user.name }} {{ user["name"] }} {{ list[1] }} {{ list[-1] }}"#,
        data,
    );
    assert_eq!(result, "Jo Jo 2 3");
}

#[test]
fn render_synthetic_members() {
    let data = value! { list: [1, 2, 3], s: "abc", o: { size: "big" } };
    let result = render(
        "{{ list.size }} {{ list.first }} {{ list.last }} {{ s.size }} {{ o.size }}",
        data,
    );
    assert_eq!(result, "3 1 3 3 big");
}

#[test]
fn render_missing_is_empty() {
    assert_eq!(render("[{{ missing.deep.er }}]", value!({})), "[]");
}

#[test]
fn render_strict_variables() {
    let options = Options::builder().strict_variables(true).build();
    let err = Engine::with_options(options)
        .parse_and_render_sync("lorem {{ ipsum }}", value!({}))
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UndefinedVariable(path) if path == "ipsum"));
    assert_eq!(err.to_string(), "undefined variable: ipsum, line:1, col:10");
}

#[test]
fn render_strict_variables_allows_nil() {
    let options = Options::builder().strict_variables(true).build();
    let result = Engine::with_options(options)
        .parse_and_render_sync("[{{ ipsum }}]", value! { ipsum: nil })
        .unwrap();
    assert_eq!(result, "[]");
}

#[test]
fn render_options_override_strict_variables() {
    let engine = Engine::new();
    let template = engine.parse("{{ ipsum }}").unwrap();
    let err = engine
        .render(&template, value!({}))
        .with_options(RenderOptions {
            strict_variables: Some(true),
            ..Default::default()
        })
        .to_string_sync()
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UndefinedVariable(_)));
}

#[test]
fn render_globals() {
    let mut globals = Map::new();
    globals.insert("site".into(), Value::from("tincture"));
    globals.insert("name".into(), Value::from("global"));
    let options = Options::builder().globals(globals).build();
    let result = Engine::with_options(options)
        .parse_and_render_sync("{{ site }} {{ name }}", value! { name: "local" })
        .unwrap();
    assert_eq!(result, "tincture local");
}

#[test]
fn render_ranges() {
    let result = render(
        "{% for i in (1..3) %}{{ i }}{% endfor %} {% for i in (a..b) %}{{ i }}{% endfor %}",
        value! { a: 4, b: "6" },
    );
    assert_eq!(result, "123 456");
}

#[test]
fn render_operators() {
    let data = value! { a: 2, tags: ["x", "y"], s: "lorem ipsum" };
    let tests = [
        ("{% if a > 1 %}y{% endif %}", "y"),
        ("{% if a >= 2 and a <= 2 %}y{% endif %}", "y"),
        ("{% if a != 2 %}y{% else %}n{% endif %}", "n"),
        ("{% if a <> 2 %}y{% else %}n{% endif %}", "n"),
        ("{% if 1 <> 2 %}y{% else %}n{% endif %}", "y"),
        ("{% if tags contains 'y' %}y{% endif %}", "y"),
        ("{% if s contains 'ips' %}y{% endif %}", "y"),
        ("{% if a == 2.0 %}y{% endif %}", "y"),
        ("{% if not false %}y{% endif %}", "y"),
        ("{% if false and false or true %}y{% else %}n{% endif %}", "n"),
        ("{% if true or false and false %}y{% else %}n{% endif %}", "y"),
    ];
    for (source, expected) in tests {
        assert_eq!(render(source, data.clone()), expected, "{}", source);
    }
}

#[test]
fn render_empty_and_blank() {
    let data = value! { list: [], s: "  ", o: {} };
    let tests = [
        ("{% if list == empty %}y{% endif %}", "y"),
        ("{% if o == empty %}y{% endif %}", "y"),
        ("{% if s == empty %}y{% else %}n{% endif %}", "n"),
        ("{% if s == blank %}y{% endif %}", "y"),
        ("{% if missing == blank %}y{% endif %}", "y"),
        ("{% if missing == nil %}y{% endif %}", "y"),
    ];
    for (source, expected) in tests {
        assert_eq!(render(source, data.clone()), expected, "{}", source);
    }
}

#[test]
fn render_js_truthy() {
    let source = r#"{% if "" %}y{% else %}n{% endif %}{% if 0 %}y{% else %}n{% endif %}"#;
    assert_eq!(render(source, value!({})), "yy");
    let options = Options::builder().js_truthy(true).build();
    let result = Engine::with_options(options)
        .parse_and_render_sync(source, value!({}))
        .unwrap();
    assert_eq!(result, "nn");
}

#[test]
fn render_keep_output_type() {
    let options = Options::builder().keep_output_type(true).build();
    let engine = Engine::with_options(options);

    let template = engine.parse("{{ n }}").unwrap();
    let value = engine.render(&template, value! { n: 3 }).to_value_sync().unwrap();
    assert_eq!(value, Value::Integer(3));

    let template = engine.parse("n = {{ n }}").unwrap();
    let value = engine.render(&template, value! { n: 3 }).to_value_sync().unwrap();
    assert_eq!(value, Value::from("n = 3"));
}

#[test]
fn render_to_value_without_keep_output_type() {
    let engine = Engine::new();
    let template = engine.parse("{{ n }}").unwrap();
    let value = engine.render(&template, value! { n: 3 }).to_value_sync().unwrap();
    assert_eq!(value, Value::from("3"));
}

#[test]
fn render_to_writer() {
    let engine = Engine::new();
    let template = engine.parse("lorem {{ ipsum }}").unwrap();
    let mut w = Writer::new();
    engine
        .render(&template, value! { ipsum: "dolor" })
        .to_writer(&mut w)
        .unwrap();
    assert_eq!(w.into_string(), "lorem dolor");
}

#[test]
fn render_to_writer_err() {
    let engine = Engine::new();
    let template = engine.parse("lorem {{ ipsum }}").unwrap();
    let mut w = Writer::with_budget(6);
    let err = engine
        .render(&template, value! { ipsum: "dolor" })
        .to_writer(&mut w)
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Io(_)));
}

#[test]
fn render_async() {
    let engine = Engine::new();
    let template = engine.parse("{{ a | upcase }}").unwrap();
    let result = pollster::block_on(engine.render(&template, value! { a: "x" }).to_string()).unwrap();
    assert_eq!(result, "X");
    let result = pollster::block_on(engine.parse_and_render("{{ a }}", value! { a: 1 })).unwrap();
    assert_eq!(result, "1");
}

#[test]
fn render_serialize_struct() {
    #[derive(serde::Serialize)]
    struct Data {
        user: User,
    }
    #[derive(serde::Serialize)]
    struct User {
        name: String,
        tags: Vec<&'static str>,
    }
    let data = Data {
        user: User {
            name: "John Smith".into(),
            tags: vec!["a", "b"],
        },
    };
    let result = Engine::new()
        .parse_and_render_sync("{{ user.name }} {{ user.tags | join: ',' }}", &data)
        .unwrap();
    assert_eq!(result, "John Smith a,b");
}

#[test]
fn render_data_must_be_object() {
    let err = Engine::new().parse_and_render_sync("x", 1).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Serialize(_)));
}

#[test]
fn render_from_map() {
    let engine = Engine::new();
    let template = engine.parse("{{ a }}").unwrap();
    let mut data = Map::new();
    data.insert("a".into(), Value::from("b"));
    assert_eq!(engine.render_from(&template, data).to_string_sync().unwrap(), "b");
}

#[test]
fn render_template_twice() {
    let engine = Engine::new();
    let template = engine.parse("{% assign x = x | plus: 1 %}{{ x }}").unwrap();
    for _ in 0..2 {
        let result = engine.render(&template, value! { x: 1 }).to_string_sync().unwrap();
        assert_eq!(result, "2");
    }
}

#[test]
fn eval_value() {
    let engine = Engine::new();
    let Value::Object(scope) = value!( a: { b: 2 } ) else {
        unreachable!()
    };
    let value = engine.eval_value_sync("a.b | plus: 1", scope.clone()).unwrap();
    assert_eq!(value, Value::Integer(3));
    let value = pollster::block_on(engine.eval_value("a.b > 1", scope)).unwrap();
    assert_eq!(value, Value::Bool(true));
}
