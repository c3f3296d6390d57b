use tincture::{value, Engine, ErrorKind, Map, MemoryFileSystem, Options, OptionsBuilder, Value};

fn engine(files: &[(&str, &str)], f: impl FnOnce(&mut OptionsBuilder)) -> Engine {
    let mut fs = MemoryFileSystem::new();
    for (path, contents) in files {
        fs.insert(path, *contents);
    }
    let mut builder = Options::builder();
    builder.root(["/views"]).extname(".liquid").fs(fs);
    f(&mut builder);
    Engine::with_options(builder.build())
}

fn render(engine: &Engine, source: &str, data: Value) -> String {
    engine.parse_and_render_sync(source, data).unwrap()
}

#[test]
fn include_shares_scope() {
    let engine = engine(
        &[("/views/greeting.liquid", "Hello {{ name }}{% assign seen = true %}")],
        |_| {},
    );
    let result = render(
        &engine,
        "{% include 'greeting' %}, {{ seen }}",
        value! { name: "Jo" },
    );
    assert_eq!(result, "Hello Jo, true");
}

#[test]
fn include_with_and_hash() {
    let engine = engine(
        &[("/views/card.liquid", "[{{ card.title }}|{{ color }}]")],
        |_| {},
    );
    let result = render(
        &engine,
        "{% include 'card' with product, color: 'red' %}",
        value! { product: { title: "Vase" } },
    );
    assert_eq!(result, "[Vase|red]");
}

#[test]
fn include_dynamic_name() {
    let engine = engine(
        &[
            ("/views/card-small.liquid", "small"),
            ("/views/card-large.liquid", "large"),
        ],
        |_| {},
    );
    let source = "{% include 'card-{{ size }}' %}";
    assert_eq!(render(&engine, source, value! { size: "small" }), "small");
    assert_eq!(render(&engine, source, value! { size: "large" }), "large");
    let result = render(&engine, "{% include name %}", value! { name: "card-small" });
    assert_eq!(result, "small");
}

#[test]
fn include_jekyll() {
    let engine = engine(&[("/views/card.html", "<{{ include.title }}>")], |b| {
        b.jekyll_include(true).dynamic_partials(false);
    });
    let result = render(&engine, r#"{% include card.html title="Hi" %}"#, value!({}));
    assert_eq!(result, "<Hi>");
}

#[test]
fn render_is_isolated() {
    let engine = engine(
        &[("/views/show.liquid", "[{{ secret }}{{ site }}]{% assign leak = 2 %}")],
        |b| {
            let mut globals = Map::new();
            globals.insert("site".into(), Value::from("S"));
            b.globals(globals);
        },
    );
    let result = render(
        &engine,
        "{% assign secret = 1 %}{% render 'show' %}{{ leak }}",
        value!({}),
    );
    assert_eq!(result, "[S]");
}

#[test]
fn render_with_and_hash() {
    let engine = engine(&[("/views/card.liquid", "{{ p.title }}:{{ n }}")], |_| {});
    let result = render(
        &engine,
        "{% render 'card' with product as p, n: 3 %}",
        value! { product: { title: "Vase" } },
    );
    assert_eq!(result, "Vase:3");
}

#[test]
fn render_for() {
    let engine = engine(
        &[("/views/item.liquid", "{{ forloop.index }}{{ x }}{% unless forloop.last %},{% endunless %}")],
        |_| {},
    );
    let result = render(
        &engine,
        "{% render 'item' for list as x %}",
        value! { list: ["a", "b"] },
    );
    assert_eq!(result, "1a,2b");
}

#[test]
fn render_for_binds_file_name() {
    let engine = engine(&[("/views/item.liquid", "{{ item }}")], |_| {});
    let result = render(&engine, "{% render 'item' for (1..3) %}", value!({}));
    assert_eq!(result, "123");
}

#[test]
fn layout_with_blocks() {
    let engine = engine(
        &[(
            "/views/base.liquid",
            "<head>{% block title %}Default{% endblock %}</head><body>{% block %}{% endblock %}</body>",
        )],
        |_| {},
    );
    let result = render(
        &engine,
        "{% layout 'base' %}{% block title %}Page | {{ block.super }}{% endblock %}Content",
        value!({}),
    );
    assert_eq!(result, "<head>Page | Default</head><body>Content</body>");
}

#[test]
fn layout_chain() {
    let engine = engine(
        &[
            (
                "/views/middle.liquid",
                "{% layout 'outer' %}{% block body %}A({{ block.super }}){% endblock %}",
            ),
            ("/views/outer.liquid", "[{% block body %}B{% endblock %}]"),
        ],
        |_| {},
    );
    let result = render(
        &engine,
        "{% layout 'middle' %}{% block body %}C({{ block.super }}){% endblock %}",
        value!({}),
    );
    assert_eq!(result, "[C(A(B))]");
}

#[test]
fn layout_block_with_include() {
    let engine = engine(
        &[
            ("/views/base.liquid", "[{% block body %}{% endblock %}]"),
            ("/views/part.liquid", "<{% block body %}P{% endblock %}>"),
        ],
        |_| {},
    );
    let result = render(
        &engine,
        "{% layout 'base' %}{% block body %}C{% include 'part' %}{% endblock %}",
        value!({}),
    );
    assert_eq!(result, "[C<P>]");
}

#[test]
fn layout_default_block() {
    let engine = engine(
        &[("/views/base.liquid", "[{% block title %}Default{% endblock %}]")],
        |_| {},
    );
    assert_eq!(render(&engine, "{% layout 'base' %}", value!({})), "[Default]");
}

#[test]
fn layout_arguments() {
    let engine = engine(&[("/views/base.liquid", "{{ color }}")], |_| {});
    let result = render(&engine, "{% layout 'base' color: 'red' %}", value!({}));
    assert_eq!(result, "red");
}

#[test]
fn layout_none() {
    let engine = engine(&[], |_| {});
    assert_eq!(render(&engine, "{% layout none %}body", value!({})), "body");
}

#[test]
fn layout_separate_directory() {
    let engine = engine(
        &[
            ("/views/base.liquid", "wrong"),
            ("/layouts/base.liquid", "right {% block %}{% endblock %}"),
        ],
        |b| {
            b.layouts(["/layouts"]);
        },
    );
    assert_eq!(render(&engine, "{% layout 'base' %}x", value!({})), "right x");
}

#[test]
fn relative_reference() {
    let engine = engine(
        &[
            ("/views/pages/index.liquid", "{% include './part' %}"),
            ("/views/pages/part.liquid", "nested"),
            ("/views/part.liquid", "top"),
        ],
        |_| {},
    );
    let result = engine.render_file_sync("pages/index", value!({})).unwrap();
    assert_eq!(result, "nested");
}

#[test]
fn relative_reference_disabled() {
    let engine = engine(
        &[
            ("/views/pages/index.liquid", "{% include './part' %}"),
            ("/views/pages/part.liquid", "nested"),
            ("/views/part.liquid", "top"),
        ],
        |b| {
            b.relative_reference(false);
        },
    );
    let result = engine.render_file_sync("pages/index", value!({})).unwrap();
    assert_eq!(result, "top");
}

#[test]
fn partial_err_lookup() {
    let engine = engine(&[], |_| {});
    let err = engine.render_file_sync("missing", value!({})).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Lookup { .. }));
    assert_eq!(
        err.to_string(),
        "ENOENT: Failed to lookup \"missing\" in \"/views\""
    );

    let err = engine
        .parse_and_render_sync("x{% include 'nope' %}", value!({}))
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Render(_)));
    assert_eq!(
        err.to_string(),
        "ENOENT: Failed to lookup \"nope\" in \"/views\", line:1, col:2"
    );
}

#[test]
fn partial_err_reports_file() {
    let engine = engine(&[("/views/broken.liquid", "ok\n{{ a | upcase 'x' }}")], |_| {});
    let err = engine
        .parse_and_render_sync("{% include 'broken' %}", value!({}))
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Tokenization(_)));
    assert_eq!(err.file(), Some("views/broken.liquid"));
    assert_eq!(
        err.to_string(),
        "expected \":\" after filter name, file:views/broken.liquid, line:2, col:15"
    );
}
