use tincture::{value, Engine, Options, OptionsBuilder};

fn render_with(source: &str, f: impl FnOnce(&mut OptionsBuilder)) -> String {
    let mut builder = Options::builder();
    f(&mut builder);
    Engine::with_options(builder.build())
        .parse_and_render_sync(source, value! { a: 1 })
        .unwrap()
}

#[test]
fn trim_markers_greedy() {
    let result = render_with("a {%- if true -%} b {%- endif -%} c", |_| {});
    assert_eq!(result, "abc");
}

#[test]
fn trim_markers_output() {
    assert_eq!(render_with("[ {{- a -}} ]", |_| {}), "[1]");
    assert_eq!(render_with("[ {{- a }} ]", |_| {}), "[1 ]");
}

#[test]
fn trim_non_greedy_keeps_newlines() {
    let source = "<\n  {%- if true -%}  \nx\n{%- endif -%}\n>";
    assert_eq!(render_with(source, |_| {}), "<x>");
    let result = render_with(source, |b| {
        b.greedy(false);
    });
    assert_eq!(result, "<\nx\n>");
}

#[test]
fn trim_options() {
    let source = "a {% if true %} b {% endif %} c";
    let result = render_with(source, |b| {
        b.trim_tag_right(true);
    });
    assert_eq!(result, "a b c");
    let result = render_with(source, |b| {
        b.trim_tag_left(true);
    });
    assert_eq!(result, "a b c");

    let source = "a {{ a }} b";
    let result = render_with(source, |b| {
        b.trim_output_left(true);
    });
    assert_eq!(result, "a1 b");
    let result = render_with(source, |b| {
        b.trim_output_right(true).trim_output_left(true);
    });
    assert_eq!(result, "a1b");
}

#[test]
fn trim_suppressed_inside_raw() {
    let result = render_with("{%- raw -%} a {%- endraw -%} b", |_| {});
    assert_eq!(result, " a b");
}

#[test]
fn custom_delimiters() {
    let result = render_with("<% if a %>[<? a ?>]<%- endif %> {{ a }}", |b| {
        b.tag_delimiters("<%", "%>").output_delimiters("<?", "?>");
    });
    assert_eq!(result, "[1] {{ a }}");
}
