use std::error::Error as _;

use tincture::{value, Engine, ErrorKind, Options};

#[test]
fn error_position() {
    let err = Engine::new().parse("a\nb {% nope %}").unwrap_err();
    assert_eq!(err.position(), Some((2, 3)));
    assert_eq!(err.file(), None);
    assert_eq!(err.to_string(), "tag \"nope\" not found, line:2, col:3");
}

#[test]
fn error_alternate_display() {
    let err = Engine::new().parse("a\n{% nope %}").unwrap_err();
    let pretty = format!("{:#}", err);
    assert!(pretty.contains(" 2 | {% nope %}"), "{}", pretty);
    assert!(pretty.contains("^ tag \"nope\" not found"), "{}", pretty);
}

#[test]
fn error_source_of_wrapped_filter_error() {
    let err = Engine::new()
        .parse_and_render_sync("{{ 1 | divided_by: 0 }}", value!({}))
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Render(_)));
    let source = err.source().expect("filter error");
    assert_eq!(source.to_string(), "divided by 0");
}

#[test]
fn error_catch_all_parse_errors() {
    let options = Options::builder().catch_all_errors(true).build();
    let err = Engine::with_options(options)
        .parse("{% nope %}x{% also %}")
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Multiple(_)));
    let errors: Vec<String> = err.errors().iter().map(ToString::to_string).collect();
    assert_eq!(
        errors,
        [
            "tag \"nope\" not found, line:1, col:1",
            "tag \"also\" not found, line:1, col:12",
        ]
    );
    assert_eq!(
        err.to_string(),
        "tag \"nope\" not found, line:1, col:1 (and 1 more errors)"
    );
}

#[test]
fn error_catch_all_render_errors() {
    let options = Options::builder()
        .catch_all_errors(true)
        .strict_variables(true)
        .build();
    let err = Engine::with_options(options)
        .parse_and_render_sync("{{ a }}-{{ b }}-{{ c }}", value! { b: 1 })
        .unwrap_err();
    let errors = err.errors();
    assert_eq!(errors.len(), 2);
    assert!(matches!(errors[0].kind(), ErrorKind::UndefinedVariable(v) if v == "a"));
    assert!(matches!(errors[1].kind(), ErrorKind::UndefinedVariable(v) if v == "c"));
}

#[test]
fn error_first_failure_stops_render() {
    let options = Options::builder().strict_variables(true).build();
    let err = Engine::with_options(options)
        .parse_and_render_sync("{{ a }}{{ b }}", value!({}))
        .unwrap_err();
    assert!(err.errors().is_empty());
    assert!(matches!(err.kind(), ErrorKind::UndefinedVariable(v) if v == "a"));
}
