use futures::future::BoxFuture;
use futures::FutureExt;
use tincture::{
    render_nodes, value, Context, Emitter, Engine, Event, Expression, Node, Operator, Parser,
    Result, Tag, TagToken, TokenQueue, Value,
};

/// `{% repeat n %}body{% endrepeat %}`
struct Repeat {
    times: Expression,
    body: Vec<Node>,
}

impl Tag for Repeat {
    fn render<'a>(
        &'a self,
        ctx: &'a mut Context,
        emitter: &'a mut dyn Emitter,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            let times = self.times.evaluate(ctx, false).await?;
            for _ in 0..times.as_i64().unwrap_or(0) {
                render_nodes(&self.body, ctx, emitter).await?;
            }
            Ok(())
        }
        .boxed()
    }
}

fn parse_repeat(token: &TagToken, queue: &mut TokenQueue, parser: &Parser<'_>) -> Result<Repeat> {
    let times = Expression::new(parser.tokenizer(token).read_expression_tokens()?);
    let mut body = Vec::new();
    let mut stream = parser.parse_stream(queue).on_tags(&["endrepeat"]);
    while let Some(event) = stream.next()? {
        match event {
            Event::Tag(_) => stream.stop(),
            Event::Template(node) => body.push(node),
        }
    }
    stream.finish(token)?;
    Ok(Repeat { times, body })
}

#[test]
fn engine_custom_block_tag() {
    let mut engine = Engine::new();
    engine.register_tag("repeat", parse_repeat);
    let result = engine
        .parse_and_render_sync(
            "{% repeat n %}[{{ x }}]{% endrepeat %}!",
            value! { n: 3, x: "a" },
        )
        .unwrap();
    assert_eq!(result, "[a][a][a]!");
}

#[test]
fn engine_custom_block_tag_not_closed() {
    let mut engine = Engine::new();
    engine.register_tag("repeat", parse_repeat);
    let err = engine.parse("{% repeat 2 %}x").unwrap_err();
    assert_eq!(
        err.to_string(),
        "tag {% repeat 2 %} not closed, line:1, col:1"
    );
}

#[test]
fn engine_custom_operator() {
    let mut engine = Engine::new();
    engine.register_operator(Operator::binary("divides", 2, |l, r, _| {
        match (l.as_i64(), r.as_i64()) {
            (Some(l), Some(r)) if l != 0 => Value::Bool(r % l == 0),
            _ => Value::Bool(false),
        }
    }));
    let tests = [
        ("{% if 3 divides 9 %}y{% else %}n{% endif %}", "y"),
        ("{% if 2 divides 9 %}y{% else %}n{% endif %}", "n"),
        ("{% if dividesx %}y{% else %}n{% endif %}", "y"),
    ];
    for (source, expected) in tests {
        let result = engine
            .parse_and_render_sync(source, value! { dividesx: true })
            .unwrap();
        assert_eq!(result, expected, "{}", source);
    }
}

#[test]
fn engine_operator_needs_word_boundary() {
    let result = Engine::new()
        .parse_and_render_sync(
            "{% if android and orange %}y{% else %}n{% endif %}",
            value! { android: true, orange: false },
        )
        .unwrap();
    assert_eq!(result, "n");
}

#[test]
fn engine_clone_registrations_are_independent() {
    let engine = Engine::new();
    let mut other = engine.clone();
    other.register_filter("shout", |s: String| format!("{}!", s));
    let source = "{{ 'hi' | shout }}";
    assert_eq!(engine.parse_and_render_sync(source, value!({})).unwrap(), "hi");
    assert_eq!(other.parse_and_render_sync(source, value!({})).unwrap(), "hi!");
}
