use std::sync::Arc;

use crate::compile::{self, LookupType, Parser, TokenQueue, Tokenizer};
use crate::expr::{eval_token, Hash};
use crate::render::{render_nodes, render_to_string, Context, Emitter};
use crate::tags::TagKind;
use crate::types::template::Node;
use crate::types::token::{ExprToken, TagToken};
use crate::value::{DropValue, ForloopDrop, Map};
use crate::{Error, Result, Value};

/// The file argument of `include`, `render` and `layout`.
pub(super) enum FilePath {
    /// `none`, only meaningful for `layout`.
    None,
    Literal(String),
    /// A name containing outputs, like `"card-{{ kind }}"`.
    Template(Vec<Node>),
    Expr(ExprToken),
}

/// Reads a file argument.
///
/// With dynamic partials the argument is a value: a quoted name may contain
/// outputs and anything else is evaluated. Otherwise the name is read
/// literally up to the next blank or comma.
pub(super) fn parse_file_path(t: &mut Tokenizer<'_>, parser: &Parser<'_>, tag: &TagToken) -> Result<FilePath> {
    let options = parser.options();
    if !options.dynamic_partials {
        let tokens = t.read_file_name_template(options)?;
        return Ok(match optimize(parser.parse_tokens(tokens)?) {
            FilePath::Literal(name) if name == "none" => FilePath::None,
            path => path,
        });
    }
    let Some(token) = t.read_value()? else {
        return Err(Error::assertion(format!("illegal argument \"{}\"", tag.args())));
    };
    if token.text() == "none" {
        return Ok(FilePath::None);
    }
    if let ExprToken::Quoted { value, .. } = &token {
        let file = tag.file().map(|f| f.as_ref());
        return Ok(optimize(parser.parse(value, file)?));
    }
    Ok(FilePath::Expr(token))
}

fn optimize(nodes: Vec<Node>) -> FilePath {
    match nodes.as_slice() {
        [] => FilePath::Literal(String::new()),
        [Node::Html(html)] => FilePath::Literal(html.value().to_owned()),
        _ => FilePath::Template(nodes),
    }
}

/// Renders a file argument to a file name, `None` for `none`.
pub(super) async fn render_file_path(path: &FilePath, ctx: &mut Context) -> Result<Option<String>> {
    let file = match path {
        FilePath::None => return Ok(None),
        FilePath::Literal(name) => name.clone(),
        FilePath::Template(nodes) => render_to_string(nodes, ctx).await?,
        FilePath::Expr(token) => eval_token(token, ctx, false).await?.to_string(),
    };
    if file.is_empty() {
        return Err(Error::assertion(format!("illegal file path \"{}\"", file)));
    }
    Ok(Some(file))
}

async fn required_file_path(path: &FilePath, ctx: &mut Context) -> Result<String> {
    render_file_path(path, ctx)
        .await?
        .ok_or_else(|| Error::assertion("illegal file path \"none\""))
}

fn current_file(tag: &TagToken) -> Option<String> {
    tag.file().map(|f| f.to_string())
}

////////////////////////////////////////////////////////////////////////////////
// include
////////////////////////////////////////////////////////////////////////////////

/// `{% include "file" with value key: value %}`
///
/// Renders a partial in the current scope. The `with` value is bound to a
/// variable named after the file. In Jekyll mode the arguments are written
/// `key=value` and are available as `include.key`.
pub struct Include {
    file: FilePath,
    current: Option<String>,
    with: Option<ExprToken>,
    hash: Hash,
}

pub(super) fn parse_include(token: &TagToken, _: &mut TokenQueue, parser: &Parser<'_>) -> Result<TagKind> {
    let mut t = parser.tokenizer(token);
    let file = parse_file_path(&mut t, parser, token)?;

    let begin = t.position();
    let mut with = None;
    if t.read_identifier().text() == "with" {
        t.skip_blank();
        if t.peek() != Some(':') {
            with = t.read_value()?;
        }
    }
    if with.is_none() {
        t.reset(begin);
    }

    let options = parser.options();
    let separator = if options.jekyll_include {
        "="
    } else {
        options.key_value_separator.as_str()
    };
    let hash = Hash::parse(&mut t, separator)?;
    Ok(TagKind::Include(Include {
        file,
        current: current_file(token),
        with,
        hash,
    }))
}

impl Include {
    pub(super) async fn render(&self, ctx: &mut Context, emitter: &mut dyn Emitter) -> Result<()> {
        let file = required_file_path(&self.file, ctx).await?;
        let saved = ctx.registers_mut().save_blocks();
        let result = self.render_file(file, ctx, emitter).await;
        ctx.registers_mut().restore_blocks(saved);
        result
    }

    async fn render_file(&self, file: String, ctx: &mut Context, emitter: &mut dyn Emitter) -> Result<()> {
        let mut scope = self.hash.render(ctx).await?;
        if let Some(with) = &self.with {
            let value = eval_token(with, ctx, false).await?;
            scope.insert(file.clone(), value);
        }
        let template = compile::parse_file(
            Arc::clone(ctx.engine()),
            file,
            self.current.clone(),
            LookupType::Partials,
            ctx.is_sync(),
        )
        .await?;
        let scope = if ctx.opts().jekyll_include {
            Map::from_iter([(String::from("include"), Value::Object(scope))])
        } else {
            scope
        };
        ctx.push(scope);
        let result = render_nodes(template.nodes(), ctx, emitter).await;
        ctx.pop();
        result
    }
}

////////////////////////////////////////////////////////////////////////////////
// render
////////////////////////////////////////////////////////////////////////////////

/// `{% render "file" with value as name, key: value %}` or
/// `{% render "file" for items as item %}`
///
/// Renders a partial in an isolated context that only sees its arguments
/// and the globals.
pub struct Render {
    file: FilePath,
    current: Option<String>,
    with: Option<Binding>,
    each: Option<Binding>,
    hash: Hash,
}

struct Binding {
    value: ExprToken,
    alias: Option<String>,
}

pub(super) fn parse_render(token: &TagToken, _: &mut TokenQueue, parser: &Parser<'_>) -> Result<TagKind> {
    let mut t = parser.tokenizer(token);
    let file = parse_file_path(&mut t, parser, token)?;
    let mut with = None;
    let mut each = None;

    while !t.end() {
        t.skip_blank();
        let begin = t.position();
        let keyword = t.read_identifier();
        let keyword = keyword.text();
        if keyword == "with" || keyword == "for" {
            t.skip_blank();
            // `with: true` is an ordinary argument
            if t.peek() != Some(':') {
                if let Some(value) = t.read_value()? {
                    let before_as = t.position();
                    let alias = if t.read_identifier().text() == "as" {
                        Some(t.read_identifier().text().to_owned())
                    } else {
                        t.reset(before_as);
                        None
                    };
                    let binding = Some(Binding { value, alias });
                    if keyword == "with" {
                        with = binding;
                    } else {
                        each = binding;
                    }
                    t.eat(",");
                    continue;
                }
            }
        }
        t.reset(begin);
        break;
    }

    let hash = Hash::parse(&mut t, &parser.options().key_value_separator)?;
    Ok(TagKind::Render(Render {
        file,
        current: current_file(token),
        with,
        each,
        hash,
    }))
}

impl Render {
    pub(super) async fn render(&self, ctx: &mut Context, emitter: &mut dyn Emitter) -> Result<()> {
        let file = required_file_path(&self.file, ctx).await?;
        let mut scope = self.hash.render(ctx).await?;
        if let Some(Binding { value, alias }) = &self.with {
            let value = eval_token(value, ctx, false).await?;
            scope.insert(alias.clone().unwrap_or_else(|| file.clone()), value);
        }
        let mut child = ctx.spawn(scope);

        let Some(Binding { value, alias }) = &self.each else {
            let template = self.load(file, &child).await?;
            return render_nodes(template.nodes(), &mut child, emitter).await;
        };
        let items = eval_token(value, ctx, false).await?.into_enumerable();
        let name = alias.clone().unwrap_or_else(|| file.clone());
        let template = self.load(file, &child).await?;
        let mut forloop = ForloopDrop::new(items.len(), value.text(), &name);
        for item in items {
            let env = child.environments_mut();
            env.insert(String::from("forloop"), Value::Drop(DropValue::Forloop(forloop.clone())));
            env.insert(name.clone(), item);
            render_nodes(template.nodes(), &mut child, emitter).await?;
            forloop.next();
        }
        Ok(())
    }

    async fn load(&self, file: String, ctx: &Context) -> Result<crate::Template> {
        compile::parse_file(
            Arc::clone(ctx.engine()),
            file,
            self.current.clone(),
            LookupType::Partials,
            ctx.is_sync(),
        )
        .await
    }
}
