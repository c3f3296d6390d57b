use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::compile::cache::{LruCache, ParseCache};
use crate::fs::{FileSystem, LocalFileSystem};
use crate::value::Map;

/// The engine configuration.
///
/// Use [`Options::default()`] to get the default configuration and
/// [`Options::builder()`] to customize it.
#[derive(Clone)]
pub struct Options {
    pub(crate) root: Vec<String>,
    pub(crate) partials: Vec<String>,
    pub(crate) layouts: Vec<String>,
    pub(crate) extname: String,
    pub(crate) relative_reference: bool,
    pub(crate) dynamic_partials: bool,
    pub(crate) cache: Option<Arc<dyn ParseCache>>,
    pub(crate) strict_variables: bool,
    pub(crate) strict_filters: bool,
    pub(crate) own_property_only: bool,
    pub(crate) js_truthy: bool,
    pub(crate) lenient_if: bool,
    pub(crate) output_escape: OutputEscape,
    pub(crate) greedy: bool,
    pub(crate) trim_tag_left: bool,
    pub(crate) trim_tag_right: bool,
    pub(crate) trim_output_left: bool,
    pub(crate) trim_output_right: bool,
    pub(crate) tag_delimiter_left: String,
    pub(crate) tag_delimiter_right: String,
    pub(crate) output_delimiter_left: String,
    pub(crate) output_delimiter_right: String,
    pub(crate) keep_output_type: bool,
    pub(crate) catch_all_errors: bool,
    pub(crate) ordered_filter_parameters: bool,
    pub(crate) key_value_separator: String,
    pub(crate) jekyll_include: bool,
    pub(crate) globals: Arc<Map>,
    pub(crate) parse_limit: usize,
    pub(crate) render_limit: Option<Duration>,
    pub(crate) memory_limit: u64,
    pub(crate) fs: Arc<dyn FileSystem>,
}

/// Which template cache the engine uses for parsed files.
#[derive(Clone, Default)]
pub enum Cache {
    /// Every file is read and parsed on each use.
    #[default]
    None,
    /// A least recently used cache holding at most this many templates.
    Lru(usize),
    /// A user provided cache.
    Custom(Arc<dyn ParseCache>),
}

/// The filter appended to every output expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputEscape {
    #[default]
    None,
    /// HTML escape using the `escape` filter.
    Escape,
    /// Encode as JSON using the `json` filter.
    Json,
    /// Any registered filter by name.
    Custom(String),
}

impl OutputEscape {
    pub(crate) fn filter_name(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Escape => Some("escape"),
            Self::Json => Some("json"),
            Self::Custom(name) => Some(name),
        }
    }
}

/// Overrides for a single render call.
///
/// Fields left as `None` fall back to the engine [`Options`].
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Replaces the engine globals.
    pub globals: Option<Map>,
    pub strict_variables: Option<bool>,
    pub own_property_only: Option<bool>,
    pub render_limit: Option<Duration>,
    pub memory_limit: Option<u64>,
}

impl Default for Options {
    /// Returns the default configuration.
    ///
    /// This is equivalent to the following.
    /// ```
    /// use tincture::Options;
    ///
    /// let options = Options::builder()
    ///     .root(["."])
    ///     .tag_delimiters("{%", "%}")
    ///     .output_delimiters("{{", "}}")
    ///     .greedy(true)
    ///     .build();
    /// ```
    #[inline]
    fn default() -> Self {
        OptionsBuilder::new().build()
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("root", &self.root)
            .field("partials", &self.partials)
            .field("layouts", &self.layouts)
            .field("extname", &self.extname)
            .field("cache", &self.cache.is_some())
            .field("strict_variables", &self.strict_variables)
            .field("strict_filters", &self.strict_filters)
            .field("output_escape", &self.output_escape)
            .field("greedy", &self.greedy)
            .finish_non_exhaustive()
    }
}

impl Options {
    /// Create a new options builder.
    ///
    /// # Examples
    ///
    /// ```
    /// let options = tincture::Options::builder()
    ///     .strict_variables(true)
    ///     .output_delimiters("<%=", "%>")
    ///     .build();
    /// ```
    #[inline]
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::new()
    }

    /// The extension appended to file names that have none.
    pub fn extname(&self) -> &str {
        &self.extname
    }

    pub fn strict_variables(&self) -> bool {
        self.strict_variables
    }

    pub fn js_truthy(&self) -> bool {
        self.js_truthy
    }

    pub fn globals(&self) -> &Map {
        &self.globals
    }
}

/// A builder for the engine configuration.
///
/// This struct is typically created using [`Options::builder()`].
#[derive(Clone)]
pub struct OptionsBuilder {
    root: Vec<String>,
    partials: Option<Vec<String>>,
    layouts: Option<Vec<String>>,
    cache: Cache,
    options: Options,
}

impl OptionsBuilder {
    /// Creates a new options builder.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            root: vec![String::from(".")],
            partials: None,
            layouts: None,
            cache: Cache::None,
            options: Options {
                root: Vec::new(),
                partials: Vec::new(),
                layouts: Vec::new(),
                extname: String::new(),
                relative_reference: true,
                dynamic_partials: true,
                cache: None,
                strict_variables: false,
                strict_filters: false,
                own_property_only: true,
                js_truthy: false,
                lenient_if: false,
                output_escape: OutputEscape::None,
                greedy: true,
                trim_tag_left: false,
                trim_tag_right: false,
                trim_output_left: false,
                trim_output_right: false,
                tag_delimiter_left: String::from("{%"),
                tag_delimiter_right: String::from("%}"),
                output_delimiter_left: String::from("{{"),
                output_delimiter_right: String::from("}}"),
                keep_output_type: false,
                catch_all_errors: false,
                ordered_filter_parameters: false,
                key_value_separator: String::from(":"),
                jekyll_include: false,
                globals: Arc::new(Map::new()),
                parse_limit: usize::MAX,
                render_limit: None,
                memory_limit: u64::MAX,
                fs: Arc::new(LocalFileSystem),
            },
        }
    }

    /// Set the directories searched by `render_file` and `parse_file`.
    ///
    /// Partials and layouts default to the same directories.
    pub fn root<I, S>(&mut self, dirs: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.root = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Set the directories searched by `include` and `render`.
    pub fn partials<I, S>(&mut self, dirs: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.partials = Some(dirs.into_iter().map(Into::into).collect());
        self
    }

    /// Set the directories searched by `layout`.
    pub fn layouts<I, S>(&mut self, dirs: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.layouts = Some(dirs.into_iter().map(Into::into).collect());
        self
    }

    /// Set the extension appended to file names without one, e.g. `.liquid`.
    pub fn extname(&mut self, ext: impl Into<String>) -> &mut Self {
        self.options.extname = ext.into();
        self
    }

    /// Whether `./` and `../` paths resolve against the including file.
    pub fn relative_reference(&mut self, yes: bool) -> &mut Self {
        self.options.relative_reference = yes;
        self
    }

    /// Whether file names in `include`, `render` and `layout` are
    /// expressions. When disabled they are read as literal text that may
    /// contain outputs.
    pub fn dynamic_partials(&mut self, yes: bool) -> &mut Self {
        self.options.dynamic_partials = yes;
        self
    }

    pub fn cache(&mut self, cache: Cache) -> &mut Self {
        self.cache = cache;
        self
    }

    /// Reading an undefined variable raises an error instead of producing
    /// `nil`.
    pub fn strict_variables(&mut self, yes: bool) -> &mut Self {
        self.options.strict_variables = yes;
        self
    }

    /// Using an unregistered filter raises an error at parse time instead of
    /// being skipped.
    pub fn strict_filters(&mut self, yes: bool) -> &mut Self {
        self.options.strict_filters = yes;
        self
    }

    pub fn own_property_only(&mut self, yes: bool) -> &mut Self {
        self.options.own_property_only = yes;
        self
    }

    /// Treat `0`, `""` and `NaN` as falsy in conditions.
    pub fn js_truthy(&mut self, yes: bool) -> &mut Self {
        self.options.js_truthy = yes;
        self
    }

    /// Conditions and a leading `default` filter tolerate undefined
    /// variables even with strict variables enabled.
    pub fn lenient_if(&mut self, yes: bool) -> &mut Self {
        self.options.lenient_if = yes;
        self
    }

    pub fn output_escape(&mut self, escape: OutputEscape) -> &mut Self {
        self.options.output_escape = escape;
        self
    }

    /// Whether trim markers remove all adjacent whitespace including
    /// newlines. Otherwise only inline blanks and one newline are removed.
    pub fn greedy(&mut self, yes: bool) -> &mut Self {
        self.options.greedy = yes;
        self
    }

    pub fn trim_tag_left(&mut self, yes: bool) -> &mut Self {
        self.options.trim_tag_left = yes;
        self
    }

    pub fn trim_tag_right(&mut self, yes: bool) -> &mut Self {
        self.options.trim_tag_right = yes;
        self
    }

    pub fn trim_output_left(&mut self, yes: bool) -> &mut Self {
        self.options.trim_output_left = yes;
        self
    }

    pub fn trim_output_right(&mut self, yes: bool) -> &mut Self {
        self.options.trim_output_right = yes;
        self
    }

    /// Set the tag delimiters.
    ///
    /// # Panics
    ///
    /// If either of the strings are empty.
    pub fn tag_delimiters(&mut self, left: &str, right: &str) -> &mut Self {
        assert!(!left.is_empty() && !right.is_empty());
        self.options.tag_delimiter_left = left.into();
        self.options.tag_delimiter_right = right.into();
        self
    }

    /// Set the output delimiters.
    ///
    /// # Panics
    ///
    /// If either of the strings are empty.
    pub fn output_delimiters(&mut self, left: &str, right: &str) -> &mut Self {
        assert!(!left.is_empty() && !right.is_empty());
        self.options.output_delimiter_left = left.into();
        self.options.output_delimiter_right = right.into();
        self
    }

    /// A template consisting of a single output renders to the native value
    /// with [`Renderer::to_value`][crate::Renderer::to_value].
    pub fn keep_output_type(&mut self, yes: bool) -> &mut Self {
        self.options.keep_output_type = yes;
        self
    }

    /// Continue past failing nodes and report every error at the end.
    pub fn catch_all_errors(&mut self, yes: bool) -> &mut Self {
        self.options.catch_all_errors = yes;
        self
    }

    /// Apply `for` modifiers in the order they are written instead of
    /// `offset`, `limit`, `reversed`.
    pub fn ordered_filter_parameters(&mut self, yes: bool) -> &mut Self {
        self.options.ordered_filter_parameters = yes;
        self
    }

    /// # Panics
    ///
    /// If the separator is empty.
    pub fn key_value_separator(&mut self, sep: &str) -> &mut Self {
        assert!(!sep.is_empty());
        self.options.key_value_separator = sep.into();
        self
    }

    /// Use `key=value` arguments for `include`, available under `include`.
    pub fn jekyll_include(&mut self, yes: bool) -> &mut Self {
        self.options.jekyll_include = yes;
        self
    }

    /// Variables visible to every render.
    pub fn globals(&mut self, globals: Map) -> &mut Self {
        self.options.globals = Arc::new(globals);
        self
    }

    /// Maximum length in bytes of a parsed template.
    pub fn parse_limit(&mut self, limit: usize) -> &mut Self {
        self.options.parse_limit = limit;
        self
    }

    /// Maximum wall clock time of a render.
    pub fn render_limit(&mut self, limit: Duration) -> &mut Self {
        self.options.render_limit = Some(limit);
        self
    }

    /// Maximum total size of values produced by filters in a render.
    pub fn memory_limit(&mut self, limit: u64) -> &mut Self {
        self.options.memory_limit = limit;
        self
    }

    /// Set the file system templates are loaded from.
    pub fn fs<F>(&mut self, fs: F) -> &mut Self
    where
        F: FileSystem + 'static,
    {
        self.options.fs = Arc::new(fs);
        self
    }

    /// Builds the configuration.
    pub fn build(&self) -> Options {
        let mut options = self.options.clone();
        options.root = self.root.clone();
        options.partials = self.partials.clone().unwrap_or_else(|| self.root.clone());
        options.layouts = self.layouts.clone().unwrap_or_else(|| self.root.clone());
        options.cache = match &self.cache {
            Cache::None => None,
            Cache::Lru(capacity) => Some(Arc::new(LruCache::new(*capacity))),
            Cache::Custom(cache) => Some(Arc::clone(cache)),
        };
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_default_dirs() {
        let options = Options::builder().root(["views"]).build();
        assert_eq!(options.root, ["views"]);
        assert_eq!(options.partials, ["views"]);
        assert_eq!(options.layouts, ["views"]);
    }

    #[test]
    fn options_explicit_partials() {
        let options = Options::builder()
            .root(["views"])
            .partials(["views/partials", "shared"])
            .build();
        assert_eq!(options.partials, ["views/partials", "shared"]);
        assert_eq!(options.layouts, ["views"]);
    }

    #[test]
    fn options_cache() {
        assert!(Options::default().cache.is_none());
        let options = Options::builder().cache(Cache::Lru(8)).build();
        assert!(options.cache.is_some());
    }

    #[test]
    fn output_escape_filter_name() {
        assert_eq!(OutputEscape::None.filter_name(), None);
        assert_eq!(OutputEscape::Escape.filter_name(), Some("escape"));
        assert_eq!(
            OutputEscape::Custom(String::from("upcase")).filter_name(),
            Some("upcase")
        );
    }
}
