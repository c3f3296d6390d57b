use std::fmt;

use crate::types::options::Options;
use crate::{Error, ErrorKind, Result};

/// Which directories a template file is looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupType {
    Root,
    Partials,
    Layouts,
}

impl fmt::Display for LookupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Root => "root",
            Self::Partials => "partials",
            Self::Layouts => "layouts",
        };
        f.write_str(s)
    }
}

/// Whether `file` is written relative to the file referencing it.
pub(crate) fn looks_relative(file: &str, sep: &str) -> bool {
    file.starts_with("./")
        || file.starts_with("../")
        || file.strip_prefix('.').map_or(false, |rest| rest.starts_with(sep))
        || file.strip_prefix("..").map_or(false, |rest| rest.starts_with(sep))
}

/// Resolves `file` to the first candidate path that exists.
pub(crate) async fn lookup(
    options: &Options,
    file: &str,
    current: Option<&str>,
    kind: LookupType,
    sync: bool,
) -> Result<String> {
    let fs = &options.fs;
    for path in candidates(options, file, current, kind) {
        let exists = if sync {
            fs.exists_sync(&path)
        } else {
            fs.exists(&path).await
        };
        if exists {
            tracing::debug!(%file, %path, lookup = %kind, "resolved template");
            return Ok(path);
        }
    }
    tracing::debug!(%file, lookup = %kind, "template not found");
    Err(Error::new(ErrorKind::Lookup {
        file: file.to_owned(),
        dirs: dirs(options, kind).to_vec(),
    }))
}

fn dirs(options: &Options, kind: LookupType) -> &[String] {
    match kind {
        LookupType::Root => &options.root,
        LookupType::Partials => &options.partials,
        LookupType::Layouts => &options.layouts,
    }
}

/// Candidate paths in order of preference.
///
/// A relative reference is tried first, then every directory and finally
/// the file system fallback. Partials and layouts must stay inside their
/// directories.
fn candidates(options: &Options, file: &str, current: Option<&str>, kind: LookupType) -> Vec<String> {
    let fs = &options.fs;
    let dirs = dirs(options, kind);
    let enforce = kind != LookupType::Root;
    let mut paths = Vec::new();

    if let Some(current) = current {
        if options.relative_reference && looks_relative(file, fs.sep()) {
            let path = fs.resolve(&fs.dirname(current), file, &options.extname);
            if dirs.iter().any(|dir| !enforce || fs.contains(dir, &path)) {
                paths.push(path);
            }
        }
    }
    for dir in dirs {
        let path = fs.resolve(dir, file, &options.extname);
        if !enforce || fs.contains(dir, &path) {
            paths.push(path);
        }
    }
    paths.extend(fs.fallback(file));
    paths
}
