//! The file system the engine loads templates from.
//!
//! The engine never touches the disk directly. Every lookup and read goes
//! through a [`FileSystem`] so templates can come from memory, an archive or
//! a remote store. The synchronous methods are used by the `*_sync` entry
//! points and the asynchronous ones otherwise.

use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

#[async_trait]
pub trait FileSystem: Send + Sync {
    fn exists_sync(&self, path: &str) -> bool;

    async fn exists(&self, path: &str) -> bool {
        self.exists_sync(path)
    }

    fn read_file_sync(&self, path: &str) -> io::Result<String>;

    async fn read_file(&self, path: &str) -> io::Result<String> {
        self.read_file_sync(path)
    }

    /// Joins `file` onto `dir`, appending `ext` when `file` has no extension.
    fn resolve(&self, dir: &str, file: &str, ext: &str) -> String;

    /// The directory containing `path`.
    fn dirname(&self, path: &str) -> String;

    fn sep(&self) -> &str {
        "/"
    }

    /// Whether `file` lies inside `root`.
    fn contains(&self, _root: &str, _file: &str) -> bool {
        true
    }

    /// A last resort path for `file` when no directory has it.
    fn fallback(&self, _file: &str) -> Option<String> {
        None
    }
}

/// Reads templates from the local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn exists_sync(&self, path: &str) -> bool {
        Path::new(path).is_file()
    }

    fn read_file_sync(&self, path: &str) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn resolve(&self, dir: &str, file: &str, ext: &str) -> String {
        let mut path = normalize(&Path::new(dir).join(file));
        if path.extension().is_none() && !ext.is_empty() {
            let mut name = path.into_os_string();
            name.push(ext);
            path = PathBuf::from(name);
        }
        path.to_string_lossy().into_owned()
    }

    fn dirname(&self, path: &str) -> String {
        Path::new(path)
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn sep(&self) -> &str {
        std::path::MAIN_SEPARATOR_STR
    }

    fn contains(&self, root: &str, file: &str) -> bool {
        normalize(Path::new(file)).starts_with(normalize(Path::new(root)))
    }
}

/// Lexically resolves `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            c => out.push(c),
        }
    }
    out
}

/// An in memory file system keyed by `/` separated paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: HashMap<String, String>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file, replacing any previous contents.
    pub fn insert(&mut self, path: &str, contents: impl Into<String>) -> &mut Self {
        self.files.insert(normalize_str(path), contents.into());
        self
    }
}

impl FileSystem for MemoryFileSystem {
    fn exists_sync(&self, path: &str) -> bool {
        self.files.contains_key(&normalize_str(path))
    }

    fn read_file_sync(&self, path: &str) -> io::Result<String> {
        self.files
            .get(&normalize_str(path))
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path)))
    }

    fn resolve(&self, dir: &str, file: &str, ext: &str) -> String {
        let mut path = normalize_str(&format!("{}/{}", dir, file));
        let name = path.rsplit('/').next().unwrap_or("");
        if !name.contains('.') {
            path.push_str(ext);
        }
        path
    }

    fn dirname(&self, path: &str) -> String {
        match path.rfind('/') {
            Some(i) => path[..i].to_owned(),
            None => String::from("."),
        }
    }

    fn contains(&self, root: &str, file: &str) -> bool {
        let root = normalize_str(root);
        let file = normalize_str(file);
        root == "." || file.starts_with(&format!("{}/", root))
    }
}

fn normalize_str(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.last().map_or(true, |p| *p == "..") {
                    parts.push("..");
                } else {
                    parts.pop();
                }
            }
            p => parts.push(p),
        }
    }
    if parts.is_empty() {
        String::from(".")
    } else {
        parts.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_resolve_appends_extension() {
        let fs = MemoryFileSystem::new();
        assert_eq!(fs.resolve("views", "header", ".liquid"), "views/header.liquid");
        assert_eq!(fs.resolve("views", "header.html", ".liquid"), "views/header.html");
        assert_eq!(fs.resolve("views/a", "../b", ""), "views/b");
    }

    #[test]
    fn memory_contains() {
        let fs = MemoryFileSystem::new();
        assert!(fs.contains("views", "views/a/b"));
        assert!(!fs.contains("views", "views/../secret"));
        assert!(!fs.contains("views", "viewsx/a"));
        assert!(fs.contains(".", "anything"));
    }

    #[test]
    fn memory_read() {
        let mut fs = MemoryFileSystem::new();
        fs.insert("./a/b.liquid", "hello");
        assert!(fs.exists_sync("a/b.liquid"));
        assert_eq!(fs.read_file_sync("a/./b.liquid").unwrap(), "hello");
        assert!(fs.read_file_sync("a/c").is_err());
    }

    #[test]
    fn local_resolve_and_contains() {
        let fs = LocalFileSystem;
        let path = fs.resolve("views", "partials/../header", ".liquid");
        assert_eq!(Path::new(&path), Path::new("views/header.liquid"));
        assert!(fs.contains("views", &path));
        assert!(!fs.contains("views", &fs.resolve("views", "../etc/passwd", "")));
    }
}
