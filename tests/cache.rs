use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use tincture::{value, Cache, Engine, FileSystem, MemoryFileSystem, Options};

/// Counts reads and suspends once before each asynchronous read.
#[derive(Clone)]
struct CountingFs {
    inner: MemoryFileSystem,
    reads: Arc<AtomicUsize>,
}

struct YieldNow(bool);

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            return Poll::Ready(());
        }
        self.0 = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

#[async_trait]
impl FileSystem for CountingFs {
    fn exists_sync(&self, path: &str) -> bool {
        self.inner.exists_sync(path)
    }

    fn read_file_sync(&self, path: &str) -> io::Result<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read_file_sync(path)
    }

    async fn read_file(&self, path: &str) -> io::Result<String> {
        YieldNow(false).await;
        self.read_file_sync(path)
    }

    fn resolve(&self, dir: &str, file: &str, ext: &str) -> String {
        self.inner.resolve(dir, file, ext)
    }

    fn dirname(&self, path: &str) -> String {
        self.inner.dirname(path)
    }
}

fn engine(cache: Cache, files: &[(&str, &str)]) -> (Engine, Arc<AtomicUsize>) {
    let mut inner = MemoryFileSystem::new();
    for (path, contents) in files {
        inner.insert(path, *contents);
    }
    let reads = Arc::new(AtomicUsize::new(0));
    let fs = CountingFs {
        inner,
        reads: Arc::clone(&reads),
    };
    let options = Options::builder()
        .root(["/views"])
        .extname(".liquid")
        .cache(cache)
        .fs(fs)
        .build();
    (Engine::with_options(options), reads)
}

#[test]
fn cache_concurrent_renders_share_one_parse() {
    let (engine, reads) = engine(Cache::Lru(8), &[("/views/page.liquid", "{{ n }}")]);
    let (a, b) = pollster::block_on(futures::future::join(
        engine.render_file("page", value! { n: 1 }),
        engine.render_file("page", value! { n: 2 }),
    ));
    assert_eq!(a.unwrap(), "1");
    assert_eq!(b.unwrap(), "2");
    assert_eq!(reads.load(Ordering::SeqCst), 1);
}

#[test]
fn cache_disabled_reads_every_time() {
    let (engine, reads) = engine(Cache::None, &[("/views/page.liquid", "x")]);
    for _ in 0..3 {
        assert_eq!(engine.render_file_sync("page", value!({})).unwrap(), "x");
    }
    assert_eq!(reads.load(Ordering::SeqCst), 3);
}

#[test]
fn cache_partials() {
    let (engine, reads) = engine(
        Cache::Lru(8),
        &[("/views/item.liquid", "{{ item }}")],
    );
    let result = engine
        .parse_and_render_sync("{% render 'item' for (1..3) %}{% include 'item' %}", value!({}))
        .unwrap();
    assert_eq!(result, "123");
    assert_eq!(reads.load(Ordering::SeqCst), 1);
}

#[test]
fn cache_evicts_failed_parse() {
    let (engine, reads) = engine(Cache::Lru(8), &[("/views/bad.liquid", "{% if %}")]);
    assert!(engine.render_file_sync("bad", value!({})).is_err());
    assert!(engine.render_file_sync("bad", value!({})).is_err());
    assert_eq!(reads.load(Ordering::SeqCst), 2);
}
