use crate::error::ShaderError;
use crate::fetch::{SourceFetcher, join_location};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// One cached shader source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderEntry {
    name: String,
    source: Arc<str>,
    /// Lowercase hex SHA-256 of `source`.
    digest: String,
}

impl ShaderEntry {
    fn new(name: &str, source: String) -> Self {
        let digest = format!("{:x}", Sha256::digest(source.as_bytes()));
        Self {
            name: name.to_string(),
            source: source.into(),
            digest,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn shared_source(&self) -> Arc<str> {
        Arc::clone(&self.source)
    }

    /// Length of the source in bytes.
    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    pub fn digest_hex(&self) -> &str {
        &self.digest
    }
}

/// Name-keyed cache of shader text fetched from a single origin.
///
/// Loads are asynchronous; lookups are synchronous and never fetch. A name
/// only appears after a successful load, and a later successful load of the
/// same name replaces it. Entries are never evicted.
pub struct ShaderRegistry<F> {
    base: String,
    fetcher: F,
    entries: Mutex<BTreeMap<String, ShaderEntry>>,
    pending: Mutex<BTreeSet<String>>,
}

impl<F> ShaderRegistry<F> {
    pub fn new(base: impl Into<String>, fetcher: F) -> Self {
        Self {
            base: base.into(),
            fetcher,
            entries: Mutex::new(BTreeMap::new()),
            pending: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Resolve `name` against the base origin.
    pub fn location(&self, name: &str) -> Result<String, ShaderError> {
        validate_name(name)?;
        Ok(join_location(&self.base, name))
    }

    /// Source text for `name`.
    pub fn get(&self, name: &str) -> Result<Arc<str>, ShaderError> {
        self.entries
            .lock()
            .get(name)
            .map(ShaderEntry::shared_source)
            .ok_or_else(|| ShaderError::NotLoaded(name.to_string()))
    }

    pub fn entry(&self, name: &str) -> Result<ShaderEntry, ShaderError> {
        self.entries
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| ShaderError::NotLoaded(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.lock().contains_key(name)
    }

    /// Loaded names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Whether a load of `name` has started and not yet finished.
    pub fn is_pending(&self, name: &str) -> bool {
        self.pending.lock().contains(name)
    }
}

impl<F: SourceFetcher> ShaderRegistry<F> {
    /// Fetch `<base>/<name>` and cache the text under `name`.
    ///
    /// Fails with [`ShaderError::Conflict`] if a load of the same name is
    /// still in flight. On fetch failure the cache is left as it was.
    pub async fn load_from_file(&self, name: &str) -> Result<(), ShaderError> {
        let location = self.location(name)?;
        let _pending = PendingLoad::begin(&self.pending, name)?;

        tracing::debug!(name, %location, "fetching shader source");
        let source = self.fetcher.fetch(&location).await.map_err(|source| {
            tracing::warn!(name, error = %source, "shader fetch failed");
            ShaderError::Fetch {
                name: name.to_string(),
                source,
            }
        })?;

        let entry = ShaderEntry::new(name, source);
        let bytes = entry.len();
        let digest = entry.digest_hex().to_string();
        if let Some(previous) = self.entries.lock().insert(name.to_string(), entry) {
            tracing::debug!(
                name,
                previous = %&previous.digest_hex()[..12],
                "replaced cached shader source"
            );
        }
        tracing::info!(name, bytes, digest = %&digest[..12], "shader source loaded");
        Ok(())
    }
}

/// Marks a name as in flight for as long as the load future is alive.
struct PendingLoad<'a> {
    pending: &'a Mutex<BTreeSet<String>>,
    name: String,
}

impl<'a> PendingLoad<'a> {
    fn begin(pending: &'a Mutex<BTreeSet<String>>, name: &str) -> Result<Self, ShaderError> {
        if !pending.lock().insert(name.to_string()) {
            return Err(ShaderError::Conflict(name.to_string()));
        }
        Ok(Self {
            pending,
            name: name.to_string(),
        })
    }
}

impl Drop for PendingLoad<'_> {
    fn drop(&mut self) {
        self.pending.lock().remove(&self.name);
    }
}

/// Names are relative paths that stay inside the base origin.
fn validate_name(name: &str) -> Result<(), ShaderError> {
    let escapes = name.starts_with('/')
        || name.starts_with('\\')
        || name.split(['/', '\\']).any(|segment| segment == "..");
    if name.trim().is_empty() || escapes {
        return Err(ShaderError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::fetch::{FsFetcher, MemoryFetcher};
    use std::cell::Cell;
    use std::future::Future;
    use std::pin::pin;
    use std::task::{Context, Poll, Waker};

    const BASIC_VS: &str = "void main(){ gl_Position = vec4(0.0); }";

    fn memory_registry() -> ShaderRegistry<MemoryFetcher> {
        let fetcher = MemoryFetcher::new()
            .with("./data/shaders/basic.vs", BASIC_VS)
            .with("./data/shaders/flat.fs", "void main(){ gl_FragColor = vec4(1.0); }");
        ShaderRegistry::new("./data/shaders/", fetcher)
    }

    /// Fetcher whose futures stay pending until the gate opens.
    #[derive(Default)]
    struct GateFetcher {
        open: Cell<bool>,
    }

    impl SourceFetcher for GateFetcher {
        fn fetch(&self, location: &str) -> impl Future<Output = Result<String, FetchError>> {
            let text = format!("// {location}");
            std::future::poll_fn(move |_| {
                if self.open.get() {
                    Poll::Ready(Ok(text.clone()))
                } else {
                    Poll::Pending
                }
            })
        }
    }

    #[test]
    fn load_then_get_returns_exact_text() {
        let registry = memory_registry();
        pollster::block_on(registry.load_from_file("basic.vs")).unwrap();
        assert_eq!(&*registry.get("basic.vs").unwrap(), BASIC_VS);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("basic.vs"));
    }

    #[test]
    fn get_before_load_is_not_loaded() {
        let registry = memory_registry();
        assert_eq!(
            registry.get("basic.vs").unwrap_err(),
            ShaderError::NotLoaded("basic.vs".into())
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn missing_source_is_fetch_error_and_stays_unloaded() {
        let registry = memory_registry();
        let err = pollster::block_on(registry.load_from_file("missing.fs")).unwrap_err();
        match err {
            ShaderError::Fetch { name, source } => {
                assert_eq!(name, "missing.fs");
                assert_eq!(source.location(), "./data/shaders/missing.fs");
            }
            other => panic!("expected fetch error, got {other:?}"),
        }
        assert_eq!(
            registry.get("missing.fs").unwrap_err(),
            ShaderError::NotLoaded("missing.fs".into())
        );
        assert!(!registry.is_pending("missing.fs"));
    }

    #[test]
    fn second_load_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flat.fs");
        let registry = ShaderRegistry::new(dir.path().to_str().unwrap(), FsFetcher);

        std::fs::write(&path, "// v1").unwrap();
        pollster::block_on(registry.load_from_file("flat.fs")).unwrap();
        let first = registry.entry("flat.fs").unwrap();

        std::fs::write(&path, "// v2").unwrap();
        pollster::block_on(registry.load_from_file("flat.fs")).unwrap();
        let second = registry.entry("flat.fs").unwrap();

        assert_eq!(second.source(), "// v2");
        assert_ne!(first.digest_hex(), second.digest_hex());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn failed_reload_keeps_previous_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("basic.vs");
        let registry = ShaderRegistry::new(dir.path().to_str().unwrap(), FsFetcher);

        std::fs::write(&path, BASIC_VS).unwrap();
        pollster::block_on(registry.load_from_file("basic.vs")).unwrap();
        std::fs::remove_file(&path).unwrap();

        let err = pollster::block_on(registry.load_from_file("basic.vs")).unwrap_err();
        assert!(matches!(
            err,
            ShaderError::Fetch {
                source: FetchError::NotFound { .. },
                ..
            }
        ));
        assert_eq!(&*registry.get("basic.vs").unwrap(), BASIC_VS);
    }

    #[test]
    fn concurrent_load_of_same_name_conflicts() {
        let registry = ShaderRegistry::new("shaders", GateFetcher::default());
        let mut cx = Context::from_waker(Waker::noop());

        let mut first = pin!(registry.load_from_file("rain.fs"));
        assert!(first.as_mut().poll(&mut cx).is_pending());
        assert!(registry.is_pending("rain.fs"));

        let second = pollster::block_on(registry.load_from_file("rain.fs"));
        assert_eq!(second, Err(ShaderError::Conflict("rain.fs".into())));

        // Other names are not blocked by the pending one.
        let mut other = pin!(registry.load_from_file("rain.vs"));
        assert!(other.as_mut().poll(&mut cx).is_pending());

        registry.fetcher().open.set(true);
        assert_eq!(first.as_mut().poll(&mut cx), Poll::Ready(Ok(())));
        assert_eq!(other.as_mut().poll(&mut cx), Poll::Ready(Ok(())));
        assert_eq!(&*registry.get("rain.fs").unwrap(), "// shaders/rain.fs");
        assert!(!registry.is_pending("rain.fs"));
        assert_eq!(registry.names(), vec!["rain.fs".to_string(), "rain.vs".to_string()]);
    }

    #[test]
    fn dropped_load_releases_name() {
        let registry = ShaderRegistry::new("shaders", GateFetcher::default());
        let mut cx = Context::from_waker(Waker::noop());
        {
            let mut load = pin!(registry.load_from_file("rain.fs"));
            assert!(load.as_mut().poll(&mut cx).is_pending());
        }
        assert!(!registry.is_pending("rain.fs"));
        assert!(!registry.contains("rain.fs"));

        registry.fetcher().open.set(true);
        assert!(pollster::block_on(registry.load_from_file("rain.fs")).is_ok());
    }

    #[test]
    fn rejects_names_outside_origin() {
        let registry = memory_registry();
        for name in ["", "  ", "../secret.fs", "nested/../../x.vs", "/etc/passwd", "\\share\\a.fs"] {
            assert_eq!(
                pollster::block_on(registry.load_from_file(name)),
                Err(ShaderError::InvalidName(name.into())),
                "{name:?}"
            );
        }
        assert_eq!(
            registry.location("water/flat.fs").unwrap(),
            "./data/shaders/water/flat.fs"
        );
    }

    #[test]
    fn digest_is_sha256_of_source() {
        let entry = ShaderEntry::new("empty.fs", String::new());
        assert!(entry.is_empty());
        assert_eq!(
            entry.digest_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
