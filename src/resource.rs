//! Resource fetching: logical library/engine paths → text, with a cache.
//!
//! The bundler appends auxiliary libraries (a date/time library, a
//! sanitizer) and prepends a runtime engine to every artifact. Those pieces
//! are not part of the source group — they are resolved by logical path
//! through a [`ResourceFetcher`], which consults an on-disk cache directory
//! first and falls back to a [`ResourceOrigin`] on a miss, caching what it
//! finds.
//!
//! ## Graceful Degradation
//!
//! A resource that cannot be resolved is returned as `None`, never as an
//! error. The bundler historically runs with an empty cache on first
//! execution and must still produce a usable (if incomplete) artifact, so
//! callers treat `None` as "omit this block".
//!
//! ## Cache Writes
//!
//! Cache entries are keyed by logical path and written via temp-file +
//! atomic rename, so a concurrent fetch of the same path never reads a
//! half-written entry. Fetching is idempotent: two racers write identical
//! bytes and whichever rename lands last wins harmlessly.

use crate::config::ResourcesConfig;
use crate::modes::GenerationMode;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// External source of resource content: filesystem directory, archive,
/// network mirror — anything that can map a logical path to text.
pub trait ResourceOrigin {
    /// `Ok(None)` means "this origin does not have the resource".
    fn load(&self, logical: &str) -> io::Result<Option<String>>;
}

/// Directory-backed origin: logical paths resolve under a root directory.
pub struct DirOrigin {
    root: PathBuf,
}

impl DirOrigin {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResourceOrigin for DirOrigin {
    fn load(&self, logical: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.root.join(logical)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Path-keyed caching fetcher over a [`ResourceOrigin`].
pub struct ResourceFetcher<O> {
    cache_dir: PathBuf,
    origin: O,
}

impl<O: ResourceOrigin> ResourceFetcher<O> {
    pub fn new(cache_dir: impl Into<PathBuf>, origin: O) -> Self {
        Self { cache_dir: cache_dir.into(), origin }
    }

    /// Resolve a logical path to text. `None` when unavailable; never fails.
    pub fn fetch(&self, logical: &str) -> Option<String> {
        let cached = self.cache_dir.join(logical);
        if let Ok(text) = fs::read_to_string(&cached) {
            return Some(text);
        }

        let text = self.origin.load(logical).ok().flatten()?;
        // Cache failures are not worth failing the fetch over; the next
        // build will simply hit the origin again.
        let _ = self.store(&cached, &text);
        Some(text)
    }

    fn store(&self, cached: &Path, text: &str) -> io::Result<()> {
        let parent = cached.parent().unwrap_or(&self.cache_dir);
        fs::create_dir_all(parent)?;
        let tmp = tempfile::NamedTempFile::new_in(parent)?;
        fs::write(tmp.path(), text)?;
        tmp.persist(cached).map_err(|e| e.error)?;
        Ok(())
    }
}

/// All external text a `generate()` call appends around the compressed body,
/// fetched once, sequentially, before any worker thread spawns.
///
/// Engine text is wrapped in `try { … } catch (e) {}` so a broken or
/// partially-fetched engine cannot take the whole artifact down at load
/// time. The compat variant requires both the compat helpers and the compat
/// engine; if either is missing the whole variant is omitted.
#[derive(Debug, Default, Clone)]
pub struct LibraryBundle {
    libraries: String,
    libraries_min: String,
    engine: String,
    engine_min: String,
    engine_compat: String,
    engine_compat_min: String,
}

impl LibraryBundle {
    pub fn fetch<O: ResourceOrigin>(
        fetcher: &ResourceFetcher<O>,
        resources: &ResourcesConfig,
    ) -> Self {
        let mut libs = String::new();
        let mut libs_min = String::new();
        for path in &resources.libraries {
            if let Some(source) = fetcher.fetch(&format!("{path}.js")) {
                libs.push_str(&source);
            }
            if let Some(source) = fetcher.fetch(&format!("{path}.min.js")) {
                libs_min.push_str(&source);
            }
        }

        let mut bundle = LibraryBundle::default();
        if !libs.is_empty() {
            bundle.libraries = format!("\n(function externalLibraries() {{\n{libs}\n}})();");
        }
        if !libs_min.is_empty() {
            bundle.libraries_min = format!("\n(function externalLibraries() {{ {libs_min} }})();");
        }

        if let Some(engine) = &resources.engine {
            if let Some(source) = fetcher.fetch(&format!("{engine}.js")) {
                bundle.engine = format!("try {{\n{source}\n}} catch (e) {{}}");
            }
            if let Some(source) = fetcher.fetch(&format!("{engine}.min.js")) {
                bundle.engine_min = format!("try {{ {source} }} catch (e) {{}}");
            }

            // Compat needs helpers + compat engine together.
            if let Some(helpers) = &resources.compat_helpers {
                let compat = fetcher.fetch(&format!("{engine}_compat.js"));
                let helpers_src = fetcher.fetch(&format!("{helpers}.js"));
                if let (Some(compat), Some(helpers_src)) = (compat, helpers_src) {
                    bundle.engine_compat =
                        format!("try {{\n{helpers_src}\n{compat}\n}} catch (e) {{}}");
                }

                let compat_min = fetcher.fetch(&format!("{engine}_compat.min.js"));
                let helpers_min = fetcher.fetch(&format!("{helpers}.min.js"));
                if let (Some(compat_min), Some(helpers_min)) = (compat_min, helpers_min) {
                    bundle.engine_compat_min =
                        format!("try {{ {helpers_min}\n{compat_min} }} catch (e) {{}}");
                }
            }
        }
        bundle
    }

    /// Library block for a mode: minified for production-grade modes.
    pub fn libraries_for(&self, mode: GenerationMode) -> &str {
        if mode.allowed_in_production() {
            &self.libraries_min
        } else {
            &self.libraries
        }
    }

    /// Engine prelude for a target: compat vs standard crossed with
    /// minified vs readable.
    pub fn engine_for(&self, mode: GenerationMode, compat: bool) -> &str {
        match (mode.allowed_in_production(), compat) {
            (true, true) => &self.engine_compat_min,
            (true, false) => &self.engine_min,
            (false, true) => &self.engine_compat,
            (false, false) => &self.engine,
        }
    }
}
