//! # jsgroup
//!
//! A directive-aware JavaScript bundler. A group of source files is rooted
//! at one start file; preprocessor-style comment directives (`//#include`,
//! `//#if MODE`, `//#version`) stitch the files into one artifact per
//! generation mode, with per-mode compression, a prepended runtime engine,
//! and appended external libraries.
//!
//! # Architecture: Parse, Render, Generate
//!
//! A build moves through three phases over one [`group::JsGroup`]:
//!
//! ```text
//! 1. Parse     sources  →  directive tree + content hash
//! 2. Render    tree × mode  →  combined source text   (pure)
//! 3. Generate  rendered texts  →  dist/{group}_{mode}.js   (concurrent)
//! ```
//!
//! This separation exists for three reasons:
//!
//! - **Parse once, render many**: the directive tree is mode-independent,
//!   so N modes cost one parse and N cheap renders.
//! - **Testability**: rendering is a pure function from tree and mode to
//!   text, so bundling logic is tested without touching the filesystem.
//! - **Incremental builds**: the parse-time content hash decides whether to
//!   regenerate at all; per-target modification times decide which files to
//!   skip when we do.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`directive`] | Directive vocabulary and the parsed tree representation |
//! | [`parse`] | Recursive-descent directive parser; include resolution, cycle detection |
//! | [`render`] | Pure tree × mode → combined source text |
//! | [`modes`] | The generation mode set: suffixes, compressor selection |
//! | [`compress`] | Per-mode compression: passthrough or comment/blank stripping |
//! | [`resource`] | Cached external resource fetching (libraries, engine) |
//! | [`generate`] | Concurrent per-mode artifact writing with fan-in completion |
//! | [`group`] | The group lifecycle state machine and staleness checks |
//! | [`hash`] | Order-sensitive SHA-256 content hashing over the file set |
//! | [`state`] | Persisted hash manifest for cross-run staleness checks |
//! | [`config`] | `jsgroup.toml` loading and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## One Worker Thread Per Mode
//!
//! Generation spawns one named thread per mode still needing work and
//! collects completion signals over a channel — one signal per scheduled
//! target, success or failure. Mode count is small and bounded (six), each
//! job is chunky (compress once, write twice), and a named thread per mode
//! makes failure reports directly attributable. A failing mode never
//! interrupts its siblings; all recorded failures surface together in one
//! [`generate::CompositeError`].
//!
//! ## Graceful Resource Degradation
//!
//! External libraries and the runtime engine are fetched through a cache
//! with an origin fallback, and anything unavailable is simply omitted from
//! the artifact rather than failing the build. Engine text is additionally
//! wrapped in `try { … } catch (e) {}` so a broken engine cannot take the
//! artifact down at load time.
//!
//! ## Read-Only as Commit Marker
//!
//! A finished artifact is marked read-only. A writable file at a target
//! path is an in-progress or interrupted build, never a valid artifact;
//! regeneration clears the bit before deleting.
//!
//! ## Hash and Mtime Are Independent Layers
//!
//! Content hashing answers "did the sources change since the last build"
//! across process restarts (persisted in [`state`]). The modification-time
//! check inside generation answers "is this particular target file already
//! current". Neither substitutes for the other: a hash match skips the
//! whole build, an mtime match skips one file write.

pub mod compress;
pub mod config;
pub mod directive;
pub mod generate;
pub mod group;
pub mod hash;
pub mod modes;
pub mod output;
pub mod parse;
pub mod render;
pub mod resource;
pub mod state;

#[cfg(test)]
pub(crate) mod test_helpers;
