//! The group: a root source file, its transitive includes, and their
//! lifecycle from parse through generation.
//!
//! A [`JsGroup`] moves through three phases:
//!
//! ```text
//! Empty ──parse()──▶ Parsed ──generate()──▶ Generated ──post_process()──▶ Generated (slim)
//!   ▲                                                                        │
//!   └───────────────────────── reset() re-parses from any phase ◀────────────┘
//! ```
//!
//! The phase is a tagged enum, not a bundle of nullable fields, so there is
//! never ambiguity about which data is valid: `Parsed` always owns a
//! directive tree, `Generated` owns an optional one (dropped by
//! `post_process()` since the tree is only needed while generating), and
//! `Empty` owns nothing. Transitions replace the whole phase value. A failed
//! `generate()` leaves the phase untouched, so the caller may fix the
//! environment and retry.
//!
//! ## Staleness
//!
//! [`JsGroup::is_stale`] compares a freshly computed content hash (file
//! contents re-read from disk) against a previously stored one — the
//! parse-time hash for in-process callers, or the persisted
//! [`StateManifest`](crate::state::StateManifest) hash across CLI runs. No
//! stored hash means unconditionally stale. This check is independent of the
//! per-target modification-time skip inside generation: the hash decides
//! whether to regenerate at all, the mtime decides which target files can be
//! skipped when we do.

use crate::config::{BuildConfig, ResourcesConfig};
use crate::directive::DirectiveTree;
use crate::generate::{GenerateError, GenerateReport, GenerationJob, generate_all};
use crate::hash::GroupHash;
use crate::modes::GenerationMode;
use crate::parse::{self, ParseError};
use crate::render::render;
use crate::resource::{LibraryBundle, ResourceFetcher, ResourceOrigin};
use std::fs;
use std::io;
use std::mem;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GroupError {
    #[error("group has not been parsed; call parse() before generate()")]
    NotParsed,
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Generate(#[from] GenerateError),
}

/// One loaded source file, immutable once read.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path relative to the group's source root.
    pub path: PathBuf,
    pub text: String,
    pub modified: SystemTime,
}

enum Phase {
    Empty,
    Parsed {
        files: Vec<SourceFile>,
        tree: DirectiveTree,
        hash: GroupHash,
    },
    Generated {
        files: Vec<SourceFile>,
        /// `None` once `post_process()` has released the tree.
        tree: Option<DirectiveTree>,
        hash: GroupHash,
    },
}

/// A directive-based JavaScript group rooted at one start file.
pub struct JsGroup {
    name: String,
    source_root: PathBuf,
    start: PathBuf,
    modes: Vec<GenerationMode>,
    version: String,
    phase: Phase,
}

impl JsGroup {
    pub fn new(
        name: impl Into<String>,
        source_root: impl Into<PathBuf>,
        start: impl Into<PathBuf>,
        modes: Vec<GenerationMode>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source_root: source_root.into(),
            start: start.into(),
            modes,
            version: version.into(),
            phase: Phase::Empty,
        }
    }

    /// Build a group from config, resolving paths against `base`.
    pub fn from_config(config: &BuildConfig, base: &Path) -> Self {
        Self::new(
            config.group.clone(),
            base.join(&config.source_root),
            &config.start,
            config.modes.clone(),
            config.version.clone(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn modes(&self) -> &[GenerationMode] {
        &self.modes
    }

    /// The ordered source file set; empty before the first parse.
    pub fn files(&self) -> &[SourceFile] {
        match &self.phase {
            Phase::Empty => &[],
            Phase::Parsed { files, .. } | Phase::Generated { files, .. } => files,
        }
    }

    /// The parse-time content hash; `None` before the first parse.
    pub fn hash(&self) -> Option<&GroupHash> {
        match &self.phase {
            Phase::Empty => None,
            Phase::Parsed { hash, .. } | Phase::Generated { hash, .. } => Some(hash),
        }
    }

    /// Most recent modification time across the file set.
    pub fn last_modified(&self) -> Option<SystemTime> {
        self.files().iter().map(|f| f.modified).max()
    }

    /// Parse the start file and its transitive includes, replacing any
    /// previously loaded file set wholesale.
    pub fn parse(&mut self) -> Result<(), ParseError> {
        let result = parse::parse(&self.source_root, &self.start, &self.version)?;
        let hash = hash_files(&result.sources);
        self.phase = Phase::Parsed { files: result.sources, tree: result.tree, hash };
        Ok(())
    }

    /// Discard all loaded state and re-parse from the start file.
    pub fn reset(&mut self) -> Result<(), ParseError> {
        self.phase = Phase::Empty;
        self.parse()
    }

    /// Render the combined source for one mode. Needs a parse tree.
    pub fn render_for(&self, mode: GenerationMode) -> Result<String, GroupError> {
        Ok(render(self.tree()?, mode))
    }

    /// Generate all configured mode artifacts under `dest`.
    ///
    /// External resources are fetched fresh on every call, before any
    /// worker spawns. On success the group moves to `Generated`; on failure
    /// it stays where it was so the caller may retry.
    pub fn generate<O: ResourceOrigin>(
        &mut self,
        dest: &Path,
        fetcher: &ResourceFetcher<O>,
        resources: &ResourcesConfig,
    ) -> Result<GenerateReport, GroupError> {
        let tree = self.tree()?;
        let libs = LibraryBundle::fetch(fetcher, resources);
        let jobs: Vec<GenerationJob> = self
            .modes
            .iter()
            .map(|&mode| GenerationJob { mode, rendered: render(tree, mode) })
            .collect();

        let report = generate_all(dest, &self.name, jobs, &libs, self.last_modified())?;

        self.phase = match mem::replace(&mut self.phase, Phase::Empty) {
            Phase::Parsed { files, tree, hash } => {
                Phase::Generated { files, tree: Some(tree), hash }
            }
            generated @ Phase::Generated { .. } => generated,
            // tree() above guarantees we were parsed or generated
            Phase::Empty => Phase::Empty,
        };
        Ok(report)
    }

    /// Release the directive tree — it is not needed after generation.
    /// Hash and file list survive for staleness checks.
    pub fn post_process(&mut self) {
        if let Phase::Generated { tree, .. } = &mut self.phase {
            *tree = None;
        }
    }

    /// Re-parse and regenerate unconditionally, then slim down.
    pub fn regenerate<O: ResourceOrigin>(
        &mut self,
        dest: &Path,
        fetcher: &ResourceFetcher<O>,
        resources: &ResourcesConfig,
    ) -> Result<GenerateReport, GroupError> {
        self.reset()?;
        let report = self.generate(dest, fetcher, resources)?;
        self.post_process();
        Ok(report)
    }

    /// Whether artifacts generated against `stored` no longer reflect the
    /// sources on disk. No stored hash forces an initial build; unreadable
    /// sources presume stale (regeneration will surface the real error).
    pub fn is_stale(&self, stored: Option<&GroupHash>) -> bool {
        let Some(stored) = stored else { return true };
        match self.current_hash() {
            Ok(Some(current)) => current != *stored,
            Ok(None) | Err(_) => true,
        }
    }

    /// Recompute the hash over the current file set, re-reading contents
    /// from disk. `None` when no files are loaded.
    fn current_hash(&self) -> io::Result<Option<GroupHash>> {
        let files = self.files();
        if files.is_empty() {
            return Ok(None);
        }
        let mut parts = Vec::with_capacity(files.len());
        for file in files {
            let text = fs::read_to_string(self.source_root.join(&file.path))?;
            parts.push((file.path.to_string_lossy().into_owned(), text));
        }
        Ok(Some(GroupHash::compute(
            parts.iter().map(|(p, t)| (p.as_str(), t.as_str())),
        )))
    }

    fn tree(&self) -> Result<&DirectiveTree, GroupError> {
        match &self.phase {
            Phase::Parsed { tree, .. } => Ok(tree),
            Phase::Generated { tree: Some(tree), .. } => Ok(tree),
            Phase::Empty | Phase::Generated { tree: None, .. } => Err(GroupError::NotParsed),
        }
    }
}

/// Parse-time hash over in-memory file contents.
fn hash_files(files: &[SourceFile]) -> GroupHash {
    let parts: Vec<(String, &str)> = files
        .iter()
        .map(|f| (f.path.to_string_lossy().into_owned(), f.text.as_str()))
        .collect();
    GroupHash::compute(parts.iter().map(|(p, t)| (p.as_str(), *t)))
}
