//! Concurrent artifact generation: one worker per mode, fan-in completion.
//!
//! For every requested mode two sibling targets are defined — the primary
//! artifact `{group}_{suffix}.js` and its compatibility variant
//! `{group}_{suffix}_compat.js`. Targets whose on-disk modification time is
//! not older than the group's last source change are already current and
//! are skipped outright (counted as done without compression or writing);
//! stale targets are deleted up front on the orchestrating thread.
//!
//! Each mode still needing work gets one worker thread, named
//! `jsgen.<MODE>` so failure reports identify the mode. A worker compresses
//! the mode's rendered text once, then assembles and writes each of its
//! targets: engine prelude (compat/standard × minified/readable; the doc
//! mode gets none, its doc tooling chokes on engine source), compressed
//! body, external-library block. A successfully written file is marked
//! read-only — that is the commit signal; a writable file at a target path
//! is an in-progress or interrupted build, not a valid artifact.
//!
//! ## Completion Accounting
//!
//! Workers share exactly two things: an append-only error registry (a
//! lock-protected map keyed by worker name) and a completion channel. Every
//! scheduled target produces exactly one completion signal, success or not —
//! a worker that fails records its error and then signals for every target
//! it will no longer reach. The orchestrator blocks until all expected
//! signals arrive, then raises [`CompositeError`] iff the registry is
//! non-empty. Sibling workers are never interrupted by another worker's
//! failure, so a multi-mode build completes every mode it can.

use crate::compress::CompressionError;
use crate::modes::GenerationMode;
use crate::resource::LibraryBundle;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::SystemTime;
use thiserror::Error;

/// Worker thread name prefix; the full name keys the error registry.
pub const THREAD_NAME_PREFIX: &str = "jsgen.";

/// Filename suffix of the compatibility-variant artifact.
pub const COMPAT_SUFFIX: &str = "_compat";

/// Failure inside one mode's worker.
#[derive(Error, Debug)]
pub enum JobError {
    #[error(transparent)]
    Compression(#[from] CompressionError),
    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to spawn worker: {0}")]
    Spawn(io::Error),
}

/// Aggregate failure raised when one or more workers failed.
///
/// `Display` enumerates every recorded failure with its worker name;
/// `source()` is the first failure, so cause chains print full detail for
/// at least one job.
#[derive(Debug)]
pub struct CompositeError {
    errors: BTreeMap<String, JobError>,
}

impl CompositeError {
    pub fn errors(&self) -> &BTreeMap<String, JobError> {
        &self.errors
    }
}

impl fmt::Display for CompositeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} generation jobs failed", self.errors.len())?;
        for (name, error) in &self.errors {
            writeln!(f, "[{name}] {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompositeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.errors
            .values()
            .next()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Failure of a whole `generate_all` call.
#[derive(Error, Debug)]
pub enum GenerateError {
    /// Planning-phase failure (creating the destination, clearing stale
    /// targets) before any worker spawned.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Composite(#[from] CompositeError),
}

/// One mode's unit of work: the mode plus its fully rendered source text.
pub struct GenerationJob {
    pub mode: GenerationMode,
    pub rendered: String,
}

/// What one mode produced.
#[derive(Debug)]
pub struct ModeReport {
    pub mode: GenerationMode,
    pub written: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

/// Per-mode outcome of a successful `generate_all`.
#[derive(Debug)]
pub struct GenerateReport {
    pub modes: Vec<ModeReport>,
}

/// The two target paths for a group/mode pair.
pub fn target_paths(dest: &Path, group: &str, mode: GenerationMode) -> (PathBuf, PathBuf) {
    let suffix = mode.suffix();
    (
        dest.join(format!("{group}_{suffix}.js")),
        dest.join(format!("{group}_{suffix}{COMPAT_SUFFIX}.js")),
    )
}

struct Target {
    path: PathBuf,
    compat: bool,
}

struct PlannedJob {
    id: String,
    mode: GenerationMode,
    rendered: String,
    targets: Vec<Target>,
}

/// Generate all artifacts for `jobs` under `dest`.
///
/// `last_modified` is the group's most recent source change; targets at
/// least that fresh are skipped. Returns the per-mode report, or the
/// aggregate failure once every worker has signaled completion.
pub fn generate_all(
    dest: &Path,
    group: &str,
    jobs: Vec<GenerationJob>,
    libs: &LibraryBundle,
    last_modified: Option<SystemTime>,
) -> Result<GenerateReport, GenerateError> {
    fs::create_dir_all(dest)?;

    let mut planned = Vec::new();
    let mut reports = Vec::new();
    for job in jobs {
        let (primary, compat) = target_paths(dest, group, job.mode);
        let mut report = ModeReport { mode: job.mode, written: Vec::new(), skipped: Vec::new() };
        let mut targets = Vec::new();
        for (path, is_compat) in [(primary, false), (compat, true)] {
            if target_is_current(&path, last_modified)? {
                report.skipped.push(path);
            } else {
                remove_stale_target(&path)?;
                report.written.push(path.clone());
                targets.push(Target { path, compat: is_compat });
            }
        }
        reports.push(report);
        if !targets.is_empty() {
            planned.push(PlannedJob {
                id: format!("{THREAD_NAME_PREFIX}{}", job.mode),
                mode: job.mode,
                rendered: job.rendered,
                targets,
            });
        }
    }

    let errors: Mutex<BTreeMap<String, JobError>> = Mutex::new(BTreeMap::new());
    // Skipped targets count as already signaled; the expected total covers
    // exactly the scheduled ones.
    let expected: usize = planned.iter().map(|j| j.targets.len()).sum();
    let (tx, rx) = mpsc::channel::<()>();

    thread::scope(|scope| {
        for job in &planned {
            let worker_tx = tx.clone();
            let registry = &errors;
            let spawned = thread::Builder::new()
                .name(job.id.clone())
                .spawn_scoped(scope, move || run_job(job, libs, registry, &worker_tx));
            if let Err(e) = spawned {
                record(&errors, &job.id, JobError::Spawn(e));
                signal(&tx, job.targets.len());
            }
        }
        drop(tx);
        for _ in 0..expected {
            // A recv error means a worker vanished without signaling; the
            // remaining senders are gone too, so bail instead of hanging.
            if rx.recv().is_err() {
                break;
            }
        }
    });

    let errors = errors.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
    if errors.is_empty() {
        Ok(GenerateReport { modes: reports })
    } else {
        Err(CompositeError { errors }.into())
    }
}

/// Remove any existing targets for `modes`, clearing read-only bits.
/// Forced rebuilds use this to defeat the modification-time skip.
pub fn clear_targets(dest: &Path, group: &str, modes: &[GenerationMode]) -> io::Result<()> {
    for &mode in modes {
        let (primary, compat) = target_paths(dest, group, mode);
        remove_stale_target(&primary)?;
        remove_stale_target(&compat)?;
    }
    Ok(())
}

/// True when the target exists and is at least as fresh as the sources.
fn target_is_current(path: &Path, last_modified: Option<SystemTime>) -> io::Result<bool> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    match last_modified {
        Some(last) => Ok(meta.modified()? >= last),
        None => Ok(false),
    }
}

/// Delete an out-of-date target, clearing its read-only bit first.
fn remove_stale_target(path: &Path) -> io::Result<()> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    let mut perms = meta.permissions();
    if perms.readonly() {
        perms.set_readonly(false);
        fs::set_permissions(path, perms)?;
    }
    fs::remove_file(path)
}

fn run_job(
    job: &PlannedJob,
    libs: &LibraryBundle,
    errors: &Mutex<BTreeMap<String, JobError>>,
    tx: &Sender<()>,
) {
    let mut remaining = job.targets.len();
    let compressed = match job.mode.compressor().compress(&job.rendered, &job.targets[0].path) {
        Ok(compressed) => compressed,
        Err(e) => {
            record(errors, &job.id, e.into());
            signal(tx, remaining);
            return;
        }
    };

    for target in &job.targets {
        remaining -= 1;
        match write_target(job.mode, target, &compressed, libs) {
            Ok(()) => signal(tx, 1),
            Err(e) => {
                record(errors, &job.id, e);
                // this target plus everything we will no longer reach
                signal(tx, remaining + 1);
                return;
            }
        }
    }
}

fn write_target(
    mode: GenerationMode,
    target: &Target,
    compressed: &str,
    libs: &LibraryBundle,
) -> Result<(), JobError> {
    let engine = if mode == GenerationMode::Doc {
        ""
    } else {
        libs.engine_for(mode, target.compat)
    };
    let libraries = libs.libraries_for(mode);

    let mut out = String::with_capacity(engine.len() + compressed.len() + libraries.len() + 1);
    out.push_str(engine);
    out.push_str(compressed);
    out.push('\n');
    out.push_str(libraries);

    fs::write(&target.path, out)
        .map_err(|source| JobError::Write { path: target.path.clone(), source })?;
    mark_read_only(&target.path)
        .map_err(|source| JobError::Write { path: target.path.clone(), source })
}

/// Read-only is the commit marker for a finished artifact.
fn mark_read_only(path: &Path) -> io::Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_readonly(true);
    fs::set_permissions(path, perms)
}

fn record(errors: &Mutex<BTreeMap<String, JobError>>, id: &str, error: JobError) {
    let mut map = errors.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    map.entry(id.to_string()).or_insert(error);
}

fn signal(tx: &Sender<()>, count: usize) {
    for _ in 0..count {
        // The receiver outlives the scope; a send can only fail if the
        // orchestrator already bailed, in which case nobody is counting.
        let _ = tx.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn job(mode: GenerationMode, rendered: &str) -> GenerationJob {
        GenerationJob { mode, rendered: rendered.to_string() }
    }

    fn past() -> Option<SystemTime> {
        Some(SystemTime::now() - Duration::from_secs(3600))
    }

    // =========================================================================
    // Basic generation
    // =========================================================================

    #[test]
    fn writes_primary_and_compat_per_mode() {
        let tmp = TempDir::new().unwrap();
        let libs = LibraryBundle::default();
        let jobs = vec![job(GenerationMode::Development, "var a;\n")];

        let report = generate_all(tmp.path(), "app", jobs, &libs, past()).unwrap();

        assert!(tmp.path().join("app_dev.js").exists());
        assert!(tmp.path().join("app_dev_compat.js").exists());
        assert_eq!(report.modes.len(), 1);
        assert_eq!(report.modes[0].written.len(), 2);
        assert!(report.modes[0].skipped.is_empty());
    }

    #[test]
    fn artifacts_are_read_only() {
        let tmp = TempDir::new().unwrap();
        let jobs = vec![job(GenerationMode::Development, "x\n")];
        generate_all(tmp.path(), "app", jobs, &LibraryBundle::default(), past()).unwrap();

        let meta = fs::metadata(tmp.path().join("app_dev.js")).unwrap();
        assert!(meta.permissions().readonly());
    }

    #[test]
    fn production_body_is_minified() {
        let tmp = TempDir::new().unwrap();
        let jobs = vec![job(GenerationMode::Production, "var a = 1; // comment\n")];
        generate_all(tmp.path(), "app", jobs, &LibraryBundle::default(), past()).unwrap();

        let body = fs::read_to_string(tmp.path().join("app_prod.js")).unwrap();
        assert!(!body.contains("comment"));
        assert!(body.contains("var a = 1;"));
    }

    #[test]
    fn multiple_modes_generate_concurrently() {
        let tmp = TempDir::new().unwrap();
        let jobs = vec![
            job(GenerationMode::Development, "dev\n"),
            job(GenerationMode::Production, "prod\n"),
            job(GenerationMode::Doc, "doc\n"),
        ];
        generate_all(tmp.path(), "app", jobs, &LibraryBundle::default(), past()).unwrap();

        for name in ["app_dev.js", "app_prod.js", "app_doc.js"] {
            assert!(tmp.path().join(name).exists(), "{name} missing");
        }
    }

    // =========================================================================
    // Up-to-date skip
    // =========================================================================

    #[test]
    fn current_targets_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let libs = LibraryBundle::default();
        let jobs = vec![job(GenerationMode::Development, "v1\n")];
        generate_all(tmp.path(), "app", jobs, &libs, past()).unwrap();

        let primary = tmp.path().join("app_dev.js");
        let before = fs::read_to_string(&primary).unwrap();
        let mtime_before = fs::metadata(&primary).unwrap().modified().unwrap();

        // Same last-modified: artifacts newer than sources, nothing rewritten.
        let jobs = vec![job(GenerationMode::Development, "v2\n")];
        let report = generate_all(tmp.path(), "app", jobs, &libs, past()).unwrap();

        assert_eq!(report.modes[0].skipped.len(), 2);
        assert!(report.modes[0].written.is_empty());
        assert_eq!(fs::read_to_string(&primary).unwrap(), before);
        assert_eq!(fs::metadata(&primary).unwrap().modified().unwrap(), mtime_before);
    }

    #[test]
    fn stale_targets_are_rewritten() {
        let tmp = TempDir::new().unwrap();
        let libs = LibraryBundle::default();
        generate_all(
            tmp.path(),
            "app",
            vec![job(GenerationMode::Development, "v1\n")],
            &libs,
            past(),
        )
        .unwrap();

        // Sources now newer than the artifacts: regenerate.
        let future = Some(SystemTime::now() + Duration::from_secs(3600));
        generate_all(
            tmp.path(),
            "app",
            vec![job(GenerationMode::Development, "v2\n")],
            &libs,
            future,
        )
        .unwrap();

        let body = fs::read_to_string(tmp.path().join("app_dev.js")).unwrap();
        assert!(body.contains("v2"));
    }

    #[test]
    fn double_generate_is_byte_identical() {
        let tmp = TempDir::new().unwrap();
        let libs = LibraryBundle::default();
        let run = |text: &str| {
            generate_all(
                tmp.path(),
                "app",
                vec![job(GenerationMode::Production, text)],
                &libs,
                past(),
            )
            .unwrap();
            fs::read(tmp.path().join("app_prod.js")).unwrap()
        };
        assert_eq!(run("var a;\n"), run("var a;\n"));
    }

    // =========================================================================
    // Partial failure
    // =========================================================================

    #[cfg(unix)]
    #[test]
    fn failing_mode_does_not_stop_siblings() {
        use std::error::Error;
        use std::os::unix::fs::symlink;

        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("dest");
        fs::create_dir_all(&dest).unwrap();

        // Route production's primary target through a symlink into a
        // directory that does not exist, so its write fails with NotFound
        // regardless of the uid the tests run under; development is
        // untouched. The dangling link also reads as "target absent" to the
        // up-to-date check, so the job is scheduled, not skipped.
        symlink(tmp.path().join("missing/out.js"), dest.join("app_prod.js")).unwrap();

        let jobs = vec![
            job(GenerationMode::Development, "dev\n"),
            job(GenerationMode::Production, "prod\n"),
        ];
        let err = generate_all(&dest, "app", jobs, &LibraryBundle::default(), past()).unwrap_err();

        let GenerateError::Composite(composite) = err else {
            panic!("expected composite error");
        };
        assert_eq!(composite.errors().len(), 1);
        assert!(composite.errors().contains_key("jsgen.PRODUCTION"));
        assert!(format!("{composite}").contains("jsgen.PRODUCTION"));
        assert!(composite.source().is_some());

        // The sibling completed: written, read-only, correct.
        let dev = dest.join("app_dev.js");
        assert!(fs::metadata(&dev).unwrap().permissions().readonly());
        assert!(fs::read_to_string(&dev).unwrap().contains("dev"));
    }

    #[test]
    fn composite_display_lists_every_failure() {
        let mut errors = BTreeMap::new();
        errors.insert(
            "jsgen.DEVELOPMENT".to_string(),
            JobError::Write {
                path: PathBuf::from("a.js"),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            },
        );
        errors.insert(
            "jsgen.PRODUCTION".to_string(),
            JobError::Write {
                path: PathBuf::from("b.js"),
                source: io::Error::other("disk full"),
            },
        );
        let composite = CompositeError { errors };
        let text = format!("{composite}");
        assert!(text.starts_with("2 generation jobs failed"));
        assert!(text.contains("[jsgen.DEVELOPMENT]"));
        assert!(text.contains("[jsgen.PRODUCTION]"));
        assert!(text.contains("disk full"));
    }

    #[test]
    fn target_paths_follow_naming_scheme() {
        let (primary, compat) = target_paths(Path::new("dist"), "app", GenerationMode::Production);
        assert_eq!(primary, Path::new("dist/app_prod.js"));
        assert_eq!(compat, Path::new("dist/app_prod_compat.js"));
    }
}
