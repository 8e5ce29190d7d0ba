//! CLI output formatting.
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure — no I/O, no side effects.
//!
//! ## Build
//!
//! ```text
//! app
//!     DEVELOPMENT
//!         app_dev.js: written
//!         app_dev_compat.js: written
//!     PRODUCTION
//!         app_prod.js: skipped (up to date)
//!         app_prod_compat.js: skipped (up to date)
//! Generated 2 modes: 2 written, 2 skipped
//! ```
//!
//! ## Check
//!
//! ```text
//! app: stale (sources changed since last build)
//! ```

use crate::generate::GenerateReport;
use std::path::Path;

/// Display a target path as its filename; the destination directory is
/// already known from the header context.
fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Format build output: per-mode target status plus a summary line.
pub fn format_build_output(group: &str, report: &GenerateReport) -> Vec<String> {
    let mut lines = vec![group.to_string()];
    let mut written = 0;
    let mut skipped = 0;

    for mode in &report.modes {
        lines.push(format!("    {}", mode.mode.name()));
        for path in &mode.written {
            lines.push(format!("        {}: written", file_name(path)));
            written += 1;
        }
        for path in &mode.skipped {
            lines.push(format!("        {}: skipped (up to date)", file_name(path)));
            skipped += 1;
        }
    }

    lines.push(format!(
        "Generated {} modes: {} written, {} skipped",
        report.modes.len(),
        written,
        skipped
    ));
    lines
}

/// Print build output to stdout.
pub fn print_build_output(group: &str, report: &GenerateReport) {
    for line in format_build_output(group, report) {
        println!("{}", line);
    }
}

/// Format check output: one line stating whether artifacts are current.
pub fn format_check_output(group: &str, stale: bool) -> String {
    if stale {
        format!("{}: stale (sources changed since last build)", group)
    } else {
        format!("{}: up to date", group)
    }
}

/// Print check output to stdout.
pub fn print_check_output(group: &str, stale: bool) {
    println!("{}", format_check_output(group, stale));
}
