//! Compression backends for rendered mode content.
//!
//! Each generation mode owns one backend, called exactly once per mode per
//! `generate()` as an opaque transform `(source, artifact name) → text`.
//! Two backends ship:
//!
//! - [`Passthrough`] — returns the source unchanged (development, testing,
//!   doc, and debug flavors).
//! - [`JsMinifier`] — a conservative whitespace/comment stripper for the
//!   production flavor.
//!
//! ## Minifier Scope
//!
//! The minifier removes line comments, block comments, trailing whitespace,
//! and blank lines. It tracks string literals (single, double, and template
//! quotes) so `//` inside a string — URLs being the common case — is never
//! treated as a comment. It does **not** attempt regex-literal detection; a
//! `//` inside a regex literal would be misread, so division followed by a
//! regex on one line is the documented limitation. Identifiers and statement
//! structure are never touched, which keeps the transform safe at the cost
//! of a few bytes.

use std::path::PathBuf;
use thiserror::Error;

/// Failure inside a compression backend.
///
/// Carries the artifact name the backend was producing so the aggregate
/// error can name the failing mode output.
#[derive(Error, Debug)]
#[error("compression of {} failed: {message}", .artifact.display())]
pub struct CompressionError {
    pub artifact: PathBuf,
    pub message: String,
}

/// Opaque per-mode transform from rendered source to artifact body.
pub trait Compressor: Send + Sync {
    fn compress(&self, source: &str, artifact: &std::path::Path) -> Result<String, CompressionError>;
}

/// No-op backend: the artifact body is the rendered source verbatim.
pub struct Passthrough;

impl Compressor for Passthrough {
    fn compress(&self, source: &str, _artifact: &std::path::Path) -> Result<String, CompressionError> {
        Ok(source.to_string())
    }
}

/// Conservative JavaScript minifier: strips comments and dead whitespace.
pub struct JsMinifier;

impl Compressor for JsMinifier {
    fn compress(&self, source: &str, _artifact: &std::path::Path) -> Result<String, CompressionError> {
        Ok(strip_comments_and_blanks(source))
    }
}

/// Lexer state while scanning for comment boundaries.
#[derive(Clone, Copy, PartialEq)]
enum State {
    Code,
    LineComment,
    BlockComment,
    Str(char), // inside a quoted literal; the char is the closing quote
}

fn strip_comments_and_blanks(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut state = State::Code;
    let mut chars = source.chars().peekable();
    let mut line = String::new();

    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                '/' => match chars.peek() {
                    Some('/') => {
                        chars.next();
                        state = State::LineComment;
                    }
                    Some('*') => {
                        chars.next();
                        state = State::BlockComment;
                    }
                    _ => line.push(c),
                },
                '"' | '\'' | '`' => {
                    state = State::Str(c);
                    line.push(c);
                }
                '\n' => flush_line(&mut out, &mut line),
                _ => line.push(c),
            },
            State::LineComment => {
                if c == '\n' {
                    state = State::Code;
                    flush_line(&mut out, &mut line);
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = State::Code;
                } else if c == '\n' {
                    // keep line structure around multi-line block comments
                    flush_line(&mut out, &mut line);
                }
            }
            State::Str(quote) => {
                line.push(c);
                if c == '\\' {
                    if let Some(escaped) = chars.next() {
                        line.push(escaped);
                    }
                } else if c == quote {
                    state = State::Code;
                } else if c == '\n' && quote != '`' {
                    // unterminated plain string; fall back to code scanning
                    state = State::Code;
                }
            }
        }
    }
    flush_line(&mut out, &mut line);
    out
}

/// Append the pending line, trimmed, dropping it entirely when blank.
fn flush_line(out: &mut String, line: &mut String) {
    let trimmed = line.trim();
    if !trimmed.is_empty() {
        out.push_str(trimmed);
        out.push('\n');
    }
    line.clear();
}
