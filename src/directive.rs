//! Directive vocabulary and the parsed source representation.
//!
//! A directive is a line whose first non-whitespace characters are `//#`,
//! followed by a token and an optional argument:
//!
//! ```text
//! //#include util/helpers.js       splice another file in place
//! //#if PRODUCTION,STATS           start a mode-conditional block
//! //#end                           close the open block
//! //#version                       replaced with the group version string
//! ```
//!
//! This module owns two things: the *registry* of recognized directive
//! tokens (what a token means), and the *tree* the parser produces (what the
//! combined source looks like). Directive semantics live in the registry so
//! callers embedding the bundler can restrict the vocabulary; parsing and
//! generation orchestration stay in [`parse`](crate::parse) and
//! [`render`](crate::render).
//!
//! ## Tree Shape
//!
//! Parsed files live in an arena ([`DirectiveTree::files`]); an include node
//! references its file by arena index, so a file included twice is parsed
//! once and spliced twice. Each file is a flat node list; only mode blocks
//! nest, and only one level deep (nested `//#if` is a parse error).

use crate::modes::GenerationMode;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Prefix that marks a directive line.
pub const DIRECTIVE_PREFIX: &str = "//#";

/// What a directive token means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    /// `//#include <path>` — splice another source file.
    Include,
    /// `//#if <modes>` — open a mode-conditional block.
    If,
    /// `//#end` — close the open block.
    End,
    /// `//#version` — versioned token, expanded at render time.
    Version,
}

/// One registered directive token.
#[derive(Debug, Clone, Copy)]
pub struct DirectiveType {
    pub token: &'static str,
    pub kind: DirectiveKind,
}

/// The stock directive vocabulary.
pub const DEFAULT_TYPES: &[DirectiveType] = &[
    DirectiveType { token: "include", kind: DirectiveKind::Include },
    DirectiveType { token: "if", kind: DirectiveKind::If },
    DirectiveType { token: "end", kind: DirectiveKind::End },
    DirectiveType { token: "version", kind: DirectiveKind::Version },
];

/// Look up a token in a registry.
pub fn lookup(token: &str, types: &[DirectiveType]) -> Option<DirectiveKind> {
    types.iter().find(|t| t.token == token).map(|t| t.kind)
}

/// Split a source line into `(token, argument)` if it is a directive line.
///
/// Returns `None` for ordinary source lines. The argument is trimmed; an
/// absent argument is the empty string.
pub fn split_directive_line(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim_start();
    let rest = trimmed.strip_prefix(DIRECTIVE_PREFIX)?;
    let rest = rest.trim_end();
    match rest.find(char::is_whitespace) {
        Some(pos) => Some((&rest[..pos], rest[pos..].trim())),
        None => Some((rest, "")),
    }
}

/// One node of a parsed file.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Verbatim source text, newlines included.
    Text(String),
    /// Splice of another parsed file, by arena index.
    Include { file: usize },
    /// Span included only when rendering for one of `modes`.
    ModeBlock {
        modes: BTreeSet<GenerationMode>,
        body: Vec<Node>,
    },
    /// Expands to the group version string.
    Version,
}

/// One parsed source file.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    /// Path relative to the group's source root.
    pub path: PathBuf,
    pub nodes: Vec<Node>,
}

/// The parsed representation of a whole group: an arena of files rooted at
/// the start file. Discarded after generation by `post_process()`.
#[derive(Debug, Clone)]
pub struct DirectiveTree {
    pub files: Vec<ParsedFile>,
    /// Arena index of the start file.
    pub root: usize,
    /// Expansion text for `//#version` nodes.
    pub version: String,
}
