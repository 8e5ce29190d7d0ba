//! Directive parsing: root file plus transitive includes → [`DirectiveTree`].
//!
//! Parsing is single-pass and depth-first over includes. As each `//#include`
//! is encountered, the referenced file is read, registered into the group's
//! ordered source file sequence (discovery order, exactly once), and parsed
//! recursively before scanning of the including file continues. A file
//! included a second time references the already-parsed arena entry — it is
//! neither re-read nor reordered.
//!
//! Text outside directive lines is preserved verbatim, comments and
//! whitespace included. Directive lines themselves never reach the output.
//!
//! ## Validation
//!
//! The parser rejects, with source position:
//! - unknown `//#` tokens,
//! - `//#include` with a missing argument or an unresolvable path,
//! - circular includes,
//! - nested `//#if` blocks, `//#end` with no open block, and blocks still
//!   open at end of file,
//! - unrecognized mode names in an `//#if` mode set.

use crate::directive::{
    DEFAULT_TYPES, DirectiveKind, DirectiveTree, DirectiveType, Node, ParsedFile,
    lookup, split_directive_line,
};
use crate::group::SourceFile;
use crate::modes::GenerationMode;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("{}:{line}: unknown directive `//#{token}`", .file.display())]
    UnknownDirective { file: PathBuf, line: usize, token: String },
    #[error("{}:{line}: malformed `//#{token}` directive: {message}", .file.display())]
    Malformed { file: PathBuf, line: usize, token: String, message: String },
    #[error("{}:{line}: include not found: {include}", .file.display())]
    MissingInclude { file: PathBuf, line: usize, include: String },
    #[error("{}:{line}: circular include of {include}", .file.display())]
    CircularInclude { file: PathBuf, line: usize, include: String },
    #[error("{}:{line}: `//#if` blocks cannot nest", .file.display())]
    NestedBlock { file: PathBuf, line: usize },
    #[error("{}:{line}: `//#end` without an open `//#if`", .file.display())]
    UnmatchedEnd { file: PathBuf, line: usize },
    #[error("{}: `//#if` block still open at end of file", .file.display())]
    UnterminatedBlock { file: PathBuf },
}

/// Everything the parse pass produces: the tree plus the ordered source
/// files discovered along the way.
#[derive(Debug)]
pub struct ParseResult {
    pub tree: DirectiveTree,
    pub sources: Vec<SourceFile>,
}

/// Parse `start` (relative to `source_root`) and its transitive includes.
pub fn parse(source_root: &Path, start: &Path, version: &str) -> Result<ParseResult, ParseError> {
    parse_with_types(source_root, start, version, DEFAULT_TYPES)
}

/// Parse with a custom directive vocabulary.
pub fn parse_with_types(
    source_root: &Path,
    start: &Path,
    version: &str,
    types: &[DirectiveType],
) -> Result<ParseResult, ParseError> {
    let mut parser = DirectiveParser {
        source_root,
        types,
        files: Vec::new(),
        index: HashMap::new(),
        in_progress: HashSet::new(),
        sources: Vec::new(),
    };
    let root = parser.parse_file(start, None)?;
    Ok(ParseResult {
        tree: DirectiveTree {
            files: parser.files,
            root,
            version: version.to_string(),
        },
        sources: parser.sources,
    })
}

struct DirectiveParser<'a> {
    source_root: &'a Path,
    types: &'a [DirectiveType],
    files: Vec<ParsedFile>,
    /// normalized relative path → arena index
    index: HashMap<PathBuf, usize>,
    in_progress: HashSet<PathBuf>,
    sources: Vec<SourceFile>,
}

/// Where an include directive occurred, for error reporting.
struct IncludeSite<'a> {
    file: &'a Path,
    line: usize,
}

impl DirectiveParser<'_> {
    fn parse_file(&mut self, rel: &Path, site: Option<IncludeSite>) -> Result<usize, ParseError> {
        let rel = normalize(rel);

        // A file still being parsed is also already in the index, so the
        // cycle check must come first; completed files have left
        // `in_progress` and hit the reuse path below.
        if self.in_progress.contains(&rel) {
            let site = site.expect("the start file cannot include itself before being parsed");
            return Err(ParseError::CircularInclude {
                file: site.file.to_path_buf(),
                line: site.line,
                include: rel.display().to_string(),
            });
        }
        if let Some(&idx) = self.index.get(&rel) {
            return Ok(idx);
        }

        let abs = self.source_root.join(&rel);
        let text = match fs::read_to_string(&abs) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return match site {
                    Some(site) => Err(ParseError::MissingInclude {
                        file: site.file.to_path_buf(),
                        line: site.line,
                        include: rel.display().to_string(),
                    }),
                    None => Err(ParseError::Io(e)),
                };
            }
            Err(e) => return Err(ParseError::Io(e)),
        };
        let modified = fs::metadata(&abs)?.modified()?;

        // Register in discovery order, before descending into includes.
        self.sources.push(SourceFile {
            path: rel.clone(),
            text: text.clone(),
            modified,
        });

        // Reserve the arena slot so the start file stays at index 0.
        let idx = self.files.len();
        self.files.push(ParsedFile { path: rel.clone(), nodes: Vec::new() });
        self.index.insert(rel.clone(), idx);
        self.in_progress.insert(rel.clone());

        let nodes = self.parse_nodes(&rel, &text)?;

        self.in_progress.remove(&rel);
        self.files[idx].nodes = nodes;
        Ok(idx)
    }

    fn parse_nodes(&mut self, file: &Path, text: &str) -> Result<Vec<Node>, ParseError> {
        let mut nodes = Vec::new();
        let mut buffer = String::new();
        // open `//#if` block: (mode set, body so far, body text buffer)
        let mut block: Option<(BTreeSet<GenerationMode>, Vec<Node>, String)> = None;

        for (lineno, line) in text.split_inclusive('\n').enumerate() {
            let lineno = lineno + 1;
            let Some((token, arg)) = split_directive_line(line) else {
                match &mut block {
                    Some((_, _, body_buffer)) => body_buffer.push_str(line),
                    None => buffer.push_str(line),
                }
                continue;
            };

            let kind = lookup(token, self.types).ok_or_else(|| ParseError::UnknownDirective {
                file: file.to_path_buf(),
                line: lineno,
                token: token.to_string(),
            })?;

            match kind {
                DirectiveKind::Include => {
                    if arg.is_empty() {
                        return Err(ParseError::Malformed {
                            file: file.to_path_buf(),
                            line: lineno,
                            token: token.to_string(),
                            message: "missing include path".to_string(),
                        });
                    }
                    // Paths resolve relative to the including file.
                    let child_rel = match file.parent() {
                        Some(parent) => parent.join(arg),
                        None => PathBuf::from(arg),
                    };
                    let child = self.parse_file(&child_rel, Some(IncludeSite { file, line: lineno }))?;
                    push_node(&mut nodes, &mut buffer, &mut block, Node::Include { file: child });
                }
                DirectiveKind::If => {
                    if block.is_some() {
                        return Err(ParseError::NestedBlock {
                            file: file.to_path_buf(),
                            line: lineno,
                        });
                    }
                    let modes = parse_mode_set(file, lineno, token, arg)?;
                    flush_text(&mut nodes, &mut buffer);
                    block = Some((modes, Vec::new(), String::new()));
                }
                DirectiveKind::End => {
                    let Some((modes, mut body, mut body_buffer)) = block.take() else {
                        return Err(ParseError::UnmatchedEnd {
                            file: file.to_path_buf(),
                            line: lineno,
                        });
                    };
                    flush_text(&mut body, &mut body_buffer);
                    nodes.push(Node::ModeBlock { modes, body });
                }
                DirectiveKind::Version => {
                    push_node(&mut nodes, &mut buffer, &mut block, Node::Version);
                }
            }
        }

        if block.is_some() {
            return Err(ParseError::UnterminatedBlock { file: file.to_path_buf() });
        }
        flush_text(&mut nodes, &mut buffer);
        Ok(nodes)
    }
}

fn parse_mode_set(
    file: &Path,
    line: usize,
    token: &str,
    arg: &str,
) -> Result<BTreeSet<GenerationMode>, ParseError> {
    let malformed = |message: String| ParseError::Malformed {
        file: file.to_path_buf(),
        line,
        token: token.to_string(),
        message,
    };
    if arg.is_empty() {
        return Err(malformed("missing mode set".to_string()));
    }
    let mut modes = BTreeSet::new();
    for name in arg.split(',') {
        let name = name.trim();
        let mode: GenerationMode = name.parse().map_err(|e| malformed(format!("{e}")))?;
        modes.insert(mode);
    }
    Ok(modes)
}

/// Push a non-text node, flushing pending text first, into the open block
/// body or the file's node list.
fn push_node(
    nodes: &mut Vec<Node>,
    buffer: &mut String,
    block: &mut Option<(BTreeSet<GenerationMode>, Vec<Node>, String)>,
    node: Node,
) {
    match block {
        Some((_, body, body_buffer)) => {
            flush_text(body, body_buffer);
            body.push(node);
        }
        None => {
            flush_text(nodes, buffer);
            nodes.push(node);
        }
    }
}

fn flush_text(nodes: &mut Vec<Node>, buffer: &mut String) {
    if !buffer.is_empty() {
        nodes.push(Node::Text(std::mem::take(buffer)));
    }
}

/// Lexically normalize a relative path: drop `.`, resolve `..` against the
/// stack where possible.
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
            other => out.push(other.as_os_str()),
        }
    }
    out
}
