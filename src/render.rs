//! Mode content building: directive tree + target mode → final source text.
//!
//! Rendering collapses the directive tree to plain source for one mode:
//! include nodes splice the referenced file's rendered content in place,
//! mode blocks contribute their body only when their mode set contains the
//! target mode (otherwise nothing — not even a comment — is emitted), and
//! version tokens expand to the group version string.
//!
//! Rendering is pure: no disk or network I/O, and byte-identical output for
//! the same tree and mode. Text outside directives is preserved exactly, so
//! two modes can differ only within mode-conditional spans.

use crate::directive::{DirectiveTree, Node};
use crate::modes::GenerationMode;

/// Render the combined source text for one mode.
pub fn render(tree: &DirectiveTree, mode: GenerationMode) -> String {
    let mut out = String::new();
    render_nodes(tree, &tree.files[tree.root].nodes, mode, &mut out);
    out
}

fn render_nodes(tree: &DirectiveTree, nodes: &[Node], mode: GenerationMode, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Include { file } => {
                render_nodes(tree, &tree.files[*file].nodes, mode, out);
            }
            Node::ModeBlock { modes, body } => {
                if modes.contains(&mode) {
                    render_nodes(tree, body, mode, out);
                }
            }
            Node::Version => out.push_str(&tree.version),
        }
    }
}
