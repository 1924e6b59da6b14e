mod lexical;
mod parse_attempt;
mod token_density;

pub use lexical::LexicalDetector;
pub use parse_attempt::ParseAttemptDetector;
pub use token_density::TokenDensityDetector;

use anyhow::{Context, Result};
use tree_sitter::{Node, Parser, Tree};

use crate::core::{Classification, Comment, CommentClass};

/// Decides whether a comment carries commented-out code, either as a whole
/// or on a subset of its lines.
pub trait CodeDetector {
    fn classify(&self, comment: &Comment) -> Vec<Classification>;
}

/// Fresh parser for the detector grammar. Comments are JS-flavored even in
/// TypeScript sources, so detectors always parse fragments as JavaScript.
pub(crate) fn fragment_parser() -> Result<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_javascript::LANGUAGE.into())
        .context("failed to load the JavaScript grammar for code detection")?;
    Ok(parser)
}

/// A fragment parses cleanly when its tree has no error nodes and every
/// missing token the parser inserted is a closing bracket. Truncated code in
/// comments routinely drops trailing `}`, `)` or `]`.
pub(crate) fn parses_cleanly(tree: &Tree) -> bool {
    node_is_clean(tree.root_node())
}

fn node_is_clean(node: Node) -> bool {
    if node.is_error() {
        return false;
    }
    if node.is_missing() && !matches!(node.kind(), "}" | ")" | "]") {
        return false;
    }
    let mut cursor = node.walk();
    let clean = node.children(&mut cursor).all(node_is_clean);
    clean
}

/// Normalizes a detector's per-line verdicts: no code lines means no
/// classification, all non-blank lines being code means the whole comment is
/// code, anything in between is a partial classification.
pub(crate) fn code_classification(
    code_lines: Vec<usize>,
    non_blank: &[usize],
) -> Vec<Classification> {
    if code_lines.is_empty() {
        return Vec::new();
    }
    if !non_blank.is_empty() && non_blank.iter().all(|l| code_lines.contains(l)) {
        return vec![Classification::whole(CommentClass::Code)];
    }
    vec![Classification::partial(CommentClass::Code, code_lines)]
}

pub(crate) fn non_blank_line_indices(comment: &Comment) -> Vec<usize> {
    comment
        .sanitized_lines()
        .iter()
        .enumerate()
        .filter(|(_, l)| !l.text.trim().is_empty())
        .map(|(i, _)| i)
        .collect()
}
