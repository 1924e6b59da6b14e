use std::cell::RefCell;

use anyhow::Result;
use tree_sitter::{Node, Parser};

use super::{fragment_parser, CodeDetector};
use crate::core::{Classification, Comment, CommentClass};

/// Detects code by the share of recognizably parsed characters in the text.
///
/// Tokens under error subtrees carry no evidence, and neither do bare
/// expression statements gluing identifiers together with member access or
/// binary operators, since prose lexes exactly that way. Everything else the
/// grammar recognized counts. A comment whose evidence covers at least three
/// quarters of its non-whitespace characters is code as a whole; this
/// detector never flags individual lines.
pub struct TokenDensityDetector {
    parser: RefCell<Parser>,
}

const CODE_DENSITY_THRESHOLD: f64 = 0.75;

impl TokenDensityDetector {
    pub fn new() -> Result<Self> {
        Ok(Self {
            parser: RefCell::new(fragment_parser()?),
        })
    }
}

impl CodeDetector for TokenDensityDetector {
    fn classify(&self, comment: &Comment) -> Vec<Classification> {
        let text = comment.sanitized_text();
        let weight: usize = text.chars().filter(|c| !c.is_whitespace()).count();
        if weight == 0 {
            return Vec::new();
        }
        let mut parser = self.parser.borrow_mut();
        let Some(tree) = parser.parse(&text, None) else {
            return Vec::new();
        };
        let evidence = evidence_chars(tree.root_node(), false);
        if evidence as f64 / weight as f64 >= CODE_DENSITY_THRESHOLD {
            vec![Classification::whole(CommentClass::Code)]
        } else {
            Vec::new()
        }
    }
}

fn evidence_chars(node: Node, in_noise: bool) -> usize {
    if node.is_error() || node.is_missing() {
        return 0;
    }
    let noise = in_noise || is_noise_root(node);
    if node.child_count() == 0 {
        if noise {
            return 0;
        }
        return node.end_byte().saturating_sub(node.start_byte());
    }
    let mut total = 0;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        total += evidence_chars(child, noise);
    }
    total
}

/// An expression statement whose expression is only identifiers glued by
/// member access or binary operators says nothing about code-ness; prose
/// like `these words - more words` lexes exactly that way.
fn is_noise_root(node: Node) -> bool {
    if node.kind() != "expression_statement" {
        return false;
    }
    node.named_child(0)
        .map(is_identifier_chain)
        .unwrap_or(false)
}

fn is_identifier_chain(node: Node) -> bool {
    match node.kind() {
        "identifier" | "member_expression" => true,
        "binary_expression" => {
            let mut cursor = node.walk();
            let chained = node.named_children(&mut cursor).all(is_identifier_chain);
            chained
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Span;
    use pretty_assertions::assert_eq;

    fn detector() -> TokenDensityDetector {
        TokenDensityDetector::new().unwrap()
    }

    fn comment(text: &str) -> Comment {
        Comment::new(Span::new(0, text.len()), text, 0)
    }

    #[test]
    fn dense_statements_are_code() {
        let result = detector().classify(&comment("// return counts.filter((c) => c > 0);"));
        assert_eq!(result, vec![Classification::whole(CommentClass::Code)]);
    }

    #[test]
    fn prose_has_almost_no_grammar_evidence() {
        let result = detector().classify(&comment("// explains why the fallback stays disabled"));
        assert_eq!(result, Vec::new());
    }

    #[test]
    fn identifier_chains_are_discounted() {
        // lexes as a subtraction of identifiers, which proves nothing
        let result = detector().classify(&comment("// some words - more words"));
        assert_eq!(result, Vec::new());
    }
}
