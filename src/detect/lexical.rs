use std::cell::RefCell;

use anyhow::Result;
use tree_sitter::{Node, Parser};

use super::{code_classification, fragment_parser, non_blank_line_indices, CodeDetector};
use crate::core::{Classification, Comment};

/// Detects code lines by how the parser lexes each line in isolation.
///
/// Natural language lexed as JavaScript degenerates into bare identifiers in
/// unused-expression positions and raw error tokens. A line where such
/// flagged tokens make up at least half of its whitespace-separated tokens is
/// treated as prose; everything below that ratio reads like code.
pub struct LexicalDetector {
    parser: RefCell<Parser>,
}

const PROSE_TOKEN_RATIO: f64 = 0.5;

impl LexicalDetector {
    pub fn new() -> Result<Self> {
        Ok(Self {
            parser: RefCell::new(fragment_parser()?),
        })
    }

    fn flagged_token_ratio(&self, line: &str) -> f64 {
        let token_count = line.split_whitespace().count();
        if token_count == 0 {
            return 1.0;
        }
        let mut parser = self.parser.borrow_mut();
        let Some(tree) = parser.parse(line, None) else {
            return 1.0;
        };
        let flagged = count_flagged(tree.root_node());
        flagged as f64 / token_count as f64
    }
}

fn count_flagged(node: Node) -> usize {
    let mut count = 0;
    if node.kind() == "identifier" {
        let parental_noise = node
            .parent()
            .map(|p| {
                matches!(
                    p.kind(),
                    "expression_statement" | "program" | "sequence_expression"
                ) || p.is_error()
            })
            .unwrap_or(false);
        if parental_noise {
            count += 1;
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        count += count_flagged(child);
    }
    count
}

impl CodeDetector for LexicalDetector {
    fn classify(&self, comment: &Comment) -> Vec<Classification> {
        let non_blank = non_blank_line_indices(comment);
        let code_lines: Vec<usize> = non_blank
            .iter()
            .copied()
            .filter(|&i| {
                self.flagged_token_ratio(&comment.sanitized_lines()[i].text) < PROSE_TOKEN_RATIO
            })
            .collect();
        code_classification(code_lines, &non_blank)
    }
}
