use std::cell::RefCell;

use anyhow::Result;
use tree_sitter::Parser;

use super::{code_classification, fragment_parser, non_blank_line_indices, parses_cleanly, CodeDetector};
use crate::core::{Classification, Comment, CommentClass};

/// Detects commented-out code by actually parsing comment text.
///
/// The whole sanitized comment is tried first. If that fails, subranges are
/// tried from the bottom up: for each end line the longest clean range ending
/// there wins, then the scan continues above it. This catches code snippets
/// interleaved with prose.
pub struct ParseAttemptDetector {
    parser: RefCell<Parser>,
}

impl ParseAttemptDetector {
    pub fn new() -> Result<Self> {
        Ok(Self {
            parser: RefCell::new(fragment_parser()?),
        })
    }

    fn parses_as_code(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        let mut parser = self.parser.borrow_mut();
        match parser.parse(text, None) {
            Some(tree) => tree.root_node().named_child_count() > 0 && parses_cleanly(&tree),
            None => false,
        }
    }
}

impl CodeDetector for ParseAttemptDetector {
    fn classify(&self, comment: &Comment) -> Vec<Classification> {
        let lines: Vec<&str> = comment
            .sanitized_lines()
            .iter()
            .map(|l| l.text.as_str())
            .collect();
        let non_blank = non_blank_line_indices(comment);
        if non_blank.is_empty() {
            return Vec::new();
        }

        if self.parses_as_code(&lines.join("\n")) {
            return vec![Classification::whole(CommentClass::Code)];
        }

        let blank = |i: usize| lines[i].trim().is_empty();
        let mut code_lines: Vec<usize> = Vec::new();
        let mut end = non_blank[non_blank.len() - 1] as isize;
        while end >= 0 {
            let right = end as usize;
            if blank(right) {
                end -= 1;
                continue;
            }
            // longest clean range ending at `right`: lowest clean start wins
            let found = (0..=right)
                .filter(|&s| !blank(s))
                .find(|&s| self.parses_as_code(&lines[s..=right].join("\n")));
            match found {
                Some(start) => {
                    code_lines.extend((start..=right).filter(|&i| !blank(i)));
                    end = start as isize - 1;
                }
                None => end -= 1,
            }
        }
        code_lines.sort_unstable();
        code_classification(code_lines, &non_blank)
    }
}
