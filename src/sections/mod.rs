use crate::core::{NodeId, Span};
use crate::index::{IntervalTree, SourceIndex};
use crate::metrics::NestingLevelCollector;

/// A contiguous run of same-level code lines inside a function body.
/// `low` and `high` are inclusive line numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub low: usize,
    pub high: usize,
}

/// Sections of one function, indexed for containment queries.
pub struct FunctionSections {
    tree: IntervalTree<Section>,
}

impl FunctionSections {
    fn new(sections: Vec<Section>) -> Self {
        let items = sections
            .into_iter()
            .map(|s| (Span::new(s.low, s.high + 1), s))
            .collect();
        Self {
            tree: IntervalTree::new(items),
        }
    }

    /// The innermost section containing the line.
    pub fn section_containing(&self, line: usize) -> Option<Section> {
        self.tree.stab(line).first().map(|(_, s)| *s)
    }

    /// The section containing the line, or the next one starting after it.
    pub fn section_at_or_after(&self, line: usize) -> Option<Section> {
        if let Some(section) = self.section_containing(line) {
            return Some(section);
        }
        self.tree
            .iter()
            .map(|(_, s)| *s)
            .filter(|s| s.low >= line)
            .min_by_key(|s| s.low)
    }

    pub fn iter(&self) -> impl Iterator<Item = Section> + '_ {
        self.tree.iter().map(|(_, s)| *s)
    }
}

/// Splits a function body into logical sections.
///
/// A section is a run of lines at one nesting level. Lines without a code
/// anchor (blank lines, comment-only lines, closing braces) are skipped with
/// a look-ahead: if the next anchored line is at the same level, the section
/// closes at the last anchored line before the gap and a new one opens after.
/// Deeper lines open nested sections; a shallower line closes the current
/// section without being consumed. Recursion is capped at `max_depth`.
pub fn detect_sections(
    index: &SourceIndex,
    nesting: &mut NestingLevelCollector,
    function: NodeId,
    max_depth: usize,
) -> FunctionSections {
    let node = index.arena().node(function);
    let mut sections = Vec::new();
    if node.end_line > node.start_line + 1 {
        let mut scan = SectionScan {
            index,
            nesting,
            max_depth,
        };
        let last = node.end_line - 1;
        let first = ((node.start_line + 1)..=last).find(|&l| scan.line_level(l).is_some());
        if let Some(start) = first {
            let mut line = start;
            let level = scan
                .line_level(start)
                .unwrap_or_default();
            scan.scope(&mut line, last, level, 0, &mut sections);
        }
    }
    FunctionSections::new(sections)
}

struct SectionScan<'a, 'b> {
    index: &'a SourceIndex,
    nesting: &'b mut NestingLevelCollector,
    max_depth: usize,
}

impl SectionScan<'_, '_> {
    /// Nesting level of the line's anchoring node, or None for lines that
    /// anchor no section (blank, comment-only, or starting no node).
    fn line_level(&mut self, line: usize) -> Option<u32> {
        if !self.index.is_code_line(line) {
            return None;
        }
        let node = self.index.most_enclosing_node_for_line(line)?;
        Some(self.nesting.level(self.index.arena(), node))
    }

    fn next_anchored_line(&mut self, from: usize, last: usize) -> Option<usize> {
        (from..=last).find(|&l| self.line_level(l).is_some())
    }

    fn scope(
        &mut self,
        line: &mut usize,
        last: usize,
        level: u32,
        depth: usize,
        out: &mut Vec<Section>,
    ) {
        let mut open: Option<usize> = None;
        let mut previous_anchor = *line;
        while *line <= last {
            let current = *line;
            match self.line_level(current) {
                None => {
                    let Some(next) = self.next_anchored_line(current + 1, last) else {
                        break;
                    };
                    let next_level = self.line_level(next).unwrap_or_default();
                    if next_level == level {
                        if let Some(low) = open.take() {
                            out.push(Section {
                                low,
                                high: previous_anchor,
                            });
                        }
                    }
                    *line = next;
                }
                Some(l) if l == level => {
                    if open.is_none() {
                        open = Some(current);
                    }
                    previous_anchor = current;
                    *line = current + 1;
                }
                Some(l) if l > level => {
                    if depth < self.max_depth {
                        self.scope(line, last, l, depth + 1, out);
                    } else {
                        *line = current + 1;
                    }
                }
                // a shallower line closes this scope and stays unconsumed
                Some(_) => break,
            }
        }
        if let Some(low) = open {
            out.push(Section {
                low,
                high: previous_anchor.max(low),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SyntaxArena;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use tree_sitter::Parser;

    fn sections_of(source: &str) -> Vec<Section> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
            .unwrap();
        let index = SourceIndex::new(SyntaxArena::parse(&mut parser, source).unwrap());
        let func = index.function_likes()[0];
        let mut nesting = NestingLevelCollector::new();
        let sections = detect_sections(&index, &mut nesting, func, 64);
        let mut all: Vec<Section> = sections.iter().collect();
        all.sort_by_key(|s| (s.low, s.high));
        all
    }

    #[test]
    fn straight_line_body_is_one_section() {
        let sections = sections_of(indoc! {"
            function f() {
                const a = 1;
                const b = 2;
                return a + b;
            }
        "});
        assert_eq!(sections, vec![Section { low: 1, high: 3 }]);
    }

    #[test]
    fn blank_lines_split_sections_and_nested_blocks_get_their_own() {
        let sections = sections_of(indoc! {"
            function f(a) {
                const x = 1;
                const y = 2;

                const z = 3;
                if (a) {
                    const d = 4;
                }
                const e = 5;
            }
        "});
        assert_eq!(
            sections,
            vec![
                Section { low: 1, high: 2 },
                Section { low: 4, high: 8 },
                Section { low: 6, high: 6 },
            ]
        );
    }

    #[test]
    fn comment_only_lines_split_like_blank_lines() {
        let sections = sections_of(indoc! {"
            function f() {
                const a = 1;
                // phase two
                const b = 2;
            }
        "});
        assert_eq!(
            sections,
            vec![Section { low: 1, high: 1 }, Section { low: 3, high: 3 }]
        );
    }

    #[test]
    fn unclosed_section_ends_at_the_last_anchored_line() {
        let sections = sections_of(indoc! {"
            function f() {
                const a = 1;
                const b = 2;

            }
        "});
        assert_eq!(sections, vec![Section { low: 1, high: 2 }]);
    }

    #[test]
    fn single_line_body_yields_no_sections() {
        let sections = sections_of("function f() { return 1; }\n");
        assert_eq!(sections, Vec::new());
    }

    #[test]
    fn containment_queries_find_the_innermost_section() {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
            .unwrap();
        let source = indoc! {"
            function f(a) {
                const x = 1;
                if (a) {
                    const d = 4;
                }
                const e = 5;
            }
        "};
        let index = SourceIndex::new(SyntaxArena::parse(&mut parser, source).unwrap());
        let func = index.function_likes()[0];
        let mut nesting = NestingLevelCollector::new();
        let sections = detect_sections(&index, &mut nesting, func, 64);
        assert_eq!(
            sections.section_containing(3),
            Some(Section { low: 3, high: 3 })
        );
        assert_eq!(
            sections.section_containing(5).map(|s| s.low),
            Some(1)
        );
    }
}
