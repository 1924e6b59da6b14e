pub mod words;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::{Comment, CommentClass, CommentQuality, NodeId, NodeKind};
use crate::index::SourceIndex;

/// A JSDoc parameter tag: optional `{type}`, the parameter name (possibly
/// bracketed as optional), then the explanation.
static PARAM_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)@param(?:\s+\{[^}]*\})?\s+\[?([\w$]+)\]?(.*)").unwrap());

/// Outcome of evaluating one comment: a quality tier plus the reasons that
/// moved it away from the baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub quality: CommentQuality,
    pub reasons: Vec<String>,
}

impl Evaluation {
    fn raise(&mut self) {
        self.quality = self.quality.raised();
    }

    fn lower(&mut self, reason: impl Into<String>) {
        self.quality = self.quality.lowered();
        self.reasons.push(reason.into());
    }
}

/// Scores how much documentation value a comment adds, by comparing its
/// wording against the identifiers of the code it annotates.
pub struct CommentQualityEvaluator {
    comment_coverage_threshold: f64,
    name_coverage_threshold: f64,
}

impl Default for CommentQualityEvaluator {
    fn default() -> Self {
        Self {
            comment_coverage_threshold: 0.5,
            name_coverage_threshold: 0.5,
        }
    }
}

impl CommentQualityEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates a classified comment. `section_end_line` bounds the code
    /// span the comment is held against.
    pub fn evaluate(
        &self,
        index: &SourceIndex,
        comment: &Comment,
        section_end_line: usize,
    ) -> Evaluation {
        // tasks and annotations are not documentation; they get no score
        if comment.has_whole_classification(CommentClass::Task)
            || comment.has_whole_classification(CommentClass::Annotation)
            || comment.has_whole_classification(CommentClass::Unknown)
        {
            return Evaluation {
                quality: CommentQuality::Unknown,
                reasons: Vec::new(),
            };
        }
        if comment.has_whole_classification(CommentClass::Code) {
            return Evaluation {
                quality: CommentQuality::Unhelpful,
                reasons: vec!["commented-out code adds no documentation value".to_string()],
            };
        }

        let mut result = Evaluation {
            quality: CommentQuality::Low,
            reasons: Vec::new(),
        };

        let comment_text = prose_text(comment);
        let keywords = collect_keywords(index, comment.end_line() + 1, section_end_line);
        self.evaluate_overlap(&mut result, &comment_text, &keywords);

        if comment.has_whole_classification(CommentClass::Header) {
            if let Some(func) = announced_function(index, comment) {
                assess_parameter_docs(&mut result, index, comment, func);
            }
        }

        let code_line_count = comment
            .classifications()
            .iter()
            .filter(|c| c.class == CommentClass::Code)
            .flat_map(|c| c.lines.iter().flatten())
            .count();
        if code_line_count > 0 {
            result.reasons.push(format!(
                "{code_line_count} comment line(s) contain commented-out code"
            ));
            for _ in 0..code_line_count {
                result.quality = result.quality.lowered();
            }
        }
        result
    }

    fn evaluate_overlap(&self, result: &mut Evaluation, comment_text: &str, keywords: &[String]) {
        let comment_words = words::significant_words(comment_text);
        if comment_words.is_empty() {
            result.lower("comment contains no descriptive words");
            return;
        }
        let name_parts: Vec<String> = keywords
            .iter()
            .flat_map(|k| words::significant_words(k))
            .fold(Vec::new(), |mut acc, word| {
                if !acc.contains(&word) {
                    acc.push(word);
                }
                acc
            });
        if name_parts.is_empty() {
            result.quality = CommentQuality::Unknown;
            result
                .reasons
                .push("no identifiers found to compare the comment against".to_string());
            return;
        }
        let shared = words::intersection(&comment_words, &name_parts);
        if shared.is_empty() {
            result.lower("comment does not relate to the code that follows it");
            return;
        }
        let comment_coverage = shared.len() as f64 / comment_words.len() as f64;
        let name_coverage = shared.len() as f64 / name_parts.len() as f64;
        if comment_coverage >= self.comment_coverage_threshold
            && name_coverage >= self.name_coverage_threshold
        {
            result.lower("comment only restates the names used in the code");
            return;
        }
        result.raise();
    }
}

/// Sanitized comment text with code-classified lines filtered out, so scoring
/// only sees the prose.
fn prose_text(comment: &Comment) -> String {
    let code_lines: Vec<&usize> = comment
        .classifications()
        .iter()
        .filter(|c| c.class == CommentClass::Code)
        .flat_map(|c| {
            c.lines
                .as_ref()
                .expect("whole-comment code must be handled before prose extraction")
        })
        .collect();
    comment
        .sanitized_lines()
        .iter()
        .enumerate()
        .filter(|(i, _)| !code_lines.contains(&i))
        .map(|(_, l)| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Identifier texts of the code between `start_line` and `section_end_line`.
/// Each enclosing node contributes its whole subtree once, then the scan
/// jumps past it; a comment line ends the collection.
fn collect_keywords(index: &SourceIndex, start_line: usize, section_end_line: usize) -> Vec<String> {
    let arena = index.arena();
    let mut keywords = Vec::new();
    let mut line = start_line;
    let mut visited: Option<NodeId> = None;
    while line <= section_end_line && line < arena.line_count() {
        if !index.comments_in_line(line).is_empty() {
            break;
        }
        let Some(node) = index.most_enclosing_node_for_line(line) else {
            line += 1;
            continue;
        };
        if visited == Some(node) {
            line += 1;
            continue;
        }
        visited = Some(node);
        push_identifiers(index, node, &mut keywords);
        line = arena.node(node).end_line + 1;
    }
    keywords
}

/// The function-like construct a header comment announces, reached through
/// descendants sharing the start offset of the first node after the comment.
fn announced_function(index: &SourceIndex, comment: &Comment) -> Option<NodeId> {
    let arena = index.arena();
    let anchor = if comment.is_trailing() {
        comment.end_line()
    } else {
        comment.end_line() + 1
    };
    let mut current = index.first_node_at_or_after_line(anchor)?;
    loop {
        let node = arena.node(current);
        if node.kind.is_function_like() {
            return Some(current);
        }
        current = *node
            .children
            .first()
            .filter(|&&child| arena.node(child).span.start == node.span.start)?;
    }
}

/// Holds a header comment's JSDoc parameter notes against the declared
/// parameter list. Runs only when the comment documents at least one
/// parameter; each declared parameter then needs a note that says more than
/// the parameter's own name, and each miss lowers the score one tier.
fn assess_parameter_docs(
    result: &mut Evaluation,
    index: &SourceIndex,
    comment: &Comment,
    func: NodeId,
) {
    let documented: Vec<(String, String)> = comment
        .sanitized_lines()
        .iter()
        .filter_map(|line| {
            PARAM_TAG
                .captures(&line.text)
                .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        })
        .collect();
    if documented.is_empty() {
        return;
    }
    for name in parameter_names(index, func) {
        match documented.iter().find(|(n, _)| *n == name) {
            None => result.lower(format!("parameter `{name}` has no @param note")),
            Some((_, explanation)) => {
                let own = words::significant_words(&name);
                let adds_anything = words::significant_words(explanation)
                    .into_iter()
                    .any(|word| !own.contains(&word));
                if !adds_anything {
                    result.lower(format!(
                        "the @param note for `{name}` only restates its name"
                    ));
                }
            }
        }
    }
}

/// Binding names of the function's parameters: the leftmost identifier of
/// each entry in the parameter list, skipping type annotations and defaults.
fn parameter_names(index: &SourceIndex, func: NodeId) -> Vec<String> {
    let arena = index.arena();
    let mut names = Vec::new();
    let Some(params) = arena
        .node(func)
        .children
        .iter()
        .copied()
        .find(|&child| arena.node(child).kind == NodeKind::FormalParameters)
    else {
        return names;
    };
    for &param in &arena.node(params).children {
        let mut current = param;
        loop {
            let node = arena.node(current);
            if node.kind.is_identifier() {
                names.push(arena.text(current).to_string());
                break;
            }
            match node.children.first() {
                Some(&child) => current = child,
                None => break,
            }
        }
    }
    names
}

fn push_identifiers(index: &SourceIndex, node: NodeId, out: &mut Vec<String>) {
    let arena = index.arena();
    let n = arena.node(node);
    if n.kind.is_identifier() {
        out.push(arena.text(node).to_string());
    }
    for &child in &n.children {
        push_identifiers(index, child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::CommentClassifier;
    use crate::core::SyntaxArena;
    use crate::detect::ParseAttemptDetector;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use tree_sitter::Parser;

    fn evaluate_first_comment(source: &str) -> Evaluation {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
            .unwrap();
        let mut index = SourceIndex::new(SyntaxArena::parse(&mut parser, source).unwrap());
        let detector = ParseAttemptDetector::new().unwrap();
        let per_comment = {
            let classifier = CommentClassifier::new(&index, &detector, &[]);
            index
                .comments()
                .iter()
                .map(|c| classifier.classify(c))
                .collect()
        };
        index.attach_classifications(per_comment);
        let last_line = index.arena().line_count() - 1;
        CommentQualityEvaluator::new().evaluate(&index, &index.comments()[0], last_line)
    }

    #[test]
    fn partially_overlapping_prose_scores_medium() {
        let evaluation = evaluate_first_comment(indoc! {"
            // walk the collection and flip the switched entries
            function rebalance(entries) {
                return entries.filter((entry) => entry.active);
            }
        "});
        assert_eq!(evaluation.quality, CommentQuality::Medium);
        assert_eq!(evaluation.reasons, Vec::<String>::new());
    }

    #[test]
    fn restating_the_code_scores_unhelpful() {
        let evaluation = evaluate_first_comment(indoc! {"
            // doubles the item value
            const doubleItemValue = (item) => item.value * 2;
        "});
        assert_eq!(evaluation.quality, CommentQuality::Unhelpful);
        assert!(evaluation.reasons[0].contains("restates"));
    }

    #[test]
    fn unrelated_prose_scores_unhelpful() {
        let evaluation = evaluate_first_comment(indoc! {"
            // weather was nice last tuesday
            function parse(input) {
                return input.trim();
            }
        "});
        assert_eq!(evaluation.quality, CommentQuality::Unhelpful);
        assert!(evaluation.reasons[0].contains("relate"));
    }

    #[test]
    fn whole_code_comments_are_unhelpful_with_a_reason() {
        let evaluation = evaluate_first_comment(indoc! {"
            // console.log(state);
            function dump(state) {
                return state;
            }
        "});
        assert_eq!(evaluation.quality, CommentQuality::Unhelpful);
        assert!(evaluation.reasons[0].contains("commented-out code"));
    }

    #[test]
    fn task_comments_get_no_score() {
        let evaluation = evaluate_first_comment(indoc! {"
            // TODO: fold this into the scheduler
            function tick() {
                return 0;
            }
        "});
        assert_eq!(evaluation.quality, CommentQuality::Unknown);
        assert_eq!(evaluation.reasons, Vec::<String>::new());
    }

    #[test]
    fn param_notes_that_restate_the_name_lower_the_score() {
        let evaluation = evaluate_first_comment(indoc! {"
            /**
             * resolves the widget label for display
             * @param widget the widget
             */
            function label(widget) {
                return widget.name;
            }
        "});
        // the prose alone scores Medium; the empty @param note lowers it
        assert_eq!(evaluation.quality, CommentQuality::Low);
        assert!(evaluation
            .reasons
            .iter()
            .any(|r| r.contains("only restates its name")));
    }

    #[test]
    fn undocumented_parameters_lower_the_score() {
        let evaluation = evaluate_first_comment(indoc! {"
            /**
             * formats the amount for the invoice footer
             * @param amount the raw numeric value to format
             */
            function money(amount, currency) {
                return currency + amount;
            }
        "});
        assert_eq!(evaluation.quality, CommentQuality::Low);
        assert!(evaluation
            .reasons
            .iter()
            .any(|r| r.contains("`currency` has no @param note")));
    }

    #[test]
    fn headers_without_param_tags_skip_the_parameter_check() {
        let evaluation = evaluate_first_comment(indoc! {"
            // walks the backlog and retires anything past its deadline
            function sweep(queue, now) {
                return queue.filter((entry) => entry.deadline > now);
            }
        "});
        assert_eq!(evaluation.quality, CommentQuality::Medium);
        assert_eq!(evaluation.reasons, Vec::<String>::new());
    }

    #[test]
    fn code_lines_inside_prose_pull_the_score_down() {
        let evaluation = evaluate_first_comment(indoc! {"
            // cleans up stray whitespace in the user input first
            // const cleaned = input.trim();
            function parse(input) {
                return input.trim();
            }
        "});
        // the prose alone would score Medium; one code line lowers it
        assert_eq!(evaluation.quality, CommentQuality::Low);
        assert!(evaluation
            .reasons
            .iter()
            .any(|r| r.contains("commented-out code")));
    }
}
