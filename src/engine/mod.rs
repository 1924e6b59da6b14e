use std::collections::{BinaryHeap, BTreeMap, HashMap, HashSet};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use tree_sitter::Parser;

use crate::classify::CommentClassifier;
use crate::config::AnalysisConfig;
use crate::core::{
    Comment, CommentClass, CommentId, CommentQuality, FailureSink, NodeId, NodeKind, SyntaxArena,
};
use crate::index::SourceIndex;
use crate::metrics::{
    CyclomaticComplexityCollector, LinesOfCodeCollector, MetricCollector, NestingLevelCollector,
};
use crate::quality::{CommentQualityEvaluator, Evaluation};
use crate::sections::{detect_sections, FunctionSections};

const CODE_IN_COMMENT_MESSAGE: &str = "Code should not be part of a comment";

/// Weight of the distance-from-section-start term in per-line complexity.
/// Lines far from their section opening are slightly harder to follow.
const SECTION_DISTANCE_WEIGHT: f64 = 0.05;

/// Weight of one expression chain link; doubles with every nesting level.
const EXPRESSION_CHAIN_WEIGHT: f64 = 0.4;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^`{3,}").unwrap());

/// Entry point of the analysis: parses a source file, classifies and scores
/// its comments, and reports where complex code is missing documentation.
pub struct CommentAuditor {
    parser: Parser,
    config: AnalysisConfig,
}

impl CommentAuditor {
    /// Auditor for TypeScript sources.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
            .context("failed to load the TypeScript grammar")?;
        Ok(Self { parser, config })
    }

    /// Auditor for plain JavaScript sources.
    pub fn new_javascript(config: AnalysisConfig) -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_javascript::LANGUAGE.into())
            .context("failed to load the JavaScript grammar")?;
        Ok(Self { parser, config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn analyze(&mut self, source: &str) -> Result<Vec<crate::core::Failure>> {
        let mut failures = Vec::new();
        self.analyze_into(source, &mut failures)?;
        Ok(failures)
    }

    pub fn analyze_into(&mut self, source: &str, sink: &mut dyn FailureSink) -> Result<()> {
        let arena = SyntaxArena::parse(&mut self.parser, source)?;
        let mut index = SourceIndex::new(arena);

        let detector = self.config.build_detector()?;
        let per_comment = {
            let classifier =
                CommentClassifier::new(&index, detector.as_ref(), &self.config.annotation_markers);
            index
                .comments()
                .iter()
                .map(|c| classifier.classify(c))
                .collect()
        };
        index.attach_classifications(per_comment);

        log::debug!(
            "auditing {} comments across {} functions",
            index.comments().len(),
            index.function_likes().len()
        );

        let mut analysis = Analysis::new(&index, &self.config);
        analysis.run(sink);
        Ok(())
    }
}

/// One analysis pass over an indexed source file.
struct Analysis<'a> {
    index: &'a SourceIndex,
    config: &'a AnalysisConfig,
    cyclomatic: CyclomaticComplexityCollector,
    nesting: NestingLevelCollector,
    loc: LinesOfCodeCollector,
    evaluator: CommentQualityEvaluator,
    sections: HashMap<NodeId, FunctionSections>,
    evaluations: Vec<Evaluation>,
    node_complexities: HashMap<NodeId, f64>,
    required_lines: BTreeMap<usize, Vec<String>>,
}

#[derive(PartialEq)]
struct LineScore {
    line: usize,
    score: f64,
}

impl Eq for LineScore {}

impl Ord for LineScore {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // max-heap on score; ties pop the earlier line first
        self.score
            .total_cmp(&other.score)
            .then(other.line.cmp(&self.line))
    }
}

impl PartialOrd for LineScore {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<'a> Analysis<'a> {
    fn new(index: &'a SourceIndex, config: &'a AnalysisConfig) -> Self {
        Self {
            index,
            config,
            cyclomatic: CyclomaticComplexityCollector::new(),
            nesting: NestingLevelCollector::new(),
            loc: LinesOfCodeCollector::new(),
            evaluator: CommentQualityEvaluator::new(),
            sections: HashMap::new(),
            evaluations: Vec::new(),
            node_complexities: HashMap::new(),
            required_lines: BTreeMap::new(),
        }
    }

    fn run(&mut self, sink: &mut dyn FailureSink) {
        for &func in self.index.function_likes() {
            self.cyclomatic.visit(self.index, func);
            let sections = detect_sections(
                self.index,
                &mut self.nesting,
                func,
                self.config.max_section_depth,
            );
            self.sections.insert(func, sections);
        }

        for id in 0..self.index.comments().len() {
            let comment = self.index.comment(id);
            let end = self.section_end_line(comment);
            let evaluation = self.evaluator.evaluate(self.index, comment, end);
            self.evaluations.push(evaluation);
        }
        self.report_comment_failures(sink);

        for &func in self.index.function_likes() {
            if !self.node_complexities.contains_key(&func) {
                self.analyze_node(func);
            }
            self.add_comment_requirements(func);
        }
        self.report_requirements(sink);
    }

    /// Last line of the section the comment's anchor falls into; for comments
    /// announcing a construct from outside, the construct's last line.
    fn section_end_line(&self, comment: &Comment) -> usize {
        let arena = self.index.arena();
        let anchor = if comment.is_trailing() {
            comment.end_line()
        } else {
            comment.end_line() + 1
        };
        let enclosing_function = self
            .index
            .enclosing_nodes(comment.span())
            .into_iter()
            .find(|&id| arena.node(id).kind.is_function_like());
        if let Some(func) = enclosing_function {
            if let Some(section) = self
                .sections
                .get(&func)
                .and_then(|s| s.section_at_or_after(anchor))
            {
                return section.high;
            }
            return arena.node(func).end_line;
        }
        if let Some(next) = self.index.first_node_at_or_after_line(anchor) {
            return arena.node(next).end_line;
        }
        arena.line_count().saturating_sub(1)
    }

    fn report_comment_failures(&self, sink: &mut dyn FailureSink) {
        let arena = self.index.arena();
        for (id, comment) in self.index.comments().iter().enumerate() {
            for classification in comment.classifications() {
                if classification.class != CommentClass::Code {
                    continue;
                }
                match &classification.lines {
                    None => {
                        let span = comment.span();
                        sink.report(span.start, span.end, CODE_IN_COMMENT_MESSAGE.to_string());
                    }
                    Some(lines) => {
                        let escaped = escaped_lines(comment);
                        for &line in lines.iter().filter(|l| !escaped.contains(l)) {
                            let span = comment.line_span(line);
                            sink.report(span.start, span.end, CODE_IN_COMMENT_MESSAGE.to_string());
                        }
                    }
                }
            }

            let evaluation = &self.evaluations[id];
            if matches!(
                evaluation.quality,
                CommentQuality::Unhelpful | CommentQuality::Low
            ) {
                let mut message = "comment adds little documentation value".to_string();
                if !evaluation.reasons.is_empty() {
                    message = format!("{}: {}", message, evaluation.reasons.join("; "));
                }
                sink.report(
                    comment.span().start,
                    arena.line_end(comment.start_line()),
                    message,
                );
            }
        }
    }

    /// Weighted complexity of a node subtree, memoized for every node seen.
    fn analyze_node(&mut self, id: NodeId) -> (f64, u32) {
        let index = self.index;
        let arena = index.arena();
        let node = arena.node(id);
        let kind = node.kind;

        let result = match kind {
            // the else branch is scored on its own line, via the ElseClause
            NodeKind::IfStatement => {
                let mut total = 0.0;
                for &child in &node.children {
                    let (complexity, _) = self.analyze_node(child);
                    if arena.node(child).kind != NodeKind::ElseClause {
                        total += complexity;
                    }
                }
                (total, 0)
            }
            NodeKind::StatementBlock => {
                let mut total = self.cyclomatic.get(id).unwrap_or(1) as f64;
                total += self.loc.measure(index, id) as f64 / 2.0;
                for &child in &node.children {
                    total += self.analyze_node(child).0;
                }
                (total, 0)
            }
            kind if kind.is_expression_chain() => {
                let mut total = 0.0;
                let mut chain_depth = 0;
                for &child in &node.children {
                    let (complexity, depth) = self.analyze_node(child);
                    total += complexity;
                    chain_depth = chain_depth.max(depth);
                }
                total += EXPRESSION_CHAIN_WEIGHT * f64::from(1u32 << chain_depth.min(20));
                (total, chain_depth + 1)
            }
            // transparent wrappers keep the chain depth alive
            NodeKind::MemberExpression | NodeKind::ParenthesizedExpression => {
                let mut total = 0.0;
                let mut chain_depth = 0;
                for &child in &node.children {
                    let (complexity, depth) = self.analyze_node(child);
                    total += complexity;
                    chain_depth = chain_depth.max(depth);
                }
                (total, chain_depth)
            }
            _ => {
                let mut total = 0.0;
                for &child in &node.children {
                    total += self.analyze_node(child).0;
                }
                (total, 0)
            }
        };
        self.node_complexities.insert(id, result.0);
        result
    }

    /// Complexity recorded for the outermost node starting on the line.
    fn line_complexity(&self, line: usize) -> f64 {
        let Some(node) = self.index.most_enclosing_node_for_line(line) else {
            return 0.0;
        };
        if self.index.arena().node(node).start_line != line {
            return 0.0;
        }
        self.node_complexities.get(&node).copied().unwrap_or(0.0)
    }

    /// Scans a function body, accumulating per-line and per-section
    /// complexity, and turns everything above the thresholds into comment
    /// requirements.
    fn add_comment_requirements(&mut self, func: NodeId) {
        let arena = self.index.arena();
        let node = arena.node(func);
        let (func_start, func_end) = (node.start_line, node.end_line);

        let mut total = 0.0;
        let mut section_complexity = 0.0;
        let mut section_start: Option<usize> = None;
        let mut line_heap: BinaryHeap<LineScore> = BinaryHeap::new();
        let mut section_heap: BinaryHeap<LineScore> = BinaryHeap::new();
        let mut previous_line_was_comment_only = false;

        for line in (func_start + 1)..func_end {
            if section_start.is_none() {
                section_start = Some(line);
            }
            let Some(enclosing) = self.index.most_enclosing_node_for_line(line) else {
                // a lone comment line does not end the section; a second
                // one, a blank line or a bare brace does
                let holds_comment = !self.index.comments_in_line(line).is_empty();
                if holds_comment && !previous_line_was_comment_only {
                    previous_line_was_comment_only = true;
                    continue;
                }
                previous_line_was_comment_only = false;
                if section_complexity > 0.0 {
                    let start = section_start.unwrap_or(line);
                    log::trace!("section at line {start} scores {section_complexity:.2}");
                    self.enforce_requirement(
                        section_complexity,
                        self.config.section_complexity_threshold,
                        start,
                        &mut line_heap,
                        self.config.line_complexity_threshold,
                        format!(
                            "section with complexity {section_complexity:.1} needs a comment"
                        ),
                    );
                    section_heap.push(LineScore {
                        line: start,
                        score: section_complexity,
                    });
                    section_complexity = 0.0;
                }
                section_start = None;
                line_heap.clear();
                continue;
            };
            previous_line_was_comment_only = false;
            if arena.node(enclosing).start_line != line {
                continue;
            }
            let mut line_score = self.line_complexity(line);
            line_score +=
                SECTION_DISTANCE_WEIGHT * (line - section_start.unwrap_or(line)) as f64;
            total += line_score;
            section_complexity += line_score;
            line_heap.push(LineScore {
                line,
                score: line_score,
            });
        }

        if section_complexity > 0.0 {
            let start = section_start.unwrap_or(func_start + 1);
            self.enforce_requirement(
                section_complexity,
                self.config.section_complexity_threshold,
                start,
                &mut line_heap,
                self.config.line_complexity_threshold,
                format!("section with complexity {section_complexity:.1} needs a comment"),
            );
        }

        self.enforce_requirement(
            total,
            self.config.node_total_complexity_threshold,
            func_start,
            &mut section_heap,
            self.config.section_complexity_threshold,
            format!("function with total complexity {total:.1} needs a comment"),
        );
    }

    /// Requires a comment at `start_line` when `complexity` reaches the
    /// threshold. If that line cannot take a new requirement, children are
    /// tried in descending complexity order until one falls below
    /// `child_threshold` or a requirement is registered.
    fn enforce_requirement(
        &mut self,
        complexity: f64,
        threshold: f64,
        start_line: usize,
        children: &mut BinaryHeap<LineScore>,
        child_threshold: f64,
        reason: String,
    ) -> bool {
        if complexity < threshold {
            return false;
        }
        if self.require_comment_for_line(start_line, reason) {
            return true;
        }
        while let Some(child) = children.pop() {
            if child.score < child_threshold {
                break;
            }
            if self.require_comment_for_line(
                child.line,
                format!("complex statement ({:.1}) needs a comment", child.score),
            ) {
                return true;
            }
        }
        false
    }

    /// Registers a comment requirement for the construct starting the line,
    /// unless a nearby comment of sufficient quality already satisfies it.
    /// Returns true when a new requirement was added.
    fn require_comment_for_line(&mut self, line: usize, reason: String) -> bool {
        let arena = self.index.arena();
        let Some(enclosing) = self.index.most_enclosing_node_for_line(line) else {
            return false;
        };
        let line = arena.node(enclosing).start_line;

        let mut satisfied = self
            .index
            .comments_by_distance_to_line(line)
            .into_iter()
            .any(|(id, distance)| {
                self.comment_satisfies(id) && distance as i32 <= self.quality_budget(id)
            });

        // statements may be covered by a comment on an enclosing construct,
        // up to three levels out but never across a function boundary
        if !satisfied && !arena.node(enclosing).kind.is_function_like() {
            let mut depth = 0;
            let mut comments = self.index.comments_for_node(enclosing);
            if let Some(mut parent) = self.index.next_enclosing_parent(enclosing) {
                while comments.is_empty() && !self.is_function_or_method_part(parent) {
                    comments = self.index.comments_for_node(parent);
                    depth += 1;
                    match self.index.next_enclosing_parent(parent) {
                        Some(p) => parent = p,
                        None => break,
                    }
                }
            }
            if depth < 3 {
                satisfied = comments.into_iter().any(|id| self.comment_satisfies(id));
            }
        }

        if satisfied {
            return false;
        }
        use std::collections::btree_map::Entry;
        match self.required_lines.entry(line) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().push(reason);
                false
            }
            Entry::Vacant(entry) => {
                entry.insert(vec![reason]);
                true
            }
        }
    }

    /// A comment counts only above Low quality; pure annotations never count.
    fn comment_satisfies(&self, id: CommentId) -> bool {
        !self
            .index
            .comment(id)
            .has_whole_classification(CommentClass::Annotation)
            && self.evaluations[id].quality > CommentQuality::Low
    }

    /// How many lines away a comment may sit and still satisfy a
    /// requirement: two for Medium, three for High.
    fn quality_budget(&self, id: CommentId) -> i32 {
        self.evaluations[id].quality.tier() - CommentQuality::Low.tier() + 1
    }

    fn is_function_or_method_part(&self, node: NodeId) -> bool {
        let arena = self.index.arena();
        let n = arena.node(node);
        let is_declaration = |kind: NodeKind| {
            matches!(kind, NodeKind::FunctionDeclaration | NodeKind::MethodDefinition)
        };
        if is_declaration(n.kind) {
            return true;
        }
        n.kind == NodeKind::StatementBlock
            && n.parent
                .map(|p| is_declaration(arena.node(p).kind))
                .unwrap_or(false)
    }

    /// Emits requirement failures, folding cascades: a requirement is
    /// dropped when the construct right before it is already required.
    fn report_requirements(&self, sink: &mut dyn FailureSink) {
        let arena = self.index.arena();
        for (&line, reasons) in &self.required_lines {
            let Some(node) = self.index.most_enclosing_node_for_line(line) else {
                continue;
            };
            if let Some(previous) = self.index.source_part_before(node) {
                let previous_line = self.index.part_start_line(previous);
                if let Some(previous_node) = self.index.most_enclosing_node_for_line(previous_line)
                {
                    let construct_line = arena.node(previous_node).start_line;
                    if construct_line != line && self.required_lines.contains_key(&construct_line)
                    {
                        continue;
                    }
                }
            }
            let start = arena.node(node).span.start;
            let end = arena.line_end(line);
            for reason in reasons {
                sink.report(start, end, reason.clone());
            }
        }
    }
}

/// Comment line indices exempt from code-in-comment findings: fenced code
/// blocks (including the fence delimiters) and `@example` doc sections.
fn escaped_lines(comment: &Comment) -> HashSet<usize> {
    let mut escaped = HashSet::new();
    let mut in_fence = false;
    let mut in_example = false;
    for (i, line) in comment.sanitized_lines().iter().enumerate() {
        let text = line.text.trim();
        if CODE_FENCE.is_match(text) {
            in_fence = !in_fence;
            escaped.insert(i);
            continue;
        }
        if in_fence {
            escaped.insert(i);
            continue;
        }
        if text.starts_with("@example") {
            in_example = true;
            escaped.insert(i);
            continue;
        }
        if in_example {
            if text.starts_with('@') {
                in_example = false;
            } else {
                escaped.insert(i);
            }
        }
    }
    escaped
}
