pub mod interval;

pub use interval::IntervalTree;

use crate::core::{
    Classification, Comment, CommentId, NodeId, NodeKind, Span, SyntaxArena,
};

/// Either a node or a comment, used when walking source elements in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourcePart {
    Node(NodeId),
    Comment(CommentId),
}

/// Line- and position-based query surface over one parsed source file.
///
/// Built once per analysis run: merges adjacent comment tokens into logical
/// comments, buckets nodes and comments by line, and indexes node spans in an
/// interval tree for enclosing-scope queries.
pub struct SourceIndex {
    arena: SyntaxArena,
    comments: Vec<Comment>,
    nodes_by_line: Vec<Vec<NodeId>>,
    comments_by_line: Vec<Vec<CommentId>>,
    intervals: IntervalTree<NodeId>,
    parts_in_order: Vec<(usize, SourcePart)>,
    code_lines: Vec<bool>,
    function_likes: Vec<NodeId>,
}

impl SourceIndex {
    pub fn new(arena: SyntaxArena) -> Self {
        let comments = merge_comments(&arena);
        let line_count = arena.line_count();

        let mut nodes_by_line: Vec<Vec<NodeId>> = vec![Vec::new(); line_count];
        let mut intervals = Vec::new();
        let mut function_likes = Vec::new();
        for node in arena.nodes() {
            if node.kind == NodeKind::Program || node.span.is_empty() {
                continue;
            }
            nodes_by_line[node.start_line].push(node.id);
            intervals.push((node.span, node.id));
            if node.kind.is_function_like() {
                function_likes.push(node.id);
            }
        }

        let mut comments_by_line: Vec<Vec<CommentId>> = vec![Vec::new(); line_count];
        for (id, comment) in comments.iter().enumerate() {
            for line in comment.start_line()..=comment.end_line().min(line_count - 1) {
                comments_by_line[line].push(id);
            }
        }

        let code_lines = compute_code_lines(&arena);

        let mut parts_in_order: Vec<(usize, SourcePart)> = Vec::new();
        for node in arena.nodes() {
            if node.kind == NodeKind::Program || node.span.is_empty() {
                continue;
            }
            parts_in_order.push((node.span.start, SourcePart::Node(node.id)));
        }
        for (id, comment) in comments.iter().enumerate() {
            parts_in_order.push((comment.span().start, SourcePart::Comment(id)));
        }
        parts_in_order.sort_by_key(|&(start, _)| start);

        let mut index = Self {
            arena,
            comments,
            nodes_by_line,
            comments_by_line,
            intervals: IntervalTree::new(intervals),
            parts_in_order,
            code_lines,
            function_likes,
        };
        index.mark_trailing_comments();
        index
    }

    fn mark_trailing_comments(&mut self) {
        for id in 0..self.comments.len() {
            let span = self.comments[id].span();
            let line = self.comments[id].start_line();
            let prefix = &self.arena.source()[self.arena.line_start(line)..span.start];
            let has_code = prefix
                .char_indices()
                .any(|(offset, ch)| {
                    !ch.is_whitespace()
                        && !self.offset_is_inside_comment(self.arena.line_start(line) + offset)
                });
            self.comments[id].set_trailing(has_code);
        }
    }

    fn offset_is_inside_comment(&self, offset: usize) -> bool {
        self.arena
            .raw_comments()
            .iter()
            .any(|c| c.span.contains_pos(offset))
    }

    pub fn arena(&self) -> &SyntaxArena {
        &self.arena
    }

    pub fn comment(&self, id: CommentId) -> &Comment {
        &self.comments[id]
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Merges classification results into the comments in one step, so no
    /// partially classified state is ever observable.
    pub fn attach_classifications(&mut self, per_comment: Vec<Vec<Classification>>) {
        assert_eq!(
            per_comment.len(),
            self.comments.len(),
            "classification results must cover every comment"
        );
        for (comment, classifications) in self.comments.iter_mut().zip(per_comment) {
            comment.record_classifications(classifications);
        }
    }

    pub fn function_likes(&self) -> &[NodeId] {
        &self.function_likes
    }

    /// True if the line carries code: anything non-whitespace left after
    /// comment spans are masked out.
    pub fn is_code_line(&self, line: usize) -> bool {
        self.code_lines.get(line).copied().unwrap_or(false)
    }

    pub fn comments_in_line(&self, line: usize) -> &[CommentId] {
        self.comments_by_line
            .get(line)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// The outermost node starting on the line. Nodes are bucketed in
    /// preorder, so the first entry encloses every other node of the line.
    pub fn most_enclosing_node_for_line(&self, line: usize) -> Option<NodeId> {
        self.nodes_by_line.get(line)?.first().copied()
    }

    /// Like `most_enclosing_node_for_line`, scanning forward when the line
    /// itself starts no node.
    pub fn first_node_at_or_after_line(&self, line: usize) -> Option<NodeId> {
        (line..self.nodes_by_line.len())
            .find_map(|l| self.nodes_by_line[l].first().copied())
    }

    /// Nodes whose span fully contains `span`, innermost first.
    pub fn enclosing_nodes(&self, span: Span) -> Vec<NodeId> {
        self.intervals
            .containing(span)
            .into_iter()
            .map(|&(_, id)| id)
            .collect()
    }

    pub fn next_enclosing_parent(&self, node: NodeId) -> Option<NodeId> {
        self.arena.node(node).parent
    }

    /// Comments leading into the node (ending on the line above its start)
    /// or contained within its span.
    pub fn comments_for_node(&self, node: NodeId) -> Vec<CommentId> {
        let target = self.arena.node(node);
        self.comments
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                c.end_line() + 1 == target.start_line || target.span.contains(c.span())
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// All comments ordered by line distance to `line`. A comment covering
    /// the line has distance zero.
    pub fn comments_by_distance_to_line(&self, line: usize) -> Vec<(CommentId, usize)> {
        let mut ordered: Vec<(CommentId, usize)> = self
            .comments
            .iter()
            .enumerate()
            .map(|(id, c)| {
                let distance = if c.covers_line(line) {
                    0
                } else {
                    c.start_line()
                        .abs_diff(line)
                        .min(c.end_line().abs_diff(line))
                };
                (id, distance)
            })
            .collect();
        ordered.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        ordered
    }

    /// The source element (node or comment) starting latest before the node.
    pub fn source_part_before(&self, node: NodeId) -> Option<SourcePart> {
        let start = self.arena.node(node).span.start;
        let idx = self
            .parts_in_order
            .partition_point(|&(s, _)| s < start);
        if idx == 0 {
            return None;
        }
        Some(self.parts_in_order[idx - 1].1)
    }

    pub fn part_start_line(&self, part: SourcePart) -> usize {
        match part {
            SourcePart::Node(id) => self.arena.node(id).start_line,
            SourcePart::Comment(id) => self.comments[id].start_line(),
        }
    }
}

/// Merges consecutive comment tokens: a comment starting on the line right
/// after the previous one ends, with nothing but whitespace before it on its
/// line, continues the same logical comment. A comment sharing its last line
/// with code (a trailing comment) never extends downward.
fn merge_comments(arena: &SyntaxArena) -> Vec<Comment> {
    let mut merged: Vec<Comment> = Vec::new();
    for raw in arena.raw_comments() {
        let starts_its_line = arena.source()[arena.line_start(raw.start_line)..raw.span.start]
            .chars()
            .all(char::is_whitespace);
        if let Some(last) = merged.last_mut() {
            if starts_its_line
                && raw.start_line == last.end_line() + 1
                && !line_has_code(arena, last.end_line())
            {
                last.add_part(raw.span, &raw.text, raw.start_line);
                continue;
            }
        }
        merged.push(Comment::new(raw.span, &raw.text, raw.start_line));
    }
    merged
}

fn line_has_code(arena: &SyntaxArena, line: usize) -> bool {
    let start = arena.line_start(line);
    let end = arena.line_end(line);
    arena.source()[start..end].char_indices().any(|(offset, ch)| {
        !ch.is_whitespace()
            && !arena
                .raw_comments()
                .iter()
                .any(|c| c.span.contains_pos(start + offset))
    })
}

fn compute_code_lines(arena: &SyntaxArena) -> Vec<bool> {
    (0..arena.line_count())
        .map(|line| line_has_code(arena, line))
        .collect()
}
