mod annotation;
mod license;
mod task;

pub use annotation::AnnotationMatcher;
pub use license::LicenseMatcher;
pub use task::TaskCommentMatcher;

use crate::core::{Classification, Comment, CommentClass, NodeKind};
use crate::detect::CodeDetector;
use crate::index::SourceIndex;

/// Assigns structural and content classifications to comments.
///
/// The structural pass places a comment relative to the code around it:
/// inside a function it is Inline; announcing a function, class or enum it is
/// a Header; announcing a class field it is (also) a Member. The content pass
/// then appends license, annotation, commented-out-code and task findings.
/// Classification is pure: the same comment always yields the same list, and
/// a comment matching nothing yields an empty list.
pub struct CommentClassifier<'a> {
    index: &'a SourceIndex,
    detector: &'a dyn CodeDetector,
    license: LicenseMatcher,
    task: TaskCommentMatcher,
    annotation: AnnotationMatcher,
}

impl<'a> CommentClassifier<'a> {
    pub fn new(
        index: &'a SourceIndex,
        detector: &'a dyn CodeDetector,
        annotation_markers: &[String],
    ) -> Self {
        Self {
            index,
            detector,
            license: LicenseMatcher::new(),
            task: TaskCommentMatcher::new(),
            annotation: AnnotationMatcher::new(annotation_markers),
        }
    }

    pub fn classify(&self, comment: &Comment) -> Vec<Classification> {
        let mut classifications = self.classify_structurally(comment);
        classifications.extend(self.license.classify(comment));
        classifications.extend(self.annotation.classify(comment));
        classifications.extend(self.detector.classify(comment));
        classifications.extend(self.task.classify(comment));
        classifications
    }

    fn classify_structurally(&self, comment: &Comment) -> Vec<Classification> {
        let arena = self.index.arena();
        if self
            .index
            .enclosing_nodes(comment.span())
            .iter()
            .any(|&id| arena.node(id).kind.is_function_like())
        {
            return vec![Classification::whole(CommentClass::Inline)];
        }

        // the line the comment talks about: its own for trailing comments,
        // the next one otherwise
        let anchor = if comment.is_trailing() {
            comment.end_line()
        } else {
            comment.end_line() + 1
        };
        let Some(next) = self.index.first_node_at_or_after_line(anchor) else {
            return Vec::new();
        };

        let mut classifications = Vec::new();
        let node = arena.node(next);
        let parent_is_function = node
            .parent
            .map(|p| arena.node(p).kind.is_function_like())
            .unwrap_or(false);
        if node.kind.is_function_like()
            || parent_is_function
            || self.leading_chain(next, |kind| kind.is_function_like() || kind.is_class_like())
        {
            classifications.push(Classification::whole(CommentClass::Header));
        }
        if self.leading_chain(next, |kind| kind == NodeKind::FieldDefinition) {
            classifications.push(Classification::whole(CommentClass::Member));
        }
        classifications
    }

    /// Walks the chain of descendants sharing the node's start offset and
    /// checks whether any of them satisfies the predicate.
    fn leading_chain(&self, node: crate::core::NodeId, pred: impl Fn(NodeKind) -> bool) -> bool {
        let arena = self.index.arena();
        let mut current = node;
        loop {
            let n = arena.node(current);
            if pred(n.kind) {
                return true;
            }
            match n
                .children
                .first()
                .filter(|&&child| arena.node(child).span.start == n.span.start)
            {
                Some(&child) => current = child,
                None => return false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SyntaxArena;
    use crate::detect::ParseAttemptDetector;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use tree_sitter::Parser;

    fn index(source: &str) -> SourceIndex {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
            .unwrap();
        SourceIndex::new(SyntaxArena::parse(&mut parser, source).unwrap())
    }

    fn classify_all(source: &str) -> Vec<Vec<Classification>> {
        let idx = index(source);
        let detector = ParseAttemptDetector::new().unwrap();
        let classifier = CommentClassifier::new(&idx, &detector, &[]);
        idx.comments().iter().map(|c| classifier.classify(c)).collect()
    }

    fn classes(classifications: &[Classification]) -> Vec<CommentClass> {
        classifications.iter().map(|c| c.class).collect()
    }

    #[test]
    fn comment_above_a_function_is_a_header() {
        let results = classify_all(indoc! {"
            // explains what f computes for the caller
            function f() {
                return 1;
            }
        "});
        assert_eq!(classes(&results[0]), vec![CommentClass::Header]);
    }

    #[test]
    fn comment_above_a_class_is_a_header() {
        let results = classify_all(indoc! {"
            // models one entry of the work queue
            class Entry {
            }
        "});
        assert_eq!(classes(&results[0]), vec![CommentClass::Header]);
    }

    #[test]
    fn comment_inside_a_function_is_inline() {
        let results = classify_all(indoc! {"
            function f() {
                // picks the larger bucket on ties
                return 1;
            }
        "});
        assert_eq!(classes(&results[0]), vec![CommentClass::Inline]);
    }

    #[test]
    fn comment_above_a_class_field_is_a_member_comment() {
        let results = classify_all(indoc! {"
            class Entry {
                // retries left before the entry is dropped
                budget = 3;
            }
        "});
        assert_eq!(classes(&results[0]), vec![CommentClass::Member]);
    }

    #[test]
    fn trailing_comment_anchors_to_its_own_line() {
        let results = classify_all(indoc! {"
            function f() {
                return 1; // always the fast path
            }
        "});
        assert_eq!(classes(&results[0]), vec![CommentClass::Inline]);
    }

    #[test]
    fn unclassifiable_comment_yields_an_empty_list() {
        let results = classify_all(indoc! {"
            const a = 1;

            // a stray remark floating between declarations

            const b = 2;
        "});
        assert_eq!(results[0], Vec::new());
    }

    #[test]
    fn classification_is_idempotent() {
        let source = indoc! {"
            // header text for the function below
            function f() {
                return 1;
            }
        "};
        let idx = index(source);
        let detector = ParseAttemptDetector::new().unwrap();
        let classifier = CommentClassifier::new(&idx, &detector, &[]);
        let first = classifier.classify(&idx.comments()[0]);
        let second = classifier.classify(&idx.comments()[0]);
        assert_eq!(first, second);
    }

    #[test]
    fn directive_inside_function_is_inline_and_annotation() {
        let results = classify_all(indoc! {"
            function f() {
                // tslint:disable-next-line:no-console
                console.log('x');
            }
        "});
        assert_eq!(
            classes(&results[0]),
            vec![CommentClass::Inline, CommentClass::Annotation]
        );
    }
}
