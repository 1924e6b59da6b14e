use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::{Classification, Comment, CommentClass};

/// Tool directives that live in comments without documenting anything.
static DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)^\s*(
            tslint:(enable|disable)(-(line|next-line))?
            | eslint-(enable|disable)(-(next-)?line)?
            | eslint-env
            | @ts-(ignore|expect-error|nocheck|check)
            | prettier-ignore
            | istanbul\s+ignore
            | jshint
            | global\s
        )",
    )
    .unwrap()
});

/// Flags annotation lines: linter and compiler directives, plus any
/// host-configured free-form markers.
pub struct AnnotationMatcher {
    extra: Vec<Regex>,
}

impl AnnotationMatcher {
    /// `extra_markers` are matched literally anywhere in a line. Patterns
    /// that fail to compile after escaping are skipped with a warning.
    pub fn new(extra_markers: &[String]) -> Self {
        let extra = extra_markers
            .iter()
            .filter_map(|marker| {
                let pattern = format!("(?i){}", regex::escape(marker));
                match Regex::new(&pattern) {
                    Ok(re) => Some(re),
                    Err(err) => {
                        log::warn!("skipping annotation marker {marker:?}: {err}");
                        None
                    }
                }
            })
            .collect();
        Self { extra }
    }

    pub fn classify(&self, comment: &Comment) -> Vec<Classification> {
        let lines = comment.sanitized_lines();
        let annotated: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| {
                DIRECTIVE.is_match(&line.text)
                    || self.extra.iter().any(|re| re.is_match(&line.text))
            })
            .map(|(i, _)| i)
            .collect();
        if annotated.is_empty() {
            return Vec::new();
        }
        if annotated.len() == lines.len() {
            return vec![Classification::whole(CommentClass::Annotation)];
        }
        vec![Classification::partial(CommentClass::Annotation, annotated)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Span;
    use pretty_assertions::assert_eq;

    fn comment(text: &str) -> Comment {
        Comment::new(Span::new(0, text.len()), text, 0)
    }

    #[test]
    fn linter_directives_are_whole_annotations() {
        let matcher = AnnotationMatcher::new(&[]);
        for text in [
            "// tslint:disable-next-line:no-console",
            "// eslint-disable-next-line no-unused-vars",
            "// @ts-ignore",
            "// prettier-ignore",
        ] {
            assert_eq!(
                matcher.classify(&comment(text)),
                vec![Classification::whole(CommentClass::Annotation)],
                "for {text:?}"
            );
        }
    }

    #[test]
    fn directive_mixed_with_prose_is_partial() {
        let matcher = AnnotationMatcher::new(&[]);
        let text = "// the logger is intentionally global here\n// eslint-disable-next-line no-console";
        assert_eq!(
            matcher.classify(&comment(text)),
            vec![Classification::partial(CommentClass::Annotation, vec![1])]
        );
    }

    #[test]
    fn configured_markers_match_anywhere_in_the_line() {
        let matcher = AnnotationMatcher::new(&["@internal".to_string()]);
        assert_eq!(
            matcher.classify(&comment("// marked @internal for codegen")),
            vec![Classification::whole(CommentClass::Annotation)]
        );
    }

    #[test]
    fn prose_is_left_alone() {
        let matcher = AnnotationMatcher::new(&[]);
        assert_eq!(
            matcher.classify(&comment("// disables the cache during tests")),
            Vec::new()
        );
    }
}
