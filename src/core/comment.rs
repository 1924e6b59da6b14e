use super::Span;

pub type CommentId = usize;

/// Role or defect assigned to a comment (or a subset of its lines).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentClass {
    Copyright,
    Header,
    Member,
    Inline,
    Section,
    Code,
    Task,
    Annotation,
    Unknown,
}

/// A classification applies either to the whole comment (`lines` is None) or
/// to a subset of its sanitized lines, identified by zero-based line indices
/// relative to the comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub class: CommentClass,
    pub lines: Option<Vec<usize>>,
}

impl Classification {
    pub fn whole(class: CommentClass) -> Self {
        Self { class, lines: None }
    }

    pub fn partial(class: CommentClass, lines: Vec<usize>) -> Self {
        Self {
            class,
            lines: Some(lines),
        }
    }

    pub fn is_whole(&self) -> bool {
        self.lines.is_none()
    }

    pub fn applies_to_line(&self, line: usize) -> bool {
        match &self.lines {
            None => true,
            Some(lines) => lines.contains(&line),
        }
    }
}

/// One contiguous comment token belonging to a merged comment.
#[derive(Debug, Clone)]
pub struct CommentPart {
    pub span: Span,
    pub text: String,
    pub start_line: usize,
    pub end_line: usize,
}

/// A comment line with its marker chrome stripped. The span still covers the
/// raw line so findings can point back into the source.
#[derive(Debug, Clone)]
pub struct SanitizedLine {
    pub span: Span,
    pub text: String,
}

/// A logical comment: one or more consecutive comment tokens merged into a
/// single unit, with sanitized lines precomputed and an append-only list of
/// classifications.
#[derive(Debug, Clone)]
pub struct Comment {
    parts: Vec<CommentPart>,
    sanitized: Vec<SanitizedLine>,
    classifications: Vec<Classification>,
    trailing: bool,
}

impl Comment {
    pub fn new(span: Span, text: &str, start_line: usize) -> Self {
        let end_line = start_line + text.matches('\n').count();
        let mut comment = Self {
            parts: vec![CommentPart {
                span,
                text: text.to_string(),
                start_line,
                end_line,
            }],
            sanitized: Vec::new(),
            classifications: Vec::new(),
            trailing: false,
        };
        comment.resanitize();
        comment
    }

    /// Appends a further comment token to this logical comment.
    pub fn add_part(&mut self, span: Span, text: &str, start_line: usize) {
        let end_line = start_line + text.matches('\n').count();
        self.parts.push(CommentPart {
            span,
            text: text.to_string(),
            start_line,
            end_line,
        });
        self.resanitize();
    }

    pub fn parts(&self) -> &[CommentPart] {
        &self.parts
    }

    pub fn span(&self) -> Span {
        let first = &self.parts[0];
        let last = &self.parts[self.parts.len() - 1];
        Span::new(first.span.start, last.span.end)
    }

    pub fn start_line(&self) -> usize {
        self.parts[0].start_line
    }

    pub fn end_line(&self) -> usize {
        self.parts[self.parts.len() - 1].end_line
    }

    pub fn covers_line(&self, line: usize) -> bool {
        self.start_line() <= line && line <= self.end_line()
    }

    /// Raw comment text with parts joined by newlines.
    pub fn text(&self) -> String {
        let texts: Vec<&str> = self.parts.iter().map(|p| p.text.as_str()).collect();
        texts.join("\n")
    }

    pub fn sanitized_lines(&self) -> &[SanitizedLine] {
        &self.sanitized
    }

    pub fn sanitized_text(&self) -> String {
        let lines: Vec<&str> = self.sanitized.iter().map(|l| l.text.as_str()).collect();
        lines.join("\n")
    }

    /// Source span of the sanitized line at `index`.
    pub fn line_span(&self, index: usize) -> Span {
        self.sanitized[index].span
    }

    pub fn is_trailing(&self) -> bool {
        self.trailing
    }

    pub fn set_trailing(&mut self, trailing: bool) {
        self.trailing = trailing;
    }

    pub fn classifications(&self) -> &[Classification] {
        &self.classifications
    }

    /// Appends classifications. Existing entries are never removed or reordered.
    pub fn record_classifications(&mut self, classifications: Vec<Classification>) {
        self.classifications.extend(classifications);
    }

    pub fn has_whole_classification(&self, class: CommentClass) -> bool {
        self.classifications
            .iter()
            .any(|c| c.class == class && c.is_whole())
    }

    fn resanitize(&mut self) {
        self.sanitized.clear();
        for part in &self.parts {
            let mut pos = part.span.start;
            for raw_line in part.text.split('\n') {
                let display = raw_line.strip_suffix('\r').unwrap_or(raw_line);
                self.sanitized.push(SanitizedLine {
                    span: Span::new(pos, pos + display.len()),
                    text: sanitize_line(display),
                });
                pos += raw_line.len() + 1;
            }
        }
    }
}

/// Strips comment markers from a line: leading `//`, `/*` and `*`
/// continuations (with any interleaved whitespace) and a trailing `*/`.
fn sanitize_line(line: &str) -> String {
    let mut text = line.trim_start();
    loop {
        let before = text;
        if let Some(rest) = text.strip_prefix("//") {
            text = rest.trim_start_matches('/');
        } else if let Some(rest) = text.strip_prefix("/*") {
            text = rest.trim_start_matches('*');
        } else if text.starts_with('*') && !text.starts_with("*/") {
            text = text.trim_start_matches('*');
        }
        if text == before {
            break;
        }
        text = text.trim_start();
    }
    let trimmed = text.trim_end();
    if let Some(rest) = trimmed.strip_suffix("*/") {
        return rest.trim_end().to_string();
    }
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sanitize_strips_line_comment_markers() {
        assert_eq!(sanitize_line("// hello"), "hello");
        assert_eq!(sanitize_line("    /// doc text"), "doc text");
        assert_eq!(sanitize_line("  // // nested marker"), "nested marker");
    }

    #[test]
    fn sanitize_strips_block_comment_chrome() {
        assert_eq!(sanitize_line("/* start"), "start");
        assert_eq!(sanitize_line(" * middle"), "middle");
        assert_eq!(sanitize_line(" */"), "");
        assert_eq!(sanitize_line("/** jsdoc opener"), "jsdoc opener");
        assert_eq!(sanitize_line(" * closing line */"), "closing line");
    }

    #[test]
    fn merged_comment_exposes_lines_across_parts() {
        let mut comment = Comment::new(Span::new(0, 10), "// line a", 0);
        comment.add_part(Span::new(10, 20), "// line b", 1);
        assert_eq!(comment.start_line(), 0);
        assert_eq!(comment.end_line(), 1);
        assert_eq!(comment.sanitized_lines().len(), 2);
        assert_eq!(comment.sanitized_text(), "line a\nline b");
        assert_eq!(comment.line_span(1), Span::new(10, 19));
    }

    #[test]
    fn classifications_are_append_only() {
        let mut comment = Comment::new(Span::new(0, 8), "// text", 0);
        comment.record_classifications(vec![Classification::whole(CommentClass::Inline)]);
        comment.record_classifications(vec![Classification::partial(CommentClass::Code, vec![0])]);
        assert_eq!(comment.classifications().len(), 2);
        assert_eq!(comment.classifications()[0].class, CommentClass::Inline);
        assert!(comment.classifications()[1].applies_to_line(0));
    }

    #[test]
    fn multiline_block_comment_spans_all_lines() {
        let text = "/*\n * one\n * two\n */";
        let comment = Comment::new(Span::new(0, text.len()), text, 4);
        assert_eq!(comment.end_line(), 7);
        assert_eq!(comment.sanitized_lines().len(), 4);
        assert_eq!(comment.sanitized_lines()[1].text, "one");
        assert_eq!(comment.sanitized_lines()[3].text, "");
    }
}
