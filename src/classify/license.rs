use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::{Classification, Comment, CommentClass};

/// Names of well-known license families, matched case-insensitively.
/// Spelled-out names and the usual short forms both count.
static LICENSE_FAMILY: Lazy<Regex> = Lazy::new(|| {
    let families = [
        r"\bmit\b",
        r"academic free licen[sc]e",
        r"\bafl\b",
        r"affero general public licen[sc]e",
        r"apache licen[sc]e",
        r"\bapache[\s-]2\b",
        r"artistic licen[sc]e",
        r"\bbsd\b",
        r"boost software licen[sc]e",
        r"creative commons",
        r"\bcc[\s-]by\b",
        r"eclipse public licen[sc]e",
        r"\bepl\b",
        r"gnu (lesser )?general public licen[sc]e",
        r"\b(a|l)?gpl\b",
        r"mozilla public licen[sc]e",
        r"\bmpl\b",
        r"\bzlib\b",
    ];
    Regex::new(&format!("(?i)({})", families.join("|"))).unwrap()
});

/// General legalese markers: the word license in any spelling, copyright
/// notices, and the classic warranty disclaimer.
static LEGAL_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)[\s-]licen[sc]e[\s.,-]|copyright|copyleft|\(c\)|provided "as is""#).unwrap()
});

/// Flags license and copyright headers. A named license family plus one
/// legal marker, or two legal markers on their own, mark the whole comment.
pub struct LicenseMatcher;

impl LicenseMatcher {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, comment: &Comment) -> Vec<Classification> {
        let text = comment.sanitized_text();
        let markers = LEGAL_MARKER.find_iter(&text).count();
        let has_family = LICENSE_FAMILY.is_match(&text);
        if (has_family && markers >= 1) || markers > 1 {
            vec![Classification::whole(CommentClass::Copyright)]
        } else {
            Vec::new()
        }
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
    fn mit_header_is_a_copyright_comment() {
        let text = "/*\n * Copyright (c) 2024 Example Corp.\n * Released under the MIT License.\n */";
        let result = LicenseMatcher::new().classify(&comment(text));
        assert_eq!(
            result,
            vec![Classification::whole(CommentClass::Copyright)]
        );
    }

    #[test]
    fn two_legal_markers_suffice_without_a_family_name() {
        let text = "// Copyright 2024. Provided \"as is\" without warranty.";
        let result = LicenseMatcher::new().classify(&comment(text));
        assert_eq!(
            result,
            vec![Classification::whole(CommentClass::Copyright)]
        );
    }

    #[test]
    fn short_form_family_names_count() {
        for text in [
            "// Released under the AGPL. Copyright 2024 Acme.",
            "// BSD-style. Copyright 2024 Example Corp.",
            "// CC BY 4.0, copyright the contributors",
        ] {
            assert_eq!(
                LicenseMatcher::new().classify(&comment(text)),
                vec![Classification::whole(CommentClass::Copyright)],
                "for {text:?}"
            );
        }
    }

    #[test]
    fn mentioning_a_license_once_is_not_enough() {
        let text = "// see the license file for details";
        assert_eq!(LicenseMatcher::new().classify(&comment(text)), Vec::new());
    }

    #[test]
    fn ordinary_comments_are_untouched() {
        let text = "// increments the retry counter";
        assert_eq!(LicenseMatcher::new().classify(&comment(text)), Vec::new());
    }
}
