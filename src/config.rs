use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::detect::{CodeDetector, LexicalDetector, ParseAttemptDetector, TokenDensityDetector};
use crate::errors::CommentmapError;

/// Which code detector the classifier runs over comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DetectorKind {
    #[default]
    ParseAttempt,
    Lexical,
    TokenDensity,
}

/// Tunable thresholds and switches for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// A gap-delimited section above this complexity must carry a comment.
    #[serde(default = "default_section_complexity_threshold")]
    pub section_complexity_threshold: f64,

    /// A function whose summed line complexity exceeds this must carry a
    /// comment, checked after its sections.
    #[serde(default = "default_node_total_complexity_threshold")]
    pub node_total_complexity_threshold: f64,

    /// Single lines above this complexity are picked as fallback targets.
    #[serde(default = "default_line_complexity_threshold")]
    pub line_complexity_threshold: f64,

    #[serde(default)]
    pub detector: DetectorKind,

    /// Free-form markers treated as annotations wherever they appear in a
    /// comment line.
    #[serde(default)]
    pub annotation_markers: Vec<String>,

    /// Recursion cap for section detection in pathologically nested code.
    #[serde(default = "default_max_section_depth")]
    pub max_section_depth: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            section_complexity_threshold: default_section_complexity_threshold(),
            node_total_complexity_threshold: default_node_total_complexity_threshold(),
            line_complexity_threshold: default_line_complexity_threshold(),
            detector: DetectorKind::default(),
            annotation_markers: Vec::new(),
            max_section_depth: default_max_section_depth(),
        }
    }
}

fn default_section_complexity_threshold() -> f64 {
    7.0
}

fn default_node_total_complexity_threshold() -> f64 {
    5.0
}

fn default_line_complexity_threshold() -> f64 {
    3.0
}

fn default_max_section_depth() -> usize {
    64
}

impl AnalysisConfig {
    pub fn from_toml_str(content: &str) -> crate::errors::Result<Self> {
        toml::from_str(content).map_err(|e| CommentmapError::Config(e.to_string()))
    }

    pub fn build_detector(&self) -> Result<Box<dyn CodeDetector>> {
        Ok(match self.detector {
            DetectorKind::ParseAttempt => Box::new(ParseAttemptDetector::new()?),
            DetectorKind::Lexical => Box::new(LexicalDetector::new()?),
            DetectorKind::TokenDensity => Box::new(TokenDensityDetector::new()?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_the_documented_thresholds() {
        let config = AnalysisConfig::default();
        assert_eq!(config.section_complexity_threshold, 7.0);
        assert_eq!(config.node_total_complexity_threshold, 5.0);
        assert_eq!(config.line_complexity_threshold, 3.0);
        assert_eq!(config.detector, DetectorKind::ParseAttempt);
        assert_eq!(config.max_section_depth, 64);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config = AnalysisConfig::from_toml_str(indoc! {r#"
            detector = "lexical"
            section_complexity_threshold = 9.5
        "#})
        .unwrap();
        assert_eq!(config.detector, DetectorKind::Lexical);
        assert_eq!(config.section_complexity_threshold, 9.5);
        assert_eq!(config.node_total_complexity_threshold, 5.0);
    }

    #[test]
    fn annotation_markers_round_trip() {
        let config = AnalysisConfig::from_toml_str(indoc! {r#"
            annotation_markers = ["@internal", "@generated"]
        "#})
        .unwrap();
        assert_eq!(config.annotation_markers.len(), 2);
    }

    #[test]
    fn unknown_detector_is_a_config_error() {
        let err = AnalysisConfig::from_toml_str(r#"detector = "psychic""#).unwrap_err();
        assert!(err.to_string().contains("invalid configuration"));
    }
}
