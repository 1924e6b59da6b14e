// Export modules for library usage
pub mod classify;
pub mod config;
pub mod core;
pub mod detect;
pub mod engine;
pub mod errors;
pub mod index;
pub mod metrics;
pub mod quality;
pub mod sections;

// Re-export commonly used types
pub use crate::config::{AnalysisConfig, DetectorKind};
pub use crate::core::{
    Classification, Comment, CommentClass, CommentQuality, Failure, FailureSink, Span,
};
pub use crate::engine::CommentAuditor;
pub use crate::errors::CommentmapError;
pub use crate::quality::{CommentQualityEvaluator, Evaluation};
