pub mod arena;
pub mod comment;

pub use arena::{NodeId, NodeKind, RawComment, SyntaxArena, SyntaxNode};
pub use comment::{Classification, Comment, CommentClass, CommentId};

/// Half-open byte range into the analyzed source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_pos(&self, pos: usize) -> bool {
        self.start <= pos && pos < self.end
    }

    /// True if `other` lies completely within this span.
    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// A single analysis finding, delivered to the host as a byte range plus message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub start: usize,
    pub end: usize,
    pub message: String,
}

/// Sink for analysis findings. The host decides how failures are presented.
pub trait FailureSink {
    fn report(&mut self, start: usize, end: usize, message: String);
}

impl FailureSink for Vec<Failure> {
    fn report(&mut self, start: usize, end: usize, message: String) {
        self.push(Failure {
            start,
            end,
            message,
        });
    }
}

/// Ordinal ranking of a comment's documentation value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommentQuality {
    Unknown,
    Unhelpful,
    Low,
    Medium,
    High,
}

impl CommentQuality {
    pub fn tier(self) -> i32 {
        match self {
            CommentQuality::Unknown => 0,
            CommentQuality::Unhelpful => 1,
            CommentQuality::Low => 2,
            CommentQuality::Medium => 3,
            CommentQuality::High => 4,
        }
    }

    /// One tier up, capped at High.
    pub fn raised(self) -> Self {
        match self {
            CommentQuality::Unknown => CommentQuality::Unhelpful,
            CommentQuality::Unhelpful => CommentQuality::Low,
            CommentQuality::Low => CommentQuality::Medium,
            CommentQuality::Medium | CommentQuality::High => CommentQuality::High,
        }
    }

    /// One tier down, floored at Unhelpful. Unknown stays Unknown.
    pub fn lowered(self) -> Self {
        match self {
            CommentQuality::Unknown => CommentQuality::Unknown,
            CommentQuality::Unhelpful | CommentQuality::Low => CommentQuality::Unhelpful,
            CommentQuality::Medium => CommentQuality::Low,
            CommentQuality::High => CommentQuality::Medium,
        }
    }
}
