pub mod cyclomatic;
pub mod loc;
pub mod nesting;

pub use cyclomatic::CyclomaticComplexityCollector;
pub use loc::LinesOfCodeCollector;
pub use nesting::NestingLevelCollector;

use crate::core::NodeId;
use crate::index::SourceIndex;

/// A memoizing per-node metric. Visiting the same node twice is a no-op.
pub trait MetricCollector {
    fn visit(&mut self, index: &SourceIndex, node: NodeId);
}
