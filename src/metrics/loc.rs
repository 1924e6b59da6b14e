use std::collections::HashMap;

use super::MetricCollector;
use crate::core::{NodeId, NodeKind};
use crate::index::SourceIndex;

/// Code-bearing lines per node. Blank and comment-only lines are excluded;
/// a line holding only a brace still counts.
#[derive(Default)]
pub struct LinesOfCodeCollector {
    lines: HashMap<NodeId, u32>,
}

impl MetricCollector for LinesOfCodeCollector {
    fn visit(&mut self, index: &SourceIndex, node: NodeId) {
        let kind = index.arena().node(node).kind;
        if kind.is_function_like() || kind == NodeKind::StatementBlock {
            self.measure(index, node);
        }
    }
}

impl LinesOfCodeCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node: NodeId) -> Option<u32> {
        self.lines.get(&node).copied()
    }

    pub fn measure(&mut self, index: &SourceIndex, node: NodeId) -> u32 {
        if let Some(&count) = self.lines.get(&node) {
            return count;
        }
        let n = index.arena().node(node);
        let count = (n.start_line..=n.end_line)
            .filter(|&line| index.is_code_line(line))
            .count() as u32;
        self.lines.insert(node, count);
        count
    }
}
