use std::collections::HashMap;

use super::MetricCollector;
use crate::core::{NodeId, NodeKind, SyntaxArena, SyntaxNode};
use crate::index::SourceIndex;

/// Nesting depth of nodes, counted in scope boundaries.
///
/// Statement blocks, class bodies and switch bodies each add a level for
/// their children. Brace-less bodies of branches, loops and arrow functions
/// add a level too, as does code hanging off an `else` without braces. Enum
/// bodies and object literal values add nothing.
#[derive(Default)]
pub struct NestingLevelCollector {
    levels: HashMap<NodeId, u32>,
}

impl MetricCollector for NestingLevelCollector {
    fn visit(&mut self, index: &SourceIndex, node: NodeId) {
        self.level(index.arena(), node);
    }
}

impl NestingLevelCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&mut self, arena: &SyntaxArena, node: NodeId) -> u32 {
        if let Some(&level) = self.levels.get(&node) {
            return level;
        }
        let level = match arena.node(node).parent {
            None => 0,
            Some(parent) => {
                self.level(arena, parent) + contribution(arena, arena.node(parent), node)
            }
        };
        self.levels.insert(node, level);
        level
    }

    /// Nesting level of the outermost node starting on the line.
    pub fn level_for_line(&mut self, index: &SourceIndex, line: usize) -> Option<u32> {
        let node = index.most_enclosing_node_for_line(line)?;
        Some(self.level(index.arena(), node))
    }
}

fn contribution(arena: &SyntaxArena, parent: &SyntaxNode, child: NodeId) -> u32 {
    match parent.kind {
        NodeKind::StatementBlock | NodeKind::ClassBody | NodeKind::SwitchBody => 1,
        NodeKind::ElseClause => {
            if arena.node(child).kind == NodeKind::StatementBlock {
                0
            } else {
                1
            }
        }
        kind if kind.has_nesting_body() => {
            if body_child(parent) == Some(child)
                && arena.node(child).kind != NodeKind::StatementBlock
            {
                1
            } else {
                0
            }
        }
        _ => 0,
    }
}

/// The child holding the statement body, for constructs that may omit braces.
fn body_child(parent: &SyntaxNode) -> Option<NodeId> {
    match parent.kind {
        NodeKind::IfStatement | NodeKind::WhileStatement => parent.children.get(1).copied(),
        NodeKind::DoStatement => parent.children.first().copied(),
        NodeKind::ForStatement | NodeKind::ForInStatement => parent.children.last().copied(),
        kind if kind.is_function_like() => parent.children.last().copied(),
        _ => None,
    }
}
