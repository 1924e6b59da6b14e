use std::collections::HashMap;

use super::MetricCollector;
use crate::core::{NodeId, NodeKind, SyntaxArena, SyntaxNode};
use crate::index::SourceIndex;

/// Classic cyclomatic complexity, computed per function scope.
///
/// Each function starts at 1; branches, loops, logical operators, catch
/// clauses and non-empty switch cases add one each. Nested functions open
/// their own scope and do not contribute to the enclosing function's count.
/// Statement blocks record the complexity added within them; a function body
/// block records the full complexity of its function.
#[derive(Default)]
pub struct CyclomaticComplexityCollector {
    complexities: HashMap<NodeId, u32>,
}

impl MetricCollector for CyclomaticComplexityCollector {
    fn visit(&mut self, index: &SourceIndex, node: NodeId) {
        let arena = index.arena();
        if !arena.node(node).kind.is_function_like() {
            return;
        }
        if self.complexities.contains_key(&node) {
            return;
        }
        let mut complexity = 0;
        self.walk(arena, node, &mut complexity);
    }
}

impl CyclomaticComplexityCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node: NodeId) -> Option<u32> {
        self.complexities.get(&node).copied()
    }

    fn walk(&mut self, arena: &SyntaxArena, id: NodeId, complexity: &mut u32) {
        let node = arena.node(id);
        if node.kind.is_function_like() {
            let enclosing = *complexity;
            *complexity = 1;
            for &child in &node.children {
                self.walk(arena, child, complexity);
            }
            if let Some(body) = function_body(arena, node) {
                self.complexities.insert(body, *complexity);
            }
            self.complexities.insert(id, *complexity);
            *complexity = enclosing;
            return;
        }

        if increases_complexity(node) {
            *complexity += 1;
        }
        let before = *complexity;
        for &child in &node.children {
            self.walk(arena, child, complexity);
        }
        if node.kind == NodeKind::StatementBlock {
            self.complexities.insert(id, (*complexity - before).max(1));
        }
    }
}

fn function_body(arena: &SyntaxArena, node: &SyntaxNode) -> Option<NodeId> {
    node.children
        .iter()
        .rev()
        .copied()
        .find(|&child| arena.node(child).kind == NodeKind::StatementBlock)
}

fn increases_complexity(node: &SyntaxNode) -> bool {
    match node.kind {
        NodeKind::IfStatement
        | NodeKind::WhileStatement
        | NodeKind::DoStatement
        | NodeKind::ForStatement
        | NodeKind::ForInStatement
        | NodeKind::TernaryExpression
        | NodeKind::CatchClause
        | NodeKind::LogicalExpression => true,
        // a switch case with nothing after its value adds no path
        NodeKind::SwitchCase => node.children.len() > 1,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SyntaxArena;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use tree_sitter::Parser;

    fn collect(source: &str) -> (SourceIndex, CyclomaticComplexityCollector) {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
            .unwrap();
        let index = SourceIndex::new(SyntaxArena::parse(&mut parser, source).unwrap());
        let mut collector = CyclomaticComplexityCollector::new();
        for &func in index.function_likes() {
            collector.visit(&index, func);
        }
        (index, collector)
    }

    fn function_complexity(source: &str) -> u32 {
        let (index, collector) = collect(source);
        let func = index.function_likes()[0];
        collector.get(func).unwrap()
    }

    #[test]
    fn straight_line_function_scores_one() {
        let complexity = function_complexity(indoc! {"
            function f() {
                const a = 1;
                return a;
            }
        "});
        assert_eq!(complexity, 1);
    }

    #[test]
    fn branches_logical_operators_and_loops_each_add_one() {
        // if + && + for-of + ternary on top of the base of 1
        let complexity = function_complexity(indoc! {"
            function f(items, flag) {
                if (flag && items.length > 0) {
                    for (const item of items) {
                        item.value = item.ok ? 1 : 0;
                    }
                }
                return items;
            }
        "});
        assert_eq!(complexity, 5);
    }

    #[test]
    fn nested_functions_keep_their_own_scope() {
        let (index, collector) = collect(indoc! {"
            function outer() {
                const inner = (x) => (x ? 1 : 0);
                return inner(2);
            }
        "});
        let outer = index.function_likes()[0];
        let inner = index.function_likes()[1];
        assert_eq!(collector.get(outer), Some(1));
        assert_eq!(collector.get(inner), Some(2));
    }

    #[test]
    fn nullish_coalescing_adds_no_path() {
        let complexity = function_complexity(indoc! {"
            function f(x) {
                return x ?? 0;
            }
        "});
        assert_eq!(complexity, 1);
    }

    #[test]
    fn empty_switch_cases_do_not_count() {
        let complexity = function_complexity(indoc! {"
            function f(x) {
                switch (x) {
                    case 1:
                    case 2:
                        return 'small';
                    default:
                        return 'other';
                }
            }
        "});
        // only the non-empty case adds a path
        assert_eq!(complexity, 2);
    }

    #[test]
    fn catch_clause_adds_one() {
        let complexity = function_complexity(indoc! {"
            function f() {
                try {
                    risky();
                } catch (e) {
                    return null;
                }
                return 1;
            }
        "});
        assert_eq!(complexity, 2);
    }

    #[test]
    fn function_body_block_records_full_complexity() {
        let (index, collector) = collect(indoc! {"
            function f(a) {
                if (a) {
                    return 1;
                }
                return 0;
            }
        "});
        let func = index.function_likes()[0];
        let body = *index
            .arena()
            .node(func)
            .children
            .iter()
            .rev()
            .find(|&&c| index.arena().node(c).kind == NodeKind::StatementBlock)
            .unwrap();
        assert_eq!(collector.get(body), Some(2));
        assert_eq!(collector.get(func), Some(2));
    }
}
