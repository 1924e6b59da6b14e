use anyhow::{Context, Result};
use tree_sitter::{Node, Parser, Tree};

use super::Span;

pub type NodeId = usize;

/// Grammar-independent node categories. Tree-sitter kind strings from the
/// JavaScript and TypeScript grammars are folded into this closed set so the
/// rest of the analysis never matches on raw kind strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Program,
    FunctionDeclaration,
    FunctionExpression,
    GeneratorFunction,
    ArrowFunction,
    MethodDefinition,
    ClassDeclaration,
    ClassBody,
    EnumDeclaration,
    EnumBody,
    StatementBlock,
    IfStatement,
    ElseClause,
    WhileStatement,
    DoStatement,
    ForStatement,
    ForInStatement,
    SwitchStatement,
    SwitchBody,
    SwitchCase,
    SwitchDefault,
    TernaryExpression,
    TryStatement,
    CatchClause,
    FinallyClause,
    LogicalExpression,
    BinaryExpression,
    UnaryExpression,
    UpdateExpression,
    CallExpression,
    NewExpression,
    CastExpression,
    ParenthesizedExpression,
    MemberExpression,
    ObjectLiteral,
    ArrayLiteral,
    Pair,
    VariableDeclaration,
    VariableDeclarator,
    FormalParameters,
    ExpressionStatement,
    ReturnStatement,
    FieldDefinition,
    Identifier,
    PropertyIdentifier,
    Other,
}

impl NodeKind {
    fn from_grammar(kind: &str, operator: Option<&str>) -> Self {
        match kind {
            "program" => NodeKind::Program,
            "function_declaration" => NodeKind::FunctionDeclaration,
            "function_expression" | "function" => NodeKind::FunctionExpression,
            "generator_function" | "generator_function_declaration" => NodeKind::GeneratorFunction,
            "arrow_function" => NodeKind::ArrowFunction,
            "method_definition" => NodeKind::MethodDefinition,
            "class_declaration" | "class" => NodeKind::ClassDeclaration,
            "class_body" => NodeKind::ClassBody,
            "enum_declaration" => NodeKind::EnumDeclaration,
            "enum_body" => NodeKind::EnumBody,
            "statement_block" => NodeKind::StatementBlock,
            "if_statement" => NodeKind::IfStatement,
            "else_clause" => NodeKind::ElseClause,
            "while_statement" => NodeKind::WhileStatement,
            "do_statement" => NodeKind::DoStatement,
            "for_statement" => NodeKind::ForStatement,
            // covers both for-in and for-of, distinguished by an operator field
            "for_in_statement" => NodeKind::ForInStatement,
            "switch_statement" => NodeKind::SwitchStatement,
            "switch_body" => NodeKind::SwitchBody,
            "switch_case" => NodeKind::SwitchCase,
            "switch_default" => NodeKind::SwitchDefault,
            "ternary_expression" => NodeKind::TernaryExpression,
            "try_statement" => NodeKind::TryStatement,
            "catch_clause" => NodeKind::CatchClause,
            "finally_clause" => NodeKind::FinallyClause,
            "binary_expression" => match operator {
                Some("&&") | Some("||") => NodeKind::LogicalExpression,
                _ => NodeKind::BinaryExpression,
            },
            "unary_expression" => NodeKind::UnaryExpression,
            "update_expression" => NodeKind::UpdateExpression,
            "call_expression" => NodeKind::CallExpression,
            "new_expression" => NodeKind::NewExpression,
            "as_expression" | "satisfies_expression" | "non_null_expression"
            | "type_assertion" => NodeKind::CastExpression,
            "parenthesized_expression" => NodeKind::ParenthesizedExpression,
            "member_expression" => NodeKind::MemberExpression,
            "object" => NodeKind::ObjectLiteral,
            "array" => NodeKind::ArrayLiteral,
            "pair" => NodeKind::Pair,
            "lexical_declaration" | "variable_declaration" => NodeKind::VariableDeclaration,
            "variable_declarator" => NodeKind::VariableDeclarator,
            "formal_parameters" => NodeKind::FormalParameters,
            "expression_statement" => NodeKind::ExpressionStatement,
            "return_statement" => NodeKind::ReturnStatement,
            "field_definition" | "public_field_definition" => NodeKind::FieldDefinition,
            "identifier" | "type_identifier" | "statement_identifier"
            | "shorthand_property_identifier" | "shorthand_property_identifier_pattern" => {
                NodeKind::Identifier
            }
            "property_identifier" => NodeKind::PropertyIdentifier,
            _ => NodeKind::Other,
        }
    }

    pub fn is_function_like(self) -> bool {
        matches!(
            self,
            NodeKind::FunctionDeclaration
                | NodeKind::FunctionExpression
                | NodeKind::GeneratorFunction
                | NodeKind::ArrowFunction
                | NodeKind::MethodDefinition
        )
    }

    pub fn is_class_like(self) -> bool {
        matches!(self, NodeKind::ClassDeclaration | NodeKind::EnumDeclaration)
    }

    pub fn is_iteration(self) -> bool {
        matches!(
            self,
            NodeKind::WhileStatement
                | NodeKind::DoStatement
                | NodeKind::ForStatement
                | NodeKind::ForInStatement
        )
    }

    /// Statements whose brace-less body nests one level deeper.
    pub fn has_nesting_body(self) -> bool {
        self == NodeKind::IfStatement || self.is_iteration() || self.is_function_like()
    }

    /// Expression kinds that participate in call/operator chains.
    pub fn is_expression_chain(self) -> bool {
        matches!(
            self,
            NodeKind::CallExpression
                | NodeKind::NewExpression
                | NodeKind::LogicalExpression
                | NodeKind::BinaryExpression
                | NodeKind::UnaryExpression
                | NodeKind::UpdateExpression
                | NodeKind::CastExpression
        )
    }

    pub fn is_identifier(self) -> bool {
        matches!(self, NodeKind::Identifier | NodeKind::PropertyIdentifier)
    }
}

/// A named syntax node, flattened out of the tree-sitter tree.
#[derive(Debug, Clone)]
pub struct SyntaxNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub span: Span,
    pub start_line: usize,
    pub end_line: usize,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// A comment token as produced by the parser, before merging.
#[derive(Debug, Clone)]
pub struct RawComment {
    pub span: Span,
    pub text: String,
    pub start_line: usize,
    pub end_line: usize,
}

/// Owned, flattened syntax tree. Nodes are stored in preorder, so for any
/// line the first node starting there is the outermost one. Comments are
/// diverted into a separate stream during construction.
pub struct SyntaxArena {
    source: String,
    nodes: Vec<SyntaxNode>,
    raw_comments: Vec<RawComment>,
    line_starts: Vec<usize>,
}

impl SyntaxArena {
    pub fn parse(parser: &mut Parser, source: &str) -> Result<Self> {
        let tree = parser
            .parse(source, None)
            .context("parser returned no tree for source")?;
        Ok(Self::from_tree(&tree, source))
    }

    pub fn from_tree(tree: &Tree, source: &str) -> Self {
        let mut arena = Self {
            source: source.to_string(),
            nodes: Vec::new(),
            raw_comments: Vec::new(),
            line_starts: compute_line_starts(source),
        };
        arena.build(tree.root_node(), None, source);
        arena
    }

    fn build(&mut self, node: Node, parent: Option<NodeId>, source: &str) -> Option<NodeId> {
        let kind = node.kind();
        if kind == "comment" || kind == "html_comment" {
            let span = Span::new(node.start_byte(), node.end_byte());
            self.raw_comments.push(RawComment {
                span,
                text: source[span.start..span.end].to_string(),
                start_line: node.start_position().row,
                end_line: node.end_position().row,
            });
            return None;
        }
        if !node.is_named() {
            return None;
        }

        let operator = node
            .child_by_field_name("operator")
            .map(|op| op.kind().to_string());
        let id = self.nodes.len();
        self.nodes.push(SyntaxNode {
            id,
            kind: NodeKind::from_grammar(kind, operator.as_deref()),
            span: Span::new(node.start_byte(), node.end_byte()),
            start_line: node.start_position().row,
            end_line: node.end_position().row,
            parent,
            children: Vec::new(),
        });

        let mut children = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if let Some(child_id) = self.build(child, Some(id), source) {
                children.push(child_id);
            }
        }
        self.nodes[id].children = children;
        Some(id)
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[SyntaxNode] {
        &self.nodes
    }

    pub fn raw_comments(&self) -> &[RawComment] {
        &self.raw_comments
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn text(&self, id: NodeId) -> &str {
        let span = self.nodes[id].span;
        &self.source[span.start..span.end]
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn line_start(&self, line: usize) -> usize {
        self.line_starts[line]
    }

    /// Byte offset just before the line terminator (or end of file).
    pub fn line_end(&self, line: usize) -> usize {
        match self.line_starts.get(line + 1) {
            Some(&next) => {
                let mut end = next;
                let bytes = self.source.as_bytes();
                while end > self.line_starts[line]
                    && (bytes[end - 1] == b'\n' || bytes[end - 1] == b'\r')
                {
                    end -= 1;
                }
                end
            }
            None => self.source.len(),
        }
    }

    pub fn line_text(&self, line: usize) -> &str {
        &self.source[self.line_start(line)..self.line_end(line)]
    }

    pub fn offset_to_line(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset) - 1
    }

    /// Walks the parent chain starting at the node's direct parent.
    pub fn ancestors(&self, id: NodeId) -> AncestorIter<'_> {
        AncestorIter {
            arena: self,
            next: self.nodes[id].parent,
        }
    }
}

pub struct AncestorIter<'a> {
    arena: &'a SyntaxArena,
    next: Option<NodeId>,
}

impl Iterator for AncestorIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.arena.node(current).parent;
        Some(current)
    }
}

fn compute_line_starts(source: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (pos, byte) in source.bytes().enumerate() {
        if byte == b'\n' {
            starts.push(pos + 1);
        }
    }
    starts
}
