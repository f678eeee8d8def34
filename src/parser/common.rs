use crate::error::Result;
use crate::syntax::File;
use std::path::Path;

/// Result of parsing a source file
#[derive(Debug)]
pub struct ParseResult {
    /// Lowered syntax of the file
    pub file: File,

    /// Syntax errors as `path:line:column: message`
    pub errors: Vec<String>,
}

/// Trait for language-specific parsers
pub trait Parser {
    /// Parse a source file into the shared syntax model
    fn parse(&mut self, path: &Path, contents: &str) -> Result<ParseResult>;
}

/// Extract text from a node
pub fn node_text<'a>(node: tree_sitter::Node<'a>, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

/// Named children, without comments
pub fn named_children<'a>(node: tree_sitter::Node<'a>) -> Vec<tree_sitter::Node<'a>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// Find all children of a specific kind
pub fn children_of_kind<'a>(node: tree_sitter::Node<'a>, kind: &str) -> Vec<tree_sitter::Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|child| child.kind() == kind)
        .collect()
}

/// Children stored under `field`, restricted to one node kind
pub fn field_children<'a>(
    node: tree_sitter::Node<'a>,
    field: &str,
    kind: &str,
) -> Vec<tree_sitter::Node<'a>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor)
        .filter(|child| child.kind() == kind)
        .collect()
}

/// 1-based `path:line:column` of a node
pub fn location(path: &Path, node: tree_sitter::Node) -> String {
    let start = node.start_position();
    format!("{}:{}:{}", path.display(), start.row + 1, start.column + 1)
}

/// Iterator over all descendant nodes
pub fn descendants(node: tree_sitter::Node) -> impl Iterator<Item = tree_sitter::Node> {
    DescendantIterator::new(node)
}

struct DescendantIterator<'a> {
    cursor: tree_sitter::TreeCursor<'a>,
    done: bool,
}

impl<'a> DescendantIterator<'a> {
    fn new(node: tree_sitter::Node<'a>) -> Self {
        Self {
            cursor: node.walk(),
            done: false,
        }
    }
}

impl<'a> Iterator for DescendantIterator<'a> {
    type Item = tree_sitter::Node<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let node = self.cursor.node();

        if self.cursor.goto_first_child() {
            return Some(node);
        }

        loop {
            if self.cursor.goto_next_sibling() {
                return Some(node);
            }

            if !self.cursor.goto_parent() {
                self.done = true;
                return Some(node);
            }
        }
    }
}
