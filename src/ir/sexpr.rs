//! A tiny reader for a parenthesized notation used by tests and demos to build a
//! [`crate::ir::Tree`] without a real language front-end:
//!
//! ```text
//! kind[label]{reference}(child1 child2 ...)
//! ```
//!
//! `[label]`, `{reference}` and the children list are all optional. This is not a
//! language front-end in its own right (CheckMerge has no opinion on source syntax);
//! it exists purely so tests and the bundled demos have something concrete to parse.

use super::builder::TreeBuilder;
use super::{NodeId, Tree};
use crate::error::CheckMergeError;

pub fn parse(input: &str) -> Result<Tree, CheckMergeError> {
    let mut reader = Reader {
        chars: input.chars().collect(),
        pos: 0,
    };
    let mut builder = TreeBuilder::new();
    reader.skip_whitespace();
    let root = reader.read_node(&mut builder)?;
    reader.skip_whitespace();
    if reader.pos != reader.chars.len() {
        return Err(CheckMergeError::ParseFailure {
            message: format!("unexpected trailing input at position {}", reader.pos),
            path: "<sexpr>".to_string(),
        });
    }
    Ok(builder.finish(root))
}

struct Reader {
    chars: Vec<char>,
    pos: usize,
}

impl Reader {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn read_until(&mut self, terminator: char) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == terminator {
                break;
            }
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn read_ident(&mut self) -> String {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_' || c == '.' || c == '-') {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn expect(&mut self, expected: char) -> Result<(), CheckMergeError> {
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(CheckMergeError::ParseFailure {
                message: format!("expected '{expected}' at position {}", self.pos),
                path: "<sexpr>".to_string(),
            })
        }
    }

    fn read_node(&mut self, builder: &mut TreeBuilder) -> Result<NodeId, CheckMergeError> {
        let kind = self.read_ident();
        if kind.is_empty() {
            return Err(CheckMergeError::ParseFailure {
                message: format!("expected a node kind at position {}", self.pos),
                path: "<sexpr>".to_string(),
            });
        }

        let label = if self.peek() == Some('[') {
            self.pos += 1;
            let text = self.read_until(']');
            self.expect(']')?;
            Some(text)
        } else {
            None
        };

        let reference = if self.peek() == Some('{') {
            self.pos += 1;
            let text = self.read_until('}');
            self.expect('}')?;
            Some(text)
        } else {
            None
        };

        let mut children = Vec::new();
        if self.peek() == Some('(') {
            self.pos += 1;
            loop {
                self.skip_whitespace();
                if self.peek() == Some(')') {
                    self.pos += 1;
                    break;
                }
                children.push(self.read_node(builder)?);
                self.skip_whitespace();
            }
        }

        Ok(builder.node(kind, label, reference, None, children))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_leaf() {
        let tree = parse("ident[x]").unwrap();
        let root = tree.get(tree.root());
        assert_eq!(root.kind, "ident");
        assert_eq!(root.label.as_deref(), Some("x"));
        assert!(root.is_leaf());
    }

    #[test]
    fn parses_nested_children() {
        let tree = parse("block(stmt[a] stmt[b])").unwrap();
        let root = tree.get(tree.root());
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.height(), 1);
    }

    #[test]
    fn isomorphic_subtrees_hash_equal() {
        let t1 = parse("block(stmt[a] stmt[b])").unwrap();
        let t2 = parse("block(stmt[a] stmt[b])").unwrap();
        assert_eq!(t1.get(t1.root()).hash(), t2.get(t2.root()).hash());
    }

    #[test]
    fn rejects_unterminated_label() {
        assert!(parse("ident[x").is_err());
    }
}
