//! Pluggable front-ends that build an [`crate::ir::Tree`] from source text, selected by
//! name from the CLI's `--parser` flag. Real language front-ends are out of scope for
//! this crate; the only built-in parser reads the bundled [`crate::ir::sexpr`] notation,
//! but the trait exists so a caller embedding this crate can register their own.

use crate::error::CheckMergeError;
use crate::ir::Tree;

pub trait Parser {
    fn key(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn parse(&self, text: &str) -> Result<Tree, CheckMergeError>;
}

/// Reads the bundled s-expression notation (`kind[label]{ref}(child child...)`).
pub struct SexprParser;

impl Parser for SexprParser {
    fn key(&self) -> &'static str {
        "sexpr"
    }

    fn description(&self) -> &'static str {
        "s-expression notation `kind[label]{ref}(child child...)`, for demos and tests"
    }

    fn parse(&self, text: &str) -> Result<Tree, CheckMergeError> {
        crate::ir::sexpr::parse(text)
    }
}

/// An explicit, injected collection of [`Parser`]s, looked up by key.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn Parser>>,
}

impl ParserRegistry {
    pub fn with_defaults() -> Self {
        Self {
            parsers: vec![Box::new(SexprParser)],
        }
    }

    pub fn get(&self, key: &str) -> Option<&dyn Parser> {
        self.parsers.iter().find(|p| p.key() == key).map(AsRef::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Parser> {
        self.parsers.iter().map(AsRef::as_ref)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
