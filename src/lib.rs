//! Analysis of source-code merges for semantic conflicts that a purely textual or
//! structural merge would miss.
//!
//! CheckMerge takes three versions of a piece of code (a common ancestor, and the base
//! and other revisions of a merge), already parsed into an [`ir::Tree`], diffs each
//! revision against the ancestor, and runs a set of pluggable [`analysis::Analysis`]
//! passes over the combined three-way result: places where one side relied on something
//! (a memory dependency, a symbol definition) that the other side silently changed.
//!
//! It is not a merge tool: it reports conflicts, it does not resolve them.
//!
//! ## Using as a library
//!
//! CheckMerge is primarily driven from its CLI (`src/bin/checkmerge.rs`), but its pieces
//! are public so a caller with its own language front-end can build an [`ir::Tree`]
//! directly and run the same pipeline: [`tree_matcher`] to match two trees, [`diff`] to
//! turn a matching into an edit script, [`analysis`] to run conflict-detection passes
//! over a three-way [`diff::MergeDiffResult`].

pub mod analysis;
pub mod diff;
pub mod edit_script;
pub mod error;
pub mod ir;
pub mod matching;
pub(crate) mod multimap;
pub mod parser;
pub(crate) mod priority_list;
pub mod report;
pub mod tree_matcher;

pub use error::CheckMergeError;
pub use tree_matcher::TreeMatcher;
