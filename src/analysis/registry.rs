//! Where the built-in [`Analysis`] passes are assembled, as an explicit injected struct
//! rather than a process-wide lazy static: a [`Registry`] is built once by the caller
//! (the CLI binary, or a test) and handed to whatever needs to run analyses.

use super::dependence::DependenceAnalysis;
use super::reference::ReferenceAnalysis;
use super::{Analysis, AnalysisResult};
use crate::diff::MergeDiffResult;

/// An ordered collection of [`Analysis`] passes, looked up by key. Disabled entries are
/// kept out of `get`/`keys`/`iter`/`run_all` but remembered, with a reason, for
/// `disabled()` to report.
pub struct Registry {
    analyses: Vec<Box<dyn Analysis>>,
    disabled: Vec<(&'static str, String)>,
}

impl Registry {
    /// The registry containing every built-in analysis.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(DependenceAnalysis));
        registry.register(Box::new(ReferenceAnalysis));
        registry
    }

    pub fn empty() -> Self {
        Self {
            analyses: Vec::new(),
            disabled: Vec::new(),
        }
    }

    pub fn register(&mut self, analysis: Box<dyn Analysis>) {
        self.analyses.push(analysis);
    }

    /// Marks a previously registered analysis as disabled, recording why. Disabling an
    /// unregistered key is a no-op.
    pub fn disable(&mut self, key: &str, reason: impl Into<String>) {
        if let Some(pos) = self.analyses.iter().position(|a| a.key() == key) {
            let analysis = self.analyses.remove(pos);
            self.disabled.push((analysis.key(), reason.into()));
        }
    }

    pub fn get(&self, key: &str) -> Option<&dyn Analysis> {
        self.analyses.iter().find(|a| a.key() == key).map(AsRef::as_ref)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.analyses.iter().map(|a| a.key())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Analysis> {
        self.analyses.iter().map(AsRef::as_ref)
    }

    /// Disabled analyses, each with the reason it was disabled.
    pub fn disabled(&self) -> impl Iterator<Item = &(&'static str, String)> {
        self.disabled.iter()
    }

    /// Runs every registered analysis (or, if `only` is non-empty, just the named ones)
    /// against `merge`, concatenating their results.
    pub fn run_all<'t>(&self, merge: &MergeDiffResult<'t>, only: &[String]) -> Vec<AnalysisResult> {
        self.analyses
            .iter()
            .filter(|a| only.is_empty() || only.iter().any(|k| k == a.key()))
            .flat_map(|a| a.run(merge))
            .collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_contains_both_built_in_analyses() {
        let registry = Registry::with_defaults();
        let keys: Vec<_> = registry.keys().collect();
        assert!(keys.contains(&"dependence"));
        assert!(keys.contains(&"reference"));
    }

    #[test]
    fn get_returns_none_for_unknown_key() {
        let registry = Registry::with_defaults();
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn disabling_an_analysis_removes_it_from_lookup_and_records_the_reason() {
        let mut registry = Registry::with_defaults();
        registry.disable("reference", "requires a three-way ancestor");

        assert!(registry.get("reference").is_none());
        assert!(!registry.keys().any(|k| k == "reference"));
        let disabled: Vec<_> = registry.disabled().collect();
        assert_eq!(disabled, vec![&("reference", "requires a three-way ancestor".to_string())]);
    }
}
