//! Assembles [`crate::analysis::AnalysisResult`]s into a human-facing report: grouped
//! metrics per conflict tag, and the conflicts themselves ranked by severity.

use crate::analysis::{AnalysisResult, Tag};

/// Controls how a [`Report`] renders conflict locations. Kept as a small plain struct
/// with a `Default` impl, following the teacher's settings shape, since persisted
/// configuration is explicitly out of scope here: this only ever lives for the
/// lifetime of one CLI invocation.
#[derive(Debug, Clone, Copy)]
pub struct ReportSettings {
    /// Merge each side's overlapping/adjacent node ranges into a minimal span set.
    /// When false, every node's exact range is reported separately.
    pub loose_locations: bool,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            loose_locations: true,
        }
    }
}

/// A single reported value with low/high thresholds used to color terminal output.
#[derive(Debug, Clone)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    pub low: f64,
    pub high: f64,
}

impl Metric {
    pub fn is_low(&self) -> bool {
        self.value <= self.low
    }

    pub fn is_high(&self) -> bool {
        self.value >= self.high
    }

    pub fn is_mid(&self) -> bool {
        !self.is_low() && !self.is_high()
    }
}

/// Per-[`Tag`] rollup: how many conflicts of this kind were found, and their severity
/// spread.
#[derive(Debug, Clone)]
pub struct TagMetrics {
    pub tag: Tag,
    pub count: Metric,
    pub max_severity: Metric,
    pub avg_severity: Metric,
}

/// A finished analysis report: the conflicts found, grouped into per-tag metrics and
/// ranked for display.
pub struct Report {
    results: Vec<AnalysisResult>,
}

impl Report {
    pub fn new(results: Vec<AnalysisResult>) -> Self {
        Self { results }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Metrics for each tag present in the results, sorted by tag name.
    pub fn metrics(&self) -> Vec<TagMetrics> {
        let mut tags: Vec<Tag> = self.results.iter().map(|r| r.tag).collect();
        tags.sort_by_key(|t| t.name());
        tags.dedup();

        tags.into_iter()
            .map(|tag| {
                let severities: Vec<f64> = self
                    .results
                    .iter()
                    .filter(|r| r.tag == tag)
                    .map(|r| r.severity)
                    .collect();
                let count = severities.len();
                let max_severity = severities.iter().cloned().fold(f64::MIN, f64::max);
                let avg_severity = severities.iter().sum::<f64>() / count as f64;

                TagMetrics {
                    tag,
                    count: Metric {
                        name: format!("{} count", tag.name()),
                        value: count as f64,
                        low: 1.0,
                        high: 5.0,
                    },
                    max_severity: Metric {
                        name: format!("{} max severity", tag.name()),
                        value: max_severity,
                        low: 0.5,
                        high: 1.5,
                    },
                    avg_severity: Metric {
                        name: format!("{} avg severity", tag.name()),
                        value: avg_severity,
                        low: 0.5,
                        high: 1.5,
                    },
                }
            })
            .collect()
    }

    /// The conflicts found, ranked with the most severe first.
    pub fn conflicts(&self) -> Vec<&AnalysisResult> {
        let mut conflicts: Vec<&AnalysisResult> = self.results.iter().collect();
        conflicts.sort_by(|a, b| b.severity.partial_cmp(&a.severity).unwrap_or(std::cmp::Ordering::Equal));
        conflicts
    }
}
