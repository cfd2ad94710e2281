//! Analysis Models
//!
//! The merged view of one analysis run: structured figures from the summary
//! call plus the narrative text that grows while the stream is open.

use serde::{Deserialize, Serialize};
use suluk_api::types::{AnalysisSummary, ChartPoint, TopItem};

/// What to analyze and how.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Client whose purchase history is analyzed.
    pub subject_id: i64,
    /// Output language ("en", "ar").
    pub language: String,
    /// Narrative model identifier.
    pub model_id: String,
}

impl AnalysisRequest {
    pub fn new(subject_id: i64, language: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            subject_id,
            language: language.into(),
            model_id: model_id.into(),
        }
    }
}

/// Identifies one run. The run id makes a repeated identical request a
/// distinct run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunKey {
    pub run_id: u64,
    pub request: AnalysisRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub client_name: String,
    pub total_spent: f64,
    pub purchase_count: u64,
    /// Appended to while the narrative stream is open.
    pub narrative: String,
    pub chart_series: Vec<ChartPoint>,
    pub top_items: Vec<TopItem>,
}

impl From<AnalysisSummary> for AnalysisResult {
    fn from(summary: AnalysisSummary) -> Self {
        Self {
            client_name: summary.client_name,
            total_spent: summary.total_spent,
            purchase_count: summary.purchase_count,
            narrative: String::new(),
            chart_series: summary.chart_data,
            top_items: summary.top_items,
        }
    }
}

impl AnalysisResult {
    /// Same structured figures, ignoring the narrative.
    pub fn same_figures(&self, other: &AnalysisResult) -> bool {
        self.client_name == other.client_name
            && self.total_spent == other.total_spent
            && self.purchase_count == other.purchase_count
            && self.chart_series == other.chart_series
            && self.top_items == other.top_items
    }
}

/// How the narrative phase of a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum StreamOutcome {
    /// The server closed the stream normally.
    Completed,
    /// The stream could not be opened or broke; the narrative is truncated.
    Failed(String),
    /// A newer run (or an explicit cancel) took over.
    Superseded,
}

/// Latest published state of the active run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisView {
    pub key: RunKey,
    pub result: AnalysisResult,
    /// `None` while the narrative is still streaming.
    pub outcome: Option<StreamOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> AnalysisSummary {
        AnalysisSummary {
            client_name: "Acme".to_string(),
            total_spent: 100.0,
            purchase_count: 3,
            chart_data: vec![ChartPoint {
                date: "2024-01-01".to_string(),
                amount: 100.0,
            }],
            top_items: vec![TopItem {
                name: "Tea".to_string(),
                value: 4.0,
            }],
        }
    }

    #[test]
    fn test_result_from_summary_starts_with_empty_narrative() {
        let result = AnalysisResult::from(summary());
        assert_eq!(result.client_name, "Acme");
        assert!(result.narrative.is_empty());
        assert_eq!(result.chart_series.len(), 1);
    }

    #[test]
    fn test_same_figures_ignores_narrative() {
        let a = AnalysisResult::from(summary());
        let mut b = a.clone();
        b.narrative.push_str("Loyal customer.");
        assert!(a.same_figures(&b));
        b.total_spent = 1.0;
        assert!(!a.same_figures(&b));
    }

    #[test]
    fn test_request_keys_differ_by_run_id() {
        let request = AnalysisRequest::new(1, "en", "m");
        let a = RunKey {
            run_id: 1,
            request: request.clone(),
        };
        let b = RunKey { run_id: 2, request };
        assert_ne!(a, b);
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_string(&StreamOutcome::Failed("reset".to_string())).unwrap();
        assert_eq!(json, r#"{"outcome":"failed","message":"reset"}"#);
    }
}
