//! Text summary builders for CLI output.
//!
//! This module formats human-readable lines for text mode; rendering and
//! routing to stdout/stderr stay in the CLI layer.

use crate::engine::BatchOutcome;
use crate::model::AnalysisRecord;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a text summary for a single completed analysis.
pub(crate) fn build_analysis_summary(record: &AnalysisRecord) -> TextSummary {
    let mut lines = Vec::new();

    lines.push(format!("Variant: {}", record.variant));
    if let Some(summary) = &record.summary {
        lines.push(format!(
            "Impact: {} (confidence {:.2})",
            summary.impact_level, summary.confidence
        ));
        if !summary.top_effect.is_empty() {
            lines.push(format!("Top effect: {}", summary.top_effect));
        }
        if !summary.affected_genes.is_empty() {
            lines.push(format!(
                "Affected genes: {}",
                summary.affected_genes.join(", ")
            ));
        }
    }

    if !record.scores.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "{:<16} {:<16} {:>9} {:>9}  {}",
            "GENE", "TISSUE", "RAW", "QUANTILE", "INTERPRETATION"
        ));
        for s in &record.scores {
            lines.push(format!(
                "{:<16} {:<16} {:>9.4} {:>9.4}  {}",
                s.gene_name, s.tissue, s.raw_score, s.quantile_score, s.interpretation
            ));
        }
    }

    lines.push(String::new());
    lines.push(format!("Completed in {} ms", record.duration_ms));

    TextSummary { lines }
}

/// Build a text summary for a batch run: one line per variant plus totals.
pub(crate) fn build_batch_summary(outcome: &BatchOutcome) -> TextSummary {
    let mut lines = Vec::new();

    for item in &outcome.items {
        match (&item.record, &item.error) {
            (Some(record), _) => {
                let impact = record
                    .summary
                    .as_ref()
                    .map(|s| s.impact_level.as_str())
                    .unwrap_or("-");
                lines.push(format!("ok      {:<28} impact={}", item.variant, impact));
            }
            (None, Some(error)) => {
                lines.push(format!("failed  {:<28} {}", item.variant, error));
            }
            (None, None) => {
                lines.push(format!("failed  {:<28} unknown error", item.variant));
            }
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Batch: {} total, {} succeeded, {} failed",
        outcome.total, outcome.succeeded, outcome.failed
    ));

    TextSummary { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BatchItem;
    use crate::model::{GeneScore, VariantSummary};

    fn record() -> AnalysisRecord {
        AnalysisRecord {
            id: "abc".to_string(),
            timestamp_utc: "2026-01-01T00:00:00Z".to_string(),
            tool: "variant-analyzer".to_string(),
            variant: "chr22:36201698:A>C".to_string(),
            request_params: serde_json::Value::Null,
            summary: Some(VariantSummary {
                variant: "chr22:36201698:A>C".to_string(),
                impact_level: "HIGH".to_string(),
                affected_genes: vec!["TP53".to_string()],
                top_effect: "Strong decrease in TP53 (UBERON:0001157)".to_string(),
                confidence: 0.85,
            }),
            scores: vec![GeneScore {
                gene_id: "ENSG00000141510".to_string(),
                gene_name: "TP53".to_string(),
                strand: "-".to_string(),
                raw_score: -0.9,
                quantile_score: 0.97,
                tissue: "UBERON:0001157".to_string(),
                interpretation: "Strong decrease".to_string(),
            }],
            duration_ms: 1200,
        }
    }

    #[test]
    fn analysis_summary_lists_impact_and_scores() {
        let summary = build_analysis_summary(&record());
        let text = summary.lines.join("\n");
        assert!(text.contains("Variant: chr22:36201698:A>C"));
        assert!(text.contains("Impact: HIGH (confidence 0.85)"));
        assert!(text.contains("TP53"));
        assert!(text.contains("Completed in 1200 ms"));
    }

    #[test]
    fn batch_summary_counts_successes_and_failures() {
        let outcome = BatchOutcome {
            total: 2,
            succeeded: 1,
            failed: 1,
            items: vec![
                BatchItem {
                    variant: "chr22:36201698:A>C".to_string(),
                    record: Some(record()),
                    error: None,
                },
                BatchItem {
                    variant: "chr1:100:A>T".to_string(),
                    record: None,
                    error: Some("rate limited".to_string()),
                },
            ],
        };
        let summary = build_batch_summary(&outcome);
        let text = summary.lines.join("\n");
        assert!(text.contains("ok      chr22:36201698:A>C"));
        assert!(text.contains("failed  chr1:100:A>T"));
        assert!(text.contains("rate limited"));
        assert!(text.contains("Batch: 2 total, 1 succeeded, 1 failed"));
    }
}
