//! Analysis pipeline over the prediction API.
//!
//! The engine owns one prediction at a time: validate the request, call the
//! service, derive whatever the response left out, and stamp a persistable
//! record. Stage events go out over an mpsc channel for presentation layers;
//! progress goes through the runner handle so hosts read a single surface.

mod alphagenome;

pub use alphagenome::{AlphaGenomeClient, ApiError, HealthStatus};

use crate::interpret;
use crate::model::{
    AnalysisRecord, GeneScore, Notice, PredictRequest, ScoreRequest, Stage, ToolEvent,
    VariantSummary,
};
use crate::registry::ToolId;
use crate::runner::ToolRunner;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

/// Outcome of one batch entry; failures stay in place so a bad variant never
/// aborts the rest of the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    pub variant: String,
    pub record: Option<AnalysisRecord>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub items: Vec<BatchItem>,
}

pub struct AnalysisEngine {
    client: AlphaGenomeClient,
    event_tx: Option<UnboundedSender<ToolEvent>>,
}

impl AnalysisEngine {
    pub fn new(client: AlphaGenomeClient, event_tx: Option<UnboundedSender<ToolEvent>>) -> Self {
        Self { client, event_tx }
    }

    /// Predict the effect of a single variant, reporting stage progress
    /// through `runner`.
    pub async fn predict_variant(
        &self,
        request: &PredictRequest,
        runner: &ToolRunner<AnalysisRecord>,
    ) -> Result<AnalysisRecord, ApiError> {
        let started = Instant::now();

        self.stage(Stage::Validate);
        request.validate()?;
        runner.set_progress(10);

        self.stage(Stage::Predict);
        info!(variant = %request.variant, "predicting variant");
        let result = self.client.predict_variant(request).await?;
        runner.set_progress(80);

        self.stage(Stage::Summarize);
        let record = build_record(
            ToolId::VariantAnalyzer,
            &request.variant.to_string(),
            serde_json::to_value(request).unwrap_or(serde_json::Value::Null),
            result.summary,
            result.scores,
            started,
        );
        runner.set_progress(95);
        Ok(record)
    }

    /// Score a single variant with the selected scorers.
    pub async fn score_variant(
        &self,
        request: &ScoreRequest,
        runner: &ToolRunner<AnalysisRecord>,
    ) -> Result<AnalysisRecord, ApiError> {
        let started = Instant::now();

        self.stage(Stage::Validate);
        request.validate()?;
        runner.set_progress(10);

        self.stage(Stage::Predict);
        info!(variant = %request.variant, "scoring variant");
        let result = self.client.score_variant(request).await?;
        runner.set_progress(80);

        self.stage(Stage::Summarize);
        let record = build_record(
            ToolId::VariantAnalyzer,
            &request.variant.to_string(),
            serde_json::to_value(request).unwrap_or(serde_json::Value::Null),
            None,
            result.scores,
            started,
        );
        runner.set_progress(95);
        Ok(record)
    }

    /// Analyze a list of requests strictly one at a time, mapping overall
    /// progress onto completed items. Individual failures are collected, not
    /// propagated.
    pub async fn run_batch(
        &self,
        requests: &[PredictRequest],
        runner: &ToolRunner<BatchOutcome>,
    ) -> Result<BatchOutcome, ApiError> {
        let total = requests.len();
        let mut items = Vec::with_capacity(total);
        let mut succeeded = 0usize;

        for (i, request) in requests.iter().enumerate() {
            let variant = request.variant.to_string();
            self.notice(Notice::Info(format!("[{}/{}] {}", i + 1, total, variant)));

            let item = match self.predict_once(request).await {
                Ok(record) => {
                    succeeded += 1;
                    BatchItem {
                        variant,
                        record: Some(record),
                        error: None,
                    }
                }
                Err(e) => BatchItem {
                    variant,
                    record: None,
                    error: Some(e.to_string()),
                },
            };
            items.push(item);

            if total > 0 {
                runner.set_progress((((i + 1) * 100) / total) as u8);
            }
        }

        Ok(BatchOutcome {
            total,
            succeeded,
            failed: total - succeeded,
            items,
        })
    }

    async fn predict_once(&self, request: &PredictRequest) -> Result<AnalysisRecord, ApiError> {
        let started = Instant::now();
        request.validate()?;
        let result = self.client.predict_variant(request).await?;
        Ok(build_record(
            ToolId::BatchAnalyzer,
            &request.variant.to_string(),
            serde_json::to_value(request).unwrap_or(serde_json::Value::Null),
            result.summary,
            result.scores,
            started,
        ))
    }

    fn stage(&self, stage: Stage) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(ToolEvent::StageStarted { stage });
        }
    }

    fn notice(&self, notice: Notice) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(ToolEvent::Notice(notice));
        }
    }
}

/// Generate a random identifier for an analysis record.
fn gen_analysis_id() -> String {
    let mut b = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut b);
    format!("{:016x}", u64::from_le_bytes(b))
}

fn build_record(
    tool: ToolId,
    variant: &str,
    request_params: serde_json::Value,
    summary: Option<VariantSummary>,
    mut scores: Vec<GeneScore>,
    started: Instant,
) -> AnalysisRecord {
    interpret::annotate_scores(&mut scores);
    let summary = summary.unwrap_or_else(|| interpret::derive_summary(variant, &scores));

    AnalysisRecord {
        id: gen_analysis_id(),
        timestamp_utc: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "now".into()),
        tool: tool.slug().to_string(),
        variant: variant.to_string(),
        request_params,
        summary: Some(summary),
        scores,
        duration_ms: started.elapsed().as_millis() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Variant;

    fn score(gene: &str, raw: f64, quantile: f64) -> GeneScore {
        GeneScore {
            gene_id: format!("ENSG_{gene}"),
            gene_name: gene.to_string(),
            strand: "+".to_string(),
            raw_score: raw,
            quantile_score: quantile,
            tissue: "UBERON:0000955".to_string(),
            interpretation: String::new(),
        }
    }

    #[test]
    fn record_derives_summary_when_service_omits_it() {
        let req = PredictRequest::new(Variant::parse("chr22:36201698:A>C").unwrap());
        let record = build_record(
            ToolId::VariantAnalyzer,
            &req.variant.to_string(),
            serde_json::to_value(&req).unwrap(),
            None,
            vec![score("TP53", -0.9, 0.97)],
            Instant::now(),
        );
        assert_eq!(record.tool, "variant-analyzer");
        assert_eq!(record.variant, "chr22:36201698:A>C");
        let summary = record.summary.expect("summary derived");
        assert_eq!(summary.impact_level, "HIGH");
        assert_eq!(record.scores[0].interpretation, "Strong decrease");
        assert!(!record.id.is_empty());
        assert!(!record.timestamp_utc.is_empty());
    }

    #[test]
    fn record_keeps_the_service_summary_when_present() {
        let provided = VariantSummary {
            variant: "chr1:5:A>C".to_string(),
            impact_level: "LOW".to_string(),
            affected_genes: vec!["GENE1".to_string()],
            top_effect: "Weak increase in GENE1".to_string(),
            confidence: 0.5,
        };
        let record = build_record(
            ToolId::BatchAnalyzer,
            "chr1:5:A>C",
            serde_json::Value::Null,
            Some(provided.clone()),
            vec![score("GENE1", 0.9, 0.99)],
            Instant::now(),
        );
        let summary = record.summary.expect("summary kept");
        assert_eq!(summary.impact_level, provided.impact_level);
        assert_eq!(summary.confidence, provided.confidence);
    }

    #[test]
    fn analysis_ids_are_unique_enough() {
        let a = gen_analysis_id();
        let b = gen_analysis_id();
        assert_eq!(a.len(), 16);
        assert_ne!(a, b);
    }
}
