use crate::model::{GeneScore, VariantSummary};
use std::cmp::Ordering;

/// Model confidence reported with derived summaries.
const SUMMARY_CONFIDENCE: f64 = 0.85;

/// Human-readable interpretation of a single gene score
pub fn interpret_score(raw_score: f64, quantile: f64) -> String {
    if raw_score.abs() < 0.01 {
        return "No significant effect".to_string();
    }

    let direction = if raw_score > 0.0 { "increase" } else { "decrease" };

    let strength = if quantile > 0.95 {
        "Strong"
    } else if quantile > 0.80 {
        "Moderate"
    } else if quantile > 0.60 {
        "Weak"
    } else {
        "Minimal"
    };

    format!("{strength} {direction}")
}

/// Overall impact level across all scores, on the same quantile cuts the
/// per-score interpretation uses
pub fn impact_level(scores: &[GeneScore]) -> &'static str {
    let max_quantile = scores
        .iter()
        .map(|s| s.quantile_score)
        .fold(f64::NEG_INFINITY, f64::max);

    if scores.is_empty() {
        "MODIFIER"
    } else if max_quantile > 0.95 {
        "HIGH"
    } else if max_quantile > 0.80 {
        "MODERATE"
    } else if max_quantile > 0.60 {
        "LOW"
    } else {
        "MODIFIER"
    }
}

/// Fill in missing per-score interpretations in place.
pub fn annotate_scores(scores: &mut [GeneScore]) {
    for s in scores {
        if s.interpretation.is_empty() {
            s.interpretation = interpret_score(s.raw_score, s.quantile_score);
        }
    }
}

fn top_score(scores: &[GeneScore]) -> Option<&GeneScore> {
    scores.iter().max_by(|a, b| {
        a.raw_score
            .abs()
            .partial_cmp(&b.raw_score.abs())
            .unwrap_or(Ordering::Equal)
    })
}

/// Derive a summary from raw scores when the service response omits one.
pub fn derive_summary(variant: &str, scores: &[GeneScore]) -> VariantSummary {
    // Genes behind the leading scores, first occurrence wins.
    let mut affected_genes: Vec<String> = Vec::new();
    for s in scores.iter().take(5) {
        if !s.gene_name.is_empty() && !affected_genes.contains(&s.gene_name) {
            affected_genes.push(s.gene_name.clone());
        }
    }

    let top_effect = match top_score(scores) {
        Some(top) => {
            let interp = if top.interpretation.is_empty() {
                interpret_score(top.raw_score, top.quantile_score)
            } else {
                top.interpretation.clone()
            };
            format!("{} in {} ({})", interp, top.gene_name, top.tissue)
        }
        None => String::new(),
    };

    VariantSummary {
        variant: variant.to_string(),
        impact_level: impact_level(scores).to_string(),
        affected_genes,
        top_effect,
        confidence: SUMMARY_CONFIDENCE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(gene: &str, raw: f64, quantile: f64) -> GeneScore {
        GeneScore {
            gene_id: format!("ENSG_{gene}"),
            gene_name: gene.to_string(),
            strand: "+".to_string(),
            raw_score: raw,
            quantile_score: quantile,
            tissue: "UBERON:0001157".to_string(),
            interpretation: String::new(),
        }
    }

    #[test]
    fn negligible_raw_scores_have_no_effect() {
        assert_eq!(interpret_score(0.009, 0.99), "No significant effect");
        assert_eq!(interpret_score(-0.0005, 0.99), "No significant effect");
    }

    #[test]
    fn interpretation_strength_and_direction() {
        assert_eq!(interpret_score(0.5, 0.96), "Strong increase");
        assert_eq!(interpret_score(-0.5, 0.96), "Strong decrease");
        assert_eq!(interpret_score(0.5, 0.85), "Moderate increase");
        assert_eq!(interpret_score(0.5, 0.70), "Weak increase");
        assert_eq!(interpret_score(0.5, 0.10), "Minimal increase");
    }

    #[test]
    fn impact_level_follows_max_quantile() {
        assert_eq!(impact_level(&[]), "MODIFIER");
        assert_eq!(impact_level(&[score("A", 0.2, 0.50)]), "MODIFIER");
        assert_eq!(impact_level(&[score("A", 0.2, 0.65)]), "LOW");
        assert_eq!(
            impact_level(&[score("A", 0.2, 0.65), score("B", 0.1, 0.90)]),
            "MODERATE"
        );
        assert_eq!(impact_level(&[score("A", 0.2, 0.96)]), "HIGH");
    }

    #[test]
    fn annotate_fills_only_missing_interpretations() {
        let mut scores = vec![score("A", 0.5, 0.96), score("B", -0.2, 0.7)];
        scores[0].interpretation = "preset".to_string();
        annotate_scores(&mut scores);
        assert_eq!(scores[0].interpretation, "preset");
        assert_eq!(scores[1].interpretation, "Weak decrease");
    }

    #[test]
    fn summary_picks_largest_absolute_effect() {
        let scores = vec![
            score("AURKA", 0.3, 0.7),
            score("TP53", -0.9, 0.97),
            score("AURKA", 0.1, 0.2),
        ];
        let summary = derive_summary("chr22:36201698:A>C", &scores);
        assert_eq!(summary.impact_level, "HIGH");
        assert_eq!(
            summary.top_effect,
            "Strong decrease in TP53 (UBERON:0001157)"
        );
        assert_eq!(summary.affected_genes, vec!["AURKA", "TP53"]);
        assert_eq!(summary.variant, "chr22:36201698:A>C");
    }

    #[test]
    fn summary_of_no_scores_is_a_modifier() {
        let summary = derive_summary("chr1:1:A>C", &[]);
        assert_eq!(summary.impact_level, "MODIFIER");
        assert!(summary.top_effect.is_empty());
        assert!(summary.affected_genes.is_empty());
    }
}
