use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Shared configuration for the API client, built once per invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub user_agent: String,
}

/// Well-known tissue/cell-line ontology terms offered as defaults.
pub const COMMON_TISSUES: &[(&str, &str)] = &[
    ("UBERON:0000955", "Brain"),
    ("UBERON:0000948", "Heart"),
    ("UBERON:0002107", "Liver"),
    ("UBERON:0002048", "Lung"),
    ("UBERON:0002113", "Kidney"),
    ("UBERON:0001157", "Colon (Transverse)"),
    ("UBERON:0000178", "Blood"),
    ("UBERON:0002097", "Skin"),
    ("EFO:0002067", "K562 (Leukemia)"),
    ("EFO:0001187", "HepG2 (Liver Cancer)"),
];

pub const DEFAULT_TISSUE: &str = "UBERON:0001157";

#[derive(Debug, Error)]
pub enum VariantParseError {
    #[error("invalid variant notation: {0} (expected chr22:36201698:A>C)")]
    Notation(String),
    #[error("invalid chromosome: {0}")]
    Chromosome(String),
    #[error("invalid position: {0}")]
    Position(String),
    #[error("invalid bases: {0} (allowed: A, C, G, T, N)")]
    Bases(String),
}

/// A genomic point change in `chromosome:position:ref>alt` notation.
///
/// Parsing normalizes case (`CHRx:10:a>c` becomes `chrX:10:A>C`) and rejects
/// anything outside `chr[0-9XY]+`, decimal positions, and `ACGTN` bases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Variant {
    pub chromosome: String,
    pub position: u64,
    pub reference: String,
    pub alternate: String,
}

impl Variant {
    pub fn parse(s: &str) -> Result<Self, VariantParseError> {
        let s = s.trim();
        let mut parts = s.split(':');
        let (chrom, pos, change) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(c), Some(p), Some(ch), None) => (c, p, ch),
            _ => return Err(VariantParseError::Notation(s.to_string())),
        };

        let chromosome = parse_chromosome(chrom)
            .ok_or_else(|| VariantParseError::Chromosome(chrom.to_string()))?;

        let position: u64 = pos
            .parse()
            .map_err(|_| VariantParseError::Position(pos.to_string()))?;

        let (reference, alternate) = match change.split_once('>') {
            Some((r, a)) => (r, a),
            None => return Err(VariantParseError::Notation(s.to_string())),
        };
        let reference =
            parse_bases(reference).ok_or_else(|| VariantParseError::Bases(reference.to_string()))?;
        let alternate =
            parse_bases(alternate).ok_or_else(|| VariantParseError::Bases(alternate.to_string()))?;

        Ok(Self {
            chromosome,
            position,
            reference,
            alternate,
        })
    }
}

fn parse_chromosome(s: &str) -> Option<String> {
    let mut chars = s.chars();
    let prefix: String = chars.by_ref().take(3).collect();
    if !prefix.eq_ignore_ascii_case("chr") {
        return None;
    }
    let name: String = chars.collect();
    if name.is_empty() {
        return None;
    }
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c.to_ascii_uppercase() {
            d @ '0'..='9' => out.push(d),
            u @ ('X' | 'Y') => out.push(u),
            _ => return None,
        }
    }
    Some(format!("chr{}", out))
}

fn parse_bases(s: &str) -> Option<String> {
    if s.is_empty() {
        return None;
    }
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c.to_ascii_uppercase() {
            b @ ('A' | 'C' | 'G' | 'T' | 'N') => out.push(b),
            _ => return None,
        }
    }
    Some(out)
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}>{}",
            self.chromosome, self.position, self.reference, self.alternate
        )
    }
}

impl From<Variant> for String {
    fn from(v: Variant) -> Self {
        v.to_string()
    }
}

impl TryFrom<String> for Variant {
    type Error = VariantParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Variant::parse(&s)
    }
}

/// Ontology terms look like `UBERON:0001157`: an upper-case prefix, a colon,
/// and a numeric accession.
pub fn is_valid_ontology_term(term: &str) -> bool {
    let Some((prefix, accession)) = term.split_once(':') else {
        return false;
    };
    !prefix.is_empty()
        && prefix.chars().all(|c| c.is_ascii_uppercase())
        && !accession.is_empty()
        && accession.chars().all(|c| c.is_ascii_digit())
}

/// Shallow email check: one `@`, a dotted domain, no whitespace. The service
/// applies its own validation; this only catches obvious typos locally.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputType {
    Atac,
    Cage,
    Dnase,
    RnaSeq,
    ChipHistone,
    ChipTf,
    SpliceSites,
    SpliceSiteUsage,
    SpliceJunctions,
    ContactMaps,
    Procap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum SequenceLength {
    #[serde(rename = "16KB")]
    #[value(name = "16kb")]
    Kb16,
    #[serde(rename = "100KB")]
    #[value(name = "100kb")]
    Kb100,
    #[serde(rename = "500KB")]
    #[value(name = "500kb")]
    Kb500,
    #[default]
    #[serde(rename = "1MB")]
    #[value(name = "1mb")]
    Mb1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Organism {
    #[default]
    HomoSapiens,
    MusMusculus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScorerType {
    RnaSeq,
    Dnase,
    Atac,
    Splicing,
    ContactMap,
}

pub const MAX_OUTPUTS: usize = 11;
pub const MAX_TISSUES: usize = 20;

#[derive(Debug, Error)]
pub enum RequestValidationError {
    #[error("at least one output type is required")]
    NoOutputs,
    #[error("too many output types: {0} (max 11)")]
    TooManyOutputs(usize),
    #[error("too many tissues: {0} (max 20)")]
    TooManyTissues(usize),
    #[error("invalid ontology term: {0} (expected format like UBERON:0001157)")]
    OntologyTerm(String),
    #[error("at least one scorer is required")]
    NoScorers,
}

/// Request body for `/api/predict/variant`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub variant: Variant,
    pub outputs: Vec<OutputType>,
    pub tissues: Vec<String>,
    pub sequence_length: SequenceLength,
    pub organism: Organism,
}

impl PredictRequest {
    /// Request with the service defaults: RNA-seq over transverse colon, 1MB
    /// of context, human genome.
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            outputs: vec![OutputType::RnaSeq],
            tissues: vec![DEFAULT_TISSUE.to_string()],
            sequence_length: SequenceLength::default(),
            organism: Organism::default(),
        }
    }

    pub fn validate(&self) -> Result<(), RequestValidationError> {
        if self.outputs.is_empty() {
            return Err(RequestValidationError::NoOutputs);
        }
        if self.outputs.len() > MAX_OUTPUTS {
            return Err(RequestValidationError::TooManyOutputs(self.outputs.len()));
        }
        if self.tissues.len() > MAX_TISSUES {
            return Err(RequestValidationError::TooManyTissues(self.tissues.len()));
        }
        for term in &self.tissues {
            if !is_valid_ontology_term(term) {
                return Err(RequestValidationError::OntologyTerm(term.clone()));
            }
        }
        Ok(())
    }
}

/// Request body for `/api/predict/score`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub variant: Variant,
    pub scorers: Vec<ScorerType>,
    pub sequence_length: SequenceLength,
    pub organism: Organism,
}

impl ScoreRequest {
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            scorers: vec![ScorerType::RnaSeq],
            sequence_length: SequenceLength::default(),
            organism: Organism::default(),
        }
    }

    pub fn validate(&self) -> Result<(), RequestValidationError> {
        if self.scorers.is_empty() {
            return Err(RequestValidationError::NoScorers);
        }
        Ok(())
    }
}

/// Per-gene effect score as reported by the prediction service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneScore {
    #[serde(default)]
    pub gene_id: String,
    #[serde(default)]
    pub gene_name: String,
    #[serde(default)]
    pub strand: String,
    pub raw_score: f64,
    pub quantile_score: f64,
    #[serde(default)]
    pub tissue: String,
    #[serde(default)]
    pub interpretation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantSummary {
    pub variant: String,
    pub impact_level: String,
    pub affected_genes: Vec<String>,
    pub top_effect: String,
    pub confidence: f64,
}

/// Payload of a successful variant prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub request_params: serde_json::Value,
    #[serde(default)]
    pub summary: Option<VariantSummary>,
    #[serde(default)]
    pub scores: Vec<GeneScore>,
    #[serde(default)]
    pub tracks: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResult {
    #[serde(default)]
    pub scores: Vec<GeneScore>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OntologyCatalog {
    #[serde(default)]
    pub tissues: Vec<serde_json::Value>,
    #[serde(default)]
    pub cell_lines: Vec<serde_json::Value>,
    #[serde(default)]
    pub output_types: Vec<serde_json::Value>,
}

/// Registered interest in a tool that is not backed by the service yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureRequestBody {
    pub feature_id: String,
    pub feature_name: String,
    pub email: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureRequestAck {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub feature_id: String,
    #[serde(default)]
    pub total_requests: u64,
}

/// Response envelope shared by every API endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: serde::Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub export: Option<serde_json::Value>,
}

/// One completed analysis, as persisted in history and written by exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: String,
    #[serde(default)]
    pub timestamp_utc: String,
    pub tool: String,
    pub variant: String,
    #[serde(default)]
    pub request_params: serde_json::Value,
    pub summary: Option<VariantSummary>,
    pub scores: Vec<GeneScore>,
    #[serde(default)]
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Validate,
    Predict,
    Summarize,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Validate => "Validate",
            Stage::Predict => "Predict",
            Stage::Summarize => "Summarize",
        }
    }
}

/// Events emitted by the engine and runner, consumed by presentation layers.
#[derive(Debug, Clone)]
pub enum ToolEvent {
    StageStarted {
        stage: Stage,
    },
    Progress {
        percent: u8,
    },
    Notice(Notice),
    Completed {
        // Box to keep ToolEvent small; AnalysisRecord carries full score lists.
        record: Box<AnalysisRecord>,
    },
}

/// Transient user-visible notifications, rendered by the host layer.
#[derive(Debug, Clone)]
pub enum Notice {
    Info(String),
    Success(String),
    Error(String),
}

impl Notice {
    /// Render a human-readable message for UI/CLI layers.
    pub fn to_message(&self) -> String {
        match self {
            Notice::Info(msg) | Notice::Success(msg) | Notice::Error(msg) => msg.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_variant() {
        let v = Variant::parse("chr22:36201698:A>C").unwrap();
        assert_eq!(v.chromosome, "chr22");
        assert_eq!(v.position, 36201698);
        assert_eq!(v.reference, "A");
        assert_eq!(v.alternate, "C");
        assert_eq!(v.to_string(), "chr22:36201698:A>C");
    }

    #[test]
    fn parsing_normalizes_case() {
        let v = Variant::parse("CHRx:100:a>ttg").unwrap();
        assert_eq!(v.chromosome, "chrX");
        assert_eq!(v.reference, "A");
        assert_eq!(v.alternate, "TTG");
    }

    #[test]
    fn rejects_malformed_variants() {
        assert!(Variant::parse("22:100:A>C").is_err());
        assert!(Variant::parse("chr22:100").is_err());
        assert!(Variant::parse("chr22:100:A>C:extra").is_err());
        assert!(Variant::parse("chrM:100:A>C").is_err());
        assert!(Variant::parse("chr:100:A>C").is_err());
        assert!(Variant::parse("chr22:abc:A>C").is_err());
        assert!(Variant::parse("chr22:100:A-C").is_err());
        assert!(Variant::parse("chr22:100:Z>C").is_err());
        assert!(Variant::parse("chr22:100:>C").is_err());
    }

    #[test]
    fn variant_serde_round_trip() {
        let v = Variant::parse("chr19:40991281:G>T").unwrap();
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "\"chr19:40991281:G>T\"");
        let back: Variant = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn ontology_term_validation() {
        assert!(is_valid_ontology_term("UBERON:0001157"));
        assert!(is_valid_ontology_term("EFO:0002067"));
        assert!(!is_valid_ontology_term("uberon:0001157"));
        assert!(!is_valid_ontology_term("UBERON"));
        assert!(!is_valid_ontology_term("UBERON:"));
        assert!(!is_valid_ontology_term(":0001157"));
        assert!(!is_valid_ontology_term("UBERON:12a4"));
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
        assert!(!is_valid_email("user"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("user@.com"));
        assert!(!is_valid_email("user@example."));
        assert!(!is_valid_email("us er@example.com"));
        assert!(!is_valid_email("user@@example.com"));
    }

    #[test]
    fn feature_request_uses_camel_case_wire_names() {
        let body = FeatureRequestBody {
            feature_id: "organism-designer".to_string(),
            feature_name: "Organism Designer".to_string(),
            email: "user@example.com".to_string(),
            timestamp: "2026-01-01T00:00:00Z".to_string(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["featureId"], "organism-designer");
        assert_eq!(json["featureName"], "Organism Designer");

        let ack: FeatureRequestAck = serde_json::from_str(
            r#"{"success": true, "message": "Request registered successfully", "featureId": "organism-designer", "totalRequests": 3}"#,
        )
        .unwrap();
        assert!(ack.success);
        assert_eq!(ack.total_requests, 3);
    }

    #[test]
    fn enums_use_service_wire_names() {
        assert_eq!(
            serde_json::to_string(&OutputType::RnaSeq).unwrap(),
            "\"RNA_SEQ\""
        );
        assert_eq!(
            serde_json::to_string(&SequenceLength::Mb1).unwrap(),
            "\"1MB\""
        );
        assert_eq!(
            serde_json::to_string(&Organism::HomoSapiens).unwrap(),
            "\"HOMO_SAPIENS\""
        );
        assert_eq!(
            serde_json::to_string(&ScorerType::ContactMap).unwrap(),
            "\"CONTACT_MAP\""
        );
    }

    #[test]
    fn request_defaults_match_service() {
        let req = PredictRequest::new(Variant::parse("chr22:36201698:A>C").unwrap());
        assert_eq!(req.outputs, vec![OutputType::RnaSeq]);
        assert_eq!(req.tissues, vec![DEFAULT_TISSUE.to_string()]);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn request_validation_limits() {
        let variant = Variant::parse("chr22:36201698:A>C").unwrap();
        let mut req = PredictRequest::new(variant.clone());
        req.outputs.clear();
        assert!(matches!(
            req.validate(),
            Err(RequestValidationError::NoOutputs)
        ));

        let mut req = PredictRequest::new(variant.clone());
        req.tissues = vec!["bad-term".to_string()];
        assert!(matches!(
            req.validate(),
            Err(RequestValidationError::OntologyTerm(_))
        ));

        let mut req = PredictRequest::new(variant);
        req.tissues = vec![DEFAULT_TISSUE.to_string(); MAX_TISSUES + 1];
        assert!(matches!(
            req.validate(),
            Err(RequestValidationError::TooManyTissues(_))
        ));
    }

    #[test]
    fn envelope_tolerates_missing_fields() {
        let env: ApiEnvelope<PredictionResult> =
            serde_json::from_str(r#"{"success": false, "error": "boom"}"#).unwrap();
        assert!(!env.success);
        assert!(env.data.is_none());
        assert_eq!(env.error.as_deref(), Some("boom"));
    }
}
