//! Local persistence: analysis history, client preferences, and exports.
//!
//! History lives in one JSON document under the platform data directory,
//! newest first, capped at [`HISTORY_LIMIT`]. Preferences (API key,
//! favorites, recently used tools) sit on an injectable [`KvStore`] so tests
//! run against an in-memory implementation instead of the user's config file.

use crate::model::AnalysisRecord;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const HISTORY_LIMIT: usize = 50;
pub const RECENT_TOOLS_LIMIT: usize = 5;

const APP_DIR: &str = "alphagenome-cli";
const KEY_API_KEY: &str = "api-key";
const KEY_FAVORITES: &str = "favorites";
const KEY_RECENT_TOOLS: &str = "recent-tools";

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "now".into())
}

// ---------------------------------------------------------------------------
// History

pub fn history_path() -> Result<PathBuf> {
    let dir = dirs::data_dir()
        .context("could not determine the platform data directory")?
        .join(APP_DIR);
    Ok(dir.join("history.json"))
}

pub fn load_history() -> Result<Vec<AnalysisRecord>> {
    load_history_from(&history_path()?)
}

/// Most recent `n` analyses, newest first.
pub fn load_recent(n: usize) -> Result<Vec<AnalysisRecord>> {
    let mut history = load_history()?;
    history.truncate(n);
    Ok(history)
}

/// Prepend a record to history and persist, dropping anything past the cap.
pub fn save_analysis(record: &AnalysisRecord) -> Result<PathBuf> {
    let path = history_path()?;
    save_analysis_to(&path, record)?;
    Ok(path)
}

pub fn clear_history() -> Result<()> {
    let path = history_path()?;
    if path.exists() {
        fs::remove_file(&path)
            .with_context(|| format!("failed to remove {}", path.display()))?;
    }
    Ok(())
}

fn load_history_from(path: &Path) -> Result<Vec<AnalysisRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let records = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse history at {}", path.display()))?;
    Ok(records)
}

fn save_analysis_to(path: &Path, record: &AnalysisRecord) -> Result<()> {
    let mut history = load_history_from(path)?;
    history.insert(0, record.clone());
    history.truncate(HISTORY_LIMIT);
    write_json(path, &history)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let out = serde_json::to_string_pretty(value)?;
    fs::write(path, out).with_context(|| format!("failed to write {}", path.display()))?;
    debug!(path = %path.display(), "wrote json document");
    Ok(())
}

// ---------------------------------------------------------------------------
// Key-value preferences

pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Single-document JSON store under the platform config directory.
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .context("could not determine the platform config directory")?
            .join(APP_DIR);
        Ok(dir.join("config.json"))
    }

    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    pub fn open(path: PathBuf) -> Result<Self> {
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse config at {}", path.display()))?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    fn persist(&self) -> Result<()> {
        write_json(&self.path, &self.entries)
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.persist()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }
}

/// In-memory store used for tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// API key, favorites, and recently used tools over any [`KvStore`].
pub struct Preferences<S: KvStore> {
    store: S,
}

impl<S: KvStore> Preferences<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn api_key(&self) -> Result<Option<String>> {
        Ok(self.store.get(KEY_API_KEY)?.filter(|k| !k.is_empty()))
    }

    pub fn set_api_key(&mut self, key: &str) -> Result<()> {
        self.store.set(KEY_API_KEY, key)
    }

    pub fn clear_api_key(&mut self) -> Result<()> {
        self.store.remove(KEY_API_KEY)
    }

    pub fn favorites(&self) -> Result<Vec<String>> {
        self.string_list(KEY_FAVORITES)
    }

    pub fn is_favorite(&self, slug: &str) -> Result<bool> {
        Ok(self.favorites()?.iter().any(|f| f == slug))
    }

    /// Toggle a favorite; returns whether the tool is a favorite afterwards.
    pub fn toggle_favorite(&mut self, slug: &str) -> Result<bool> {
        let mut favorites = self.favorites()?;
        let now_favorite = if let Some(pos) = favorites.iter().position(|f| f == slug) {
            favorites.remove(pos);
            false
        } else {
            favorites.push(slug.to_string());
            true
        };
        self.set_string_list(KEY_FAVORITES, &favorites)?;
        Ok(now_favorite)
    }

    pub fn recent_tools(&self) -> Result<Vec<String>> {
        self.string_list(KEY_RECENT_TOOLS)
    }

    /// Move a tool to the front of the recent list, deduplicated and capped.
    pub fn record_recent_tool(&mut self, slug: &str) -> Result<()> {
        let mut recent = self.recent_tools()?;
        recent.retain(|r| r != slug);
        recent.insert(0, slug.to_string());
        recent.truncate(RECENT_TOOLS_LIMIT);
        self.set_string_list(KEY_RECENT_TOOLS, &recent)
    }

    fn string_list(&self, key: &str) -> Result<Vec<String>> {
        match self.store.get(key)? {
            Some(raw) => {
                serde_json::from_str(&raw).with_context(|| format!("corrupt {key} entry"))
            }
            None => Ok(Vec::new()),
        }
    }

    fn set_string_list(&mut self, key: &str, values: &[String]) -> Result<()> {
        self.store.set(key, &serde_json::to_string(values)?)
    }
}

// ---------------------------------------------------------------------------
// Exports

pub fn export_json(path: &Path, record: &AnalysisRecord) -> Result<()> {
    let export = serde_json::json!({
        "export_metadata": {
            "format": "json",
            "generated_at": now_rfc3339(),
            "tool": "AlphaGenome Explorer",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "result": record,
    });
    write_json(path, &export)
}

/// Export any serializable document (e.g. a batch outcome) as pretty JSON.
pub fn export_json_document<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    write_json(path, value)
}

pub fn export_csv(path: &Path, record: &AnalysisRecord) -> Result<()> {
    write_text(path, &render_delimited(record, ','))
}

pub fn export_tsv(path: &Path, record: &AnalysisRecord) -> Result<()> {
    write_text(path, &render_delimited(record, '\t'))
}

pub fn export_markdown(path: &Path, record: &AnalysisRecord) -> Result<()> {
    write_text(path, &render_markdown(record))
}

fn write_text(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

const SCORE_COLUMNS: &str = "gene_id,gene_name,strand,tissue,raw_score,quantile_score,interpretation";

/// Scores table with commented header lines, for CSV/TSV exports.
pub fn render_delimited(record: &AnalysisRecord, sep: char) -> String {
    let mut lines = Vec::new();
    lines.push("# AlphaGenome Explorer Export".to_string());
    lines.push(format!("# Generated: {}", now_rfc3339()));
    lines.push(format!("# Variant: {}", record.variant));
    if let Some(summary) = &record.summary {
        lines.push(format!("# Impact: {}", summary.impact_level));
    }
    lines.push(String::new());

    lines.push(SCORE_COLUMNS.replace(',', &sep.to_string()));
    for s in &record.scores {
        let row = [
            s.gene_id.clone(),
            s.gene_name.clone(),
            s.strand.clone(),
            s.tissue.clone(),
            s.raw_score.to_string(),
            s.quantile_score.to_string(),
            s.interpretation.clone(),
        ];
        lines.push(row.join(&sep.to_string()));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Markdown report: summary section followed by the scores table.
pub fn render_markdown(record: &AnalysisRecord) -> String {
    let mut lines = Vec::new();
    lines.push("# AlphaGenome Explorer Result".to_string());
    lines.push(String::new());
    lines.push(format!("**Variant**: `{}`", record.variant));
    lines.push(format!("**Analyzed**: {}", record.timestamp_utc));
    if let Some(summary) = &record.summary {
        lines.push(format!("**Impact**: {}", summary.impact_level));
        if !summary.top_effect.is_empty() {
            lines.push(format!("**Top effect**: {}", summary.top_effect));
        }
        if !summary.affected_genes.is_empty() {
            lines.push(format!(
                "**Affected genes**: {}",
                summary.affected_genes.join(", ")
            ));
        }
    }
    lines.push(String::new());
    lines.push("| Gene | Tissue | Raw | Quantile | Interpretation |".to_string());
    lines.push("|------|--------|-----|----------|----------------|".to_string());
    for s in &record.scores {
        lines.push(format!(
            "| {} | {} | {:.4} | {:.4} | {} |",
            s.gene_name, s.tissue, s.raw_score, s.quantile_score, s.interpretation
        ));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GeneScore, PredictRequest, Variant, VariantSummary};

    fn record(id: &str) -> AnalysisRecord {
        let variant = Variant::parse("chr22:36201698:A>C").unwrap();
        let request = PredictRequest::new(variant.clone());
        AnalysisRecord {
            id: id.to_string(),
            timestamp_utc: "2026-01-01T00:00:00Z".to_string(),
            tool: "variant-analyzer".to_string(),
            variant: variant.to_string(),
            request_params: serde_json::to_value(&request).unwrap(),
            summary: Some(VariantSummary {
                variant: variant.to_string(),
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
    fn history_prepends_and_caps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        for i in 0..(HISTORY_LIMIT + 5) {
            save_analysis_to(&path, &record(&format!("id-{i}"))).unwrap();
        }

        let history = load_history_from(&path).unwrap();
        assert_eq!(history.len(), HISTORY_LIMIT);
        // Newest first.
        assert_eq!(history[0].id, format!("id-{}", HISTORY_LIMIT + 4));
        assert_eq!(history[1].id, format!("id-{}", HISTORY_LIMIT + 3));
    }

    #[test]
    fn missing_history_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let history = load_history_from(&dir.path().join("none.json")).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut store = FileStore::open(path.clone()).unwrap();
        store.set("api-key", "secret").unwrap();
        store.set("other", "value").unwrap();
        store.remove("other").unwrap();

        let reopened = FileStore::open(path).unwrap();
        assert_eq!(reopened.get("api-key").unwrap().as_deref(), Some("secret"));
        assert_eq!(reopened.get("other").unwrap(), None);
    }

    #[test]
    fn preferences_api_key_lifecycle() {
        let mut prefs = Preferences::new(MemoryStore::default());
        assert_eq!(prefs.api_key().unwrap(), None);
        prefs.set_api_key("abc123").unwrap();
        assert_eq!(prefs.api_key().unwrap().as_deref(), Some("abc123"));
        prefs.clear_api_key().unwrap();
        assert_eq!(prefs.api_key().unwrap(), None);
    }

    #[test]
    fn favorites_toggle_round_trips() {
        let mut prefs = Preferences::new(MemoryStore::default());
        assert!(prefs.toggle_favorite("genetic-diet").unwrap());
        assert!(prefs.is_favorite("genetic-diet").unwrap());
        assert!(prefs.toggle_favorite("crispr-simulator").unwrap());
        assert_eq!(prefs.favorites().unwrap().len(), 2);
        assert!(!prefs.toggle_favorite("genetic-diet").unwrap());
        assert!(!prefs.is_favorite("genetic-diet").unwrap());
    }

    #[test]
    fn recent_tools_move_to_front_and_cap() {
        let mut prefs = Preferences::new(MemoryStore::default());
        for slug in ["a", "b", "c", "d", "e", "f"] {
            prefs.record_recent_tool(slug).unwrap();
        }
        let recent = prefs.recent_tools().unwrap();
        assert_eq!(recent, vec!["f", "e", "d", "c", "b"]);

        prefs.record_recent_tool("d").unwrap();
        let recent = prefs.recent_tools().unwrap();
        assert_eq!(recent, vec!["d", "f", "e", "c", "b"]);
        assert_eq!(recent.len(), RECENT_TOOLS_LIMIT);
    }

    #[test]
    fn delimited_export_contains_header_and_rows() {
        let rec = record("x");
        let csv = render_delimited(&rec, ',');
        assert!(csv.contains("# AlphaGenome Explorer Export"));
        assert!(csv.contains(SCORE_COLUMNS));
        assert!(csv.contains("TP53"));
        assert_eq!(csv.matches("Strong decrease").count(), 1);

        let tsv = render_delimited(&rec, '\t');
        assert!(tsv.contains("gene_id\tgene_name"));
        assert!(tsv.contains("TP53\t-\t"));
    }

    #[test]
    fn markdown_export_contains_summary_and_table() {
        let md = render_markdown(&record("x"));
        assert!(md.contains("**Variant**: `chr22:36201698:A>C`"));
        assert!(md.contains("**Impact**: HIGH"));
        assert!(md.contains("| TP53 |"));
    }

    #[test]
    fn json_export_carries_metadata_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        export_json(&path, &record("x")).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value["export_metadata"]["tool"],
            serde_json::json!("AlphaGenome Explorer")
        );
        assert_eq!(value["result"]["id"], serde_json::json!("x"));
    }
}
