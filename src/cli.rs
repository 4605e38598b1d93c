use crate::engine::{AlphaGenomeClient, AnalysisEngine, BatchOutcome};
use crate::model::{
    is_valid_email, AnalysisRecord, ClientConfig, FeatureRequestAck, FeatureRequestBody, Notice,
    OntologyCatalog, Organism, OutputType, PredictRequest, ScoreRequest, ScorerType,
    SequenceLength, ToolEvent, Variant, COMMON_TISSUES, DEFAULT_TISSUE,
};
use crate::registry::{category_counts, ToolCategory, ToolId};
use crate::runner::{RunnerOptions, ToolRunner};
use crate::storage::{self, FileStore, Preferences};
use crate::text_summary;
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "alphagenome-cli",
    version,
    about = "AlphaGenome variant prediction from the command line"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Base URL for the AlphaGenome Explorer backend
    #[arg(long, global = true, default_value = "http://localhost:8000")]
    pub base_url: String,

    /// API key for this invocation (overrides the stored key)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// HTTP request timeout
    #[arg(long, global = true, default_value = "30s")]
    pub timeout: humantime::Duration,

    /// Print JSON result and exit (no progress rendering)
    #[arg(long, global = true)]
    pub json: bool,

    /// Run silently: suppress all output except errors (for cron usage)
    #[arg(long, global = true)]
    pub silent: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Predict the regulatory effect of a single variant
    Analyze(AnalyzeArgs),
    /// Score a variant with the selected scorers
    Score(ScoreArgs),
    /// Analyze a file of variants, one per line
    Batch(BatchArgs),
    /// Show or clear the saved analysis history
    History(HistoryArgs),
    /// Browse the tool catalog, favorites, and recently used tools
    Tools(ToolsArgs),
    /// List tissue and output ontologies
    Ontologies(OntologiesArgs),
    /// Check that the backend is reachable
    Health,
    /// Manage stored configuration
    Config(ConfigArgs),
}

#[derive(Debug, Args, Clone)]
pub struct PredictionFlags {
    /// Output types to predict
    #[arg(long, value_enum, value_delimiter = ',', default_value = "rna-seq")]
    pub outputs: Vec<OutputType>,

    /// Tissue/cell-line ontology terms
    #[arg(long, value_delimiter = ',', default_value = DEFAULT_TISSUE)]
    pub tissues: Vec<String>,

    /// Context sequence length
    #[arg(long, value_enum, default_value = "1mb")]
    pub sequence_length: SequenceLength,

    /// Target organism
    #[arg(long, value_enum, default_value = "homo-sapiens")]
    pub organism: Organism,
}

#[derive(Debug, Args, Clone)]
pub struct ExportFlags {
    /// Export the result as JSON
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// Export the scores as CSV
    #[arg(long)]
    pub export_csv: Option<PathBuf>,

    /// Export the scores as TSV
    #[arg(long)]
    pub export_tsv: Option<PathBuf>,

    /// Export a Markdown report
    #[arg(long)]
    pub export_md: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    /// Variant in chr22:36201698:A>C notation
    pub variant: String,

    #[command(flatten)]
    pub prediction: PredictionFlags,

    #[command(flatten)]
    pub export: ExportFlags,

    /// Use --auto-save true or --auto-save false to override
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub auto_save: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ScoreArgs {
    /// Variant in chr22:36201698:A>C notation
    pub variant: String,

    /// Scoring methods to use
    #[arg(long, value_enum, value_delimiter = ',', default_value = "rna-seq")]
    pub scorers: Vec<ScorerType>,

    /// Context sequence length
    #[arg(long, value_enum, default_value = "1mb")]
    pub sequence_length: SequenceLength,

    /// Target organism
    #[arg(long, value_enum, default_value = "homo-sapiens")]
    pub organism: Organism,

    #[command(flatten)]
    pub export: ExportFlags,

    /// Use --auto-save true or --auto-save false to override
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub auto_save: bool,
}

#[derive(Debug, Args, Clone)]
pub struct BatchArgs {
    /// File with one variant per line (# starts a comment)
    pub file: PathBuf,

    #[command(flatten)]
    pub prediction: PredictionFlags,

    /// Export the batch outcome as JSON
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// Use --auto-save true or --auto-save false to override
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub auto_save: bool,
}

#[derive(Debug, Args, Clone)]
pub struct HistoryArgs {
    /// Number of entries to show
    #[arg(long, default_value_t = 10)]
    pub limit: usize,

    /// Delete all saved history
    #[arg(long)]
    pub clear: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ToolsArgs {
    #[command(subcommand)]
    pub action: Option<ToolsAction>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum ToolsAction {
    /// List the catalog, optionally filtered
    List {
        /// Only show one category
        #[arg(long, value_enum)]
        category: Option<ToolCategory>,

        /// Only show favorites
        #[arg(long)]
        favorites: bool,
    },
    /// Toggle a tool as favorite
    Favorite {
        /// Tool slug, e.g. genetic-diet
        slug: String,
    },
    /// Show recently used tools
    Recent,
    /// Register interest in a tool that is not available yet
    Request {
        /// Tool slug, e.g. organism-designer
        slug: String,

        /// Contact email for the request
        #[arg(long)]
        email: String,
    },
}

#[derive(Debug, Args, Clone)]
pub struct OntologiesArgs {
    /// List the built-in tissue table without calling the service
    #[arg(long)]
    pub offline: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Debug, Subcommand, Clone)]
pub enum ConfigAction {
    /// Store the API key locally
    SetKey {
        key: String,
    },
    /// Remove the stored API key
    ClearKey,
    /// Show the configuration and storage locations
    Show,
}

pub async fn run(args: Cli) -> Result<()> {
    // Validate that --silent can only be used with --json
    if args.silent && !args.json {
        return Err(anyhow::anyhow!(
            "--silent can only be used with --json. Use --silent --json together."
        ));
    }

    match args.command.clone() {
        Command::Analyze(sub) => run_analyze(&args, &sub).await,
        Command::Score(sub) => run_score(&args, &sub).await,
        Command::Batch(sub) => run_batch(&args, &sub).await,
        Command::History(sub) => run_history(&args, &sub),
        Command::Tools(sub) => run_tools(&args, &sub).await,
        Command::Ontologies(sub) => run_ontologies(&args, &sub).await,
        Command::Health => run_health(&args).await,
        Command::Config(sub) => run_config(&sub),
    }
}

/// Build a `ClientConfig` from CLI arguments, falling back to the stored key.
pub fn build_config(args: &Cli) -> ClientConfig {
    let api_key = args.api_key.clone().or_else(stored_api_key);
    ClientConfig {
        base_url: args.base_url.clone(),
        api_key,
        request_timeout: args.timeout.into(),
        user_agent: format!("alphagenome-cli/{}", env!("CARGO_PKG_VERSION")),
    }
}

fn stored_api_key() -> Option<String> {
    let store = FileStore::open_default().ok()?;
    Preferences::new(store).api_key().ok().flatten()
}

fn open_preferences() -> Result<Preferences<FileStore>> {
    Ok(Preferences::new(FileStore::open_default()?))
}

fn build_predict_request(variant: &str, flags: &PredictionFlags) -> Result<PredictRequest> {
    let variant = Variant::parse(variant)?;
    let mut request = PredictRequest::new(variant);
    request.outputs = flags.outputs.clone();
    request.tissues = flags.tissues.clone();
    request.sequence_length = flags.sequence_length;
    request.organism = flags.organism;
    Ok(request)
}

fn render_event(ev: ToolEvent, out_tx: &mpsc::UnboundedSender<OutputLine>) {
    match ev {
        ToolEvent::StageStarted { stage } => {
            let _ = out_tx.send(OutputLine::Stderr(format!("== {} ==", stage.label())));
        }
        ToolEvent::Progress { percent } => {
            let _ = out_tx.send(OutputLine::Stderr(format!("Progress: {percent}%")));
        }
        ToolEvent::Notice(Notice::Error(msg)) => {
            let _ = out_tx.send(OutputLine::Stderr(format!("Error: {msg}")));
        }
        ToolEvent::Notice(notice) => {
            let _ = out_tx.send(OutputLine::Stderr(notice.to_message()));
        }
        ToolEvent::Completed { record } => {
            let summary = text_summary::build_analysis_summary(&record);
            for line in summary.lines {
                let _ = out_tx.send(OutputLine::Stdout(line));
            }
        }
    }
}

/// Handle exports and auto-save for a completed analysis; returns status
/// messages for the presentation layer.
fn process_completion(
    export: &ExportFlags,
    auto_save: bool,
    tool: ToolId,
    record: &AnalysisRecord,
) -> Result<Vec<String>> {
    let mut messages = Vec::new();

    if let Some(p) = export.export_json.as_deref() {
        storage::export_json(p, record)?;
        messages.push(format!("Exported JSON: {}", p.display()));
    }
    if let Some(p) = export.export_csv.as_deref() {
        storage::export_csv(p, record)?;
        messages.push(format!("Exported CSV: {}", p.display()));
    }
    if let Some(p) = export.export_tsv.as_deref() {
        storage::export_tsv(p, record)?;
        messages.push(format!("Exported TSV: {}", p.display()));
    }
    if let Some(p) = export.export_md.as_deref() {
        storage::export_markdown(p, record)?;
        messages.push(format!("Exported Markdown: {}", p.display()));
    }

    if auto_save {
        match storage::save_analysis(record) {
            Ok(path) => messages.push(format!("Saved: {}", path.display())),
            Err(e) => messages.push(format!("Save failed: {e:#}")),
        }
    }

    if let Ok(mut prefs) = open_preferences() {
        let _ = prefs.record_recent_tool(tool.slug());
    }

    Ok(messages)
}

async fn run_analyze(args: &Cli, sub: &AnalyzeArgs) -> Result<()> {
    let request = build_predict_request(&sub.variant, &sub.prediction)?;
    let cfg = build_config(args);
    let client = AlphaGenomeClient::new(&cfg)?;

    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<ToolEvent>();
    let mut options = RunnerOptions::default().events(evt_tx.clone());
    if !args.silent {
        options = options.success_message("Analysis completed");
    }
    let runner: ToolRunner<AnalysisRecord> = ToolRunner::with_options(options);
    let engine = AnalysisEngine::new(client, Some(evt_tx.clone()));

    let completion_tx = evt_tx.clone();
    let handle = tokio::spawn(async move {
        let out = runner.execute(engine.predict_variant(&request, &runner)).await;
        if let Some(record) = &out {
            let _ = completion_tx.send(ToolEvent::Completed {
                record: Box::new(record.clone()),
            });
        }
        let error = runner.error_message();
        (out, error)
    });
    drop(evt_tx);

    if args.json {
        // Machine mode: discard the event stream, print the record.
        drop(evt_rx);
        let (outcome, error) = handle.await.context("analysis task failed")?;
        let Some(record) = outcome else {
            bail!(error.unwrap_or_else(|| "analysis failed".to_string()));
        };
        let messages = process_completion(&sub.export, sub.auto_save, ToolId::VariantAnalyzer, &record)?;
        if !args.silent {
            println!("{}", serde_json::to_string_pretty(&record)?);
            for msg in messages {
                eprintln!("{msg}");
            }
        }
        return Ok(());
    }

    let (out_tx, out_handle) = spawn_output_writer();
    while let Some(ev) = evt_rx.recv().await {
        render_event(ev, &out_tx);
    }

    let (outcome, error) = handle.await.context("analysis task failed")?;
    let res = match outcome {
        Some(record) => {
            let messages =
                process_completion(&sub.export, sub.auto_save, ToolId::VariantAnalyzer, &record)?;
            for msg in messages {
                let _ = out_tx.send(OutputLine::Stderr(msg));
            }
            Ok(())
        }
        None => Err(anyhow::anyhow!(
            error.unwrap_or_else(|| "analysis failed".to_string())
        )),
    };

    drop(out_tx);
    let _ = out_handle.await;
    res
}

async fn run_score(args: &Cli, sub: &ScoreArgs) -> Result<()> {
    let variant = Variant::parse(&sub.variant)?;
    let mut request = ScoreRequest::new(variant);
    request.scorers = sub.scorers.clone();
    request.sequence_length = sub.sequence_length;
    request.organism = sub.organism;

    let cfg = build_config(args);
    let client = AlphaGenomeClient::new(&cfg)?;

    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<ToolEvent>();
    let mut options = RunnerOptions::default().events(evt_tx.clone());
    if !args.silent {
        options = options.success_message("Scoring completed");
    }
    let runner: ToolRunner<AnalysisRecord> = ToolRunner::with_options(options);
    let engine = AnalysisEngine::new(client, Some(evt_tx.clone()));

    let completion_tx = evt_tx.clone();
    let handle = tokio::spawn(async move {
        let out = runner.execute(engine.score_variant(&request, &runner)).await;
        if let Some(record) = &out {
            let _ = completion_tx.send(ToolEvent::Completed {
                record: Box::new(record.clone()),
            });
        }
        let error = runner.error_message();
        (out, error)
    });
    drop(evt_tx);

    if args.json {
        drop(evt_rx);
        let (outcome, error) = handle.await.context("scoring task failed")?;
        let Some(record) = outcome else {
            bail!(error.unwrap_or_else(|| "scoring failed".to_string()));
        };
        let messages =
            process_completion(&sub.export, sub.auto_save, ToolId::VariantAnalyzer, &record)?;
        if !args.silent {
            println!("{}", serde_json::to_string_pretty(&record)?);
            for msg in messages {
                eprintln!("{msg}");
            }
        }
        return Ok(());
    }

    let (out_tx, out_handle) = spawn_output_writer();
    while let Some(ev) = evt_rx.recv().await {
        render_event(ev, &out_tx);
    }

    let (outcome, error) = handle.await.context("scoring task failed")?;
    let res = match outcome {
        Some(record) => {
            let messages =
                process_completion(&sub.export, sub.auto_save, ToolId::VariantAnalyzer, &record)?;
            for msg in messages {
                let _ = out_tx.send(OutputLine::Stderr(msg));
            }
            Ok(())
        }
        None => Err(anyhow::anyhow!(
            error.unwrap_or_else(|| "scoring failed".to_string())
        )),
    };

    drop(out_tx);
    let _ = out_handle.await;
    res
}

async fn run_batch(args: &Cli, sub: &BatchArgs) -> Result<()> {
    let raw = std::fs::read_to_string(&sub.file)
        .with_context(|| format!("failed to read {}", sub.file.display()))?;

    let mut requests = Vec::new();
    for (lineno, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let variant = Variant::parse(line)
            .with_context(|| format!("{}:{}", sub.file.display(), lineno + 1))?;
        let mut request = PredictRequest::new(variant);
        request.outputs = sub.prediction.outputs.clone();
        request.tissues = sub.prediction.tissues.clone();
        request.sequence_length = sub.prediction.sequence_length;
        request.organism = sub.prediction.organism;
        requests.push(request);
    }
    if requests.is_empty() {
        bail!("no variants found in {}", sub.file.display());
    }

    let cfg = build_config(args);
    let client = AlphaGenomeClient::new(&cfg)?;

    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<ToolEvent>();
    let mut options = RunnerOptions::default().events(evt_tx.clone());
    if !args.silent {
        options = options.success_message("Batch completed");
    }
    let runner: ToolRunner<BatchOutcome> = ToolRunner::with_options(options);
    let engine = AnalysisEngine::new(client, Some(evt_tx.clone()));

    let handle = tokio::spawn(async move {
        let out = runner.execute(engine.run_batch(&requests, &runner)).await;
        let error = runner.error_message();
        (out, error)
    });
    drop(evt_tx);

    let outcome = if args.json {
        drop(evt_rx);
        let (outcome, error) = handle.await.context("batch task failed")?;
        let Some(outcome) = outcome else {
            bail!(error.unwrap_or_else(|| "batch failed".to_string()));
        };
        if !args.silent {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        outcome
    } else {
        let (out_tx, out_handle) = spawn_output_writer();
        while let Some(ev) = evt_rx.recv().await {
            render_event(ev, &out_tx);
        }
        let (outcome, error) = handle.await.context("batch task failed")?;
        let res = match outcome {
            Some(outcome) => {
                let summary = text_summary::build_batch_summary(&outcome);
                for line in summary.lines {
                    let _ = out_tx.send(OutputLine::Stdout(line));
                }
                Ok(outcome)
            }
            None => Err(anyhow::anyhow!(
                error.unwrap_or_else(|| "batch failed".to_string())
            )),
        };
        drop(out_tx);
        let _ = out_handle.await;
        res?
    };

    if let Some(p) = sub.export_json.as_deref() {
        storage::export_json_document(p, &outcome)?;
        if !args.silent {
            eprintln!("Exported JSON: {}", p.display());
        }
    }
    if sub.auto_save {
        let mut saved = 0usize;
        for item in &outcome.items {
            if let Some(record) = &item.record {
                if storage::save_analysis(record).is_ok() {
                    saved += 1;
                }
            }
        }
        if saved > 0 && !args.silent {
            eprintln!("Saved {saved} analyses to history");
        }
    }
    if let Ok(mut prefs) = open_preferences() {
        let _ = prefs.record_recent_tool(ToolId::BatchAnalyzer.slug());
    }

    Ok(())
}

fn run_history(args: &Cli, sub: &HistoryArgs) -> Result<()> {
    if sub.clear {
        storage::clear_history()?;
        if !args.silent {
            println!("History cleared");
        }
        return Ok(());
    }

    let records = storage::load_recent(sub.limit)?;
    if args.json {
        if !args.silent {
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        return Ok(());
    }

    if records.is_empty() {
        println!("No saved analyses");
        return Ok(());
    }
    for (i, r) in records.iter().enumerate() {
        let impact = r
            .summary
            .as_ref()
            .map(|s| s.impact_level.as_str())
            .unwrap_or("-");
        println!(
            "{:>3}. [{}] {:<28} impact={:<9} tool={}",
            i + 1,
            r.timestamp_utc,
            r.variant,
            impact,
            r.tool
        );
    }
    Ok(())
}

async fn run_tools(args: &Cli, sub: &ToolsArgs) -> Result<()> {
    match sub.action.clone().unwrap_or(ToolsAction::List {
        category: None,
        favorites: false,
    }) {
        ToolsAction::List {
            category,
            favorites,
        } => {
            let prefs = open_preferences().ok();
            let favorite_slugs = prefs
                .as_ref()
                .and_then(|p| p.favorites().ok())
                .unwrap_or_default();

            if args.json {
                let listing: Vec<serde_json::Value> = ToolId::ALL
                    .iter()
                    .map(|t| t.meta())
                    .filter(|m| category.map_or(true, |c| m.category == c))
                    .filter(|m| !favorites || favorite_slugs.iter().any(|f| f == m.slug))
                    .map(|m| {
                        serde_json::json!({
                            "slug": m.slug,
                            "name": m.name,
                            "category": m.category.label(),
                            "complexity": m.complexity.label(),
                            "premium": m.premium,
                            "description": m.description,
                            "favorite": favorite_slugs.iter().any(|f| f == m.slug),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&listing)?);
                return Ok(());
            }

            for (cat, count) in category_counts() {
                if category.map_or(false, |c| c != cat) {
                    continue;
                }
                println!("{} ({count})", cat.label());
                for meta in ToolId::ALL.iter().map(|t| t.meta()) {
                    if meta.category != cat {
                        continue;
                    }
                    let is_fav = favorite_slugs.iter().any(|f| f == meta.slug);
                    if favorites && !is_fav {
                        continue;
                    }
                    let marker = if is_fav { "*" } else { " " };
                    let premium = if meta.premium { " [premium]" } else { "" };
                    println!(
                        "  {marker} {:<28} {:<12} {}{}",
                        meta.slug,
                        meta.complexity.label(),
                        meta.description,
                        premium
                    );
                }
            }
            Ok(())
        }
        ToolsAction::Favorite { slug } => {
            let Some(tool) = ToolId::from_slug(&slug) else {
                bail!("unknown tool: {slug} (see `alphagenome-cli tools list`)");
            };
            let mut prefs = open_preferences()?;
            let now_favorite = prefs.toggle_favorite(tool.slug())?;
            if now_favorite {
                println!("Added {} to favorites", tool.slug());
            } else {
                println!("Removed {} from favorites", tool.slug());
            }
            Ok(())
        }
        ToolsAction::Recent => {
            let prefs = open_preferences()?;
            let recent = prefs.recent_tools()?;
            if recent.is_empty() {
                println!("No recently used tools");
                return Ok(());
            }
            for slug in recent {
                match ToolId::from_slug(&slug) {
                    Some(tool) => println!("{:<28} {}", slug, tool.meta().name),
                    None => println!("{slug}"),
                }
            }
            Ok(())
        }
        ToolsAction::Request { slug, email } => {
            let Some(tool) = ToolId::from_slug(&slug) else {
                bail!("unknown tool: {slug} (see `alphagenome-cli tools list`)");
            };
            if !is_valid_email(&email) {
                bail!("invalid email: {email}");
            }

            let cfg = build_config(args);
            let client = AlphaGenomeClient::new(&cfg)?;
            let meta = tool.meta();
            let body = FeatureRequestBody {
                feature_id: meta.slug.to_string(),
                feature_name: meta.name.to_string(),
                email,
                timestamp: time::OffsetDateTime::now_utc()
                    .format(&time::format_description::well_known::Rfc3339)
                    .unwrap_or_else(|_| "now".into()),
            };

            let runner: ToolRunner<FeatureRequestAck> = ToolRunner::new();
            match runner.execute(client.request_feature(&body)).await {
                Some(ack) => {
                    if args.json {
                        if !args.silent {
                            println!("{}", serde_json::to_string_pretty(&ack)?);
                        }
                    } else {
                        println!(
                            "Registered interest in {} ({} requests so far)",
                            meta.slug, ack.total_requests
                        );
                    }
                    Ok(())
                }
                None => bail!(runner
                    .error_message()
                    .unwrap_or_else(|| "feature request failed".to_string())),
            }
        }
    }
}

async fn run_ontologies(args: &Cli, sub: &OntologiesArgs) -> Result<()> {
    if sub.offline {
        for (code, name) in COMMON_TISSUES {
            println!("{:<16} {}", code, name);
        }
        return Ok(());
    }

    let cfg = build_config(args);
    let client = AlphaGenomeClient::new(&cfg)?;
    let runner: ToolRunner<OntologyCatalog> = ToolRunner::new();

    match runner.execute(client.ontologies()).await {
        Some(catalog) => {
            if args.json {
                if !args.silent {
                    println!("{}", serde_json::to_string_pretty(&catalog)?);
                }
            } else {
                println!(
                    "tissues: {}, cell lines: {}, output types: {}",
                    catalog.tissues.len(),
                    catalog.cell_lines.len(),
                    catalog.output_types.len()
                );
            }
            Ok(())
        }
        None => bail!(runner
            .error_message()
            .unwrap_or_else(|| "ontology fetch failed".to_string())),
    }
}

async fn run_health(args: &Cli) -> Result<()> {
    let cfg = build_config(args);
    let client = AlphaGenomeClient::new(&cfg)?;
    let runner = ToolRunner::new();

    match runner.execute(client.health()).await {
        Some(health) => {
            if !args.silent {
                println!("{}", health.status);
            }
            Ok(())
        }
        None => bail!(runner
            .error_message()
            .unwrap_or_else(|| "health check failed".to_string())),
    }
}

fn run_config(sub: &ConfigArgs) -> Result<()> {
    match &sub.action {
        ConfigAction::SetKey { key } => {
            let mut prefs = open_preferences()?;
            prefs.set_api_key(key)?;
            println!("API key stored in {}", FileStore::default_path()?.display());
            Ok(())
        }
        ConfigAction::ClearKey => {
            let mut prefs = open_preferences()?;
            prefs.clear_api_key()?;
            println!("API key cleared");
            Ok(())
        }
        ConfigAction::Show => {
            let prefs = open_preferences()?;
            match prefs.api_key()? {
                Some(key) => println!("API key: {}", mask_key(&key)),
                None => println!("API key: not configured"),
            }
            println!("Config:  {}", FileStore::default_path()?.display());
            println!("History: {}", storage::history_path()?.display());
            Ok(())
        }
    }
}

/// Keep only the key's tail visible.
fn mask_key(key: &str) -> String {
    let tail: String = key
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if key.chars().count() <= 4 {
        "configured".to_string()
    } else {
        format!("****{tail}")
    }
}
