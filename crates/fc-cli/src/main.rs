#![forbid(unsafe_code)]

//! FrankenCatalog CLI - compile C4 architecture diagrams into a service catalog.
//!
//! # Commands
//!
//! - `convert`: Compile every diagram under a directory into catalog YAML
//! - `inspect`: Output one diagram's raw records or compiled entities as JSON
//! - `detect`: Show the detected diagram format and confidence

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use fc_core::{CatalogError, DiagnosticCounts, DiagnosticSeverity, RunConfig};
use fc_emit::{EmittedFile, OutputLayout, emit_catalog};
use fc_graph::{CatalogCompiler, CatalogGraph, ClassificationTables};
use fc_parser::{detect_format_with_confidence, is_supported_path, parse, parse_evidence_json};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

/// FrankenCatalog CLI - compile C4 architecture diagrams into a service catalog.
#[derive(Debug, Parser)]
#[command(
    name = "fc-cli",
    version,
    about = "FrankenCatalog CLI - compile C4 architecture diagrams into a service catalog",
    long_about = "Reads draw.io C4 diagrams and Mermaid C4 text, resolves scopes,\n\
        classifies elements and relationships, merges them across files and\n\
        writes Backstage-style catalog YAML."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging (can be repeated for more detail: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log line format
    #[arg(long, value_enum, default_value = "text", global = true)]
    log_format: LogFormat,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile every diagram under the input directory into catalog files.
    Convert {
        /// Directory searched recursively for diagrams
        #[arg(short, long, env = "INPUT_DIR")]
        input: Option<PathBuf>,

        /// Directory catalog files are written to
        #[arg(short, long, env = "OUTPUT_DIR")]
        output: Option<PathBuf>,

        /// Team name; becomes the synthesized group
        #[arg(long, env = "TEAM_NAME")]
        team: Option<String>,

        /// Owner group (defaults to the team)
        #[arg(long, env = "OWNER")]
        owner: Option<String>,

        /// Lifecycle label for components, APIs and resources
        #[arg(long, env = "LIFECYCLE")]
        lifecycle: Option<String>,

        /// Repository slug for the github.com/project-slug annotation
        #[arg(long, env = "REPO_SLUG")]
        repo_slug: Option<String>,

        /// Catalog namespace
        #[arg(long)]
        namespace: Option<String>,

        /// TOML file with [run] and [tables] sections
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write one multi-document catalog-info.yaml instead of a file per entity
        #[arg(long)]
        bundle: bool,

        /// Print a JSON run summary to stderr
        #[arg(long)]
        json: bool,
    },

    /// Parse one diagram and print its records as JSON.
    Inspect {
        /// Diagram file path
        input: PathBuf,

        /// Print the raw adapter records instead of compiled entities
        #[arg(long)]
        raw: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Detect a diagram's format and show confidence information.
    Detect {
        /// Diagram file path
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet, cli.log_format);

    match cli.command {
        Command::Convert {
            input,
            output,
            team,
            owner,
            lifecycle,
            repo_slug,
            namespace,
            config,
            bundle,
            json,
        } => {
            let overrides = RunOverrides {
                input_dir: input,
                output_dir: output,
                team_name: team,
                owner,
                lifecycle,
                repo_slug,
                namespace,
                bundle: bundle.then_some(true),
            };
            cmd_convert(config.as_deref(), overrides, json)
        }

        Command::Inspect { input, raw, pretty } => cmd_inspect(&input, raw, pretty),

        Command::Detect { input, json } => cmd_detect(&input, json),
    }
}

fn init_tracing(verbose: u8, quiet: bool, format: LogFormat) {
    let filter = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time();
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

fn load_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

// =============================================================================
// Configuration
// =============================================================================

/// Values a config file, the environment or flags may set.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
struct RunOverrides {
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    team_name: Option<String>,
    owner: Option<String>,
    lifecycle: Option<String>,
    repo_slug: Option<String>,
    namespace: Option<String>,
    bundle: Option<bool>,
}

impl RunOverrides {
    /// Layer `other` on top of `self`; set fields in `other` win.
    fn layered(self, other: Self) -> Self {
        Self {
            input_dir: other.input_dir.or(self.input_dir),
            output_dir: other.output_dir.or(self.output_dir),
            team_name: other.team_name.or(self.team_name),
            owner: other.owner.or(self.owner),
            lifecycle: other.lifecycle.or(self.lifecycle),
            repo_slug: other.repo_slug.or(self.repo_slug),
            namespace: other.namespace.or(self.namespace),
            bundle: other.bundle.or(self.bundle),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    run: RunOverrides,
    tables: Option<ClassificationTables>,
}

fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("Invalid config file: {}", path.display()))
}

/// Fully resolved settings for one `convert` run.
#[derive(Debug, Clone)]
struct ConvertSettings {
    input_dir: PathBuf,
    output_dir: PathBuf,
    run: RunConfig,
    tables: ClassificationTables,
    layout: OutputLayout,
}

fn resolve_settings(config_path: Option<&Path>, overrides: RunOverrides) -> Result<ConvertSettings> {
    let file = match config_path {
        Some(path) => load_config_file(path)?,
        None => ConfigFile::default(),
    };
    let merged = file.run.layered(overrides);

    let defaults = RunConfig::default();
    let run = RunConfig {
        team_name: merged.team_name.unwrap_or(defaults.team_name),
        owner: merged.owner.filter(|owner| !owner.trim().is_empty()),
        lifecycle: merged.lifecycle.unwrap_or(defaults.lifecycle),
        repo_slug: merged.repo_slug.unwrap_or(defaults.repo_slug),
        namespace: merged.namespace.unwrap_or(defaults.namespace),
    };
    run.validate()?;

    let input_dir = merged
        .input_dir
        .ok_or_else(|| CatalogError::configuration("input_dir", "is not set (use --input or INPUT_DIR)"))?;
    if !input_dir.is_dir() {
        return Err(CatalogError::configuration(
            "input_dir",
            format!("{} does not exist or is not a directory", input_dir.display()),
        )
        .into());
    }
    let output_dir = merged
        .output_dir
        .ok_or_else(|| CatalogError::configuration("output_dir", "is not set (use --output or OUTPUT_DIR)"))?;

    Ok(ConvertSettings {
        input_dir,
        output_dir,
        run,
        tables: file.tables.unwrap_or_default(),
        layout: if merged.bundle.unwrap_or(false) {
            OutputLayout::Bundle
        } else {
            OutputLayout::Directory
        },
    })
}

// =============================================================================
// Command: convert
// =============================================================================

/// Run summary printed with `--json`.
#[derive(Debug, Serialize)]
struct ConvertSummary {
    input_dir: String,
    output_dir: String,
    layout: OutputLayout,
    files_seen: usize,
    files_skipped: usize,
    entities: BTreeMap<String, usize>,
    files_written: usize,
    diagnostics: DiagnosticCounts,
    messages: Vec<fc_core::Diagnostic>,
}

fn cmd_convert(config_path: Option<&Path>, overrides: RunOverrides, json_output: bool) -> Result<()> {
    let settings = resolve_settings(config_path, overrides)?;
    info!(
        input = %settings.input_dir.display(),
        output = %settings.output_dir.display(),
        team = %settings.run.team_name,
        "starting conversion"
    );

    let paths = discover_inputs(&settings.input_dir)?;
    if paths.is_empty() {
        error!(input = %settings.input_dir.display(), "no diagram files found");
        return Err(CatalogError::empty(format!(
            "no diagram files found in {}",
            settings.input_dir.display()
        ))
        .into());
    }

    let mut sources = Vec::with_capacity(paths.len());
    for path in &paths {
        match fs::read_to_string(path) {
            Ok(contents) => sources.push((path.display().to_string(), contents)),
            Err(err) => warn!(file = %path.display(), "skipping unreadable file: {err}"),
        }
    }

    let compiler = CatalogCompiler::new(settings.tables.clone());
    let graph = compiler.compile_all(
        sources
            .iter()
            .map(|(name, contents)| (name.as_str(), contents.as_str())),
        &settings.run,
    )?;
    let files_skipped = graph.files_skipped + (paths.len() - sources.len());
    let diagnostics = log_diagnostics(&graph);

    let files = emit_catalog(&graph, &settings.run, settings.layout)?;
    write_catalog(&settings.output_dir, &files)?;
    verify_outputs(&settings.output_dir, &files)?;
    info!(
        files = files.len(),
        entities = graph.entities.len(),
        "catalog written to {}",
        settings.output_dir.display()
    );

    if json_output {
        let summary = ConvertSummary {
            input_dir: settings.input_dir.display().to_string(),
            output_dir: settings.output_dir.display().to_string(),
            layout: settings.layout,
            files_seen: paths.len(),
            files_skipped,
            entities: graph
                .counts_by_kind()
                .into_iter()
                .map(|(kind, count)| (kind.as_str().to_string(), count))
                .collect(),
            files_written: files.len(),
            diagnostics,
            messages: graph.diagnostics.clone(),
        };
        eprintln!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}

/// Supported diagram files under `root`, sorted by path.
fn discover_inputs(root: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping unreadable directory entry: {err}");
                continue;
            }
        };
        if entry.file_type().is_file() && is_supported_path(&entry.path().to_string_lossy()) {
            debug!(file = %entry.path().display(), "discovered diagram");
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(paths)
}

fn log_diagnostics(graph: &CatalogGraph) -> DiagnosticCounts {
    for diagnostic in &graph.diagnostics {
        let source = diagnostic.source.as_deref().unwrap_or("-");
        match diagnostic.severity {
            DiagnosticSeverity::Error => error!(file = source, "{}", diagnostic.message),
            DiagnosticSeverity::Warning => warn!(file = source, "{}", diagnostic.message),
            DiagnosticSeverity::Info => debug!(file = source, "{}", diagnostic.message),
        }
    }
    let counts = DiagnosticCounts::tally(&graph.diagnostics);
    if counts.total() > 0 {
        info!(
            total = counts.total(),
            errors = counts.errors,
            warnings = counts.warnings,
            "diagnostics reported"
        );
    }
    counts
}

fn write_catalog(output_dir: &Path, files: &[EmittedFile]) -> Result<()> {
    for file in files {
        let path = output_dir.join(&file.relative_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        fs::write(&path, &file.contents)
            .with_context(|| format!("Failed to write to: {}", path.display()))?;
        debug!(file = %path.display(), documents = file.documents, "wrote catalog file");
    }
    Ok(())
}

/// Every expected file must exist and be non-empty.
fn verify_outputs(output_dir: &Path, files: &[EmittedFile]) -> Result<()> {
    let missing: Vec<String> = files
        .iter()
        .map(|file| output_dir.join(&file.relative_path))
        .filter(|path| !fs::metadata(path).is_ok_and(|meta| meta.len() > 0))
        .map(|path| path.display().to_string())
        .collect();
    if !missing.is_empty() {
        bail!(
            "{} catalog file(s) missing or empty after writing: {}",
            missing.len(),
            missing.join(", ")
        );
    }
    Ok(())
}

// =============================================================================
// Command: inspect
// =============================================================================

fn cmd_inspect(input: &Path, raw: bool, pretty: bool) -> Result<()> {
    let source = load_input(input)?;
    let source_name = input.display().to_string();
    let parsed = parse(&source, &source_name)?;

    for warning in &parsed.warnings {
        warn!("Parse warning: {warning}");
    }

    let output = if raw {
        if pretty {
            serde_json::to_string_pretty(&parsed)?
        } else {
            serde_json::to_string(&parsed)?
        }
    } else {
        let file = CatalogCompiler::default().compile_file(&parsed, &source_name);
        if pretty {
            serde_json::to_string_pretty(&file)?
        } else {
            serde_json::to_string(&file)?
        }
    };
    println!("{output}");
    debug!("{}", parse_evidence_json(&parsed));

    Ok(())
}

// =============================================================================
// Command: detect
// =============================================================================

/// Result of detecting a diagram's format.
#[derive(Debug, Serialize)]
struct DetectResult {
    format: String,
    confidence: f32,
    detection_method: String,
    warnings: Vec<String>,
}

fn cmd_detect(input: &Path, json_output: bool) -> Result<()> {
    let source = load_input(input)?;
    let detected = detect_format_with_confidence(&source, input.to_str());

    if json_output {
        let result = DetectResult {
            format: detected.format.as_str().to_string(),
            confidence: detected.confidence,
            detection_method: detected.method.as_str().to_string(),
            warnings: detected.warnings,
        };
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Format:     {}", detected.format.as_str());
        println!("Confidence: {:.2}", detected.confidence);
        println!("Method:     {}", detected.method.as_str());
        for warning in &detected.warnings {
            println!("Warning:    {warning}");
        }
    }

    Ok(())
}
