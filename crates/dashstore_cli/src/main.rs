//! `dashstore` command-line entry point.
//!
//! # Responsibility
//! - Map slash-separated paths (`templates/rows/R1/2-load`) onto store calls.
//! - Own process setup: configuration lookup and logging initialization.
//! - Report failures as `error[<code>]: <message>` with exit status 1.

use clap::{Parser, Subcommand};
use dashstore_core::{
    default_log_level, init_logging, Category, ConfigError, Document, DocumentError,
    DocumentKind, LogSink, ResourceStore, SaveMode, StoreConfig, StoreError,
};
use log::debug;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const QUIET_LOG_LEVEL: &str = "warn";

#[derive(Parser)]
#[command(
    name = "dashstore",
    version,
    about = "Local store for dashboard backups and templates"
)]
struct Cli {
    /// Config file (defaults to $DASHSTORE_CONFIG, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Override the configured data directory
    #[arg(long, global = true)]
    data_dir: Option<String>,
    /// Log level: trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// List categories, files, or children of a stored document
    Ls { path: Option<String> },
    /// Print a stored document as JSON
    Cat { path: String },
    /// Save a JSON file as a document at PATH (merging into an existing one)
    Import {
        file: PathBuf,
        path: String,
        /// Variant of the file content: dashboard|row|panel
        #[arg(long, value_parser = parse_kind)]
        kind: DocumentKind,
        /// Document name when created (defaults to the last path segment)
        #[arg(long)]
        name: Option<String>,
    },
    /// Write a stored document to a JSON file
    Export { path: String, file: PathBuf },
    /// Copy a stored document (or one of its rows/panels) to another path
    Cp { src: String, dst: String },
    /// Remove a stored document, row or panel
    Rm { path: String },
}

#[derive(Debug)]
enum CliError {
    Config(ConfigError),
    Logging(String),
    Store(StoreError),
    Document(DocumentError),
    Io { path: PathBuf, source: std::io::Error },
    Usage(String),
}

impl CliError {
    fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Logging(_) => "logging",
            Self::Store(err) => err.kind(),
            Self::Document(_) => "invalid_document",
            Self::Io { .. } => "io",
            Self::Usage(_) => "usage",
        }
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Logging(message) => write!(f, "{message}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Document(err) => write!(f, "{err}"),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Usage(message) => write!(f, "{message}"),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<StoreError> for CliError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<DocumentError> for CliError {
    fn from(value: DocumentError) -> Self {
        Self::Document(value)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error[{}]: {err}", err.code());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::from_env()?,
    };
    if let Some(data_dir) = &cli.data_dir {
        config = config.with_data_dir(data_dir);
    }
    start_logging(&config, cli.log_level.as_deref())?;

    let store = ResourceStore::open(&config)?;
    debug!(
        "event=cli_start module=cli status=ok data_dir={}",
        config.data_dir.display()
    );

    match cli.cmd {
        Cmd::Ls { path } => {
            let segments = path.as_deref().map(split_path).unwrap_or_default();
            let names = match segments.split_first() {
                None => Category::ALL
                    .iter()
                    .map(|category| category.dir_name().to_string())
                    .collect(),
                Some((category, names)) => store.list(category, names)?,
            };
            for name in names {
                println!("{name}");
            }
        }
        Cmd::Cat { path } => {
            let (category, segments) = split_target(&path)?;
            let document = store.get(category, &segments)?;
            println!("{}", String::from_utf8_lossy(&document.source()?));
        }
        Cmd::Import {
            file,
            path,
            kind,
            name,
        } => {
            let (category, segments) = split_target(&path)?;
            let source = std::fs::read(&file).map_err(|source| CliError::Io {
                path: file.clone(),
                source,
            })?;
            let hint = name.or_else(|| default_name(category, &segments));
            let document = Document::parse(kind, &source, hint.as_deref())?;
            let outcome = store.save(&document, category, &segments)?;
            println!("{} {}", mode_label(outcome.mode), outcome.file);
        }
        Cmd::Export { path, file } => {
            let (category, segments) = split_target(&path)?;
            let document = store.get(category, &segments)?;
            write_file(&file, &document.source()?)?;
        }
        Cmd::Cp { src, dst } => {
            let (src_category, src_segments) = split_target(&src)?;
            let (dst_category, dst_segments) = split_target(&dst)?;
            let original = store.get(src_category, &src_segments)?;
            let hint =
                default_name(dst_category, &dst_segments).unwrap_or_else(|| original.name());
            let copy =
                Document::from_value(original.kind(), original.to_value(), Some(hint.as_str()))?;
            let outcome = store.save(&copy, dst_category, &dst_segments)?;
            println!("{} {}", mode_label(outcome.mode), outcome.file);
        }
        Cmd::Rm { path } => {
            let (category, segments) = split_target(&path)?;
            store.remove(category, &segments)?;
        }
    }
    Ok(())
}

fn start_logging(config: &StoreConfig, level_override: Option<&str>) -> Result<(), CliError> {
    let (level, sink) = log_settings(config, level_override);
    init_logging(level, sink).map_err(CliError::Logging)
}

/// `--log-level`, then `[logging] level`; unset means a quiet stderr, or the
/// build default when a log directory is configured.
fn log_settings<'a>(
    config: &'a StoreConfig,
    level_override: Option<&'a str>,
) -> (&'a str, LogSink) {
    let level = level_override.or(config.log_level);
    match &config.log_dir {
        Some(dir) => (
            level.unwrap_or(default_log_level()),
            LogSink::Directory(dir.clone()),
        ),
        None => (level.unwrap_or(QUIET_LOG_LEVEL), LogSink::Stderr),
    }
}

fn parse_kind(value: &str) -> Result<DocumentKind, String> {
    DocumentKind::parse(value)
        .ok_or_else(|| format!("expected dashboard|row|panel, got `{value}`"))
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|segment| !segment.is_empty()).collect()
}

fn split_target(path: &str) -> Result<(&str, Vec<&str>), CliError> {
    let mut segments = split_path(path);
    if segments.is_empty() {
        return Err(CliError::Usage(format!("path `{path}` names no category")));
    }
    let category = segments.remove(0);
    Ok((category, segments))
}

/// Last name segment below the category (and kind, for templates).
fn default_name(category: &str, segments: &[&str]) -> Option<String> {
    let skip = match Category::parse(category) {
        Some(Category::Template) => 1,
        _ => 0,
    };
    segments.iter().skip(skip).last().map(|name| name.to_string())
}

fn mode_label(mode: SaveMode) -> &'static str {
    match mode {
        SaveMode::Created => "created",
        SaveMode::Merged => "merged",
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    std::fs::write(path, bytes).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}
