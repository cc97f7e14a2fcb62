use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use chat_analyzer::analysis::{AnalysisKind, AnalysisRequest, Analyzer};
use chat_analyzer::cache::{load_chat, ChatCache, LoadedChat};
use chat_analyzer::config::AppConfig;
use chat_analyzer::error::ChatAnalyzerError;
use chat_analyzer::file_writer::write_messages_to_file;
use chat_analyzer::logging::{init_logging, OperationTimer};
use chat_analyzer::metrics::{MetricsCollector, MetricsTimer};
use chat_analyzer::models::{DateRange, OutputFormat, UserSelection};
use chat_analyzer::parser::ChatParser;
use chat_analyzer::validation::InputValidator;

#[derive(Parser)]
#[command(author, version, about = "Analyze WhatsApp chat exports", long_about = None)]
struct Cli {
    /// Configuration file layered over the defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Parse the export even when a cached result exists
    #[arg(long, global = true)]
    no_cache: bool,

    /// How results are printed on stdout
    #[arg(long, global = true, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List the users of a chat export
    Users {
        /// WhatsApp chat export (.txt)
        file: PathBuf,

        /// Case-insensitive filter on user names
        #[arg(short, long, default_value = "")]
        search: String,
    },
    /// Run one analysis on a chat export
    Analyze {
        /// WhatsApp chat export (.txt)
        file: PathBuf,

        /// stats, sentiment, nlp, compare, activity, words or timeline
        #[arg(short, long, default_value = "stats")]
        kind: AnalysisKind,

        /// User to analyze (all users if not specified)
        #[arg(short, long)]
        user: Option<String>,

        /// Start date for message range (YYYY-MM-DD)
        #[arg(short, long)]
        start: Option<String>,

        /// End date for message range (YYYY-MM-DD)
        #[arg(short, long)]
        end: Option<String>,
    },
    /// Compare message counts between users
    Compare {
        /// WhatsApp chat export (.txt)
        file: PathBuf,

        /// Users to compare, comma separated (all users if not specified)
        #[arg(short, long, value_delimiter = ',')]
        users: Vec<String>,

        /// Start date for message range (YYYY-MM-DD)
        #[arg(short, long)]
        start: Option<String>,

        /// End date for message range (YYYY-MM-DD)
        #[arg(short, long)]
        end: Option<String>,
    },
    /// Write the parsed messages to a file
    Export {
        /// WhatsApp chat export (.txt)
        file: PathBuf,

        /// Output file; relative paths land in `export.output_directory`
        #[arg(short, long)]
        output: PathBuf,

        /// Output format (txt, csv or json)
        #[arg(long = "as")]
        output_format: Option<OutputFormat>,

        /// Only export messages of this user
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Manage the parsed-export cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Inspect the effective configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Remove every cached export
    Clear,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as YAML
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load(cli.config.as_deref())?;

    // Initialize logging
    let log_level = cli.log_level.clone().unwrap_or_else(|| config.get_log_level());
    let _guard = init_logging(
        Some(&log_level),
        &config.logging.format,
        config.logging.file_path.as_deref().map(Path::new),
    )?;

    if let Err(e) = MetricsCollector::init() {
        debug!("Metrics recorder not installed: {e}");
    }
    let mut metrics = MetricsCollector::default();

    info!("Starting chat-analyzer");

    let result = run(&cli, &config, &mut metrics);
    if let Err(e) = &result {
        metrics.record_error(error_type(e), command_name(&cli.command));
    }
    metrics.log_summary();
    result
}

fn run(cli: &Cli, config: &AppConfig, metrics: &mut MetricsCollector) -> Result<()> {
    match &cli.command {
        Commands::Users { file, search } => {
            let chat = load(cli, config, metrics, file)?;
            let users = chat.records.user_options(&InputValidator::sanitize_text(search));
            print_output(cli.format, &users, || users.join("\n"))
        },
        Commands::Analyze {
            file,
            kind,
            user,
            start,
            end,
        } => {
            let range = DateRange::parse(start.as_deref(), end.as_deref())?;
            InputValidator::validate_date_range(&range)?;
            if let Some(name) = user {
                InputValidator::validate_user_name(name)?;
            }

            let chat = load(cli, config, metrics, file)?;
            let request = AnalysisRequest {
                kind: *kind,
                selection: UserSelection::from_option(user.as_deref()),
                range,
                compare_users: Vec::new(),
            };
            analyze(cli.format, config, metrics, &chat, &request)
        },
        Commands::Compare {
            file,
            users,
            start,
            end,
        } => {
            let range = DateRange::parse(start.as_deref(), end.as_deref())?;
            InputValidator::validate_date_range(&range)?;
            for name in users {
                InputValidator::validate_user_name(name)?;
            }

            let chat = load(cli, config, metrics, file)?;
            let request = AnalysisRequest {
                compare_users: users.iter().map(|u| u.trim().to_string()).collect(),
                range,
                ..AnalysisRequest::new(AnalysisKind::Comparative)
            };
            analyze(cli.format, config, metrics, &chat, &request)
        },
        Commands::Export {
            file,
            output,
            output_format,
            user,
        } => export(cli, config, metrics, file, output, *output_format, user.as_deref()),
        Commands::Cache {
            action: CacheAction::Clear,
        } => {
            let cache = ChatCache::open(&config.cache_dir())?;
            let entries = cache.len();
            cache.clear()?;
            info!(entries, directory = %config.cache_dir().display(), "Cache cleared");
            print_output(cli.format, &serde_json::json!({ "cleared": entries }), || {
                format!("Removed {entries} cached exports")
            })
        },
        Commands::Config {
            action: ConfigAction::Show,
        } => {
            let mut stdout = std::io::stdout().lock();
            write!(stdout, "{}", config.to_yaml()?)?;
            Ok(())
        },
    }
}

/// Read, parse and memoize a chat export
fn load(cli: &Cli, config: &AppConfig, metrics: &mut MetricsCollector, file: &Path) -> Result<LoadedChat> {
    InputValidator::validate_chat_path(file)?;

    let parser = ChatParser::new(&config.parser)?;
    let cache = if config.cache.enabled && !cli.no_cache {
        match ChatCache::open(&config.cache_dir()) {
            Ok(cache) => Some(cache),
            Err(e) => {
                warn!(error = %e, "Cache unavailable, parsing without it");
                None
            },
        }
    } else {
        None
    };

    let timer = OperationTimer::new("load_chat");
    let started = Instant::now();
    let content = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;

    let chat = match load_chat(&content, &parser, cache.as_ref()) {
        Ok(chat) => chat,
        Err(ChatAnalyzerError::EmptyChat { skipped }) => {
            warn!(skipped, "No messages found; is this a WhatsApp export?");
            return Err(ChatAnalyzerError::EmptyChat { skipped }.into());
        },
        Err(e) => return Err(e).with_context(|| format!("Failed to load {}", file.display())),
    };
    let elapsed = timer.finish();
    debug!(?elapsed, "Chat export ready");

    if cache.is_some() {
        metrics.record_cache_lookup(chat.from_cache);
    }
    if !chat.from_cache {
        metrics.record_parse(chat.records.len(), chat.skipped_lines, started.elapsed());
    }
    if chat.skipped_lines > 0 {
        warn!(skipped_lines = chat.skipped_lines, "Skipped malformed lines");
    }
    if let Some((first, last)) = chat.records.date_bounds() {
        debug!(%first, %last, "Chat date bounds");
    }
    info!(
        messages = chat.records.len(),
        users = chat.records.users().len(),
        from_cache = chat.from_cache,
        "Chat loaded"
    );
    Ok(chat)
}

fn analyze(
    format: ReportFormat, config: &AppConfig, metrics: &mut MetricsCollector, chat: &LoadedChat,
    request: &AnalysisRequest,
) -> Result<()> {
    let analyzer = Analyzer::new(&chat.records, &config.analysis)?;
    let rows = analyzer.view(&request.selection, &request.range)?.len();

    let timer = MetricsTimer::new(&request.kind.to_string());
    let report = analyzer.run(request)?;
    let duration = timer.finish_analysis(metrics, rows);
    debug!(kind = %request.kind, rows, ?duration, "Analysis finished");

    print_output(format, &report, || report.to_string())
}

fn export(
    cli: &Cli, config: &AppConfig, metrics: &mut MetricsCollector, file: &Path, output: &Path,
    output_format: Option<OutputFormat>, user: Option<&str>,
) -> Result<()> {
    let output = config.resolve_output(output);
    let output = output.as_path();
    InputValidator::validate_output_path(output)?;

    let format = match output_format {
        Some(format) => format,
        None => output
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or(config.export.default_format.as_str())
            .parse::<OutputFormat>()
            .or_else(|_| config.export.default_format.parse::<OutputFormat>())?,
    };

    let chat = load(cli, config, metrics, file)?;
    let selection = UserSelection::from_option(user);
    let view = chat.records.select(&selection)?;

    let bytes = write_messages_to_file(view.iter(), format, output)?;
    metrics.record_export(format.extension(), view.len(), bytes);
    info!(
        messages = view.len(),
        bytes,
        path = %output.display(),
        format = format.extension(),
        "Export complete"
    );

    print_output(
        cli.format,
        &serde_json::json!({ "path": output, "messages": view.len(), "bytes": bytes }),
        || format!("Wrote {} messages ({bytes} bytes) to {}", view.len(), output.display()),
    )
}

/// Print `value` as JSON or its text rendering
fn print_output<T: Serialize>(format: ReportFormat, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    match format {
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut stdout, value)?;
            writeln!(stdout)?;
        },
        ReportFormat::Text => writeln!(stdout, "{}", text())?,
    }
    Ok(())
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Users { .. } => "users",
        Commands::Analyze { .. } => "analyze",
        Commands::Compare { .. } => "compare",
        Commands::Export { .. } => "export",
        Commands::Cache { .. } => "cache",
        Commands::Config { .. } => "config",
    }
}

fn error_type(error: &anyhow::Error) -> &'static str {
    match error.downcast_ref::<ChatAnalyzerError>() {
        Some(ChatAnalyzerError::Io(_)) => "io",
        Some(ChatAnalyzerError::Utf8(_)) => "utf8",
        Some(ChatAnalyzerError::EmptyChat { .. }) => "empty_chat",
        Some(ChatAnalyzerError::UnknownUser(_)) => "unknown_user",
        Some(ChatAnalyzerError::InvalidDate(_)) => "invalid_date",
        Some(ChatAnalyzerError::Cache(_)) => "cache",
        Some(_) => "library",
        None => "other",
    }
}
