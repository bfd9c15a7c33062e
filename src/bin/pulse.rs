//! Pulse CLI - Command-line interface for ChatPulse
//!
//! Commands:
//! - analyze: Run the full analysis and print the report payload
//! - parse: Dump the parsed transcript event model
//! - config: Print the default analysis configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use chatpulse::encoder::ReportEncoder;
use chatpulse::{
    parse_transcript, AnalysisConfig, AnalysisError, ChatAnalyzer, PRODUCER_NAME, PULSE_VERSION,
};

/// Pulse - Relationship analytics over exported chat transcripts
#[derive(Parser)]
#[command(name = "pulse")]
#[command(version = PULSE_VERSION)]
#[command(about = "Analyze exported chat transcripts", long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a transcript and print the report payload
    Analyze {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        format: OutputFormat,

        /// Load analysis configuration from a JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Fraction below baseline that marks a day as low
        #[arg(long)]
        drop_threshold: Option<f64>,

        /// Minimum run of low days reported as a lull
        #[arg(long)]
        min_days: Option<usize>,

        /// Trailing baseline window in days
        #[arg(long)]
        baseline_window: Option<usize>,

        /// Skip the first conversation excerpt
        #[arg(long)]
        no_first_conversation: bool,

        /// Skip heatmap, trend and bedtime analysis
        #[arg(long)]
        no_time_patterns: bool,
    },

    /// Parse a transcript and print the event model
    Parse {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        format: OutputFormat,
    },

    /// Print the default analysis configuration
    Config,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

/// Analysis overrides collected from the command line
struct AnalyzeOptions {
    config: Option<PathBuf>,
    drop_threshold: Option<f64>,
    min_days: Option<usize>,
    baseline_window: Option<usize>,
    no_first_conversation: bool,
    no_time_patterns: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let error = serde_json::to_string(&CliError::from(e))
                .unwrap_or_else(|_| "Unknown error".to_string());
            eprintln!("{}", error);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr so stdout stays machine-readable
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), PulseCliError> {
    match cli.command {
        Commands::Analyze {
            input,
            output,
            format,
            config,
            drop_threshold,
            min_days,
            baseline_window,
            no_first_conversation,
            no_time_patterns,
        } => {
            let options = AnalyzeOptions {
                config,
                drop_threshold,
                min_days,
                baseline_window,
                no_first_conversation,
                no_time_patterns,
            };
            cmd_analyze(&input, &output, &format, options)
        }
        Commands::Parse {
            input,
            output,
            format,
        } => cmd_parse(&input, &output, &format),
        Commands::Config => cmd_config(),
    }
}

fn cmd_analyze(
    input: &Path,
    output: &Path,
    format: &OutputFormat,
    options: AnalyzeOptions,
) -> Result<(), PulseCliError> {
    let config = resolve_config(&options)?;
    let text = read_input(input)?;

    let transcript = parse_transcript(&text);
    let analyzer = ChatAnalyzer::with_config(config)?;
    let report = analyzer.analyze_parsed(&transcript)?;

    let payload = ReportEncoder::new().encode(&transcript, report)?;
    write_output(output, &format_output(&payload, format)?)
}

fn cmd_parse(input: &Path, output: &Path, format: &OutputFormat) -> Result<(), PulseCliError> {
    let text = read_input(input)?;
    let transcript = parse_transcript(&text);
    if transcript.is_empty() {
        warn!("transcript produced no messages");
    }
    write_output(output, &format_output(&transcript, format)?)
}

fn cmd_config() -> Result<(), PulseCliError> {
    println!("{}", AnalysisConfig::default().to_json()?);
    Ok(())
}

// Helper functions

/// Config file first, then per-parameter overrides
fn resolve_config(options: &AnalyzeOptions) -> Result<AnalysisConfig, PulseCliError> {
    let mut config = match &options.config {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            serde_json::from_str::<AnalysisConfig>(&fs::read_to_string(path)?)?
        }
        None => AnalysisConfig::default(),
    };

    if let Some(threshold) = options.drop_threshold {
        config.lull.drop_threshold = threshold;
    }
    if let Some(days) = options.min_days {
        config.lull.min_days = days;
    }
    if let Some(window) = options.baseline_window {
        config.lull.baseline_window = window;
    }
    if options.no_first_conversation {
        config.first_conversation = false;
    }
    if options.no_time_patterns {
        config.time_patterns = false;
    }

    config.validate()?;
    Ok(config)
}

fn read_input(input: &Path) -> Result<String, PulseCliError> {
    if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            warn!("reading transcript from an interactive terminal; end input with Ctrl-D");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output(output: &Path, data: &str) -> Result<(), PulseCliError> {
    if output.to_string_lossy() == "-" {
        println!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

fn format_output<T: serde::Serialize>(
    value: &T,
    format: &OutputFormat,
) -> Result<String, PulseCliError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(value)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
    }
}

#[derive(Debug)]
enum PulseCliError {
    Io(io::Error),
    Analysis(AnalysisError),
    Json(serde_json::Error),
}

impl From<io::Error> for PulseCliError {
    fn from(e: io::Error) -> Self {
        PulseCliError::Io(e)
    }
}

impl From<AnalysisError> for PulseCliError {
    fn from(e: AnalysisError) -> Self {
        PulseCliError::Analysis(e)
    }
}

impl From<serde_json::Error> for PulseCliError {
    fn from(e: serde_json::Error) -> Self {
        PulseCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<PulseCliError> for CliError {
    fn from(e: PulseCliError) -> Self {
        match e {
            PulseCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            PulseCliError::Analysis(AnalysisError::NoMessages) => CliError {
                code: "NO_MESSAGES".to_string(),
                message: AnalysisError::NoMessages.to_string(),
                hint: Some(
                    "Ensure the input is a chat export with date headers; try 'pulse parse'"
                        .to_string(),
                ),
            },
            PulseCliError::Analysis(e @ AnalysisError::InvalidConfig(_)) => CliError {
                code: "INVALID_CONFIG".to_string(),
                message: e.to_string(),
                hint: Some("Run 'pulse config' to see the defaults".to_string()),
            },
            PulseCliError::Analysis(e) => CliError {
                code: "ANALYSIS_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            PulseCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some(format!("Check the {} config JSON syntax", PRODUCER_NAME)),
            },
        }
    }
}
