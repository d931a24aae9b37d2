use anyhow::Result;
use clap::Parser;
use log::{debug, info};
use std::path::PathBuf;

/// Test Discovery and Collection Tool
#[derive(Parser, Debug)]
#[command(name = "tcollect")]
#[command(about = "A fast test discovery engine that assembles addressable collection trees with pluggable resolution hooks")]
#[command(version)]
pub struct Args {
    /// Root directory to collect from (defaults to current directory)
    pub root: Option<String>,

    /// Collect only the subtrees addressed by these node ids
    #[arg(long, value_name = "ID")]
    pub select: Vec<String>,

    /// Additional do-not-recurse glob patterns
    #[arg(long, value_name = "PATTERN")]
    pub norecurse: Vec<String>,

    /// Configure-time option flags readable by hooks (KEY or KEY=VALUE)
    #[arg(long, value_name = "KEY[=VALUE]")]
    pub option: Vec<String>,

    /// Output format: text or json
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub format: String,

    /// Verbose output (debug level logging)
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet output (error level logging only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug output (trace level logging)
    #[arg(long)]
    pub debug: bool,

    /// Log format: text or json
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log file path for file output
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level for file output (independent of console level)
    #[arg(long, value_name = "LEVEL")]
    pub log_file_level: Option<String>,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Configuration section name
    #[arg(long, value_name = "SECTION")]
    pub config_name: Option<String>,
}

/// Parse command line arguments
pub fn parse_args() -> Args {
    debug!("Parsing command line arguments");
    let args = Args::parse();
    debug!("Parsed CLI arguments: {:?}", args);
    args
}

/// Validate CLI argument combinations
pub fn validate_args(args: &Args) -> Result<()> {
    debug!("Validating CLI argument combinations");

    let log_flags_count = [args.verbose, args.quiet, args.debug]
        .iter()
        .filter(|&&flag| flag)
        .count();

    if log_flags_count > 1 {
        return Err(anyhow::anyhow!(
            "Conflicting log level flags: only one of --verbose, --quiet, or --debug may be specified"
        ));
    }

    match args.format.to_lowercase().as_str() {
        "text" | "json" => {}
        _ => {
            return Err(anyhow::anyhow!(
                "Invalid output format '{}'. Valid options: text, json",
                args.format
            ))
        }
    }

    match args.log_format.to_lowercase().as_str() {
        "text" | "json" => {}
        _ => {
            return Err(anyhow::anyhow!(
                "Invalid log format '{}'. Valid options: text, json",
                args.log_format
            ))
        }
    }

    if let Some(ref level) = args.log_file_level {
        match level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            _ => {
                return Err(anyhow::anyhow!(
                    "Invalid log file level '{}'. Valid levels: error, warn, info, debug, trace",
                    level
                ))
            }
        }
    }

    if args.log_file_level.is_some() && args.log_file.is_none() {
        return Err(anyhow::anyhow!("--log-file-level requires --log-file to be specified"));
    }

    for option in &args.option {
        let key = option.split('=').next().unwrap_or("");
        if key.is_empty() {
            return Err(anyhow::anyhow!(
                "Invalid option '{}': expected KEY or KEY=VALUE",
                option
            ));
        }
    }

    info!("CLI arguments validated successfully");
    Ok(())
}

/// Parse --option values into key/value pairs; a bare KEY means "true"
pub fn parse_options(options: &[String]) -> Vec<(String, String)> {
    options
        .iter()
        .map(|option| match option.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (option.clone(), "true".to_string()),
        })
        .collect()
}
