use anyhow::{Context, Result};
use log::{error, warn};
use std::path::PathBuf;
use std::process;

use tcollect::cli;
use tcollect::collect::{NodeRef, Session};
use tcollect::config::ConfigManager;
use tcollect::display::{self, CompactFormat};
use tcollect::hooks::HookRegistry;
use tcollect::logging::{self, LogConfig, LogDestination, LogFormat};

fn main() {
    match run() {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            error!("Application error: {}", e);
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    }
}

fn run() -> Result<i32> {
    let args = cli::parse_args();
    cli::validate_args(&args)?;

    let mut config_manager = match &args.config_file {
        Some(path) => ConfigManager::load_from_file(path.clone())?,
        None => ConfigManager::load()?,
    };
    if let Some(section) = &args.config_name {
        config_manager.select_section(section.clone());
    }

    let log_config = configure_logging(&args, &config_manager)?;
    logging::init_logger(log_config)?;

    let root = resolve_root_path(args.root.as_deref())?;
    let mut collect_config = config_manager.get_collect_config(root)?;
    collect_config.add_norecurse(args.norecurse.iter().cloned());
    for (key, value) in cli::parse_options(&args.option) {
        collect_config.options.insert(key, value);
    }

    let session = Session::new(collect_config, HookRegistry::new())
        .context("Failed to start collection session")?;

    let roots: Vec<NodeRef> = if args.select.is_empty() {
        vec![session.root()]
    } else {
        let mut selected = Vec::new();
        for id in &args.select {
            let nodes = session.getbyid(id);
            if nodes.is_empty() {
                warn!("No nodes matched id '{}'", id);
            }
            selected.extend(nodes);
        }
        selected
    };

    match args.format.to_lowercase().as_str() {
        "json" => {
            println!("{}", display::render_json(&session, &roots)?);
        }
        _ => {
            print!("{}", display::render_tree(&session, &roots));
            let reports = display::render_reports(&session);
            if !reports.is_empty() {
                println!();
                print!("{}", reports);
            }
            println!("{}", display::summarize(&session, &roots).to_compact_format());
        }
    }

    Ok(if session.reports().is_empty() { 0 } else { 1 })
}

/// Resolve the collection root without validating it; the session rejects
/// unusable roots itself
fn resolve_root_path(root_arg: Option<&str>) -> Result<PathBuf> {
    match root_arg {
        Some(path) => {
            let expanded_path = if path.starts_with('~') {
                if let Some(home_dir) = dirs::home_dir() {
                    home_dir.join(path.strip_prefix("~/").unwrap_or(&path[1..]))
                } else {
                    PathBuf::from(path)
                }
            } else {
                PathBuf::from(path)
            };

            expanded_path.canonicalize().or(Ok(expanded_path))
        }
        None => std::env::current_dir().context("Failed to get current directory"),
    }
}

/// Combine CLI flags and configuration into the logging setup
fn configure_logging(args: &cli::Args, config_manager: &ConfigManager) -> Result<LogConfig> {
    let console_level = if args.quiet {
        log::LevelFilter::Error
    } else if args.debug {
        log::LevelFilter::Trace
    } else if args.verbose {
        log::LevelFilter::Debug
    } else {
        config_manager
            .get_log_level("logging", "level")?
            .unwrap_or(log::LevelFilter::Info)
    };

    let log_file = args
        .log_file
        .clone()
        .or_else(|| config_manager.get_path("logging", "file"));

    let file_level = match &args.log_file_level {
        Some(level) => Some(logging::parse_log_level(level)?),
        None => match config_manager.get_log_level("logging", "file-level")? {
            Some(level) => Some(level),
            None if log_file.is_some() => Some(log::LevelFilter::Info),
            None => None,
        },
    };

    let format = args
        .log_format
        .parse::<LogFormat>()
        .map_err(|e| anyhow::anyhow!(e))?;

    let destination = match log_file {
        Some(path) => LogDestination::Both(path),
        None => LogDestination::Console,
    };

    Ok(LogConfig { console_level, file_level, format, destination })
}
