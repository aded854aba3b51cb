//! `clicktrail` - CLI for the clicktrail tracker
//!
//! Replays recorded host events, checks collection endpoints and inspects
//! configuration.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::warn;

use clicktrail::cli::replay::{read_host_events, replay};
use clicktrail::cli::{Cli, Command, ConfigCommand, PingCommand, ReplayCommand};
use clicktrail::config::Mode;
use clicktrail::event::{
    ErrorDraft, ErrorEvent, ErrorType, InteractionDraft, InteractionEvent, InteractionType,
    Viewport,
};
use clicktrail::transport::{Channel, HttpTransport, Transport};
use clicktrail::{init_logging, AnalyticsSummary, Config};

const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config =
        Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    match cli.command {
        Command::Replay(cmd) => handle_replay(config, &cmd).await,
        Command::Ping(cmd) => handle_ping(&config, &cmd).await,
        Command::Status(cmd) => handle_status(&config, cli.config.as_deref(), cmd.json),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

async fn handle_replay(mut config: Config, cmd: &ReplayCommand) -> Result<()> {
    let mut events = if cmd.file == Path::new("-") {
        read_host_events(io::stdin().lock())?
    } else {
        let file = File::open(&cmd.file)
            .with_context(|| format!("failed to open {}", cmd.file.display()))?;
        read_host_events(BufReader::new(file))?
    };
    if let Some(limit) = cmd.limit {
        events.truncate(limit);
    }
    if cmd.dry_run {
        config.tracker.mode = Mode::Development;
    }

    let replayed = events.len();
    let tracker = replay(config, events);
    if tracker.status().mode == Mode::Production && !tracker.flush(FLUSH_TIMEOUT).await {
        warn!(
            pending = tracker.status().pending_deliveries,
            "Gave up waiting for deliveries"
        );
    }

    let summary = tracker.analytics_summary();
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(replayed, &summary);
    }
    Ok(())
}

fn print_summary(replayed: usize, summary: &AnalyticsSummary) {
    println!("Replay Summary");
    println!("==============");
    println!("Host events:        {replayed}");
    println!("Interactions:       {}", summary.total_interactions);
    println!("Errors:             {}", summary.total_errors);

    if !summary.interaction_types.is_empty() {
        println!();
        println!("[Interactions by type]");
        for (kind, count) in &summary.interaction_types {
            println!("  {:<18}{count}", kind.to_string());
        }
    }
    if !summary.element_counts.is_empty() {
        println!();
        println!("[Interactions by element]");
        for (element, count) in &summary.element_counts {
            println!("  {element:<18}{count}");
        }
    }
    if !summary.error_types.is_empty() {
        println!();
        println!("[Errors by type]");
        for (kind, count) in &summary.error_types {
            println!("  {:<18}{count}", kind.to_string());
        }
    }
    if !summary.recent_errors.is_empty() {
        println!();
        println!("[Recent errors]");
        for error in &summary.recent_errors {
            println!(
                "  {} {}: {}",
                error.timestamp.format("%H:%M:%S"),
                error.kind,
                error.message
            );
        }
    }
}

async fn handle_ping(config: &Config, cmd: &PingCommand) -> Result<()> {
    let transport = HttpTransport::from_config(config);
    let page = config.host.page.clone();

    let (channel, payload) = if cmd.errors {
        let event = ErrorEvent::stamp(
            ErrorDraft::new(ErrorType::User, "clicktrail ping").element("ping"),
            page,
            Utc::now(),
        );
        (Channel::Errors, serde_json::to_value(event)?)
    } else {
        let event = InteractionEvent::stamp(
            InteractionDraft::new(InteractionType::Load, "ping").success(true),
            page,
            Utc::now(),
            config.host.user_agent.clone(),
            Viewport {
                width: config.host.viewport_width,
                height: config.host.viewport_height,
            },
        );
        (Channel::Interactions, serde_json::to_value(event)?)
    };

    let url = transport.url(channel).to_string();
    transport
        .deliver(channel, &payload)
        .await
        .with_context(|| format!("ping to {url} failed"))?;
    println!("{channel} endpoint OK: {url}");
    Ok(())
}

fn handle_status(config: &Config, config_override: Option<&Path>, json: bool) -> Result<()> {
    let config_path =
        config_override.map_or_else(Config::default_config_path, Path::to_path_buf);

    if json {
        let status = serde_json::json!({
            "mode": config.tracker.mode,
            "interactions_url": config.interactions_url(),
            "errors_url": config.errors_url(),
            "max_events": config.tracker.max_events,
            "recent_limit": config.tracker.recent_limit,
            "config_path": config_path,
            "config_file_exists": config_path.exists(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("clicktrail status");
        println!("-----------------");
        println!("Mode:          {}", config.tracker.mode);
        println!("Interactions:  {}", config.interactions_url());
        println!("Errors:        {}", config.errors_url());
        println!("Buffer size:   {} per kind", config.tracker.max_events);
        println!("Recent limit:  {}", config.tracker.recent_limit);
        let missing = if config_path.exists() {
            ""
        } else {
            " (not found, using defaults)"
        };
        println!("Config:        {}{missing}", config_path.display());
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                print_config(config);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => {
                    println!("Configuration error: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
    Ok(())
}

fn print_config(config: &Config) {
    println!("Current Configuration");
    println!("=====================");
    println!();
    println!("[Tracker]");
    println!("  Mode:               {}", config.tracker.mode);
    println!("  Max events:         {}", config.tracker.max_events);
    println!("  Recent limit:       {}", config.tracker.recent_limit);
    println!();
    println!("[Endpoints]");
    println!("  Interactions:       {}", config.interactions_url());
    println!("  Errors:             {}", config.errors_url());
    match config.timeout() {
        Some(timeout) => println!("  Timeout:            {}ms", timeout.as_millis()),
        None => println!("  Timeout:            client default"),
    }
    println!();
    println!("[Privacy]");
    println!(
        "  Sensitive fields:   {}",
        config.privacy.sensitive_field_patterns.join(", ")
    );
    println!("  Redaction marker:   {}", config.privacy.redaction_marker);
    println!("  Max value length:   {}", config.privacy.max_value_length);
    println!("  Max text length:    {}", config.privacy.max_text_length);
    println!();
    println!("[Capture]");
    let capture = &config.capture;
    for (name, enabled) in [
        ("Clicks", capture.clicks),
        ("Inputs", capture.inputs),
        ("Submits", capture.submits),
        ("Focus/blur", capture.focus),
        ("Navigation", capture.navigation),
        ("Loads", capture.loads),
        ("Errors", capture.errors),
        ("HTTP", capture.http),
    ] {
        println!("  {:<20}{enabled}", format!("{name}:"));
    }
    println!();
    println!("[Host]");
    println!("  Page:               {}", config.host.page);
    println!("  User agent:         {}", config.host.user_agent);
    println!(
        "  Viewport:           {}x{}",
        config.host.viewport_width, config.host.viewport_height
    );
}
