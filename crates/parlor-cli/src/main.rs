//! Command-line tool for parlor IRC client extensions.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use parking_lot::Mutex;
use parlor_core::client::shared;
use parlor_core::config::env_vars;
use parlor_core::extension::discover;
use parlor_core::host::api::entry_points;
use parlor_core::{ExtensionHost, ExtensionInfo, HostConfig, MemoryClient, Severity};

/// Inspect, discover and load parlor extensions.
#[derive(Parser, Debug)]
#[command(name = "parlor")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Activate and deactivate extension objects, reporting their metadata.
    Inspect {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// List extension objects in a directory.
    Discover { dir: PathBuf },
    /// Load the configured extension set against an offline client.
    Load {
        /// Config file (default: <config dir>/parlor/extensions.toml).
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Network the offline client pretends to be connected to.
        #[arg(long, default_value = "local")]
        network: String,
        /// Own nick on that network.
        #[arg(long, default_value = "parlor")]
        nick: String,
    },
    /// List the host API symbols exported to extensions.
    Symbols,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    match args.command {
        Command::Inspect { paths } => inspect(&paths, args.json),
        Command::Discover { dir } => discover_dir(&dir, args.json),
        Command::Load {
            config,
            network,
            nick,
        } => load(config, &network, &nick, args.json),
        Command::Symbols => {
            for (name, _) in entry_points() {
                println!("{name}");
            }
            Ok(())
        }
    }
}

fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("parlor=info,parlor_core=info"));

    if env_vars::log_json() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}

fn print_infos(infos: &[ExtensionInfo], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(infos)?);
        return Ok(());
    }
    for info in infos {
        println!("{:<20} {:<10} {}", info.name, info.version, info.path.display());
    }
    Ok(())
}

fn inspect(paths: &[PathBuf], json: bool) -> Result<()> {
    let memory = Arc::new(Mutex::new(MemoryClient::new()));
    let mut host = ExtensionHost::new(memory.clone());
    let mut inspected = Vec::new();
    let mut failures = 0;

    for path in paths {
        match host.activate(path) {
            Ok(id) => {
                let module = host.registry().get(id)?;
                let hooks: Vec<&str> = [
                    (module.has_message_hook(), "message"),
                    (module.has_command_hook(), "command"),
                    (module.has_chat_hook(), "chat"),
                ]
                .into_iter()
                .filter_map(|(present, name)| present.then_some(name))
                .collect();
                let session = module.has_session();
                let info = host.deactivate(id)?;

                if !json {
                    println!("Extension: {}", info.name);
                    println!("  Version: {}", info.version);
                    println!("  Path:    {}", info.path.display());
                    println!("  Hooks:   {}", hooks.join(", "));
                    println!("  Session: {}", if session { "yes" } else { "no" });
                }
                inspected.push(info);
            }
            Err(e) => {
                failures += 1;
                eprintln!("{}: FAILED: {e}", path.display());
            }
        }
    }

    drop(host);
    if json {
        print_infos(&inspected, true)?;
    } else {
        for (severity, line) in memory.lock().printed() {
            match severity {
                Severity::Normal => println!("  | {line}"),
                Severity::Error => println!("  | error: {line}"),
            }
        }
    }
    if failures > 0 {
        anyhow::bail!("{failures} of {} extension(s) failed to load", paths.len());
    }
    Ok(())
}

fn discover_dir(dir: &Path, json: bool) -> Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Not a directory: {}", dir.display());
    }
    let found = discover(dir);
    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
    } else if found.is_empty() {
        println!("No extensions found in {}", dir.display());
    } else {
        for path in found {
            println!("{}", path.display());
        }
    }
    Ok(())
}

fn load(config: Option<PathBuf>, network: &str, nick: &str, json: bool) -> Result<()> {
    let config = match config.or_else(HostConfig::default_path) {
        Some(path) if path.exists() => HostConfig::from_file(&path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        Some(path) => {
            tracing::info!(path = %path.display(), "No config file, using environment only");
            HostConfig::default()
        }
        None => HostConfig::default(),
    };

    let client = shared(MemoryClient::new().with_network(network, nick));
    let mut host = ExtensionHost::new(client);
    let report = host.load_configured(&config);

    print_infos(&host.extensions(), json)?;
    for (path, e) in &report.failed {
        eprintln!("{}: FAILED: {e}", path.display());
    }
    host.shutdown();

    if !report.is_clean() {
        anyhow::bail!("{} extension(s) failed to load", report.failed.len());
    }
    Ok(())
}
