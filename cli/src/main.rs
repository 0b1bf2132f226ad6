use clap::{ArgGroup, Parser};
use etherwake_core::{config, privilege, Action, Scope, Settings};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, registry};

/// Send Wake-on-LAN triggers to nodes listed in the etherwake config.
#[derive(Debug, Parser)]
#[command(name = "etherwake", version, about)]
#[command(group(ArgGroup::new("targets").required(true).multiple(true).args(["all", "nodes"])))]
struct Cli {
    /// On/off/reset all nodes; wins over `-w`.
    #[arg(short, long)]
    all: bool,
    /// Configuration file (default: <ldir>/etc/etherwake.conf).
    #[arg(short, long, value_name = "CONF")]
    config: Option<PathBuf>,
    /// Fanout for parallelism; accepted for compatibility, sends are sequential.
    #[arg(short, long, value_name = "FAN")]
    fanout: Option<usize>,
    /// Powerman library directory (default: /usr/lib/powerman).
    #[arg(short = 'l', long, value_name = "LDIR")]
    libdir: Option<PathBuf>,
    /// Be quiet about any errors that may have occurred.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
    /// Report skipped nodes and every helper invocation.
    #[arg(short, long)]
    verbose: bool,
    /// Comma separated list of nodes, or `-` to read them from stdin.
    #[arg(short = 'w', long, value_name = "NODES")]
    nodes: Option<String>,
    /// TOML file with default paths and timings.
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,
    /// on, off or reset.
    #[arg(default_value = "on")]
    action: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let quiet = cli.quiet;
    init_log(cli.quiet, cli.verbose);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if !quiet {
                eprintln!("etherwake: {err}");
            }
            ExitCode::FAILURE
        }
    }
}

fn init_log(quiet: bool, verbose: bool) {
    let env_filter = if quiet {
        EnvFilter::new("off")
    } else {
        let level = if verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
        EnvFilter::builder()
            .with_default_directive(level.into())
            .from_env_lossy()
    };
    registry()
        .with(
            fmt::Layer::default()
                .without_time()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .with(env_filter)
        .init();
}

fn execute(cli: Cli) -> etherwake_core::Result<()> {
    privilege::ensure_root()?;
    let settings = build_settings(cli)?;
    let report = etherwake_core::run(&settings)?;
    if !report.failed.is_empty() {
        tracing::warn!(
            "{} of {} triggers failed",
            report.failed.len(),
            report.attempts()
        );
    }
    Ok(())
}

fn build_settings(cli: Cli) -> etherwake_core::Result<Settings> {
    let action: Action = cli.action.parse()?;

    let mut settings = Settings::default();
    if let Some(path) = &cli.settings {
        settings.apply_file(config::load_settings_file(path)?);
    }
    settings.apply_env_library_dir(std::env::var_os(config::LIBRARY_DIR_ENV));
    if let Some(dir) = cli.libdir {
        settings.library_dir = dir;
    }
    if let Some(conf) = cli.config {
        settings.config_file = conf;
    }
    if let Some(fanout) = cli.fanout {
        settings.fanout = fanout;
    }
    settings.action = action;
    settings.scope = if cli.all {
        Scope::All
    } else {
        match cli.nodes.as_deref() {
            Some("-") => Scope::Nodes(read_node_names(io::stdin().lock())?),
            Some(list) => Scope::Nodes(split_node_list(list)),
            None => Scope::Nodes(Vec::new()),
        }
    };
    Ok(settings)
}

fn split_node_list(list: &str) -> Vec<String> {
    list.split(',')
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// One node name per line; blank lines are dropped.
fn read_node_names(reader: impl BufRead) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let name = line.trim_end_matches('\r');
        if !name.is_empty() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}
