mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "actosc",
    about = "Forward VR input actions to avatar parameters over OSC",
    version,
    propagate_version = true
)]
struct Cli {
    /// Print every parameter value each tick
    #[arg(short, long)]
    debug: bool,

    /// OSC target address (overrides IP in the config)
    #[arg(short, long)]
    ip: Option<String>,

    /// OSC target port (overrides Port in the config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Config file (default: config.yaml next to the executable, else in the working directory)
    #[arg(long, global = true, env = "ACTOSC_CONFIG")]
    config: Option<PathBuf>,

    /// Read input from a YAML file of recorded frames instead of a live runtime
    #[arg(long, value_name = "PATH")]
    replay: Option<PathBuf>,

    /// Stop after this many ticks
    #[arg(long, value_name = "N")]
    ticks: Option<u64>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load, resolve and compile everything without sending
    Check,

    /// List the actions declared in the action manifest
    Actions,

    /// Write a starter config and action manifest
    Init,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let result = match cli.command {
        Some(Commands::Check) => cmd::check::run(&root::resolve_config(cli.config.as_deref()), cli.json),
        Some(Commands::Actions) => {
            cmd::actions::run(&root::resolve_config(cli.config.as_deref()), cli.json)
        }
        Some(Commands::Init) => cmd::init::run(&root::init_target(cli.config.as_deref())),
        None => cmd::run::run(
            &root::resolve_config(cli.config.as_deref()),
            cmd::run::RunOptions {
                debug: cli.debug,
                ip: cli.ip,
                port: cli.port,
                replay: cli.replay,
                ticks: cli.ticks,
            },
        ),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
