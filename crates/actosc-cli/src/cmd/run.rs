use crate::output;
use actosc_core::config::Config;
use actosc_core::dispatch::UdpSink;
use actosc_core::replay::ReplayRuntime;
use actosc_core::report;
use actosc_core::session::Session;
use anyhow::Context;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

const TICK_INTERVAL: Duration = Duration::from_millis(5);

/// Console row the debug dump is redrawn from.
const DEBUG_ROW: u16 = 10;

pub struct RunOptions {
    pub debug: bool,
    pub ip: Option<String>,
    pub port: Option<u16>,
    pub replay: Option<PathBuf>,
    pub ticks: Option<u64>,
}

pub fn run(config_path: &Path, opts: RunOptions) -> anyhow::Result<()> {
    let config = Config::load(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?
        .with_endpoint(opts.ip, opts.port);

    let runtime = match &opts.replay {
        Some(path) => ReplayRuntime::load(path)
            .with_context(|| format!("failed to load replay frames from {}", path.display()))?,
        None => {
            warn!("no input runtime attached; every action reads idle (use --replay to feed frames)");
            ReplayRuntime::idle()
        }
    };

    let manifest_path = config.manifest_path(config_path);
    let mut session = Session::start(&config, &manifest_path, runtime, |c| {
        UdpSink::connect(&c.ip, c.port)
    })
    .context("failed to start")?;

    output::set_title("actosc");
    output::clear_screen();
    println!("actosc running...\n");
    println!("IP:\t\t{}", config.ip);
    println!("Port:\t\t{}", config.port);
    println!("\nYou can minimize this window.");
    println!("\nPress CTRL + C to exit or just close the window.");

    let name_width = session.parameters().max_name_len();
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    rt.block_on(async {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        let mut remaining = opts.ticks;

        loop {
            if remaining == Some(0) {
                break;
            }
            let messages = session.tick()?;
            if opts.debug {
                output::move_cursor(DEBUG_ROW, 1);
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(report::render(&messages, name_width).as_bytes())?;
                stdout.flush()?;
            }
            remaining = remaining.map(|n| n - 1);
            if remaining == Some(0) {
                break;
            }

            tokio::select! {
                _ = &mut ctrl_c => {
                    output::clear_screen();
                    info!("interrupted");
                    break;
                }
                _ = tokio::time::sleep(TICK_INTERVAL) => {}
            }
        }
        Ok::<(), anyhow::Error>(())
    })
}
