//! main - loads the user plane configuration and keeps each subscriber's data path graph

use anyhow::Result;
use async_std::channel::Sender;
use async_std::prelude::*;
use clap::Parser;
use qsmf::{Config, Smf};
use signal_hook::consts::signal::*;
use signal_hook_async_std::Signals;
use slog::{Drain, Logger, info, o, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML file listing the UPFs, keyed by name, each with its node_ip and an
    /// optional id.
    #[arg(long, default_value = "upf.toml")]
    upf_file: String,

    /// TOML file of preconfigured routing paths, keyed by SUPI ("imsi-...").  Each
    /// path lists its UPFs head first, plus destination_ip and destination_port.
    #[arg(long, default_value = "ue_routing.toml")]
    routing_file: String,
}

#[async_std::main]
async fn main() -> Result<()> {
    exit_on_panic();
    let logger = init_logging();

    let args = Args::parse();
    let config = Config {
        upf_file: args.upf_file,
        routing_file: args.routing_file,
    };

    let smf = Smf::start(&config, logger.clone())?;
    info!(&logger, "Serving {} subscriber data paths", smf.graph_count());

    wait_for_shutdown(&smf, &config, &logger).await?;
    info!(&logger, "Shutting down");
    Ok(())
}

fn init_logging() -> Logger {
    // Use info level logging by default
    if std::env::var("RUST_LOG").is_err() {
        unsafe { std::env::set_var("RUST_LOG", "info") }
    }
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let drain = slog_envlogger::new(drain);
    slog::Logger::root(drain, o!())
}

fn exit_on_panic() {
    let orig_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        orig_hook(panic_info);
        std::process::exit(1);
    }));
}

async fn wait_for_shutdown(smf: &Smf, config: &Config, logger: &Logger) -> Result<()> {
    let signals = Signals::new([SIGHUP, SIGTERM, SIGINT, SIGQUIT])?;
    let handle = signals.handle();
    let (sig_sender, sig_receiver) = async_std::channel::unbounded();
    let signals_task = async_std::task::spawn(handle_signals(signals, sig_sender));

    while let Ok(signal) = sig_receiver.recv().await {
        if signal != SIGHUP {
            break;
        }
        info!(logger, "SIGHUP - reloading {} and {}", config.upf_file, config.routing_file);
        if let Err(e) = smf.reload_from_files(config) {
            // Keep serving the graphs built from the previous configuration.
            warn!(logger, "Reload failed - {e}");
        }
    }

    handle.close();
    signals_task.await;
    Ok(())
}

async fn handle_signals(signals: Signals, sig_sender: Sender<i32>) {
    let mut signals = signals.fuse();
    while let Some(signal) = signals.next().await {
        match signal {
            SIGHUP | SIGTERM | SIGINT | SIGQUIT => {
                let _ = sig_sender.send(signal).await;
            }
            _ => unreachable!(),
        }
    }
}
