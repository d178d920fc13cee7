// Author: Dustin Pilgrim
// License: MIT

mod cli;
mod config;
mod core;
mod daemon;
mod error;
mod logging;
mod shutdown;
mod slideshow;
mod subscriber;

use clap::Parser;

use error::StartupError;

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let args = cli::Args::parse();

    let log_file = dirs::cache_dir().map(|d| d.join("dynquee").join("dynquee.log"));
    let _guard = logging::init(args.verbose, args.no_console, args.timestamps, log_file.as_deref());

    tracing::info!("dynquee starting");

    let cfg = config::load(args.config.as_deref())?;

    let (shutdown_tx, shutdown_rx) = shutdown::channel();
    let mut signal_task = tokio::spawn(shutdown::wait_for_termination(shutdown_tx.clone()));
    let mut daemon_task = tokio::spawn(daemon::run(cfg, shutdown_rx));

    tokio::select! {
        res = &mut daemon_task => {
            signal_task.abort();
            if let Err(e) = res {
                tracing::error!(error = %e, "daemon task panicked");
                std::process::exit(1);
            }
        }
        _ = &mut signal_task => {
            let _ = shutdown_tx.send(true);
            if let Err(e) = daemon_task.await {
                tracing::error!(error = %e, "daemon task panicked during shutdown");
                std::process::exit(1);
            }
        }
    }

    tracing::info!("dynquee stopped");
    Ok(())
}
