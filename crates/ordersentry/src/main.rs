//! ordersentry - continuously scans an IMAP mailbox for order
//! confirmations and reports matches to the log.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod config;
mod health;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ordersentry_core::{LogSink, OnceMode, PollScheduler, RunMode, run_cycle};

use config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "ordersentry=info,ordersentry_core=info,ordersentry_imap=info".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => {
            info!("done");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %format!("{err:#}"), "fatal");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env().context("loading configuration")?;

    info!(
        host = %config.scan.session.host,
        mailbox = %config.scan.mailbox,
        run_once = config.run_once,
        poll = ?config.poll_delay,
        "starting ordersentry"
    );

    // The liveness endpoint lives and dies with the process; a bind
    // failure is logged but does not stop scanning.
    let port = config.port;
    tokio::spawn(async move {
        if let Err(err) = health::serve(port).await {
            error!(port, error = %err, "liveness endpoint failed");
        }
    });

    let mode = if config.run_once {
        RunMode::Once(OnceMode::Exit)
    } else {
        RunMode::Forever
    };
    let scheduler = PollScheduler::new(config.poll_delay, mode);
    let scan = Arc::new(config.scan);
    scheduler
        .run(|| {
            let scan = Arc::clone(&scan);
            async move { run_cycle(&scan, &LogSink).await }
        })
        .await;

    Ok(())
}
