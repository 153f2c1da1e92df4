//! pgops CLI Application
//!
//! Operator console for PostgreSQL: one-shot subcommands plus an interactive
//! menu, both driving the orchestrator in `pgops-core`.

mod args;
mod cli;
mod console;
mod menu;
mod renderer;

use std::{
    process::ExitCode,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use anyhow::{Context, Result};
use args::{Args, Commands};
use clap::Parser;
use console::Console;
use log::info;
use pgops_core::{Config, OrchestratorBuilder};
use renderer::{OutputMode, TerminalRenderer};
use tokio::sync::Notify;
use Commands::*;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::init();

    let Args {
        host,
        port,
        user,
        migrations_dir,
        no_color,
        json,
        command,
    } = Args::parse();

    // Flags take precedence over the environment.
    let config = Config::from_lookup(|name| {
        let flag = match name {
            "DB_HOST" => host.clone(),
            "DB_PORT" => port.map(|p| p.to_string()),
            "DB_USER" => user.clone(),
            "MIGRATIONS_DIR" => migrations_dir
                .as_ref()
                .map(|dir| dir.to_string_lossy().into_owned()),
            _ => None,
        };
        flag.or_else(|| std::env::var(name).ok())
    })
    .context("Failed to load configuration")?;

    let cancel = Arc::new(Notify::new());
    let busy = Arc::new(AtomicBool::new(false));
    forward_interrupts(Arc::clone(&cancel), Arc::clone(&busy));

    let ops = OrchestratorBuilder::new()
        .with_config(config)
        .with_cancellation(cancel)
        .build()
        .context("Failed to initialize orchestrator")?;
    let console = Console::new(
        ops,
        TerminalRenderer::new(OutputMode::from_flags(no_color, json)),
        busy,
    );

    info!("pgops started");

    let ok = match command {
        Some(Db { command }) => console.handle_db_command(command).await?,
        Some(User { command }) => console.handle_user_command(command).await?,
        Some(Migrate { command }) => console.handle_migrate_command(command).await?,
        Some(Doctor) => console.doctor().await?,
        Some(Menu) | None => {
            menu::run(&console).await?;
            true
        }
    };

    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Ctrl-C cancels the running tool, or exits when nothing is running.
fn forward_interrupts(cancel: Arc<Notify>, busy: Arc<AtomicBool>) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if busy.load(Ordering::SeqCst) {
                info!("interrupt received, cancelling running tool");
                cancel.notify_waiters();
            } else {
                std::process::exit(130);
            }
        }
    });
}
