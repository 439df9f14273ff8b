//! Terminal entry point: loads settings, wires the hosted backend, and runs
//! the interactive rota shell.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use mockable::{Clock, DefaultClock};
use ortho_config::OrthoConfig;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use rota::domain::{
    IdleSupervisor, RotaBoard, RotaBoardPorts, SessionManager, SessionTerminator,
};
use rota::inbound::cli::{Shell, ShellContext};
use rota::outbound::supabase::{
    SupabaseAuthGateway, SupabaseClient, SupabaseEmployeeRepository, SupabaseShiftRepository,
};
use rota::RotaSettings;

/// `rota` command arguments.
#[derive(Debug, Parser)]
#[command(name = "rota", about = "Plan weekly staff shifts from the terminal", version)]
struct CliArgs {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Command {
    /// Run the interactive dashboard (default).
    Shell,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = CliArgs::parse();

    // Settings read only ROTA_* variables and config files, never our argv.
    let settings = RotaSettings::load_from_iter([OsString::from("rota")])
        .wrap_err("load rota settings")?;
    init_tracing(settings.log_json);

    match args.command.unwrap_or(Command::Shell) {
        Command::Shell => run_shell(&settings).await,
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        warn!(error = %e, "tracing init failed");
    }
}

async fn run_shell(settings: &RotaSettings) -> Result<()> {
    let config = settings.supabase_config()?;
    let client = SupabaseClient::install(config).wrap_err("build backend client")?;
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    let gateway = Arc::new(SupabaseAuthGateway::new(client.clone(), clock.clone()));
    let session = Arc::new(SessionManager::new(gateway, clock.clone()));
    let ports = RotaBoardPorts::new(
        Arc::new(SupabaseEmployeeRepository::new(client.clone(), session.subscribe())),
        Arc::new(SupabaseShiftRepository::new(client, session.subscribe())),
    );
    let board = Arc::new(RotaBoard::new(ports, session.clone(), clock.as_ref()));

    let terminator: Arc<dyn SessionTerminator> = session.clone();
    let (idle, idle_events) =
        IdleSupervisor::new(settings.idle_config(), clock.clone(), terminator);
    let watchdog = idle.spawn(session.subscribe());
    info!(schema = settings.schema(), "rota shell starting");

    let shell = Shell::new(ShellContext {
        session,
        board,
        idle,
        clock,
    });
    let mut stdout = tokio::io::stdout();
    let outcome = shell
        .run(BufReader::new(tokio::io::stdin()), &mut stdout, idle_events)
        .await;
    watchdog.abort();
    outcome.wrap_err("terminal i/o failed")
}
