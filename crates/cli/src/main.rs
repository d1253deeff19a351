mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use common::types::ConnectorKind;

#[derive(Parser)]
#[command(name = "driftbridge")]
pub struct Cli {
    /// Path of a registry file with settings overrides
    #[arg(long, global = true)]
    pub config: Option<std::path::PathBuf>,
    #[command(subcommand)]
    pub command: Cmd,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// Register a connector's connection parameters
    AddConninfo {
        name: String,
        #[arg(long)]
        host: String,
        #[arg(long)]
        port: u16,
        #[arg(long)]
        user: String,
        #[arg(long)]
        pwd: String,
        #[arg(long, default_value = "")]
        srcdb: String,
        #[arg(long)]
        dstdb: String,
        #[arg(long, default_value = "")]
        tables: String,
        #[arg(long, help = "mysql, sqlserver, oracle or olr")]
        kind: String,
    },
    /// Remove a connector registration and its metadata files
    DelConninfo { name: String },
    /// Run a connector worker in the foreground
    Start {
        name: String,
        #[arg(long, default_value = "initial",
              help = "initial, no_data, schemasync, ...")]
        snapshot_mode: String,
    },
    /// Request graceful stop of a running worker
    Stop { name: String },
    /// Pause a syncing worker
    Pause { name: String },
    /// Resume a paused worker
    Resume { name: String },
    /// Write a new offset through a paused worker
    SetOffset { name: String, offset: String },
    /// Stop and re-start a worker with a new snapshot mode
    Restart {
        name: String,
        #[arg(long, default_value = "initial")]
        snapshot_mode: String,
    },
    /// Add or replace an object-map rule
    AddObjmap {
        name: String,
        #[arg(help = "table, column, transform or datatype")]
        objtype: String,
        srcobj: String,
        dstobj: String,
    },
    /// Disable an object-map rule
    DelObjmap {
        name: String,
        objtype: String,
        srcobj: String,
    },
    /// Ask a running worker to reload its object map
    ReloadObjmap { name: String },
    /// Print the state of every connector slot
    State,
    /// Print the statistics of one connector
    Stats { name: String },
    /// Reset the statistics of one connector
    ResetStats { name: String },
    /// Log runner memory diagnostics
    Meminfo { name: String },
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_thread_names(false)
                .with_line_number(false)
                .with_file(false)
                .compact(),
        )
        .with(filter)
        .init();

    let cli = Cli::parse();
    if let Err(e) = commands::dispatch(cli) {
        eprintln!("command failed: {e}");
        std::process::exit(1);
    }
}

pub(crate) fn parse_kind(kind: &str) -> Result<ConnectorKind, String> {
    ConnectorKind::parse(kind)
        .ok_or_else(|| format!("'{kind}' is not a connector kind (mysql, sqlserver, oracle, olr)"))
}
