pub mod process;

use std::env;

use anyhow::Result;
use clap::{Parser, Subcommand};
use process::{kill_previous_watchers, restart_watcher};
use tracing::level_filters::LevelFilter;

use crate::{
    daemon::{SessionConfig, report::status_event::AfkStatus, start_session},
    utils::{
        dir::create_application_default_path,
        logging::{CLI_PREFIX, enable_logging},
    },
};

#[derive(Parser, Debug)]
#[command(name = "Afkmover", version, long_about = None)]
#[command(about = "Keeps the workstation awake by nudging the mouse when the user goes AFK", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Start watching for inactivity in the background")]
    Start {
        #[arg(
            long,
            short,
            help = "Seconds of inactivity after which the user counts as AFK. Must be at least 5"
        )]
        timeout: u64,
    },
    #[command(
        about = "Run the watcher directly in current console. Used for creating a background watcher internally and for debugging"
    )]
    Serve {
        #[arg(
            long,
            short,
            help = "Seconds of inactivity after which the user counts as AFK. Must be at least 5"
        )]
        timeout: u64,
    },
    #[command(about = "Stop a currently running watcher.")]
    Stop {},
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(
        CLI_PREFIX,
        &create_application_default_path()?,
        logging_level,
        args.log,
    )?;

    match args.commands {
        Commands::Start { timeout } => {
            // Reject a bad timeout here, before any process is spawned.
            SessionConfig::from_seconds(timeout)?;
            restart_watcher(timeout)?;
            Ok(())
        }
        Commands::Stop {} => {
            let process_name = env::current_exe().unwrap();
            kill_previous_watchers(&process_name);
            Ok(())
        }
        Commands::Serve { timeout } => {
            let config = SessionConfig::from_seconds(timeout)?;
            println!("Status: {}", AfkStatus::Idle);
            start_session(config).await?;
            Ok(())
        }
    }
}
