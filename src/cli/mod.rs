// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap, prints the run banner and delegates the work to
// Layer 2 (application).
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, TrainArgs};

use crate::application::train_use_case::{TrainConfig, TrainUseCase};
use crate::domain::state::Terminal;

#[derive(Parser, Debug)]
#[command(
    name = "deepsignal-trainer",
    version = "0.1.0",
    about = "Train a transformer 5mC classifier on nanopore signal features."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => run_train(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    let total_start = Instant::now();
    println!("[main] start..");

    let config: TrainConfig = args.into();
    println!("{}", config.display());
    tracing::info!("Training on '{}', validating on '{}'", config.train_file, config.valid_file);

    let outcome = TrainUseCase::new(config).execute()?;
    match outcome.terminal {
        Terminal::Completed => tracing::info!(
            "Completed all {} epochs, best accuracy {:.4}",
            outcome.epochs_run,
            outcome.best_accuracy
        ),
        Terminal::StoppedEarly => tracing::info!(
            "Stopped early after {} epochs, best accuracy {:.4}",
            outcome.epochs_run,
            outcome.best_accuracy
        ),
    }

    println!("[main] costs {} seconds", total_start.elapsed().as_secs_f64());
    Ok(())
}
