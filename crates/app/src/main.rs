//! adaptive-chess
//!
//! Play against the adaptive engine, solve puzzles, or play a friend over
//! the network.

use adaptive_chess::{logging, run, AppConfig, Cli, Command, Start};
use adaptive_engine::ProfileStore;
use anyhow::Context;
use clap::Parser;

fn show_profile(config: &AppConfig) {
    let store = ProfileStore::new(&config.paths.profile);
    let state = store.load();
    println!("Profile: {}", store.path().display());
    println!("  Games played:  {}", state.games);
    println!("  Elo:           {:.0}", state.elo);
    println!("  Performance:   {:.2}", state.performance);
    println!("  Search depth:  {}", state.search_depth());
    println!("  Weights:");
    for (name, value) in state.weights.iter() {
        println!("    {name:<10} {value:.3}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(&cli.config).context("loading configuration")?;
    cli.apply(&mut config);
    logging::init(&config.paths.log, cli.log_stderr)?;
    tracing::info!(config = ?cli.config, "adaptive-chess starting");

    let start = match cli.command() {
        Command::Profile => {
            show_profile(&config);
            return Ok(());
        }
        Command::Play { color } => Start::Local {
            human: color.into(),
        },
        Command::Host { .. } => Start::Host,
        Command::Join { link } => Start::Join { link },
    };
    run(config, start).await
}
