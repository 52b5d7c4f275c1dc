use std::path::PathBuf;

use chess_core::Color;
use clap::{Parser, Subcommand, ValueEnum};

use crate::config::{AppConfig, DEFAULT_CONFIG_FILE};

#[derive(Debug, Parser)]
#[command(
    name = "adaptive-chess",
    version,
    about = "Play chess against an engine that adapts to you, or against a friend over the network"
)]
pub struct Cli {
    /// Settings file (TOML). Missing file means defaults.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Log to stderr instead of the log file.
    #[arg(long)]
    pub log_stderr: bool,

    /// Learning profile to use instead of the configured one.
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// Never play from the opening book.
    #[arg(long)]
    pub no_book: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Play against the engine (default).
    Play {
        #[arg(long, value_enum, default_value_t = Side::White)]
        color: Side,
    },
    /// Host a network game; you play White.
    Host {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Join a hosted game by its link; you play Black.
    Join { link: String },
    /// Show the learning profile.
    Profile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Side {
    White,
    Black,
}

impl From<Side> for Color {
    fn from(side: Side) -> Color {
        match side {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Play { color: Side::White })
    }

    /// Applies flag overrides on top of the file settings.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(profile) = &self.profile {
            config.paths.profile = profile.clone();
        }
        if self.no_book {
            config.engine.use_book = false;
        }
        if let Some(Command::Host { port: Some(port) }) = &self.command {
            config.network.port = Some(*port);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_play_as_white() {
        let cli = Cli::try_parse_from(["adaptive-chess"]).unwrap();
        assert_eq!(cli.command(), Command::Play { color: Side::White });
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
        assert!(!cli.log_stderr);
    }

    #[test]
    fn test_subcommands() {
        let cli = Cli::try_parse_from(["adaptive-chess", "play", "--color", "black"]).unwrap();
        assert_eq!(cli.command(), Command::Play { color: Side::Black });

        let cli = Cli::try_parse_from(["adaptive-chess", "join", "http://10.0.0.2:5123"]).unwrap();
        assert_eq!(
            cli.command(),
            Command::Join {
                link: "http://10.0.0.2:5123".to_string()
            }
        );

        assert!(Cli::try_parse_from(["adaptive-chess", "join"]).is_err());
        assert!(Cli::try_parse_from(["adaptive-chess", "play", "--color", "red"]).is_err());
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from([
            "adaptive-chess",
            "--no-book",
            "--profile",
            "me.json",
            "host",
            "--port",
            "5432",
        ])
        .unwrap();
        let mut config = AppConfig::default();
        cli.apply(&mut config);
        assert!(!config.engine.use_book);
        assert_eq!(config.paths.profile, PathBuf::from("me.json"));
        assert_eq!(config.network.port, Some(5432));
    }
}
