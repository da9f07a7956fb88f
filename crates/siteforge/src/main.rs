//! Siteforge CLI - front-end asset pipeline with a live-reload server.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "siteforge")]
#[command(about = "Build static front-end assets and serve them with live reload")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to siteforge.toml config file
    #[arg(short, long, default_value = "siteforge.toml", global = true)]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Purge the output and run the full build
    Build,

    /// Build, then watch sources and serve with live reload (default)
    Watch {
        /// Port to listen on (defaults to config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Do not open browser
        #[arg(long)]
        no_open: bool,
    },

    /// Run the named tasks one after another
    Run {
        /// Task names, see `siteforge list`
        #[arg(required = true)]
        tasks: Vec<String>,
    },

    /// List registered tasks and the build plan
    List,

    /// Serve the output directory without building
    Serve {
        /// Port to listen on (defaults to config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Scaffold the default source layout and config file
    Init {
        /// Overwrite existing files
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    let command = cli.command.unwrap_or(Commands::Watch {
        port: None,
        no_open: false,
    });

    // Execute command
    match command {
        Commands::Init { yes } => {
            commands::init::run(&cli.config, yes).await?;
        }
        Commands::Build => {
            commands::build::run(&cli.config).await?;
        }
        Commands::Watch { port, no_open } => {
            commands::watch::run(&cli.config, port, !no_open).await?;
        }
        Commands::Run { tasks } => {
            commands::run::run(&cli.config, &tasks).await?;
        }
        Commands::List => {
            commands::list::run(&cli.config)?;
        }
        Commands::Serve { port } => {
            commands::serve::run(&cli.config, port).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_watch() {
        let cli = Cli::try_parse_from(["siteforge"]).unwrap();
        assert_eq!(cli.command, None);
        assert_eq!(cli.config, PathBuf::from("siteforge.toml"));
    }

    #[test]
    fn parses_run_tasks() {
        let cli = Cli::try_parse_from(["siteforge", "run", "purge", "styles"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Run {
                tasks: vec!["purge".to_string(), "styles".to_string()]
            })
        );
    }

    #[test]
    fn run_needs_a_task() {
        assert!(Cli::try_parse_from(["siteforge", "run"]).is_err());
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "siteforge",
            "watch",
            "--port",
            "8080",
            "--no-open",
            "--config",
            "site.toml",
            "-v",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Watch {
                port: Some(8080),
                no_open: true
            })
        );
        assert_eq!(cli.config, PathBuf::from("site.toml"));
        assert!(cli.verbose);
    }
}
