// SPDX-FileCopyrightText: 2026 ConsultEase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ConsultEase central system binary entry point.

use clap::{Parser, Subcommand};

mod serve;
mod shutdown;

/// ConsultEase - student-faculty consultation coordination.
#[derive(Parser, Debug)]
#[command(name = "consultease", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the central system server.
    Serve,
    /// Print the resolved configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match consultease_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            consultease_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("consultease serve failed: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => println!("{rendered}"),
            Err(e) => {
                eprintln!("consultease: could not render config: {e}");
                std::process::exit(1);
            }
        },
        None => {
            println!("consultease: use --help for available commands");
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn binary_loads_config_defaults() {
        let config = consultease_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.system.name, "consultease");
        assert_eq!(config.broker.port, 1883);
    }
}
