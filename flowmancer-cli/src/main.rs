//! FlowMancer CLI
//!
//! Command-line interface for the FlowMancer server.

mod commands;
mod config;
mod id_resolver;
mod input;
mod types;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "flowmancer")]
#[command(about = "FlowMancer workflow automation CLI", long_about = None)]
struct Cli {
    /// Server URL
    #[arg(long, env = "FLOWMANCER_URL", default_value = "http://localhost:8000")]
    server_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        server_url: cli.server_url,
    };

    handle_command(cli.command, &config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_command() {
        let cli = Cli::try_parse_from([
            "flowmancer",
            "--server-url",
            "http://flow:8000",
            "run",
            "lead_qualification",
            "--input",
            r#"{"name":"Ada"}"#,
            "--wait",
        ])
        .unwrap();
        assert_eq!(cli.server_url, "http://flow:8000");
        assert!(matches!(cli.command, Commands::Run { wait: true, .. }));
    }
}
