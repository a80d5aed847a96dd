//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod execution;
mod workflow;

pub use execution::ExecutionCommands;
pub use workflow::WorkflowCommands;

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use flowmancer_client::FlowmancerClient;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Workflow definition management
    Workflow {
        #[command(subcommand)]
        command: WorkflowCommands,
    },
    /// Execution inspection
    Execution {
        #[command(subcommand)]
        command: ExecutionCommands,
    },
    /// Trigger one execution of a workflow type
    Run {
        /// Workflow type (e.g. lead_qualification)
        workflow_type: String,

        /// Input as inline JSON or @file
        #[arg(short, long, default_value = "{}")]
        input: String,

        /// Wait until the execution is terminal
        #[arg(short, long)]
        wait: bool,

        /// Seconds to wait before giving up
        #[arg(long, default_value = "120")]
        timeout: u64,
    },
    /// Trigger one execution per input
    Batch {
        /// Workflow type
        workflow_type: String,

        /// JSON array of inputs, inline or @file
        #[arg(short, long)]
        inputs: String,
    },
    /// Check server health
    Health,
}

/// Routes the command to the appropriate handler module
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let client = FlowmancerClient::new(&config.server_url);

    match command {
        Commands::Workflow { command } => workflow::handle_workflow_command(command, &client).await,
        Commands::Execution { command } => execution::handle_execution_command(command, &client).await,
        Commands::Run {
            workflow_type,
            input,
            wait,
            timeout,
        } => execution::run(&client, &workflow_type, &input, wait, timeout).await,
        Commands::Batch {
            workflow_type,
            inputs,
        } => execution::batch(&client, &workflow_type, &inputs).await,
        Commands::Health => health(&client).await,
    }
}

async fn health(client: &FlowmancerClient) -> Result<()> {
    let body = client.health().await?;
    let status = body["status"].as_str().unwrap_or("unknown");
    let version = body["version"].as_str().unwrap_or("?");

    if status == "healthy" {
        println!("{} {} ({})", "✓".green().bold(), client.base_url(), version.dimmed());
    } else {
        println!("{} {} reports '{}'", "✗".red().bold(), client.base_url(), status);
    }
    Ok(())
}
