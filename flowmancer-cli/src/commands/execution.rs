//! Execution command handlers

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use flowmancer_client::FlowmancerClient;
use flowmancer_core::domain::execution::{ExecutionRecord, ExecutionStatus, StageStatus};
use flowmancer_core::dto::execution::BatchOutcome;
use flowmancer_core::dto::workflow::Page;
use uuid::Uuid;

use crate::input::{read_json, read_json_array};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Execution subcommands
#[derive(Subcommand)]
pub enum ExecutionCommands {
    /// Show one execution with its stage trace
    Get {
        /// Full execution ID
        id: Uuid,
    },
    /// List executions of a workflow type, newest first
    List {
        workflow_type: String,
        #[arg(long, default_value = "0")]
        skip: usize,
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

pub async fn handle_execution_command(command: ExecutionCommands, client: &FlowmancerClient) -> Result<()> {
    match command {
        ExecutionCommands::Get { id } => {
            let record = client.get_execution(id).await?;
            print_execution_details(&record);
            Ok(())
        }
        ExecutionCommands::List {
            workflow_type,
            skip,
            limit,
        } => {
            let records = client
                .list_executions(&workflow_type, Page { skip, limit })
                .await?;
            if records.is_empty() {
                println!("{}", "No executions found.".yellow());
            }
            for record in &records {
                print_execution_summary(record);
            }
            Ok(())
        }
    }
}

pub async fn run(
    client: &FlowmancerClient,
    workflow_type: &str,
    input: &str,
    wait: bool,
    timeout_secs: u64,
) -> Result<()> {
    let input = read_json(input)?;
    let record = client.trigger(workflow_type, input).await?;

    println!("{}", "✓ Execution accepted".green().bold());
    println!("  ID:     {}", record.id.to_string().cyan());
    println!("  Status: {}", colored_status(record.status));

    if !wait {
        return Ok(());
    }

    let record = client
        .wait_for_execution(record.id, POLL_INTERVAL, Duration::from_secs(timeout_secs))
        .await
        .context("Execution did not finish")?;
    println!();
    print_execution_details(&record);
    Ok(())
}

pub async fn batch(client: &FlowmancerClient, workflow_type: &str, inputs: &str) -> Result<()> {
    let inputs = read_json_array(inputs)?;
    let summary = client.trigger_batch(workflow_type, inputs).await?;

    println!(
        "{}",
        format!(
            "Batch of {}: {} accepted, {} rejected",
            summary.total, summary.succeeded, summary.failed
        )
        .bold()
    );
    for outcome in &summary.outcomes {
        match outcome {
            BatchOutcome::Accepted {
                index,
                execution_id,
            } => println!("  [{}] {} {}", index, "✓".green(), execution_id.to_string().dimmed()),
            BatchOutcome::Rejected { index, code, error } => {
                println!("  [{}] {} {} {}", index, "✗".red(), code.yellow(), error)
            }
        }
    }
    Ok(())
}

fn colored_status(status: ExecutionStatus) -> ColoredString {
    let text = status.to_string();
    match status {
        ExecutionStatus::Pending => text.dimmed(),
        ExecutionStatus::Running => text.yellow(),
        ExecutionStatus::Completed => text.green(),
        ExecutionStatus::Failed => text.red(),
    }
}

pub fn print_execution_summary(record: &ExecutionRecord) {
    let duration = record
        .duration_ms
        .map(|ms| format!("{}ms", ms))
        .unwrap_or_default();
    println!(
        "  {} {} {} {}",
        "▸".cyan(),
        record.id.to_string().dimmed(),
        colored_status(record.status),
        duration.dimmed()
    );
    println!(
        "    Started: {}",
        record.started_at.format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
    );
}

fn print_execution_details(record: &ExecutionRecord) {
    println!("{}", "Execution Details:".bold());
    println!("  ID:       {}", record.id.to_string().cyan());
    println!("  Workflow: {}", record.workflow_type);
    println!("  Status:   {}", colored_status(record.status));
    println!("  Started:  {}", record.started_at.format("%Y-%m-%d %H:%M:%S"));
    if let Some(completed) = record.completed_at {
        println!("  Finished: {}", completed.format("%Y-%m-%d %H:%M:%S"));
    }
    if let Some(ms) = record.duration_ms {
        println!("  Duration: {}ms", ms);
    }

    if !record.stage_logs.is_empty() {
        println!("\n{}", "Stages:".bold());
        for log in &record.stage_logs {
            let marker = match log.status {
                StageStatus::Succeeded => "✓".green(),
                StageStatus::Failed => "✗".red(),
            };
            let elapsed = (log.finished_at - log.started_at).num_milliseconds();
            println!("  {} {} {}", marker, log.stage, format!("{}ms", elapsed).dimmed());
        }
    }

    if let Some(error) = &record.error {
        println!("\n{} {}", "Error:".red().bold(), error);
    }

    if let Some(output) = &record.output {
        println!("\n{}", "Output:".bold());
        println!("{}", "─".repeat(80).dimmed());
        match serde_json::to_string_pretty(output) {
            Ok(pretty) => println!("{}", pretty),
            Err(_) => println!("{}", output),
        }
        println!("{}", "─".repeat(80).dimmed());
    }
}
