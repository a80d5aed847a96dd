//! Workflow command handlers

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use flowmancer_client::FlowmancerClient;
use flowmancer_core::domain::workflow::WorkflowDefinition;
use flowmancer_core::dto::workflow::{CreateWorkflow, Page};

use super::execution::print_execution_summary;
use crate::id_resolver::resolve_workflow_id;
use crate::input::read_json;

/// Workflow subcommands
#[derive(Subcommand)]
pub enum WorkflowCommands {
    /// Create a workflow from a JSON definition (inline or @file)
    Create {
        definition: String,
    },
    /// List workflows
    List {
        #[arg(long, default_value = "0")]
        skip: usize,
        #[arg(long, default_value = "100")]
        limit: usize,
    },
    /// Get workflow details
    Get {
        /// Workflow ID, unambiguous prefix or workflow type
        id: String,
    },
    /// Allow new executions of a workflow
    Activate { id: String },
    /// Reject new executions of a workflow
    Deactivate { id: String },
    /// Delete a workflow; its execution records are kept
    Delete { id: String },
    /// List executions of a workflow, newest first
    Executions {
        id: String,
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

pub async fn handle_workflow_command(command: WorkflowCommands, client: &FlowmancerClient) -> Result<()> {
    match command {
        WorkflowCommands::Create { definition } => create_workflow(client, &definition).await,
        WorkflowCommands::List { skip, limit } => list_workflows(client, Page { skip, limit }).await,
        WorkflowCommands::Get { id } => {
            let uuid = resolve_workflow_id(client, &id).await?;
            print_workflow_details(&client.get_workflow(uuid).await?);
            Ok(())
        }
        WorkflowCommands::Activate { id } => set_active(client, &id, true).await,
        WorkflowCommands::Deactivate { id } => set_active(client, &id, false).await,
        WorkflowCommands::Delete { id } => {
            let uuid = resolve_workflow_id(client, &id).await?;
            client.delete_workflow(uuid).await?;
            println!("{}", format!("✓ Workflow {} deleted", uuid).green().bold());
            Ok(())
        }
        WorkflowCommands::Executions { id, limit } => {
            let uuid = resolve_workflow_id(client, &id).await?;
            let records = client
                .list_workflow_executions(uuid, Page { skip: 0, limit })
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

async fn create_workflow(client: &FlowmancerClient, definition: &str) -> Result<()> {
    let req: CreateWorkflow = serde_json::from_value(read_json(definition)?)
        .context("Definition does not match the workflow schema")?;

    let workflow = client.create_workflow(&req).await?;

    println!("{}", "✓ Workflow created successfully!".green().bold());
    println!("  ID:     {}", workflow.id.to_string().cyan());
    println!("  Type:   {}", workflow.workflow_type.bold());
    println!("  Stages: {}", workflow.stages.join(" -> ").dimmed());
    Ok(())
}

async fn list_workflows(client: &FlowmancerClient, page: Page) -> Result<()> {
    let workflows = client.list_workflows(page).await?;

    if workflows.is_empty() {
        println!("{}", "No workflows found.".yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} workflow(s):", workflows.len()).bold());
    println!();
    for workflow in &workflows {
        let state = if workflow.active {
            "active".green()
        } else {
            "inactive".red()
        };
        println!("  {} {} [{}]", "▸".cyan(), workflow.workflow_type.bold(), state);
        println!("    ID:     {}", workflow.id.to_string().dimmed());
        println!("    Name:   {}", workflow.name);
        println!("    Stages: {}", workflow.stages.join(" -> ").dimmed());
        println!();
    }
    Ok(())
}

async fn set_active(client: &FlowmancerClient, id: &str, active: bool) -> Result<()> {
    let uuid = resolve_workflow_id(client, id).await?;
    let workflow = client.set_workflow_active(uuid, active).await?;

    let verb = if active { "activated" } else { "deactivated" };
    println!(
        "{}",
        format!("✓ Workflow {} {}", workflow.workflow_type, verb).green().bold()
    );
    Ok(())
}

fn print_workflow_details(workflow: &WorkflowDefinition) {
    println!("{}", "Workflow Details:".bold());
    println!("  ID:          {}", workflow.id.to_string().cyan());
    println!("  Name:        {}", workflow.name.bold());
    println!("  Type:        {}", workflow.workflow_type);
    if let Some(desc) = &workflow.description {
        println!("  Description: {}", desc);
    }
    println!("  Active:      {}", workflow.active);
    println!("  Stages:      {}", workflow.stages.join(" -> "));
    if !workflow.integrations.is_empty() {
        let targets: Vec<String> = workflow.integrations.iter().map(ToString::to_string).collect();
        println!("  Notifies:    {}", targets.join(", "));
    }
    if !workflow.config.is_null() {
        println!("  Config:      {}", workflow.config);
    }
    println!("  Created:     {}", workflow.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!("  Updated:     {}", workflow.updated_at.format("%Y-%m-%d %H:%M:%S"));
}
