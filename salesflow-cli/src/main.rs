//! salesflow - process logistics sales emails from the command line

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use salesflow_agents::reference_agent_set;
use salesflow_config::SalesflowConfig;
use salesflow_workflow_engine::{
    EngineOptions, ForwarderRegistry, RawEmail, SalesTeam, TurnOutcome, TurnStatus, WorkflowEngine,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "salesflow", about = "Automated logistics sales assistant", version)]
struct Cli {
    /// Config file path (falls back to SALESFLOW_CONFIG, then salesflow.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process one inbound email from a JSON file
    Process {
        /// JSON file with sender/subject/content (and optional thread_id)
        file: PathBuf,
    },
    /// Inspect stored threads
    Thread {
        #[command(subcommand)]
        command: ThreadCommand,
    },
    /// Replay a recorded sequence of inbound emails through the engine
    Replay {
        /// JSON file containing an array of inbound emails
        file: PathBuf,
        /// Replay into this thread id instead of the recorded ones
        #[arg(long)]
        thread_id: Option<String>,
    },
}

#[derive(Subcommand)]
enum ThreadCommand {
    /// List stored thread ids
    List,
    /// Show one thread as JSON
    Show { thread_id: String },
}

fn load_config(path: Option<&PathBuf>) -> Result<SalesflowConfig> {
    match path {
        Some(path) => {
            let config = salesflow_config::load_from_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?;
            salesflow_config::validate_config(&config)?;
            Ok(config)
        }
        None => Ok(salesflow_config::load_config()?),
    }
}

fn build_engine(config: &SalesflowConfig) -> Result<WorkflowEngine> {
    let forwarders = match &config.registries.forwarders_file {
        Some(path) => Arc::new(
            ForwarderRegistry::load(path)
                .with_context(|| format!("loading forwarders from {}", path.display()))?,
        ),
        None => Arc::new(ForwarderRegistry::default_registry()),
    };
    let sales_team = match &config.registries.sales_team_file {
        Some(path) => Arc::new(
            SalesTeam::load(path)
                .with_context(|| format!("loading sales team from {}", path.display()))?,
        ),
        None => Arc::new(SalesTeam::default_roster()),
    };

    let agents = reference_agent_set(forwarders.clone(), sales_team.clone());
    let options = EngineOptions {
        threads_dir: config.storage.threads_dir.clone(),
        outbound_sender: config.identity.outbound_sender.clone(),
        quote_timeline: config.identity.quote_timeline.clone(),
    };
    Ok(WorkflowEngine::with_registries(
        agents, options, forwarders, sales_team,
    )?)
}

fn print_outcome(outcome: &TurnOutcome) {
    println!("workflow_id: {}", outcome.workflow_id);
    println!("thread_id:   {}", outcome.thread_id);
    println!(
        "status:      {}",
        match outcome.status {
            TurnStatus::Completed => "completed",
            TurnStatus::Failed => "failed",
        }
    );
    if let Some(error) = &outcome.error {
        println!("error:       {}", error);
    }

    let state = &outcome.state;
    let response = state
        .clarification_response
        .as_ready()
        .or_else(|| state.confirmation_response.as_ready())
        .or_else(|| state.acknowledgment_response.as_ready())
        .or_else(|| state.confirmation_acknowledgment.as_ready())
        .or_else(|| state.customer_quote.as_ready());
    match response {
        Some(payload) => {
            println!("\nresponse ({})", payload.response_type);
            println!("subject: {}", payload.subject);
            println!("\n{}", payload.body);
        }
        None => println!("\nno outbound response for this turn"),
    }

    if let Some(assignment) = state.forwarder_assignment.as_ready() {
        println!("\nforwarder assignment: {}", assignment.status);
        if let Some(forwarder) = &assignment.assigned_forwarder {
            println!("assigned forwarder:   {} <{}>", forwarder.name, forwarder.email);
        }
        if let Some(draft) = &assignment.rate_request {
            println!("\nrate request to {}:\nsubject: {}\n\n{}", draft.to, draft.subject, draft.body);
        }
    }
    if let Some(notification) = state.sales_notification.as_ready() {
        println!("\nsales notification: {}", notification.subject);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Process { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let email: RawEmail =
                serde_json::from_str(&content).context("parsing inbound email JSON")?;
            let engine = build_engine(&config)?;
            let outcome = engine.process_email(email).await;
            print_outcome(&outcome);
        }
        Command::Thread { command } => {
            let engine = build_engine(&config)?;
            match command {
                ThreadCommand::List => {
                    for thread_id in engine.store().list() {
                        println!("{}", thread_id);
                    }
                }
                ThreadCommand::Show { thread_id } => match engine.store().load(&thread_id) {
                    Some(thread) => println!("{}", serde_json::to_string_pretty(&thread)?),
                    None => anyhow::bail!("thread {} not found", thread_id),
                },
            }
        }
        Command::Replay { file, thread_id } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let emails: Vec<RawEmail> =
                serde_json::from_str(&content).context("parsing replay JSON array")?;
            let engine = build_engine(&config)?;
            for (index, mut email) in emails.into_iter().enumerate() {
                if let Some(thread_id) = &thread_id {
                    email.thread_id = Some(thread_id.clone());
                }
                println!("=== turn {} ===", index + 1);
                let outcome = engine.process_email(email).await;
                print_outcome(&outcome);
                println!();
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    run(Cli::parse()).await
}
