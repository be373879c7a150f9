use std::io::Write;

use clap::Parser;
use orchestrator::{AgentMessage, Orchestrator};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const HELP: &str = "Commands:
  /agents       list agents
  /providers    probe and list providers
  /diag         system diagnostics (JSON)
  /session      show this session's history
  /quit         exit";

#[derive(Debug, Parser)]
#[command(name = "switchboard")]
#[command(about = "Chat with the Switchboard agents from the console")]
struct Args {
    /// Message to send. Starts an interactive session when omitted.
    message: Vec<String>,

    /// Session id (defaults to a fresh uuid)
    #[arg(long)]
    session: Option<String>,

    /// User id attached to the session
    #[arg(long)]
    user: Option<String>,

    /// Print system diagnostics as JSON and exit
    #[arg(long)]
    diagnostics: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn print_reply(reply: &AgentMessage) {
    let via = match (&reply.provider_id, &reply.model) {
        (Some(provider), Some(model)) => format!("{}/{}", provider, model),
        (Some(provider), None) => provider.clone(),
        _ => reply.source.to_string(),
    };
    println!(
        "[{} | {} | {:.2} | {} ms] {}",
        reply.agent_name, via, reply.confidence, reply.processing_time_ms, reply.content
    );
    if !reply.tools_used.is_empty() {
        println!("  tools: {}", reply.tools_used.join(", "));
    }
}

async fn run_command(
    orchestrator: &Orchestrator,
    session_id: &str,
    command: &str,
) -> Result<bool, Box<dyn std::error::Error>> {
    match command {
        "/quit" | "/exit" => return Ok(false),
        "/agents" => {
            for agent in orchestrator.get_agent_list().await {
                println!(
                    "{:<12} {:<22} {:<12} llm={} specialties={}",
                    agent.id,
                    agent.name,
                    agent.status.to_string(),
                    agent.enable_llm,
                    agent.specialties.join(", ")
                );
            }
        }
        "/providers" => {
            for status in orchestrator.get_llm_providers().await {
                let probed = orchestrator.test_llm_provider(&status.id).await;
                match probed {
                    Ok(status) => println!(
                        "{:<10} up   {} ms",
                        status.id,
                        status.latency_ms.unwrap_or_default()
                    ),
                    Err(e) => println!("{:<10} down {}", status.id, e),
                }
            }
        }
        "/diag" => {
            let report = orchestrator.perform_system_diagnostics().await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "/session" => match orchestrator.session(session_id).await {
            Some(session) => println!("{}", serde_json::to_string_pretty(&session)?),
            None => println!("(no messages yet)"),
        },
        _ => println!("{}", HELP),
    }
    Ok(true)
}

async fn interactive(
    orchestrator: &Orchestrator,
    session_id: &str,
    user_id: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Session {}. Type /help for commands.", session_id);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('/') {
            if !run_command(orchestrator, session_id, line).await? {
                break;
            }
            continue;
        }

        let reply = orchestrator
            .process_message(line, session_id, user_id)
            .await?;
        print_reply(&reply);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    init_tracing(args.log_json);

    let orchestrator = Orchestrator::from_env()?;
    let session_id = args
        .session
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    info!("Using session {}", session_id);

    if args.diagnostics {
        return run_command(&orchestrator, &session_id, "/diag")
            .await
            .map(|_| ());
    }

    if args.message.is_empty() {
        return interactive(&orchestrator, &session_id, args.user.as_deref()).await;
    }

    let reply = orchestrator
        .process_message(&args.message.join(" "), &session_id, args.user.as_deref())
        .await?;
    print_reply(&reply);
    Ok(())
}
