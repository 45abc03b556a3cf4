//! Run workflow command implementation.

use std::io::Write;

use anyhow::{Context, Result, bail};
use clap::Args;
use colored::Colorize;
use futures_util::StreamExt;
use serde_json::Value;

use dify::resources::{WorkflowChunk, WorkflowEvent, WorkflowRunRequest};
use dify::{ApiKey, BaseUrl, ClientConfig, Session, TokenPair};

use crate::output;
use crate::session::storage;

#[derive(Args, Debug)]
pub struct RunWorkflowArgs {
    /// App API key of the workflow
    #[arg(long, env = "DIFY_APP_KEY", hide_env_values = true)]
    pub app_key: String,

    /// Input variable as name=value (repeatable)
    #[arg(long = "input", short = 'i', value_parser = parse_input)]
    pub inputs: Vec<(String, String)>,

    /// End-user identifier
    #[arg(long, default_value = "dify-cli")]
    pub user: String,

    /// Stream events as they are produced
    #[arg(long)]
    pub stream: bool,

    /// Print streamed events as JSON lines
    #[arg(long, requires = "stream")]
    pub json: bool,

    /// Deployment root URL, when no session is stored
    #[arg(long, env = "DIFY_BASE_URL")]
    pub base_url: Option<String>,
}

fn parse_input(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))
}

pub async fn run(args: RunWorkflowArgs) -> Result<()> {
    // Workflow runs authenticate with the app key only; a stored session
    // just supplies the base URL.
    let session = match storage::load_session().await? {
        Some(session) => session,
        None => {
            let Some(ref base_url) = args.base_url else {
                bail!("No active session. Run 'dify login' first or pass --base-url.");
            };
            let config = ClientConfig::new(BaseUrl::new(base_url).context("Invalid base URL")?);
            Session::from_persisted(config, TokenPair::new("", ""), None)?
        }
    };

    let app_key = ApiKey::new(&args.app_key);
    let request = args
        .inputs
        .iter()
        .fold(WorkflowRunRequest::new(&args.user), |request, (name, value)| {
            request.with_input(name, value.as_str())
        });

    if !args.stream {
        let run = session
            .run_workflow(&app_key, &request)
            .await
            .context("Failed to run workflow")?;
        output::json_pretty(&run.data.outputs.unwrap_or(Value::Null))?;
        output::field("Status", &run.data.status);
        return Ok(());
    }

    let mut chunks = session
        .run_workflow_streaming(&app_key, &request)
        .await
        .context("Failed to start workflow")?;

    let mut stdout = std::io::stdout();
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.context("Workflow stream failed")?;
        if args.json {
            output::json(&chunk)?;
        } else {
            print_chunk(&chunk, &mut stdout)?;
        }
        if chunk.is_terminal() {
            break;
        }
    }

    Ok(())
}

fn print_chunk(chunk: &WorkflowChunk, stdout: &mut std::io::Stdout) -> Result<()> {
    let data = chunk.data.as_ref();
    let title = || {
        data.and_then(|d| d.get("title"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    };

    match chunk.event {
        WorkflowEvent::TextChunk => {
            if let Some(text) = chunk.text() {
                write!(stdout, "{}", text)?;
                stdout.flush()?;
            }
        }
        WorkflowEvent::WorkflowStarted => eprintln!("{}", "workflow started".dimmed()),
        WorkflowEvent::NodeStarted => eprintln!("{} {}", "node".cyan(), title()),
        WorkflowEvent::NodeFinished => eprintln!("{} {}", "done".green(), title()),
        WorkflowEvent::WorkflowFinished => {
            println!();
            let status = data
                .and_then(|d| d.get("status"))
                .and_then(Value::as_str)
                .unwrap_or("finished");
            eprintln!("{} {}", "workflow".dimmed(), status);
            if let Some(outputs) = data.and_then(|d| d.get("outputs")) {
                output::json_pretty(outputs)?;
            }
        }
        WorkflowEvent::Error => {
            let message = chunk.message.as_deref().unwrap_or("unknown error");
            eprintln!("{} {}", "ERROR".red(), message);
        }
        WorkflowEvent::Ping
        | WorkflowEvent::TtsMessage
        | WorkflowEvent::TtsMessageEnd
        | WorkflowEvent::Unknown => {}
    }

    Ok(())
}
