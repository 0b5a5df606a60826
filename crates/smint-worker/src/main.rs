//! StreamMint pipeline binary.
//!
//! Usage:
//!   streammint schema            print the task input JSON schema
//!   streammint '<json>'          run a task given inline
//!   streammint <task.json>       run a task read from a file
//!   streammint [-]               run a task read from stdin
//!
//! The run report is printed on stdout. Exit code 0 means every segment was
//! confirmed, 2 a partial success, 1 a failure or fatal error.

use std::io::Read;

use anyhow::Context;
use serde_json::json;
use tracing::{error, info};

use smint_models::{task_input_schema, TaskInput};
use smint_worker::metrics::install_exporter;
use smint_worker::{init_tracing, resolve_task, Pipeline, PipelineConfig, PipelineDeps, PipelineError, ServiceConfig};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    let _ = rustls::crypto::ring::default_provider().install_default();

    dotenvy::dotenv().ok();

    let arg = std::env::args().nth(1);
    if arg.as_deref() == Some("schema") {
        match serde_json::to_string_pretty(&task_input_schema()) {
            Ok(schema) => println!("{}", schema),
            Err(e) => {
                eprintln!("failed to render schema: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    init_tracing();

    let code = match run(arg).await {
        Ok(code) => code,
        Err(e) => {
            let (kind, message) = match e.downcast_ref::<PipelineError>() {
                Some(pipeline_error) => (pipeline_error.kind(), pipeline_error.to_string()),
                None => ("internal", format!("{:#}", e)),
            };
            error!(kind, "Run aborted: {}", message);
            println!("{}", json!({ "disposition": "failure", "kind": kind, "error": message }));
            1
        }
    };
    std::process::exit(code);
}

async fn run(arg: Option<String>) -> anyhow::Result<i32> {
    let config = PipelineConfig::from_env()?;
    let services = ServiceConfig::from_env(config.dry_run)?;
    info!(dry_run = config.dry_run, work_dir = %config.work_dir.display(), "Configuration loaded");

    let raw = read_task(arg.as_deref())?;
    let input = TaskInput::from_json(&raw).map_err(PipelineError::from)?;

    if let Some(addr) = config.metrics_addr {
        install_exporter(addr)?;
        info!(%addr, "Metrics exporter listening");
    }

    let deps = PipelineDeps::from_config(&config, &services)?;
    let pipeline = Pipeline::new(config, deps);
    let request = resolve_task(&input, pipeline.config(), pipeline.ledger()).await?;
    let report = pipeline.run(&request).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(report.disposition.exit_code())
}

fn read_task(arg: Option<&str>) -> anyhow::Result<String> {
    match arg {
        None | Some("-") => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("reading task from stdin")?;
            Ok(raw)
        }
        Some(inline) if inline.trim_start().starts_with('{') => Ok(inline.to_string()),
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading task file {}", path)),
    }
}
