// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{anyhow, bail, Context};
use kindling::artifacts::DirectoryArtifacts;
use kindling::engine::{DeploymentExecutor, RunOptions};
use kindling::graph::build_graph;
use kindling::journal::FileJournal;
use kindling::module::load_module;
use kindling::network::{Address, StubNetwork};
use kindling::observability::messages::planner::{PlanComputed, PlanningFailed};
use kindling::observability::messages::StructuredLog;
use kindling::planner::plan;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

struct CliOptions {
    module_path: String,
    artifacts_dir: String,
    execute: bool,
    journal_path: Option<String>,
    accounts: Vec<Address>,
    timeout_secs: u64,
}

fn usage(program: &str) {
    eprintln!(
        "Usage: {} <module.yaml> <artifacts-dir> [--execute] [--journal <path>] [--accounts <addr,addr,...>] [--timeout-secs <n>]",
        program
    );
    eprintln!("Example: {} modules/mizupass.yaml artifacts/ --execute --journal mizupass.jsonl", program);
}

fn parse_args(args: &[String]) -> anyhow::Result<CliOptions> {
    if args.len() < 3 {
        bail!("expected a module file and an artifacts directory");
    }
    let mut options = CliOptions {
        module_path: args[1].clone(),
        artifacts_dir: args[2].clone(),
        execute: false,
        journal_path: None,
        accounts: Vec::new(),
        timeout_secs: 60,
    };

    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            "--execute" => {
                options.execute = true;
                i += 1;
            }
            "--journal" => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| anyhow!("--journal requires a path"))?;
                options.journal_path = Some(value.clone());
                i += 2;
            }
            "--accounts" => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| anyhow!("--accounts requires a comma-separated list"))?;
                options.accounts = value
                    .split(',')
                    .filter(|s| !s.is_empty())
                    .map(|s| Address::parse(s).map_err(|e| anyhow!("{}", e)))
                    .collect::<anyhow::Result<Vec<_>>>()?;
                i += 2;
            }
            "--timeout-secs" => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| anyhow!("--timeout-secs requires a number"))?;
                options.timeout_secs = value
                    .parse()
                    .with_context(|| format!("invalid timeout '{}'", value))?;
                i += 2;
            }
            other => bail!("unknown argument '{}'", other),
        }
    }
    Ok(options)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("❌ {}", err);
            usage(&args[0]);
            std::process::exit(1);
        }
    };

    if let Err(err) = run(options).await {
        eprintln!("❌ {:#}", err);
        std::process::exit(1);
    }
}

async fn run(options: CliOptions) -> anyhow::Result<()> {
    let module = load_module(&options.module_path)
        .with_context(|| format!("failed to load module '{}'", options.module_path))?;
    let artifacts = DirectoryArtifacts::new(options.artifacts_dir.as_str());

    let graph = match build_graph(&module, &artifacts) {
        Ok(graph) => graph,
        Err(errors) => {
            for error in &errors {
                PlanningFailed {
                    module: &module.module,
                    reason: &error.to_string(),
                }
                .log();
                eprintln!("  • {}", error);
            }
            bail!("module '{}' has {} validation error(s)", module.module, errors.len());
        }
    };

    let plan = match plan(&graph) {
        Ok(plan) => plan,
        Err(error) => {
            PlanningFailed {
                module: &module.module,
                reason: &error.to_string(),
            }
            .log();
            bail!("{}", error);
        }
    };

    PlanComputed {
        batch_count: plan.batches().len(),
        node_count: plan.node_count(),
    }
    .log();

    println!("🚀 Module '{}': {} node(s) in {} batch(es)", module.module, graph.len(), plan.batches().len());
    for (index, batch) in plan.batches().iter().enumerate() {
        let ids: Vec<&str> = batch.iter().map(|id| id.as_str()).collect();
        println!("  batch {}: {}", index, ids.join(", "));
    }

    if !options.execute {
        println!("\nDry run only; pass --execute to deploy.");
        return Ok(());
    }

    let journal_path = options
        .journal_path
        .clone()
        .unwrap_or_else(|| format!("{}.journal.jsonl", module.module));
    let journal = FileJournal::open(&journal_path)
        .with_context(|| format!("failed to open journal '{}'", journal_path))?;

    let executor = DeploymentExecutor::with_options(
        Arc::new(StubNetwork::new()),
        RunOptions {
            confirmation_timeout: Duration::from_secs(options.timeout_secs),
            cancellation: CancellationToken::new(),
            ..RunOptions::default()
        },
    );

    let result = executor
        .run(
            &module.module,
            &graph,
            &plan,
            &artifacts,
            &options.accounts,
            journal,
        )
        .await?;

    println!("\n📊 Deployed {} contract(s):", result.len());
    for (name, address) in &result {
        println!("  {} → {}", name, address);
    }
    println!("\n✅ Journal: {}", journal_path);
    Ok(())
}
