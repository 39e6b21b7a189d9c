// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod registry;
pub mod tracking;
pub mod types;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::config::{load_or_default, ConfigFile};
use crate::exec::{Executor, RealProcessBackend};
use crate::fs::{FileSystem, RealFileSystem};
use crate::registry::{Descriptor, Registry};
use crate::types::{Completion, InputValues};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (plus the `--root` override)
/// - automation discovery
/// - the executor with the real process backend
///
/// and then performs the requested subcommand. Returns whether the command
/// succeeded (used for the process exit code).
pub async fn run(args: CliArgs) -> Result<bool> {
    let mut cfg = load_or_default(args.config.as_deref()).context("loading configuration")?;
    if let Some(root) = args.root {
        cfg.discovery.root = root;
    }

    let executor = build_executor(&cfg);

    match args.command {
        Command::List => {
            print_list(&executor);
            Ok(true)
        }
        Command::Show { id } => Ok(print_show(&executor, &id)),
        Command::Validate { id, inputs } => Ok(validate(&executor, &id, &into_values(inputs))),
        Command::Run {
            id,
            inputs,
            background: false,
        } => {
            let result = executor.run(&id, &into_values(inputs)).await;
            print!("{}", result.output);
            Ok(result.success)
        }
        Command::Run {
            id,
            inputs,
            background: true,
        } => run_in_background(&executor, &id, into_values(inputs)).await,
    }
}

/// Build an executor over the real filesystem and process backend.
///
/// Must be called from within a tokio runtime.
pub fn build_executor(cfg: &ConfigFile) -> Executor {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let registry = Arc::new(Registry::load(cfg.discovery.clone(), Arc::clone(&fs)));
    Executor::new(
        registry,
        fs,
        Arc::new(RealProcessBackend::new()),
        cfg.execution.clone(),
        Handle::current(),
    )
}

fn into_values(pairs: Vec<(String, String)>) -> InputValues {
    pairs.into_iter().collect()
}

fn print_list(executor: &Executor) {
    let automations = executor.registry().list();
    if automations.is_empty() {
        println!("no automations found in {:?}", executor.registry().root());
        return;
    }
    println!("automations ({}):", automations.len());
    for d in automations.iter() {
        println!("  {:<24} {}", d.id, d.name);
        println!("  {:<24} {}", "", d.description);
    }
}

fn print_show(executor: &Executor, id: &str) -> bool {
    let Some(d) = executor.registry().get(id) else {
        println!("automation not found: {id}");
        return false;
    };
    print_descriptor(&d);
    true
}

fn print_descriptor(d: &Descriptor) {
    println!("{} ({})", d.name, d.id);
    println!("  {}", d.description);
    println!("  entry:    {}", d.entry_path.display());
    println!("  manifest: {}", d.manifest_path.display());
    if d.inputs.is_empty() {
        println!("  inputs:   none");
        return;
    }
    println!("  inputs:");
    for (pos, input) in d.inputs.iter().enumerate() {
        let required = if input.required { "required" } else { "optional" };
        print!("    {}. {} [{}, {}] {}", pos + 1, input.id, input.kind, required, input.label);
        match &input.filters {
            Some(filters) => println!(" ({filters})"),
            None => println!(),
        }
    }
}

fn validate(executor: &Executor, id: &str, inputs: &InputValues) -> bool {
    let Some(d) = executor.registry().get(id) else {
        println!("automation not found: {id}");
        return false;
    };
    let violations = executor.validate(&d, inputs);
    if violations.is_empty() {
        println!("inputs are valid");
        return true;
    }
    for v in &violations {
        println!("{}: {v}", v.input());
    }
    false
}

async fn run_in_background(executor: &Executor, id: &str, inputs: InputValues) -> Result<bool> {
    let (tx, rx) = oneshot::channel::<Completion>();
    let execution_id = executor.run_async(id, inputs, move |completion| {
        let _ = tx.send(completion);
    });
    println!("started execution {execution_id}");

    tokio::select! {
        completion = rx => {
            let completion = completion.context("background execution dropped its callback")?;
            let verdict = if completion.success { "completed" } else { "failed" };
            println!("--- execution {} {} ---", completion.execution_id, verdict);
            print!("{}", completion.output);
            debug!(tracked = executor.executions().get_all().len(), "executions still tracked");
            Ok(completion.success)
        }
        _ = tokio::signal::ctrl_c() => {
            let known = executor.cancel(&execution_id);
            info!(execution_id = %execution_id, known, "ctrl-c received; execution marked cancelled");
            println!("execution {execution_id} cancelled");
            Ok(false)
        }
    }
}
