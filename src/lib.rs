// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod paths;
pub mod pipeline;
pub mod tasks;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, bail};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, load_or_default};
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions};
use crate::exec::RegistryExecutor;
use crate::fs::RealFileSystem;
use crate::tasks::{RunSummary, TaskContext, TaskRegistry, names};
use crate::watch::{spawn_bindings, standard_bindings};

/// High-level entry point used by `main.rs`.
///
/// Loads the config, builds the task registry and runs the requested tasks
/// one after another. `watch` subscribes the standard bindings and blocks
/// until Ctrl-C.
pub async fn run(args: CliArgs) -> Result<()> {
    let explicit = args.config.as_deref().map(Path::new);
    let (cfg, config_path) = load_or_default(explicit)?;
    let project_root = config_root_dir(&config_path);

    let ctx = Arc::new(TaskContext::new(
        Arc::new(RealFileSystem),
        &project_root,
        cfg.paths(),
    ));
    let registry = TaskRegistry::from_config(&cfg, &ctx.source_dir)?;
    let requested = args.task_names();

    if args.dry_run {
        print_dry_run(&cfg, &registry, &ctx, &requested);
        return Ok(());
    }

    let mut failed: Vec<String> = Vec::new();
    for (i, name) in requested.iter().enumerate() {
        if name == names::WATCH {
            if i + 1 < requested.len() {
                warn!(ignored = ?&requested[i + 1..], "tasks after `watch` never run");
            }
            return watch(&cfg, registry, ctx).await;
        }

        let summary: RunSummary = Arc::clone(&registry)
            .run(name.clone(), Arc::clone(&ctx))
            .await?;
        summary.print(name);
        if !summary.is_success() {
            failed.push(name.clone());
        }
    }

    if !failed.is_empty() {
        bail!("task(s) failed: {}", failed.join(", "));
    }
    Ok(())
}

/// Subscribe the standard bindings and drive watch-triggered runs until
/// Ctrl-C.
async fn watch(cfg: &ConfigFile, registry: Arc<TaskRegistry>, ctx: Arc<TaskContext>) -> Result<()> {
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let _handles = spawn_bindings(&ctx.source_dir, standard_bindings(cfg), rt_tx.clone())?;

    // Ctrl-C -> graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let section = cfg.config_section();
    let core = CoreRuntime::new(
        section.triggered_while_running_behaviour,
        section.queue_length,
        RuntimeOptions {
            exit_when_idle: false,
        },
    );
    let executor = RegistryExecutor::new(registry, ctx.clone(), rt_tx);

    println!(
        "[assetpipe] watching {} (Ctrl-C to stop)",
        ctx.source_dir.display()
    );
    info!(
        behaviour = ?section.triggered_while_running_behaviour,
        queue_length = section.queue_length,
        "watch started"
    );

    Runtime::new(core, rt_rx, executor).run().await?;
    Ok(())
}

/// Directory containing the config file, or `.`.
fn config_root_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn print_dry_run(cfg: &ConfigFile, registry: &TaskRegistry, ctx: &TaskContext, requested: &[String]) {
    println!("assetpipe dry-run");
    println!("  source root = {}", ctx.source_dir.display());
    println!("  output root = {}", ctx.output_dir.display());
    println!(
        "  config.triggered_while_running_behaviour = {:?}",
        cfg.config_section().triggered_while_running_behaviour
    );
    println!("  config.queue_length = {}", cfg.config_section().queue_length);
    println!();

    println!("patterns:");
    for set in cfg.patterns().all_sets() {
        println!("  {set}");
    }
    println!();

    println!("tasks:");
    for name in registry.names() {
        let description = registry.describe(name).unwrap_or_default();
        println!("  - {name}: {description}");
    }
    for (alias, target) in registry.aliases() {
        println!("  - {alias} -> {target}");
    }
    println!("  - {}: rebuild on change (styles, scripts, html)", names::WATCH);
    println!();

    println!("would run:");
    for name in requested {
        match registry.expand(name) {
            Ok(leaves) => println!("  {name}: {}", leaves.join(", ")),
            Err(_) if name == names::WATCH => println!("  {name}"),
            Err(err) => println!("  {name}: {err}"),
        }
    }

    debug!("dry-run complete (no execution)");
}
