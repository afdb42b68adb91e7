// src/tasks/registry.rs

use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::config::model::{CompositeConfig, ConfigFile};
use crate::errors::{PipelineError, Result};
use crate::tasks::builtin;
use crate::tasks::context::TaskContext;
use crate::tasks::leaf::CleanTask;
use crate::tasks::names;
use crate::tasks::report::RunSummary;
use crate::tasks::Task;
use crate::types::TaskName;

pub type SummaryFuture = Pin<Box<dyn Future<Output = Result<RunSummary>> + Send>>;

pub enum RegistryEntry {
    Leaf(Arc<dyn Task>),
    Composite(CompositeConfig),
}

/// Name -> task lookup, plus composite expansion.
///
/// A composite may only reference tasks that are already registered, and a
/// name can be defined once, so the graph is acyclic by construction.
#[derive(Default)]
pub struct TaskRegistry {
    entries: BTreeMap<TaskName, RegistryEntry>,
    aliases: BTreeMap<TaskName, TaskName>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in task, the built-in and configured composites, and the
    /// `sass` / `sass-prod` aliases.
    pub fn from_config(cfg: &ConfigFile, source_dir: &Path) -> Result<Arc<Self>> {
        let mut registry = Self::new();

        registry.define_task(Arc::new(CleanTask))?;
        registry.define_task(Arc::new(builtin::styles_task(cfg, source_dir)?))?;
        registry.define_task(Arc::new(builtin::styles_prod_task(cfg, source_dir)?))?;
        registry.define_task(Arc::new(builtin::scripts_task(cfg)))?;
        registry.define_task(Arc::new(builtin::copy_task(cfg)))?;

        for (alias, target) in names::ALIASES {
            registry.alias(alias, target)?;
        }

        // Define composites children-first.
        let mut pending: Vec<(&String, &CompositeConfig)> = cfg.composites().iter().collect();
        while !pending.is_empty() {
            let before = pending.len();
            let mut i = 0;
            while i < pending.len() {
                let (_, composite) = pending[i];
                let ready = composite
                    .prepare
                    .iter()
                    .chain(composite.run.iter())
                    .all(|child| registry.resolve_name(child).is_ok());
                if ready {
                    let (name, composite) = pending.swap_remove(i);
                    registry.define_composite(name, composite.clone())?;
                } else {
                    i += 1;
                }
            }
            if pending.len() == before {
                let stuck: Vec<&str> = pending.iter().map(|(n, _)| n.as_str()).collect();
                return Err(PipelineError::CompositeCycle(stuck.join(", ")));
            }
        }

        Ok(Arc::new(registry))
    }

    pub fn define_task(&mut self, task: Arc<dyn Task>) -> Result<()> {
        let name = task.name().to_string();
        self.ensure_free(&name)?;
        debug!(task = %name, "registered task");
        self.entries.insert(name, RegistryEntry::Leaf(task));
        Ok(())
    }

    pub fn define_composite(&mut self, name: &str, composite: CompositeConfig) -> Result<()> {
        self.ensure_free(name)?;
        for child in composite.prepare.iter().chain(composite.run.iter()) {
            self.resolve_name(child).map_err(|_| {
                PipelineError::ConfigError(format!(
                    "composite '{name}' references unknown task '{child}'"
                ))
            })?;
        }
        debug!(task = %name, prepare = ?composite.prepare, run = ?composite.run, "registered composite");
        self.entries
            .insert(name.to_string(), RegistryEntry::Composite(composite));
        Ok(())
    }

    pub fn alias(&mut self, alias: &str, target: &str) -> Result<()> {
        self.ensure_free(alias)?;
        let target = self.resolve_name(target)?.to_string();
        self.aliases.insert(alias.to_string(), target);
        Ok(())
    }

    fn ensure_free(&self, name: &str) -> Result<()> {
        if self.entries.contains_key(name) || self.aliases.contains_key(name) {
            return Err(PipelineError::ConfigError(format!(
                "task '{name}' is already defined"
            )));
        }
        Ok(())
    }

    /// Canonical name for `name`, following aliases.
    pub fn resolve_name<'a>(&'a self, name: &'a str) -> Result<&'a str> {
        let name = self.aliases.get(name).map(String::as_str).unwrap_or(name);
        if self.entries.contains_key(name) {
            Ok(name)
        } else {
            Err(PipelineError::TaskNotFound(name.to_string()))
        }
    }

    pub fn get(&self, name: &str) -> Option<&RegistryEntry> {
        self.resolve_name(name)
            .ok()
            .and_then(|name| self.entries.get(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(a, t)| (a.as_str(), t.as_str()))
    }

    /// Leaf tasks `name` expands to, in execution order.
    pub fn expand(&self, name: &str) -> Result<Vec<TaskName>> {
        let name = self.resolve_name(name)?;
        match &self.entries[name] {
            RegistryEntry::Leaf(_) => Ok(vec![name.to_string()]),
            RegistryEntry::Composite(composite) => {
                let mut leaves = Vec::new();
                for child in composite.prepare.iter().chain(composite.run.iter()) {
                    leaves.extend(self.expand(child)?);
                }
                Ok(leaves)
            }
        }
    }

    pub fn describe(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            RegistryEntry::Leaf(task) => Some(task.describe()),
            RegistryEntry::Composite(composite) => {
                let mut parts = Vec::new();
                if !composite.prepare.is_empty() {
                    parts.push(format!("in order [{}]", composite.prepare.join(", ")));
                }
                if !composite.run.is_empty() {
                    parts.push(format!("together [{}]", composite.run.join(", ")));
                }
                Some(parts.join(", then "))
            }
        }
    }

    /// Run `name` to completion.
    ///
    /// Leaf failures are collected in the summary rather than returned, so
    /// one broken task never stops its siblings. `Err` means `name` (or a
    /// child) is not a registered task.
    pub fn run(self: Arc<Self>, name: String, ctx: Arc<TaskContext>) -> SummaryFuture {
        Box::pin(async move {
            let canonical = self.resolve_name(&name)?.to_string();
            let mut summary = RunSummary::default();

            match &self.entries[&canonical] {
                RegistryEntry::Leaf(task) => {
                    let task = Arc::clone(task);
                    info!(task = %canonical, "running task");
                    match task.run(&ctx).await {
                        Ok(report) => summary.reports.push(report),
                        Err(err) => summary.errors.push((canonical, err)),
                    }
                }
                RegistryEntry::Composite(composite) => {
                    let composite = composite.clone();
                    info!(task = %canonical, prepare = ?composite.prepare, run = ?composite.run, "running composite");

                    for child in composite.prepare {
                        let child_summary =
                            Arc::clone(&self).run(child.clone(), Arc::clone(&ctx)).await?;
                        let aborted = !child_summary.errors.is_empty();
                        summary.merge(child_summary);
                        if aborted {
                            info!(task = %canonical, step = %child, "prepare step aborted; skipping the rest");
                            return Ok(summary);
                        }
                    }

                    let mut set = JoinSet::new();
                    for child in composite.run {
                        let registry = Arc::clone(&self);
                        let ctx = Arc::clone(&ctx);
                        set.spawn(async move {
                            let result = registry.run(child.clone(), ctx).await;
                            (child, result)
                        });
                    }
                    while let Some(joined) = set.join_next().await {
                        match joined {
                            Ok((_, Ok(child_summary))) => summary.merge(child_summary),
                            Ok((_, Err(err))) => return Err(err),
                            Err(join_err) => summary
                                .errors
                                .push((canonical.clone(), anyhow::Error::from(join_err).into())),
                        }
                    }
                }
            }

            Ok(summary)
        })
    }
}
