// src/tasks/leaf.rs

use tracing::{debug, info};

use crate::paths::{PatternSet, resolve};
use crate::pipeline::{Asset, Pipeline};
use crate::tasks::context::TaskContext;
use crate::tasks::report::TaskReport;
use crate::tasks::{Task, TaskFuture};

/// Recursively delete the output root. A root that does not exist is fine.
#[derive(Debug, Default)]
pub struct CleanTask;

impl Task for CleanTask {
    fn name(&self) -> &str {
        crate::tasks::names::CLEAN
    }

    fn describe(&self) -> String {
        "delete the output root".to_string()
    }

    fn run<'a>(&'a self, ctx: &'a TaskContext) -> TaskFuture<'a> {
        Box::pin(async move {
            let mut report = TaskReport::new(self.name());
            if ctx.fs.remove_dir_all(&ctx.output_dir)? {
                info!(dir = ?ctx.output_dir, "removed output root");
                report.written.push(ctx.output_dir.clone());
            } else {
                debug!(dir = ?ctx.output_dir, "output root absent; nothing to clean");
            }
            Ok(report)
        })
    }
}

/// Resolve a pattern set, push the files through a pipeline and write the
/// results under `output_dir/dest`.
///
/// Whatever the pipeline produced is written even when some inputs failed,
/// so a broken file does not wipe out the rest of the bundle.
#[derive(Debug)]
pub struct PipelineTask {
    name: String,
    inputs: PatternSet,
    pipeline: Pipeline,
    dest: String,
}

impl PipelineTask {
    pub fn new(name: impl Into<String>, inputs: PatternSet, pipeline: Pipeline, dest: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs,
            pipeline,
            dest: dest.into(),
        }
    }
}

impl Task for PipelineTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        format!(
            "{} -> {}/ via [{}]",
            self.inputs,
            self.dest,
            self.pipeline.stage_names().join(", ")
        )
    }

    fn run<'a>(&'a self, ctx: &'a TaskContext) -> TaskFuture<'a> {
        Box::pin(async move {
            let resolved = resolve(ctx.fs.as_ref(), &ctx.source_dir, &self.inputs)?;
            info!(task = %self.name, files = resolved.len(), "starting");

            let mut assets = Vec::with_capacity(resolved.len());
            for (rel, abs) in resolved.files().iter().zip(resolved.absolute()) {
                let contents = ctx.fs.read(&abs)?;
                debug!(task = %self.name, path = %rel.display(), bytes = contents.len(), "read");
                assets.push(Asset::new(rel.clone(), contents));
            }

            let output = self.pipeline.run(assets).await?;

            let mut report = TaskReport::new(self.name.as_str());
            let dest_dir = ctx.output_dir.join(&self.dest);
            for asset in &output.assets {
                let target = dest_dir.join(&asset.path);
                ctx.fs.write(&target, &asset.contents)?;
                debug!(task = %self.name, path = ?target, bytes = asset.len(), "wrote");
                report.bytes += asset.len() as u64;
                report.written.push(target);
            }
            report.failures = output.failures;
            Ok(report)
        })
    }
}

/// Copy files verbatim, keeping their path relative to the source root.
#[derive(Debug)]
pub struct CopyTask {
    sets: Vec<PatternSet>,
}

impl CopyTask {
    pub fn new(sets: Vec<PatternSet>) -> Self {
        Self { sets }
    }
}

impl Task for CopyTask {
    fn name(&self) -> &str {
        crate::tasks::names::COPY
    }

    fn describe(&self) -> String {
        let sets: Vec<String> = self.sets.iter().map(ToString::to_string).collect();
        format!("{} -> output root, unchanged", sets.join(" + "))
    }

    fn run<'a>(&'a self, ctx: &'a TaskContext) -> TaskFuture<'a> {
        Box::pin(async move {
            let mut report = TaskReport::new(self.name());
            for set in &self.sets {
                let resolved = resolve(ctx.fs.as_ref(), &ctx.source_dir, set)?;
                for (rel, abs) in resolved.files().iter().zip(resolved.absolute()) {
                    let contents = ctx.fs.read(&abs)?;
                    let target = ctx.output_dir.join(rel);
                    ctx.fs.write(&target, &contents)?;
                    debug!(path = %rel.display(), bytes = contents.len(), "copied");
                    report.bytes += contents.len() as u64;
                    report.written.push(target);
                }
            }
            info!(files = report.written.len(), "copy finished");
            Ok(report)
        })
    }
}
