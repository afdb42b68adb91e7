// src/tasks/builtin.rs

//! Builders for the leaf tasks, wired from configuration.

use std::path::Path;

use crate::config::model::ConfigFile;
use crate::errors::Result;
use crate::pipeline::Pipeline;
use crate::pipeline::stages::{
    Autoprefix, CommandStage, Concat, CssMinify, SassCompile, SizeReport, SourceMapInit,
    SourceMapWrite,
};
use crate::tasks::leaf::{CopyTask, PipelineTask};
use crate::tasks::names;

/// Destination subdirectories under the output root.
pub const STYLES_DEST: &str = "styles";
pub const SCRIPTS_DEST: &str = "scripts";

/// Dev styles: compiled, prefixed, bundled, minified, with a source map.
pub fn styles_task(cfg: &ConfigFile, source_dir: &Path) -> Result<PipelineTask> {
    let styles = cfg.styles();
    let mut pipeline = Pipeline::new(names::STYLES);
    if styles.source_maps {
        pipeline = pipeline.stage(SourceMapInit::new());
    }
    pipeline = pipeline
        .stage(SassCompile::new(source_dir))
        .stage(Autoprefix::new(&styles.browsers)?)
        .stage(Concat::new(&styles.output))
        .stage(CssMinify::new())
        .stage(SizeReport::new(names::STYLES));
    if styles.source_maps {
        pipeline = pipeline.stage(SourceMapWrite::new());
    }

    Ok(PipelineTask::new(
        names::STYLES,
        cfg.patterns().styles_set(),
        pipeline,
        STYLES_DEST,
    ))
}

/// Release styles: no source map, distinct bundle name.
pub fn styles_prod_task(cfg: &ConfigFile, source_dir: &Path) -> Result<PipelineTask> {
    let styles = cfg.styles();
    let pipeline = Pipeline::new(names::STYLES_PROD)
        .stage(SassCompile::new(source_dir))
        .stage(Autoprefix::new(&styles.browsers)?)
        .stage(Concat::new(&styles.prod_output))
        .stage(CssMinify::new())
        .stage(SizeReport::new(names::STYLES_PROD));

    Ok(PipelineTask::new(
        names::STYLES_PROD,
        cfg.patterns().styles_set(),
        pipeline,
        STYLES_DEST,
    ))
}

pub fn scripts_task(cfg: &ConfigFile) -> PipelineTask {
    let scripts = cfg.scripts();
    let pipeline = Pipeline::new(names::SCRIPTS)
        .stage(CommandStage::new("transpile", scripts.transpile_cmd.clone()))
        .stage(Concat::new(&scripts.output))
        .stage(CommandStage::new("minify", scripts.minify_cmd.clone()))
        .stage(SizeReport::new(names::SCRIPTS));

    PipelineTask::new(
        names::SCRIPTS,
        cfg.patterns().scripts_set(),
        pipeline,
        SCRIPTS_DEST,
    )
}

pub fn copy_task(cfg: &ConfigFile) -> CopyTask {
    let patterns = cfg.patterns();
    CopyTask::new(vec![patterns.html_set(), patterns.extras_set()])
}
