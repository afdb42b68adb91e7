// src/pipeline/stage.rs

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::pipeline::asset::Asset;

/// Future returned by [`Stage::apply`].
pub type StageFuture<'a> = Pin<Box<dyn Future<Output = Result<StageOutput>> + Send + 'a>>;

/// One transformation step.
///
/// A stage consumes a sequence of assets and produces a sequence of assets
/// (possibly a single merged one). Per-file problems go into
/// [`StageOutput::failures`] and the remaining files continue; returning `Err`
/// aborts the whole task.
pub trait Stage: Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, assets: Vec<Asset>) -> StageFuture<'_>;
}

/// Result of running one stage (or a whole pipeline).
#[derive(Debug, Default)]
pub struct StageOutput {
    pub assets: Vec<Asset>,
    pub failures: Vec<TransformFailure>,
}

impl StageOutput {
    pub fn new(assets: Vec<Asset>) -> Self {
        Self {
            assets,
            failures: Vec::new(),
        }
    }
}

/// A single input that failed a transform stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformFailure {
    pub path: String,
    pub stage: String,
    pub message: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

static LOCATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+):(\d+)\b").expect("location regex is valid"));

impl TransformFailure {
    /// Build a failure, pulling `line:column` out of the compiler message
    /// when one is present (the last occurrence wins).
    pub fn new(path: impl Into<String>, stage: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        let location = LOCATION_RE
            .captures_iter(&message)
            .last()
            .and_then(|caps| {
                let line = caps.get(1)?.as_str().parse().ok()?;
                let column = caps.get(2)?.as_str().parse().ok()?;
                Some((line, column))
            });

        Self {
            path: path.into(),
            stage: stage.into(),
            message: message.trim().to_string(),
            line: location.map(|(l, _)| l),
            column: location.map(|(_, c)| c),
        }
    }
}

impl fmt::Display for TransformFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)?;
        if let (Some(line), Some(column)) = (self.line, self.column) {
            write!(f, ":{line}:{column}")?;
        }
        let first_line = self.message.lines().next().unwrap_or_default();
        write!(f, " [{}] {}", self.stage, first_line)
    }
}

/// Apply `f` to every asset independently, collecting failures.
pub fn map_assets<F>(stage: &str, assets: Vec<Asset>, mut f: F) -> StageOutput
where
    F: FnMut(Asset) -> std::result::Result<Option<Asset>, String>,
{
    let mut output = StageOutput::default();
    for asset in assets {
        let path = asset.display_path();
        match f(asset) {
            Ok(Some(asset)) => output.assets.push(asset),
            Ok(None) => debug!(stage, path = %path, "asset dropped by stage"),
            Err(message) => {
                let failure = TransformFailure::new(path, stage, message);
                warn!(stage, failure = %failure, "transform failed");
                output.failures.push(failure);
            }
        }
    }
    output
}

/// Ordered list of stages. Each stage starts only after the previous one has
/// produced its full output.
pub struct Pipeline {
    name: String,
    stages: Vec<Box<dyn Stage>>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("stages", &self.stage_names())
            .finish()
    }
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub async fn run(&self, assets: Vec<Asset>) -> Result<StageOutput> {
        let mut current = assets;
        let mut failures = Vec::new();

        for stage in &self.stages {
            debug!(
                pipeline = %self.name,
                stage = stage.name(),
                inputs = current.len(),
                "running stage"
            );
            let mut output = stage.apply(current).await?;
            failures.append(&mut output.failures);
            current = output.assets;
        }

        Ok(StageOutput {
            assets: current,
            failures,
        })
    }
}
