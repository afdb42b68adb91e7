// src/pipeline/stages/command.rs

use std::process::Stdio;

use anyhow::Context;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::pipeline::asset::Asset;
use crate::pipeline::stage::{Stage, StageFuture, StageOutput, TransformFailure};

/// Pipe each asset through an external shell command.
///
/// The asset contents go to stdin and stdout becomes the new contents. The
/// asset's relative path is exported as `ASSETPIPE_FILE`. A non-zero exit is
/// a per-file failure; a command that cannot be spawned aborts the task.
/// Without a command the stage passes assets through untouched.
#[derive(Debug, Clone)]
pub struct CommandStage {
    label: String,
    command: Option<String>,
}

enum FilterError {
    Spawn(anyhow::Error),
    Failed(String),
}

impl CommandStage {
    pub fn new(label: impl Into<String>, command: Option<String>) -> Self {
        Self {
            label: label.into(),
            command: command.filter(|c| !c.trim().is_empty()),
        }
    }

    async fn filter(&self, cmd_line: &str, asset: &Asset) -> std::result::Result<Vec<u8>, FilterError> {
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(cmd_line);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(cmd_line);
            c
        };

        cmd.env("ASSETPIPE_FILE", asset.display_path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning '{cmd_line}' for stage '{}'", self.label))
            .map_err(FilterError::Spawn)?;

        if let Some(mut stdin) = child.stdin.take() {
            let input = asset.contents.clone();
            tokio::spawn(async move {
                // A filter that exits without reading stdin is not an error here.
                let _ = stdin.write_all(&input).await;
            });
        }

        let output = child
            .wait_with_output()
            .await
            .with_context(|| format!("waiting for '{cmd_line}'"))
            .map_err(FilterError::Spawn)?;

        if output.status.success() {
            Ok(output.stdout)
        } else {
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(FilterError::Failed(format!(
                "'{cmd_line}' exited with {code}\n{}",
                stderr.trim()
            )))
        }
    }
}

impl Stage for CommandStage {
    fn name(&self) -> &str {
        &self.label
    }

    fn apply(&self, assets: Vec<Asset>) -> StageFuture<'_> {
        Box::pin(async move {
            let Some(cmd_line) = self.command.as_deref() else {
                debug!(stage = %self.label, "no command configured; passing through");
                return Ok(StageOutput::new(assets));
            };

            let mut output = StageOutput::default();
            for asset in assets {
                match self.filter(cmd_line, &asset).await {
                    Ok(stdout) => {
                        // Offsets into the old contents mean nothing after an external rewrite.
                        let mut asset = asset.with_contents(stdout);
                        asset.trace = None;
                        output.assets.push(asset);
                    }
                    Err(FilterError::Failed(message)) => {
                        let failure =
                            TransformFailure::new(asset.display_path(), &self.label, message);
                        warn!(stage = %self.label, failure = %failure, "transform failed");
                        output.failures.push(failure);
                    }
                    Err(FilterError::Spawn(err)) => return Err(err.into()),
                }
            }
            Ok(output)
        })
    }
}
