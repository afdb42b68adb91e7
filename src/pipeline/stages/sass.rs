// src/pipeline/stages/sass.rs

use std::path::{Path, PathBuf};

use grass::{InputSyntax, Options, OutputStyle};

use crate::pipeline::asset::Asset;
use crate::pipeline::stage::{Stage, StageFuture, map_assets};

/// Style preprocessor backed by `grass`.
///
/// Compiles `.scss`, `.sass` and plain `.css` inputs to compressed CSS and
/// renames them to `.css`. Partials (`_name.scss`) are skipped; they are only
/// reachable through `@use` / `@import`. A file that fails to compile is
/// reported and the others continue.
#[derive(Debug, Clone)]
pub struct SassCompile {
    source_root: PathBuf,
}

impl SassCompile {
    /// `source_root` is used to resolve `@use` / `@import` paths.
    pub fn new(source_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
        }
    }

    fn compile(&self, asset: Asset) -> Result<Option<Asset>, String> {
        if is_partial(&asset.path) {
            return Ok(None);
        }

        let source = asset.text()?.to_string();
        let syntax = match asset.extension() {
            Some("css") => InputSyntax::Css,
            Some("sass") => InputSyntax::Sass,
            _ => InputSyntax::Scss,
        };

        let mut options = Options::default()
            .style(OutputStyle::Compressed)
            .input_syntax(syntax)
            .load_path(&self.source_root);
        if let Some(parent) = asset.path.parent() {
            options = options.load_path(self.source_root.join(parent));
        }

        let css = grass::from_string(source, &options).map_err(|err| err.to_string())?;
        let renamed = asset.path.with_extension("css");

        Ok(Some(asset.with_path(renamed).with_contents(css)))
    }
}

fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}

impl Stage for SassCompile {
    fn name(&self) -> &str {
        "sass"
    }

    fn apply(&self, assets: Vec<Asset>) -> StageFuture<'_> {
        Box::pin(async move { Ok(map_assets(self.name(), assets, |asset| self.compile(asset))) })
    }
}
