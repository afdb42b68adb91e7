// src/pipeline/stages/prefix.rs

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

use crate::errors::{PipelineError, Result};
use crate::pipeline::asset::Asset;
use crate::pipeline::stage::{Stage, StageFuture, map_assets};

/// Vendor prefixing via `lightningcss`, driven by a browserslist query list.
///
/// An empty browser list resolves to no targets, so no prefixes are added and
/// the stage only normalizes the stylesheet.
pub struct Autoprefix {
    targets: Targets,
}

impl Autoprefix {
    pub fn new(browsers: &[String]) -> Result<Self> {
        let targets = if browsers.is_empty() {
            Targets::default()
        } else {
            let resolved = Browsers::from_browserslist(browsers.iter().map(String::as_str))
                .map_err(|err| {
                    PipelineError::ConfigError(format!("invalid browsers list {browsers:?}: {err}"))
                })?;
            Targets {
                browsers: resolved,
                ..Targets::default()
            }
        };

        Ok(Self { targets })
    }

    fn prefix(&self, asset: Asset) -> std::result::Result<Option<Asset>, String> {
        let source = asset.text()?.to_string();

        let code = {
            let mut sheet = StyleSheet::parse(
                &source,
                ParserOptions {
                    filename: asset.display_path(),
                    ..ParserOptions::default()
                },
            )
            .map_err(|err| err.to_string())?;

            sheet
                .minify(MinifyOptions {
                    targets: self.targets.clone(),
                    ..MinifyOptions::default()
                })
                .map_err(|err| err.to_string())?;

            sheet
                .to_css(PrinterOptions {
                    minify: false,
                    targets: self.targets.clone(),
                    ..PrinterOptions::default()
                })
                .map_err(|err| err.to_string())?
                .code
        };

        Ok(Some(asset.with_contents(code)))
    }
}

impl Stage for Autoprefix {
    fn name(&self) -> &str {
        "autoprefixer"
    }

    fn apply(&self, assets: Vec<Asset>) -> StageFuture<'_> {
        Box::pin(async move { Ok(map_assets(self.name(), assets, |asset| self.prefix(asset))) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_browser_list_adds_no_prefixes() {
        let stage = Autoprefix::new(&[]).unwrap();
        let output = map_assets(
            "autoprefixer",
            vec![Asset::new("a.css", ".a{user-select:none}")],
            |a| stage.prefix(a),
        );

        let css = output.assets[0].text().unwrap();
        assert!(css.contains("user-select: none"));
        assert!(!css.contains("-webkit-"));
    }

    #[test]
    fn invalid_css_is_a_per_file_failure() {
        let stage = Autoprefix::new(&[]).unwrap();
        let output = map_assets(
            "autoprefixer",
            vec![Asset::new("a.css", ".a{color:red}"), Asset::new("b.css", ".b{")],
            |a| stage.prefix(a),
        );

        assert_eq!(output.assets.len() + output.failures.len(), 2);
        assert!(output.assets.iter().any(|a| a.path.ends_with("a.css")));
    }
}
