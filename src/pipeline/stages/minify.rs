// src/pipeline/stages/minify.rs

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use tracing::warn;

use crate::pipeline::asset::{Asset, SourceTrace, TraceSegment};
use crate::pipeline::stage::{Stage, StageFuture, StageOutput, TransformFailure};

/// CSS minifier backed by `lightningcss`.
///
/// Bundles are minified one source segment at a time. Each input file is
/// parsed on its own, so a plain `@import` at the top of a later file stays
/// valid, and a segment that fails is reported against its own source and
/// dropped while the rest of the bundle is kept. Segment offsets are
/// rewritten to match the minified contents.
#[derive(Debug, Clone, Default)]
pub struct CssMinify;

impl CssMinify {
    pub fn new() -> Self {
        Self
    }

    fn minify(&self, mut asset: Asset, failures: &mut Vec<TransformFailure>) -> Option<Asset> {
        let source = match asset.text() {
            Ok(text) => text.to_string(),
            Err(message) => {
                failures.push(self.failure(asset.display_path(), message));
                return None;
            }
        };

        let trace = match asset.trace.take() {
            Some(trace) if !trace.segments.is_empty() => trace,
            _ => {
                return match minify_css(&asset.display_path(), &source) {
                    Ok(minified) => Some(asset.with_contents(minified)),
                    Err(message) => {
                        failures.push(self.failure(asset.display_path(), message));
                        None
                    }
                };
            }
        };

        let ranges = trace.ranges(source.len());
        let mut out = String::with_capacity(source.len());
        let mut segments = Vec::with_capacity(trace.segments.len());

        for (segment, (start, end)) in trace.segments.into_iter().zip(ranges) {
            let Some(slice) = source.get(start..end) else {
                let message = format!("source trace for {} does not match contents", segment.source);
                failures.push(self.failure(asset.display_path(), message));
                return None;
            };
            match minify_css(&segment.source, slice) {
                Ok(minified) => {
                    segments.push(TraceSegment {
                        offset: out.len(),
                        ..segment
                    });
                    out.push_str(&minified);
                }
                Err(message) => failures.push(self.failure(segment.source, message)),
            }
        }

        if segments.is_empty() {
            return None;
        }
        asset.trace = Some(SourceTrace { segments });
        Some(asset.with_contents(out))
    }

    fn failure(&self, path: String, message: String) -> TransformFailure {
        let failure = TransformFailure::new(path, self.name(), message);
        warn!(stage = self.name(), failure = %failure, "transform failed");
        failure
    }
}

fn minify_css(filename: &str, css: &str) -> Result<String, String> {
    let mut sheet = StyleSheet::parse(
        css,
        ParserOptions {
            filename: filename.to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|err| err.to_string())?;

    sheet
        .minify(MinifyOptions::default())
        .map_err(|err| err.to_string())?;

    let printed = sheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|err| err.to_string())?;

    Ok(printed.code)
}

impl Stage for CssMinify {
    fn name(&self) -> &str {
        "cssnano"
    }

    fn apply(&self, assets: Vec<Asset>) -> StageFuture<'_> {
        Box::pin(async move {
            let mut output = StageOutput::default();
            for asset in assets {
                if let Some(asset) = self.minify(asset, &mut output.failures) {
                    output.assets.push(asset);
                }
            }
            Ok(output)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(source: &str, offset: usize) -> TraceSegment {
        TraceSegment {
            source: source.into(),
            source_contents: String::new(),
            offset,
        }
    }

    #[test]
    fn strips_whitespace() {
        let out = minify_css("a.css", ".a {\n  color: #ff0000;\n}\n").unwrap();
        assert_eq!(out, ".a{color:red}");
    }

    #[test]
    fn traced_asset_keeps_one_segment_per_source() {
        let contents = ".a {\n  color: red;\n}\n.b {\n  margin: 0px;\n}\n";
        let mut asset = Asset::new("style.min.css", contents);
        asset.trace = Some(SourceTrace {
            segments: vec![
                segment("styles/a.scss", 0),
                segment("styles/b.scss", contents.find(".b").unwrap()),
            ],
        });

        let mut failures = Vec::new();
        let minified = CssMinify::new().minify(asset, &mut failures).unwrap();
        let trace = minified.trace.as_ref().unwrap();

        assert!(failures.is_empty());
        assert_eq!(minified.text().unwrap(), ".a{color:red}.b{margin:0}");
        assert_eq!(trace.segments[0].offset, 0);
        assert_eq!(trace.segments[1].offset, ".a{color:red}".len());
    }

    #[tokio::test]
    async fn import_in_a_later_segment_is_kept() {
        let contents = ".a{color:red}\n@import url(\"https://fonts.example/x.css\");\n.f{margin:0}";
        let mut asset = Asset::new("styles.min.css", contents);
        asset.trace = Some(SourceTrace {
            segments: vec![
                segment("styles/a.css", 0),
                segment("styles/fonts.css", contents.find("@import").unwrap()),
            ],
        });

        let output = CssMinify::new().apply(vec![asset]).await.unwrap();

        assert!(output.failures.is_empty(), "{:?}", output.failures);
        let text = output.assets[0].text().unwrap();
        assert!(text.starts_with(".a{color:red}@import"));
        assert!(text.ends_with(".f{margin:0}"));
    }

    #[tokio::test]
    async fn broken_segment_is_dropped_and_named() {
        let contents = ".a{color:red}\n.b{margin:0}@import url(\"x.css\");\n.c{margin:0}";
        let mut asset = Asset::new("styles.min.css", contents);
        asset.trace = Some(SourceTrace {
            segments: vec![
                segment("styles/a.css", 0),
                segment("styles/b.css", contents.find(".b").unwrap()),
                segment("styles/c.css", contents.find(".c").unwrap()),
            ],
        });

        let output = CssMinify::new().apply(vec![asset]).await.unwrap();

        assert_eq!(output.assets.len(), 1);
        assert_eq!(output.failures.len(), 1);
        assert_eq!(output.failures[0].path, "styles/b.css");
        assert_eq!(output.failures[0].stage, "cssnano");
        assert_eq!(output.assets[0].text().unwrap(), ".a{color:red}.c{margin:0}");
        assert_eq!(output.assets[0].trace.as_ref().unwrap().segments.len(), 2);
    }
}
