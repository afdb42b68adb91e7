// src/pipeline/stages/concat.rs

use std::path::PathBuf;

use crate::pipeline::asset::{Asset, SourceTrace, TraceSegment};
use crate::pipeline::stage::{Stage, StageFuture, StageOutput};

/// Merge every input into a single asset named `output`, joined by newlines.
///
/// No inputs means no output. The merged asset always records where each
/// input starts: traced inputs keep their segments, untraced ones get a
/// segment named after the input with no source contents. Source maps are
/// only written by [`SourceMapWrite`](super::SourceMapWrite), so the
/// boundaries alone do not produce a map.
#[derive(Debug, Clone)]
pub struct Concat {
    output: String,
    separator: String,
}

impl Concat {
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            separator: "\n".to_string(),
        }
    }

    fn merge(&self, assets: Vec<Asset>) -> Option<Asset> {
        if assets.is_empty() {
            return None;
        }

        let mut contents = Vec::new();
        let mut segments: Vec<TraceSegment> = Vec::new();

        for (i, asset) in assets.into_iter().enumerate() {
            if i > 0 {
                contents.extend_from_slice(self.separator.as_bytes());
            }
            let base = contents.len();
            let trace = match asset.trace {
                Some(trace) => trace,
                None => SourceTrace::single(asset.display_path(), String::new()),
            };
            segments.extend(trace.segments.into_iter().map(|seg| TraceSegment {
                offset: base + seg.offset,
                ..seg
            }));
            contents.extend_from_slice(&asset.contents);
        }

        let mut merged = Asset::new(PathBuf::from(&self.output), contents);
        merged.trace = Some(SourceTrace { segments });
        Some(merged)
    }
}

impl Stage for Concat {
    fn name(&self) -> &str {
        "concat"
    }

    fn apply(&self, assets: Vec<Asset>) -> StageFuture<'_> {
        Box::pin(async move { Ok(StageOutput::new(self.merge(assets).into_iter().collect())) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_in_input_order() {
        let merged = Concat::new("app.min.js")
            .merge(vec![Asset::new("a.js", "var a;"), Asset::new("b.js", "var b;")])
            .unwrap();

        assert_eq!(merged.path, PathBuf::from("app.min.js"));
        assert_eq!(merged.contents, b"var a;\nvar b;");
    }

    #[test]
    fn untraced_inputs_still_record_boundaries() {
        let merged = Concat::new("styles.min.css")
            .merge(vec![
                Asset::new("styles/a.css", ".a{}"),
                Asset::new("styles/fonts.css", "@import url(x.css);"),
            ])
            .unwrap();
        let trace = merged.trace.unwrap();

        assert_eq!(trace.segments.len(), 2);
        assert_eq!(trace.segments[0].source, "styles/a.css");
        assert_eq!(trace.segments[1].source, "styles/fonts.css");
        assert_eq!(trace.segments[1].offset, ".a{}\n".len());
        assert!(trace.segments[1].source_contents.is_empty());
    }

    #[test]
    fn empty_input_produces_nothing() {
        assert!(Concat::new("app.min.js").merge(Vec::new()).is_none());
    }

    #[test]
    fn traces_are_shifted_by_preceding_contents() {
        let mut a = Asset::new("a.css", ".a{}");
        a.trace = Some(SourceTrace::single("styles/a.scss", ".a {}"));
        let mut b = Asset::new("b.css", ".b{}");
        b.trace = Some(SourceTrace::single("styles/b.scss", ".b {}"));

        let merged = Concat::new("style.min.css").merge(vec![a, b]).unwrap();
        let trace = merged.trace.unwrap();

        assert_eq!(trace.segments.len(), 2);
        assert_eq!(trace.segments[1].source, "styles/b.scss");
        assert_eq!(trace.segments[1].offset, ".a{}\n".len());
    }
}
