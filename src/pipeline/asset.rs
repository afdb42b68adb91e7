// src/pipeline/asset.rs

use std::path::{Path, PathBuf};

/// One file flowing through a pipeline.
///
/// `path` is relative: to the source root when read, to the task's
/// destination directory when written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub path: PathBuf,
    pub contents: Vec<u8>,
    /// Present once source-map tracking has been initialised.
    pub trace: Option<SourceTrace>,
}

impl Asset {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
            trace: None,
        }
    }

    /// Contents as UTF-8 text.
    pub fn text(&self) -> Result<&str, String> {
        std::str::from_utf8(&self.contents)
            .map_err(|err| format!("{} is not valid UTF-8: {err}", self.display_path()))
    }

    /// Path with forward slashes, used in logs, failures and source maps.
    pub fn display_path(&self) -> String {
        self.path.to_string_lossy().replace('\\', "/")
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.display_path())
    }

    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|e| e.to_str())
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = path.as_ref().to_path_buf();
        self
    }

    pub fn with_contents(mut self, contents: impl Into<Vec<u8>>) -> Self {
        self.contents = contents.into();
        self
    }
}

/// Which original sources make up an asset and where each one starts.
///
/// Single-file assets carry one segment at offset 0; concatenation shifts and
/// merges segments; the minifier rewrites offsets as it shrinks each segment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceTrace {
    pub segments: Vec<TraceSegment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceSegment {
    /// Original path relative to the source root.
    pub source: String,
    /// Original file contents, embedded as `sourcesContent`.
    pub source_contents: String,
    /// Byte offset of this segment in the asset's current contents.
    pub offset: usize,
}

impl SourceTrace {
    pub fn single(source: impl Into<String>, source_contents: impl Into<String>) -> Self {
        Self {
            segments: vec![TraceSegment {
                source: source.into(),
                source_contents: source_contents.into(),
                offset: 0,
            }],
        }
    }

    /// Byte ranges of each segment within contents of length `total`.
    pub fn ranges(&self, total: usize) -> Vec<(usize, usize)> {
        self.segments
            .iter()
            .enumerate()
            .map(|(i, seg)| {
                let end = self
                    .segments
                    .get(i + 1)
                    .map(|next| next.offset)
                    .unwrap_or(total);
                (seg.offset.min(total), end.min(total))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_cover_contents() {
        let trace = SourceTrace {
            segments: vec![
                TraceSegment {
                    source: "a.css".into(),
                    source_contents: String::new(),
                    offset: 0,
                },
                TraceSegment {
                    source: "b.css".into(),
                    source_contents: String::new(),
                    offset: 4,
                },
            ],
        };
        assert_eq!(trace.ranges(10), vec![(0, 4), (4, 10)]);
    }

    #[test]
    fn non_utf8_contents_are_reported_with_path() {
        let asset = Asset::new("favicon.ico", vec![0xff, 0xfe]);
        let err = asset.text().unwrap_err();
        assert!(err.contains("favicon.ico"));
    }
}
