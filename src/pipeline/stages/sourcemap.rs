// src/pipeline/stages/sourcemap.rs

//! Source map support.
//!
//! [`SourceMapInit`] tags every asset with its origin. Later stages keep the
//! [`SourceTrace`] up to date and [`SourceMapWrite`] turns it into a v3 map
//! written next to the asset, with an appended `sourceMappingURL` comment.

use anyhow::Context;
use serde::Serialize;

use crate::errors::Result;
use crate::pipeline::asset::{Asset, SourceTrace};
use crate::pipeline::stage::{Stage, StageFuture, StageOutput};

/// Prefix the browser shows original sources under.
pub const SOURCE_ROOT: &str = "/source/";

#[derive(Debug, Clone, Default)]
pub struct SourceMapInit;

impl SourceMapInit {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for SourceMapInit {
    fn name(&self) -> &str {
        "sourcemaps.init"
    }

    fn apply(&self, assets: Vec<Asset>) -> StageFuture<'_> {
        Box::pin(async move {
            let assets = assets
                .into_iter()
                .map(|mut asset| {
                    let original = String::from_utf8_lossy(&asset.contents).into_owned();
                    asset.trace = Some(SourceTrace::single(asset.display_path(), original));
                    asset
                })
                .collect();
            Ok(StageOutput::new(assets))
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SourceMapWrite;

impl SourceMapWrite {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for SourceMapWrite {
    fn name(&self) -> &str {
        "sourcemaps.write"
    }

    fn apply(&self, assets: Vec<Asset>) -> StageFuture<'_> {
        Box::pin(async move {
            let mut out = Vec::with_capacity(assets.len() * 2);
            for asset in assets {
                match asset.trace.clone() {
                    Some(trace) => {
                        let (asset, map) = attach_map(asset, &trace)?;
                        out.push(asset);
                        out.push(map);
                    }
                    None => out.push(asset),
                }
            }
            Ok(StageOutput::new(out))
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SourceMapV3 {
    version: u8,
    file: String,
    source_root: String,
    sources: Vec<String>,
    sources_content: Vec<String>,
    names: Vec<String>,
    mappings: String,
}

fn attach_map(mut asset: Asset, trace: &SourceTrace) -> Result<(Asset, Asset)> {
    let file = asset.file_name();
    let mut sources: Vec<String> = Vec::new();
    let mut sources_content: Vec<String> = Vec::new();
    let mut points = Vec::new();

    for (segment, (start, end)) in trace.segments.iter().zip(trace.ranges(asset.len())) {
        if start >= end {
            continue;
        }
        let index = match sources.iter().position(|s| *s == segment.source) {
            Some(index) => index,
            None => {
                sources.push(segment.source.clone());
                sources_content.push(segment.source_contents.clone());
                sources.len() - 1
            }
        };
        let (line, column) = generated_position(&asset.contents, start);
        points.push(MappingPoint {
            line,
            column,
            source: index,
        });
    }

    let map = SourceMapV3 {
        version: 3,
        file: file.clone(),
        source_root: SOURCE_ROOT.to_string(),
        sources,
        sources_content,
        names: Vec::new(),
        mappings: encode_mappings(&points),
    };
    let json = serde_json::to_vec(&map)
        .with_context(|| format!("serializing source map for {file}"))?;

    asset
        .contents
        .extend_from_slice(format!("\n/*# sourceMappingURL={file}.map */\n").as_bytes());
    asset.trace = None;

    let mut map_path = asset.path.clone().into_os_string();
    map_path.push(".map");
    Ok((asset, Asset::new(map_path, json)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MappingPoint {
    line: usize,
    column: usize,
    source: usize,
}

/// Zero-based line and UTF-16 column of a byte offset.
fn generated_position(contents: &[u8], offset: usize) -> (usize, usize) {
    let before = String::from_utf8_lossy(&contents[..offset.min(contents.len())]);
    let line = before.matches('\n').count();
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = before[line_start..].encode_utf16().count();
    (line, column)
}

/// Encode points (sorted by position) into the `mappings` string. Every
/// point maps to line 0, column 0 of its source.
fn encode_mappings(points: &[MappingPoint]) -> String {
    let mut out = String::new();
    let mut current_line = 0;
    let mut prev_column = 0i64;
    let mut prev_source = 0i64;
    let mut first_in_line = true;

    for point in points {
        while current_line < point.line {
            out.push(';');
            current_line += 1;
            prev_column = 0;
            first_in_line = true;
        }
        if !first_in_line {
            out.push(',');
        }
        first_in_line = false;

        let column = point.column as i64;
        let source = point.source as i64;
        encode_vlq(&mut out, column - prev_column);
        encode_vlq(&mut out, source - prev_source);
        encode_vlq(&mut out, 0);
        encode_vlq(&mut out, 0);
        prev_column = column;
        prev_source = source;
    }
    out
}

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn encode_vlq(out: &mut String, value: i64) {
    let mut vlq = if value < 0 {
        ((-value) << 1) | 1
    } else {
        value << 1
    };
    loop {
        let mut digit = (vlq & 0b1_1111) as usize;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 0b10_0000;
        }
        out.push(BASE64[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::asset::TraceSegment;

    fn vlq(value: i64) -> String {
        let mut s = String::new();
        encode_vlq(&mut s, value);
        s
    }

    #[test]
    fn vlq_matches_reference_values() {
        assert_eq!(vlq(0), "A");
        assert_eq!(vlq(1), "C");
        assert_eq!(vlq(-1), "D");
        assert_eq!(vlq(16), "gB");
    }

    #[test]
    fn mappings_track_columns_and_lines() {
        let points = [
            MappingPoint {
                line: 0,
                column: 0,
                source: 0,
            },
            MappingPoint {
                line: 0,
                column: 13,
                source: 1,
            },
            MappingPoint {
                line: 1,
                column: 0,
                source: 2,
            },
        ];
        assert_eq!(encode_mappings(&points), "AAAA,aCAA;ACAA");
    }

    #[test]
    fn write_appends_comment_and_emits_map() {
        let mut asset = Asset::new("style.min.css", ".a{color:red}.b{margin:0}");
        asset.trace = Some(SourceTrace {
            segments: vec![
                TraceSegment {
                    source: "styles/a.scss".into(),
                    source_contents: ".a { color: red; }".into(),
                    offset: 0,
                },
                TraceSegment {
                    source: "styles/b.scss".into(),
                    source_contents: ".b { margin: 0; }".into(),
                    offset: 13,
                },
            ],
        });
        let trace = asset.trace.clone().unwrap();

        let (asset, map) = attach_map(asset, &trace).unwrap();

        assert!(
            asset
                .text()
                .unwrap()
                .ends_with("/*# sourceMappingURL=style.min.css.map */\n")
        );
        assert_eq!(map.path, std::path::PathBuf::from("style.min.css.map"));

        let json: serde_json::Value = serde_json::from_slice(&map.contents).unwrap();
        assert_eq!(json["version"], 3);
        assert_eq!(json["sourceRoot"], SOURCE_ROOT);
        assert_eq!(json["sources"][1], "styles/b.scss");
        assert_eq!(json["sourcesContent"][0], ".a { color: red; }");
        assert_eq!(json["mappings"], "AAAA,aCAA");
    }
}
