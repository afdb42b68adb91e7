// src/pipeline/mod.rs

//! Asset pipeline: in-memory assets flowing through ordered transform stages.
//!
//! - [`asset`] defines the unit that flows between stages, including the
//!   optional source trace used for source maps.
//! - [`stage`] defines the [`Stage`] capability, per-file failures and the
//!   [`Pipeline`] that runs stages strictly in order.
//! - [`stages`] holds the concrete collaborators (style compiler, prefixer,
//!   minifier, concatenation, size report, source maps, external commands).

pub mod asset;
pub mod stage;
pub mod stages;

pub use asset::{Asset, SourceTrace, TraceSegment};
pub use stage::{Pipeline, Stage, StageFuture, StageOutput, TransformFailure, map_assets};
