// src/pipeline/stages/mod.rs

//! Concrete pipeline stages.
//!
//! Each stage is constructed explicitly by the task builders in
//! [`crate::tasks::builtin`]; nothing is discovered or auto-loaded.

pub mod command;
pub mod concat;
pub mod minify;
pub mod prefix;
pub mod sass;
pub mod size;
pub mod sourcemap;

pub use command::CommandStage;
pub use concat::Concat;
pub use minify::CssMinify;
pub use prefix::Autoprefix;
pub use sass::SassCompile;
pub use size::{SizeReport, format_size};
pub use sourcemap::{SourceMapInit, SourceMapWrite};
