// src/paths/mod.rs

//! Pattern sets and path resolution.
//!
//! A [`PatternSet`] is a named, ordered list of glob strings; entries starting
//! with `!` exclude what they match. [`resolve`] expands a set against a source
//! root into a sorted list of relative file paths. Watch bindings reuse the
//! compiled [`PatternMatcher`] to filter change events.

pub mod pattern_set;
pub mod resolver;

pub use pattern_set::{PatternMatcher, PatternSet};
pub use resolver::{ResolvedSet, relative_str, resolve};
