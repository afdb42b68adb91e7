// src/paths/pattern_set.rs

use std::fmt;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::errors::{PipelineError, Result};

/// Named ordered sequence of glob strings.
///
/// Inclusion and exclusion entries are kept apart; exclusions are evaluated
/// against the same root and can only narrow the matched set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSet {
    name: String,
    includes: Vec<String>,
    excludes: Vec<String>,
}

impl PatternSet {
    /// Split raw entries into inclusion and `!`-prefixed exclusion globs.
    pub fn new<S: AsRef<str>>(name: impl Into<String>, entries: &[S]) -> Self {
        let mut includes = Vec::new();
        let mut excludes = Vec::new();

        for entry in entries {
            let entry = entry.as_ref().trim();
            match entry.strip_prefix('!') {
                Some(negated) => excludes.push(normalize_pattern(negated)),
                None => includes.push(normalize_pattern(entry)),
            }
        }

        Self {
            name: name.into(),
            includes,
            excludes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    pub fn excludes(&self) -> &[String] {
        &self.excludes
    }

    /// Compile the set into a matcher. Malformed globs (and bare `!`) are
    /// resolution errors.
    pub fn compile(&self) -> Result<PatternMatcher> {
        let include = build_globset(&self.name, &self.includes)?;
        let exclude = if self.excludes.is_empty() {
            None
        } else {
            Some(build_globset(&self.name, &self.excludes)?)
        };

        Ok(PatternMatcher {
            name: self.name.clone(),
            include,
            exclude,
        })
    }
}

impl fmt::Display for PatternSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self
            .includes
            .iter()
            .cloned()
            .chain(self.excludes.iter().map(|e| format!("!{e}")))
            .collect();
        write!(f, "{} = {:?}", self.name, entries)
    }
}

/// Compiled inclusion/exclusion globs for one pattern set.
///
/// Paths passed to [`PatternMatcher::matches`] are relative to the root the
/// patterns were written against, with forward slashes (e.g. `"styles/a.scss"`).
#[derive(Clone)]
pub struct PatternMatcher {
    name: String,
    include: GlobSet,
    exclude: Option<GlobSet>,
}

impl fmt::Debug for PatternMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternMatcher")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl PatternMatcher {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Negation wins: a path matched by any exclusion is never matched.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.include.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

fn normalize_pattern(pattern: &str) -> String {
    pattern.trim_start_matches("./").replace('\\', "/")
}

/// `*` does not cross directory separators; `**` does.
fn build_globset(set_name: &str, patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        if pat.is_empty() {
            return Err(PipelineError::Resolution {
                set: set_name.to_string(),
                message: "empty pattern".to_string(),
            });
        }
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .map_err(|err| PipelineError::Resolution {
                set: set_name.to_string(),
                message: format!("invalid glob pattern '{pat}': {err}"),
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|err| PipelineError::Resolution {
        set: set_name.to_string(),
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(entries: &[&str]) -> PatternMatcher {
        PatternSet::new("test", entries).compile().unwrap()
    }

    #[test]
    fn splits_negated_entries() {
        let set = PatternSet::new("scripts", &["scripts/**/*.js", "!scripts/libs/**/*.js"]);
        assert_eq!(set.includes(), ["scripts/**/*.js"]);
        assert_eq!(set.excludes(), ["scripts/libs/**/*.js"]);
    }

    #[test]
    fn double_star_matches_top_level_and_nested_files() {
        let m = matcher(&["styles/**/*.scss"]);
        assert!(m.matches("styles/a.scss"));
        assert!(m.matches("styles/partials/deep/b.scss"));
        assert!(!m.matches("styles/a.css"));
        assert!(!m.matches("other/styles/a.scss"));
    }

    #[test]
    fn single_star_stays_within_a_directory() {
        let m = matcher(&["*.txt"]);
        assert!(m.matches("humans.txt"));
        assert!(!m.matches("docs/humans.txt"));
    }

    #[test]
    fn negation_wins_over_inclusion() {
        let m = matcher(&["scripts/**/*.js", "!scripts/libs/**/*.js"]);
        assert!(m.matches("scripts/app.js"));
        assert!(!m.matches("scripts/libs/vendor.js"));
        assert!(!m.matches("scripts/libs/jquery/jquery.js"));
    }

    #[test]
    fn leading_dot_slash_is_ignored() {
        let m = matcher(&["./index.html"]);
        assert!(m.matches("index.html"));
    }

    #[test]
    fn bare_bang_is_rejected() {
        let err = PatternSet::new("html", &["index.html", "!"]).compile().unwrap_err();
        assert!(matches!(err, PipelineError::Resolution { set, .. } if set == "html"));
    }
}
