// src/config/validate.rs

use std::collections::BTreeMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{CompositeConfig, ConfigFile, PathConfig, RawConfigFile};
use crate::errors::{PipelineError, Result};
use crate::tasks::names;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PipelineError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let paths = normalize_paths(&raw.paths)?;
        validate_global_config(&raw)?;
        validate_patterns(&raw)?;
        validate_outputs(&raw)?;

        let composites = merge_composites(&raw.composite)?;
        validate_composite_children(&composites)?;
        validate_composite_graph(&composites)?;
        validate_clean_placement(&composites)?;

        Ok(ConfigFile::new_unchecked(
            raw.config,
            paths,
            raw.patterns,
            raw.styles,
            raw.scripts,
            composites,
        ))
    }
}

/// Make both roots slash-terminated and reject layouts where `clean` would
/// delete the sources.
fn normalize_paths(paths: &PathConfig) -> Result<PathConfig> {
    let source_root = normalize_root("paths.src", &paths.source_root)?;
    let output_root = normalize_root("paths.dist", &paths.output_root)?;

    if source_root == output_root {
        return Err(PipelineError::ConfigError(format!(
            "paths.src and paths.dist must differ (both are '{source_root}')"
        )));
    }
    if output_root == "./" || source_root.starts_with(&output_root) {
        return Err(PipelineError::ConfigError(format!(
            "paths.dist '{output_root}' contains paths.src '{source_root}'; clean would delete the sources"
        )));
    }

    Ok(PathConfig {
        source_root,
        output_root,
    })
}

fn normalize_root(key: &str, root: &str) -> Result<String> {
    let trimmed = root.trim().replace('\\', "/");
    let trimmed = trimmed.trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(PipelineError::ConfigError(format!(
            "{key} must be a non-empty directory"
        )));
    }
    Ok(format!("{trimmed}/"))
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.queue_length == 0 {
        return Err(PipelineError::ConfigError(
            "[config].queue_length must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_patterns(cfg: &RawConfigFile) -> Result<()> {
    for set in cfg.patterns.all_sets() {
        if set.includes().is_empty() {
            return Err(PipelineError::ConfigError(format!(
                "[patterns].{} needs at least one inclusion pattern",
                set.name()
            )));
        }
        set.compile()?;
    }
    Ok(())
}

fn validate_outputs(cfg: &RawConfigFile) -> Result<()> {
    let outputs = [
        ("styles.output", &cfg.styles.output),
        ("styles.prod_output", &cfg.styles.prod_output),
        ("scripts.output", &cfg.scripts.output),
    ];
    for (key, name) in outputs {
        if name.trim().is_empty() || name.contains('/') || name.contains('\\') {
            return Err(PipelineError::ConfigError(format!(
                "{key} must be a plain file name (got '{name}')"
            )));
        }
    }

    if cfg.styles.output == cfg.styles.prod_output {
        return Err(PipelineError::ConfigError(format!(
            "styles.output and styles.prod_output must differ (both are '{}')",
            cfg.styles.output
        )));
    }
    Ok(())
}

/// Built-in composites, overridden by `[composite.<name>]` entries with the
/// same name.
fn merge_composites(
    user: &BTreeMap<String, CompositeConfig>,
) -> Result<BTreeMap<String, CompositeConfig>> {
    let mut merged = names::builtin_composites();

    for (name, composite) in user {
        if names::is_leaf(name) || names::canonical(name) != name || name == names::WATCH {
            return Err(PipelineError::ConfigError(format!(
                "composite '{name}' shadows a built-in task"
            )));
        }
        if composite.prepare.is_empty() && composite.run.is_empty() {
            return Err(PipelineError::ConfigError(format!(
                "composite '{name}' has neither `prepare` nor `run` tasks"
            )));
        }
        merged.insert(name.clone(), composite.clone());
    }

    Ok(merged)
}

fn validate_composite_children(composites: &BTreeMap<String, CompositeConfig>) -> Result<()> {
    for (name, composite) in composites {
        for child in composite.prepare.iter().chain(composite.run.iter()) {
            let child = names::canonical(child);
            if child == name {
                return Err(PipelineError::ConfigError(format!(
                    "composite '{name}' cannot contain itself"
                )));
            }
            if !names::is_leaf(child) && !composites.contains_key(child) {
                return Err(PipelineError::ConfigError(format!(
                    "composite '{name}' references unknown task '{child}'"
                )));
            }
        }
    }
    Ok(())
}

fn validate_composite_graph(composites: &BTreeMap<String, CompositeConfig>) -> Result<()> {
    // Edge direction: composite -> child composite.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in composites.keys() {
        graph.add_node(name.as_str());
    }

    for (name, composite) in composites {
        for child in composite.prepare.iter().chain(composite.run.iter()) {
            let child = names::canonical(child);
            if composites.contains_key(child) {
                graph.add_edge(name.as_str(), child, ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(PipelineError::CompositeCycle(format!(
            "cycle detected among composite tasks involving '{}'",
            cycle.node_id()
        ))),
    }
}

/// `clean` must never share a concurrent batch with writer tasks, so it (and
/// any composite that expands to it) may only be listed under `prepare`.
fn validate_clean_placement(composites: &BTreeMap<String, CompositeConfig>) -> Result<()> {
    for (name, composite) in composites {
        for child in &composite.run {
            if expands_to_clean(names::canonical(child), composites) {
                return Err(PipelineError::ConfigError(format!(
                    "composite '{name}' runs '{child}' concurrently, but it deletes the output root; list it under `prepare` instead"
                )));
            }
        }
    }
    Ok(())
}

/// Only called after the graph is known to be acyclic.
fn expands_to_clean(name: &str, composites: &BTreeMap<String, CompositeConfig>) -> bool {
    if name == names::CLEAN {
        return true;
    }
    match composites.get(name) {
        Some(composite) => composite
            .prepare
            .iter()
            .chain(composite.run.iter())
            .any(|child| expands_to_clean(names::canonical(child), composites)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_with_composite(name: &str, composite: CompositeConfig) -> RawConfigFile {
        let mut raw = RawConfigFile::default();
        raw.composite.insert(name.to_string(), composite);
        raw
    }

    #[test]
    fn defaults_are_valid_and_slash_terminated() {
        let mut raw = RawConfigFile::default();
        raw.paths.source_root = "app".to_string();
        raw.paths.output_root = "public//".to_string();

        let cfg = ConfigFile::try_from(raw).unwrap();
        assert_eq!(cfg.paths().source_root, "app/");
        assert_eq!(cfg.paths().output_root, "public/");
        assert!(cfg.composites().contains_key("dev"));
        assert!(cfg.composites().contains_key("release"));
        assert!(cfg.composites().contains_key("default"));
    }

    #[test]
    fn output_root_enclosing_source_root_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.paths.source_root = "build/src".to_string();
        raw.paths.output_root = "build".to_string();

        let err = ConfigFile::try_from(raw).unwrap_err();
        assert!(matches!(err, PipelineError::ConfigError(msg) if msg.contains("clean would delete")));
    }

    #[test]
    fn dev_and_release_bundles_must_not_collide() {
        let mut raw = RawConfigFile::default();
        raw.styles.prod_output = raw.styles.output.clone();

        let err = ConfigFile::try_from(raw).unwrap_err();
        assert!(matches!(err, PipelineError::ConfigError(msg) if msg.contains("must differ")));
    }

    #[test]
    fn malformed_glob_is_a_resolution_error() {
        let mut raw = RawConfigFile::default();
        raw.patterns.styles = vec!["styles/[a-.scss".to_string()];

        let err = ConfigFile::try_from(raw).unwrap_err();
        assert!(matches!(err, PipelineError::Resolution { .. }));
    }

    #[test]
    fn pattern_set_with_only_exclusions_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.patterns.html = vec!["!index.html".to_string()];

        assert!(ConfigFile::try_from(raw).is_err());
    }

    #[test]
    fn composite_cycle_is_detected() {
        let mut raw = raw_with_composite("a", CompositeConfig::concurrent(["b"]));
        raw.composite
            .insert("b".to_string(), CompositeConfig::concurrent(["a"]));

        let err = ConfigFile::try_from(raw).unwrap_err();
        assert!(matches!(err, PipelineError::CompositeCycle(_)));
    }

    #[test]
    fn unknown_child_is_rejected() {
        let raw = raw_with_composite("ci", CompositeConfig::concurrent(["lint"]));

        let err = ConfigFile::try_from(raw).unwrap_err();
        assert!(matches!(err, PipelineError::ConfigError(msg) if msg.contains("unknown task 'lint'")));
    }

    #[test]
    fn clean_is_only_allowed_as_prepare_step() {
        let raw = raw_with_composite("ci", CompositeConfig::concurrent(["clean", "styles"]));
        assert!(ConfigFile::try_from(raw).is_err());

        let raw = raw_with_composite(
            "ci",
            CompositeConfig {
                prepare: vec!["clean".to_string()],
                run: vec!["release".to_string()],
            },
        );
        assert!(ConfigFile::try_from(raw).is_ok());
    }

    #[test]
    fn composite_expanding_to_clean_cannot_run_concurrently() {
        let mut raw = raw_with_composite(
            "fresh",
            CompositeConfig {
                prepare: vec!["clean".to_string()],
                run: vec!["dev".to_string()],
            },
        );
        raw.composite.insert(
            "both".to_string(),
            CompositeConfig::concurrent(["fresh", "scripts"]),
        );

        assert!(ConfigFile::try_from(raw).is_err());
    }

    #[test]
    fn aliases_are_accepted_as_children_but_not_as_names() {
        let raw = raw_with_composite("css", CompositeConfig::concurrent(["sass"]));
        assert!(ConfigFile::try_from(raw).is_ok());

        let raw = raw_with_composite("sass", CompositeConfig::concurrent(["styles"]));
        assert!(ConfigFile::try_from(raw).is_err());
    }
}
