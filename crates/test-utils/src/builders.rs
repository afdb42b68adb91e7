#![allow(dead_code)]

use assetpipe::config::{CompositeConfig, ConfigFile, RawConfigFile};
use assetpipe::types::TriggerWhileRunningBehaviour;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigBuilder {
    config: RawConfigFile,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn src(mut self, root: &str) -> Self {
        self.config.paths.source_root = root.to_string();
        self
    }

    pub fn dist(mut self, root: &str) -> Self {
        self.config.paths.output_root = root.to_string();
        self
    }

    pub fn styles_patterns(mut self, patterns: &[&str]) -> Self {
        self.config.patterns.styles = patterns.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn scripts_patterns(mut self, patterns: &[&str]) -> Self {
        self.config.patterns.scripts = patterns.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn extras(mut self, patterns: &[&str]) -> Self {
        self.config.patterns.extras = patterns.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn source_maps(mut self, enabled: bool) -> Self {
        self.config.styles.source_maps = enabled;
        self
    }

    pub fn browsers(mut self, queries: &[&str]) -> Self {
        self.config.styles.browsers = queries.iter().map(|q| q.to_string()).collect();
        self
    }

    pub fn transpile_cmd(mut self, cmd: &str) -> Self {
        self.config.scripts.transpile_cmd = Some(cmd.to_string());
        self
    }

    pub fn minify_cmd(mut self, cmd: &str) -> Self {
        self.config.scripts.minify_cmd = Some(cmd.to_string());
        self
    }

    pub fn behaviour(mut self, behaviour: TriggerWhileRunningBehaviour) -> Self {
        self.config.config.triggered_while_running_behaviour = behaviour;
        self
    }

    pub fn queue_length(mut self, len: usize) -> Self {
        self.config.config.queue_length = len;
        self
    }

    pub fn composite(mut self, name: &str, prepare: &[&str], run: &[&str]) -> Self {
        self.config.composite.insert(
            name.to_string(),
            CompositeConfig {
                prepare: prepare.iter().map(|t| t.to_string()).collect(),
                run: run.iter().map(|t| t.to_string()).collect(),
            },
        );
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
