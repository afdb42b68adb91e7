// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::paths::PatternSet;
use crate::types::TriggerWhileRunningBehaviour;

/// Top-level configuration as read from a TOML file.
///
/// Every section is optional; an empty file reproduces the classic layout:
///
/// ```toml
/// [paths]
/// src = "src/"
/// dist = "build/"
///
/// [patterns]
/// scripts = ["scripts/**/*.js", "!scripts/libs/**/*.js"]
///
/// [composite.ci]
/// prepare = ["clean"]
/// run = ["styles-prod", "scripts", "copy"]
/// ```
///
/// This is the raw, unvalidated shape. Convert it with
/// `ConfigFile::try_from(raw)` to get normalized roots and merged composites.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    /// Watch overlap policy from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub paths: PathConfig,

    #[serde(default)]
    pub patterns: PatternsSection,

    #[serde(default)]
    pub styles: StylesSection,

    #[serde(default)]
    pub scripts: ScriptsSection,

    /// User-defined composite tasks from `[composite.<name>]`.
    #[serde(default)]
    pub composite: BTreeMap<String, CompositeConfig>,
}

/// Validated configuration.
///
/// Roots are slash-terminated, every pattern compiles, and the composite map
/// contains the built-in `dev` / `release` / `default` entries unless the file
/// overrides them.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    paths: PathConfig,
    patterns: PatternsSection,
    styles: StylesSection,
    scripts: ScriptsSection,
    composites: BTreeMap<String, CompositeConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        paths: PathConfig,
        patterns: PatternsSection,
        styles: StylesSection,
        scripts: ScriptsSection,
        composites: BTreeMap<String, CompositeConfig>,
    ) -> Self {
        Self {
            config,
            paths,
            patterns,
            styles,
            scripts,
            composites,
        }
    }

    pub fn config_section(&self) -> &ConfigSection {
        &self.config
    }

    pub fn paths(&self) -> &PathConfig {
        &self.paths
    }

    pub fn patterns(&self) -> &PatternsSection {
        &self.patterns
    }

    pub fn styles(&self) -> &StylesSection {
        &self.styles
    }

    pub fn scripts(&self) -> &ScriptsSection {
        &self.scripts
    }

    /// Effective composite tasks (built-ins merged with `[composite.*]`).
    pub fn composites(&self) -> &BTreeMap<String, CompositeConfig> {
        &self.composites
    }
}

/// `[config]` section: what happens when a watch trigger arrives while the
/// same task is still running.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// `"queue"` (default) or `"cancel"`.
    #[serde(default)]
    pub triggered_while_running_behaviour: TriggerWhileRunningBehaviour,

    /// Maximum number of follow-up runs remembered per task in queue mode.
    #[serde(default = "default_queue_length")]
    pub queue_length: usize,
}

fn default_queue_length() -> usize {
    1
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            triggered_while_running_behaviour: TriggerWhileRunningBehaviour::default(),
            queue_length: default_queue_length(),
        }
    }
}

/// `[paths]` section: the two logical roots every pattern and output is
/// relative to. Both are slash-terminated after validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PathConfig {
    #[serde(default = "default_src", rename = "src")]
    pub source_root: String,

    #[serde(default = "default_dist", rename = "dist")]
    pub output_root: String,
}

fn default_src() -> String {
    "src/".to_string()
}

fn default_dist() -> String {
    "build/".to_string()
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            source_root: default_src(),
            output_root: default_dist(),
        }
    }
}

/// `[patterns]` section. Entries starting with `!` exclude matches.
#[derive(Debug, Clone, Deserialize)]
pub struct PatternsSection {
    #[serde(default = "default_html")]
    pub html: Vec<String>,

    #[serde(default = "default_scripts")]
    pub scripts: Vec<String>,

    #[serde(default = "default_styles")]
    pub styles: Vec<String>,

    /// Static files copied verbatim next to the HTML entry point.
    #[serde(default = "default_extras")]
    pub extras: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_html() -> Vec<String> {
    strings(&["index.html"])
}

fn default_scripts() -> Vec<String> {
    strings(&["scripts/**/*.js", "!scripts/libs/**/*.js"])
}

fn default_styles() -> Vec<String> {
    strings(&["styles/**/*.css", "styles/**/*.scss"])
}

fn default_extras() -> Vec<String> {
    strings(&[
        "crossdomain.xml",
        "humans.txt",
        "manifest.appcache",
        "robots.txt",
        "favicon.ico",
    ])
}

impl Default for PatternsSection {
    fn default() -> Self {
        Self {
            html: default_html(),
            scripts: default_scripts(),
            styles: default_styles(),
            extras: default_extras(),
        }
    }
}

impl PatternsSection {
    pub fn html_set(&self) -> PatternSet {
        PatternSet::new("html", &self.html)
    }

    pub fn scripts_set(&self) -> PatternSet {
        PatternSet::new("scripts", &self.scripts)
    }

    pub fn styles_set(&self) -> PatternSet {
        PatternSet::new("styles", &self.styles)
    }

    pub fn extras_set(&self) -> PatternSet {
        PatternSet::new("extras", &self.extras)
    }

    /// All named sets, in a stable order.
    pub fn all_sets(&self) -> Vec<PatternSet> {
        vec![
            self.html_set(),
            self.scripts_set(),
            self.styles_set(),
            self.extras_set(),
        ]
    }
}

/// `[styles]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StylesSection {
    /// Browserslist queries handed to the prefixer. Empty means no vendor
    /// prefixes are added.
    #[serde(default)]
    pub browsers: Vec<String>,

    /// Bundle name for the dev variant.
    #[serde(default = "default_style_output")]
    pub output: String,

    /// Bundle name for the production variant.
    #[serde(default = "default_style_prod_output")]
    pub prod_output: String,

    /// Emit a source map next to the dev bundle.
    #[serde(default = "default_true")]
    pub source_maps: bool,
}

fn default_style_output() -> String {
    "style.min.css".to_string()
}

fn default_style_prod_output() -> String {
    "styles.min.css".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for StylesSection {
    fn default() -> Self {
        Self {
            browsers: Vec::new(),
            output: default_style_output(),
            prod_output: default_style_prod_output(),
            source_maps: true,
        }
    }
}

/// `[scripts]` section.
///
/// Transpiling and minifying scripts is delegated to external commands that
/// read a file on stdin and write the result to stdout. Leaving a command
/// unset passes the sources through unchanged.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptsSection {
    #[serde(default = "default_script_output")]
    pub output: String,

    #[serde(default)]
    pub transpile_cmd: Option<String>,

    #[serde(default)]
    pub minify_cmd: Option<String>,
}

fn default_script_output() -> String {
    "app.min.js".to_string()
}

impl Default for ScriptsSection {
    fn default() -> Self {
        Self {
            output: default_script_output(),
            transpile_cmd: None,
            minify_cmd: None,
        }
    }
}

/// `[composite.<name>]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct CompositeConfig {
    /// Tasks run one after another before `run` starts.
    #[serde(default)]
    pub prepare: Vec<String>,

    /// Tasks started together; they must write to disjoint outputs.
    #[serde(default)]
    pub run: Vec<String>,
}

impl CompositeConfig {
    pub fn concurrent<I, S>(tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prepare: Vec::new(),
            run: tasks.into_iter().map(Into::into).collect(),
        }
    }
}
