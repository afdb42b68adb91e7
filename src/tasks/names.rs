// src/tasks/names.rs

//! Built-in task names and aliases.

use std::collections::BTreeMap;

use crate::config::model::CompositeConfig;

pub const CLEAN: &str = "clean";
pub const STYLES: &str = "styles";
pub const STYLES_PROD: &str = "styles-prod";
pub const SCRIPTS: &str = "scripts";
pub const COPY: &str = "copy";
pub const DEV: &str = "dev";
pub const RELEASE: &str = "release";
pub const DEFAULT: &str = "default";
pub const WATCH: &str = "watch";

pub const LEAVES: [&str; 5] = [CLEAN, STYLES, STYLES_PROD, SCRIPTS, COPY];

/// `(alias, target)` pairs.
pub const ALIASES: [(&str, &str); 2] = [("sass", STYLES), ("sass-prod", STYLES_PROD)];

pub fn is_leaf(name: &str) -> bool {
    LEAVES.contains(&name)
}

/// Resolve an alias to the task it stands for; other names are returned as-is.
pub fn canonical(name: &str) -> &str {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, target)| *target)
        .unwrap_or(name)
}

pub fn builtin_composites() -> BTreeMap<String, CompositeConfig> {
    BTreeMap::from([
        (
            DEV.to_string(),
            CompositeConfig::concurrent([STYLES, SCRIPTS, COPY]),
        ),
        (
            RELEASE.to_string(),
            CompositeConfig::concurrent([STYLES_PROD, SCRIPTS, COPY]),
        ),
        (DEFAULT.to_string(), CompositeConfig::concurrent([DEV])),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_to_style_tasks() {
        assert_eq!(canonical("sass"), STYLES);
        assert_eq!(canonical("sass-prod"), STYLES_PROD);
        assert_eq!(canonical("scripts"), SCRIPTS);
        assert_eq!(canonical("nope"), "nope");
    }

    #[test]
    fn default_expands_to_dev() {
        let composites = builtin_composites();
        assert_eq!(composites[DEFAULT].run, vec![DEV.to_string()]);
        assert!(composites[RELEASE].run.contains(&STYLES_PROD.to_string()));
    }
}
