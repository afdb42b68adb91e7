// src/watch/subscription.rs

use std::path::{Path, PathBuf};

use anyhow::Context;
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::paths::{PatternMatcher, PatternSet, relative_str};
use crate::types::ChangeKind;

/// One matching filesystem change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Absolute path as reported by the OS.
    pub path: PathBuf,
    /// Path relative to the subscription root, forward slashes.
    pub rel: String,
    pub kind: ChangeKind,
}

/// A live subscription. Dropping it (or calling [`Subscription::unsubscribe`])
/// stops the underlying watcher.
pub struct Subscription {
    set: String,
    rx: mpsc::UnboundedReceiver<ChangeEvent>,
    watcher: Option<RecommendedWatcher>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("set", &self.set)
            .field("active", &self.watcher.is_some())
            .finish()
    }
}

impl Subscription {
    /// Next matching change. `None` once unsubscribed and drained.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }

    pub fn unsubscribe(&mut self) {
        if self.watcher.take().is_some() {
            debug!(set = %self.set, "unsubscribed");
        }
        self.rx.close();
    }

    pub fn is_active(&self) -> bool {
        self.watcher.is_some()
    }
}

/// Watch `root` recursively and yield changes whose path (relative to `root`)
/// matches `patterns`.
pub fn subscribe(root: &Path, patterns: &PatternSet) -> Result<Subscription> {
    let matcher = patterns.compile()?;
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());

    let (tx, rx) = mpsc::unbounded_channel::<ChangeEvent>();

    let callback_root = root.clone();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for change in classify(&callback_root, &matcher, &event) {
                    if tx.send(change).is_err() {
                        return;
                    }
                }
            }
            Err(err) => {
                eprintln!("assetpipe: file watch error: {err}");
            }
        },
        Config::default(),
    )
    .context("creating file watcher")?;

    watcher
        .watch(&root, RecursiveMode::Recursive)
        .with_context(|| format!("watching {}", root.display()))?;

    info!(set = %patterns.name(), root = ?root, "subscribed");

    Ok(Subscription {
        set: patterns.name().to_string(),
        rx,
        watcher: Some(watcher),
    })
}

fn classify(root: &Path, matcher: &PatternMatcher, event: &Event) -> Vec<ChangeEvent> {
    let kinds: Vec<(Option<ChangeKind>, &PathBuf)> = match event.kind {
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if event.paths.len() == 2 => vec![
            (Some(ChangeKind::Deleted), &event.paths[0]),
            (Some(ChangeKind::Created), &event.paths[1]),
        ],
        kind => {
            let change = change_kind(kind);
            event.paths.iter().map(|p| (change, p)).collect()
        }
    };

    kinds
        .into_iter()
        .filter_map(|(kind, path)| {
            let kind = kind?;
            let Some(rel) = relative_str(root, path) else {
                warn!(path = ?path, root = ?root, "could not relativize watched path");
                return None;
            };
            if !matcher.matches(&rel) {
                return None;
            }
            Some(ChangeEvent {
                path: path.clone(),
                rel,
                kind,
            })
        })
        .collect()
}

fn change_kind(kind: EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Remove(_) => Some(ChangeKind::Deleted),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(ChangeKind::Deleted),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(ChangeKind::Created),
        EventKind::Modify(_) | EventKind::Any => Some(ChangeKind::Modified),
        EventKind::Access(_) | EventKind::Other => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, RemoveKind};

    fn matcher() -> PatternMatcher {
        PatternSet::new("styles", &["styles/**/*.scss"]).compile().unwrap()
    }

    #[test]
    fn events_are_filtered_and_classified() {
        let root = Path::new("/project/src");
        let event = Event::new(EventKind::Create(CreateKind::File))
            .add_path(root.join("styles/a.scss"))
            .add_path(root.join("scripts/app.js"));

        let changes = classify(root, &matcher(), &event);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].rel, "styles/a.scss");
        assert_eq!(changes[0].kind, ChangeKind::Created);
    }

    #[test]
    fn rename_both_splits_into_delete_and_create() {
        let root = Path::new("/project/src");
        let event = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(root.join("styles/old.scss"))
            .add_path(root.join("styles/new.scss"));

        let kinds: Vec<_> = classify(root, &matcher(), &event)
            .into_iter()
            .map(|c| (c.rel, c.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("styles/old.scss".to_string(), ChangeKind::Deleted),
                ("styles/new.scss".to_string(), ChangeKind::Created),
            ]
        );
    }

    #[test]
    fn kinds_map_to_user_facing_verbs() {
        assert_eq!(
            change_kind(EventKind::Modify(ModifyKind::Data(DataChange::Content))).map(ChangeKind::verb),
            Some("changed")
        );
        assert_eq!(
            change_kind(EventKind::Remove(RemoveKind::File)).map(ChangeKind::verb),
            Some("deleted")
        );
        assert_eq!(change_kind(EventKind::Other), None);
    }
}
