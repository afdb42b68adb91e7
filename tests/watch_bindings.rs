// tests/watch_bindings.rs

mod common;
use crate::common::builders::ConfigBuilder;
use crate::common::{init_tracing, with_timeout, write_tree};

use std::error::Error;
use std::fs;
use std::time::Duration;

use tokio::sync::mpsc;

use assetpipe::engine::{RuntimeEvent, TriggerReason};
use assetpipe::paths::PatternSet;
use assetpipe::watch::{WatchBinding, spawn_bindings, standard_bindings, subscribe};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn subscription_reports_only_matching_changes() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    fs::create_dir_all(dir.path().join("styles"))?;
    fs::create_dir_all(dir.path().join("scripts"))?;

    let set = PatternSet::new("styles", &["styles/**/*.scss"]);
    let mut subscription = subscribe(dir.path(), &set)?;
    tokio::time::sleep(Duration::from_millis(200)).await;

    fs::write(dir.path().join("scripts/app.js"), "var a;")?;
    fs::write(dir.path().join("styles/main.scss"), ".a {}")?;

    let change = with_timeout(subscription.recv()).await.expect("a change event");
    assert_eq!(change.rel, "styles/main.scss");
    assert!(change.path.ends_with("styles/main.scss"));

    subscription.unsubscribe();
    assert!(!subscription.is_active());
    Ok(())
}

#[tokio::test]
async fn bindings_trigger_their_task() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    write_tree(dir.path(), &[("scripts/app.js", "var a;")]);

    let (tx, mut rx) = mpsc::channel::<RuntimeEvent>(16);
    let bindings = vec![WatchBinding::new(
        PatternSet::new("scripts", &["scripts/**/*.js", "!scripts/libs/**/*.js"]),
        "scripts",
    )];
    let _handles = spawn_bindings(dir.path(), bindings, tx)?;
    tokio::time::sleep(Duration::from_millis(200)).await;

    fs::write(dir.path().join("scripts/app.js"), "var b;")?;

    match with_timeout(rx.recv()).await {
        Some(RuntimeEvent::TaskTriggered { task, reason }) => {
            assert_eq!(task, "scripts");
            assert_eq!(reason, TriggerReason::FileWatch);
        }
        other => panic!("expected a trigger, got {other:?}"),
    }
    Ok(())
}

#[test]
fn standard_bindings_follow_the_build_file() {
    let cfg = ConfigBuilder::new().build();
    let bindings = standard_bindings(&cfg);

    let pairs: Vec<(&str, &str)> = bindings
        .iter()
        .map(|b| (b.patterns.name(), b.task.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![("styles", "styles"), ("scripts", "scripts"), ("html", "copy")]
    );
}
