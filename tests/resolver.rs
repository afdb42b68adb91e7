// tests/resolver.rs

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::path::{Path, PathBuf};

use proptest::prelude::*;

use assetpipe::fs::mock::MockFileSystem;
use assetpipe::paths::{PatternSet, resolve};

type TestResult = Result<(), Box<dyn Error>>;

fn project() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file("src/index.html", "<html></html>");
    fs.add_file("src/robots.txt", "User-agent: *");
    fs.add_file("src/scripts/app.js", "var app;");
    fs.add_file("src/scripts/ui/menu.js", "var menu;");
    fs.add_file("src/scripts/libs/vendor.js", "var vendor;");
    fs.add_file("src/styles/main.scss", ".a {}");
    fs.add_file("src/styles/_vars.scss", "$c: red;");
    fs.add_file("src/styles/reset.css", "* {}");
    fs
}

#[test]
fn script_set_excludes_third_party_libs() -> TestResult {
    init_tracing();
    let fs = project();
    let set = PatternSet::new("scripts", &["scripts/**/*.js", "!scripts/libs/**/*.js"]);

    let resolved = resolve(&fs, Path::new("src/"), &set)?;

    assert_eq!(
        resolved.files(),
        &[
            PathBuf::from("scripts/app.js"),
            PathBuf::from("scripts/ui/menu.js"),
        ]
    );
    Ok(())
}

#[test]
fn resolution_is_sorted_and_deduplicated() -> TestResult {
    let fs = project();
    let set = PatternSet::new(
        "styles",
        &["styles/**/*.scss", "styles/**/*.css", "styles/main.scss"],
    );

    let resolved = resolve(&fs, Path::new("src"), &set)?;

    assert_eq!(
        resolved.files(),
        &[
            PathBuf::from("styles/_vars.scss"),
            PathBuf::from("styles/main.scss"),
            PathBuf::from("styles/reset.css"),
        ]
    );
    Ok(())
}

#[test]
fn missing_optional_files_resolve_to_nothing() -> TestResult {
    let fs = project();
    let set = PatternSet::new("extras", &["crossdomain.xml", "humans.txt", "robots.txt"]);

    let resolved = resolve(&fs, Path::new("src"), &set)?;

    assert_eq!(resolved.files(), &[PathBuf::from("robots.txt")]);
    Ok(())
}

#[test]
fn missing_source_root_is_an_error() {
    let fs = MockFileSystem::new();
    let set = PatternSet::new("html", &["index.html"]);

    assert!(resolve(&fs, Path::new("nowhere"), &set).is_err());
}

#[test]
fn malformed_glob_is_a_resolution_error() {
    let fs = project();
    let set = PatternSet::new("broken", &["styles/[.scss"]);

    let err = resolve(&fs, Path::new("src"), &set).unwrap_err();
    assert!(err.to_string().contains("broken"));
}

proptest! {
    #[test]
    fn negation_always_wins(name in "[a-z]{1,8}", dir in "[a-z]{1,6}") {
        let set = PatternSet::new("scripts", &["scripts/**/*.js", "!scripts/libs/**/*.js"]);
        let matcher = set.compile().unwrap();

        let excluded = format!("scripts/libs/{dir}/{name}.js");
        let direct = format!("scripts/libs/{name}.js");
        prop_assert!(!matcher.matches(&excluded));
        prop_assert!(!matcher.matches(&direct));

        if dir != "libs" {
            let included = format!("scripts/{dir}/{name}.js");
            prop_assert!(matcher.matches(&included));
        }
    }
}
