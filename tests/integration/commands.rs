//! Meta-command dispatch tests

use std::sync::Arc;

use parking_lot::Mutex;
use proptest::prelude::*;
use replkit::repl::{ReplOptions, INVALID_KEYWORD};

use crate::harness::{harness, harness_with};

#[tokio::test]
async fn test_defined_command_receives_arguments() {
    let mut h = harness();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    h.session.define_command("echo", move |args| {
        sink.lock().push(args.to_string());
        Ok(())
    });

    assert_eq!(h.line(".echo hello world").await, "> ");
    assert_eq!(h.line("  .echo  ").await, "> ");
    assert_eq!(h.line(".echo\tx").await, "> ");
    assert_eq!(*seen.lock(), vec!["hello world".to_string(), String::new(), "x".to_string()]);
    assert!(h.session.commands().has("echo"));
    assert!(h.terminal.transcript().command_keywords.contains(&"echo".to_string()));
}

#[tokio::test]
async fn test_keywords_are_case_sensitive() {
    let mut h = harness();
    assert_eq!(h.line(".EXIT").await, format!("{}> ", INVALID_KEYWORD));
    assert_eq!(h.exit_calls(), 0);
}

#[tokio::test]
async fn test_redefining_exit_replaces_it() {
    let mut h = harness();
    h.session.define_command("exit", |_| Ok(()));

    assert_eq!(h.line(".exit").await, "> ");
    assert_eq!(h.exit_calls(), 0);
    assert_eq!(h.session.commands().len(), 1);
}

#[tokio::test]
async fn test_command_error_is_printed() {
    let mut h = harness();
    h.session.define_command("load", |args| anyhow::bail!("cannot open {}", args));

    assert_eq!(h.line(".load nowhere.js").await, "Error: cannot open nowhere.js\n> ");
    assert!(!h.session.is_closed());
}

#[tokio::test]
async fn test_numeric_dot_literal_is_evaluated() {
    let mut h = harness();
    assert_eq!(h.line(".5").await, "0.5\n> ");
    assert_eq!(h.line("  .25  ").await, "0.25\n> ");
}

#[tokio::test]
async fn test_double_marker_is_evaluated() {
    let mut h = harness();
    let output = h.line("..exit").await;
    assert!(output.starts_with("SyntaxError"), "{}", output);
    assert_eq!(h.exit_calls(), 0);
}

#[tokio::test]
async fn test_custom_host_exit() {
    let calls = Arc::new(Mutex::new(0));
    let counter = calls.clone();
    let mut h = harness_with(ReplOptions::new().with_host_exit(move || *counter.lock() += 1));

    assert_eq!(h.line(".exit now").await, "> ");
    assert_eq!(*calls.lock(), 1);
    assert_eq!(h.exit_calls(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_known_keyword_gets_its_arguments(
        keyword in "[a-z]{1,8}",
        args in "([a-z0-9]{1,5}( [a-z0-9]{1,5}){0,2})?",
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let (output, seen) = runtime.block_on(async {
            let mut h = harness();
            let seen = Arc::new(Mutex::new(Vec::new()));
            let sink = seen.clone();
            h.session.define_command(keyword.clone(), move |args| {
                sink.lock().push(args.to_string());
                Ok(())
            });
            let output = h.line(&format!(".{} {}", keyword, args)).await;
            let seen = seen.lock().clone();
            (output, seen)
        });

        prop_assert_eq!(output, "> ");
        prop_assert_eq!(seen, vec![args]);
    }

    #[test]
    fn prop_unknown_keyword_reported_once(keyword in "[A-Z][a-zA-Z]{0,8}") {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let output = runtime.block_on(async {
            let mut h = harness();
            h.line(&format!(".{} some args", keyword)).await
        });

        prop_assert_eq!(output.matches(INVALID_KEYWORD).count(), 1);
        prop_assert!(output.ends_with("> "));
    }
}
