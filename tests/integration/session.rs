//! End-to-end session tests

use proptest::prelude::*;
use replkit::repl::{
    input_channel, settled, ChannelTerminal, Done, EvalContext, EvalFuture, ReplError, ReplMode, ReplOptions, Session,
    SessionEvent, Value, INVALID_KEYWORD,
};

use crate::harness::{harness, harness_with, Harness};

#[tokio::test]
async fn test_default_evaluator_prints_result() {
    let mut h = harness();
    assert_eq!(h.line("1+1").await, "2\n> ");
    assert_eq!(h.line("'a' + 'b'").await, "'ab'\n> ");
    assert_eq!(h.line("[1, { x: 2 }]").await, "[ 1, { x: 2 } ]\n> ");
}

#[tokio::test]
async fn test_exit_command_calls_host_exit_without_event() {
    let mut h = harness();
    let mut events = h.session.subscribe();

    assert_eq!(h.line(".exit").await, "> ");
    assert_eq!(h.exit_calls(), 1);
    assert!(!h.session.is_closed());
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_unknown_keyword() {
    let mut h = harness();
    assert_eq!(h.line(".bogus").await, format!("{}> ", INVALID_KEYWORD));
    assert_eq!(h.exit_calls(), 0);
}

#[tokio::test]
async fn test_failing_evaluator_keeps_session_open() {
    let fail = |_: &str, _: EvalContext, _: &str, done: Done| -> Result<EvalFuture, Value> {
        done.error(Value::error("Error", "E"));
        Ok(settled())
    };
    let mut h = harness_with(ReplOptions::new().with_eval(fail));

    assert_eq!(h.line("anything").await, "Error: E\n> ");
    assert_eq!(h.line("again").await, "Error: E\n> ");
    assert!(!h.session.is_closed());
}

#[tokio::test]
async fn test_deeply_nested_line_is_an_error() {
    let mut h = harness();
    let nested = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
    assert_eq!(h.line(&nested).await, "RangeError: Maximum call stack size exceeded\n> ");
    assert!(!h.session.is_closed());
    assert_eq!(h.line("[[[1]]]").await, "[ [ [ 1 ] ] ]\n> ");
}

#[tokio::test]
async fn test_blank_line_only_reprompts() {
    let mut h = harness();
    assert_eq!(h.line("").await, "> ");
    assert_eq!(h.line("   ").await, "> ");
}

#[tokio::test]
async fn test_prompt_from_string_and_change() {
    let mut h = harness_with(ReplOptions::from("js> "));
    assert_eq!(h.session.prompt(), "js> ");
    assert_eq!(h.line("3").await, "3\njs> ");

    h.session.set_prompt("$ ");
    assert_eq!(h.line("4").await, "4\n$ ");
}

#[tokio::test]
async fn test_first_prompt_is_shown_on_construction() {
    let (_input, receiver) = input_channel();
    let terminal = ChannelTerminal::new();
    let _session = Session::new(ReplOptions::from("? ").with_io(receiver, terminal.clone())).unwrap();

    let transcript = terminal.transcript();
    assert_eq!(transcript.output, "? ");
    assert_eq!(transcript.prompts, 1);
}

#[tokio::test]
async fn test_input_without_output_is_rejected() {
    let (_input, receiver) = input_channel();
    let options = ReplOptions {
        input: Some(receiver),
        ..ReplOptions::default()
    };
    let err = Session::new(options).err().unwrap();
    assert!(matches!(err, ReplError::Config { .. }));
    assert!(err.to_string().starts_with("Configuration error"));
}

#[test]
fn test_default_terminal_needs_runtime() {
    let err = Session::new(ReplOptions::new()).err().unwrap();
    assert!(matches!(err, ReplError::Config { .. }));
}

#[tokio::test]
async fn test_compatibility_options_are_exposed() {
    let options = ReplOptions {
        repl_mode: ReplMode::Strict,
        use_global: true,
        break_eval_on_sigint: true,
        terminal: Some(true),
        use_colors: Some(false),
        ..ReplOptions::new()
    };
    let h = harness_with(options);
    assert_eq!(h.session.repl_mode(), ReplMode::Strict);
    assert!(h.session.use_global());
    assert!(h.session.break_eval_on_sigint());
    assert!(h.session.is_terminal());
    assert!(!h.session.use_colors());
    assert!(h.session.preview());
}

#[tokio::test]
async fn test_history_setup_is_forwarded() {
    let mut h = harness();
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("history");

    h.session.setup_history(&path).unwrap();
    assert_eq!(h.terminal.transcript().history_path, Some(path));
}

#[tokio::test]
async fn test_close_event_emits_exit_once() {
    let mut h = harness();
    let mut events = h.session.subscribe();

    assert!(h.input.close());
    assert!(!h.step().await);
    h.session.close();

    assert_eq!(events.recv().await.unwrap(), SessionEvent::Exit);
    assert!(events.try_recv().is_err());
    assert!(h.terminal.transcript().closed);
    assert!(!h.step().await);
}

#[tokio::test]
async fn test_dropped_input_closes_session() {
    let Harness {
        mut session, input, ..
    } = harness();
    let mut events = session.subscribe();
    drop(input);

    session.run().await.unwrap();
    assert!(session.is_closed());
    assert_eq!(events.recv().await.unwrap(), SessionEvent::Exit);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_one_prompt_per_evaluated_line(line in "[0-9a-z+*/ ()'-]{0,16}") {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let (prompts_before, prompts_after, output) = runtime.block_on(async {
            let mut h = harness();
            let before = h.terminal.transcript().prompts;
            let output = h.line(&line).await;
            (before, h.terminal.transcript().prompts, output)
        });

        prop_assert_eq!(prompts_after, prompts_before + 1);
        prop_assert!(output.ends_with("> "));
        prop_assert!(!output.contains(INVALID_KEYWORD));
    }
}
