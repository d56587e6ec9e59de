//! Evaluator protocol tests

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use replkit::repl::{settled, Done, EvalContext, EvalFuture, ReplOptions, Value, SOURCE_LABEL};

use crate::harness::harness_with;

fn undefined_eval(_: &str, _: EvalContext, _: &str, done: Done) -> Result<EvalFuture, Value> {
    done.value(Value::Undefined);
    Ok(settled())
}

#[tokio::test]
async fn test_undefined_is_printed_by_default() {
    let mut h = harness_with(ReplOptions::new().with_eval(undefined_eval));
    assert_eq!(h.line("x").await, "undefined\n> ");
}

#[tokio::test]
async fn test_ignore_undefined() {
    let options = ReplOptions {
        ignore_undefined: true,
        ..ReplOptions::new().with_eval(undefined_eval)
    };
    let mut h = harness_with(options);
    assert!(h.session.ignore_undefined());
    assert_eq!(h.line("x").await, "> ");
}

#[tokio::test]
async fn test_ignore_undefined_still_prints_null() {
    let options = ReplOptions {
        ignore_undefined: true,
        ..ReplOptions::new()
    };
    let mut h = harness_with(options);
    assert_eq!(h.line("undefined").await, "> ");
    assert_eq!(h.line("null").await, "null\n> ");
}

#[tokio::test]
async fn test_evaluator_sees_raw_line_and_fresh_context() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = calls.clone();
    let eval = move |code: &str, context: EvalContext, source: &str, done: Done| -> Result<EvalFuture, Value> {
        sink.lock().push((code.to_string(), context.is_empty(), source.to_string()));
        done.empty();
        Ok(settled())
    };
    let mut h = harness_with(ReplOptions::new().with_eval(eval));

    assert_eq!(h.line("  1 + 1  ").await, "> ");
    assert_eq!(*calls.lock(), vec![("  1 + 1  ".to_string(), true, SOURCE_LABEL.to_string())]);
}

#[tokio::test]
async fn test_synchronous_throw_is_reported() {
    let eval = |_: &str, _: EvalContext, _: &str, _: Done| -> Result<EvalFuture, Value> {
        Err(Value::error("TypeError", "setup failed"))
    };
    let mut h = harness_with(ReplOptions::new().with_eval(eval));
    assert_eq!(h.line("x").await, "TypeError: setup failed\n> ");
}

#[tokio::test]
async fn test_async_rejection_is_reported() {
    let eval = |_: &str, _: EvalContext, _: &str, _: Done| -> Result<EvalFuture, Value> {
        Ok(Box::pin(async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Err(Value::from("rejected"))
        }))
    };
    let mut h = harness_with(ReplOptions::new().with_eval(eval));
    assert_eq!(h.line("x").await, "'rejected'\n> ");
}

#[tokio::test]
async fn test_second_completion_is_ignored() {
    let eval = |_: &str, _: EvalContext, _: &str, done: Done| -> Result<EvalFuture, Value> {
        assert!(done.value(Value::from(1)));
        assert!(!done.value(Value::from(2)));
        assert!(!done.error(Value::from("late")));
        Ok(settled())
    };
    let mut h = harness_with(ReplOptions::new().with_eval(eval));

    assert_eq!(h.line("x").await, "1\n> ");
    assert_eq!(h.terminal.transcript().prompts, 2);
}

#[tokio::test]
async fn test_dropped_completion_reprompts() {
    let eval = |_: &str, _: EvalContext, _: &str, done: Done| -> Result<EvalFuture, Value> {
        drop(done);
        Ok(settled())
    };
    let mut h = harness_with(ReplOptions::new().with_eval(eval));
    assert_eq!(h.line("x").await, "> ");
}

#[tokio::test]
async fn test_lines_are_processed_in_arrival_order() {
    let started = Arc::new(Mutex::new(Vec::new()));
    let log = started.clone();
    let eval = move |code: &str, _: EvalContext, _: &str, done: Done| -> Result<EvalFuture, Value> {
        log.lock().push(code.to_string());
        let delay: u64 = code.trim().parse().unwrap_or(0);
        let code = code.trim().to_string();
        Ok(Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            done.value(Value::from(code));
            Ok(())
        }))
    };
    let mut h = harness_with(ReplOptions::new().with_eval(eval));

    for line in ["30", "1", ".nope", "10"] {
        assert!(h.input.line(line));
    }
    while h.terminal.transcript().prompts < 5 {
        h.step().await;
    }

    assert_eq!(
        h.terminal.take_output(),
        format!("'30'\n> '1'\n> {}> '10'\n> ", replkit::repl::INVALID_KEYWORD)
    );
    assert_eq!(*started.lock(), vec!["30", "1", "10"]);
    assert!(!h.session.is_busy());
}

#[tokio::test]
async fn test_custom_writer() {
    let options = ReplOptions::new().with_writer(|value: &Value| format!("<{}>", value.type_of()));
    let mut h = harness_with(options);

    assert_eq!(h.line("1").await, "<number>\n> ");
    assert_eq!(h.line("'s'").await, "<string>\n> ");
    assert_eq!(h.line("missing").await, "<object>\n> ");
}
