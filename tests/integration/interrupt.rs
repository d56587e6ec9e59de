//! Interrupt and close handling

use std::time::Duration;

use replkit::repl::{Done, EvalContext, EvalFuture, ReplOptions, SessionEvent, Value, EXIT_ADVISORY};

use crate::harness::{harness, harness_with};

fn slow_eval(code: &str, _: EvalContext, _: &str, done: Done) -> Result<EvalFuture, Value> {
    let code = code.to_string();
    Ok(Box::pin(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        done.value(Value::from(code));
        Ok(())
    }))
}

#[tokio::test]
async fn test_double_interrupt_closes() {
    let mut h = harness();
    let mut events = h.session.subscribe();

    assert_eq!(h.interrupt().await, format!("{}> ", EXIT_ADVISORY));
    assert!(h.session.pending_exit());

    assert_eq!(h.interrupt().await, "");
    assert!(h.session.is_closed());
    assert!(!h.session.pending_exit());
    assert_eq!(events.recv().await.unwrap(), SessionEvent::Exit);
    assert!(events.try_recv().is_err());

    let transcript = h.terminal.transcript();
    assert_eq!(transcript.clears, 2);
    assert!(transcript.closed);
}

#[tokio::test]
async fn test_line_between_interrupts_keeps_session_open() {
    let mut h = harness();

    assert_eq!(h.interrupt().await, format!("{}> ", EXIT_ADVISORY));
    assert_eq!(h.line("5").await, "5\n> ");
    assert!(!h.session.pending_exit());

    assert_eq!(h.interrupt().await, format!("{}> ", EXIT_ADVISORY));
    assert!(!h.session.is_closed());
}

#[tokio::test]
async fn test_empty_line_cancels_pending_exit() {
    let mut h = harness();
    h.interrupt().await;
    h.line("").await;
    h.interrupt().await;
    assert!(!h.session.is_closed());
    assert!(h.session.pending_exit());
}

#[tokio::test]
async fn test_interrupt_during_evaluation_is_immediate() {
    let mut h = harness_with(ReplOptions::new().with_eval(slow_eval));

    assert!(h.input.line("x"));
    h.step().await;
    assert!(h.session.is_busy());

    assert_eq!(h.interrupt().await, format!("{}> ", EXIT_ADVISORY));
    assert!(h.session.is_busy());

    h.settle().await;
    assert_eq!(h.terminal.take_output(), "'x'\n> ");
    assert!(h.session.pending_exit());
}

#[tokio::test]
async fn test_double_interrupt_during_evaluation_closes() {
    let mut h = harness_with(ReplOptions::new().with_eval(slow_eval));
    let mut events = h.session.subscribe();

    assert!(h.input.line("x"));
    h.step().await;
    h.interrupt().await;
    h.interrupt().await;

    assert!(h.session.is_closed());
    assert!(!h.session.is_busy());
    assert_eq!(events.recv().await.unwrap(), SessionEvent::Exit);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.terminal.take_output(), "");
}

#[tokio::test]
async fn test_line_during_evaluation_resets_pending_exit() {
    let mut h = harness_with(ReplOptions::new().with_eval(slow_eval));

    assert!(h.input.line("a"));
    h.step().await;
    h.interrupt().await;
    assert!(h.session.pending_exit());

    assert!(h.input.line("b"));
    h.step().await;
    assert!(!h.session.pending_exit());

    h.interrupt().await;
    assert!(!h.session.is_closed());
}

#[tokio::test]
async fn test_close_discards_queued_lines() {
    let mut h = harness_with(ReplOptions::new().with_eval(slow_eval));
    let mut events = h.session.subscribe();

    assert!(h.input.line("a"));
    assert!(h.input.line("b"));
    assert!(h.input.close());
    h.session.run().await.unwrap();

    assert_eq!(h.terminal.output(), "");
    assert_eq!(events.recv().await.unwrap(), SessionEvent::Exit);
    assert!(!h.session.is_busy());
}
