//! Evaluator Trait
//!
//! Defines the interface a pluggable evaluator implements and the completion
//! handle through which it reports back.
//!
//! An evaluator is called once per input line with a [`Done`] handle. It
//! reports exactly one [`Outcome`] through that handle, either before
//! returning or later from the future it returns. Failures can also be
//! signalled by returning `Err` (synchronous throw) or by resolving the future
//! to `Err` (asynchronous rejection); the adapter routes both to the same
//! handle.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::warn;

use super::engine::context::EvalContext;
use super::value::Value;

/// Result of one dispatched line
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The evaluation failed with a thrown value
    Error(Value),
    /// The evaluation produced a value (possibly `undefined`)
    Value(Value),
    /// Completed without producing a value
    Empty,
}

impl Outcome {
    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Error(_) => "error",
            Outcome::Value(_) => "value",
            Outcome::Empty => "empty",
        }
    }
}

/// Future returned by an evaluator; resolving to `Err` is a rejection
pub type EvalFuture = Pin<Box<dyn Future<Output = Result<(), Value>> + Send + 'static>>;

/// An already-resolved [`EvalFuture`] for evaluators that finish synchronously
pub fn settled() -> EvalFuture {
    Box::pin(std::future::ready(Ok(())))
}

/// Single-shot completion handle
///
/// Clones share the same slot: whichever clone completes first delivers the
/// outcome and every later call is dropped.
#[derive(Debug, Clone)]
pub struct Done {
    slot: Arc<Mutex<Option<oneshot::Sender<Outcome>>>>,
}

impl Done {
    /// Create a handle and the receiver the outcome arrives on
    pub fn channel() -> (Self, oneshot::Receiver<Outcome>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                slot: Arc::new(Mutex::new(Some(tx))),
            },
            rx,
        )
    }

    /// Deliver an outcome. Returns `false` if one was already delivered.
    pub fn complete(
        &self,
        outcome: Outcome,
    ) -> bool {
        let Some(tx) = self.slot.lock().take() else {
            warn!(kind = outcome.kind(), "completion already delivered; ignoring");
            return false;
        };
        // The session may have closed and dropped the receiver
        let _ = tx.send(outcome);
        true
    }

    /// Complete with a value (`done(null, value)`)
    pub fn value(
        &self,
        value: Value,
    ) -> bool {
        self.complete(Outcome::Value(value))
    }

    /// Complete with an error (`done(err)`)
    pub fn error(
        &self,
        err: Value,
    ) -> bool {
        self.complete(Outcome::Error(err))
    }

    /// Complete with nothing (`done()`)
    pub fn empty(&self) -> bool {
        self.complete(Outcome::Empty)
    }

    /// Whether an outcome has already been delivered
    pub fn is_settled(&self) -> bool {
        self.slot.lock().is_none()
    }
}

/// Pluggable evaluator
pub trait Evaluator: Send + Sync {
    /// Evaluate `code` and report through `done`
    fn eval(
        &self,
        code: &str,
        context: EvalContext,
        source: &str,
        done: Done,
    ) -> Result<EvalFuture, Value>;
}

impl<F> Evaluator for F
where
    F: Fn(&str, EvalContext, &str, Done) -> Result<EvalFuture, Value> + Send + Sync,
{
    fn eval(
        &self,
        code: &str,
        context: EvalContext,
        source: &str,
        done: Done,
    ) -> Result<EvalFuture, Value> {
        self(code, context, source, done)
    }
}
