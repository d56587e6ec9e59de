//! Evaluator Adapter
//!
//! Wraps a user evaluator behind one completion contract. A synchronous
//! failure (`Err` from `eval`) and an asynchronous rejection (the returned
//! future resolving to `Err`) both end up as an error outcome on the same
//! single-shot [`Done`], so each dispatched line completes exactly once.

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::context::EvalContext;
use crate::repl::backend_trait::{Done, Evaluator, Outcome};

/// Source label passed to evaluators
pub const SOURCE_LABEL: &str = "<repl>";

/// Pending completion of a dispatched line
pub type Completion = oneshot::Receiver<Outcome>;

/// Uniform front for a pluggable evaluator
#[derive(Clone)]
pub struct EvalAdapter {
    inner: Arc<dyn Evaluator>,
}

impl EvalAdapter {
    pub fn new(inner: Arc<dyn Evaluator>) -> Self {
        Self { inner }
    }

    /// The wrapped evaluator
    pub fn evaluator(&self) -> &Arc<dyn Evaluator> {
        &self.inner
    }

    /// Start evaluating `code` with a fresh context.
    ///
    /// The returned future is spawned on the current Tokio runtime and runs
    /// to completion even if the caller stops waiting for it.
    pub fn dispatch(
        &self,
        code: &str,
    ) -> Completion {
        let (done, completion) = Done::channel();

        match self.inner.eval(code, EvalContext::new(), SOURCE_LABEL, done.clone()) {
            Err(thrown) => {
                debug!("evaluator failed synchronously");
                done.error(thrown);
            }
            Ok(future) => {
                tokio::spawn(async move {
                    if let Err(rejection) = future.await {
                        debug!("evaluator future rejected");
                        done.error(rejection);
                    }
                });
            }
        }

        completion
    }
}

/// Wait for a completion
pub async fn settle(completion: Completion) -> Outcome {
    resolve(completion.await)
}

/// A dropped handle counts as completing with nothing
pub fn resolve(received: Result<Outcome, oneshot::error::RecvError>) -> Outcome {
    match received {
        Ok(outcome) => outcome,
        Err(_) => {
            warn!("evaluator dropped its completion handle without reporting");
            Outcome::Empty
        }
    }
}
