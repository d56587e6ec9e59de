//! Session driver for integration tests
//!
//! Wires a session to a headless terminal and steps it event by event.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use replkit::repl::{input_channel, ChannelTerminal, EventSender, ReplOptions, Session};

const STEP_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Harness {
    pub session: Session,
    pub input: EventSender,
    pub terminal: ChannelTerminal,
    pub exits: Arc<AtomicUsize>,
}

/// Session with default options and a counting `exit` command
pub fn harness() -> Harness {
    harness_with(ReplOptions::new())
}

pub fn harness_with(options: ReplOptions) -> Harness {
    let (input, receiver) = input_channel();
    let terminal = ChannelTerminal::new();
    let exits = Arc::new(AtomicUsize::new(0));
    let counter = exits.clone();

    let options = if options.host_exit.is_some() {
        options
    } else {
        options.with_host_exit(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    };
    let session = Session::new(options.with_io(receiver, terminal.clone())).unwrap();
    terminal.take_output();

    Harness {
        session,
        input,
        terminal,
        exits,
    }
}

impl Harness {
    /// Handle one wake-up; `false` once closed
    pub async fn step(&mut self) -> bool {
        tokio::time::timeout(STEP_TIMEOUT, self.session.step())
            .await
            .expect("session step timed out")
            .unwrap()
    }

    /// Step until nothing is in flight or the session closes
    pub async fn settle(&mut self) {
        while self.session.is_busy() && !self.session.is_closed() {
            self.step().await;
        }
    }

    /// Feed one line, wait for it to finish and return what was written
    pub async fn line(
        &mut self,
        line: &str,
    ) -> String {
        assert!(self.input.line(line));
        self.step().await;
        self.settle().await;
        self.terminal.take_output()
    }

    /// Feed one interrupt and return what was written
    pub async fn interrupt(&mut self) -> String {
        assert!(self.input.interrupt());
        self.step().await;
        self.terminal.take_output()
    }

    pub fn exit_calls(&self) -> usize {
        self.exits.load(Ordering::SeqCst)
    }
}
