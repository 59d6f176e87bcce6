//! In-flight command queue and frame dispatch.
//!
//! The server processes commands serially and answers in the order they
//! were sent, and the assembler delivers frames in arrival order, so the
//! frame at hand always belongs to the command at the head of the queue.
//! Head-of-queue dispatch is the only correlation mechanism the protocol
//! allows; there are no request ids on the wire.

use std::collections::VecDeque;

use bytes::Bytes;
use tokio::sync::oneshot;

use crate::error::{BeanlineError, Result};
use crate::job::Job;
use crate::protocol::{classify, Frame, FrameBuffer};
use crate::stats::Stats;

/// Final typed result of one command, sent through its completion channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// `INSERTED <id>`.
    Inserted(u64),
    /// A reserved or peeked job with its body.
    Job(Job),
    /// A success token with no fields (DELETED, RELEASED, BURIED, ...).
    Done,
    /// `USING <tube>`.
    Using(String),
    /// `WATCHING <count>`.
    Watching(u32),
    /// `KICKED <count>`.
    Kicked(u64),
    /// A parsed statistics document.
    Stats(Stats),
    /// A parsed tube-name list.
    Tubes(Vec<String>),
}

/// What a status step decided after classifying its line.
#[derive(Debug, PartialEq)]
pub enum StepOutcome {
    /// The command is finished with this reply.
    Done(Reply),
    /// The line declared `len` raw body bytes to follow; `id` is carried
    /// over to the payload step.
    Payload { id: u64, len: usize },
}

/// Interpreter for a status line that already passed classification.
pub type StatusFn = fn(&str) -> Result<StepOutcome>;

/// Finisher for a raw payload block, given the id stashed by the status step.
pub type PayloadFn = fn(u64, Bytes) -> Result<Reply>;

/// One response-interpreting step of a command.
///
/// The status/payload split is static; every verb's shape (one step or
/// two) is visible in its step table in [`verbs`](super::verbs).
#[derive(Debug, Clone, Copy)]
pub enum Step {
    /// Classify a status line and interpret its fields.
    Status {
        /// Error tokens this command can provoke, on top of the universal set.
        errors: &'static [&'static str],
        /// Success-token interpreter.
        interpret: StatusFn,
    },
    /// Consume the raw body a prior status step declared.
    Payload {
        /// Produces the final reply from the stashed id and the body bytes.
        finish: PayloadFn,
    },
}

/// One in-flight command awaiting its response frame(s).
#[derive(Debug)]
pub struct PendingCommand {
    /// Ordered handler steps; length 1 or 2.
    steps: Vec<Step>,
    /// Index of the next unconsumed step.
    next: usize,
    /// Job id carried from a status step to its payload step.
    stashed_id: u64,
    /// Single-fire completion channel back to the caller.
    tx: oneshot::Sender<Result<Reply>>,
}

impl PendingCommand {
    /// Create a pending command from its step table and completion channel.
    pub fn new(steps: Vec<Step>, tx: oneshot::Sender<Result<Reply>>) -> Self {
        debug_assert!(!steps.is_empty());
        Self {
            steps,
            next: 0,
            stashed_id: 0,
            tx,
        }
    }
}

/// FIFO list of in-flight commands for one connection.
#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: VecDeque<PendingCommand>,
}

impl CommandQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }

    /// Append a command at the tail. Must happen in wire-write order.
    pub fn push(&mut self, command: PendingCommand) {
        self.pending.push_back(command);
    }

    /// Number of commands awaiting responses.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no command is in flight.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Feed one frame to the head command's next step.
    ///
    /// A step failure completes only the head command; the queue stays live
    /// and subsequent frames go to the next command. When a status step
    /// declares an upcoming body, the assembler's outstanding-byte counter
    /// is set here so the next frame it produces is a payload block.
    pub fn dispatch(&mut self, frame: Frame, assembler: &mut FrameBuffer) {
        let outcome = {
            let Some(command) = self.pending.front_mut() else {
                tracing::warn!(?frame, "frame arrived with no command in flight");
                return;
            };
            run_step(command, frame)
        };

        match outcome {
            Ok(StepOutcome::Payload { id, len }) => {
                if let Some(command) = self.pending.front_mut() {
                    command.stashed_id = id;
                    command.next += 1;
                }
                assembler.expect_payload(len);
            }
            Ok(StepOutcome::Done(reply)) => {
                if let Some(command) = self.pending.pop_front() {
                    let _ = command.tx.send(Ok(reply));
                }
            }
            Err(err) => {
                if let Some(command) = self.pending.pop_front() {
                    let _ = command.tx.send(Err(err));
                }
            }
        }
    }

    /// Fail every pending command with a connection-lost error.
    ///
    /// Called when the transport disconnects; callers must never be left
    /// awaiting a response that can no longer arrive.
    pub fn fail_all(&mut self) {
        if !self.pending.is_empty() {
            tracing::debug!(count = self.pending.len(), "failing pending commands");
        }
        for command in self.pending.drain(..) {
            let _ = command.tx.send(Err(BeanlineError::ConnectionClosed));
        }
    }
}

/// Run the head command's next step against one frame.
fn run_step(command: &mut PendingCommand, frame: Frame) -> Result<StepOutcome> {
    match (command.steps[command.next], frame) {
        (Step::Status { errors, interpret }, Frame::Line(raw)) => {
            let line = std::str::from_utf8(&raw).map_err(|_| {
                BeanlineError::UnexpectedResponse(String::from_utf8_lossy(&raw).into_owned())
            })?;
            let line = classify(line, errors)?;
            interpret(line)
        }
        (Step::Payload { finish }, Frame::Payload(body)) => {
            finish(command.stashed_id, body).map(StepOutcome::Done)
        }
        (Step::Status { .. }, Frame::Payload(body)) => Err(BeanlineError::UnexpectedResponse(
            format!("{}-byte payload where a status line was expected", body.len()),
        )),
        (Step::Payload { .. }, Frame::Line(raw)) => Err(BeanlineError::UnexpectedResponse(
            String::from_utf8_lossy(&raw).into_owned(),
        )),
    }
}
