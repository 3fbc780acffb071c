// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Running an [Interpreter] as a [tokio] task, connected to other tasks through queues
//!
//! Each running interpreter reads from one unbounded input queue and writes to one unbounded
//! output queue. When it needs input that isn't there yet, it yields to the scheduler until some
//! arrives, so any number of interpreters can share a single-threaded runtime.
//!
//! # Example
//!
//! ```
//! use intcode::prelude::*;
//! use intcode::task::Exit;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! // example from day 5, which outputs 999 if its input is below 8, 1000 if it's 8, and 1001
//! // if it's above 8
//! let interp = Interpreter::new([
//!     3, 21, 1008, 21, 8, 20, 1005, 20, 22, 107, 8, 21, 20, 1006, 20, 31, 1106, 0, 36, 98, 0,
//!     0, 1002, 21, 125, 20, 4, 20, 1105, 1, 46, 104, 999, 1105, 1, 46, 1101, 1000, 1, 20, 4,
//!     20, 1105, 1, 46, 98, 99,
//! ]);
//! let (input, mut output, task) = interp.spawn_piped();
//! input.send(8).unwrap();
//! assert_eq!(output.recv().await, Some(1000));
//! assert_eq!(task.join().await, Ok(Exit::Halted));
//! # }
//! ```

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::{Interpreter, InterpreterError, StepOutcome};

/// How many instructions run between yields to the scheduler when no I/O happens
const YIELD_INTERVAL: u32 = 1024;

/// Why an interpreter task stopped without faulting
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Exit {
    /// The program halted
    Halted,
    /// Cancellation was requested
    Cancelled,
    /// The program output a value, but nothing was left to receive it
    OutputClosed,
}

/// Requests cancellation of one or more running interpreters.
///
/// Created with [cancellation], and cheap to clone.
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<watch::Sender<bool>>);

/// Observed by a running interpreter to know when it's been cancelled
#[derive(Debug, Clone)]
pub struct CancelSignal(watch::Receiver<bool>);

/// Create a connected [CancelHandle] and [CancelSignal]
pub fn cancellation() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle(Arc::new(tx)), CancelSignal(rx))
}

impl CancelHandle {
    /// Request cancellation. Interpreters observing the signal stop before their next instruction.
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Create another signal observing this handle
    pub fn signal(&self) -> CancelSignal {
        CancelSignal(self.0.subscribe())
    }
}

impl CancelSignal {
    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Wait until cancellation is requested. If every [CancelHandle] is dropped first, this
    /// never completes.
    pub async fn cancelled(&mut self) {
        let handles_dropped = self.0.wait_for(|&cancelled| cancelled).await.is_err();
        if handles_dropped {
            std::future::pending::<()>().await;
        }
    }
}

impl Interpreter {
    /// Run in the current task, taking inputs from `input` and sending outputs to `output`, until
    /// the program halts, faults, or `cancel` is triggered.
    ///
    /// If `input` is closed and drained when an input instruction runs, the interpreter faults
    /// with [InterpreterError::StarvedInput]. If `output` is closed when the program outputs a
    /// value, this returns [`Exit::OutputClosed`] and the value is dropped.
    pub async fn run_with_queues(
        &mut self,
        input: &mut mpsc::UnboundedReceiver<i64>,
        output: &mpsc::UnboundedSender<i64>,
        cancel: &mut CancelSignal,
    ) -> Result<Exit, InterpreterError> {
        let mut pending = None;
        let mut budget = YIELD_INTERVAL;
        loop {
            if cancel.is_cancelled() {
                debug!(ip = self.instr_ptr(), "interpreter task cancelled");
                return Ok(Exit::Cancelled);
            }
            match self.step(&mut pending)? {
                StepOutcome::Running => {
                    budget -= 1;
                    if budget == 0 {
                        budget = YIELD_INTERVAL;
                        tokio::task::yield_now().await;
                    }
                }
                StepOutcome::Output(val) => {
                    if output.send(val).is_err() {
                        debug!(val, "output queue closed");
                        return Ok(Exit::OutputClosed);
                    }
                    budget = YIELD_INTERVAL;
                    tokio::task::yield_now().await;
                }
                StepOutcome::Awaiting => {
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => {
                            debug!(ip = self.instr_ptr(), "interpreter task cancelled while awaiting input");
                            return Ok(Exit::Cancelled);
                        }
                        received = input.recv() => match received {
                            Some(val) => pending = Some(val),
                            None => return Err(self.fault(InterpreterError::StarvedInput)),
                        },
                    }
                }
                StepOutcome::Halted => return Ok(Exit::Halted),
            }
        }
    }

    /// Spawn a task running the interpreter with [Interpreter::run_with_queues].
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        self,
        input: mpsc::UnboundedReceiver<i64>,
        output: mpsc::UnboundedSender<i64>,
    ) -> VmTask {
        let (cancel, signal) = cancellation();
        self.spawn_with_signal(input, output, signal, cancel)
    }

    /// Spawn a task that stops when `cancel` is triggered, so that several interpreters can be
    /// cancelled together.
    pub fn spawn_cancellable(
        self,
        input: mpsc::UnboundedReceiver<i64>,
        output: mpsc::UnboundedSender<i64>,
        cancel: &CancelHandle,
    ) -> VmTask {
        self.spawn_with_signal(input, output, cancel.signal(), cancel.clone())
    }

    /// Spawn a task, creating its queues. Returns the sending end of its input queue, the
    /// receiving end of its output queue, and the task.
    pub fn spawn_piped(
        self,
    ) -> (
        mpsc::UnboundedSender<i64>,
        mpsc::UnboundedReceiver<i64>,
        VmTask,
    ) {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (output_tx, output_rx) = mpsc::unbounded_channel();
        (input_tx, output_rx, self.spawn(input_rx, output_tx))
    }

    fn spawn_with_signal(
        mut self,
        mut input: mpsc::UnboundedReceiver<i64>,
        output: mpsc::UnboundedSender<i64>,
        mut signal: CancelSignal,
        cancel: CancelHandle,
    ) -> VmTask {
        let handle = tokio::spawn(async move {
            let result = self.run_with_queues(&mut input, &output, &mut signal).await;
            (self, result)
        });
        VmTask { handle, cancel }
    }
}

/// An interpreter running as a tokio task, created by [Interpreter::spawn] and friends.
///
/// Dropping this does not stop the task; use [VmTask::cancel] for that.
#[derive(Debug)]
pub struct VmTask {
    handle: JoinHandle<(Interpreter, Result<Exit, InterpreterError>)>,
    cancel: CancelHandle,
}

impl VmTask {
    /// Ask the task to stop. It won't execute any more instructions, and finishes with
    /// [`Exit::Cancelled`] unless it already finished some other way.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A handle that cancels this task
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Whether the task has finished
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the task to finish, returning how it stopped.
    ///
    /// # Panics
    ///
    /// If the task panicked, the panic is resumed here.
    pub async fn join(self) -> Result<Exit, InterpreterError> {
        self.finish().await.1
    }

    /// Wait for the task to finish, returning the interpreter along with how it stopped.
    ///
    /// If the runtime shut down before the task finished, the interpreter is lost, and a fresh,
    /// empty one is returned with [`Exit::Cancelled`].
    ///
    /// # Panics
    ///
    /// If the task panicked, the panic is resumed here.
    pub async fn finish(self) -> (Interpreter, Result<Exit, InterpreterError>) {
        match self.handle.await {
            Ok(finished) => finished,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => (Interpreter::new([]), Ok(Exit::Cancelled)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_and_signals_agree() {
        let (handle, signal) = cancellation();
        let other = handle.signal();
        assert!(!signal.is_cancelled());
        handle.clone().cancel();
        assert!(handle.is_cancelled());
        assert!(signal.is_cancelled());
        assert!(other.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_wakes_waiters() {
        let (handle, mut signal) = cancellation();
        let waiter = tokio::spawn(async move { signal.cancelled().await });
        tokio::task::yield_now().await;
        handle.cancel();
        waiter.await.unwrap();
    }
}
