// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Caller-registered instruction handlers, checked before the built-in instruction set

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::{InterpreterError, Operands, StepOutcome};

/// A handler for an operation code, registered with [Interpreter::override_op].
///
/// Any `Fn(&mut Operands<'_>) -> Result<StepOutcome, InterpreterError>` closure that is
/// `Send + Sync` implements this trait. Handlers that need mutable state should keep it behind a
/// [Mutex](std::sync::Mutex) or a channel.
///
/// A handler may return [`StepOutcome::Awaiting`] to have the instruction retried once input is
/// available, but only if [`Operands::take_input`] returned [`None`]; the instruction pointer is
/// left on the instruction, though any memory it wrote stays written.
///
/// [Interpreter::override_op]: crate::Interpreter::override_op
pub trait OpHandler: Send + Sync {
    /// Execute one instruction
    fn execute(&self, ops: &mut Operands<'_>) -> Result<StepOutcome, InterpreterError>;
}

impl<F> OpHandler for F
where
    F: Fn(&mut Operands<'_>) -> Result<StepOutcome, InterpreterError> + Send + Sync,
{
    fn execute(&self, ops: &mut Operands<'_>) -> Result<StepOutcome, InterpreterError> {
        self(ops)
    }
}

/// Registered overrides, keyed by two-digit operation code.
///
/// Cloning shares the handlers themselves.
#[derive(Clone, Default)]
pub(crate) struct Overrides(BTreeMap<i64, Arc<dyn OpHandler>>);

impl Overrides {
    pub(crate) fn get(&self, code: i64) -> Option<Arc<dyn OpHandler>> {
        self.0.get(&code).cloned()
    }

    pub(crate) fn insert(
        &mut self,
        code: i64,
        handler: Arc<dyn OpHandler>,
    ) -> Option<Arc<dyn OpHandler>> {
        self.0.insert(code, handler)
    }

    pub(crate) fn remove(&mut self, code: i64) -> Option<Arc<dyn OpHandler>> {
        self.0.remove(&code)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Overrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}
