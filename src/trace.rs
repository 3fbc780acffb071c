// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Recording which instructions an [Interpreter] executed
use std::fmt::{self, Display};

use super::{Interpreter, OpCode, ParamMode};
use crate::operands::Resolved;

#[derive(Debug, Clone, PartialEq)]
/// Information about an instruction that was executed, which can be queried with its various
/// methods, or converted into a [String] using its [Display] impl.
pub struct TracedInstr {
    op_int: i64,
    instr_ptr: i64,
    rel_base: i64,
    params: Box<[(i64, i64)]>,
    modes: Box<[ParamMode]>,
    stored: Option<i64>,
}

impl TracedInstr {
    pub(crate) fn build(op_int: i64, instr_ptr: i64, rel_base: i64, resolved: Resolved) -> Self {
        Self {
            op_int,
            instr_ptr,
            rel_base,
            params: resolved.params.into_boxed_slice(),
            modes: resolved.modes.into_boxed_slice(),
            stored: resolved.stored,
        }
    }

    /// Return the relative base at the time the traced instruction was executed
    pub fn rel_base(&self) -> i64 {
        self.rel_base
    }

    /// Return the instruction pointer's position when the traced instruction was executed
    pub fn instr_ptr(&self) -> i64 {
        self.instr_ptr
    }

    /// Return the actual integer of the traced instruction
    pub fn op_int(&self) -> i64 {
        self.op_int
    }

    /// Return the opcode of the traced instruction, or [`None`] if it was handled by an override
    /// for a code outside of the built-in instruction set
    pub fn op_code(&self) -> Option<OpCode> {
        OpCode::try_from(self.op_int % 100).ok()
    }

    /// If the instruction stored a value, return that value
    pub fn stored_val(&self) -> Option<i64> {
        self.stored
    }

    /// Return the modes of the parameters that the instruction consumed
    pub fn param_modes(&self) -> &[ParamMode] {
        &self.modes
    }

    /// Return each consumed parameter paired with what it resolved to. Write targets resolve to
    /// the address written.
    pub fn params(&self) -> &[(i64, i64)] {
        &self.params
    }
}

impl Display for TracedInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ran instruction at {:0>4}: op int {: <5} | [",
            self.instr_ptr, self.op_int
        )?;
        match self.op_code() {
            Some(op) => write!(f, "{op}")?,
            None => write!(f, "OP{}", self.op_int % 100)?,
        }
        for (i, (&(param, val), mode)) in self.params.iter().zip(&self.modes).enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{mode}{param} (resolves to {val})")?;
        }
        write!(f, "]")?;
        if let Some(stored) = self.stored {
            write!(f, " stored {stored}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
/// A log of instructions that an [Interpreter] has executed since a call to
/// [Interpreter::start_trace]
pub struct Trace(pub Vec<TracedInstr>);

impl Interpreter {
    /// Begin a [Trace] of executed instructions. If a trace is already running, this replaces that
    /// trace and returns in a [`Some`], otherwise, it returns [`None`].
    ///
    /// # Example
    /// ```
    ///# use intcode::prelude::*;
    /// let mut interp = Interpreter::new([1101, 90, 9, 4, 99]);
    /// interp.start_trace();
    /// interp.run_through_inputs(empty()).unwrap();
    /// let trace = interp.end_trace().unwrap();
    /// assert_eq!(trace.0.len(), 2);
    /// assert_eq!(trace.0[0].stored_val(), Some(99));
    /// ```
    pub fn start_trace(&mut self) -> Option<Trace> {
        self.trace.replace(Trace::default())
    }

    /// Stop tracing executed instructions into a [Trace]. If no trace was active, returns [`None`]
    ///
    /// see [Interpreter::start_trace]
    pub fn end_trace(&mut self) -> Option<Trace> {
        self.trace.take()
    }

    /// Get a view of the current trace
    pub fn show_trace(&self) -> Option<&Trace> {
        self.trace.as_ref()
    }
}
