// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! The view of interpreter state that instruction handlers work through

use crate::mmu::Memory;
use crate::{InterpreterError, Modes, ParamMode};

/// Parameters resolved while executing an instruction, kept only while tracing
#[derive(Debug, Default)]
pub(crate) struct Resolved {
    pub(crate) params: Vec<(i64, i64)>,
    pub(crate) modes: Vec<ParamMode>,
    pub(crate) stored: Option<i64>,
}

/// Access to the interpreter while a single instruction executes.
///
/// Every built-in instruction is implemented in terms of these methods, and [override handlers]
/// get the same view. Each call to [read](Operands::read) or [dest](Operands::dest) consumes the
/// next parameter, moving the instruction pointer past it, whether or not the instruction later
/// [jumps](Operands::jump).
///
/// [override handlers]: crate::OpHandler
pub struct Operands<'a> {
    mem: &'a mut Memory,
    rel_base: &'a mut i64,
    input: &'a mut Option<i64>,
    raw: i64,
    start: i64,
    consumed: usize,
    jump: Option<i64>,
    resolved: Option<Resolved>,
}

impl<'a> Operands<'a> {
    pub(crate) fn new(
        mem: &'a mut Memory,
        rel_base: &'a mut i64,
        input: &'a mut Option<i64>,
        raw: i64,
        start: i64,
        tracing: bool,
    ) -> Self {
        Self {
            mem,
            rel_base,
            input,
            raw,
            start,
            consumed: 0,
            jump: None,
            resolved: tracing.then(Resolved::default),
        }
    }

    /// Where the instruction pointer goes next, and what was resolved if tracing.
    ///
    /// Moving past the end of the address space is an overflow.
    pub(crate) fn finish(self) -> (Result<i64, InterpreterError>, Option<Resolved>) {
        let next = match self.jump {
            Some(target) => Ok(target),
            None => self.offset(self.consumed),
        };
        (next, self.resolved)
    }

    /// Address `n + 1` ints past the start of the instruction
    fn offset(&self, n: usize) -> Result<i64, InterpreterError> {
        #[allow(clippy::cast_possible_wrap, reason = "at most a handful of parameters")]
        let delta = n as i64 + 1;
        self.start
            .checked_add(delta)
            .ok_or(InterpreterError::ArithmeticOverflow {
                lhs: self.start,
                rhs: delta,
            })
    }

    /// The raw int of the instruction being executed
    pub fn raw(&self) -> i64 {
        self.raw
    }

    /// The two-digit operation code of the instruction being executed
    pub fn code(&self) -> i64 {
        self.raw % 100
    }

    /// Address of the instruction being executed
    pub fn instr_ptr(&self) -> i64 {
        self.start
    }

    /// The current relative base
    pub fn rel_base(&self) -> i64 {
        *self.rel_base
    }

    fn relative(&self, offset: i64) -> Result<i64, InterpreterError> {
        self.rel_base
            .checked_add(offset)
            .ok_or(InterpreterError::ArithmeticOverflow {
                lhs: *self.rel_base,
                rhs: offset,
            })
    }

    fn next_param(&mut self) -> Result<(ParamMode, i64), InterpreterError> {
        let mode = Modes::of(self.raw).get(self.consumed)?;
        let param = self.mem.read(self.offset(self.consumed)?)?;
        self.consumed += 1;
        if let Some(resolved) = self.resolved.as_mut() {
            resolved.modes.push(mode);
        }
        Ok((mode, param))
    }

    fn record(&mut self, param: i64, val: i64) {
        if let Some(resolved) = self.resolved.as_mut() {
            resolved.params.push((param, val));
        }
    }

    /// Consume the next parameter and resolve it to a value according to its mode
    pub fn read(&mut self) -> Result<i64, InterpreterError> {
        let (mode, param) = self.next_param()?;
        let val = match mode {
            ParamMode::Positional => self.mem.read(param)?,
            ParamMode::Immediate => param,
            ParamMode::Relative => self.mem.read(self.relative(param)?)?,
        };
        self.record(param, val);
        Ok(val)
    }

    /// Consume the next parameter and resolve it to the address it designates as a write target
    pub fn dest(&mut self) -> Result<i64, InterpreterError> {
        let (mode, param) = self.next_param()?;
        let addr = match mode {
            ParamMode::Positional => param,
            ParamMode::Immediate => return Err(InterpreterError::InvalidWriteTarget(param)),
            ParamMode::Relative => self.relative(param)?,
        };
        if addr < 0 {
            return Err(InterpreterError::AddressFault(addr));
        }
        self.record(param, addr);
        Ok(addr)
    }

    /// Consume the next parameter as a write target, and store `value` there
    pub fn store(&mut self, value: i64) -> Result<(), InterpreterError> {
        let addr = self.dest()?;
        self.mem.write(addr, value)?;
        if let Some(resolved) = self.resolved.as_mut() {
            resolved.stored = Some(value);
        }
        Ok(())
    }

    /// Take the pending input, if there is one.
    ///
    /// If this returns [`None`], the handler should return [`StepOutcome::Awaiting`] so that the
    /// driver can supply input and retry the instruction.
    ///
    /// [`StepOutcome::Awaiting`]: crate::StepOutcome::Awaiting
    pub fn take_input(&mut self) -> Option<i64> {
        self.input.take()
    }

    /// Set the instruction pointer to `target` once the instruction completes
    pub fn jump(&mut self, target: i64) -> Result<(), InterpreterError> {
        if target < 0 {
            return Err(InterpreterError::AddressFault(target));
        }
        self.jump = Some(target);
        Ok(())
    }

    /// Add `delta` to the relative base
    pub fn adjust_rel_base(&mut self, delta: i64) -> Result<(), InterpreterError> {
        *self.rel_base = self.relative(delta)?;
        Ok(())
    }

    /// Read memory at `addr` directly, without consuming a parameter
    pub fn peek(&self, addr: i64) -> Result<i64, InterpreterError> {
        self.mem.read(addr)
    }

    /// Write memory at `addr` directly, without consuming a parameter
    pub fn poke(&mut self, addr: i64, value: i64) -> Result<(), InterpreterError> {
        self.mem.write(addr, value)
    }
}
