// SPDX-FileCopyrightText: 2024 - 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD
#![warn(missing_docs)]

//! Library providing an Intcode virtual machine
//!
//! The interpreter is fully functional, with all of the [Opcodes] and [Parameter Modes] defined in
//! the completed Intcode computer for [Day 9].
//!
//! It can be driven in a few ways:
//!
//! * As a lazy [Iterator] of outputs, pulling inputs from another iterator as they're needed
//!   ([Interpreter::outputs])
//! * In batches, stopping whenever it needs input that hasn't been provided yet
//!   ([Interpreter::run_through_inputs])
//! * As a [tokio] task connected to an input queue and an output queue, if the `async` feature
//!   is enabled (see the [task] module)
//! * One instruction at a time ([Interpreter::step])
//!
//! # Example
//!
//! ```rust
//! use intcode::prelude::*;
//! let mut interpreter = Interpreter::new(vec![104, 1024, 99]);
//!
//! assert_eq!(
//!     interpreter.run_through_inputs(std::iter::empty()).unwrap(),
//!     (vec![1024], State::Halted)
//! );
//! ```
//!
//! Handlers for individual operation codes can be replaced with [Interpreter::override_op]:
//!
//! ```rust
//! use intcode::prelude::*;
//! use intcode::{OpCode, Operands, StepOutcome};
//!
//! // read the input twice, then output the sum
//! let mut interpreter = Interpreter::new([3, 9, 3, 10, 1, 9, 10, 11, 4, 11, 99]);
//! interpreter.override_op(OpCode::In, |ops: &mut Operands<'_>| {
//!     ops.store(-1)?;
//!     Ok(StepOutcome::Running)
//! });
//! let outputs: Result<Vec<_>, _> = interpreter.outputs(empty()).collect();
//! assert_eq!(outputs, Ok(vec![-2]));
//! ```
//!
//! [Opcodes]: https://esolangs.org/wiki/Intcode#Opcodes
//! [Parameter Modes]: https://esolangs.org/wiki/Intcode#Parameter_Modes
//! [Day 9]: https://adventofcode.com/2019/day/9

/// A module providing sparse memory, using a hashmap to split memory into pages, which are each
/// contiguous in memory.
mod mmu;

mod dispatch;
mod error;
mod internals;
mod opcode;
mod operands;
mod outputs;
pub mod trace;

#[cfg(feature = "async")]
pub mod task;

use std::fmt;
use std::ops::{Index, IndexMut};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, trace};

pub use dispatch::OpHandler;
pub use error::{InterpreterError, ProgramError};
pub use opcode::{Modes, OpCode, ParamMode, decode};
pub use operands::Operands;
pub use outputs::Outputs;

use dispatch::Overrides;
use mmu::Memory;
use trace::{Trace, TracedInstr};

/// A small module that re-exports items needed when working with the Intcode interpreter
pub mod prelude {
    pub use crate::{Interpreter, State, Status};
    pub use std::iter::empty;
}

/// The state of the intcode system, returned whenever [Interpreter::run_through_inputs] stops.
///
/// [Awaiting](State::Awaiting) means that there are more instructions to execute, but all input
/// has been consumed and the next instruction requires input.
///
/// [Halted](State::Halted) means that a `HALT` instruction has been executed. Once it's been
/// returned, no more instructions will be executed.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum State {
    /// Execution is awaiting input
    Awaiting,
    /// Execution has halted
    Halted,
}

/// What happened when a single instruction was executed
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum StepOutcome {
    /// The instruction completed, and execution can continue
    Running,
    /// The instruction output a value
    Output(i64),
    /// The instruction needs input that isn't available. The instruction pointer is left on it so
    /// that it can be retried.
    Awaiting,
    /// The program halted
    Halted,
}

/// Lifecycle of an [Interpreter]
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Status {
    /// More instructions can be executed
    Ready,
    /// A `HALT` instruction was executed
    Halted,
    /// An instruction failed, and the interpreter can't continue
    Faulted(InterpreterError),
}

#[derive(Clone)]
/// An intcode interpreter, which provides optional tracing of instructions executed.
pub struct Interpreter {
    index: i64,
    rel_offset: i64,
    code: Memory,
    status: Status,
    overrides: Overrides,
    trace: Option<Trace>,
}

// ignore overrides and the trace
impl PartialEq for Interpreter {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
            && self.rel_offset == other.rel_offset
            && self.status == other.status
            && self.code == other.code
    }
}

impl fmt::Debug for Interpreter {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = fmt.debug_struct("Interpreter");
        s.field("code", &self.code)
            .field("rbo", &self.rel_offset)
            .field("ip", &self.index)
            .field("status", &self.status);
        if !self.overrides.is_empty() {
            s.field("overrides", &self.overrides);
        }
        s.field("tracing", &self.trace.is_some()).finish()
    }
}

impl Index<i64> for Interpreter {
    type Output = i64;

    /// # Panics
    ///
    /// Panics if `i` is negative
    fn index(&self, i: i64) -> &Self::Output {
        self.code.index(i)
    }
}

impl IndexMut<i64> for Interpreter {
    /// # Panics
    ///
    /// Panics if `i` is negative
    fn index_mut(&mut self, i: i64) -> &mut Self::Output {
        self.code.index_mut(i)
    }
}

impl FromStr for Interpreter {
    type Err = ProgramError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_program(s).map(Self::new)
    }
}

/// Parse a program written as comma-separated integers, such as an Advent of Code puzzle input.
/// Whitespace around each integer, including a trailing newline, is ignored.
///
/// ```
/// assert_eq!(intcode::parse_program("1,-2, 3\n").unwrap(), vec![1, -2, 3]);
/// assert!(intcode::parse_program("1,,3").is_err());
/// ```
pub fn parse_program(src: &str) -> Result<Vec<i64>, ProgramError> {
    let src = src.trim();
    if src.is_empty() {
        return Ok(Vec::new());
    }
    src.split(',')
        .map(str::trim)
        .enumerate()
        .map(|(index, token)| {
            token.parse().map_err(|source| ProgramError::Parse {
                index,
                token: Box::from(token),
                source,
            })
        })
        .collect()
}

/// Read and [parse](parse_program) the program in the file at `path`
pub fn read_program(path: impl AsRef<Path>) -> Result<Vec<i64>, ProgramError> {
    parse_program(&std::fs::read_to_string(path)?)
}

/// Run `program` to completion, collecting its outputs.
///
/// Inputs are taken from `inputs` as they're needed. If more are needed than it provides, this
/// fails with [InterpreterError::StarvedInput].
///
/// ```
/// // example from day 5, which outputs 1 if its input is 8 and 0 otherwise
/// let program = [3, 9, 8, 9, 10, 9, 4, 9, 99, -1, 8];
/// assert_eq!(intcode::run_program(program, [8]), Ok(vec![1]));
/// assert_eq!(intcode::run_program(program, [7]), Ok(vec![0]));
/// ```
pub fn run_program(
    program: impl IntoIterator<Item = i64>,
    inputs: impl IntoIterator<Item = i64>,
) -> Result<Vec<i64>, InterpreterError> {
    Interpreter::new(program).outputs(inputs).collect()
}

impl Interpreter {
    /// Create a new interpreter. Collects `code` into the starting memory state.
    pub fn new(code: impl IntoIterator<Item = i64>) -> Self {
        Self {
            index: 0,
            rel_offset: 0,
            code: code.into_iter().collect(),
            status: Status::Ready,
            overrides: Overrides::default(),
            trace: None,
        }
    }

    /// Get the memory at `address`
    #[doc(alias = "peek")]
    pub fn mem_get(&self, address: i64) -> Result<i64, InterpreterError> {
        self.code.read(address)
    }

    /// Manually set a memory location
    #[doc(alias("poke", "write"))]
    pub fn mem_set(&mut self, address: i64, value: i64) -> Result<(), InterpreterError> {
        self.code.write(address, value)
    }

    /// The address of the next instruction to execute
    pub fn instr_ptr(&self) -> i64 {
        self.index
    }

    /// The current relative base
    pub fn rel_base(&self) -> i64 {
        self.rel_offset
    }

    /// Whether the interpreter can still run, has halted, or has faulted
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Release memory pages that only contain zeroes
    pub fn compact(&mut self) {
        self.code.prune();
    }

    /// Register `handler` for the operation code `code`, replacing the built-in behavior for it,
    /// or defining behavior for a code that's otherwise unknown. Returns the handler previously
    /// registered for `code`, if any.
    ///
    /// Operation codes are the two lowest digits of an instruction, so a `code` outside of
    /// `0..100` is never used.
    ///
    /// Clones of the interpreter share registered handlers.
    pub fn override_op<F>(&mut self, code: impl Into<i64>, handler: F) -> Option<Arc<dyn OpHandler>>
    where
        F: Fn(&mut Operands<'_>) -> Result<StepOutcome, InterpreterError> + Send + Sync + 'static,
    {
        self.overrides.insert(code.into(), Arc::new(handler))
    }

    /// Like [Interpreter::override_op], but for a handler that's already shared, or that isn't a
    /// closure
    pub fn override_with(
        &mut self,
        code: impl Into<i64>,
        handler: Arc<dyn OpHandler>,
    ) -> Option<Arc<dyn OpHandler>> {
        self.overrides.insert(code.into(), handler)
    }

    /// Remove the handler registered for `code`, restoring its built-in behavior
    pub fn remove_override(&mut self, code: impl Into<i64>) -> Option<Arc<dyn OpHandler>> {
        self.overrides.remove(code.into())
    }

    /// Mark the interpreter as faulted with `err`, and return `err`
    pub(crate) fn fault(&mut self, err: InterpreterError) -> InterpreterError {
        debug!(ip = self.index, rel_base = self.rel_offset, %err, "interpreter faulted");
        self.status = Status::Faulted(err.clone());
        err
    }

    /// Execute a single instruction.
    ///
    /// If the instruction is an input instruction, it takes its input from `input`, and if
    /// `input` is [`None`], it returns [`StepOutcome::Awaiting`] without changing anything.
    ///
    /// Once the interpreter has halted, this returns [`StepOutcome::Halted`] without doing
    /// anything, and once it has faulted, it returns the same error again.
    pub fn step(&mut self, input: &mut Option<i64>) -> Result<StepOutcome, InterpreterError> {
        match &self.status {
            Status::Ready => (),
            Status::Halted => return Ok(StepOutcome::Halted),
            Status::Faulted(err) => return Err(err.clone()),
        }
        match self.exec_instruction(input) {
            Ok(StepOutcome::Halted) => {
                debug!(ip = self.index, "interpreter halted");
                self.status = Status::Halted;
                Ok(StepOutcome::Halted)
            }
            Ok(outcome) => Ok(outcome),
            Err(err) => Err(self.fault(err)),
        }
    }

    fn exec_instruction(&mut self, input: &mut Option<i64>) -> Result<StepOutcome, InterpreterError> {
        let start = self.index;
        let instruction = self.code.read(start)?;
        let handler = self.overrides.get(instruction % 100);
        let builtin = match handler {
            Some(_) => None,
            None => Some(decode(instruction)?.0),
        };

        let rel_base = self.rel_offset;
        let mut ops = Operands::new(
            &mut self.code,
            &mut self.rel_offset,
            input,
            instruction,
            start,
            self.trace.is_some(),
        );
        let outcome = match (handler, builtin) {
            (Some(handler), _) => handler.execute(&mut ops)?,
            (None, Some(opcode)) => internals::execute(opcode, &mut ops)?,
            (None, None) => unreachable!("decoded when no handler exists"),
        };
        let (next, resolved) = ops.finish();

        if outcome == StepOutcome::Awaiting {
            return Ok(outcome);
        }
        // halting leaves the pointer where it is, even at the top of the address space
        let next = match outcome {
            StepOutcome::Halted => start,
            _ => next?,
        };

        trace!(ip = start, rel_base, instruction, ?outcome, "executed instruction");
        if let (Some(trace), Some(resolved)) = (self.trace.as_mut(), resolved) {
            trace
                .0
                .push(TracedInstr::build(instruction, start, rel_base, resolved));
        }
        self.index = next;
        Ok(outcome)
    }

    /// Execute until the program halts, outputs a value, or needs input that isn't in `input`.
    ///
    /// Never returns [`StepOutcome::Running`].
    pub fn run_until_event(
        &mut self,
        input: &mut Option<i64>,
    ) -> Result<StepOutcome, InterpreterError> {
        loop {
            match self.step(input)? {
                StepOutcome::Running => (),
                event => break Ok(event),
            }
        }
    }

    /// Execute until either the program halts, or it tries to read nonexistent input.
    /// If the interpreter halted, returns `Ok((v, s))`, where `v` is a [`Vec<i64>`] containing all
    /// outputs that it found, and `s` is the [`State`] at the time it stopped.
    ///
    /// Inputs are only taken from `inputs` when an input instruction runs, so any left over
    /// aren't consumed. Stopping in [`State::Awaiting`] isn't an error: calling this again with
    /// more inputs resumes where it left off.
    ///
    /// On error, it will return an [`InterpreterError`] that reflects the error.
    pub fn run_through_inputs(
        &mut self,
        inputs: impl IntoIterator<Item = i64>,
    ) -> Result<(Vec<i64>, State), InterpreterError> {
        let mut outputs = Vec::new();
        let mut inputs = inputs.into_iter();
        let mut current_input = None;
        loop {
            match self.run_until_event(&mut current_input)? {
                StepOutcome::Output(val) => outputs.push(val),
                StepOutcome::Awaiting => match inputs.next() {
                    Some(val) => current_input = Some(val),
                    None => break Ok((outputs, State::Awaiting)),
                },
                StepOutcome::Halted => break Ok((outputs, State::Halted)),
                StepOutcome::Running => unreachable!("run_until_event never returns Running"),
            }
        }
    }

    /// Turn the interpreter into an [Iterator] over its outputs, taking inputs from `inputs` as
    /// they're needed.
    ///
    /// see [Outputs]
    pub fn outputs<I: IntoIterator<Item = i64>>(self, inputs: I) -> Outputs<I::IntoIter> {
        Outputs::new(self, inputs.into_iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::iter::empty;
    use std::sync::Mutex;

    /// Example program from day 9, which takes no input and outputs its own code
    #[test]
    fn quine() {
        let quine_code = vec![
            109, 1, 204, -1, 1001, 100, 1, 100, 1008, 100, 16, 101, 1006, 101, 0, 99,
        ];
        let mut interpreter = Interpreter::new(quine_code.clone());
        let (outputs, State::Halted) = interpreter.run_through_inputs(empty()).unwrap() else {
            panic!("Did not halt");
        };
        assert_eq!(quine_code, outputs);
    }

    /// Example program from day 9, which "should output a 16-digit number"
    #[test]
    fn output_sixteen_digit() {
        let interpreter = Interpreter::new([1102, 34915192, 34915192, 7, 4, 7, 99, 0]);
        let outputs: Vec<i64> = interpreter.outputs(empty()).map(Result::unwrap).collect();
        assert_eq!(outputs, vec![1219070632396864]);
    }

    /// Example program from day 9, which "should output the large number in the middle"
    #[test]
    fn large_number() {
        assert_eq!(
            run_program([104, 1125899906842624, 99], empty()),
            Ok(vec![1125899906842624])
        );
    }

    /// Ensure that running out of input leaves the interpreter in a sane state that can be
    /// recovered from
    #[test]
    fn missing_input_recoverable() {
        let mut interpreter = Interpreter::new(vec![3, 10, 4, 10, 99]);
        let old_state = interpreter.clone();

        let paused_run = interpreter.run_through_inputs(empty());

        assert_eq!(paused_run, Ok((vec![], State::Awaiting)));
        assert_eq!(interpreter, old_state);

        // make sure that interpreter can still be used
        assert_eq!(
            interpreter.run_through_inputs(vec![1, 2]),
            Ok((vec![1], State::Halted))
        );
    }

    #[test]
    fn negative_addresses_fault() {
        // read through a negative position
        let mut interp = Interpreter::new([4, -3, 99]);
        assert_eq!(
            interp.run_through_inputs(empty()),
            Err(InterpreterError::AddressFault(-3))
        );
        assert_eq!(
            interp.status(),
            &Status::Faulted(InterpreterError::AddressFault(-3))
        );

        // write through a negative relative address
        let mut interp = Interpreter::new([109, -5, 21101, 1, 1, 2, 99]);
        assert_eq!(
            interp.run_through_inputs(empty()),
            Err(InterpreterError::AddressFault(-3))
        );

        // jump to a negative address
        let mut interp = Interpreter::new([1105, 1, -1]);
        assert_eq!(
            interp.run_through_inputs(empty()),
            Err(InterpreterError::AddressFault(-1))
        );
    }

    #[test]
    fn top_of_address_space() {
        const MAX: i64 = i64::MAX;

        // HALT at the last address still halts
        let mut interp = Interpreter::new([1101, 99, 0, MAX, 1105, 1, MAX]);
        assert_eq!(
            interp.run_through_inputs(empty()),
            Ok((vec![], State::Halted))
        );
        assert_eq!(interp.instr_ptr(), MAX);

        // a parameter at the last address can be read, but there's nowhere to go after it
        let mut interp = Interpreter::new([1101, 104, 0, MAX - 1, 1105, 1, MAX - 1]);
        assert_eq!(
            interp.run_through_inputs(empty()),
            Err(InterpreterError::ArithmeticOverflow { lhs: MAX - 1, rhs: 2 })
        );
        assert_eq!(interp.instr_ptr(), MAX - 1);

        // an instruction at the last address can't have any parameters
        let mut interp = Interpreter::new([1101, 4, 0, MAX, 1105, 1, MAX]);
        assert_eq!(
            interp.run_through_inputs(empty()),
            Err(InterpreterError::ArithmeticOverflow { lhs: MAX, rhs: 1 })
        );
        assert!(matches!(interp.status(), Status::Faulted(_)));
    }

    #[test]
    fn write_to_immediate_faults() {
        let mut interp = Interpreter::new([11101, 1, 1, 5, 99]);
        assert_eq!(
            interp.run_through_inputs(empty()),
            Err(InterpreterError::InvalidWriteTarget(5))
        );
        // nothing was written
        assert_eq!(interp.mem_get(5), Ok(0));
    }

    #[test]
    fn unknown_operation_faults() {
        let mut interp = Interpreter::new([1101, 1, 1, 5, 42, 99]);
        assert_eq!(
            interp.run_through_inputs(empty()),
            Err(InterpreterError::UnknownOperation(42))
        );
        assert_eq!(interp.instr_ptr(), 4);
    }

    #[test]
    fn terminal_states_are_sticky() {
        let mut interp = Interpreter::new([99, 104, 1, 99]);
        assert_eq!(interp.step(&mut None), Ok(StepOutcome::Halted));
        assert_eq!(interp.step(&mut None), Ok(StepOutcome::Halted));
        assert_eq!(interp.instr_ptr(), 0);

        let mut interp = Interpreter::new([50, 104, 1, 99]);
        let err = Err(InterpreterError::UnknownOperation(50));
        assert_eq!(interp.step(&mut None), err);
        // fixing the instruction doesn't matter anymore
        interp[0] = 1101;
        assert_eq!(interp.step(&mut None), err);
    }

    #[test]
    fn overflow_faults() {
        let mut interp = Interpreter::new([1102, i64::MAX, 2, 0, 99]);
        assert_eq!(
            interp.run_through_inputs(empty()),
            Err(InterpreterError::ArithmeticOverflow { lhs: i64::MAX, rhs: 2 })
        );
    }

    #[test]
    fn unknown_mode_faults() {
        let mut interp = Interpreter::new([304, 0, 99]);
        assert_eq!(
            interp.run_through_inputs(empty()),
            Err(InterpreterError::UnknownMode(3))
        );
    }

    #[test]
    fn pending_input_only_consumed_by_input() {
        let mut interp = Interpreter::new([104, 7, 3, 0, 99]);
        let mut input = Some(5);
        assert_eq!(interp.step(&mut input), Ok(StepOutcome::Output(7)));
        assert_eq!(input, Some(5));
        assert_eq!(interp.step(&mut input), Ok(StepOutcome::Running));
        assert_eq!(input, None);
        assert_eq!(interp[0], 5);
    }

    #[test]
    fn reconstruction_is_independent() {
        let program = [3, 20, 1001, 20, 1, 20, 4, 20, 1105, 1, 0];
        let first: Vec<_> = Interpreter::new(program)
            .outputs([1, 5, 9, 13])
            .take(4)
            .collect();
        let second: Vec<_> = Interpreter::new(program)
            .outputs([1, 5, 9, 13])
            .take(4)
            .collect();
        assert_eq!(first, vec![Ok(2), Ok(6), Ok(10), Ok(14)]);
        assert_eq!(first, second);
    }

    #[test]
    fn override_input_and_output() {
        // echo input until it's 0
        let program = [3, 100, 4, 100, 1005, 100, 0, 99];
        let captured = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&captured);

        let mut interp = Interpreter::new(program);
        interp.override_op(OpCode::Out, move |ops| {
            let val = ops.read()?;
            sink.lock().unwrap().push(val);
            Ok(StepOutcome::Running)
        });

        let (outputs, state) = interp.run_through_inputs([3, 2, 1, 0]).unwrap();
        assert!(outputs.is_empty());
        assert_eq!(state, State::Halted);
        assert_eq!(*captured.lock().unwrap(), vec![3, 2, 1, 0]);
    }

    #[test]
    fn override_defines_new_operation() {
        // op 42: store twice the parameter
        let mut base = Interpreter::new([142, 21, 7, 4, 7, 99, 0, 0]);
        base.override_op(42, |ops| {
            let val = ops.read()?;
            ops.store(val * 2)?;
            Ok(StepOutcome::Running)
        });
        let mut interp = base.clone();
        assert_eq!(
            interp.run_through_inputs(empty()),
            Ok((vec![42], State::Halted))
        );

        assert!(base.remove_override(42).is_some());
        assert_eq!(
            base.run_through_inputs(empty()),
            Err(InterpreterError::UnknownOperation(142))
        );
    }

    /// A handler that isn't a closure: outputs the relative base instead of its parameter
    struct ReportBase;

    impl OpHandler for ReportBase {
        fn execute(&self, ops: &mut Operands<'_>) -> Result<StepOutcome, InterpreterError> {
            ops.read()?;
            Ok(StepOutcome::Output(ops.rel_base()))
        }
    }

    #[test]
    fn override_with_shared_handler() {
        let handler: Arc<dyn OpHandler> = Arc::new(ReportBase);
        let mut interp = Interpreter::new([109, 12, 104, 0, 99]);
        assert!(interp.override_with(OpCode::Out, Arc::clone(&handler)).is_none());
        assert_eq!(
            interp.run_through_inputs(empty()),
            Ok((vec![12], State::Halted))
        );
    }

    #[test]
    fn override_can_await_input() {
        // input handler that doubles what it receives
        let mut interp = Interpreter::new([3, 0, 4, 0, 99]);
        interp.override_op(OpCode::In, |ops: &mut Operands<'_>| {
            let Some(val) = ops.take_input() else {
                return Ok(StepOutcome::Awaiting);
            };
            ops.store(val * 2)?;
            Ok(StepOutcome::Running)
        });
        assert_eq!(interp.run_through_inputs(empty()), Ok((vec![], State::Awaiting)));
        assert_eq!(interp.instr_ptr(), 0);
        assert_eq!(interp.run_through_inputs([21]), Ok((vec![42], State::Halted)));
    }

    #[test]
    fn parse_errors_report_position() {
        let err = parse_program("1,2,x3,4").unwrap_err();
        let ProgramError::Parse { index, token, .. } = &err else {
            panic!("expected a parse error, got {err:?}");
        };
        assert_eq!((*index, &**token), (2, "x3"));
        assert!(parse_program(" \n").unwrap().is_empty());
        assert!(matches!(
            read_program("/nonexistent/intcode/program.txt"),
            Err(ProgramError::Io(_))
        ));
        assert_eq!(
            "104,-7,99\n".parse::<Interpreter>().unwrap(),
            Interpreter::new([104, -7, 99])
        );
    }
}
