// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

use std::iter::FusedIterator;

use crate::{Interpreter, InterpreterError, StepOutcome};

/// An [Iterator] over the outputs of an [Interpreter], created by [Interpreter::outputs].
///
/// Each call to [next](Iterator::next) resumes execution where it last stopped and runs until the
/// next output, which it yields as `Some(Ok(output))`. Once the program halts it yields [`None`].
///
/// Inputs are pulled from the wrapped input iterator one at a time, only when an input
/// instruction runs, so an infinite iterator works fine. If an input instruction runs after it's
/// exhausted, the interpreter faults with [InterpreterError::StarvedInput].
///
/// After yielding an error, the iterator only yields [`None`].
///
/// # Example
///
/// ```
/// use intcode::prelude::*;
/// use intcode::InterpreterError;
///
/// // example from day 5, which echoes its input
/// let mut outputs = Interpreter::new([3, 0, 4, 0, 99]).outputs([12]);
/// assert_eq!(outputs.next(), Some(Ok(12)));
/// assert_eq!(outputs.next(), None);
///
/// let mut starved = Interpreter::new([3, 0, 4, 0, 99]).outputs(empty());
/// assert_eq!(starved.next(), Some(Err(InterpreterError::StarvedInput)));
/// assert_eq!(starved.next(), None);
/// ```
#[derive(Debug, Clone)]
pub struct Outputs<I> {
    interp: Interpreter,
    inputs: I,
    pending: Option<i64>,
    done: bool,
}

impl<I: Iterator<Item = i64>> Outputs<I> {
    pub(crate) fn new(interp: Interpreter, inputs: I) -> Self {
        Self {
            interp,
            inputs,
            pending: None,
            done: false,
        }
    }

    /// Get a view of the wrapped interpreter
    pub fn interpreter(&self) -> &Interpreter {
        &self.interp
    }

    /// Stop iterating, returning the wrapped interpreter in whatever state it's in
    pub fn into_inner(self) -> Interpreter {
        self.interp
    }
}

impl<I: Iterator<Item = i64>> Iterator for Outputs<I> {
    type Item = Result<i64, InterpreterError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.interp.run_until_event(&mut self.pending) {
                Ok(StepOutcome::Output(val)) => return Some(Ok(val)),
                Ok(StepOutcome::Awaiting) => {
                    if let Some(input) = self.inputs.next() {
                        self.pending = Some(input);
                    } else {
                        self.done = true;
                        return Some(Err(self.interp.fault(InterpreterError::StarvedInput)));
                    }
                }
                Ok(StepOutcome::Halted) => {
                    self.done = true;
                    return None;
                }
                Ok(StepOutcome::Running) => unreachable!("run_until_event never returns Running"),
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

impl<I: Iterator<Item = i64>> FusedIterator for Outputs<I> {}

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use crate::{InterpreterError, run_program};

    #[test]
    fn inputs_pulled_lazily() {
        // add 1 to each input until getting a 0
        let program = [3, 20, 1006, 20, 14, 1001, 20, 1, 20, 4, 20, 1105, 1, 0, 99];
        let mut pulled = Vec::new();
        let inputs = [4, 8, 0, 100].into_iter().inspect(|&i| pulled.push(i));
        let outputs: Vec<_> = Interpreter::new(program).outputs(inputs).collect();
        assert_eq!(outputs, vec![Ok(5), Ok(9)]);
        assert_eq!(pulled, vec![4, 8, 0]);
    }

    #[test]
    fn infinite_input() {
        // outputs 2 * each input, forever
        let program = [3, 20, 1002, 20, 2, 20, 4, 20, 1105, 1, 0];
        let outputs: Vec<_> = Interpreter::new(program)
            .outputs(1..)
            .take(5)
            .map(Result::unwrap)
            .collect();
        assert_eq!(outputs, vec![2, 4, 6, 8, 10]);
    }

    #[test]
    fn starvation_faults_interpreter() {
        let mut outputs = Interpreter::new([3, 0, 3, 1, 99]).outputs([1]);
        assert_eq!(outputs.next(), Some(Err(InterpreterError::StarvedInput)));
        assert_eq!(outputs.next(), None);
        let interp = outputs.into_inner();
        assert_eq!(
            interp.status(),
            &Status::Faulted(InterpreterError::StarvedInput)
        );
        assert_eq!(interp.instr_ptr(), 2);
        assert_eq!(interp[0], 1);
    }

    #[test]
    fn dropping_early_is_harmless() {
        let program = [104, 1, 104, 2, 104, 3, 99];
        let mut outputs = Interpreter::new(program).outputs(empty());
        assert_eq!(outputs.next(), Some(Ok(1)));
        let interp = outputs.into_inner();
        assert_eq!(interp.status(), &Status::Ready);
        assert_eq!(interp.instr_ptr(), 2);
        assert_eq!(run_program(program, empty()), Ok(vec![1, 2, 3]));
    }
}
