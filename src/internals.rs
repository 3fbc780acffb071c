// SPDX-FileCopyrightText: 2024 - 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! The built-in instruction set

use super::*;

/// common logic of all 4 instructions that take 2 inputs and store a result
fn op3(
    ops: &mut Operands<'_>,
    operation: impl Fn(i64, i64) -> Option<i64>,
) -> Result<StepOutcome, InterpreterError> {
    let a = ops.read()?;
    let b = ops.read()?;
    let val = operation(a, b).ok_or(InterpreterError::ArithmeticOverflow { lhs: a, rhs: b })?;
    ops.store(val)?;
    Ok(StepOutcome::Running)
}

fn jump(
    ops: &mut Operands<'_>,
    func: impl Fn(i64) -> bool,
) -> Result<StepOutcome, InterpreterError> {
    let expr = ops.read()?;
    let dest = ops.read()?;
    if func(expr) {
        ops.jump(dest)?;
    }
    Ok(StepOutcome::Running)
}

/// Execute `opcode` with its default behavior
pub(crate) fn execute(
    opcode: OpCode,
    ops: &mut Operands<'_>,
) -> Result<StepOutcome, InterpreterError> {
    match opcode {
        OpCode::Add => op3(ops, i64::checked_add),
        OpCode::Mul => op3(ops, i64::checked_mul),
        OpCode::In => {
            let Some(input) = ops.take_input() else {
                return Ok(StepOutcome::Awaiting);
            };
            ops.store(input)?;
            Ok(StepOutcome::Running)
        }
        OpCode::Out => Ok(StepOutcome::Output(ops.read()?)),
        OpCode::Jnz => jump(ops, |v| v != 0),
        OpCode::Jz => jump(ops, |v| v == 0),
        OpCode::Lt => op3(ops, |a, b| Some(i64::from(a < b))),
        OpCode::Eq => op3(ops, |a, b| Some(i64::from(a == b))),
        OpCode::Rbo => {
            let delta = ops.read()?;
            ops.adjust_rel_base(delta)?;
            Ok(StepOutcome::Running)
        }
        OpCode::Halt => Ok(StepOutcome::Halted),
    }
}
