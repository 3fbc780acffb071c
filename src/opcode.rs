// SPDX-FileCopyrightText: 2024 - 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Instruction decoding

use std::fmt::{self, Display};

use crate::InterpreterError;

/// The operations defined by the completed intcode computer.
///
/// The discriminant of each variant is the two-digit code that selects it.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[allow(missing_docs, reason = "self-explanatory")]
pub enum OpCode {
    Add = 1,
    Mul = 2,
    In = 3,
    Out = 4,
    Jnz = 5,
    Jz = 6,
    Lt = 7,
    Eq = 8,
    Rbo = 9,
    Halt = 99,
}

impl OpCode {
    /// The number of parameters that the operation takes
    pub const fn param_count(self) -> usize {
        match self {
            OpCode::Add | OpCode::Mul | OpCode::Lt | OpCode::Eq => 3,
            OpCode::Jnz | OpCode::Jz => 2,
            OpCode::In | OpCode::Out | OpCode::Rbo => 1,
            OpCode::Halt => 0,
        }
    }
}

impl TryFrom<i64> for OpCode {
    type Error = i64;
    fn try_from(code: i64) -> Result<Self, i64> {
        match code {
            1 => Ok(OpCode::Add),
            2 => Ok(OpCode::Mul),
            3 => Ok(OpCode::In),
            4 => Ok(OpCode::Out),
            5 => Ok(OpCode::Jnz),
            6 => Ok(OpCode::Jz),
            7 => Ok(OpCode::Lt),
            8 => Ok(OpCode::Eq),
            9 => Ok(OpCode::Rbo),
            99 => Ok(OpCode::Halt),
            n => Err(n),
        }
    }
}

impl From<OpCode> for i64 {
    fn from(op: OpCode) -> i64 {
        op as i64
    }
}

impl Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OpCode::Add => "ADD",
            OpCode::Mul => "MUL",
            OpCode::In => "IN",
            OpCode::Out => "OUT",
            OpCode::Jnz => "JNZ",
            OpCode::Jz => "JZ",
            OpCode::Lt => "LT",
            OpCode::Eq => "EQ",
            OpCode::Rbo => "RBO",
            OpCode::Halt => "HALT",
        })
    }
}

/// Parameter mode for Intcode instruction
///
/// Intcode instruction parameters each have a mode:  [positional], [immediate], or [relative].
///
/// When executing an intcode instruction, the instruction's parameters are interpreted in
/// accordance with their associated modes.
///
/// [positional]: ParamMode::Positional
/// [immediate]: ParamMode::Immediate
/// [relative]: ParamMode::Relative
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum ParamMode {
    /// Positional Mode
    ///
    /// A parameter in positional mode evaluates to the value at the address specified by the
    /// parameter.
    Positional = 0,
    /// Immediate Mode
    ///
    /// A parameter in immediate mode evaluates directly to the value specified. Instructions which
    /// write to memory may not use immediate mode for their destinations.
    #[doc(alias = "#")]
    Immediate = 1,
    /// Relative Mode
    ///
    /// A parameter in relative mode evaluates to the value at the address specified by the
    /// parameter, added to the [Relative Base], which starts out as `0` but can be modified
    /// throughout the program's execution.
    ///
    /// [Relative Base]: https://adventofcode.com/2019/day/9
    #[doc(alias = "@")]
    Relative = 2,
}

impl Display for ParamMode {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamMode::Positional => Ok(()),
            ParamMode::Immediate => write!(fmt, "#"),
            ParamMode::Relative => write!(fmt, "@"),
        }
    }
}

impl TryFrom<i64> for ParamMode {
    type Error = InterpreterError;
    fn try_from(i: i64) -> Result<Self, Self::Error> {
        match i {
            0 => Ok(ParamMode::Positional),
            1 => Ok(ParamMode::Immediate),
            2 => Ok(ParamMode::Relative),
            _ => Err(InterpreterError::UnknownMode(i)),
        }
    }
}

/// The parameter modes of a single instruction.
///
/// Given a 5 digit instruction, digits ABCDE are used as follows:
/// DE is the two-digit opcode, C is the 1st parameter's mode, B is the 2nd's, and A is the 3rd's.
/// Digits past the most significant one are treated as `0`, so any parameter beyond those
/// explicitly given is [positional](ParamMode::Positional).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Modes(i64);

impl Modes {
    /// Extract the modes from the raw instruction int `raw`
    pub const fn of(raw: i64) -> Self {
        Self(raw / 100)
    }

    /// The mode of the `n`th parameter (zero-indexed)
    pub fn get(self, n: usize) -> Result<ParamMode, InterpreterError> {
        let mut rest = self.0;
        for _ in 0..n {
            if rest == 0 {
                break;
            }
            rest /= 10;
        }
        ParamMode::try_from(rest % 10)
    }
}

/// Decode `raw` into its operation and parameter modes.
///
/// ```
/// use intcode::{decode, OpCode, ParamMode};
/// let (op, modes) = decode(1002).unwrap();
/// assert_eq!(op, OpCode::Mul);
/// assert_eq!(modes.get(0), Ok(ParamMode::Positional));
/// assert_eq!(modes.get(1), Ok(ParamMode::Immediate));
/// assert_eq!(modes.get(2), Ok(ParamMode::Positional));
/// ```
pub fn decode(raw: i64) -> Result<(OpCode, Modes), InterpreterError> {
    let op = OpCode::try_from(raw % 100).map_err(|_| InterpreterError::UnknownOperation(raw))?;
    Ok((op, Modes::of(raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_mixed_modes() {
        let (op, modes) = decode(21001).unwrap();
        assert_eq!(op, OpCode::Add);
        assert_eq!(modes.get(0), Ok(ParamMode::Positional));
        assert_eq!(modes.get(1), Ok(ParamMode::Immediate));
        assert_eq!(modes.get(2), Ok(ParamMode::Relative));
    }

    #[test]
    fn missing_digits_are_positional() {
        let (op, modes) = decode(4).unwrap();
        assert_eq!(op, OpCode::Out);
        for n in 0..8 {
            assert_eq!(modes.get(n), Ok(ParamMode::Positional));
        }
        let (_, modes) = decode(109).unwrap();
        assert_eq!(modes.get(0), Ok(ParamMode::Immediate));
        assert_eq!(modes.get(1), Ok(ParamMode::Positional));
    }

    #[test]
    fn unknown_operations() {
        for raw in [0, 10, 98, 100, 1110, -1, -99] {
            assert_eq!(decode(raw), Err(InterpreterError::UnknownOperation(raw)));
        }
    }

    #[test]
    fn unknown_mode_is_lazy() {
        let (op, modes) = decode(30104).unwrap();
        assert_eq!(op, OpCode::Out);
        assert_eq!(modes.get(0), Ok(ParamMode::Immediate));
        assert_eq!(modes.get(1), Ok(ParamMode::Positional));
        assert_eq!(modes.get(2), Err(InterpreterError::UnknownMode(3)));
    }

    #[test]
    fn opcode_round_trip() {
        for op in [OpCode::Add, OpCode::Jz, OpCode::Rbo, OpCode::Halt] {
            assert_eq!(OpCode::try_from(i64::from(op)), Ok(op));
        }
    }
}
