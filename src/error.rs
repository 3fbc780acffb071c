// SPDX-FileCopyrightText: 2024 - 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Error types for the interpreter and for loading programs

use std::io;
use std::num::ParseIntError;

use thiserror::Error;

/// An unrecoverable fault that occured while executing an intcode instruction.
///
/// Once an [Interpreter] returns one of these, it is [faulted] and will not execute any more
/// instructions.
///
/// [Interpreter]: crate::Interpreter
/// [faulted]: crate::Status::Faulted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterpreterError {
    /// A negative address was computed, either to access memory or as a jump target
    #[error("attempted to use negative address {0}")]
    AddressFault(i64),
    /// The instruction's opcode is not defined, and no override was registered for it
    #[error("encountered unknown operation in instruction {0}")]
    UnknownOperation(i64),
    /// A parameter mode digit other than 0, 1, or 2 was encountered
    #[error("encountered unknown parameter mode {0}")]
    UnknownMode(i64),
    /// An instruction tried to write to an immediate-mode parameter
    #[error("instruction attempted to write to immediate {0}")]
    InvalidWriteTarget(i64),
    /// An input instruction ran after every available input was consumed
    #[error("input was required, but the input source is exhausted")]
    StarvedInput,
    /// Integer arithmetic overflowed
    #[error("arithmetic overflowed when combining {lhs} and {rhs}")]
    ArithmeticOverflow {
        /// left-hand operand
        lhs: i64,
        /// right-hand operand
        rhs: i64,
    },
}

/// An error that occured while reading or parsing an intcode program
#[derive(Debug, Error)]
pub enum ProgramError {
    /// The program could not be read
    #[error("failed to read program: {0}")]
    Io(#[from] io::Error),
    /// One of the comma-separated entries is not a valid 64-bit integer
    #[error("invalid integer {token:?} at position {index}: {source}")]
    Parse {
        /// zero-based position of the bad entry
        index: usize,
        /// the offending text, trimmed
        token: Box<str>,
        /// underlying parse failure
        source: ParseIntError,
    },
}
