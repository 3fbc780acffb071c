// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! A solution to Advent of Code 2019 Day 9 built using the `intcode` library.
//!
//! The BOOST program outputs the opcodes it found to be broken before its keycode, so every
//! output but the last should be absent.

use intcode::prelude::*;
use intcode::read_program;

fn boost(interpreter: Interpreter, mode: i64) -> i64 {
    let outputs = interpreter
        .outputs([mode])
        .collect::<Result<Vec<i64>, _>>()
        .unwrap();
    assert_eq!(outputs.len(), 1, "malfunctioning opcodes: {outputs:?}");
    outputs[0]
}

fn main() {
    use std::env::args_os;
    let code = read_program(args_os().nth(1).expect("missing file name")).unwrap();

    let interpreter = Interpreter::new(code);
    println!("part 1: {}", boost(interpreter.clone(), 1));
    println!("part 2: {}", boost(interpreter, 2));
}
