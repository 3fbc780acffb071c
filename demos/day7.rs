// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! A solution to Advent of Code 2019 Day 7 built using the `intcode` library.
//!
//! Part 1 chains five amplifiers one after another. Part 2 wires them into a feedback loop, so
//! each amplifier runs as its own task, connected to its neighbors through queues.

use intcode::prelude::*;
use intcode::read_program;
use intcode::task::Exit;
use itertools::Itertools;
use tokio::sync::mpsc;

fn chain(amplifier: &Interpreter, phases: &[i64]) -> i64 {
    phases.iter().fold(0, |signal, &phase| {
        let (output, State::Halted) = amplifier
            .clone()
            .run_through_inputs([phase, signal])
            .unwrap()
        else {
            panic!("amplifier did not halt");
        };
        output[0]
    })
}

async fn feedback_loop(amplifier: &Interpreter, phases: &[i64]) -> i64 {
    let (senders, receivers): (Vec<_>, Vec<_>) =
        phases.iter().map(|_| mpsc::unbounded_channel()).unzip();
    for (sender, &phase) in senders.iter().zip(phases) {
        sender.send(phase).unwrap();
    }
    senders[0].send(0).unwrap();

    // the last amplifier's output goes through here, so that the final signal can be seen
    let (last_tx, mut last_rx) = mpsc::unbounded_channel();
    let mut outputs = senders[1..].to_vec();
    outputs.push(last_tx);

    let tasks = receivers
        .into_iter()
        .zip(outputs)
        .map(|(input, output)| amplifier.clone().spawn(input, output))
        .collect_vec();

    let mut signal = None;
    while let Some(val) = last_rx.recv().await {
        signal = Some(val);
        // the first amplifier halts before the last one's final output
        let _ = senders[0].send(val);
    }
    drop(senders);

    for task in tasks {
        assert_eq!(task.join().await, Ok(Exit::Halted));
    }
    signal.expect("no thruster signal")
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    use std::env::args_os;
    let code = read_program(args_os().nth(1).expect("missing file name")).unwrap();
    let amplifier = Interpreter::new(code);

    let part1 = (0..5)
        .permutations(5)
        .map(|phases| chain(&amplifier, &phases))
        .max()
        .unwrap();
    println!("part 1: {part1}");

    let mut part2 = i64::MIN;
    for phases in (5..10).permutations(5) {
        part2 = part2.max(feedback_loop(&amplifier, &phases).await);
    }
    println!("part 2: {part2}");
}
