// SPDX-FileCopyrightText: 2025 - 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Run an intcode program from a file, printing its outputs

use intcode::prelude::*;
use intcode::read_program;
use std::error::Error as StdError;
use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

const VERSION: &str = concat!(env!("CARGO_CRATE_NAME"), '-', env!("CARGO_PKG_VERSION"));

#[derive(Parser)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = VERSION)]
#[command(about = "Intcode program runner", long_about = None)]
struct Args {
    #[arg(help = "File containing comma-separated intcode")]
    source: PathBuf,
    #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
    #[arg(help = "Integers to provide as input, in order")]
    input: Vec<i64>,
    #[arg(short = 'l', long = "text")]
    #[arg(help = "Lines of ASCII text to provide as input, after any integer inputs")]
    text: Vec<String>,
    #[arg(short, long)]
    #[arg(help = "Print ASCII-range outputs as text instead of one integer per line")]
    ascii: bool,
    #[arg(short, long)]
    #[arg(help = "Print each executed instruction to stderr")]
    trace: bool,
}

macro_rules! to_ascii_char {
    ($e: expr) => {{
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "in macro to make it explicit"
        )]
        {
            $e as u8 as char
        }
    }};
}

fn ascii_inputs(lines: &[String]) -> Result<Vec<i64>, RunError> {
    let mut inputs = Vec::new();
    for line in lines {
        if let Some(bad_char) = line.chars().find(|c| !c.is_ascii()) {
            return Err(RunError::InvalidAsciiChar(bad_char));
        }
        inputs.extend(line.bytes().map(i64::from));
        inputs.push(i64::from(b'\n'));
    }
    Ok(inputs)
}

fn print_output(val: i64, ascii: bool) {
    match val {
        c @ 0..128 if ascii => print!("{}", to_ascii_char!(c)),
        _ => println!("{val}"),
    }
}

fn main() -> Result<(), Box<dyn StdError>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let program = read_program(&args.source)
        .map_err(|e| format!("failed to load {}: {e}", args.source.display()))?;

    let mut inputs = args.input.clone();
    inputs.extend(ascii_inputs(&args.text)?);

    let mut interp = Interpreter::new(program);
    if args.trace {
        interp.start_trace();
    }

    let mut outputs = interp.outputs(inputs);
    let result = outputs.by_ref().try_for_each(|val| val.map(|v| print_output(v, args.ascii)));

    let mut interp = outputs.into_inner();
    if let Some(trace) = interp.end_trace() {
        for instr in trace.0 {
            eprintln!("{instr}");
        }
    }
    result.map_err(|e| {
        RunError::Interpreter {
            ip: interp.instr_ptr(),
            source: e,
        }
        .into()
    })
}

#[derive(Debug, Error)]
enum RunError {
    #[error("{0:?} is not a valid ASCII character")]
    InvalidAsciiChar(char),
    #[error("interpreter faulted at address {ip}: {source}")]
    Interpreter {
        ip: i64,
        #[source]
        source: intcode::InterpreterError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_lines_become_inputs() {
        let lines = [String::from("NOT A J"), String::from("WALK")];
        let inputs = ascii_inputs(&lines).unwrap();
        assert_eq!(inputs.len(), "NOT A J\nWALK\n".len());
        assert_eq!(inputs[7], 10);

        let err = ascii_inputs(&[String::from("caf\u{e9}")]).unwrap_err();
        assert_eq!(err.to_string(), "'\u{e9}' is not a valid ASCII character");
        assert!(err.source().is_none());
    }

    #[test]
    fn faults_keep_their_source() {
        let err = RunError::Interpreter {
            ip: 4,
            source: intcode::InterpreterError::StarvedInput,
        };
        assert_eq!(
            err.to_string(),
            "interpreter faulted at address 4: input was required, but the input source is exhausted"
        );
        assert_eq!(
            err.source().map(ToString::to_string),
            Some(intcode::InterpreterError::StarvedInput.to_string())
        );
    }
}
