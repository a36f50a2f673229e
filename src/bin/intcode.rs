//! Intcode command line.
//!
//! Loads a comma-separated Intcode program and runs, lists or composes it.
//!
//! # Usage
//! ```text
//! intcode <command> <program> [OPTIONS]
//! ```
//!
//! # Examples
//! ```text
//! intcode run diagnostics.txt --input 5
//! intcode disasm boost.txt
//! intcode amplify amps.txt --feedback
//! intcode network nic.txt --nat
//! ```

use intcode::circuit::{Wiring, max_signal};
use intcode::network::switch::{NETWORK_SIZE, Network, NetworkConfig};
use intcode::virtual_machine::disasm::disassemble;
use intcode::virtual_machine::vm::{VM, VmConfig};
use intcode::{error, info, warn};
use std::env;
use std::fs;
use std::process;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    Run,
    Disasm,
    Amplify,
    Network,
}

impl Command {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "run" => Some(Command::Run),
            "disasm" => Some(Command::Disasm),
            "amplify" => Some(Command::Amplify),
            "network" => Some(Command::Network),
            _ => None,
        }
    }
}

struct Options {
    inputs: Vec<i64>,
    trace: bool,
    feedback: bool,
    nat: bool,
    size: usize,
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() >= 2 && (args[1] == "--help" || args[1] == "-h") {
        print_usage(&args[0]);
        process::exit(0);
    }
    if args.len() < 3 {
        print_usage(&args[0]);
        process::exit(1);
    }

    let Some(command) = Command::parse(&args[1]) else {
        error!("Unknown command: {}\n", args[1]);
        print_usage(&args[0]);
        process::exit(1);
    };
    let program_path = &args[2];
    let options = parse_options(&args[0], &args[3..]);
    warn_unused_options(command, &options);

    let source = fs::read_to_string(program_path).unwrap_or_else(|e| {
        error!("Failed to read {}: {}", program_path, e);
        process::exit(1);
    });
    let program = parse_program(&source).unwrap_or_else(|e| {
        error!("Invalid program {}: {}", program_path, e);
        process::exit(1);
    });

    match command {
        Command::Run => run(&program, &options),
        Command::Disasm => {
            for line in disassemble(&program) {
                println!("{line}");
            }
        }
        Command::Amplify => amplify(&program, &options),
        Command::Network => network(&program, &options),
    }
}

fn parse_options(program: &str, args: &[String]) -> Options {
    let mut options = Options {
        inputs: Vec::new(),
        trace: false,
        feedback: false,
        nat: false,
        size: NETWORK_SIZE,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            k @ ("--input" | "-i" | "--size" | "-n") => {
                i += 1;
                if i >= args.len() {
                    error!("{k} requires an argument");
                    process::exit(1);
                }
                if matches!(k, "--input" | "-i") {
                    options.inputs.push(args[i].parse().unwrap_or_else(|_| {
                        error!("Invalid input: '{}' is not a valid number", args[i]);
                        process::exit(1);
                    }));
                } else {
                    options.size = args[i].parse().unwrap_or_else(|_| {
                        error!("Invalid size: '{}' is not a valid number", args[i]);
                        process::exit(1);
                    });
                }
            }
            "--trace" | "-t" => options.trace = true,
            "--feedback" | "-f" => options.feedback = true,
            "--nat" => options.nat = true,
            other => {
                error!("Unexpected argument: {}\n", other);
                print_usage(program);
                process::exit(1);
            }
        }
        i += 1;
    }
    options
}

fn warn_unused_options(command: Command, options: &Options) {
    if command != Command::Run && !options.inputs.is_empty() {
        warn!("--input only applies to run; ignoring it");
    }
    if command != Command::Amplify && options.feedback {
        warn!("--feedback only applies to amplify; ignoring it");
    }
    if command != Command::Network && (options.nat || options.size != NETWORK_SIZE) {
        warn!("--nat and --size only apply to network; ignoring them");
    }
    if command == Command::Disasm && options.trace {
        warn!("--trace has no effect on disasm");
    }
}

/// Parses comma-separated integers, ignoring surrounding whitespace.
fn parse_program(source: &str) -> Result<Vec<i64>, String> {
    let program = source
        .trim()
        .split(',')
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .enumerate()
        .map(|(i, cell)| {
            cell.parse::<i64>()
                .map_err(|e| format!("cell {i} ('{cell}'): {e}"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if program.is_empty() {
        return Err("program is empty".to_string());
    }
    Ok(program)
}

fn run(program: &[i64], options: &Options) {
    let mut vm = VM::with_config(program, VmConfig { trace: options.trace });
    match vm.run_to_completion(&options.inputs) {
        Ok(outputs) => {
            for value in outputs {
                println!("{value}");
            }
        }
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    }
}

fn amplify(program: &[i64], options: &Options) {
    let wiring = if options.feedback {
        Wiring::Feedback
    } else {
        Wiring::Series
    };
    let base = VM::with_config(program, VmConfig { trace: options.trace });
    match max_signal(&base, &wiring.default_phases(), wiring, 0) {
        Ok(best) => {
            info!("Best {} phases: {:?}", wiring, best.phases);
            println!("{}", best.signal);
        }
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    }
}

fn network(program: &[i64], options: &Options) {
    let config = NetworkConfig {
        size: options.size,
        monitor: options.nat,
        trace: options.trace,
    };
    let result = Network::new(program, config).and_then(|mut network| network.run());
    match result {
        Ok(y) => println!("{y}"),
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    }
}

const USAGE: &str = "\
Intcode Interpreter

USAGE:
    {program} <command> <program> [OPTIONS]

COMMANDS:
    run        Run the program and print every output
    disasm     Print a listing of the program
    amplify    Search phase orderings for the strongest amplifier signal
    network    Run a packet network of the program

ARGS:
    <program>  File holding comma-separated integers

OPTIONS:
    -i, --input <n>    Value to feed on the next input (run, repeatable)
    -t, --trace        Log every executed instruction
    -f, --feedback     Use a feedback loop with phases 5-9 (amplify)
        --nat          Enable the idle monitor (network)
    -n, --size <n>     Number of network nodes (defaults to 50)
    -h, --help         Print this help message

EXAMPLES:
    # Run with two inputs
    {program} run prog.txt -i 1 -i 2

    # Strongest feedback-loop signal
    {program} amplify amps.txt --feedback

    # Network with the idle monitor enabled
    {program} network nic.txt --nat
";

fn print_usage(program: &str) {
    info!("{}", USAGE.replace("{program}", program));
}
