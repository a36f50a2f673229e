use thiserror::Error;

/// Faults that stop the interpreter.
///
/// A fault never unwinds into the caller: the VM records it in
/// [`State::Error`](super::vm::State::Error) and refuses to execute further.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum VMError {
    /// The low two digits of the instruction word name no instruction.
    #[error("invalid opcode {opcode} at pc {pc}")]
    InvalidOpcode { opcode: i64, pc: i64 },
    /// A parameter mode digit is unknown, or not allowed for the parameter's role
    /// (immediate mode on a write destination).
    #[error("invalid addressing mode {mode} for parameter {param} at pc {pc}")]
    InvalidMode { mode: i64, param: usize, pc: i64 },
    /// An operand resolved to an address below zero.
    #[error("negative address {address} at pc {pc}")]
    NegativeAddress { address: i64, pc: i64 },
}

/// Errors returned by [`VM::run_to_completion`](super::vm::VM::run_to_completion).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RunError {
    /// The program faulted.
    #[error("program faulted: {0}")]
    Fault(#[from] VMError),
    /// The program asked for more input than was supplied.
    #[error("program requested input #{requested} but only {supplied} were supplied")]
    InputExhausted { requested: usize, supplied: usize },
}
