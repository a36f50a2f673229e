//! Intcode virtual machine.
//!
//! # Architecture
//!
//! - **Memory**: sparse `u64 -> i64` map; unwritten cells read as zero
//! - **Instruction format**: `opcode + 100 * modes`, one decimal mode digit per
//!   parameter (positional, immediate, relative)
//! - **Execution model**: cooperative; [`vm::VM::run`] returns whenever the program
//!   needs input, has produced output, halts or faults
//! - **Faults**: recorded in [`vm::State::Error`], never raised as panics
//!
//! # Modules
//!
//! - [`disasm`]: Static program listing
//! - [`errors`]: Interpreter fault and run error types
//! - [`isa`]: Instruction table and opcode mappings
//! - [`memory`]: Sparse address space
//! - [`operand`]: Instruction word and addressing-mode decoding
//! - [`vm`]: The interpreter and its suspend/resume state machine

pub mod disasm;
pub mod errors;
pub mod isa;
pub mod memory;
pub mod operand;
pub mod vm;
