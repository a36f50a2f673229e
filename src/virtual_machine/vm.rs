//! Core Intcode interpreter.
//!
//! The VM owns a sparse [`Memory`] holding both code and data, a program
//! counter and a relative base. Execution is cooperative: [`VM::run`] executes
//! instructions until the program needs input, has produced output, halts or
//! faults, and returns the new [`State`] so the caller can service it.
//!
//! Input is a two-phase operation. Decoding `in` only suspends the VM; the
//! destination is resolved and written when the caller resumes after
//! [`VM::provide_input`]. Output is staged before suspending, with the program
//! counter already past the instruction.
//!
//! All arithmetic wraps on overflow.

use crate::trace;
use crate::virtual_machine::errors::{RunError, VMError};
use crate::virtual_machine::isa::Opcode;
use crate::virtual_machine::memory::Memory;
use crate::virtual_machine::operand::{Instruction, Mode};

/// Execution state, returned by every resume call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// Executing; never observed by callers of [`VM::run`].
    Running,
    /// Suspended on an `in` instruction, waiting for [`VM::provide_input`].
    Input,
    /// Suspended after an `out` instruction; the value is in [`VM::output`].
    Output,
    /// Executed `halt`. Terminal.
    Halted,
    /// Faulted. Terminal.
    Error(VMError),
}

impl State {
    /// Returns `true` for states the VM can never leave.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, State::Halted | State::Error(_))
    }
}

/// Construction-time interpreter options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VmConfig {
    /// Log every decoded instruction, operand and write at trace level.
    pub trace: bool,
}

macro_rules! exec_vm {
    (
        vm = $vm:ident,
        instr = $instr:ident,
        { $( $variant:ident => $handler:ident ( $( $field:ident : $kind:ident @ $slot:literal ),* $(,)? ) ),* $(,)? }
    ) => {{
        match $instr.opcode {
            $(
                Opcode::$variant => {
                    $( let $field = exec_vm!(@operand $vm, $instr, $kind, $slot)?; )*
                    $vm.$handler(&$instr $(, $field)*)
                }
            ),*
        }
    }};

    // Evaluate a parameter to a value
    (@operand $vm:ident, $instr:ident, Read, $slot:literal) => {{
        $vm.read_operand(&$instr, $slot)
    }};

    // Resolve a parameter to a destination address
    (@operand $vm:ident, $instr:ident, Write, $slot:literal) => {{
        $vm.write_target(&$instr, $slot)
    }};
}

/// Intcode virtual machine.
#[derive(Clone, Debug)]
pub struct VM {
    /// Code and data.
    memory: Memory,
    /// Address of the next instruction word.
    pc: i64,
    /// Base added to relative-mode parameters.
    relative_base: i64,
    state: State,
    /// `in` instruction the VM is suspended on, as decoded.
    pending: Option<Instruction>,
    /// Value supplied for the pending `in` instruction.
    input: Option<i64>,
    /// Value staged by the last `out` instruction.
    output: i64,
    config: VmConfig,
}

impl VM {
    /// Creates a VM with `program` loaded at address 0 and default options.
    pub fn new(program: &[i64]) -> Self {
        Self::with_config(program, VmConfig::default())
    }

    /// Creates a VM with `program` loaded at address 0.
    pub fn with_config(program: &[i64], config: VmConfig) -> Self {
        Self {
            memory: Memory::from_program(program),
            pc: 0,
            relative_base: 0,
            state: State::Running,
            pending: None,
            input: None,
            output: 0,
            config,
        }
    }

    /// Returns the current execution state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Returns the fault that stopped the VM, if any.
    pub fn error(&self) -> Option<VMError> {
        match self.state {
            State::Error(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the address of the next instruction word.
    pub fn pc(&self) -> i64 {
        self.pc
    }

    /// Returns the base added to relative-mode parameters.
    pub fn relative_base(&self) -> i64 {
        self.relative_base
    }

    /// Returns the VM's address space.
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Returns the options the VM was created with.
    pub fn config(&self) -> VmConfig {
        self.config
    }

    /// Reads memory; never-written cells are 0.
    pub fn read(&self, address: u64) -> i64 {
        self.memory.get(address)
    }

    /// Writes memory directly, e.g. to patch a program before running it.
    pub fn write(&mut self, address: u64, value: i64) {
        self.memory.set(address, value);
    }

    /// Supplies the value for the pending `in` instruction.
    ///
    /// The write happens on the next [`run`](Self::run) or [`step`](Self::step).
    ///
    /// # Panics
    /// Panics if the VM is not in [`State::Input`].
    pub fn provide_input(&mut self, value: i64) {
        assert_eq!(
            self.state,
            State::Input,
            "input provided while the VM is not waiting for input"
        );
        self.input = Some(value);
    }

    /// Returns the value staged by the last `out` instruction.
    ///
    /// # Panics
    /// Panics if the VM is not in [`State::Output`].
    pub fn output(&self) -> i64 {
        assert_eq!(
            self.state,
            State::Output,
            "output read while the VM has not produced any"
        );
        self.output
    }

    /// Provides `value` and resumes until the next pause.
    pub fn run_with_input(&mut self, value: i64) -> State {
        self.provide_input(value);
        self.run()
    }

    /// Resumes execution until the VM needs input, produces output, halts or
    /// faults, and returns that state.
    ///
    /// Resuming from [`State::Input`] without a provided value returns
    /// immediately without making progress.
    pub fn run(&mut self) -> State {
        loop {
            let state = self.step();
            if state != State::Running {
                return state;
            }
        }
    }

    /// Completes a pending pause, if any, then executes one instruction.
    pub fn step(&mut self) -> State {
        match self.state {
            State::Halted | State::Error(_) => return self.state,
            State::Input => {
                let Some(value) = self.input.take() else {
                    return self.state;
                };
                if let Err(err) = self.complete_input(value) {
                    return self.fault(err);
                }
                self.state = State::Running;
            }
            State::Output => self.state = State::Running,
            State::Running => {}
        }

        if let Err(err) = self.exec_next() {
            return self.fault(err);
        }
        self.state
    }

    /// Runs until halt, feeding `inputs` in order, and collects every output.
    pub fn run_to_completion(&mut self, inputs: &[i64]) -> Result<Vec<i64>, RunError> {
        let mut pending = inputs.iter().copied();
        let mut consumed = 0;
        let mut outputs = Vec::new();
        loop {
            match self.run() {
                State::Input => {
                    let value = pending.next().ok_or(RunError::InputExhausted {
                        requested: consumed + 1,
                        supplied: inputs.len(),
                    })?;
                    consumed += 1;
                    self.provide_input(value);
                }
                State::Output => outputs.push(self.output),
                State::Halted => return Ok(outputs),
                State::Error(err) => return Err(err.into()),
                State::Running => unreachable!("run never returns while running"),
            }
        }
    }

    fn fault(&mut self, err: VMError) -> State {
        if self.config.trace {
            trace!("{:>8} fault: {}", self.pc, err);
        }
        self.state = State::Error(err);
        self.state
    }

    /// Converts a computed address into a memory index.
    fn address(&self, address: i64) -> Result<u64, VMError> {
        u64::try_from(address).map_err(|_| VMError::NegativeAddress {
            address,
            pc: self.pc,
        })
    }

    /// Returns the raw parameter `slot` of the instruction at the program counter.
    fn param(&self, slot: usize) -> Result<i64, VMError> {
        let address = self.pc.wrapping_add(1 + slot as i64);
        Ok(self.memory.get(self.address(address)?))
    }

    fn read_operand(&self, instr: &Instruction, slot: usize) -> Result<i64, VMError> {
        let raw = self.param(slot)?;
        let value = match instr.modes[slot] {
            Mode::Immediate => raw,
            Mode::Position => self.memory.get(self.address(raw)?),
            Mode::Relative => self
                .memory
                .get(self.address(self.relative_base.wrapping_add(raw))?),
        };
        if self.config.trace {
            trace!("{:>8}   arg{} {}({}) = {}", self.pc, slot, instr.modes[slot], raw, value);
        }
        Ok(value)
    }

    fn write_target(&self, instr: &Instruction, slot: usize) -> Result<u64, VMError> {
        let raw = self.param(slot)?;
        let target = match instr.modes[slot] {
            Mode::Position => self.address(raw)?,
            Mode::Relative => self.address(self.relative_base.wrapping_add(raw))?,
            Mode::Immediate => {
                return Err(VMError::InvalidMode {
                    mode: Mode::Immediate as i64,
                    param: slot,
                    pc: self.pc,
                });
            }
        };
        if self.config.trace {
            trace!("{:>8}   dst{} {}({}) = @{}", self.pc, slot, instr.modes[slot], raw, target);
        }
        Ok(target)
    }

    fn store(&mut self, target: u64, value: i64) {
        if self.config.trace {
            trace!("{:>8}   @{} <- {}", self.pc, target, value);
        }
        self.memory.set(target, value);
    }

    fn decode(&self) -> Result<Instruction, VMError> {
        let word = self.memory.get(self.address(self.pc)?);
        Instruction::decode(word, self.pc)
    }

    /// Finishes the `in` instruction that suspended the VM.
    ///
    /// Uses the instruction as decoded when the VM suspended. Only the raw
    /// destination parameter and the relative base are read at resume time.
    fn complete_input(&mut self, value: i64) -> Result<(), VMError> {
        let instr = self.pending.take().map_or_else(|| self.decode(), Ok)?;
        let target = self.write_target(&instr, 0)?;
        self.store(target, value);
        self.pc = self.pc.wrapping_add(instr.width());
        Ok(())
    }

    /// Decodes and executes the instruction at the program counter.
    fn exec_next(&mut self) -> Result<(), VMError> {
        let instr = self.decode()?;
        if self.config.trace {
            trace!(
                "{:>8} {:<5} {:?} rb={}",
                self.pc,
                instr.opcode,
                instr.param_modes(),
                self.relative_base
            );
        }

        exec_vm! {
            vm = self,
            instr = instr,
            {
                Add => op_add(a: Read @ 0, b: Read @ 1, dst: Write @ 2),
                Mul => op_mul(a: Read @ 0, b: Read @ 1, dst: Write @ 2),
                Input => op_input(),
                Output => op_output(src: Read @ 0),
                JumpIfTrue => op_jump_if_true(cond: Read @ 0, target: Read @ 1),
                JumpIfFalse => op_jump_if_false(cond: Read @ 0, target: Read @ 1),
                LessThan => op_less_than(a: Read @ 0, b: Read @ 1, dst: Write @ 2),
                Equals => op_equals(a: Read @ 0, b: Read @ 1, dst: Write @ 2),
                AdjustBase => op_adjust_base(offset: Read @ 0),
                Halt => op_halt(),
            }
        }
    }

    fn advance(&mut self, instr: &Instruction) {
        self.pc = self.pc.wrapping_add(instr.width());
    }

    fn op_add(&mut self, instr: &Instruction, a: i64, b: i64, dst: u64) -> Result<(), VMError> {
        self.store(dst, a.wrapping_add(b));
        self.advance(instr);
        Ok(())
    }

    fn op_mul(&mut self, instr: &Instruction, a: i64, b: i64, dst: u64) -> Result<(), VMError> {
        self.store(dst, a.wrapping_mul(b));
        self.advance(instr);
        Ok(())
    }

    fn op_input(&mut self, instr: &Instruction) -> Result<(), VMError> {
        self.pending = Some(*instr);
        self.state = State::Input;
        Ok(())
    }

    fn op_output(&mut self, instr: &Instruction, src: i64) -> Result<(), VMError> {
        self.output = src;
        self.advance(instr);
        self.state = State::Output;
        Ok(())
    }

    fn op_jump_if_true(
        &mut self,
        instr: &Instruction,
        cond: i64,
        target: i64,
    ) -> Result<(), VMError> {
        if cond != 0 {
            self.pc = target;
        } else {
            self.advance(instr);
        }
        Ok(())
    }

    fn op_jump_if_false(
        &mut self,
        instr: &Instruction,
        cond: i64,
        target: i64,
    ) -> Result<(), VMError> {
        if cond == 0 {
            self.pc = target;
        } else {
            self.advance(instr);
        }
        Ok(())
    }

    fn op_less_than(
        &mut self,
        instr: &Instruction,
        a: i64,
        b: i64,
        dst: u64,
    ) -> Result<(), VMError> {
        self.store(dst, i64::from(a < b));
        self.advance(instr);
        Ok(())
    }

    fn op_equals(&mut self, instr: &Instruction, a: i64, b: i64, dst: u64) -> Result<(), VMError> {
        self.store(dst, i64::from(a == b));
        self.advance(instr);
        Ok(())
    }

    fn op_adjust_base(&mut self, instr: &Instruction, offset: i64) -> Result<(), VMError> {
        self.relative_base = self.relative_base.wrapping_add(offset);
        self.advance(instr);
        Ok(())
    }

    fn op_halt(&mut self, _instr: &Instruction) -> Result<(), VMError> {
        self.state = State::Halted;
        Ok(())
    }
}
