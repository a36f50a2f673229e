//! Instruction word decoding: opcode plus per-parameter addressing modes.

use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::isa::{Opcode, Role};
use std::fmt;

/// Largest parameter count of any instruction.
pub const MAX_PARAMS: usize = 3;

/// Parameter addressing mode.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// The parameter is an address.
    #[default]
    Position = 0,
    /// The parameter is the value itself. Never valid for a destination.
    Immediate = 1,
    /// The parameter is an offset from the relative base.
    Relative = 2,
}

impl Mode {
    /// Maps a single decimal mode digit to a mode.
    pub const fn from_digit(digit: i64) -> Option<Mode> {
        match digit {
            0 => Some(Mode::Position),
            1 => Some(Mode::Immediate),
            2 => Some(Mode::Relative),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Mode::Position => "pos",
            Mode::Immediate => "imm",
            Mode::Relative => "rel",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A decoded instruction word.
///
/// Only the first [`Opcode::arity`] entries of `modes` are meaningful; the rest
/// stay [`Mode::Position`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub modes: [Mode; MAX_PARAMS],
}

impl Instruction {
    /// Decodes the instruction word found at `pc`.
    ///
    /// Fails with [`VMError::InvalidOpcode`] when the low two digits name no
    /// instruction, and with [`VMError::InvalidMode`] when a parameter's digit is
    /// unknown or is immediate mode on a write destination. Digits beyond the
    /// opcode's arity are ignored.
    pub fn decode(word: i64, pc: i64) -> Result<Self, VMError> {
        let code = word % 100;
        let opcode =
            Opcode::try_from(code).map_err(|_| VMError::InvalidOpcode { opcode: code, pc })?;

        let mut modes = [Mode::Position; MAX_PARAMS];
        let mut digits = word / 100;
        for (param, role) in opcode.roles().iter().enumerate() {
            let digit = digits % 10;
            digits /= 10;
            let mode = Mode::from_digit(digit).ok_or(VMError::InvalidMode {
                mode: digit,
                param,
                pc,
            })?;
            if *role == Role::Write && mode == Mode::Immediate {
                return Err(VMError::InvalidMode {
                    mode: digit,
                    param,
                    pc,
                });
            }
            modes[param] = mode;
        }

        Ok(Self { opcode, modes })
    }

    /// Returns the number of memory cells the instruction occupies.
    pub const fn width(&self) -> i64 {
        1 + self.opcode.arity() as i64
    }

    /// Returns the modes of the parameters the opcode actually takes.
    pub fn param_modes(&self) -> &[Mode] {
        &self.modes[..self.opcode.arity()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_plain_opcode_defaults_to_position() {
        let instr = Instruction::decode(1, 0).unwrap();
        assert_eq!(instr.opcode, Opcode::Add);
        assert_eq!(instr.modes, [Mode::Position; 3]);
        assert_eq!(instr.width(), 4);
    }

    #[test]
    fn decode_mode_digits_in_parameter_order() {
        let instr = Instruction::decode(1002, 0).unwrap();
        assert_eq!(instr.opcode, Opcode::Mul);
        assert_eq!(
            instr.modes,
            [Mode::Position, Mode::Immediate, Mode::Position]
        );

        let instr = Instruction::decode(21101, 0).unwrap();
        assert_eq!(
            instr.modes,
            [Mode::Immediate, Mode::Immediate, Mode::Relative]
        );
    }

    #[test]
    fn decode_relative_single_parameter() {
        let instr = Instruction::decode(204, 0).unwrap();
        assert_eq!(instr.opcode, Opcode::Output);
        assert_eq!(instr.param_modes(), &[Mode::Relative]);

        let instr = Instruction::decode(109, 0).unwrap();
        assert_eq!(instr.opcode, Opcode::AdjustBase);
        assert_eq!(instr.param_modes(), &[Mode::Immediate]);
    }

    #[test]
    fn decode_ignores_digits_beyond_arity() {
        let instr = Instruction::decode(99_999, 0).unwrap();
        assert_eq!(instr.opcode, Opcode::Halt);
        assert!(instr.param_modes().is_empty());
        assert_eq!(instr.width(), 1);
    }

    #[test]
    fn decode_unknown_opcode() {
        assert_eq!(
            Instruction::decode(42, 7),
            Err(VMError::InvalidOpcode { opcode: 42, pc: 7 })
        );
    }

    #[test]
    fn decode_negative_word_is_invalid_opcode() {
        assert!(matches!(
            Instruction::decode(-1, 0),
            Err(VMError::InvalidOpcode { opcode: -1, .. })
        ));
        assert!(matches!(
            Instruction::decode(-101, 0),
            Err(VMError::InvalidOpcode { .. })
        ));
    }

    #[test]
    fn decode_unknown_mode_digit() {
        assert_eq!(
            Instruction::decode(301, 3),
            Err(VMError::InvalidMode {
                mode: 3,
                param: 0,
                pc: 3
            })
        );
    }

    #[test]
    fn decode_rejects_immediate_destination() {
        assert_eq!(
            Instruction::decode(10001, 0),
            Err(VMError::InvalidMode {
                mode: 1,
                param: 2,
                pc: 0
            })
        );
        assert_eq!(
            Instruction::decode(103, 0),
            Err(VMError::InvalidMode {
                mode: 1,
                param: 0,
                pc: 0
            })
        );
    }

    #[test]
    fn mode_from_digit() {
        assert_eq!(Mode::from_digit(0), Some(Mode::Position));
        assert_eq!(Mode::from_digit(1), Some(Mode::Immediate));
        assert_eq!(Mode::from_digit(2), Some(Mode::Relative));
        assert_eq!(Mode::from_digit(3), None);
        assert_eq!(Mode::from_digit(-1), None);
    }
}
