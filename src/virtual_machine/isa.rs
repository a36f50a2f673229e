//! Instruction Set Architecture (ISA) definitions.
//!
//! The [`for_each_instruction!`](crate::for_each_instruction) macro holds the
//! canonical instruction table and hands it to a callback macro, so the opcode
//! enum, the disassembler and the tests all read the same definitions.
//!
//! This module generates:
//! - The [`Opcode`] enum with its numeric codes
//! - `TryFrom<i64>` for decoding the low two digits of an instruction word
//! - Mnemonics and per-parameter [`Role`]s
//!
//! # Instruction word
//!
//! `word % 100` selects the opcode. The remaining decimal digits, read from the
//! hundreds place upwards, give one addressing mode per parameter (first
//! parameter in the hundreds digit, third in the ten-thousands digit). Missing
//! digits mean positional mode.

use crate::virtual_machine::errors::VMError;
use std::fmt;

/// How an instruction uses one of its parameters.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Role {
    /// The parameter is evaluated to a value.
    Read,
    /// The parameter names the address the result is written to.
    Write,
}

/// Invokes a callback macro with the complete instruction definition list.
#[macro_export]
macro_rules! for_each_instruction {
    ($callback:ident) => {
        $callback! {
            /// ADD a, b, dst ; dst = a + b
            Add = 1, "add" => [a: Read, b: Read, dst: Write],
            /// MUL a, b, dst ; dst = a * b
            Mul = 2, "mul" => [a: Read, b: Read, dst: Write],
            /// IN dst ; suspend until the caller provides a value, then dst = value
            Input = 3, "in" => [dst: Write],
            /// OUT src ; stage src as output and suspend
            Output = 4, "out" => [src: Read],
            /// JNZ cond, target ; pc = target if cond != 0
            JumpIfTrue = 5, "jnz" => [cond: Read, target: Read],
            /// JZ cond, target ; pc = target if cond == 0
            JumpIfFalse = 6, "jz" => [cond: Read, target: Read],
            /// LT a, b, dst ; dst = 1 if a < b else 0
            LessThan = 7, "lt" => [a: Read, b: Read, dst: Write],
            /// EQ a, b, dst ; dst = 1 if a == b else 0
            Equals = 8, "eq" => [a: Read, b: Read, dst: Write],
            /// ARB offset ; relative base += offset
            AdjustBase = 9, "arb" => [offset: Read],
            /// HALT ; stop for good
            Halt = 99, "halt" => [],
        }
    };
}

#[macro_export]
macro_rules! define_instructions {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $code:literal, $mnemonic:literal => [
                $( $field:ident : $role:ident ),* $(,)?
            ]
        ),* $(,)?
    ) => {
        /// Instruction selector taken from the low two digits of a word.
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        pub enum Opcode {
            $(
                $(#[$doc])*
                $name = $code,
            )*
        }

        impl TryFrom<i64> for Opcode {
            type Error = VMError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                match value {
                    $( $code => Ok(Opcode::$name), )*
                    _ => Err(VMError::InvalidOpcode {
                        opcode: value,
                        pc: 0,
                    }),
                }
            }
        }

        impl Opcode {
            /// Every opcode, in table order.
            pub const ALL: &'static [Opcode] = &[ $( Opcode::$name, )* ];

            /// Returns the mnemonic used in disassembly and traces.
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( Opcode::$name => $mnemonic, )*
                }
            }

            /// Returns the role of each parameter, in order.
            pub const fn roles(&self) -> &'static [Role] {
                match self {
                    $( Opcode::$name => &[ $( Role::$role, )* ], )*
                }
            }

            /// Returns the number of parameters following the instruction word.
            pub const fn arity(&self) -> usize {
                self.roles().len()
            }

            /// Returns the numeric code stored in the low two digits.
            pub const fn code(&self) -> i64 {
                *self as i64
            }
        }
    };
}

for_each_instruction!(define_instructions);

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_try_from_valid() {
        assert_eq!(Opcode::try_from(1).unwrap(), Opcode::Add);
        assert_eq!(Opcode::try_from(3).unwrap(), Opcode::Input);
        assert_eq!(Opcode::try_from(9).unwrap(), Opcode::AdjustBase);
        assert_eq!(Opcode::try_from(99).unwrap(), Opcode::Halt);
    }

    #[test]
    fn opcode_try_from_invalid() {
        for code in [0, 10, 42, 98, -1, 100] {
            assert!(matches!(
                Opcode::try_from(code),
                Err(VMError::InvalidOpcode { opcode, .. }) if opcode == code
            ));
        }
    }

    #[test]
    fn opcode_table_is_stable() {
        let table: Vec<(i64, usize)> = Opcode::ALL
            .iter()
            .map(|op| (op.code(), op.arity()))
            .collect();
        assert_eq!(
            table,
            vec![
                (1, 3),
                (2, 3),
                (3, 1),
                (4, 1),
                (5, 2),
                (6, 2),
                (7, 3),
                (8, 3),
                (9, 1),
                (99, 0)
            ]
        );
    }

    #[test]
    fn writing_instructions_end_with_a_destination() {
        for op in [Opcode::Add, Opcode::Mul, Opcode::LessThan, Opcode::Equals] {
            assert_eq!(op.roles(), &[Role::Read, Role::Read, Role::Write]);
        }
        assert_eq!(Opcode::Input.roles(), &[Role::Write]);
        assert_eq!(Opcode::Output.roles(), &[Role::Read]);
        assert!(Opcode::Halt.roles().is_empty());
    }

    #[test]
    fn display_uses_mnemonic() {
        assert_eq!(Opcode::JumpIfFalse.to_string(), "jz");
        assert_eq!(format!("{:>5}", Opcode::Halt), " halt");
    }
}
