//! Static program listing.
//!
//! Walks a program from address 0 and splits it into instruction and data
//! lines. Intcode mixes code and data freely, so the listing is a best-effort
//! view: any word that does not decode, or whose parameters would run past the
//! end of the program, is shown as a single data cell and the walk continues
//! with the next cell.

use crate::virtual_machine::operand::{Instruction, Mode};
use std::fmt;

/// What a listing line holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineKind {
    /// A decodable instruction with its raw parameters.
    Instr {
        instr: Instruction,
        params: Vec<i64>,
    },
    /// A single cell that is not a complete instruction.
    Data(i64),
}

/// One line of a disassembly listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    /// Address of the first cell of the line.
    pub offset: usize,
    pub kind: LineKind,
}

impl Line {
    /// Returns the number of cells the line covers.
    pub fn width(&self) -> usize {
        match &self.kind {
            LineKind::Instr { params, .. } => 1 + params.len(),
            LineKind::Data(_) => 1,
        }
    }
}

fn write_param(f: &mut fmt::Formatter<'_>, mode: Mode, param: i64) -> fmt::Result {
    match mode {
        Mode::Position => write!(f, "@{param}"),
        Mode::Immediate => write!(f, "{param}"),
        Mode::Relative if param < 0 => write!(f, "rb{param}"),
        Mode::Relative => write!(f, "rb+{param}"),
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>6}  ", self.offset)?;
        match &self.kind {
            LineKind::Data(value) => write!(f, "{:<5} {}", ".data", value),
            LineKind::Instr { instr, params } => {
                write!(f, "{:<5}", instr.opcode)?;
                for (i, (mode, param)) in instr.param_modes().iter().zip(params).enumerate() {
                    f.write_str(if i == 0 { " " } else { ", " })?;
                    write_param(f, *mode, *param)?;
                }
                Ok(())
            }
        }
    }
}

/// Produces a listing of `program`.
pub fn disassemble(program: &[i64]) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut offset = 0;
    while offset < program.len() {
        let word = program[offset];
        let decoded = Instruction::decode(word, offset as i64)
            .ok()
            .filter(|instr| offset + instr.opcode.arity() < program.len());

        let kind = match decoded {
            Some(instr) => LineKind::Instr {
                instr,
                params: program[offset + 1..=offset + instr.opcode.arity()].to_vec(),
            },
            None => LineKind::Data(word),
        };
        let line = Line { offset, kind };
        offset += line.width();
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::virtual_machine::isa::Opcode;

    fn render(program: &[i64]) -> Vec<String> {
        disassemble(program).iter().map(ToString::to_string).collect()
    }

    #[test]
    fn lists_instructions_and_data() {
        let lines = disassemble(&[1002, 4, 3, 4, 33]);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].offset, 0);
        assert!(matches!(
            &lines[0].kind,
            LineKind::Instr { instr, params } if instr.opcode == Opcode::Mul && params == &[4, 3, 4]
        ));
        assert_eq!(lines[1].kind, LineKind::Data(33));
        assert_eq!(lines[1].offset, 4);
    }

    #[test]
    fn renders_modes() {
        assert_eq!(
            render(&[109, 1, 204, -1, 21101, 3, 4, 5, 99]),
            vec![
                "     0  arb   1",
                "     2  out   rb-1",
                "     4  add   3, 4, rb+5",
                "     8  halt ",
            ]
        );
    }

    #[test]
    fn renders_data() {
        assert_eq!(render(&[3, 9, 0, -7]), vec!["     0  in    @9", "     2  .data 0", "     3  .data -7"]);
    }

    #[test]
    fn truncated_instruction_is_data() {
        let lines = disassemble(&[1, 2, 3]);
        assert_eq!(
            lines.iter().map(|l| l.kind.clone()).collect::<Vec<_>>(),
            vec![LineKind::Data(1), LineKind::Data(2), LineKind::Data(3)]
        );
    }

    #[test]
    fn undecodable_words_are_data() {
        let lines = disassemble(&[11101, 42, 99]);
        assert_eq!(lines[0].kind, LineKind::Data(11101));
        assert_eq!(lines[1].kind, LineKind::Data(42));
        assert!(matches!(lines[2].kind, LineKind::Instr { .. }));
    }

    #[test]
    fn widths_cover_the_program() {
        let program = [
            109, 1, 204, -1, 1001, 100, 1, 100, 1008, 100, 16, 101, 1006, 101, 0, 99,
        ];
        let total: usize = disassemble(&program).iter().map(Line::width).sum();
        assert_eq!(total, program.len());
    }

    #[test]
    fn empty_program() {
        assert!(disassemble(&[]).is_empty());
    }
}
