//! Sparse, zero-initialized VM memory.

use std::collections::HashMap;

/// Address space of a single VM.
///
/// Every non-negative address exists and reads as zero until written. Only
/// written cells are stored, so programs may touch addresses far beyond their
/// own length. Cloning produces fully independent storage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Memory {
    cells: HashMap<u64, i64>,
}

impl Memory {
    /// Creates an empty memory (all cells zero).
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `program` at addresses `0..program.len()`.
    pub fn from_program(program: &[i64]) -> Self {
        Self {
            cells: (0u64..).zip(program.iter().copied()).collect(),
        }
    }

    /// Returns the value at `address`, or 0 if it was never written.
    pub fn get(&self, address: u64) -> i64 {
        self.cells.get(&address).copied().unwrap_or(0)
    }

    /// Stores `value` at `address`, overwriting any previous value.
    pub fn set(&mut self, address: u64, value: i64) {
        self.cells.insert(address, value);
    }

    /// Returns how many cells have been stored explicitly.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if no cell has been stored.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterates over stored cells in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, i64)> + '_ {
        self.cells.iter().map(|(&address, &value)| (address, value))
    }

    /// Returns the stored cells sorted by address, for diagnostics.
    pub fn dump(&self) -> Vec<(u64, i64)> {
        let mut cells: Vec<_> = self.iter().collect();
        cells.sort_unstable_by_key(|&(address, _)| address);
        cells
    }

    /// Returns `len` consecutive values starting at `start`, zero-filled.
    pub fn slice(&self, start: u64, len: usize) -> Vec<i64> {
        (start..).take(len).map(|address| self.get(address)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwritten_cells_read_zero() {
        let memory = Memory::from_program(&[1, 2, 3]);
        assert_eq!(memory.get(3), 0);
        assert_eq!(memory.get(1_000_000), 0);
        assert_eq!(memory.get(u64::MAX), 0);
        assert_eq!(Memory::new().get(0), 0);
    }

    #[test]
    fn program_loads_at_zero() {
        let memory = Memory::from_program(&[7, -8, 9]);
        assert_eq!(memory.slice(0, 4), vec![7, -8, 9, 0]);
        assert_eq!(memory.len(), 3);
    }

    #[test]
    fn set_overwrites() {
        let mut memory = Memory::from_program(&[1]);
        memory.set(0, 5);
        memory.set(4096, 11);
        assert_eq!(memory.get(0), 5);
        assert_eq!(memory.get(4096), 11);
        assert_eq!(memory.len(), 2);
    }

    #[test]
    fn writing_zero_still_stores_the_cell() {
        let mut memory = Memory::new();
        memory.set(9, 0);
        assert_eq!(memory.len(), 1);
        assert!(!memory.is_empty());
    }

    #[test]
    fn clone_is_independent() {
        let mut original = Memory::from_program(&[1, 2, 3]);
        let mut copy = original.clone();

        copy.set(0, 100);
        copy.set(50, 7);
        assert_eq!(original.get(0), 1);
        assert_eq!(original.get(50), 0);

        original.set(1, -2);
        assert_eq!(copy.get(1), 2);
    }

    #[test]
    fn dump_is_sorted() {
        let mut memory = Memory::new();
        memory.set(300, 3);
        memory.set(1, 1);
        memory.set(20, 2);
        assert_eq!(memory.dump(), vec![(1, 1), (20, 2), (300, 3)]);

        let mut seen: Vec<_> = memory.iter().collect();
        seen.sort_unstable();
        assert_eq!(seen, memory.dump());
    }
}
