//! Simulated word-addressable memory.
//!
//! Addresses are plain word indexes into one growing heap. Reads and
//! writes outside issued allocations fault instead of being undefined
//! behavior; this is the interpreter's analogue of a segmentation fault.

use std::collections::HashMap;

use crate::error::FaultKind;

/// The heap for one interpreter session, shared by all calls in it.
#[derive(Debug, Default)]
pub struct Memory {
    words: Vec<i64>,
    segments: HashMap<String, i64>,
}

impl Memory {
    pub fn new() -> Self {
        Memory::default()
    }

    /// Allocates a zero-filled block and returns its base address.
    pub fn alloc(&mut self, words: usize) -> i64 {
        let base = self.words.len() as i64;
        self.words.resize(self.words.len() + words, 0);
        base
    }

    /// Allocates a named segment initialized with `words` and returns its
    /// base address. Used for global data at load time.
    pub fn alloc_segment(&mut self, name: &str, words: &[i64]) -> i64 {
        let base = self.words.len() as i64;
        self.words.extend_from_slice(words);
        self.segments.insert(name.to_string(), base);
        base
    }

    /// Base address of a named segment.
    pub fn segment(&self, name: &str) -> Option<i64> {
        self.segments.get(name).copied()
    }

    /// Word read. Faults on addresses outside issued allocations.
    pub fn read(&self, addr: i64) -> Result<i64, FaultKind> {
        self.index(addr).map(|i| self.words[i])
    }

    /// Word write. Faults on addresses outside issued allocations.
    pub fn write(&mut self, addr: i64, value: i64) -> Result<(), FaultKind> {
        let i = self.index(addr)?;
        self.words[i] = value;
        Ok(())
    }

    /// Number of words issued so far.
    pub fn size(&self) -> usize {
        self.words.len()
    }

    fn index(&self, addr: i64) -> Result<usize, FaultKind> {
        if addr < 0 || addr as usize >= self.words.len() {
            return Err(FaultKind::MemoryOutOfRange { addr });
        }
        Ok(addr as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_and_read_write() {
        let mut mem = Memory::new();
        let base = mem.alloc(4);
        assert_eq!(base, 0);
        assert_eq!(mem.read(base + 2).unwrap(), 0);
        mem.write(base + 2, 99).unwrap();
        assert_eq!(mem.read(base + 2).unwrap(), 99);
    }

    #[test]
    fn test_negative_address_faults() {
        let mut mem = Memory::new();
        mem.alloc(1);
        assert!(matches!(
            mem.read(-1),
            Err(FaultKind::MemoryOutOfRange { addr: -1 })
        ));
    }

    #[test]
    fn test_past_allocation_faults() {
        let mut mem = Memory::new();
        let base = mem.alloc(2);
        assert!(mem.read(base + 1).is_ok());
        assert!(matches!(
            mem.write(base + 2, 1),
            Err(FaultKind::MemoryOutOfRange { .. })
        ));
    }

    #[test]
    fn test_segments_are_contiguous_words() {
        let mut mem = Memory::new();
        let base = mem.alloc_segment("greeting", &[104, 105]);
        assert_eq!(mem.segment("greeting"), Some(base));
        assert_eq!(mem.read(base).unwrap(), 104);
        assert_eq!(mem.read(base + 1).unwrap(), 105);
        assert_eq!(mem.segment("missing"), None);
    }
}
