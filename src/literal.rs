//! Deduplicating pool of the numeric literals of one compilation unit.
//!
//! Each distinct `(text, value)` pair gets the next free word offset in the
//! data section, which is addressed from `$gp`.

use std::collections::HashMap;

use log::trace;

#[derive(Debug, Clone, Default)]
pub struct LiteralPool {
    /// Values in insertion order; the position is the word offset.
    values: Vec<f32>,
    /// Dedup index keyed by source text and bit pattern.
    index: HashMap<(String, u32), u32>,
}

impl LiteralPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the word offset of the literal, appending it if unseen.
    pub fn lookup(&mut self, text: &str, value: f32) -> u32 {
        let key = (text.to_string(), value.to_bits());
        if let Some(&offset) = self.index.get(&key) {
            return offset;
        }

        let offset = self.values.len() as u32;
        trace!("literal {} ({}) placed at word offset {}", text, value, offset);
        self.values.push(value);
        self.index.insert(key, offset);
        offset
    }

    /// Number of distinct literals.
    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Data section words, in insertion order.
    pub fn words(&self) -> impl Iterator<Item = u32> + '_ {
        self.values.iter().map(|v| v.to_bits())
    }

    pub fn reset(&mut self) {
        self.values.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_literal_same_offset() {
        let mut pool = LiteralPool::new();
        let first = pool.lookup("3.0", 3.0);
        let second = pool.lookup("3.0", 3.0);
        assert_eq!(first, second);
        assert_eq!(pool.size(), 1);
    }

    #[test]
    fn test_offsets_follow_insertion_order() {
        let mut pool = LiteralPool::new();
        assert_eq!(pool.lookup("1", 1.0), 0);
        assert_eq!(pool.lookup("2.5", 2.5), 1);
        assert_eq!(pool.lookup("1", 1.0), 0);
        assert_eq!(pool.lookup("-7", -7.0), 2);

        let words: Vec<_> = pool.words().collect();
        assert_eq!(
            words,
            vec![1.0f32.to_bits(), 2.5f32.to_bits(), (-7.0f32).to_bits()]
        );
    }

    #[test]
    fn test_distinct_text_is_a_distinct_entry() {
        let mut pool = LiteralPool::new();
        let a = pool.lookup("3.0", 3.0);
        let b = pool.lookup("3.00", 3.0);
        assert_ne!(a, b);
        assert_eq!(pool.size(), 2);
    }

    #[test]
    fn test_reset() {
        let mut pool = LiteralPool::new();
        pool.lookup("4", 4.0);
        pool.reset();
        assert!(pool.is_empty());
        assert_eq!(pool.lookup("5", 5.0), 0);
    }
}
