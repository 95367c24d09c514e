//! Owned in-memory buffers: test fixtures, buffers handed over by another tool, or data
//! unpacked from a container.

use super::Backend;

/// A package buffer owned in memory.
#[derive(Debug)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    pub fn new(data: Vec<u8>) -> Memory {
        Memory { data }
    }
}

impl Backend for Memory {
    fn data(&self) -> &[u8] {
        &self.data
    }
}
