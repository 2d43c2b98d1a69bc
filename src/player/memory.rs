//! Memory-mapped address space seen by the player

/// Size of the addressable space
pub const MEMORY_SIZE: usize = 0x10000;

/// Byte-addressed memory with TIC-80 style `peek`/`poke`
pub trait Memory {
    fn peek(&self, addr: usize) -> u8;
    fn poke(&mut self, addr: usize, value: u8);

    /// Copy `dst.len()` bytes starting at `addr`
    fn peek_into(&self, addr: usize, dst: &mut [u8]) {
        for (i, b) in dst.iter_mut().enumerate() {
            *b = self.peek(addr + i);
        }
    }
}

/// Flat 64 KiB RAM; reads outside it return 0, writes are dropped
#[derive(Debug, Clone)]
pub struct Ram {
    bytes: Vec<u8>,
}

impl Ram {
    pub fn new() -> Self {
        Self {
            bytes: vec![0; MEMORY_SIZE],
        }
    }

    /// Copy `data` into memory at `base`, truncating at the end of the space
    pub fn load(&mut self, base: usize, data: &[u8]) {
        if base >= MEMORY_SIZE {
            return;
        }
        let len = data.len().min(MEMORY_SIZE - base);
        self.bytes[base..base + len].copy_from_slice(&data[..len]);
    }

    /// Bytes in `addr..addr + len` that lie inside the address space
    pub fn slice(&self, addr: usize, len: usize) -> &[u8] {
        let start = addr.min(MEMORY_SIZE);
        let end = (addr + len).min(MEMORY_SIZE);
        &self.bytes[start..end]
    }
}

impl Default for Ram {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory for Ram {
    fn peek(&self, addr: usize) -> u8 {
        self.bytes.get(addr).copied().unwrap_or(0)
    }

    fn poke(&mut self, addr: usize, value: u8) {
        if let Some(b) = self.bytes.get_mut(addr) {
            *b = value;
        }
    }

    fn peek_into(&self, addr: usize, dst: &mut [u8]) {
        let src = self.slice(addr, dst.len());
        let (head, tail) = dst.split_at_mut(src.len());
        head.copy_from_slice(src);
        tail.fill(0);
    }
}
