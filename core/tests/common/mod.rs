#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;

use hal::mem::PhysAddr;
use hal::mmio::MmioBus;

/// one recorded mmio write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusWrite {
    pub addr: usize,
    pub width: usize,
    pub value: u64,
}

/// an in-memory mmio bus. reads come from a sparse byte map, writes land in
/// the map and are also recorded in order.
pub struct FakeBus {
    mem: RefCell<BTreeMap<usize, u8>>,
    writes: RefCell<Vec<BusWrite>>,
    default_byte: u8,
}

impl FakeBus {
    /// a bus whose unwritten bytes read as zero.
    pub fn zeroed() -> Self {
        Self::with_default(0x00)
    }

    /// a bus whose unwritten bytes read as ones, the way a pci config window
    /// reads for absent functions.
    pub fn all_ones() -> Self {
        Self::with_default(0xff)
    }

    fn with_default(default_byte: u8) -> Self {
        Self {
            mem: RefCell::new(BTreeMap::new()),
            writes: RefCell::new(Vec::new()),
            default_byte,
        }
    }

    /// seeds memory without recording a write.
    pub fn poke8(&self, addr: usize, value: u8) {
        self.mem.borrow_mut().insert(addr, value);
    }

    /// seeds a little endian 32 bit value without recording a write.
    pub fn poke32(&self, addr: usize, value: u32) {
        for (i, byte) in value.to_le_bytes().iter().enumerate() {
            self.poke8(addr + i, *byte);
        }
    }

    pub fn peek8(&self, addr: usize) -> u8 {
        *self.mem.borrow().get(&addr).unwrap_or(&self.default_byte)
    }

    pub fn peek32(&self, addr: usize) -> u32 {
        self.load(addr, 4) as u32
    }

    /// all writes recorded so far, in order.
    pub fn writes(&self) -> Vec<BusWrite> {
        self.writes.borrow().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.borrow().len()
    }

    /// the writes that landed at the given address.
    pub fn writes_at(&self, addr: usize) -> Vec<BusWrite> {
        self.writes
            .borrow()
            .iter()
            .copied()
            .filter(|w| w.addr == addr)
            .collect()
    }

    fn load(&self, addr: usize, len: usize) -> u64 {
        let mem = self.mem.borrow();
        let mut value = 0u64;
        for i in (0..len).rev() {
            value = (value << 8) | *mem.get(&(addr + i)).unwrap_or(&self.default_byte) as u64;
        }
        value
    }

    fn store(&self, addr: usize, len: usize, value: u64) {
        {
            let mut mem = self.mem.borrow_mut();
            for i in 0..len {
                mem.insert(addr + i, (value >> (8 * i)) as u8);
            }
        }
        self.writes.borrow_mut().push(BusWrite {
            addr,
            width: len,
            value,
        });
    }
}

impl MmioBus for FakeBus {
    fn read8(&self, addr: PhysAddr) -> u8 {
        self.load(addr.0, 1) as u8
    }
    fn read16(&self, addr: PhysAddr) -> u16 {
        self.load(addr.0, 2) as u16
    }
    fn read32(&self, addr: PhysAddr) -> u32 {
        self.load(addr.0, 4) as u32
    }
    fn read64(&self, addr: PhysAddr) -> u64 {
        self.load(addr.0, 8)
    }
    fn write8(&self, addr: PhysAddr, value: u8) {
        self.store(addr.0, 1, value as u64)
    }
    fn write16(&self, addr: PhysAddr, value: u16) {
        self.store(addr.0, 2, value as u64)
    }
    fn write32(&self, addr: PhysAddr, value: u32) {
        self.store(addr.0, 4, value as u64)
    }
    fn write64(&self, addr: PhysAddr, value: u64) {
        self.store(addr.0, 8, value)
    }
}
