use core::ptr::NonNull;

use volatile::VolatilePtr;

use crate::mem::PhysAddr;

/// access to a memory mapped register bus.
///
/// the hardware backed implementation is [`PhysMmio`]. the indirection exists
/// so that device drivers can be driven against an in-memory bus in tests.
pub trait MmioBus {
    fn read8(&self, addr: PhysAddr) -> u8;
    fn read16(&self, addr: PhysAddr) -> u16;
    fn read32(&self, addr: PhysAddr) -> u32;
    fn read64(&self, addr: PhysAddr) -> u64;
    fn write8(&self, addr: PhysAddr, value: u8);
    fn write16(&self, addr: PhysAddr, value: u16);
    fn write32(&self, addr: PhysAddr, value: u32);
    fn write64(&self, addr: PhysAddr, value: u64);
}

impl<T: MmioBus> MmioBus for &T {
    fn read8(&self, addr: PhysAddr) -> u8 {
        (**self).read8(addr)
    }
    fn read16(&self, addr: PhysAddr) -> u16 {
        (**self).read16(addr)
    }
    fn read32(&self, addr: PhysAddr) -> u32 {
        (**self).read32(addr)
    }
    fn read64(&self, addr: PhysAddr) -> u64 {
        (**self).read64(addr)
    }
    fn write8(&self, addr: PhysAddr, value: u8) {
        (**self).write8(addr, value)
    }
    fn write16(&self, addr: PhysAddr, value: u16) {
        (**self).write16(addr, value)
    }
    fn write32(&self, addr: PhysAddr, value: u32) {
        (**self).write32(addr, value)
    }
    fn write64(&self, addr: PhysAddr, value: u64) {
        (**self).write64(addr, value)
    }
}

/// the physical mmio bus. reads and writes go straight to memory through
/// volatile accesses.
#[derive(Debug, Clone, Copy)]
pub struct PhysMmio {
    _priv: (),
}

impl PhysMmio {
    /// creates a handle to the physical mmio bus.
    ///
    /// # safety
    /// the caller must make sure that every address accessed through this
    /// handle is a valid device register mapped uncached in the current
    /// address space.
    pub const unsafe fn new() -> Self {
        Self { _priv: () }
    }

    fn reg<T>(addr: PhysAddr) -> VolatilePtr<'static, T> {
        unsafe { VolatilePtr::new(NonNull::new_unchecked(addr.0 as *mut T)) }
    }
}

impl MmioBus for PhysMmio {
    fn read8(&self, addr: PhysAddr) -> u8 {
        Self::reg::<u8>(addr).read()
    }
    fn read16(&self, addr: PhysAddr) -> u16 {
        Self::reg::<u16>(addr).read()
    }
    fn read32(&self, addr: PhysAddr) -> u32 {
        Self::reg::<u32>(addr).read()
    }
    fn read64(&self, addr: PhysAddr) -> u64 {
        Self::reg::<u64>(addr).read()
    }
    fn write8(&self, addr: PhysAddr, value: u8) {
        Self::reg::<u8>(addr).write(value)
    }
    fn write16(&self, addr: PhysAddr, value: u16) {
        Self::reg::<u16>(addr).write(value)
    }
    fn write32(&self, addr: PhysAddr, value: u32) {
        Self::reg::<u32>(addr).write(value)
    }
    fn write64(&self, addr: PhysAddr, value: u64) {
        Self::reg::<u64>(addr).write(value)
    }
}
