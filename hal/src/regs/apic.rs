//! register catalog for the x86 local apic.

use bitpiece::*;
use static_assertions::const_assert_eq;

use crate::mem::PhysAddr;
use crate::regs::bank_registers;

/// the physical base address of the local apic register page.
pub const LAPIC_BASE: PhysAddr = PhysAddr(0xfee0_0000);

bank_registers! {
    /// the registers of the local apic.
    LapicReg {
        Id = 0x020,
        Version = 0x030,
        Tpr = 0x080,
        Eoi = 0x0b0,
        Svr = 0x0f0,
        IcrLow = 0x300,
        IcrHigh = 0x310,
    }
}
const_assert_eq!(LapicReg::OFFSETS.len(), 7);

/// the layout of an msi message address targeting the local apic.
#[bitpiece(32)]
#[derive(Debug, Clone, Copy)]
pub struct MsiMessageAddr {
    pub reserved0: B2,
    pub destination_mode: bool,
    pub redirection_hint: bool,
    pub reserved4: B8,
    pub destination_id: u8,
    /// always 0xfee, placing the message in the apic's address window.
    pub base: B12,
}
