//! register catalogs for the arm generic interrupt controller, version 2.

use bitpiece::*;
use static_assertions::const_assert_eq;

use crate::mem::PhysAddr;
use crate::regs::bank_registers;

/// the physical base address of the gic distributor on the qemu virt machine.
pub const GICD_BASE: PhysAddr = PhysAddr(0x0800_0000);

/// the physical base address of the gic cpu interface on the qemu virt machine.
pub const GICC_BASE: PhysAddr = PhysAddr(0x0801_0000);

/// the physical base address of the gicv2m msi frame on the qemu virt machine.
pub const MSI_FRAME_BASE: PhysAddr = PhysAddr(0x0802_0000);

bank_registers! {
    /// the registers of the gic distributor.
    GicdReg {
        Ctlr = 0x000,
        Typer = 0x004,
        Iidr = 0x008,
        Igroupr = 0x080,
        Isenabler = 0x100,
        Icenabler = 0x180,
        Ispendr = 0x200,
        Icpendr = 0x280,
        Isactiver = 0x300,
        Icactiver = 0x380,
        Ipriorityr = 0x400,
        Itargetsr = 0x800,
        Icfgr = 0xc00,
        Nsacr = 0xe00,
        Sgir = 0xf00,
        Cpendsgir = 0xf10,
        Spendsgir = 0xf20,
        Id = 0xfd0,
    }
}
const_assert_eq!(GicdReg::OFFSETS.len(), 18);

bank_registers! {
    /// the registers of the gic cpu interface.
    GiccReg {
        Ctlr = 0x0000,
        Pmr = 0x0004,
        Bpr = 0x0008,
        Iar = 0x000c,
        Eoir = 0x0010,
        Rpr = 0x0014,
        Hppir = 0x0018,
        Abpr = 0x001c,
        Aiar = 0x0020,
        Aeoir = 0x0024,
        Ahppir = 0x0028,
        Apr = 0x00d0,
        Nsapr = 0x00e0,
        Iidr = 0x00fc,
        Dir = 0x1000,
    }
}
const_assert_eq!(GiccReg::OFFSETS.len(), 15);

bank_registers! {
    /// the registers of a gicv2m msi frame.
    MsiFrameReg {
        Typer = 0x008,
        SetspiS = 0x040,
        Iidr = 0xfcc,
    }
}
const_assert_eq!(MsiFrameReg::OFFSETS.len(), 3);

/// the distributor's interrupt controller type register.
#[bitpiece(32)]
#[derive(Debug, Clone, Copy)]
pub struct GicdTyper {
    /// encodes the number of supported interrupt lines as a power of two.
    pub it_lines_number: B5,
    pub cpu_number: B3,
    pub reserved8: B2,
    pub security_extn: bool,
    pub lspi: B5,
    pub reserved16: B16,
}

impl GicdTyper {
    /// the highest interrupt line id supported by the distributor.
    pub fn max_line(self) -> u32 {
        (1 << self.it_lines_number().get() as u32) - 1
    }
}

/// the msi frame's type register, which encodes the window of spi lines that
/// the frame can raise.
#[bitpiece(32)]
#[derive(Debug, Clone, Copy)]
pub struct GicMsiTyper {
    pub spi_count: B9,
    pub reserved9: B7,
    pub spi_base: B10,
    pub reserved26: B6,
}

/// the cpu interface's interrupt acknowledge register.
#[bitpiece(32)]
#[derive(Debug, Clone, Copy)]
pub struct GiccIar {
    pub interrupt_id: B10,
    pub cpu_id: B3,
    pub reserved13: B19,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regs::BankRegister;

    #[test]
    fn distributor_offsets() {
        assert_eq!(GicdReg::Ctlr.offset(), 0x000);
        assert_eq!(GicdReg::Isenabler.offset(), 0x100);
        assert_eq!(GicdReg::Icenabler.offset(), 0x180);
        assert_eq!(GicdReg::Ipriorityr.offset(), 0x400);
        assert_eq!(GicdReg::Itargetsr.offset(), 0x800);
        assert_eq!(GicdReg::Icfgr.offset(), 0xc00);
        assert_eq!(GicdReg::Id.offset(), 0xfd0);
    }

    #[test]
    fn cpu_interface_offsets() {
        assert_eq!(GiccReg::Iar.offset(), 0x00c);
        assert_eq!(GiccReg::Eoir.offset(), 0x010);
        assert_eq!(GiccReg::Dir.offset(), 0x1000);
    }

    #[test]
    fn typer_line_count_decoding() {
        let typer = GicdTyper::from_bits(5);
        assert_eq!(typer.max_line(), 31);

        let typer = GicdTyper::from_bits(7);
        assert_eq!(typer.max_line(), 127);
    }

    #[test]
    fn msi_typer_window_decoding() {
        let typer = GicMsiTyper::from_bits((80 << 16) | 32);
        assert_eq!(typer.spi_base().get(), 80);
        assert_eq!(typer.spi_count().get(), 32);
    }
}
