//! pci configuration space access, bus enumeration and bar resolution.

use arrayvec::ArrayVec;
use bitpiece::*;
use hal::{mem::PhysAddr, mmio::MmioBus};

use crate::error::{Error, Result};

/// the vendor id value that reads back from an absent function.
pub const PCI_VENDOR_ABSENT: u16 = 0xffff;

/// the config space offset of the first base address register.
const BAR_FIRST_REG: u16 = 0x10;

/// the amount of base address registers in a type 0 header.
const BAR_COUNT: usize = 6;

/// the class/subclass pair of a standard pci to pci bridge.
const BRIDGE_CLASS: (u8, u8) = (0x06, 0x04);

/// the format of a port indexed CONFIG_ADDRESS value. the low 30 bits double
/// as the offset layout of the legacy memory mapped config window.
#[bitpiece(32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PciConfigAddr {
    pub zero: B2,
    pub reg_num: B6,
    pub function_num: B3,
    pub dev_num: B5,
    pub bus_num: u8,
    pub reserved: B7,
    pub enabled: bool,
}

/// the header type config register.
#[bitpiece(8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PciHeaderType {
    pub raw_kind: B7,
    pub is_multi_function: bool,
}

/// the class code of a pci function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassCode {
    pub base: u8,
    pub sub: u8,
    pub interface: u8,
}

impl ClassCode {
    pub fn matches(&self, base: u8, sub: u8) -> bool {
        self.base == base && self.sub == sub
    }
}

/// one discovered pci function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PciDevice {
    pub bus: u8,
    pub device: u8,
    pub function: u8,
    pub header_type: PciHeaderType,
    pub class_code: ClassCode,
}

/// the two config space addressing schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigScheme {
    /// legacy CONFIG_ADDRESS style indexing through a memory window.
    PortIo { base: PhysAddr },
    /// enhanced configuration access, one 4k page per function.
    Ecam { base: PhysAddr },
}

impl ConfigScheme {
    /// the address of the given config register of the given function.
    pub fn address(self, bus: u8, device: u8, function: u8, reg: u16) -> PhysAddr {
        match self {
            ConfigScheme::PortIo { base } => {
                let addr = PciConfigAddr::from_fields(PciConfigAddrFields {
                    zero: BitPiece::zeroes(),
                    reg_num: BitPiece::from_bits((reg >> 2) as u8),
                    function_num: BitPiece::from_bits(function),
                    dev_num: BitPiece::from_bits(device),
                    bus_num: bus,
                    reserved: BitPiece::zeroes(),
                    enabled: false,
                });
                PhysAddr(base.0 | addr.to_bits() as usize)
            }
            ConfigScheme::Ecam { base } => PhysAddr(
                base.0
                    | (bus as usize) << 20
                    | (device as usize & 0x1f) << 15
                    | (function as usize & 0x7) << 12
                    | (reg as usize & 0xfff),
            ),
        }
    }
}

/// config space access for a whole pci segment.
pub struct PciConfigSpace<B: MmioBus> {
    bus: B,
    scheme: ConfigScheme,
}

impl<B: MmioBus> PciConfigSpace<B> {
    pub fn new(bus: B, scheme: ConfigScheme) -> Self {
        Self { bus, scheme }
    }

    pub fn read32(&self, bus: u8, device: u8, function: u8, reg: u16) -> u32 {
        self.bus.read32(self.scheme.address(bus, device, function, reg))
    }

    pub fn write32(&self, bus: u8, device: u8, function: u8, reg: u16, value: u32) {
        self.bus
            .write32(self.scheme.address(bus, device, function, reg), value)
    }

    pub fn read_device_reg(&self, device: &PciDevice, reg: u16) -> u32 {
        self.read32(device.bus, device.device, device.function, reg)
    }

    pub fn write_device_reg(&self, device: &PciDevice, reg: u16, value: u32) {
        self.write32(device.bus, device.device, device.function, reg, value)
    }

    pub fn vendor_id(&self, bus: u8, device: u8, function: u8) -> u16 {
        self.read32(bus, device, function, 0x00) as u16
    }

    pub fn device_id(&self, bus: u8, device: u8, function: u8) -> u16 {
        (self.read32(bus, device, function, 0x00) >> 16) as u16
    }

    pub fn header_type(&self, bus: u8, device: u8, function: u8) -> PciHeaderType {
        PciHeaderType::from_bits((self.read32(bus, device, function, 0x0c) >> 16) as u8)
    }

    pub fn class_code(&self, bus: u8, device: u8, function: u8) -> ClassCode {
        let reg = self.read32(bus, device, function, 0x08);
        ClassCode {
            base: (reg >> 24) as u8,
            sub: (reg >> 16) as u8,
            interface: (reg >> 8) as u8,
        }
    }

    /// the secondary bus number of a pci to pci bridge.
    pub fn secondary_bus(&self, bus: u8, device: u8, function: u8) -> u8 {
        (self.read32(bus, device, function, 0x18) >> 8) as u8
    }
}

/// depth-first enumerator of the pci topology, recording every discovered
/// function into a bounded table.
pub struct PciScanner<B: MmioBus, const N: usize> {
    config: PciConfigSpace<B>,
    devices: ArrayVec<PciDevice, N>,
}

impl<B: MmioBus, const N: usize> PciScanner<B, N> {
    pub fn new(config: PciConfigSpace<B>) -> Self {
        Self {
            config,
            devices: ArrayVec::new(),
        }
    }

    /// the functions recorded by the last scan, in discovery order.
    pub fn devices(&self) -> &[PciDevice] {
        &self.devices
    }

    pub fn config(&self) -> &PciConfigSpace<B> {
        &self.config
    }

    /// rescans the whole topology starting at bus 0. on `Full` the table
    /// keeps the functions discovered up to that point.
    pub fn scan_all(&mut self) -> Result<()> {
        self.devices.clear();

        // a multi function host bridge exposes one root bus per function.
        let header_type = self.config.header_type(0, 0, 0);
        if !header_type.is_multi_function() {
            return self.scan_bus(0);
        }
        for function in 0..8 {
            if self.config.vendor_id(0, 0, function) == PCI_VENDOR_ABSENT {
                continue;
            }
            self.scan_bus(function)?;
        }
        Ok(())
    }

    fn scan_bus(&mut self, bus: u8) -> Result<()> {
        for device in 0..32 {
            if self.config.vendor_id(bus, device, 0) == PCI_VENDOR_ABSENT {
                continue;
            }
            self.scan_device(bus, device)?;
        }
        Ok(())
    }

    fn scan_device(&mut self, bus: u8, device: u8) -> Result<()> {
        self.scan_function(bus, device, 0)?;
        if !self.config.header_type(bus, device, 0).is_multi_function() {
            return Ok(());
        }
        for function in 1..8 {
            if self.config.vendor_id(bus, device, function) == PCI_VENDOR_ABSENT {
                continue;
            }
            self.scan_function(bus, device, function)?;
        }
        Ok(())
    }

    fn scan_function(&mut self, bus: u8, device: u8, function: u8) -> Result<()> {
        let class_code = self.config.class_code(bus, device, function);
        let header_type = self.config.header_type(bus, device, function);
        self.devices
            .try_push(PciDevice {
                bus,
                device,
                function,
                header_type,
                class_code,
            })
            .map_err(|_| Error::Full)?;

        if class_code.matches(BRIDGE_CLASS.0, BRIDGE_CLASS.1) {
            let secondary_bus = self.config.secondary_bus(bus, device, function);
            return self.scan_bus(secondary_bus);
        }
        Ok(())
    }

    /// reads a base address register, combining the upper half of a 64 bit
    /// bar from the following register.
    pub fn read_bar(&self, device: &PciDevice, bar_index: usize) -> Result<u64> {
        if bar_index >= BAR_COUNT {
            return Err(Error::IndexOutOfRange);
        }

        let reg = BAR_FIRST_REG + 4 * bar_index as u16;
        let bar = self.config.read_device_reg(device, reg);

        // bit 2 clear means a 32 bit bar.
        if bar & 0b100 == 0 {
            return Ok(bar as u64);
        }

        // a 64 bit bar occupies two registers, so it cannot start at the
        // last index.
        if bar_index >= BAR_COUNT - 1 {
            return Err(Error::IndexOutOfRange);
        }
        let bar_upper = self.config.read_device_reg(device, reg + 4);
        Ok(bar as u64 | (bar_upper as u64) << 32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ecam_address_layout() {
        let scheme = ConfigScheme::Ecam {
            base: PhysAddr(0x3f00_0000),
        };
        assert_eq!(
            scheme.address(1, 2, 3, 0x08),
            PhysAddr(0x3f00_0000 | (1 << 20) | (2 << 15) | (3 << 12) | 0x008)
        );
    }

    #[test]
    fn ecam_address_masks_fields() {
        let scheme = ConfigScheme::Ecam { base: PhysAddr(0) };
        // device and function fields are masked to their widths.
        assert_eq!(scheme.address(0, 0x3f, 0xf, 0), PhysAddr((0x1f << 15) | (0x7 << 12)));
    }

    #[test]
    fn port_io_address_layout() {
        let scheme = ConfigScheme::PortIo {
            base: PhysAddr(0x8000_0000),
        };
        assert_eq!(
            scheme.address(1, 2, 3, 0xfc),
            PhysAddr(0x8000_0000 | (1 << 16) | (2 << 11) | (3 << 8) | 0xfc)
        );
        // the low two register bits are dropped.
        assert_eq!(
            scheme.address(0, 0, 0, 0x07),
            PhysAddr(0x8000_0000 | 0x04)
        );
    }

    #[test]
    fn header_type_multi_function_bit() {
        assert!(PciHeaderType::from_bits(0x80).is_multi_function());
        assert!(!PciHeaderType::from_bits(0x00).is_multi_function());
        assert_eq!(PciHeaderType::from_bits(0x81).raw_kind().get(), 1);
    }
}
