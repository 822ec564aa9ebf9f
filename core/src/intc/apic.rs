//! the x86-64 idt and local apic interrupt controller backend.

use bitpiece::*;
use hal::{
    mem::VirtAddr,
    mmio::MmioBus,
    regs::{
        apic::{LapicReg, MsiMessageAddr, MsiMessageAddrFields, LAPIC_BASE},
        RegisterBank,
    },
};
use static_assertions::const_assert_eq;

use crate::{
    error::{Error, Result},
    intc::{HandlerBinding, InterruptController, LineGroup, LineHandler, LineParam, TriggerType},
};

/// the amount of interrupt descriptor table entries.
pub const IDT_LEN: usize = 256;

/// the highest vector number, which is also the highest usable line id of
/// this backend.
const MAX_LINE: u32 = (IDT_LEN - 1) as u32;

/// the attribute word of an interrupt descriptor.
#[bitpiece(16)]
#[derive(Debug, Clone, Copy)]
pub struct IdtAttr {
    pub ist: B3,
    pub reserved3: B5,
    pub gate_type: B4,
    pub zero12: B1,
    pub dpl: B2,
    pub present: bool,
}

/// the gate type value of a 64-bit interrupt gate.
pub const GATE_TYPE_INTERRUPT: u8 = 0b1110;

/// one entry of the interrupt descriptor table. the handler offset is split
/// across three fields.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdtEntry {
    offset_low: u16,
    segment_selector: u16,
    attr: u16,
    offset_middle: u16,
    offset_high: u32,
    reserved: u32,
}
const_assert_eq!(core::mem::size_of::<IdtEntry>(), 16);

impl IdtEntry {
    /// an empty, non present entry.
    pub const fn missing() -> Self {
        Self {
            offset_low: 0,
            segment_selector: 0,
            attr: 0,
            offset_middle: 0,
            offset_high: 0,
            reserved: 0,
        }
    }

    pub fn new(attr: IdtAttr, offset: u64, segment_selector: u16) -> Self {
        Self {
            offset_low: offset as u16,
            segment_selector,
            attr: attr.to_bits(),
            offset_middle: (offset >> 16) as u16,
            offset_high: (offset >> 32) as u32,
            reserved: 0,
        }
    }

    /// the handler offset, recombined from its three fields.
    pub fn offset(&self) -> u64 {
        self.offset_low as u64
            | ((self.offset_middle as u64) << 16)
            | ((self.offset_high as u64) << 32)
    }

    pub fn is_present(&self) -> bool {
        IdtAttr::from_bits(self.attr).present()
    }

    fn set_present(&mut self, present: bool) {
        let mut attr = IdtAttr::from_bits(self.attr);
        attr.set_present(present);
        self.attr = attr.to_bits();
    }
}

/// a table of per-vector trampoline entry points, laid out at a fixed stride
/// from a base address. the trampolines themselves are provided by the
/// kernel's assembly layer.
#[derive(Debug, Clone, Copy)]
pub struct TrampolineTable {
    pub base: VirtAddr,
    pub stride: usize,
}

impl TrampolineTable {
    fn entry(&self, vector: u32) -> u64 {
        (self.base.0 + vector as usize * self.stride) as u64
    }
}

pub struct Apic<'h, B: MmioBus> {
    bus: B,
    lapic: RegisterBank<LapicReg>,
    idt: [IdtEntry; IDT_LEN],
    segment_selector: u16,
    trampolines: TrampolineTable,
    handlers: [Option<HandlerBinding<'h>>; IDT_LEN],
}

impl<'h, B: MmioBus> Apic<'h, B> {
    pub fn new(bus: B, segment_selector: u16, trampolines: TrampolineTable) -> Self {
        Self {
            bus,
            lapic: RegisterBank::new(LAPIC_BASE),
            idt: [IdtEntry::missing(); IDT_LEN],
            segment_selector,
            trampolines,
            handlers: [None; IDT_LEN],
        }
    }

    /// the local apic id of the boot cpu.
    pub fn apic_id(&self) -> u8 {
        (self.bus.read32(self.lapic.reg(LapicReg::Id)) >> 24) as u8
    }

    /// the idt gate of the given vector.
    pub fn gate(&self, vector: u32) -> Option<&IdtEntry> {
        self.idt.get(vector as usize)
    }

    /// the (limit, base) pair describing the idt, for loading into the cpu's
    /// idt register. the load itself is done by the kernel's assembly layer.
    pub fn idt_descriptor(&self) -> (u16, VirtAddr) {
        let limit = (core::mem::size_of_val(&self.idt) - 1) as u16;
        (limit, VirtAddr(self.idt.as_ptr() as usize))
    }

    /// runs the handler bound to the given vector and signals end of
    /// interrupt. this is the interrupt context entry point, the vector is
    /// recovered by the trampoline that was entered.
    pub fn dispatch(&mut self, vector: u32) {
        self.run_handler(vector);
        self.bus.write32(self.lapic.reg(LapicReg::Eoi), 0);
    }

    fn check_line(&self, line: u32) -> Result<()> {
        if line > MAX_LINE {
            log::error!("interrupt vector {} is not available", line);
            return Err(Error::InvalidParameter);
        }
        Ok(())
    }
}

impl<'h, B: MmioBus> InterruptController<'h> for Apic<'h, B> {
    fn setup(&mut self, enabled_lines: &[u32]) -> Result<()> {
        log::debug!("local apic id: {}", self.apic_id());
        for &line in enabled_lines {
            self.enable_line(line)?;
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        for entry in self.idt.iter_mut() {
            entry.set_present(false);
        }
    }

    fn enable_line(&mut self, line: u32) -> Result<()> {
        self.check_line(line)?;
        self.idt[line as usize].set_present(true);
        Ok(())
    }

    fn disable_line(&mut self, line: u32) -> Result<()> {
        self.check_line(line)?;
        self.idt[line as usize].set_present(false);
        Ok(())
    }

    // the apic backend routes purely by vector number. per line priority,
    // affinity, trigger and grouping are distributor concepts which have no
    // equivalent here.
    fn set_priority(&mut self, _line: u32, _priority: u8) -> Result<()> {
        Err(Error::NotSupported)
    }
    fn get_priority(&self, _line: u32) -> Result<u8> {
        Err(Error::NotSupported)
    }
    fn set_target_cpu(&mut self, _line: u32, _cpu_mask: u8) -> Result<()> {
        Err(Error::NotSupported)
    }
    fn get_target_cpu(&self, _line: u32) -> Result<u8> {
        Err(Error::NotSupported)
    }
    fn set_trigger_type(&mut self, _line: u32, _trigger: TriggerType) -> Result<()> {
        Err(Error::NotSupported)
    }
    fn set_group(&mut self, _line: u32, _group: LineGroup) -> Result<()> {
        Err(Error::NotSupported)
    }

    fn get_msi_address(&self) -> Result<u32> {
        // fixed destination, the message targets the boot cpu's apic.
        let addr = MsiMessageAddr::from_fields(MsiMessageAddrFields {
            reserved0: BitPiece::zeroes(),
            destination_mode: false,
            redirection_hint: false,
            reserved4: BitPiece::zeroes(),
            destination_id: self.apic_id(),
            base: BitPiece::from_bits(0xfee),
        });
        Ok(addr.to_bits())
    }

    fn get_msi_data(&self, vector: u64) -> Result<u32> {
        if vector > MAX_LINE as u64 {
            return Err(Error::SystemInternal);
        }
        Ok(vector as u32)
    }

    fn register_handler(
        &mut self,
        line: u32,
        handler: LineHandler,
        param: Option<&'h LineParam>,
    ) -> Result<()> {
        let slot = self
            .handlers
            .get_mut(line as usize)
            .ok_or(Error::IndexOutOfRange)?;
        *slot = Some(HandlerBinding { handler, param });

        let attr = IdtAttr::from_fields(IdtAttrFields {
            ist: BitPiece::zeroes(),
            reserved3: BitPiece::zeroes(),
            gate_type: BitPiece::from_bits(GATE_TYPE_INTERRUPT),
            zero12: BitPiece::zeroes(),
            dpl: BitPiece::zeroes(),
            present: true,
        });
        self.idt[line as usize] = IdtEntry::new(
            attr,
            self.trampolines.entry(line),
            self.segment_selector,
        );
        Ok(())
    }

    fn unregister_handler(&mut self, line: u32) -> Result<()> {
        let slot = self
            .handlers
            .get_mut(line as usize)
            .ok_or(Error::IndexOutOfRange)?;
        *slot = None;
        self.idt[line as usize] = IdtEntry::missing();
        Ok(())
    }

    fn run_handler(&self, line: u32) {
        match self.handlers.get(line as usize).copied().flatten() {
            Some(binding) => (binding.handler)(binding.param),
            None => {
                log::debug!("no handler bound for interrupt vector {}", line);
            }
        }
    }

    fn clear_interrupt(&mut self, _line: u32) {
        self.bus.write32(self.lapic.reg(LapicReg::Eoi), 0);
    }
}
