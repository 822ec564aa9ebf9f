//! the arm gicv2 interrupt controller backend, with gicv2m message signaled
//! interrupt support.

use bit_field::BitField;
use bitpiece::BitPiece;
use hal::{
    mem::PhysAddr,
    mmio::MmioBus,
    regs::{
        gic::{
            GicMsiTyper, GiccIar, GiccReg, GicdReg, GicdTyper, MsiFrameReg, GICC_BASE, GICD_BASE,
            MSI_FRAME_BASE,
        },
        RegisterBank,
    },
};

use crate::{
    error::{Error, Result},
    intc::{HandlerBinding, InterruptController, LineGroup, LineHandler, LineParam, TriggerType},
    utils::HexDisplay,
};

/// the architectural maximum amount of gicv2 interrupt lines. the handler
/// table is sized for it so that bindings never depend on the discovered
/// line count.
pub const HANDLER_TABLE_LEN: usize = 1024;

/// the priority that every line is configured to during setup.
const DEFAULT_PRIORITY: u8 = 0x80;

/// lines below this are legacy level-triggered peripherals, lines at or above
/// it are message-signaled and edge-triggered.
const EDGE_TRIGGER_FIRST_LINE: u32 = 64;

/// acknowledge values in this range are reserved ids, not real lines. they
/// must not be retired with an end of interrupt write.
const SPURIOUS_IDS: core::ops::RangeInclusive<u32> = 1020..=1023;

/// the spi window which a gicv2m msi frame can raise, discovered during setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsiWindow {
    pub base: u32,
    pub count: u32,
}

pub struct GicV2<'h, B: MmioBus> {
    bus: B,
    gicd: RegisterBank<GicdReg>,
    gicc: RegisterBank<GiccReg>,
    msi_frame: Option<RegisterBank<MsiFrameReg>>,
    max_line: Option<u32>,
    msi_window: Option<MsiWindow>,
    handlers: [Option<HandlerBinding<'h>>; HANDLER_TABLE_LEN],
}

impl<'h, B: MmioBus> GicV2<'h, B> {
    pub fn new(
        bus: B,
        gicd_base: PhysAddr,
        gicc_base: PhysAddr,
        msi_frame_base: Option<PhysAddr>,
    ) -> Self {
        Self {
            bus,
            gicd: RegisterBank::new(gicd_base),
            gicc: RegisterBank::new(gicc_base),
            msi_frame: msi_frame_base.map(RegisterBank::new),
            max_line: None,
            msi_window: None,
            handlers: [None; HANDLER_TABLE_LEN],
        }
    }

    /// creates a controller for the well known banks of the qemu virt
    /// machine.
    pub fn qemu_virt(bus: B) -> Self {
        Self::new(bus, GICD_BASE, GICC_BASE, Some(MSI_FRAME_BASE))
    }

    /// the highest usable line id, discovered during setup.
    pub fn max_line(&self) -> Option<u32> {
        self.max_line
    }

    /// the msi spi window, discovered during setup.
    pub fn msi_window(&self) -> Option<MsiWindow> {
        self.msi_window
    }

    fn check_line(&self, line: u32) -> Result<()> {
        match self.max_line {
            Some(max_line) if line <= max_line => Ok(()),
            _ => {
                log::error!("interrupt line {} is not available", line);
                Err(Error::InvalidParameter)
            }
        }
    }

    /// the address of the word covering the given line in a register bank
    /// packed 32 lines per word.
    fn word_reg(&self, reg: GicdReg, line: u32) -> PhysAddr {
        self.gicd.reg(reg) + (line as usize / 32) * 4
    }

    /// the address of the byte covering the given line in a register bank
    /// packed one byte per line.
    fn byte_reg(&self, reg: GicdReg, line: u32) -> PhysAddr {
        self.gicd.reg(reg) + line as usize
    }

    /// acknowledges the highest priority pending interrupt, runs its bound
    /// handler, and retires it. this is the interrupt context entry point.
    pub fn dispatch(&mut self) {
        let iar = self.bus.read32(self.gicc.reg(GiccReg::Iar));
        let line = GiccIar::from_bits(iar).interrupt_id().get() as u32;
        if SPURIOUS_IDS.contains(&line) {
            // reserved id, nothing was acknowledged, so nothing to retire.
            return;
        }
        self.run_handler(line);
        self.bus.write32(self.gicc.reg(GiccReg::Eoir), iar);
    }
}

impl<'h, B: MmioBus> InterruptController<'h> for GicV2<'h, B> {
    fn setup(&mut self, enabled_lines: &[u32]) -> Result<()> {
        log::debug!("distributor base: {}", HexDisplay(self.gicd.base().0));
        log::debug!("cpu interface base: {}", HexDisplay(self.gicc.base().0));

        let typer = GicdTyper::from_bits(self.bus.read32(self.gicd.reg(GicdReg::Typer)));
        let max_line = typer.max_line();
        self.max_line = Some(max_line);
        log::debug!(
            "TYPER = {}, max line: {}",
            HexDisplay(typer.to_bits()),
            max_line
        );

        if let Some(frame) = self.msi_frame {
            let msi_typer = GicMsiTyper::from_bits(self.bus.read32(frame.reg(MsiFrameReg::Typer)));
            let window = MsiWindow {
                base: msi_typer.spi_base().get() as u32,
                count: msi_typer.spi_count().get() as u32,
            };
            log::debug!(
                "MSI_TYPER = {}, spi base: {} count: {}",
                HexDisplay(msi_typer.to_bits()),
                window.base,
                window.count
            );
            self.msi_window = Some(window);
        }

        for line in 0..=max_line {
            self.disable_line(line)?;
            self.set_priority(line, DEFAULT_PRIORITY)?;
            let trigger = if line < EDGE_TRIGGER_FIRST_LINE {
                TriggerType::Level
            } else {
                TriggerType::Edge
            };
            self.set_trigger_type(line, trigger)?;
            self.set_target_cpu(line, 1)?;
            if enabled_lines.contains(&line) {
                self.enable_line(line)?;
            }
        }

        // accept all priorities, no priority grouping.
        self.bus.write32(self.gicc.reg(GiccReg::Pmr), 0xff);
        self.bus.write32(self.gicc.reg(GiccReg::Bpr), 0);

        // global enable, both groups, distributor first.
        self.bus.write32(self.gicd.reg(GicdReg::Ctlr), 0b11);
        self.bus.write32(self.gicc.reg(GiccReg::Ctlr), 0x1e7);

        log::debug!("gicv2 setup completed");
        Ok(())
    }

    fn shutdown(&mut self) {
        self.bus.write32(self.gicd.reg(GicdReg::Ctlr), 0);
        self.bus.write32(self.gicc.reg(GiccReg::Ctlr), 0);
    }

    fn enable_line(&mut self, line: u32) -> Result<()> {
        self.check_line(line)?;
        // set-enable register, writing a 1 bit enables the line.
        self.bus
            .write32(self.word_reg(GicdReg::Isenabler, line), 1 << (line % 32));
        Ok(())
    }

    fn disable_line(&mut self, line: u32) -> Result<()> {
        self.check_line(line)?;
        // clear-enable register, writing a 1 bit disables the line.
        self.bus
            .write32(self.word_reg(GicdReg::Icenabler, line), 1 << (line % 32));
        Ok(())
    }

    fn set_priority(&mut self, line: u32, priority: u8) -> Result<()> {
        self.check_line(line)?;
        self.bus
            .write8(self.byte_reg(GicdReg::Ipriorityr, line), priority);
        Ok(())
    }

    fn get_priority(&self, line: u32) -> Result<u8> {
        self.check_line(line)?;
        Ok(self.bus.read8(self.byte_reg(GicdReg::Ipriorityr, line)))
    }

    fn set_target_cpu(&mut self, line: u32, cpu_mask: u8) -> Result<()> {
        self.check_line(line)?;
        self.bus
            .write8(self.byte_reg(GicdReg::Itargetsr, line), cpu_mask);
        Ok(())
    }

    fn get_target_cpu(&self, line: u32) -> Result<u8> {
        self.check_line(line)?;
        Ok(self.bus.read8(self.byte_reg(GicdReg::Itargetsr, line)))
    }

    fn set_trigger_type(&mut self, line: u32, trigger: TriggerType) -> Result<()> {
        self.check_line(line)?;
        // 2 bits per line, 16 lines per word.
        let addr = self.gicd.reg(GicdReg::Icfgr) + (line as usize / 16) * 4;
        let shift = (line as usize % 16) * 2;
        let mut value = self.bus.read32(addr);
        value.set_bits(shift..shift + 2, trigger as u32);
        self.bus.write32(addr, value);
        Ok(())
    }

    fn set_group(&mut self, line: u32, group: LineGroup) -> Result<()> {
        self.check_line(line)?;
        let addr = self.word_reg(GicdReg::Igroupr, line);
        let mut value = self.bus.read32(addr);
        value.set_bit(line as usize % 32, group == LineGroup::NonSecure);
        self.bus.write32(addr, value);
        Ok(())
    }

    fn get_msi_address(&self) -> Result<u32> {
        let frame = self.msi_frame.ok_or(Error::NotSupported)?;
        let addr = frame.reg(MsiFrameReg::SetspiS).0;
        u32::try_from(addr).map_err(|_| Error::SystemInternal)
    }

    fn get_msi_data(&self, vector: u64) -> Result<u32> {
        if self.msi_frame.is_none() {
            return Err(Error::NotSupported);
        }
        // the payload is the vector number itself, the controller routes
        // purely by payload value.
        u32::try_from(vector).map_err(|_| Error::SystemInternal)
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
        Ok(())
    }

    fn unregister_handler(&mut self, line: u32) -> Result<()> {
        let slot = self
            .handlers
            .get_mut(line as usize)
            .ok_or(Error::IndexOutOfRange)?;
        *slot = None;
        Ok(())
    }

    fn run_handler(&self, line: u32) {
        match self.handlers.get(line as usize).copied().flatten() {
            Some(binding) => (binding.handler)(binding.param),
            None => {
                log::debug!("no handler bound for interrupt line {}", line);
            }
        }
    }

    fn clear_interrupt(&mut self, line: u32) {
        self.bus.write32(self.gicc.reg(GiccReg::Eoir), line);
    }
}
