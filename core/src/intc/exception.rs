//! architecture trap entry points. the assembly vector table tail-calls into
//! these, which in turn drive the boot-installed interrupt controller.

use hal::mmio::PhysMmio;

use crate::{sync::IrqLock, utils::write_once::WriteOnce};

#[cfg(target_arch = "x86_64")]
use crate::intc::apic::Apic;
#[cfg(not(target_arch = "x86_64"))]
use crate::intc::gic::GicV2;

/// the interrupt controller backend of the build target platform.
#[cfg(not(target_arch = "x86_64"))]
pub type PlatformController = GicV2<'static, PhysMmio>;

/// the interrupt controller backend of the build target platform.
#[cfg(target_arch = "x86_64")]
pub type PlatformController = Apic<'static, PhysMmio>;

/// the controller instance driven by the trap entry points. written exactly
/// once during boot, locked for the duration of each dispatch.
static INTCTRL: WriteOnce<IrqLock<PlatformController>> = WriteOnce::new();

/// installs the controller instance that trap entry dispatches through. must
/// be called once, before interrupts are unmasked.
pub fn install_controller(controller: PlatformController) {
    INTCTRL.write(IrqLock::new(controller));
}

#[cfg(target_arch = "aarch64")]
mod entry {
    use super::INTCTRL;
    use crate::utils::HexDisplay;

    /// synchronous exceptions are only logged. fault recovery is a policy
    /// decision that lives above this layer.
    #[no_mangle]
    pub extern "C" fn sync_exception_handler(elr: u64, info: u64) {
        log::debug!("{}: sync exception at {}", info, HexDisplay(elr));
    }

    #[no_mangle]
    pub extern "C" fn irq_handler(_elr: u64, _info: u64) {
        match INTCTRL.try_get() {
            Some(intctrl) => intctrl.lock().dispatch(),
            None => {
                log::error!("irq taken before the interrupt controller was installed")
            }
        }
    }

    #[no_mangle]
    pub extern "C" fn fiq_handler(elr: u64, info: u64) {
        log::debug!("{}: fiq at {}", info, HexDisplay(elr));
    }

    #[no_mangle]
    pub extern "C" fn serror_handler(elr: u64, info: u64) {
        log::debug!("{}: serror at {}", info, HexDisplay(elr));
    }
}

#[cfg(target_arch = "x86_64")]
mod entry {
    use super::INTCTRL;

    /// the common irq entry. each per-vector trampoline pushes its vector
    /// number and jumps here.
    #[no_mangle]
    pub extern "C" fn irq_handler(vector: u64) {
        match INTCTRL.try_get() {
            Some(intctrl) => intctrl.lock().dispatch(vector as u32),
            None => {
                log::error!("irq taken before the interrupt controller was installed")
            }
        }
    }
}
