//! low level cpu interrupt masking.

/// sets whether cpu interrupts are currently enabled.
#[cfg(target_arch = "aarch64")]
pub fn interrupts_set_enabled(enabled: bool) {
    unsafe {
        if enabled {
            core::arch::asm!("msr daifclr, #2", options(nomem, nostack));
        } else {
            core::arch::asm!("msr daifset, #2", options(nomem, nostack));
        }
    }
}

/// returns whether cpu interrupts are currently enabled.
#[cfg(target_arch = "aarch64")]
pub fn interrupts_enabled() -> bool {
    let daif: u64;
    unsafe {
        core::arch::asm!("mrs {}, daif", out(reg) daif, options(nomem, nostack, preserves_flags));
    }
    // bit 7 is the irq mask bit. masked means disabled.
    daif & (1 << 7) == 0
}

/// sets whether cpu interrupts are currently enabled.
#[cfg(target_arch = "x86_64")]
pub fn interrupts_set_enabled(enabled: bool) {
    unsafe {
        if enabled {
            core::arch::asm!("sti", options(nomem, nostack));
        } else {
            core::arch::asm!("cli", options(nomem, nostack));
        }
    }
}

/// returns whether cpu interrupts are currently enabled.
#[cfg(target_arch = "x86_64")]
pub fn interrupts_enabled() -> bool {
    let flags: u64;
    unsafe {
        core::arch::asm!("pushfq; pop {}", out(reg) flags, options(nomem, preserves_flags));
    }
    flags & (1 << 9) != 0
}

#[cfg(not(any(target_arch = "aarch64", target_arch = "x86_64")))]
pub fn interrupts_set_enabled(_enabled: bool) {
    unimplemented!("interrupt masking is not implemented for this architecture");
}

#[cfg(not(any(target_arch = "aarch64", target_arch = "x86_64")))]
pub fn interrupts_enabled() -> bool {
    unimplemented!("interrupt masking is not implemented for this architecture");
}

/// disables interrupts and returns whether they were previously enabled.
pub fn interrupts_save() -> bool {
    let were_enabled = interrupts_enabled();
    interrupts_set_enabled(false);
    were_enabled
}

/// restores an interrupt enablement state saved by [`interrupts_save`].
pub fn interrupts_restore(were_enabled: bool) {
    interrupts_set_enabled(were_enabled)
}
