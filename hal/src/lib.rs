#![cfg_attr(not(test), no_std)]

pub mod arch;
pub mod mem;
pub mod mmio;
pub mod regs;
