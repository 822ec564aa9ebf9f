#![cfg_attr(not(test), no_std)]

pub mod error;
pub mod intc;
pub mod msi;
pub mod pci;
pub mod sync;
pub mod utils;
