//! fixed-layout device register catalogs.

use core::marker::PhantomData;

use crate::mem::PhysAddr;

pub mod apic;
pub mod gic;

/// a register inside a fixed-layout device register bank.
pub trait BankRegister: Copy {
    /// the byte offset of this register from the bank's base address.
    fn offset(self) -> usize;
}

/// defines an enum of the registers of a single device register bank, along
/// with their byte offsets from the bank's base address.
macro_rules! bank_registers {
    {
        $(#[$outer:meta])*
        $name: ident {
            $(
                $(#[$reg_meta:meta])*
                $reg: ident = $offset: literal,
            )+
        }
    } => {
        $(#[$outer])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(usize)]
        pub enum $name {
            $(
                $(#[$reg_meta])*
                $reg,
            )+
        }
        impl $name {
            pub(crate) const OFFSETS: &'static [usize] = &[
                $($offset,)+
            ];
        }
        impl $crate::regs::BankRegister for $name {
            fn offset(self) -> usize {
                Self::OFFSETS[self as usize]
            }
        }
    };
}
pub(crate) use bank_registers;

/// a device register bank at a fixed physical base address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterBank<R: BankRegister> {
    base: PhysAddr,
    phantom: PhantomData<R>,
}

impl<R: BankRegister> RegisterBank<R> {
    /// creates a register bank rooted at the given base address.
    pub const fn new(base: PhysAddr) -> Self {
        Self {
            base,
            phantom: PhantomData,
        }
    }

    /// the base address of this bank.
    pub fn base(self) -> PhysAddr {
        self.base
    }

    /// the address of the given register of this bank.
    pub fn reg(self, reg: R) -> PhysAddr {
        PhysAddr(self.base.0 + reg.offset())
    }
}
