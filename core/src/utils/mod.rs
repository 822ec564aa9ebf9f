use core::fmt::{Display, LowerHex};

pub mod write_once;

/// a wrapper which when formatted, displayes the wrapped value as hex.
pub struct HexDisplay<T: LowerHex>(pub T);
impl<T: LowerHex> Display for HexDisplay<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}
impl<T: LowerHex> LowerHex for HexDisplay<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}
impl<T: LowerHex> core::fmt::Debug for HexDisplay<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}
