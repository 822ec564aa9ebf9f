//! binding a pci device's msi capability to an interrupt controller vector.

use crate::{
    error::Result,
    intc::{InterruptController, LineHandler, LineParam},
    pci::PciDevice,
};

/// writes a derived msi address/data pair into a device's msi capability.
/// the capability list walk is owned by the pci driver layer, this layer only
/// supplies the values.
pub trait MsiCapabilityWriter {
    fn configure_msi(
        &mut self,
        device: &PciDevice,
        address: u32,
        data: u32,
        extra_flags: u32,
    ) -> Result<()>;
}

/// derives the controller's msi target address and payload for the given
/// vector, programs them into the device's msi capability, and binds the
/// handler to the vector.
///
/// errors from the controller's msi derivation propagate unchanged, and the
/// device is left untouched in that case.
pub fn bind_msi<'h, C, W>(
    intc: &mut C,
    writer: &mut W,
    device: &PciDevice,
    vector: u64,
    handler: LineHandler,
    param: Option<&'h LineParam>,
    extra_flags: u32,
) -> Result<()>
where
    C: InterruptController<'h>,
    W: MsiCapabilityWriter,
{
    let address = intc.get_msi_address()?;
    let data = intc.get_msi_data(vector)?;
    writer.configure_msi(device, address, data, extra_flags)?;
    intc.register_handler(vector as u32, handler, param)
}
