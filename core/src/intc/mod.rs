//! interrupt controller backends and the trap entry points that drive them.

use crate::error::Result;

pub mod apic;
pub mod exception;
pub mod gic;

/// the trigger type of an interrupt line, encoded as the 2-bit configuration
/// field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TriggerType {
    Level = 0b00,
    Edge = 0b10,
}

/// the security group of an interrupt line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum LineGroup {
    Secure = 0,
    NonSecure = 1,
}

/// configuration hints that a driver may attach to its handler registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineParam {
    pub priority: u8,
    pub target_cpu: u8,
}

/// a handler invoked when its interrupt line is dispatched.
pub type LineHandler = fn(Option<&LineParam>);

/// a registered handler for one interrupt line.
///
/// the param is borrowed from the registering driver, which must keep it
/// alive for as long as the binding is registered. the controller never takes
/// ownership of it.
#[derive(Debug, Clone, Copy)]
pub struct HandlerBinding<'h> {
    pub handler: LineHandler,
    pub param: Option<&'h LineParam>,
}

/// the operations common to all interrupt controller backends.
pub trait InterruptController<'h> {
    /// discovers the controller's capabilities, configures every line to its
    /// default state, enables the given lines, and globally enables the
    /// controller.
    fn setup(&mut self, enabled_lines: &[u32]) -> Result<()>;

    /// globally disables the controller. per line state is not preserved.
    fn shutdown(&mut self);

    fn enable_line(&mut self, line: u32) -> Result<()>;
    fn disable_line(&mut self, line: u32) -> Result<()>;

    fn set_priority(&mut self, line: u32, priority: u8) -> Result<()>;
    fn get_priority(&self, line: u32) -> Result<u8>;

    fn set_target_cpu(&mut self, line: u32, cpu_mask: u8) -> Result<()>;
    fn get_target_cpu(&self, line: u32) -> Result<u8>;

    fn set_trigger_type(&mut self, line: u32, trigger: TriggerType) -> Result<()>;
    fn set_group(&mut self, line: u32, group: LineGroup) -> Result<()>;

    /// the address that a device should write msi messages to.
    fn get_msi_address(&self) -> Result<u32>;

    /// the msi message payload that routes to the given vector.
    fn get_msi_data(&self, vector: u64) -> Result<u32>;

    /// binds a handler to a line. binding a line beyond the controller's
    /// discovered range is allowed, the binding is just never dispatched.
    fn register_handler(
        &mut self,
        line: u32,
        handler: LineHandler,
        param: Option<&'h LineParam>,
    ) -> Result<()>;
    fn unregister_handler(&mut self, line: u32) -> Result<()>;

    /// invokes the handler bound to the given line. a missing binding is
    /// logged and ignored.
    fn run_handler(&self, line: u32);

    /// signals end of interrupt for the given line.
    fn clear_interrupt(&mut self, line: u32);
}
