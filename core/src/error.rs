/// the error kinds reported by the interrupt and pci layers.
#[derive(Debug, thiserror_no_std::Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// a caller supplied argument was out of the valid range.
    #[error("invalid parameter")]
    InvalidParameter,

    /// an internal consistency check failed, for example a hardware reported
    /// value that does not fit its destination field.
    #[error("system internal error")]
    SystemInternal,

    /// the requested operation is not supported by this backend or platform
    /// configuration.
    #[error("not supported")]
    NotSupported,

    /// a fixed capacity table ran out of space.
    #[error("table is full")]
    Full,

    /// an index was out of the bounds of the indexed table.
    #[error("index out of range")]
    IndexOutOfRange,
}

pub type Result<T> = core::result::Result<T, Error>;
