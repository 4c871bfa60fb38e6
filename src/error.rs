//! Error types for SMB349 operations
//!
//! This module defines the error types that can occur when using the SMB349 driver.

/// Error types for SMB349 operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// I2C communication error on the given register
    Bus {
        /// Register address the failing transfer targeted
        reg: u8,
        /// Underlying bus error
        error: E,
    },
    /// The charger has not been attached (or was detached)
    NotAttached,
    /// The chip reports that no battery is connected
    BatteryMissing,
}

impl<E> Error<E> {
    pub(crate) fn bus(reg: u8, error: E) -> Self {
        Error::Bus { reg, error }
    }

    /// Register address of a bus error, if this is one
    pub fn register(&self) -> Option<u8> {
        match self {
            Error::Bus { reg, .. } => Some(*reg),
            _ => None,
        }
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Bus { reg, error } => write!(f, "bus error on register {reg:#04x}: {error:?}"),
            Error::NotAttached => f.write_str("charger not attached"),
            Error::BatteryMissing => f.write_str("no battery present"),
        }
    }
}

impl<E: core::fmt::Debug> core::error::Error for Error<E> {}
