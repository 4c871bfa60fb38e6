//! Register addresses and bit definitions for the SMB349
//!
//! Configuration registers (0x00..=0x11) only accept writes while the
//! volatile write bit in `SMB349_CMD_A` is set. Command and status registers
//! live at 0x30 and above.

use bitflags::bitflags;

/// Default 7-bit I2C address
pub const SMB349_DEFAULT_ADDRESS: u8 = 0x5F;

// ========================================
// Configuration registers (write protected)
// ========================================

/// Charge current register - Fast charge and pre-charge current settings
pub const SMB349_CHARGE_CURRENT: u8 = 0x00;

/// Input current limit register
pub const SMB349_INPUT_CURRENT: u8 = 0x01;

/// Various functions register
pub const SMB349_VARIOUS_FUNCTIONS: u8 = 0x02;

/// Float voltage register
pub const SMB349_FLOAT_VOLTAGE: u8 = 0x03;

/// Charge control register
pub const SMB349_CHARGE_CTRL: u8 = 0x04;

/// STAT and timer control register
pub const SMB349_STAT_TIMER_CTRL: u8 = 0x05;

/// Pin and enable control register
pub const SMB349_PIN_CTRL: u8 = 0x06;

/// Thermal and system voltage control register
pub const SMB349_THERM_CTRL: u8 = 0x07;

/// SYSOK and USB3.0 selection register
pub const SMB349_SYSOK_CTRL: u8 = 0x08;

/// Other control register
pub const SMB349_CTRL_REG: u8 = 0x09;

/// OTG thermal and current limit register
pub const SMB349_OTG_TLIM: u8 = 0x0A;

/// Hard/soft temperature limit register
pub const SMB349_HARD_SOFT_TEMP: u8 = 0x0B;

/// Fault interrupt enable register
pub const SMB349_FAULT_INTR: u8 = 0x0C;

/// Status interrupt enable register
pub const SMB349_STATUS_INTR: u8 = 0x0D;

/// SYSOK and USB3.0 register
pub const SMB349_SYSOK_USB3: u8 = 0x0E;

/// Input voltage detection register
pub const SMB349_IN_VOLTAGE_DET: u8 = 0x10;

/// Second status interrupt enable register
pub const SMB349_STATUS_INTR_2: u8 = 0x11;

// ========================================
// Command registers
// ========================================

/// Command register A - Volatile write access, OTG and charge enable
pub const SMB349_CMD_A: u8 = 0x30;

/// Command register B
pub const SMB349_CMD_B: u8 = 0x31;

/// Command register C
pub const SMB349_CMD_C: u8 = 0x33;

// ========================================
// Interrupt status registers (read to clear)
// ========================================

pub const SMB349_INTR_STS_A: u8 = 0x35;
pub const SMB349_INTR_STS_B: u8 = 0x36;
pub const SMB349_INTR_STS_C: u8 = 0x37;
pub const SMB349_INTR_STS_D: u8 = 0x38;
pub const SMB349_INTR_STS_E: u8 = 0x39;
pub const SMB349_INTR_STS_F: u8 = 0x3A;

/// Number of latched interrupt status registers starting at `SMB349_INTR_STS_A`
pub const SMB349_INTR_STS_LEN: usize = 6;

// ========================================
// Status registers
// ========================================

pub const SMB349_STS_A: u8 = 0x3B;
pub const SMB349_STS_B: u8 = 0x3C;
pub const SMB349_STS_C: u8 = 0x3D;
/// Status register D - Detected input source type
pub const SMB349_STS_D: u8 = 0x3E;
pub const SMB349_STS_E: u8 = 0x3F;

bitflags! {
    /// Bits of `SMB349_CMD_A`
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CommandA: u8 {
        /// Allow writes to the configuration registers
        const VOLATILE_WRITES = 0x80;
        /// OTG (boost) output enable
        const OTG_ENABLE = 0x10;
        /// Charging enable
        const CHARGE_ENABLE = 0x02;
    }
}

bitflags! {
    /// Bits of `SMB349_THERM_CTRL`
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ThermControl: u8 {
        const THERM_MONITOR = 0x10;
    }
}

bitflags! {
    /// Bits of `SMB349_STS_D`
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusD: u8 {
        /// Dedicated charging port (AC adapter)
        const DEDICATED_CHARGER = 0x04;
        /// Charging downstream port (USB host)
        const DOWNSTREAM_PORT = 0x08;

        const _ = !0;
    }
}

bitflags! {
    /// Bits of `SMB349_INTR_STS_B`
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InterruptStatusB: u8 {
        const BATTERY_MISSING = 0x10;

        const _ = !0;
    }
}

/// Value ORed into `SMB349_FAULT_INTR` and `SMB349_STATUS_INTR` to arm every source
pub const SMB349_INTR_ALL: u8 = 0xFF;
