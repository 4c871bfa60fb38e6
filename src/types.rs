//! Type definitions for the SMB349 charger state machine
//!
//! This module provides the charging state, source classification and
//! notification types shared by the blocking and async drivers.

use crate::registers::{InterruptStatusB, StatusD, SMB349_INTR_STS_LEN};

/// Charging activity as last derived from the status registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChargeState {
    #[default]
    Stopped,
    InProgress,
}

/// Classification of the attached power source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChargerType {
    #[default]
    None,
    /// Dedicated charger (wall adapter)
    Ac,
    /// USB charging downstream port
    Usb,
}

impl ChargerType {
    /// Classify a non-zero `STS_D` value. A dedicated charger wins when both
    /// bits are set.
    pub fn from_status(status: StatusD) -> Self {
        if status.contains(StatusD::DEDICATED_CHARGER) {
            ChargerType::Ac
        } else if status.contains(StatusD::DOWNSTREAM_PORT) {
            ChargerType::Usb
        } else {
            ChargerType::None
        }
    }
}

/// Host-role transitions reported by the USB OTG controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OtgState {
    /// We became A-host and must source VBUS
    Host,
    /// A-host suspended; stop sourcing VBUS and go back to charging
    Suspend,
}

/// Snapshot handed to the notification callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChargerEvent {
    pub state: ChargeState,
    pub charger_type: ChargerType,
}

/// Receiver for charger state changes
///
/// Implemented for any `Fn(ChargeState, ChargerType)`, so the context a
/// consumer needs is simply captured by the closure.
pub trait ChargerNotify {
    fn charger_changed(&self, state: ChargeState, charger_type: ChargerType);
}

impl<F> ChargerNotify for F
where
    F: Fn(ChargeState, ChargerType),
{
    fn charger_changed(&self, state: ChargeState, charger_type: ChargerType) {
        self(state, charger_type)
    }
}

/// Latched interrupt status registers `INTR_STS_A..=INTR_STS_F`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptStatus {
    pub raw: [u8; SMB349_INTR_STS_LEN],
}

impl InterruptStatus {
    pub fn new(raw: [u8; SMB349_INTR_STS_LEN]) -> Self {
        Self { raw }
    }

    /// True if no interrupt condition was latched
    pub fn is_empty(&self) -> bool {
        self.raw.iter().all(|b| *b == 0)
    }

    pub fn status_b(&self) -> InterruptStatusB {
        InterruptStatusB::from_bits_retain(self.raw[1])
    }

    pub fn is_battery_missing(&self) -> bool {
        self.status_b().contains(InterruptStatusB::BATTERY_MISSING)
    }
}

/// Software model of an attached charger
pub(crate) struct Session<'a> {
    pub(crate) state: ChargeState,
    pub(crate) charger_type: ChargerType,
    pub(crate) notify: Option<&'a (dyn ChargerNotify + Sync)>,
}

impl<'a> Session<'a> {
    pub(crate) fn new() -> Self {
        Self {
            state: ChargeState::Stopped,
            charger_type: ChargerType::None,
            notify: None,
        }
    }

    pub(crate) fn start(&mut self, charger_type: ChargerType) {
        self.state = ChargeState::InProgress;
        self.charger_type = charger_type;
    }

    /// Leaving `InProgress` also forgets the source type
    pub(crate) fn stop(&mut self) {
        self.state = ChargeState::Stopped;
        self.charger_type = ChargerType::None;
    }

    pub(crate) fn event(&self) -> ChargerEvent {
        ChargerEvent {
            state: self.state,
            charger_type: self.charger_type,
        }
    }

    pub(crate) fn notify(&self) {
        if let Some(notify) = self.notify {
            trace!("notifying charger consumer");
            notify.charger_changed(self.state, self.charger_type);
        }
    }
}
