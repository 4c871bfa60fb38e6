//! Synchronous SMB349 charger driver implementation

use crate::{error::Error, registers::*, types::*};
use embedded_hal::i2c::{Error as _, I2c};

/// SMB349 charger driver
///
/// Owns the bus handle and, once attached, the software view of the charger
/// (`ChargeState`, `ChargerType` and the optional consumer callback).
pub struct Smb349<'a, I> {
    i2c: I,
    addr: u8,
    session: Option<Session<'a>>,
    /// Host role requested by the OTG controller
    boosting: bool,
}

impl<'a, I> Smb349<'a, I>
where
    I: I2c,
{
    /// Create a new SMB349 driver instance
    ///
    /// The driver starts detached; call [`Smb349::attach`] before handling
    /// interrupts.
    ///
    /// # Example
    /// ```no_run
    /// # use smb349::Smb349;
    /// # use embedded_hal::i2c::I2c;
    /// # fn example<I: I2c>(i2c: I) {
    /// let charger = Smb349::new(i2c);
    /// # }
    /// ```
    pub fn new(i2c: I) -> Self {
        Self::with_address(i2c, SMB349_DEFAULT_ADDRESS)
    }

    /// Create a new SMB349 driver instance with custom I2C address
    pub fn with_address(i2c: I, addr: u8) -> Self {
        Self {
            i2c,
            addr,
            session: None,
            boosting: false,
        }
    }

    /// Destroy the driver and return the bus
    pub fn release(self) -> I {
        self.i2c
    }

    // ========================================
    // Low-level I2C operations
    // ========================================

    /// Read a single register
    pub fn read_register(&mut self, reg: u8) -> Result<u8, Error<I::Error>> {
        let mut buf = [0u8];
        self.read_registers(reg, &mut buf)?;
        Ok(buf[0])
    }

    /// Write a single register
    pub fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Error<I::Error>> {
        self.i2c.write(self.addr, &[reg, value]).map_err(|e| {
            error!("write of register {:#x} failed: {:?}", reg, e.kind());
            Error::bus(reg, e)
        })
    }

    /// Read consecutive registers starting at `reg`
    pub fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Error<I::Error>> {
        self.i2c.write_read(self.addr, &[reg], buf).map_err(|e| {
            error!("read of register {:#x} failed: {:?}", reg, e.kind());
            Error::bus(reg, e)
        })
    }

    /// OR `bits` into a register
    pub fn update_register(&mut self, reg: u8, bits: u8) -> Result<(), Error<I::Error>> {
        let val = self.read_register(reg)?;
        self.write_register(reg, val | bits)
    }

    /// Clear `bits` in a register
    pub fn clear_register_bits(&mut self, reg: u8, bits: u8) -> Result<(), Error<I::Error>> {
        let val = self.read_register(reg)?;
        self.write_register(reg, val & !bits)
    }

    // ========================================
    // Volatile write access
    // ========================================

    /// Unlock the configuration registers
    ///
    /// Prefer [`Smb349::with_volatile_writes`], which always locks them again.
    pub fn enable_volatile_writes(&mut self) -> Result<(), Error<I::Error>> {
        self.update_register(SMB349_CMD_A, CommandA::VOLATILE_WRITES.bits())
    }

    /// Lock the configuration registers
    pub fn disable_volatile_writes(&mut self) -> Result<(), Error<I::Error>> {
        self.clear_register_bits(SMB349_CMD_A, CommandA::VOLATILE_WRITES.bits())
    }

    /// Run `f` with the configuration registers unlocked
    ///
    /// `f` is skipped if unlocking fails. Locking is attempted on every path,
    /// and the first error is returned.
    pub fn with_volatile_writes<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<R, Error<I::Error>>,
    ) -> Result<R, Error<I::Error>> {
        let result = self.enable_volatile_writes().and_then(|()| f(self));
        let locked = self.disable_volatile_writes();
        let value = result?;
        locked?;
        Ok(value)
    }

    // ========================================
    // Charger and OTG control
    // ========================================

    /// Enable or disable charging
    ///
    /// Enabling also turns on thermal monitoring; disabling leaves it alone.
    pub fn set_charging(&mut self, enable: bool) -> Result<(), Error<I::Error>> {
        debug!("set charging: {}", enable);
        let result = self.with_volatile_writes(|dev| {
            if enable {
                dev.update_register(SMB349_CMD_A, CommandA::CHARGE_ENABLE.bits())?;
                dev.update_register(SMB349_THERM_CTRL, ThermControl::THERM_MONITOR.bits())
            } else {
                dev.clear_register_bits(SMB349_CMD_A, CommandA::CHARGE_ENABLE.bits())
            }
        });
        if result.is_err() {
            error!("error configuring charger");
        }
        result
    }

    /// Enable or disable OTG boost mode
    ///
    /// Charging must already be disabled; [`Smb349::otg_state_changed`] takes
    /// care of the ordering.
    pub fn set_otg(&mut self, enable: bool) -> Result<(), Error<I::Error>> {
        debug!("set otg: {}", enable);
        let result = self.with_volatile_writes(|dev| {
            if enable {
                dev.update_register(SMB349_CMD_A, CommandA::OTG_ENABLE.bits())
            } else {
                dev.clear_register_bits(SMB349_CMD_A, CommandA::OTG_ENABLE.bits())
            }
        });
        if result.is_err() {
            error!("error configuring otg");
        }
        result
    }

    // ========================================
    // Interrupt configuration
    // ========================================

    /// Arm every fault and status interrupt source
    ///
    /// Some status sources disarm themselves once they fire, so this is
    /// repeated whenever the charger goes idle.
    pub fn configure_interrupts(&mut self) -> Result<(), Error<I::Error>> {
        let result = self.with_volatile_writes(|dev| {
            dev.update_register(SMB349_FAULT_INTR, SMB349_INTR_ALL)?;
            dev.update_register(SMB349_STATUS_INTR, SMB349_INTR_ALL)
        });
        if result.is_err() {
            error!("error configuring interrupts");
        }
        result
    }

    /// Read, and thereby clear, the latched interrupt status block
    pub fn clear_interrupts(&mut self) -> Result<InterruptStatus, Error<I::Error>> {
        let mut raw = [0u8; SMB349_INTR_STS_LEN];
        self.read_registers(SMB349_INTR_STS_A, &mut raw)?;
        trace!("interrupt latches: {:?}", raw);
        Ok(InterruptStatus::new(raw))
    }

    // ========================================
    // Attach / detach
    // ========================================

    /// Check if a battery is connected
    pub fn is_battery_present(&mut self) -> Result<bool, Error<I::Error>> {
        let val = self.read_register(SMB349_INTR_STS_B)?;
        Ok(!InterruptStatusB::from_bits_retain(val).contains(InterruptStatusB::BATTERY_MISSING))
    }

    /// Bring up the charger
    ///
    /// Verifies a battery is present, enables charging and arms the
    /// interrupt sources. Charging is left off while the chip is in the OTG
    /// host role. On any failure the driver stays detached.
    pub fn attach(&mut self) -> Result<(), Error<I::Error>> {
        self.session = None;

        if !self.is_battery_present()? {
            error!("no battery present");
            return Err(Error::BatteryMissing);
        }
        if self.boosting {
            debug!("otg boost active, leaving charging disabled");
        } else {
            self.set_charging(true)?;
        }
        self.configure_interrupts()?;

        self.session = Some(Session::new());
        debug!("smb349 at {:#x} attached", self.addr);
        Ok(())
    }

    /// Forget the charger state and any registered callback
    pub fn detach(&mut self) {
        self.session = None;
    }

    /// Whether [`Smb349::attach`] has succeeded since the last detach
    pub fn is_attached(&self) -> bool {
        self.session.is_some()
    }

    /// Current charging state, `Stopped` while detached
    pub fn state(&self) -> ChargeState {
        self.session
            .as_ref()
            .map_or(ChargeState::Stopped, |s| s.state)
    }

    /// Current charger type, `None` while detached or stopped
    pub fn charger_type(&self) -> ChargerType {
        self.session
            .as_ref()
            .map_or(ChargerType::None, |s| s.charger_type)
    }

    // ========================================
    // Notification
    // ========================================

    /// Install the consumer callback, replacing any previous one
    pub fn register_callback(
        &mut self,
        notify: &'a (dyn ChargerNotify + Sync),
    ) -> Result<(), Error<I::Error>> {
        let session = self.session.as_mut().ok_or(Error::NotAttached)?;
        session.notify = Some(notify);
        Ok(())
    }

    /// Remove the consumer callback, if any
    pub fn unregister_callback(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.notify = None;
        }
    }

    // ========================================
    // Event handling
    // ========================================

    /// Service the charger interrupt line
    ///
    /// Call from a context that may block on the bus. Reclassifies the input
    /// source, enables or disables charging accordingly, clears the
    /// interrupt latches and then notifies the registered callback. The
    /// callback is invoked even if a register access failed; the first such
    /// failure is returned.
    ///
    /// In the OTG host role the status registers are not consulted: the
    /// charger is reported `Stopped` and only the interrupts are re-armed.
    pub fn handle_interrupt(&mut self) -> Result<ChargerEvent, Error<I::Error>> {
        if self.session.is_none() {
            warn!("interrupt while detached");
            return Err(Error::NotAttached);
        }

        let result = self.update_charge_state();
        // Runs even on failure, stale latches would mask the next edge.
        let cleared = self.clear_interrupts().map(|_| ());
        if cleared.is_err() {
            error!("failed clearing interrupts");
        }

        let session = self.session.as_ref().ok_or(Error::NotAttached)?;
        session.notify();
        let event = session.event();

        result.and(cleared).map(|()| event)
    }

    fn update_charge_state(&mut self) -> Result<(), Error<I::Error>> {
        if self.boosting {
            // VBUS is our own boost output, not a charger
            debug!("interrupt during otg boost, charging stays off");
            if let Some(session) = self.session.as_mut() {
                session.stop();
            }
            return self.configure_interrupts();
        }

        let status = StatusD::from_bits_retain(self.read_register(SMB349_STS_D)?);

        if !status.is_empty() {
            let charger_type = ChargerType::from_status(status);
            debug!("input source detected: {:?}", charger_type);
            if let Some(session) = self.session.as_mut() {
                session.start(charger_type);
            }
            self.set_charging(true)
        } else {
            debug!("input source removed");
            if let Some(session) = self.session.as_mut() {
                session.stop();
            }
            let disabled = self.set_charging(false);
            let armed = self.configure_interrupts();
            disabled.and(armed)
        }
    }

    /// React to a host-role change from the OTG controller
    ///
    /// Entering the host role stops an active charging session and notifies
    /// the registered callback once the boost is on. Every step is attempted
    /// even if an earlier one failed; the first error is returned.
    pub fn otg_state_changed(&mut self, otg: OtgState) -> Result<(), Error<I::Error>> {
        debug!("otg state changed: {:?}", otg);
        match otg {
            OtgState::Host => {
                self.boosting = true;
                let stopped = self.session.as_mut().is_some_and(|session| {
                    let before = session.event();
                    session.stop();
                    session.event() != before
                });
                let disabled = self.set_charging(false);
                let boosted = self.set_otg(true);
                if stopped {
                    if let Some(session) = self.session.as_ref() {
                        session.notify();
                    }
                }
                disabled.and(boosted)
            }
            OtgState::Suspend => {
                self.boosting = false;
                let unboosted = self.set_otg(false);
                let charging = self.set_charging(true);
                let armed = self.configure_interrupts();
                unboosted.and(charging).and(armed)
            }
        }
    }
}
