//! Async SMB349 charger driver implementation

use crate::{error::Error, registers::*, types::*};

#[cfg(feature = "async")]
use embedded_hal_async::i2c::{Error as _, I2c as AsyncI2c};

/// Async SMB349 charger driver
///
/// Mirrors [`Smb349`](crate::Smb349) method for method, with every bus
/// access awaited.
///
/// # Example
/// ```no_run
/// # #[cfg(feature = "async")]
/// # async fn example<I: embedded_hal_async::i2c::I2c>(i2c: I) -> Result<(), smb349::Error<I::Error>> {
/// use smb349::{AsyncSmb349, OtgState};
///
/// let mut charger = AsyncSmb349::new(i2c);
/// charger.attach().await?;
///
/// // From the task waiting on the IRQ pin
/// let event = charger.handle_interrupt().await?;
///
/// // From the USB OTG role notifier
/// charger.otg_state_changed(OtgState::Host).await?;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "async")]
pub struct AsyncSmb349<'a, I> {
    i2c: I,
    addr: u8,
    session: Option<Session<'a>>,
    /// Host role requested by the OTG controller
    boosting: bool,
}

#[cfg(feature = "async")]
impl<'a, I> AsyncSmb349<'a, I>
where
    I: AsyncI2c,
{
    /// Create a new async SMB349 driver instance
    pub fn new(i2c: I) -> Self {
        Self::with_address(i2c, SMB349_DEFAULT_ADDRESS)
    }

    /// Create a new async SMB349 driver instance with custom I2C address
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
    pub async fn read_register(&mut self, reg: u8) -> Result<u8, Error<I::Error>> {
        let mut buf = [0u8];
        self.read_registers(reg, &mut buf).await?;
        Ok(buf[0])
    }

    /// Write a single register
    pub async fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Error<I::Error>> {
        self.i2c
            .write(self.addr, &[reg, value])
            .await
            .map_err(|e| {
                error!("write of register {:#x} failed: {:?}", reg, e.kind());
                Error::bus(reg, e)
            })
    }

    /// Read consecutive registers starting at `reg`
    pub async fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Error<I::Error>> {
        self.i2c
            .write_read(self.addr, &[reg], buf)
            .await
            .map_err(|e| {
                error!("read of register {:#x} failed: {:?}", reg, e.kind());
                Error::bus(reg, e)
            })
    }

    /// OR `bits` into a register
    pub async fn update_register(&mut self, reg: u8, bits: u8) -> Result<(), Error<I::Error>> {
        let val = self.read_register(reg).await?;
        self.write_register(reg, val | bits).await
    }

    /// Clear `bits` in a register
    pub async fn clear_register_bits(&mut self, reg: u8, bits: u8) -> Result<(), Error<I::Error>> {
        let val = self.read_register(reg).await?;
        self.write_register(reg, val & !bits).await
    }

    // ========================================
    // Volatile write access
    // ========================================

    /// Unlock the configuration registers
    pub async fn enable_volatile_writes(&mut self) -> Result<(), Error<I::Error>> {
        self.update_register(SMB349_CMD_A, CommandA::VOLATILE_WRITES.bits())
            .await
    }

    /// Lock the configuration registers
    pub async fn disable_volatile_writes(&mut self) -> Result<(), Error<I::Error>> {
        self.clear_register_bits(SMB349_CMD_A, CommandA::VOLATILE_WRITES.bits())
            .await
    }

    /// Lock the configuration registers at the end of a gated sequence,
    /// keeping the sequence's error if it had one
    async fn relock<R>(
        &mut self,
        result: Result<R, Error<I::Error>>,
    ) -> Result<R, Error<I::Error>> {
        let locked = self.disable_volatile_writes().await;
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
    pub async fn set_charging(&mut self, enable: bool) -> Result<(), Error<I::Error>> {
        debug!("set charging: {}", enable);
        let result = self.charging_sequence(enable).await;
        let result = self.relock(result).await;
        if result.is_err() {
            error!("error configuring charger");
        }
        result
    }

    async fn charging_sequence(&mut self, enable: bool) -> Result<(), Error<I::Error>> {
        self.enable_volatile_writes().await?;
        if enable {
            self.update_register(SMB349_CMD_A, CommandA::CHARGE_ENABLE.bits())
                .await?;
            self.update_register(SMB349_THERM_CTRL, ThermControl::THERM_MONITOR.bits())
                .await
        } else {
            self.clear_register_bits(SMB349_CMD_A, CommandA::CHARGE_ENABLE.bits())
                .await
        }
    }

    /// Enable or disable OTG boost mode
    ///
    /// Charging must already be disabled; [`AsyncSmb349::otg_state_changed`]
    /// takes care of the ordering.
    pub async fn set_otg(&mut self, enable: bool) -> Result<(), Error<I::Error>> {
        debug!("set otg: {}", enable);
        let result = self.otg_sequence(enable).await;
        let result = self.relock(result).await;
        if result.is_err() {
            error!("error configuring otg");
        }
        result
    }

    async fn otg_sequence(&mut self, enable: bool) -> Result<(), Error<I::Error>> {
        self.enable_volatile_writes().await?;
        if enable {
            self.update_register(SMB349_CMD_A, CommandA::OTG_ENABLE.bits())
                .await
        } else {
            self.clear_register_bits(SMB349_CMD_A, CommandA::OTG_ENABLE.bits())
                .await
        }
    }

    // ========================================
    // Interrupt configuration
    // ========================================

    /// Arm every fault and status interrupt source
    pub async fn configure_interrupts(&mut self) -> Result<(), Error<I::Error>> {
        let result = self.interrupt_sequence().await;
        let result = self.relock(result).await;
        if result.is_err() {
            error!("error configuring interrupts");
        }
        result
    }

    async fn interrupt_sequence(&mut self) -> Result<(), Error<I::Error>> {
        self.enable_volatile_writes().await?;
        self.update_register(SMB349_FAULT_INTR, SMB349_INTR_ALL).await?;
        self.update_register(SMB349_STATUS_INTR, SMB349_INTR_ALL).await
    }

    /// Read, and thereby clear, the latched interrupt status block
    pub async fn clear_interrupts(&mut self) -> Result<InterruptStatus, Error<I::Error>> {
        let mut raw = [0u8; SMB349_INTR_STS_LEN];
        self.read_registers(SMB349_INTR_STS_A, &mut raw).await?;
        trace!("interrupt latches: {:?}", raw);
        Ok(InterruptStatus::new(raw))
    }

    // ========================================
    // Attach / detach
    // ========================================

    /// Check if a battery is connected
    pub async fn is_battery_present(&mut self) -> Result<bool, Error<I::Error>> {
        let val = self.read_register(SMB349_INTR_STS_B).await?;
        Ok(!InterruptStatusB::from_bits_retain(val).contains(InterruptStatusB::BATTERY_MISSING))
    }

    /// Bring up the charger, see [`Smb349::attach`](crate::Smb349::attach)
    pub async fn attach(&mut self) -> Result<(), Error<I::Error>> {
        self.session = None;

        if !self.is_battery_present().await? {
            error!("no battery present");
            return Err(Error::BatteryMissing);
        }
        if self.boosting {
            debug!("otg boost active, leaving charging disabled");
        } else {
            self.set_charging(true).await?;
        }
        self.configure_interrupts().await?;

        self.session = Some(Session::new());
        debug!("smb349 at {:#x} attached", self.addr);
        Ok(())
    }

    /// Forget the charger state and any registered callback
    pub fn detach(&mut self) {
        self.session = None;
    }

    /// Whether [`AsyncSmb349::attach`] has succeeded since the last detach
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

    /// Service the charger interrupt line, see
    /// [`Smb349::handle_interrupt`](crate::Smb349::handle_interrupt)
    pub async fn handle_interrupt(&mut self) -> Result<ChargerEvent, Error<I::Error>> {
        if self.session.is_none() {
            warn!("interrupt while detached");
            return Err(Error::NotAttached);
        }

        let result = self.update_charge_state().await;
        let cleared = self.clear_interrupts().await.map(|_| ());
        if cleared.is_err() {
            error!("failed clearing interrupts");
        }

        let session = self.session.as_ref().ok_or(Error::NotAttached)?;
        session.notify();
        let event = session.event();

        result.and(cleared).map(|()| event)
    }

    async fn update_charge_state(&mut self) -> Result<(), Error<I::Error>> {
        if self.boosting {
            // VBUS is our own boost output, not a charger
            debug!("interrupt during otg boost, charging stays off");
            if let Some(session) = self.session.as_mut() {
                session.stop();
            }
            return self.configure_interrupts().await;
        }

        let status = StatusD::from_bits_retain(self.read_register(SMB349_STS_D).await?);

        if !status.is_empty() {
            let charger_type = ChargerType::from_status(status);
            debug!("input source detected: {:?}", charger_type);
            if let Some(session) = self.session.as_mut() {
                session.start(charger_type);
            }
            self.set_charging(true).await
        } else {
            debug!("input source removed");
            if let Some(session) = self.session.as_mut() {
                session.stop();
            }
            let disabled = self.set_charging(false).await;
            let armed = self.configure_interrupts().await;
            disabled.and(armed)
        }
    }

    /// React to a host-role change from the OTG controller, see
    /// [`Smb349::otg_state_changed`](crate::Smb349::otg_state_changed)
    pub async fn otg_state_changed(&mut self, otg: OtgState) -> Result<(), Error<I::Error>> {
        debug!("otg state changed: {:?}", otg);
        match otg {
            OtgState::Host => {
                self.boosting = true;
                let stopped = self.session.as_mut().is_some_and(|session| {
                    let before = session.event();
                    session.stop();
                    session.event() != before
                });
                let disabled = self.set_charging(false).await;
                let boosted = self.set_otg(true).await;
                if stopped {
                    if let Some(session) = self.session.as_ref() {
                        session.notify();
                    }
                }
                disabled.and(boosted)
            }
            OtgState::Suspend => {
                self.boosting = false;
                let unboosted = self.set_otg(false).await;
                let charging = self.set_charging(true).await;
                let armed = self.configure_interrupts().await;
                unboosted.and(charging).and(armed)
            }
        }
    }
}
