//! Serialized access to one charger from several contexts
//!
//! The interrupt thread, the OTG role notifier and the attach path all run
//! read-modify-write sequences against the same registers. These wrappers
//! hold one lock for the whole of each sequence, so the individual bus
//! transfers of two sequences never interleave.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::{raw::RawMutex, Mutex};
use embedded_hal::i2c::I2c;

use crate::{driver::Smb349, error::Error, types::*};

/// Blocking driver behind an `embassy-sync` mutex
///
/// The registered callback runs with the lock held and must not call back
/// into the same `SharedSmb349`.
///
/// # Example
/// ```no_run
/// # use embedded_hal::i2c::I2c;
/// use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
/// use smb349::{OtgState, SharedSmb349, Smb349};
///
/// # fn example<I: I2c>(i2c: I) -> Result<(), smb349::Error<I::Error>> {
/// let charger: SharedSmb349<CriticalSectionRawMutex, _> = SharedSmb349::new(Smb349::new(i2c));
/// charger.attach()?;
///
/// // IRQ thread
/// charger.handle_interrupt()?;
///
/// // OTG notifier
/// charger.otg_state_changed(OtgState::Suspend)?;
/// # Ok(())
/// # }
/// ```
pub struct SharedSmb349<'a, M: RawMutex, I> {
    inner: Mutex<M, RefCell<Smb349<'a, I>>>,
}

impl<'a, M, I> SharedSmb349<'a, M, I>
where
    M: RawMutex,
    I: I2c,
{
    pub const fn new(charger: Smb349<'a, I>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(charger)),
        }
    }

    /// Run `f` with exclusive access to the driver
    pub fn lock<R>(&self, f: impl FnOnce(&mut Smb349<'a, I>) -> R) -> R {
        self.inner.lock(|charger| f(&mut charger.borrow_mut()))
    }

    pub fn attach(&self) -> Result<(), Error<I::Error>> {
        self.lock(|charger| charger.attach())
    }

    pub fn detach(&self) {
        self.lock(|charger| charger.detach())
    }

    pub fn handle_interrupt(&self) -> Result<ChargerEvent, Error<I::Error>> {
        self.lock(|charger| charger.handle_interrupt())
    }

    pub fn otg_state_changed(&self, otg: OtgState) -> Result<(), Error<I::Error>> {
        self.lock(|charger| charger.otg_state_changed(otg))
    }

    pub fn register_callback(&self, notify: &'a (dyn ChargerNotify + Sync)) -> Result<(), Error<I::Error>> {
        self.lock(|charger| charger.register_callback(notify))
    }

    pub fn into_inner(self) -> Smb349<'a, I> {
        self.inner.into_inner().into_inner()
    }
}

#[cfg(feature = "async")]
pub use self::asynch::SharedAsyncSmb349;

#[cfg(feature = "async")]
mod asynch {
    use embassy_sync::{blocking_mutex::raw::RawMutex, mutex::Mutex};
    use embedded_hal_async::i2c::I2c;

    use crate::{driver_async::AsyncSmb349, error::Error, types::*};

    /// Async driver behind an `embassy-sync` async mutex
    pub struct SharedAsyncSmb349<'a, M: RawMutex, I> {
        inner: Mutex<M, AsyncSmb349<'a, I>>,
    }

    impl<'a, M, I> SharedAsyncSmb349<'a, M, I>
    where
        M: RawMutex,
        I: I2c,
    {
        pub const fn new(charger: AsyncSmb349<'a, I>) -> Self {
            Self {
                inner: Mutex::new(charger),
            }
        }

        /// Exclusive access to the driver until the guard is dropped
        pub async fn lock(&self) -> embassy_sync::mutex::MutexGuard<'_, M, AsyncSmb349<'a, I>> {
            self.inner.lock().await
        }

        pub async fn attach(&self) -> Result<(), Error<I::Error>> {
            self.inner.lock().await.attach().await
        }

        pub async fn detach(&self) {
            self.inner.lock().await.detach()
        }

        pub async fn handle_interrupt(&self) -> Result<ChargerEvent, Error<I::Error>> {
            self.inner.lock().await.handle_interrupt().await
        }

        pub async fn otg_state_changed(&self, otg: OtgState) -> Result<(), Error<I::Error>> {
            self.inner.lock().await.otg_state_changed(otg).await
        }

        pub async fn register_callback(
            &self,
            notify: &'a (dyn ChargerNotify + Sync),
        ) -> Result<(), Error<I::Error>> {
            self.inner.lock().await.register_callback(notify)
        }
    }
}
