#![cfg_attr(not(test), no_std)]
//! # SMB349 Battery Charger Driver
//!
//! This crate provides an embedded driver for the Summit SMB349 switching
//! battery charger. It covers the control path of the chip:
//! - Volatile write access to the configuration registers, always relocked
//! - Charging enable/disable (with thermal monitoring)
//! - USB On-The-Go boost mode, kept mutually exclusive with charging
//! - Interrupt handling: input source detection (AC adapter vs USB port),
//!   interrupt re-arming and latch clearing
//! - A consumer callback notified on every interrupt
//! - Battery presence detection at attach time
//!
//! ## Example
//!
//! ```no_run
//! use smb349::{ChargeState, ChargerType, Error, OtgState, Smb349};
//! # use embedded_hal::i2c::I2c;
//! # fn example<I: I2c>(i2c: I) -> Result<(), Error<I::Error>> {
//! let notify = |state: ChargeState, charger_type: ChargerType| {
//!     // ... forward to the power supply class
//! };
//! let mut charger = Smb349::new(i2c);
//!
//! // Verify the battery, enable charging and arm interrupts
//! charger.attach()?;
//! charger.register_callback(&notify)?;
//!
//! // On every falling edge of the STAT/IRQ pin
//! let event = charger.handle_interrupt()?;
//!
//! // When the USB controller becomes A-host
//! charger.otg_state_changed(OtgState::Host)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Sharing
//!
//! Interrupts, OTG role changes and attach all touch the same registers.
//! [`SharedSmb349`] runs each of those sequences under one `embassy-sync`
//! mutex.
//!
//! ## Async Support
//!
//! When the `async` feature is enabled, the crate provides `AsyncSmb349`
//! with the same API but async/await support:
//!
//! ```no_run
//! # #[cfg(feature = "async")]
//! # async fn example<I: embedded_hal_async::i2c::I2c>(i2c: I) -> Result<(), smb349::Error<I::Error>> {
//! use smb349::AsyncSmb349;
//!
//! let mut charger = AsyncSmb349::new(i2c);
//! charger.attach().await?;
//! charger.handle_interrupt().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! Enable either the `defmt` or the `log` feature to get driver logs.

mod fmt;

mod driver;
#[cfg(feature = "async")]
mod driver_async;
mod error;
mod registers;
mod shared;
mod types;

// Re-export main types
pub use driver::Smb349;
#[cfg(feature = "async")]
pub use driver_async::AsyncSmb349;
pub use error::Error;
pub use registers::*;
#[cfg(feature = "async")]
pub use shared::SharedAsyncSmb349;
pub use shared::SharedSmb349;
pub use types::*;
