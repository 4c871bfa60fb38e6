//! Register-level SMB349 simulator
//!
//! Behaves like the chip as far as the driver can tell: configuration
//! registers ignore writes while the volatile write bit is clear, and a block
//! read of the interrupt status registers clears the latches. Every gate and
//! mode transition on `CMD_A` is recorded so tests can check ordering.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use smb349::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    GateOpened,
    GateClosed,
    ChargingOn,
    ChargingOff,
    OtgOn,
    OtgOff,
}

pub struct Chip {
    pub regs: [u8; 256],
    pub transitions: Vec<Transition>,
    /// Configuration writes dropped because the gate was closed
    pub rejected_writes: usize,
    /// Set if `CMD_A` ever had charging and OTG enabled together
    pub charge_and_otg_overlap: bool,
    pub latch_clears: usize,
    pub failing_reads: HashSet<u8>,
    pub failing_writes: HashSet<u8>,
}

impl Chip {
    fn new() -> Self {
        Self {
            regs: [0; 256],
            transitions: Vec::new(),
            rejected_writes: 0,
            charge_and_otg_overlap: false,
            latch_clears: 0,
            failing_reads: HashSet::new(),
            failing_writes: HashSet::new(),
        }
    }

    pub fn cmd(&self) -> CommandA {
        CommandA::from_bits_retain(self.regs[SMB349_CMD_A as usize])
    }

    pub fn gate_open(&self) -> bool {
        self.cmd().contains(CommandA::VOLATILE_WRITES)
    }

    pub fn charging(&self) -> bool {
        self.cmd().contains(CommandA::CHARGE_ENABLE)
    }

    pub fn otg(&self) -> bool {
        self.cmd().contains(CommandA::OTG_ENABLE)
    }

    pub fn count(&self, transition: Transition) -> usize {
        self.transitions.iter().filter(|t| **t == transition).count()
    }

    pub fn position(&self, transition: Transition) -> Option<usize> {
        self.transitions.iter().position(|t| *t == transition)
    }

    fn read(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), ErrorKind> {
        if self.failing_reads.contains(&reg) {
            return Err(ErrorKind::Other);
        }
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.regs[reg as usize + i];
        }
        if reg == SMB349_INTR_STS_A && buf.len() == SMB349_INTR_STS_LEN {
            for r in SMB349_INTR_STS_A..=SMB349_INTR_STS_F {
                // battery missing is a live status, not a latch
                let keep = if r == SMB349_INTR_STS_B {
                    InterruptStatusB::BATTERY_MISSING.bits()
                } else {
                    0
                };
                self.regs[r as usize] &= keep;
            }
            self.latch_clears += 1;
        }
        Ok(())
    }

    fn write(&mut self, reg: u8, value: u8) -> Result<(), ErrorKind> {
        if self.failing_writes.contains(&reg) {
            return Err(ErrorKind::Other);
        }
        if reg < SMB349_CMD_A && !self.gate_open() {
            self.rejected_writes += 1;
            return Ok(());
        }
        if reg == SMB349_CMD_A {
            let old = self.cmd();
            let new = CommandA::from_bits_retain(value);
            self.record(old, new, CommandA::VOLATILE_WRITES, Transition::GateOpened, Transition::GateClosed);
            self.record(old, new, CommandA::CHARGE_ENABLE, Transition::ChargingOn, Transition::ChargingOff);
            self.record(old, new, CommandA::OTG_ENABLE, Transition::OtgOn, Transition::OtgOff);
            if new.contains(CommandA::CHARGE_ENABLE | CommandA::OTG_ENABLE) {
                self.charge_and_otg_overlap = true;
            }
        }
        self.regs[reg as usize] = value;
        Ok(())
    }

    fn record(&mut self, old: CommandA, new: CommandA, bit: CommandA, on: Transition, off: Transition) {
        match (old.contains(bit), new.contains(bit)) {
            (false, true) => self.transitions.push(on),
            (true, false) => self.transitions.push(off),
            _ => {}
        }
    }
}

/// Bus handle onto a shared simulated chip
#[derive(Clone)]
pub struct SimBus {
    chip: Arc<Mutex<Chip>>,
}

impl SimBus {
    /// A chip with a battery connected and nothing plugged in
    pub fn new() -> Self {
        Self {
            chip: Arc::new(Mutex::new(Chip::new())),
        }
    }

    pub fn chip(&self) -> MutexGuard<'_, Chip> {
        self.chip.lock().unwrap()
    }

    pub fn set(&self, reg: u8, value: u8) {
        self.chip().regs[reg as usize] = value;
    }

    pub fn get(&self, reg: u8) -> u8 {
        self.chip().regs[reg as usize]
    }

    pub fn remove_battery(&self) {
        self.set(SMB349_INTR_STS_B, InterruptStatusB::BATTERY_MISSING.bits());
    }

    /// Present an input source and latch an interrupt
    pub fn plug(&self, status: StatusD) {
        let mut chip = self.chip();
        chip.regs[SMB349_STS_D as usize] = status.bits();
        chip.regs[SMB349_INTR_STS_C as usize] |= 0x01;
    }

    pub fn unplug(&self) {
        self.plug(StatusD::empty());
    }

    pub fn fail_reads_of(&self, reg: u8) {
        self.chip().failing_reads.insert(reg);
    }

    pub fn fail_writes_of(&self, reg: u8) {
        self.chip().failing_writes.insert(reg);
    }

    pub fn heal(&self) {
        let mut chip = self.chip();
        chip.failing_reads.clear();
        chip.failing_writes.clear();
    }

    pub fn reset_transitions(&self) {
        self.chip().transitions.clear();
    }
}

impl ErrorType for SimBus {
    type Error = ErrorKind;
}

impl I2c for SimBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != SMB349_DEFAULT_ADDRESS {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        let mut chip = self.chip();
        let mut pointer = None;
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    let (&reg, data) = bytes.split_first().ok_or(ErrorKind::Other)?;
                    pointer = Some(reg);
                    for (i, &value) in data.iter().enumerate() {
                        chip.write(reg + i as u8, value)?;
                    }
                }
                Operation::Read(buf) => {
                    let reg = pointer.ok_or(ErrorKind::Other)?;
                    chip.read(reg, buf)?;
                }
            }
        }
        Ok(())
    }
}
