// High-level driver for the T'Rex controller
//
// Holds the register image and pushes the full block on every change, so the
// board always receives a self-consistent packet.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use tracing::{debug, info};

use super::registers::{REGISTER_COUNT, RegisterBlock, SERVO_COUNT};
use super::status::{STATUS_COUNT, Telemetry};
use super::transport::{BusTransport, TransportError, expect_len};
use crate::config::{Calibration, REGISTER_COMMAND, STATUS_COMMAND};

/// Error types for driver operations
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Servo {servo} out of range (1-{max})", max = SERVO_COUNT)]
    ServoOutOfRange { servo: u8 },
}

pub type Result<T> = std::result::Result<T, DriverError>;

struct Registers {
    block: RegisterBlock,
    motor_last_change: Option<SystemTime>,
}

/// Driver for one T'Rex board on a bus transport.
///
/// Every method takes `&self`; share the driver across threads with `Arc`.
pub struct TrexDriver<T: BusTransport> {
    bus: T,
    registers: Mutex<Registers>,
    voltage_offset: AtomicI32,
    command_echo: bool,
}

impl<T: BusTransport> TrexDriver<T> {
    /// Create a driver with default calibration
    pub fn new(bus: T) -> Self {
        Self::with_calibration(bus, Calibration::default())
    }

    /// Create a driver for a board with the given calibration
    pub fn with_calibration(bus: T, calibration: Calibration) -> Self {
        debug!("T'Rex driver ready ({:?})", calibration);
        Self {
            bus,
            registers: Mutex::new(Registers {
                block: RegisterBlock::new(calibration.battery_reference),
                motor_last_change: None,
            }),
            voltage_offset: AtomicI32::new(calibration.voltage_offset),
            command_echo: calibration.command_echo,
        }
    }

    /// Restore all registers to their defaults and push them to the board
    pub fn reset(&self) -> Result<()> {
        info!("Resetting T'Rex registers");
        self.update(|regs| regs.block.reset())
    }

    /// Set motor speeds (-255 to 255, negative = astern, 0 = coast)
    pub fn set_motor(&self, left: i16, right: i16) -> Result<()> {
        debug!("Setting motor speeds: left={}, right={}", left, right);
        self.update(|regs| {
            regs.block.set_motor_speeds(left, right);
            regs.motor_last_change = Some(SystemTime::now());
        })
    }

    /// Stop both motors
    pub fn stop(&self) -> Result<()> {
        info!("Stopping motors");
        self.set_motor(0, 0)
    }

    /// Set raw brake values for both motors
    pub fn set_brake(&self, left: u8, right: u8) -> Result<()> {
        debug!("Setting brakes: left={}, right={}", left, right);
        self.update(|regs| regs.block.set_brakes(left, right))
    }

    /// Set a servo position (servo 1 to 6, position typically 1000 to 2000)
    pub fn set_servo(&self, servo: u8, position: u16) -> Result<()> {
        debug!("Setting servo {} to {}", servo, position);
        self.try_update(|regs| {
            if regs.block.set_servo(servo, position) {
                Ok(())
            } else {
                Err(DriverError::ServoOutOfRange { servo })
            }
        })
    }

    /// Set the de-vibration filter strength
    pub fn set_devibrate(&self, strength: u8) -> Result<()> {
        self.update(|regs| regs.block.set_devibrate(strength))
    }

    /// Set the impact sensor threshold
    pub fn set_impact_sensitivity(&self, threshold: u16) -> Result<()> {
        self.update(|regs| regs.block.set_impact_sensitivity(threshold))
    }

    /// Read and decode the status block
    pub fn read_status(&self) -> Result<Telemetry> {
        let data = self.bus.read_block(STATUS_COMMAND, STATUS_COUNT)?;
        expect_len(STATUS_COMMAND, STATUS_COUNT, &data)?;

        let mut block = [0u8; STATUS_COUNT];
        block.copy_from_slice(&data);
        Ok(Telemetry::decode(
            &block,
            self.voltage_offset(),
            self.command_echo,
        ))
    }

    /// Offset added to every following battery voltage reading
    pub fn set_voltage_offset(&self, offset: i32) {
        self.voltage_offset.store(offset, Ordering::Relaxed);
    }

    pub fn voltage_offset(&self) -> i32 {
        self.voltage_offset.load(Ordering::Relaxed)
    }

    /// Snapshot of the register image
    pub fn registers(&self) -> [u8; REGISTER_COUNT] {
        *self.lock().block.as_bytes()
    }

    /// Underlying bus transport
    pub fn transport(&self) -> &T {
        &self.bus
    }

    /// When the motor speeds were last changed
    pub fn last_motor_change(&self) -> Option<SystemTime> {
        self.lock().motor_last_change
    }

    /// Apply a change to the image and transmit the whole block.
    ///
    /// The lock is held until the write returns. If the write fails the image
    /// keeps the change.
    fn update(&self, change: impl FnOnce(&mut Registers)) -> Result<()> {
        self.try_update(|regs| {
            change(regs);
            Ok(())
        })
    }

    /// Like `update`, but a rejected change is reported without transmitting
    fn try_update(&self, change: impl FnOnce(&mut Registers) -> Result<()>) -> Result<()> {
        let mut regs = self.lock();
        change(&mut regs)?;
        self.bus
            .write_block(REGISTER_COMMAND, regs.block.as_bytes())?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Registers> {
        // Every byte pattern is a valid image, so a poisoned lock is still usable
        self.registers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
