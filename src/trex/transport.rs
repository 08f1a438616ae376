// Bus transport for the T'Rex controller
//
// The board speaks SMBus block transfers: a command byte followed by the
// payload for writes, a command byte answered by N bytes for reads.

use tracing::debug;

/// Error types for bus communication
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("I2C bus error: {0}")]
    Bus(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Command 0x{command:02X} returned {actual} bytes, expected {expected}")]
    ByteCount {
        command: u8,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// Block-oriented bus access.
///
/// Implementations serialize their own physical transactions, so a write and
/// a read issued from different threads never interleave on the wire.
pub trait BusTransport: Send + Sync {
    /// Write `bytes` starting at `command`
    fn write_block(&self, command: u8, bytes: &[u8]) -> Result<()>;

    /// Read `count` bytes starting at `command`
    fn read_block(&self, command: u8, count: usize) -> Result<Vec<u8>>;
}

#[cfg(target_os = "linux")]
pub use linux::I2cTransport;

#[cfg(target_os = "linux")]
mod linux {
    use std::path::Path;
    use std::sync::{Mutex, PoisonError};

    use i2cdev::core::I2CDevice;
    use i2cdev::linux::{LinuxI2CDevice, LinuxI2CError};
    use tracing::{debug, info};

    use super::{BusTransport, Result, TransportError};

    impl From<LinuxI2CError> for TransportError {
        fn from(e: LinuxI2CError) -> Self {
            TransportError::Bus(Box::new(e))
        }
    }

    /// Linux i2c-dev transport (`/dev/i2c-N`)
    pub struct I2cTransport {
        device: Mutex<LinuxI2CDevice>,
    }

    impl I2cTransport {
        /// Open the bus and bind it to the slave address
        pub fn open(path: impl AsRef<Path>, address: u8) -> Result<Self> {
            info!(
                "Opening I2C bus {} at address 0x{:02X}",
                path.as_ref().display(),
                address
            );
            let device = LinuxI2CDevice::new(path, address as u16)?;
            Ok(Self {
                device: Mutex::new(device),
            })
        }
    }

    impl BusTransport for I2cTransport {
        fn write_block(&self, command: u8, bytes: &[u8]) -> Result<()> {
            let mut device = self.device.lock().unwrap_or_else(PoisonError::into_inner);
            debug!("I2C write cmd={} len={}", command, bytes.len());
            device.smbus_write_i2c_block_data(command, bytes)?;
            Ok(())
        }

        fn read_block(&self, command: u8, count: usize) -> Result<Vec<u8>> {
            let mut device = self.device.lock().unwrap_or_else(PoisonError::into_inner);
            debug!("I2C read cmd={} len={}", command, count);
            Ok(device.smbus_read_i2c_block_data(command, count as u8)?)
        }
    }
}

/// Check a read returned exactly what was asked for
pub fn expect_len(command: u8, expected: usize, data: &[u8]) -> Result<()> {
    if data.len() != expected {
        debug!(
            "Short read on cmd {}: expected {}, got {}",
            command,
            expected,
            data.len()
        );
        return Err(TransportError::ByteCount {
            command,
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}
