// Driver for the DAGU T'Rex motor/servo controller
//
// Provides:
// - Register block model and big-endian byte packing
// - Status block decoding into telemetry
// - Bus transport abstraction with a Linux i2c-dev implementation
// - Thread-safe high-level driver API

mod driver;
pub mod registers;
pub mod status;
pub mod transport;

pub use driver::{DriverError, TrexDriver};
pub use registers::{RegisterBlock, combine_high_low, split_high_low};
pub use status::Telemetry;
#[cfg(target_os = "linux")]
pub use transport::I2cTransport;
pub use transport::{BusTransport, TransportError};
