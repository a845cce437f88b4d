mod device_set;
mod types;
mod virtual_device;

use thiserror::Error;

pub use crate::device_set::DeviceSet;
pub use crate::types::{DeviceFrame, DeviceRef, InputDevice, AXIS_COUNT, BUTTON_COUNT, POV_CENTERED};
pub use crate::virtual_device::VirtualDevice;

/// Error type for device wiring.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A binding refers to a device that was not supplied.
    #[error("device not connected: {0}")]
    Missing(DeviceRef),
    /// The reference can never be read from.
    #[error("no device can be bound to {0}")]
    Unbindable(DeviceRef),
}

/// Convenient result alias for device operations.
pub type Result<T> = std::result::Result<T, Error>;
