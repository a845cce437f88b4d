use std::fmt;

/// POV hat reading when no direction is held.
pub const POV_CENTERED: i32 = -1;

/// Buttons are numbered `1..=BUTTON_COUNT`.
pub const BUTTON_COUNT: u8 = 32;

/// Axes are numbered `0..AXIS_COUNT`.
pub const AXIS_COUNT: u8 = 8;

/// The input source a binding reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceRef {
    /// Not driven by any input, only by macros.
    #[default]
    None,
    Driver,
    CoDriver,
    /// Virtual device fed by on-board sensors.
    Sensor,
}

impl DeviceRef {
    pub const fn name(&self) -> &'static str {
        match self {
            DeviceRef::None => "none",
            DeviceRef::Driver => "driver",
            DeviceRef::CoDriver => "co_driver",
            DeviceRef::Sensor => "sensor",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "none" => DeviceRef::None,
            "driver" | "primary" => DeviceRef::Driver,
            "co_driver" | "codriver" | "secondary" => DeviceRef::CoDriver,
            "sensor" => DeviceRef::Sensor,
            _ => return None,
        })
    }
}

impl fmt::Display for DeviceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw reads from a physical or virtual input device.
///
/// Implementations must be cheap: every binding queries its device once per cycle.
pub trait InputDevice {
    /// Returns whether the 1-based button `index` is held.
    fn raw_button(&self, index: u8) -> bool;

    /// Returns the POV hat angle in degrees, or [`POV_CENTERED`].
    fn pov(&self) -> i32;

    /// Returns the axis value, normally in `[-1.0, 1.0]`.
    fn raw_axis(&self, index: u8) -> f64;
}

/// A complete snapshot of a device's raw state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceFrame {
    /// Bit `n - 1` is set while button `n` is held.
    pub buttons: u32,
    pub pov: i32,
    pub axes: [f64; AXIS_COUNT as usize],
}

impl Default for DeviceFrame {
    fn default() -> Self {
        Self {
            buttons: 0,
            pov: POV_CENTERED,
            axes: [0.0; AXIS_COUNT as usize],
        }
    }
}

impl DeviceFrame {
    #[inline]
    pub fn button(&self, index: u8) -> bool {
        match index {
            1..=BUTTON_COUNT => self.buttons & (1 << (index - 1)) != 0,
            _ => false,
        }
    }

    #[inline]
    pub fn set_button(&mut self, index: u8, pressed: bool) {
        if !(1..=BUTTON_COUNT).contains(&index) {
            return;
        }
        let bit = 1 << (index - 1);
        if pressed {
            self.buttons |= bit;
        } else {
            self.buttons &= !bit;
        }
    }

    #[inline]
    pub fn axis(&self, index: u8) -> f64 {
        self.axes.get(index as usize).copied().unwrap_or(0.0)
    }

    #[inline]
    pub fn set_axis(&mut self, index: u8, value: f64) {
        if let Some(axis) = self.axes.get_mut(index as usize) {
            *axis = value;
        }
    }
}

impl InputDevice for DeviceFrame {
    fn raw_button(&self, index: u8) -> bool {
        self.button(index)
    }

    fn pov(&self) -> i32 {
        self.pov
    }

    fn raw_axis(&self, index: u8) -> f64 {
        self.axis(index)
    }
}
