use opshift_bindings::DigitalInput;
use opshift_device::{DeviceRef, DeviceSet};

/// Reads a digital input from the bound device. Unwired bindings read released.
#[inline]
pub(crate) fn read_digital(devices: &DeviceSet, device: DeviceRef, input: &DigitalInput) -> bool {
    let Some(device) = devices.get(device) else {
        return false;
    };
    match *input {
        DigitalInput::Button(index) => device.raw_button(index),
        DigitalInput::Pov(angle) => device.pov() == angle,
        DigitalInput::AxisRange { axis, min, max } => {
            let value = device.raw_axis(axis);
            min <= value && value <= max
        }
    }
}

/// Reads a raw axis from the bound device. Unwired bindings read 0.0.
#[inline]
pub(crate) fn read_axis(devices: &DeviceSet, device: DeviceRef, axis: u8) -> f64 {
    devices.get(device).map_or(0.0, |device| device.raw_axis(axis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use opshift_device::VirtualDevice;

    #[test]
    fn reads_buttons_pov_and_axis_ranges() {
        let pad = VirtualDevice::new();
        let devices = DeviceSet::new()
            .with(DeviceRef::Driver, pad.clone())
            .expect("driver slot");

        pad.set_button(3, true);
        pad.set_pov(90);
        pad.set_axis(2, 0.7);

        assert!(read_digital(&devices, DeviceRef::Driver, &DigitalInput::Button(3)));
        assert!(!read_digital(&devices, DeviceRef::Driver, &DigitalInput::Button(4)));
        assert!(read_digital(&devices, DeviceRef::Driver, &DigitalInput::Pov(90)));
        assert!(!read_digital(&devices, DeviceRef::Driver, &DigitalInput::Pov(270)));

        let range = DigitalInput::AxisRange {
            axis: 2,
            min: 0.5,
            max: 1.0,
        };
        assert!(read_digital(&devices, DeviceRef::Driver, &range));
        pad.set_axis(2, 0.2);
        assert!(!read_digital(&devices, DeviceRef::Driver, &range));
    }

    #[test]
    fn missing_devices_read_neutral() {
        let devices = DeviceSet::new();
        assert!(!read_digital(&devices, DeviceRef::None, &DigitalInput::Button(1)));
        assert!(!read_digital(&devices, DeviceRef::Sensor, &DigitalInput::Button(1)));
        assert_eq!(read_axis(&devices, DeviceRef::CoDriver, 0), 0.0);
    }
}
