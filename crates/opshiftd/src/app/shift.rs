use opshift_bindings::ShiftDescription;
use opshift_bit_mask::{Bitmask, Key};
use opshift_device::DeviceSet;

use super::input::read_digital;

/// Computes the set of shifts held down right now.
///
/// Shifts are level triggered: the result depends only on the current device
/// state, never on earlier cycles.
pub fn resolve_active_shifts<S: Key>(
    shifts: &[ShiftDescription<S>],
    devices: &DeviceSet,
) -> Bitmask<S> {
    let mut active = Bitmask::empty();
    for description in shifts {
        if read_digital(devices, description.device, &description.input) {
            active.insert(description.shift);
        }
    }
    active
}

#[cfg(test)]
mod tests {
    use super::*;
    use opshift_bit_derive::Key;
    use opshift_device::{DeviceRef, VirtualDevice, POV_CENTERED};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Key)]
    enum Shift {
        Alt,
        Debug,
    }

    fn shifts() -> Vec<ShiftDescription<Shift>> {
        vec![
            ShiftDescription::button(Shift::Alt, DeviceRef::CoDriver, 5),
            ShiftDescription::pov(Shift::Debug, DeviceRef::Driver, 180),
        ]
    }

    #[test]
    fn resolves_button_and_pov_shifts() {
        let driver = VirtualDevice::new();
        let co_driver = VirtualDevice::new();
        let devices = DeviceSet::new()
            .with(DeviceRef::Driver, driver.clone())
            .and_then(|d| d.with(DeviceRef::CoDriver, co_driver.clone()))
            .expect("devices");

        assert!(resolve_active_shifts(&shifts(), &devices).is_empty());

        co_driver.set_button(5, true);
        assert_eq!(
            resolve_active_shifts(&shifts(), &devices),
            Bitmask::new(&[Shift::Alt])
        );

        driver.set_pov(180);
        assert_eq!(
            resolve_active_shifts(&shifts(), &devices),
            Bitmask::new(&[Shift::Alt, Shift::Debug])
        );

        driver.set_pov(POV_CENTERED);
        co_driver.set_button(5, false);
        assert!(resolve_active_shifts(&shifts(), &devices).is_empty());
    }

    #[test]
    fn identical_input_gives_identical_shifts() {
        let co_driver = VirtualDevice::new();
        let devices = DeviceSet::new()
            .with(DeviceRef::CoDriver, co_driver.clone())
            .expect("devices");

        co_driver.set_button(5, true);
        let first = resolve_active_shifts(&shifts(), &devices);
        co_driver.set_button(5, false);
        let _ = resolve_active_shifts(&shifts(), &devices);
        co_driver.set_button(5, true);
        assert_eq!(resolve_active_shifts(&shifts(), &devices), first);
    }
}
