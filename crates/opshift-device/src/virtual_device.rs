use std::cell::RefCell;
use std::rc::Rc;

use crate::types::{DeviceFrame, InputDevice};

/// An in-memory device whose state is set by its owner.
///
/// Clones share the same frame, so one handle can be moved into a
/// [`DeviceSet`](crate::DeviceSet) while another keeps feeding it. Used for the
/// sensor device, trace replay and tests.
#[derive(Debug, Clone, Default)]
pub struct VirtualDevice {
    frame: Rc<RefCell<DeviceFrame>>,
}

impl VirtualDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole frame.
    pub fn load(&self, frame: DeviceFrame) {
        *self.frame.borrow_mut() = frame;
    }

    pub fn snapshot(&self) -> DeviceFrame {
        *self.frame.borrow()
    }

    pub fn set_button(&self, index: u8, pressed: bool) {
        self.frame.borrow_mut().set_button(index, pressed);
    }

    pub fn set_pov(&self, pov: i32) {
        self.frame.borrow_mut().pov = pov;
    }

    pub fn set_axis(&self, index: u8, value: f64) {
        self.frame.borrow_mut().set_axis(index, value);
    }

    /// Releases every button, centers the POV and zeroes all axes.
    pub fn clear(&self) {
        self.load(DeviceFrame::default());
    }
}

impl InputDevice for VirtualDevice {
    fn raw_button(&self, index: u8) -> bool {
        self.frame.borrow().button(index)
    }

    fn pov(&self) -> i32 {
        self.frame.borrow().pov
    }

    fn raw_axis(&self, index: u8) -> f64 {
        self.frame.borrow().axis(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::POV_CENTERED;

    #[test]
    fn clones_share_state() {
        let device = VirtualDevice::new();
        let reader = device.clone();

        device.set_button(3, true);
        device.set_pov(90);
        device.set_axis(1, -0.5);

        assert!(reader.raw_button(3));
        assert_eq!(reader.pov(), 90);
        assert_eq!(reader.raw_axis(1), -0.5);

        device.clear();
        assert!(!reader.raw_button(3));
        assert_eq!(reader.pov(), POV_CENTERED);
    }
}
