use crate::types::{DeviceRef, InputDevice};
use crate::{Error, Result};

/// The input devices a controller reads from, wired once at startup.
#[derive(Default)]
pub struct DeviceSet {
    driver: Option<Box<dyn InputDevice>>,
    co_driver: Option<Box<dyn InputDevice>>,
    sensor: Option<Box<dyn InputDevice>>,
}

impl DeviceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `device` at `slot`, replacing any previous one.
    pub fn with(
        mut self,
        slot: DeviceRef,
        device: impl InputDevice + 'static,
    ) -> Result<Self> {
        self.insert(slot, Box::new(device))?;
        Ok(self)
    }

    pub fn insert(
        &mut self,
        slot: DeviceRef,
        device: Box<dyn InputDevice>,
    ) -> Result<()> {
        match slot {
            DeviceRef::None => return Err(Error::Unbindable(slot)),
            DeviceRef::Driver => self.driver = Some(device),
            DeviceRef::CoDriver => self.co_driver = Some(device),
            DeviceRef::Sensor => self.sensor = Some(device),
        }
        Ok(())
    }

    /// Returns the device at `slot`. [`DeviceRef::None`] never has one.
    pub fn get(&self, slot: DeviceRef) -> Option<&dyn InputDevice> {
        match slot {
            DeviceRef::None => None,
            DeviceRef::Driver => self.driver.as_deref(),
            DeviceRef::CoDriver => self.co_driver.as_deref(),
            DeviceRef::Sensor => self.sensor.as_deref(),
        }
    }

    /// Fails unless a binding on `slot` could be read from.
    ///
    /// `DeviceRef::None` is accepted here; callers that need real input reject
    /// it themselves.
    pub fn require(&self, slot: DeviceRef) -> Result<()> {
        if slot == DeviceRef::None || self.get(slot).is_some() {
            Ok(())
        } else {
            Err(Error::Missing(slot))
        }
    }

    pub fn connected(&self) -> impl Iterator<Item = DeviceRef> + '_ {
        [DeviceRef::Driver, DeviceRef::CoDriver, DeviceRef::Sensor]
            .into_iter()
            .filter(|slot| self.get(*slot).is_some())
    }
}
