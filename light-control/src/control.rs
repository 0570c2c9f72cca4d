//! Name resolution from lights to device switches.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::driver::{LightDriver, SwitchDevice};
use crate::error::{DriverError, Result};

/// Where a named light lives: which device, which switch index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightSpec {
    /// Name of the device carrying this light
    pub device: String,
    /// Switch index on that device
    pub switch: u8,
}

/// Drives named lights by resolving them onto switch devices.
///
/// Built once from the configured topology. Every light must reference a
/// known device; that is checked at construction so a broken topology never
/// reaches the event path.
pub struct LightControl {
    devices: HashMap<String, Arc<dyn SwitchDevice>>,
    lights: HashMap<String, LightSpec>,
}

impl LightControl {
    /// Build the control layer, validating every light's device reference.
    pub fn new(
        devices: HashMap<String, Arc<dyn SwitchDevice>>,
        lights: HashMap<String, LightSpec>,
    ) -> Result<Self> {
        for (name, spec) in &lights {
            if !devices.contains_key(&spec.device) {
                return Err(DriverError::UnknownDevice {
                    light: name.clone(),
                    device: spec.device.clone(),
                });
            }
        }
        Ok(Self { devices, lights })
    }

    /// Number of configured lights.
    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    fn resolve(&self, light: &str) -> Result<(&Arc<dyn SwitchDevice>, u8)> {
        let spec = self
            .lights
            .get(light)
            .ok_or_else(|| DriverError::UnknownLight(light.to_string()))?;
        let device = self
            .devices
            .get(&spec.device)
            .ok_or_else(|| DriverError::UnknownDevice {
                light: light.to_string(),
                device: spec.device.clone(),
            })?;
        Ok((device, spec.switch))
    }
}

#[async_trait]
impl LightDriver for LightControl {
    async fn turn_on(&self, light: &str) -> Result<()> {
        let (device, switch) = self.resolve(light)?;
        device.set_switch(switch, true).await
    }

    async fn turn_off(&self, light: &str) -> Result<()> {
        let (device, switch) = self.resolve(light)?;
        device.set_switch(switch, false).await
    }

    async fn get_status(&self, light: &str) -> Result<bool> {
        let (device, switch) = self.resolve(light)?;
        device.switch_state(switch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every switch command it receives.
    #[derive(Default)]
    struct RecordingDevice {
        commands: Mutex<Vec<(u8, bool)>>,
    }

    #[async_trait]
    impl SwitchDevice for RecordingDevice {
        async fn set_switch(&self, switch: u8, on: bool) -> Result<()> {
            self.commands.lock().unwrap().push((switch, on));
            Ok(())
        }

        async fn switch_state(&self, switch: u8) -> Result<bool> {
            Ok(self
                .commands
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|(s, _)| *s == switch)
                .map(|(_, on)| *on)
                .unwrap_or(false))
        }
    }

    fn topology(
        device: Arc<RecordingDevice>,
    ) -> (
        HashMap<String, Arc<dyn SwitchDevice>>,
        HashMap<String, LightSpec>,
    ) {
        let devices: HashMap<String, Arc<dyn SwitchDevice>> =
            HashMap::from([("strip-1".to_string(), device as Arc<dyn SwitchDevice>)]);
        let lights = HashMap::from([
            (
                "porch".to_string(),
                LightSpec {
                    device: "strip-1".to_string(),
                    switch: 1,
                },
            ),
            (
                "garden".to_string(),
                LightSpec {
                    device: "strip-1".to_string(),
                    switch: 2,
                },
            ),
        ]);
        (devices, lights)
    }

    #[tokio::test]
    async fn resolves_lights_onto_device_switches() {
        let device = Arc::new(RecordingDevice::default());
        let (devices, lights) = topology(device.clone());
        let control = LightControl::new(devices, lights).unwrap();

        control.turn_on("porch").await.unwrap();
        control.turn_off("garden").await.unwrap();

        assert_eq!(
            *device.commands.lock().unwrap(),
            vec![(1, true), (2, false)]
        );
        assert!(control.get_status("porch").await.unwrap());
        assert!(!control.get_status("garden").await.unwrap());
    }

    #[tokio::test]
    async fn unknown_light_is_an_error() {
        let device = Arc::new(RecordingDevice::default());
        let (devices, lights) = topology(device);
        let control = LightControl::new(devices, lights).unwrap();

        let result = control.turn_on("attic").await;
        assert!(matches!(result, Err(DriverError::UnknownLight(name)) if name == "attic"));
    }

    #[test]
    fn construction_rejects_dangling_device_references() {
        let lights = HashMap::from([(
            "porch".to_string(),
            LightSpec {
                device: "missing".to_string(),
                switch: 1,
            },
        )]);
        let result = LightControl::new(HashMap::new(), lights);
        assert!(matches!(
            result,
            Err(DriverError::UnknownDevice { light, device })
                if light == "porch" && device == "missing"
        ));
    }
}
