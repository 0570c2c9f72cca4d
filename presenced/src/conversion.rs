//! Conversion from configuration shapes into runtime types.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use light_control::{LightControl, LightSpec, SwitchDevice, UdpSwitchDevice};
use presence_engine::{ActiveWindow, ChannelGroup, LightRule};

use crate::config::Config;

/// Build the light-control layer from the configured topology.
///
/// Fails when a light references a device that is not configured.
pub fn build_driver(config: &Config) -> light_control::Result<LightControl> {
    let devices: HashMap<String, Arc<dyn SwitchDevice>> = config
        .devices
        .iter()
        .map(|(name, device)| {
            let addr = SocketAddr::new(device.ip, device.port);
            (
                name.clone(),
                Arc::new(UdpSwitchDevice::new(name.clone(), addr)) as Arc<dyn SwitchDevice>,
            )
        })
        .collect();

    let lights = config
        .lights
        .iter()
        .map(|(name, light)| {
            (
                name.clone(),
                LightSpec {
                    device: light.device.clone(),
                    switch: light.switch,
                },
            )
        })
        .collect();

    LightControl::new(devices, lights)
}

/// Map the `[[presence]]` groups onto engine channel groups.
pub fn presence_groups(config: &Config) -> Vec<ChannelGroup> {
    config
        .presence
        .iter()
        .map(|group| ChannelGroup {
            channels: group.channels.clone(),
            lights: group
                .lights
                .iter()
                .map(|light| LightRule {
                    light: light.light.clone(),
                    duration_secs: light.duration,
                    active_windows: light
                        .active_time
                        .iter()
                        .map(|(start, end)| ActiveWindow::new(*start, *end))
                        .collect(),
                })
                .collect(),
        })
        .collect()
}
