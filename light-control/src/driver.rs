//! Capability traits at the hardware seam.

use async_trait::async_trait;

use crate::error::Result;

/// Capability to drive named lights.
///
/// This is the only surface the presence machinery sees: turn a light on or
/// off by name, or ask whether it is currently on. Every call can fail with
/// a driver-level error; callers decide whether a failure matters.
#[async_trait]
pub trait LightDriver: Send + Sync {
    /// Switch the named light on.
    async fn turn_on(&self, light: &str) -> Result<()>;

    /// Switch the named light off.
    async fn turn_off(&self, light: &str) -> Result<()>;

    /// Query whether the named light is currently on.
    async fn get_status(&self, light: &str) -> Result<bool>;
}

/// Capability of one physical multi-switch device.
///
/// A device exposes numbered switches; several named lights may map onto one
/// device. Implementations own the vendor protocol — swapping vendors
/// touches nothing above this trait.
#[async_trait]
pub trait SwitchDevice: Send + Sync {
    /// Set one switch. Commands are fire-and-forget at the wire level.
    async fn set_switch(&self, switch: u8, on: bool) -> Result<()>;

    /// Read one switch's current state. Queries await the device's reply.
    async fn switch_state(&self, switch: u8) -> Result<bool>;
}
