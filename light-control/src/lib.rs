//! # light-control
//!
//! The light-switch capability surface: a [`LightDriver`] trait consumers
//! program against, a [`LightControl`] topology layer that resolves light
//! names to a switch index on a named device, and a LAN switch device
//! backend speaking single-datagram JSON.
//!
//! Vendors differ only below the [`SwitchDevice`] seam; nothing above it
//! knows what protocol a device speaks.

mod control;
mod driver;
mod error;
mod udp;

pub use control::{LightControl, LightSpec};
pub use driver::{LightDriver, SwitchDevice};
pub use error::{DriverError, Result};
pub use udp::UdpSwitchDevice;
