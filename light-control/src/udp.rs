//! LAN switch device speaking single-datagram JSON.
//!
//! The plugs on the local network accept one JSON request per UDP datagram:
//! `setState` flips a switch and is not acknowledged, `getState` is answered
//! with the switch's current state. The exchange format mirrors the common
//! smart-bulb LAN protocols: a `method`/`params` request and a
//! `result`-or-`error` reply.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::net::UdpSocket;
use tracing::debug;

use crate::driver::SwitchDevice;
use crate::error::{DriverError, Result};

/// Default deadline for `getState` replies.
const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize)]
struct Request<'a> {
    method: &'a str,
    params: Params,
}

#[derive(Debug, Serialize)]
struct Params {
    switch: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct Reply {
    result: Option<ReplyResult>,
    error: Option<ReplyError>,
}

#[derive(Debug, Deserialize)]
struct ReplyResult {
    #[serde(default)]
    state: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ReplyError {
    code: i32,
    message: String,
}

/// One multi-switch plug addressed over UDP.
pub struct UdpSwitchDevice {
    name: String,
    addr: SocketAddr,
    reply_timeout: Duration,
}

impl UdpSwitchDevice {
    /// Address a device by name and socket address.
    pub fn new(name: impl Into<String>, addr: SocketAddr) -> Self {
        Self {
            name: name.into(),
            addr,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
        }
    }

    /// Override the `getState` reply deadline.
    pub fn with_reply_timeout(mut self, reply_timeout: Duration) -> Self {
        self.reply_timeout = reply_timeout;
        self
    }

    fn io_error(&self, source: std::io::Error) -> DriverError {
        DriverError::Io {
            device: self.name.clone(),
            source,
        }
    }

    fn protocol_error(&self, reason: impl Into<String>) -> DriverError {
        DriverError::Protocol {
            device: self.name.clone(),
            reason: reason.into(),
        }
    }

    async fn socket(&self) -> Result<UdpSocket> {
        let socket = UdpSocket::bind(("0.0.0.0", 0))
            .await
            .map_err(|e| self.io_error(e))?;
        socket
            .connect(self.addr)
            .await
            .map_err(|e| self.io_error(e))?;
        Ok(socket)
    }

    async fn send(&self, socket: &UdpSocket, request: &Request<'_>) -> Result<()> {
        let payload = serde_json::to_vec(request)
            .map_err(|e| self.protocol_error(format!("could not encode request: {e}")))?;
        socket
            .send(&payload)
            .await
            .map_err(|e| self.io_error(e))?;
        debug!("sent {} to device {}", request.method, self.name);
        Ok(())
    }
}

#[async_trait]
impl SwitchDevice for UdpSwitchDevice {
    async fn set_switch(&self, switch: u8, on: bool) -> Result<()> {
        let socket = self.socket().await?;
        let request = Request {
            method: "setState",
            params: Params {
                switch,
                state: Some(on),
            },
        };
        // Set commands are fire-and-forget: the device does not acknowledge
        // them, and the event path must not stall on a dead plug.
        self.send(&socket, &request).await
    }

    async fn switch_state(&self, switch: u8) -> Result<bool> {
        let socket = self.socket().await?;
        let request = Request {
            method: "getState",
            params: Params {
                switch,
                state: None,
            },
        };
        self.send(&socket, &request).await?;

        let mut buf = [0u8; 1024];
        let len = tokio::time::timeout(self.reply_timeout, socket.recv(&mut buf))
            .await
            .map_err(|_| DriverError::Timeout {
                device: self.name.clone(),
                timeout: self.reply_timeout,
            })?
            .map_err(|e| self.io_error(e))?;

        let reply: Reply = serde_json::from_slice(&buf[..len])
            .map_err(|e| self.protocol_error(format!("unreadable reply: {e}")))?;
        if let Some(error) = reply.error {
            return Err(self.protocol_error(format!("{} (code {})", error.message, error.code)));
        }
        reply
            .result
            .and_then(|result| result.state)
            .ok_or_else(|| self.protocol_error("reply carried no state"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    /// Bind a loopback socket standing in for a plug and run `replies` for
    /// each datagram received.
    async fn fake_plug(
        replies: impl Fn(Value) -> Option<Value> + Send + 'static,
    ) -> (SocketAddr, tokio::task::JoinHandle<Vec<Value>>) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let mut seen = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
                    break;
                };
                let request: Value = serde_json::from_slice(&buf[..len]).unwrap();
                seen.push(request.clone());
                match replies(request) {
                    Some(reply) => {
                        let payload = serde_json::to_vec(&reply).unwrap();
                        socket.send_to(&payload, peer).await.unwrap();
                    }
                    None => break,
                }
            }
            seen
        });
        (addr, handle)
    }

    #[tokio::test]
    async fn set_switch_sends_one_datagram_and_does_not_wait() {
        let (addr, plug) = fake_plug(|_| None).await;
        let device = UdpSwitchDevice::new("strip-1", addr);

        device.set_switch(1, true).await.unwrap();

        let seen = plug.await.unwrap();
        assert_eq!(
            seen,
            vec![json!({"method": "setState", "params": {"switch": 1, "state": true}})]
        );
    }

    #[tokio::test]
    async fn switch_state_round_trips_the_reply() {
        let (addr, plug) = fake_plug(|request| {
            assert_eq!(request["method"], "getState");
            Some(json!({"result": {"switch": 2, "state": true}}))
        })
        .await;
        let device = UdpSwitchDevice::new("strip-1", addr);

        assert!(device.switch_state(2).await.unwrap());
        drop(plug);
    }

    #[tokio::test]
    async fn device_error_replies_surface_as_protocol_errors() {
        let (addr, plug) = fake_plug(|_| {
            Some(json!({"error": {"code": -32600, "message": "bad switch"}}))
        })
        .await;
        let device = UdpSwitchDevice::new("strip-1", addr);

        let result = device.switch_state(9).await;
        assert!(matches!(
            result,
            Err(DriverError::Protocol { reason, .. }) if reason.contains("bad switch")
        ));
        drop(plug);
    }

    #[tokio::test]
    async fn a_silent_device_times_out() {
        // Bind a socket that never answers.
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();

        let device = UdpSwitchDevice::new("strip-1", addr)
            .with_reply_timeout(Duration::from_millis(50));
        let result = device.switch_state(1).await;
        assert!(matches!(result, Err(DriverError::Timeout { .. })));
    }
}
