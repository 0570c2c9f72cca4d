//! # isapi-stream
//!
//! A micro-crate for consuming the long-lived alert stream exposed by
//! ISAPI-speaking network cameras.
//!
//! The camera keeps an HTTP response open indefinitely and writes one XML
//! `EventNotificationAlert` record per notification. This crate frames those
//! records out of the chunked byte stream, parses them into field maps, and
//! supervises the connection so transient link drops reconnect automatically.
//! Consumers register an [`EventHandler`] and never touch the wire format.

mod client;
mod digest;
mod error;
mod event;
mod framer;
mod supervisor;

pub use client::StreamClient;
pub use digest::DigestChallenge;
pub use error::{ParseError, Result, StreamError};
pub use event::{EventRecord, MOTION_EVENT_TYPE};
pub use framer::EventFramer;
pub use supervisor::{ChunkStream, EventHandler, EventSource, StreamSupervisor};
