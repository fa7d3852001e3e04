use crate::error::{ActoscError, Result};
use crate::expr::Value;
use crate::paths;
use crate::sample::Sample;
use rosc::{encoder, OscMessage, OscPacket, OscType};
use serde::Serialize;
use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use tracing::debug;

// ---------------------------------------------------------------------------
// Output values
// ---------------------------------------------------------------------------

/// The three argument types an avatar parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OscValue {
    Bool(bool),
    Int(i32),
    Float(f32),
}

impl OscValue {
    /// Convert an expression result, rejecting anything that is not a
    /// primitive or does not fit the wire type.
    pub fn from_value(param: &str, value: &Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(OscValue::Bool(*b)),
            Value::Int(i) => i32::try_from(*i)
                .map(OscValue::Int)
                .map_err(|_| ActoscError::IntegerOutOfRange {
                    param: param.to_string(),
                    value: *i,
                }),
            Value::Float(f) => Ok(OscValue::Float(*f as f32)),
            other => Err(ActoscError::InvalidOutputType {
                param: param.to_string(),
                found: other.type_name(),
            }),
        }
    }

    pub fn from_sample(param: &str, sample: &Sample) -> Result<Self> {
        match sample {
            Sample::Bool(b) => Ok(OscValue::Bool(*b)),
            Sample::Float(f) => Ok(OscValue::Float(*f)),
            other => Err(ActoscError::InvalidOutputType {
                param: param.to_string(),
                found: other.kind().to_string(),
            }),
        }
    }

    fn to_osc(self) -> OscType {
        match self {
            OscValue::Bool(b) => OscType::Bool(b),
            OscValue::Int(i) => OscType::Int(i),
            OscValue::Float(f) => OscType::Float(f),
        }
    }
}

impl fmt::Display for OscValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OscValue::Bool(b) => write!(f, "{b}"),
            OscValue::Int(i) => write!(f, "{i}"),
            OscValue::Float(x) => write!(f, "{x:.6}"),
        }
    }
}

/// One parameter update for the current tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputMessage {
    pub name: String,
    pub value: OscValue,
}

impl OutputMessage {
    pub fn new(name: impl Into<String>, value: OscValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// OSC address, `/avatar/parameters/<name>`.
    pub fn path(&self) -> String {
        paths::parameter_address(&self.name)
    }

    pub fn to_packet(&self) -> OscPacket {
        OscPacket::Message(OscMessage {
            addr: self.path(),
            args: vec![self.value.to_osc()],
        })
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Where a tick's messages go. Delivery is best effort; sinks never fail a
/// tick.
pub trait OscSink {
    fn send(&mut self, messages: &[OutputMessage]);
}

/// Sends each message as its own UDP datagram.
#[derive(Debug)]
pub struct UdpSink {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpSink {
    pub fn connect(ip: &str, port: u16) -> Result<Self> {
        let target = (ip, port).to_socket_addrs()?.next().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("no address for {ip}:{port}"),
            )
        })?;
        let bind: SocketAddr = if target.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let socket = UdpSocket::bind(bind)?;
        debug!(%target, local = ?socket.local_addr().ok(), "osc client ready");
        Ok(Self { socket, target })
    }
}

impl OscSink for UdpSink {
    fn send(&mut self, messages: &[OutputMessage]) {
        for message in messages {
            let bytes = match encoder::encode(&message.to_packet()) {
                Ok(bytes) => bytes,
                Err(e) => {
                    debug!(param = %message.name, error = ?e, "osc encode failed");
                    continue;
                }
            };
            if let Err(e) = self.socket.send_to(&bytes, self.target) {
                debug!(param = %message.name, error = %e, "osc send failed");
            }
        }
    }
}

/// Keeps every batch it is handed.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub batches: Vec<Vec<OutputMessage>>,
}

impl MemorySink {
    pub fn last(&self) -> Option<&[OutputMessage]> {
        self.batches.last().map(Vec::as_slice)
    }
}

impl OscSink for MemorySink {
    fn send(&mut self, messages: &[OutputMessage]) {
        self.batches.push(messages.to_vec());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
