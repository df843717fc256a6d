//! UDP transport for single records
//!
//! The engine's UDP bulk listener takes a bulk request body in one
//! datagram: an action line and a document line, each newline-terminated.
//! There is no acknowledgment; loss goes unnoticed.

use esmeta_core::Record;
use serde_json::json;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};

/// Build the datagram payload for one record.
pub fn udp_payload(index: &str, doc_type: &str, record: &Record) -> serde_json::Result<String> {
    let header = json!({ "index": { "_index": index, "_type": doc_type } });
    let mut message = serde_json::to_string(&header)?;
    message.push('\n');
    message.push_str(&serde_json::to_string(record)?);
    message.push('\n');
    Ok(message)
}

/// Fire-and-forget sender to `host:port`.
#[derive(Debug, Clone)]
pub struct UdpSender {
    host: String,
    port: u16,
}

impl UdpSender {
    /// Create a sender for `host:port`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Send one record as a single datagram. Returns the bytes sent.
    pub fn send(&self, index: &str, doc_type: &str, record: &Record) -> io::Result<usize> {
        let payload = udp_payload(index, doc_type, record)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        // Each resolved address is tried in turn from a socket of its family.
        let mut last_error = None;
        for target in (self.host.as_str(), self.port).to_socket_addrs()? {
            match send_datagram(target, payload.as_bytes()) {
                Ok(sent) => return Ok(sent),
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("{} resolved to no addresses", self.host),
            )
        }))
    }
}

fn send_datagram(target: SocketAddr, payload: &[u8]) -> io::Result<usize> {
    let local: SocketAddr = if target.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };
    UdpSocket::bind(local)?.send_to(payload, target)
}
