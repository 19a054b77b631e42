//! UDP datagram source and sink.
//!
//! One datagram is one record. The reader never exhausts on its own; it ends
//! only when the process does or the socket errors.

use anyhow::Context;
use seine_core::{Format, Reader, Record, Writer};
use std::net::UdpSocket;
use tracing::debug;

/// Maximum datagram we accept; larger payloads are truncated by the OS.
const MAX_DATAGRAM: usize = 65_536;

/// Receives newline-less text datagrams on a bound port.
pub struct UdpReader {
    socket: UdpSocket,
    buf: Vec<u8>,
}

impl UdpReader {
    pub fn new(port: u16) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", port))
            .with_context(|| format!("binding UDP port {port}"))?;
        debug!(port, "UDP reader bound");
        Ok(Self {
            socket,
            buf: vec![0; MAX_DATAGRAM],
        })
    }
}

impl Reader for UdpReader {
    fn read(&mut self) -> anyhow::Result<Option<Record>> {
        let (n, _peer) = self
            .socket
            .recv_from(&mut self.buf)
            .context("receiving UDP datagram")?;
        let text = String::from_utf8_lossy(&self.buf[..n]);
        Ok(Some(Record::Text(
            text.trim_end_matches(['\n', '\r']).to_string(),
        )))
    }

    fn output_format(&self) -> Format {
        Format::Text
    }

    fn name(&self) -> &str {
        "udp"
    }
}

/// Sends each record as one datagram to a fixed destination.
pub struct UdpWriter {
    socket: UdpSocket,
    destination: String,
}

impl UdpWriter {
    pub fn new(host: &str, port: u16) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", 0)).context("binding UDP send socket")?;
        let destination = format!("{host}:{port}");
        socket
            .connect(&destination)
            .with_context(|| format!("connecting UDP socket to {destination}"))?;
        Ok(Self {
            socket,
            destination,
        })
    }
}

impl Writer for UdpWriter {
    fn write(&mut self, record: Record) -> anyhow::Result<()> {
        self.socket
            .send(record.to_line().as_bytes())
            .with_context(|| format!("sending datagram to {}", self.destination))?;
        Ok(())
    }

    fn input_format(&self) -> Format {
        Format::Text
    }

    fn name(&self) -> &str {
        "udp"
    }
}
