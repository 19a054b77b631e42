//! seine-feeds: boundary source and sink adapters for seine.
//!
//! Each adapter implements the core [`Reader`](seine_core::Reader) or
//! [`Writer`](seine_core::Writer) contract over one transport: text files
//! (with optional tail-follow), UDP datagrams, or the process console. All
//! adapters speak newline-delimited text at the pipeline boundary.

pub mod console;
pub mod file;
pub mod udp;

pub use console::{StdinReader, StdoutWriter};
pub use file::{TextFileReader, TextFileWriter};
pub use udp::{UdpReader, UdpWriter};
