//! The three stage contracts every pipeline component implements.
//!
//! Readers produce, transforms map, writers consume. Each declares the
//! [`Format`] of what it emits and/or accepts so a composed pipeline can be
//! verified end-to-end at construction time.

use crate::format::Format;
use crate::record::Record;

/// A record source. `read` may block; `Ok(None)` means the source is
/// exhausted and will never produce again.
pub trait Reader: Send {
    /// Pull the next record, blocking if none is ready yet.
    fn read(&mut self) -> anyhow::Result<Option<Record>>;

    /// Format of the records this source emits.
    fn output_format(&self) -> Format {
        Format::Unknown
    }

    /// Stage name used in diagnostics.
    fn name(&self) -> &str {
        "reader"
    }
}

/// A record-to-record converter. `Ok(None)` means "drop this record" and
/// short-circuits the rest of the chain for that record only.
///
/// Transforms are shared across source threads, so implementations that
/// accumulate cross-call state must hold it behind interior mutability and
/// should be guarded by a [`LockPolicy`](crate::LockPolicy) position lock.
pub trait Transform: Send + Sync {
    /// Convert one record, or drop it.
    fn transform(&self, record: Record) -> anyhow::Result<Option<Record>>;

    /// Format this transform accepts.
    fn input_format(&self) -> Format {
        Format::Unknown
    }

    /// Format this transform emits.
    fn output_format(&self) -> Format {
        Format::Unknown
    }

    /// Stage name used in diagnostics.
    fn name(&self) -> &str {
        "transform"
    }
}

/// A record sink.
pub trait Writer: Send {
    /// Deliver one record.
    fn write(&mut self, record: Record) -> anyhow::Result<()>;

    /// Format this sink accepts.
    fn input_format(&self) -> Format {
        Format::Unknown
    }

    /// Stage name used in diagnostics.
    fn name(&self) -> &str {
        "writer"
    }
}
