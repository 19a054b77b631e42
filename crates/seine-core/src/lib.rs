//! seine-core: record pipeline engine for seine.
//!
//! This crate is the in-process data-flow core of the acquisition system:
//! records pulled from independently-paced sources are merged by the
//! [`ComposedReader`] fan-in engine, pushed through an ordered transform
//! chain, and handed to a single consumer. The text side is the template
//! parser: sensor sentences are matched against `{name:type}` format
//! templates compiled through the [`ConverterRegistry`].
//!
//! # Architecture
//!
//! ```text
//! Reader ──┐
//! Reader ──┼──► ComposedReader ──► Transform chain ──► read() ──► Writer
//! Reader ──┘        (threads)        (per source)      (consumer)
//! ```
//!
//! Each source runs on its own OS thread; the consumer blocks on a shared
//! queue. Concrete sources and sinks live in `seine-feeds`.

pub mod composed;
pub mod contracts;
pub mod converters;
pub mod diagnose;
pub mod error;
pub mod format;
pub mod record;
pub mod template;
pub mod transforms;

pub use composed::{ComposedReader, LockPolicy};
pub use contracts::{Reader, Transform, Writer};
pub use converters::{Converter, ConverterRegistry};
pub use diagnose::{Diagnosis, PartialMatch};
pub use error::{ConfigError, TemplateError};
pub use format::Format;
pub use record::Record;
pub use template::{CompiledTemplate, Parser};
