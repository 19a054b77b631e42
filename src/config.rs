//! Pipeline configuration for the seine binary.
//!
//! [`PipelineConfig::load`] layers a user-supplied TOML file over built-in
//! defaults; [`PipelineConfig::defaults`] returns the defaults without
//! touching the filesystem (useful in tests). A config names the sources to
//! fan in, the transform chain to run, and the sink that receives the merged
//! stream.

use anyhow::Context;
use seine_core::transforms::{
    ParseTransform, PrefixTransform, RegexFilterTransform, SliceTransform, TimestampTransform,
};
use seine_core::{ComposedReader, LockPolicy, Reader, Transform, Writer};
use seine_feeds::{StdinReader, StdoutWriter, TextFileReader, TextFileWriter, UdpReader, UdpWriter};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
check_formats = false
lock_all = false

[sink]
kind = "stdout"
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level pipeline definition.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Verify reader → transform-chain format compatibility at startup.
    #[serde(default)]
    pub check_formats: bool,
    /// Serialize every transform position on one shared mutex.
    #[serde(default)]
    pub lock_all: bool,
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceConfig>,
    #[serde(default, rename = "transform")]
    pub transforms: Vec<TransformConfig>,
    #[serde(default)]
    pub sink: SinkConfig,
}

/// One `[[source]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    File {
        path: PathBuf,
        #[serde(default)]
        tail: bool,
    },
    Udp {
        port: u16,
    },
    Stdin,
}

/// One `[[transform]]` entry, applied in file order.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TransformConfig {
    Timestamp {
        #[serde(default)]
        format: Option<String>,
    },
    Prefix {
        prefix: String,
    },
    Parse {
        templates: Vec<String>,
    },
    Filter {
        pattern: String,
    },
    Slice {
        fields: Vec<isize>,
    },
}

/// The `[sink]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SinkConfig {
    Stdout,
    File { path: PathBuf },
    Udp { host: String, port: u16 },
}

impl Default for SinkConfig {
    fn default() -> Self {
        SinkConfig::Stdout
    }
}

impl PipelineConfig {
    /// Load from `path`, layered on top of the built-in defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(
                DEFAULT_CONFIG,
                config::FileFormat::Toml,
            ))
            .add_source(config::File::from(path))
            .build()
            .with_context(|| format!("loading pipeline config {}", path.display()))?
            .try_deserialize()
            .map_err(Into::into)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(
                DEFAULT_CONFIG,
                config::FileFormat::Toml,
            ))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }
}

// ---------------------------------------------------------------------------
// Pipeline assembly
// ---------------------------------------------------------------------------

/// Build the fan-in reader and the sink this config describes.
pub fn build_pipeline(
    cfg: &PipelineConfig,
) -> anyhow::Result<(ComposedReader, Box<dyn Writer>)> {
    let mut readers: Vec<Box<dyn Reader>> = Vec::with_capacity(cfg.sources.len());
    for source in &cfg.sources {
        readers.push(match source {
            SourceConfig::File { path, tail } => Box::new(TextFileReader::new(path, *tail)?),
            SourceConfig::Udp { port } => Box::new(UdpReader::new(*port)?),
            SourceConfig::Stdin => Box::new(StdinReader::new()),
        });
    }
    anyhow::ensure!(!readers.is_empty(), "pipeline config defines no sources");

    let mut transforms: Vec<Arc<dyn Transform>> = Vec::with_capacity(cfg.transforms.len());
    for transform in &cfg.transforms {
        transforms.push(match transform {
            TransformConfig::Timestamp { format: None } => Arc::new(TimestampTransform::new()),
            TransformConfig::Timestamp { format: Some(fmt) } => {
                Arc::new(TimestampTransform::with_format(fmt))
            }
            TransformConfig::Prefix { prefix } => Arc::new(PrefixTransform::new(prefix)),
            TransformConfig::Parse { templates } => Arc::new(
                ParseTransform::new(templates.clone())
                    .context("compiling parse transform templates")?,
            ),
            TransformConfig::Filter { pattern } => Arc::new(
                RegexFilterTransform::new(pattern)
                    .with_context(|| format!("invalid filter pattern '{pattern}'"))?,
            ),
            TransformConfig::Slice { fields } => Arc::new(SliceTransform::new(fields.clone())),
        });
    }

    let policy = if cfg.lock_all {
        LockPolicy::All
    } else {
        LockPolicy::Unguarded
    };
    let reader = ComposedReader::new(readers, transforms, policy, cfg.check_formats)?;

    let writer: Box<dyn Writer> = match &cfg.sink {
        SinkConfig::Stdout => Box::new(StdoutWriter),
        SinkConfig::File { path } => Box::new(TextFileWriter::new(path)?),
        SinkConfig::Udp { host, port } => Box::new(UdpWriter::new(host, *port)?),
    };

    Ok((reader, writer))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
