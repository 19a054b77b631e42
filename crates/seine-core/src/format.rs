//! Format compatibility lattice.
//!
//! Every pipeline stage declares the shape of what it produces and what it
//! accepts as a [`Format`] tag. Tags form a small single-rooted hierarchy;
//! [`Format::common`] finds the most specific tag two stages agree on, and
//! [`Format::can_accept`] is the stage-to-stage compatibility check used when
//! a pipeline is built with format verification enabled.

use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Data-shape tag declared by readers, transforms, and writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Wildcard: accepts anything, promises nothing.
    Unknown,
    /// Undifferentiated bytes.
    Bytes,
    /// Newline-delimited text.
    Text,
    /// Delimited NMEA sensor sentences.
    Nmea,
    /// JSON-encoded text.
    Json,
    /// Structured field-name → value mappings.
    FieldDict,
}

impl Format {
    /// Immediate parent in the hierarchy; `None` for the root.
    fn parent(self) -> Option<Format> {
        match self {
            Format::Unknown => None,
            Format::Bytes => Some(Format::Unknown),
            Format::Text => Some(Format::Bytes),
            Format::Nmea | Format::Json => Some(Format::Text),
            Format::FieldDict => Some(Format::Unknown),
        }
    }

    /// The chain from this tag up to the root, starting with the tag itself.
    fn ancestry(self) -> Vec<Format> {
        let mut chain = vec![self];
        let mut cur = self;
        while let Some(parent) = cur.parent() {
            chain.push(parent);
            cur = parent;
        }
        chain
    }

    /// Most specific tag both `a` and `b` are consistent with.
    ///
    /// Commutative and associative (lowest common ancestor on a tree), so a
    /// list of tags can be reduced by repeated `common()` in any order. With
    /// the current single-rooted tag set the result is always `Some`; the
    /// signature keeps the disjoint case for callers.
    pub fn common(a: Format, b: Format) -> Option<Format> {
        let up_a = a.ancestry();
        b.ancestry().into_iter().find(|tag| up_a.contains(tag))
    }

    /// Whether a stage declaring this input tag can consume records carrying
    /// `producer`'s output tag: exact match, or this tag is the wildcard.
    pub fn can_accept(self, producer: Format) -> bool {
        self == producer || self == Format::Unknown
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Unknown => "unknown",
            Format::Bytes => "bytes",
            Format::Text => "text",
            Format::Nmea => "nmea",
            Format::Json => "json",
            Format::FieldDict => "fields",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Format {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unknown" => Ok(Format::Unknown),
            "bytes" => Ok(Format::Bytes),
            "text" => Ok(Format::Text),
            "nmea" => Ok(Format::Nmea),
            "json" => Ok(Format::Json),
            "fields" => Ok(Format::FieldDict),
            other => Err(ConfigError::UnknownFormat(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ALL: [Format; 6] = [
        Format::Unknown,
        Format::Bytes,
        Format::Text,
        Format::Nmea,
        Format::Json,
        Format::FieldDict,
    ];

    fn any_format() -> impl Strategy<Value = Format> {
        prop::sample::select(ALL.to_vec())
    }

    #[test]
    fn common_finds_lowest_shared_ancestor() {
        assert_eq!(Format::common(Format::Nmea, Format::Json), Some(Format::Text));
        assert_eq!(Format::common(Format::Nmea, Format::Text), Some(Format::Text));
        assert_eq!(Format::common(Format::Text, Format::FieldDict), Some(Format::Unknown));
        assert_eq!(Format::common(Format::Nmea, Format::Nmea), Some(Format::Nmea));
    }

    #[test]
    fn can_accept_is_exact_or_wildcard() {
        assert!(Format::Text.can_accept(Format::Text));
        assert!(Format::Unknown.can_accept(Format::Nmea));
        assert!(!Format::Text.can_accept(Format::Nmea));
        assert!(!Format::Nmea.can_accept(Format::Text));
    }

    #[test]
    fn unrecognized_name_is_a_config_error() {
        let err = "structured-nmea".parse::<Format>().unwrap_err();
        assert!(err.to_string().contains("structured-nmea"));
        assert_eq!("nmea".parse::<Format>().unwrap(), Format::Nmea);
    }

    proptest! {
        #[test]
        fn common_is_commutative(a in any_format(), b in any_format()) {
            prop_assert_eq!(Format::common(a, b), Format::common(b, a));
        }

        #[test]
        fn common_is_associative(a in any_format(), b in any_format(), c in any_format()) {
            let left = Format::common(a, b).and_then(|ab| Format::common(ab, c));
            let right = Format::common(b, c).and_then(|bc| Format::common(a, bc));
            prop_assert_eq!(left, right);
        }

        #[test]
        fn common_is_idempotent(a in any_format()) {
            prop_assert_eq!(Format::common(a, a), Some(a));
        }
    }
}
