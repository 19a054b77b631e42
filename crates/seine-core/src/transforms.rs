//! Stock record transforms.
//!
//! These cover the common shipboard chain: stamp a line, tag it with its
//! instrument id, filter or slice it, then parse it into typed fields. Each
//! is stateless, so none needs a lock-policy guard.

use crate::contracts::Transform;
use crate::diagnose::Diagnosis;
use crate::error::TemplateError;
use crate::format::Format;
use crate::record::Record;
use crate::template::Parser;
use chrono::{SecondsFormat, Utc};
use regex::Regex;
use std::sync::Arc;
use tracing::warn;

/// Parse text records against an ordered template list; the first template
/// that matches wins. Non-matching records are dropped with a warning that
/// includes the longest-prefix diagnosis, so the log shows *where* the
/// sentence diverged.
#[derive(Debug)]
pub struct ParseTransform {
    parser: Arc<Parser>,
    templates: Vec<String>,
}

impl ParseTransform {
    /// Parse against `templates` using the builtin converter set.
    ///
    /// Every template is compiled here, so a bad template (unknown field
    /// type, unterminated placeholder) is a construction error rather than
    /// a runtime failure on the first record.
    pub fn new(templates: Vec<String>) -> Result<Self, TemplateError> {
        Self::with_parser(Arc::new(Parser::default()), templates)
    }

    /// Parse with a caller-supplied parser (custom converters, cache limit).
    pub fn with_parser(
        parser: Arc<Parser>,
        templates: Vec<String>,
    ) -> Result<Self, TemplateError> {
        for template in &templates {
            parser.compile(template)?;
        }
        Ok(Self { parser, templates })
    }
}

impl Transform for ParseTransform {
    fn transform(&self, record: Record) -> anyhow::Result<Option<Record>> {
        let Some(line) = record.as_text() else {
            warn!("parse transform received a non-text record; dropping");
            return Ok(None);
        };

        for template in &self.templates {
            if let Some(fields) = self.parser.parse(template, line)? {
                return Ok(Some(Record::Fields(fields)));
            }
        }

        // No template matched: report the closest one.
        let mut best: Option<(usize, &str)> = None;
        for template in &self.templates {
            if let Ok(Diagnosis::Partial(partial)) = self.parser.diagnose(template, line) {
                if best.map_or(true, |(to, _)| partial.matched_to > to) {
                    best = Some((partial.matched_to, template.as_str()));
                }
            }
        }
        match best {
            Some((matched_to, template)) => {
                warn!(line, template, matched_to, "unparseable sentence; dropping");
            }
            None => warn!(line, "sentence matched no template at all; dropping"),
        }
        Ok(None)
    }

    fn input_format(&self) -> Format {
        Format::Text
    }

    fn output_format(&self) -> Format {
        Format::FieldDict
    }

    fn name(&self) -> &str {
        "parse"
    }
}

/// Prefix each text record with a UTC timestamp.
pub struct TimestampTransform {
    /// chrono format string; RFC 3339 with milliseconds when unset.
    format: Option<String>,
}

impl TimestampTransform {
    pub fn new() -> Self {
        Self { format: None }
    }

    pub fn with_format(format: impl Into<String>) -> Self {
        Self {
            format: Some(format.into()),
        }
    }

    fn stamp(&self) -> String {
        let now = Utc::now();
        match &self.format {
            Some(fmt) => now.format(fmt).to_string(),
            None => now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

impl Default for TimestampTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for TimestampTransform {
    fn transform(&self, record: Record) -> anyhow::Result<Option<Record>> {
        match record.as_text() {
            Some(line) => Ok(Some(Record::Text(format!("{} {line}", self.stamp())))),
            None => Ok(Some(record)),
        }
    }

    fn input_format(&self) -> Format {
        Format::Text
    }

    fn output_format(&self) -> Format {
        Format::Text
    }

    fn name(&self) -> &str {
        "timestamp"
    }
}

/// Prefix each text record with a fixed token, typically the instrument id.
pub struct PrefixTransform {
    prefix: String,
}

impl PrefixTransform {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Transform for PrefixTransform {
    fn transform(&self, record: Record) -> anyhow::Result<Option<Record>> {
        match record.as_text() {
            Some(line) => Ok(Some(Record::Text(format!("{} {line}", self.prefix)))),
            None => Ok(Some(record)),
        }
    }

    fn input_format(&self) -> Format {
        Format::Text
    }

    fn output_format(&self) -> Format {
        Format::Text
    }

    fn name(&self) -> &str {
        "prefix"
    }
}

/// Pass text records matching a pattern; drop the rest.
pub struct RegexFilterTransform {
    pattern: Regex,
}

impl RegexFilterTransform {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }
}

impl Transform for RegexFilterTransform {
    fn transform(&self, record: Record) -> anyhow::Result<Option<Record>> {
        match record.as_text() {
            Some(line) if self.pattern.is_match(line) => Ok(Some(record)),
            Some(_) => Ok(None),
            None => Ok(Some(record)),
        }
    }

    fn input_format(&self) -> Format {
        Format::Text
    }

    fn output_format(&self) -> Format {
        Format::Text
    }

    fn name(&self) -> &str {
        "filter"
    }
}

/// Keep selected whitespace-separated fields of a text record, rejoined with
/// single spaces. Negative indices count from the end.
pub struct SliceTransform {
    indices: Vec<isize>,
}

impl SliceTransform {
    pub fn new(indices: Vec<isize>) -> Self {
        Self { indices }
    }
}

impl Transform for SliceTransform {
    fn transform(&self, record: Record) -> anyhow::Result<Option<Record>> {
        let Some(line) = record.as_text() else {
            return Ok(Some(record));
        };
        let parts: Vec<&str> = line.split_whitespace().collect();
        let kept: Vec<&str> = self
            .indices
            .iter()
            .filter_map(|&i| {
                let at = if i < 0 { parts.len() as isize + i } else { i };
                usize::try_from(at).ok().and_then(|at| parts.get(at).copied())
            })
            .collect();
        Ok(Some(Record::Text(kept.join(" "))))
    }

    fn input_format(&self) -> Format {
        Format::Text
    }

    fn output_format(&self) -> Format {
        Format::Text
    }

    fn name(&self) -> &str {
        "slice"
    }
}
