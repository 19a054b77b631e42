//! Longest-prefix diagnostic matcher.
//!
//! When a sentence fails to match its template outright, operators need to
//! know *where* parsing diverged. [`Parser::diagnose`] shortens the template
//! one trailing character at a time, appends a synthetic match-anything tail,
//! and reports the first (longest) truncation that matches: the fields
//! recovered so far, the input offset where real parsing stopped, and the
//! surviving template prefix. That is enough to render a caret under the first
//! unparsed character.
//!
//! Each attempt is a full regex match, so the search is O(n²) in template
//! length. Templates are short, human-authored sentence grammars; this is a
//! diagnostic path, not a hot one.

use crate::template::{build_pattern, Parser};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

/// Outcome of diagnosing one sentence against one template.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnosis {
    /// The sentence matched the full template after all.
    Full { fields: HashMap<String, Value> },
    /// A proper prefix of the template matched.
    Partial(PartialMatch),
    /// Not even the first character of the template matched.
    NoMatch,
}

/// The longest matching template prefix and what it recovered.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialMatch {
    /// Field values recovered from the placeholders inside the prefix.
    pub fields: HashMap<String, Value>,
    /// Byte offset in the *input* up to which the prefix's real placeholders
    /// (or, with no placeholders, its literal text) extend. The first
    /// unparsed character sits at this offset.
    pub matched_to: usize,
    /// The truncated template text that matched.
    pub template_prefix: String,
}

impl Parser {
    /// Explain how far `input` gets through `template`.
    ///
    /// Compilation errors in the full template are reported to the caller;
    /// truncations that cut a placeholder mid-token simply fail to compile
    /// and are skipped, so the search granularity is one character of
    /// template text.
    pub fn diagnose(
        &self,
        template: &str,
        input: &str,
    ) -> Result<Diagnosis, crate::error::TemplateError> {
        if let Some(fields) = self.compile(template)?.matches(input) {
            return Ok(Diagnosis::Full { fields });
        }

        // Prefix lengths in descending order, excluding the full template
        // (already failed) and the empty prefix (matches vacuously and
        // explains nothing).
        let cut_points: Vec<usize> = template
            .char_indices()
            .map(|(at, _)| at)
            .filter(|&at| at > 0)
            .collect();

        for &cut in cut_points.iter().rev() {
            let prefix = &template[..cut];
            let Ok((body, fields)) = build_pattern(prefix, self.registry()) else {
                continue;
            };
            let Ok(regex) = Regex::new(&format!("^{body}(?P<tail>(?s:.*))$")) else {
                continue;
            };
            let Some(caps) = regex.captures(input) else {
                continue;
            };

            let mut recovered = HashMap::new();
            let mut last_end = None;
            for field in &fields {
                if let Some(m) = caps.name(&field.group) {
                    last_end = Some(last_end.map_or(m.end(), |e: usize| e.max(m.end())));
                    recovered.insert(field.name.clone(), field.converter.cast(m.as_str()));
                }
            }
            let matched_to = match last_end {
                Some(end) => end,
                // No placeholder in the prefix: boundary is where the
                // literal text ran out, i.e. where the tail begins.
                None => caps.name("tail").map(|m| m.start()).unwrap_or(0),
            };

            return Ok(Diagnosis::Partial(PartialMatch {
                fields: recovered,
                matched_to,
                template_prefix: prefix.to_string(),
            }));
        }

        Ok(Diagnosis::NoMatch)
    }
}
