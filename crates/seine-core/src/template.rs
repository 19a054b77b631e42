//! Format-template compiler with a bounded compilation cache.
//!
//! A template is literal text interleaved with `{name:type}` placeholders,
//! where `type` names a converter in the registry. Compilation produces one
//! anchored regex plus an ordered list of casts; matching a sentence yields a
//! field-name → value map.
//!
//! Compiled templates are memoized by the literal template string. When the
//! cache exceeds its entry ceiling it is cleared wholesale and rebuilt lazily;
//! nothing depends on cache retention for correctness, so clear-all beats the
//! bookkeeping of per-entry eviction here.

use crate::converters::{Converter, ConverterRegistry};
use crate::error::TemplateError;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Cache ceiling used by [`Parser::new`].
pub const DEFAULT_CACHE_LIMIT: usize = 512;

/// One placeholder's slot in a compiled template.
#[derive(Debug, Clone)]
pub(crate) struct FieldSpec {
    /// Placeholder name as written in the template.
    pub(crate) name: String,
    /// Synthetic regex group name (`f0`, `f1`, …). Placeholder names may
    /// contain characters a group name cannot.
    pub(crate) group: String,
    pub(crate) converter: Arc<Converter>,
}

/// A compiled format template: anchored matcher plus ordered casts.
#[derive(Debug)]
pub struct CompiledTemplate {
    template: String,
    regex: Regex,
    fields: Vec<FieldSpec>,
}

impl CompiledTemplate {
    /// The source template string this was compiled from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Match a sentence against the template. `None` means no match; a
    /// successful match maps each placeholder name to its cast value.
    pub fn matches(&self, input: &str) -> Option<HashMap<String, Value>> {
        let caps = self.regex.captures(input)?;
        let mut out = HashMap::with_capacity(self.fields.len());
        for field in &self.fields {
            let value = match caps.name(&field.group) {
                Some(m) => field.converter.cast(m.as_str()),
                None => Value::Null,
            };
            out.insert(field.name.clone(), value);
        }
        Some(out)
    }
}

/// Translate a template into an unanchored pattern body and its field list.
///
/// Literal spans are regex-escaped; each placeholder becomes a named capture
/// group wrapping its converter's fragment. `{{` and `}}` escape literal
/// braces.
pub(crate) fn build_pattern(
    template: &str,
    registry: &ConverterRegistry,
) -> Result<(String, Vec<FieldSpec>), TemplateError> {
    let mut pattern = String::new();
    let mut fields: Vec<FieldSpec> = Vec::new();
    let mut literal = String::new();
    let mut chars = template.char_indices().peekable();

    while let Some((at, ch)) = chars.next() {
        match ch {
            '{' => {
                if let Some(&(_, '{')) = chars.peek() {
                    chars.next();
                    literal.push('{');
                    continue;
                }
                pattern.push_str(&regex::escape(&literal));
                literal.clear();

                let mut inner = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    inner.push(c);
                }
                if !closed {
                    return Err(TemplateError::Unterminated(at));
                }
                let Some((name, field_type)) = inner.split_once(':') else {
                    return Err(TemplateError::MissingType(inner));
                };
                let converter =
                    registry
                        .get(field_type)
                        .ok_or_else(|| TemplateError::UnknownType {
                            name: name.to_string(),
                            field_type: field_type.to_string(),
                        })?;

                let group = format!("f{}", fields.len());
                pattern.push_str(&format!("(?P<{group}>{})", converter.fragment()));
                fields.push(FieldSpec {
                    name: name.to_string(),
                    group,
                    converter,
                });
            }
            '}' => {
                if let Some(&(_, '}')) = chars.peek() {
                    chars.next();
                }
                literal.push('}');
            }
            other => literal.push(other),
        }
    }
    pattern.push_str(&regex::escape(&literal));
    Ok((pattern, fields))
}

fn compile(
    template: &str,
    registry: &ConverterRegistry,
) -> Result<CompiledTemplate, TemplateError> {
    let (body, fields) = build_pattern(template, registry)?;
    let regex = Regex::new(&format!("^{body}$"))?;
    Ok(CompiledTemplate {
        template: template.to_string(),
        regex,
        fields,
    })
}

// ---------------------------------------------------------------------------
// Bounded cache
// ---------------------------------------------------------------------------

/// Size-bounded memo of compiled templates, keyed by template string.
#[derive(Debug)]
struct TemplateCache {
    entries: HashMap<String, Arc<CompiledTemplate>>,
    limit: usize,
}

impl TemplateCache {
    fn new(limit: usize) -> Self {
        Self {
            entries: HashMap::new(),
            limit,
        }
    }

    fn get(&self, template: &str) -> Option<Arc<CompiledTemplate>> {
        self.entries.get(template).cloned()
    }

    /// Insert, clearing the whole cache first if the ceiling is hit.
    fn insert(&mut self, compiled: Arc<CompiledTemplate>) {
        if self.entries.len() >= self.limit {
            debug!(entries = self.entries.len(), "template cache full; clearing");
            self.entries.clear();
        }
        self.entries
            .insert(compiled.template().to_string(), compiled);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Template compiler front end: owns the converter registry and the bounded
/// compilation cache. Shareable across threads.
#[derive(Debug)]
pub struct Parser {
    registry: ConverterRegistry,
    cache: Mutex<TemplateCache>,
}

impl Parser {
    /// A parser over the given registry with the default cache ceiling.
    pub fn new(registry: ConverterRegistry) -> Self {
        Self {
            registry,
            cache: Mutex::new(TemplateCache::new(DEFAULT_CACHE_LIMIT)),
        }
    }

    /// Override the cache entry ceiling.
    pub fn with_cache_limit(registry: ConverterRegistry, limit: usize) -> Self {
        Self {
            registry,
            cache: Mutex::new(TemplateCache::new(limit)),
        }
    }

    pub(crate) fn registry(&self) -> &ConverterRegistry {
        &self.registry
    }

    /// Compile a template, reusing the cached compilation when present.
    pub fn compile(&self, template: &str) -> Result<Arc<CompiledTemplate>, TemplateError> {
        let mut cache = self.cache.lock().unwrap();
        if let Some(hit) = cache.get(template) {
            return Ok(hit);
        }
        let compiled = Arc::new(compile(template, &self.registry)?);
        cache.insert(compiled.clone());
        Ok(compiled)
    }

    /// Compile (or fetch) and match in one step.
    pub fn parse(
        &self,
        template: &str,
        input: &str,
    ) -> Result<Option<HashMap<String, Value>>, TemplateError> {
        Ok(self.compile(template)?.matches(input))
    }

    /// Number of cached compilations. Exposed for tests and metrics.
    pub fn cached_templates(&self) -> usize {
        self.cache.lock().unwrap().len()
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(ConverterRegistry::with_builtins())
    }
}
