//! Field-type converter registry.
//!
//! A [`Converter`] pairs a regex fragment with a cast from matched text to a
//! typed [`serde_json::Value`]. The template compiler wraps each fragment in
//! its own capture group, so fragments must not contain capturing groups of
//! their own. "Optional" converters use fragments that match zero characters
//! and cast empty text to `Value::Null`, the absent-field value.
//!
//! Malformed text that matched a fragment but fails its cast is logged as a
//! warning and becomes `Null`; a bad field never aborts the record.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

type CastFn = Arc<dyn Fn(&str) -> Value + Send + Sync>;

/// A named (pattern fragment, cast function) pair.
#[derive(Clone)]
pub struct Converter {
    name: String,
    fragment: String,
    cast: CastFn,
}

impl Converter {
    /// Build a converter. `fragment` is spliced into the template's compiled
    /// expression inside a fresh capture group, so it must not capture.
    pub fn new(
        name: impl Into<String>,
        fragment: impl Into<String>,
        cast: impl Fn(&str) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            fragment: fragment.into(),
            cast: Arc::new(cast),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// Cast matched text to its typed value.
    pub fn cast(&self, text: &str) -> Value {
        (self.cast)(text)
    }
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("name", &self.name)
            .field("fragment", &self.fragment)
            .finish()
    }
}

/// Read-mostly mapping from type name to converter, populated at startup.
#[derive(Debug, Clone)]
pub struct ConverterRegistry {
    converters: HashMap<String, Arc<Converter>>,
}

impl ConverterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    /// The stock converter set used by sensor sentence templates.
    ///
    /// | name | matches | value |
    /// |------|---------|-------|
    /// | `d` / `od` | required / optional signed integer | integer |
    /// | `f` / `of` | required / optional float | float |
    /// | `g` | number with sign and exponent | integer or float |
    /// | `w` / `ow` | required / optional word characters | string |
    /// | `s` | any text (lazy) | string |
    /// | `nlat` / `nlon` | NMEA `DDDMM.MMMM` coordinate | decimal degrees |
    /// | `nlat_dir` / `nlon_dir` | coordinate with `,N`/`,S`/`,E`/`,W` | signed decimal degrees |
    /// | `til_comma` | everything before the next comma | string |
    /// | `til_asterisk` | everything before the next asterisk | string |
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Converter::new("d", r"[-+]?\d+", cast_int));
        registry.register(Converter::new("od", r"[-+]?\d*", cast_optional_int));
        registry.register(Converter::new("f", r"[-+]?(?:\d+\.?\d*|\.\d+)", cast_float));
        registry.register(Converter::new("of", r"[-+]?\d*\.?\d*", cast_optional_float));
        registry.register(Converter::new(
            "g",
            r"[-+]?\d*\.?\d+(?:[Ee][-+]?\d+)?",
            cast_number,
        ));
        registry.register(Converter::new("w", r"\w+", cast_str));
        registry.register(Converter::new("ow", r"\w*", cast_optional_str));
        registry.register(Converter::new("s", r".*?", cast_str));
        registry.register(Converter::new("nlat", r"\d+(?:\.\d+)?", cast_nmea_coord));
        registry.register(Converter::new("nlon", r"\d+(?:\.\d+)?", cast_nmea_coord));
        registry.register(Converter::new(
            "nlat_dir",
            r"\d+(?:\.\d+)?,[NSEW]",
            cast_nmea_coord_dir,
        ));
        registry.register(Converter::new(
            "nlon_dir",
            r"\d+(?:\.\d+)?,[NSEW]",
            cast_nmea_coord_dir,
        ));
        registry.register(Converter::new("til_comma", r"[^,]*", cast_optional_str));
        registry.register(Converter::new("til_asterisk", r"[^*]*", cast_optional_str));
        registry
    }

    /// Add or replace a converter.
    pub fn register(&mut self, converter: Converter) {
        self.converters
            .insert(converter.name().to_string(), Arc::new(converter));
    }

    /// Look a converter up by type name.
    pub fn get(&self, name: &str) -> Option<Arc<Converter>> {
        self.converters.get(name).cloned()
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

// ---------------------------------------------------------------------------
// Cast functions
// ---------------------------------------------------------------------------

fn cast_int(text: &str) -> Value {
    match text.parse::<i64>() {
        Ok(n) => Value::from(n),
        Err(_) => {
            warn!(field = text, "unparseable integer field");
            Value::Null
        }
    }
}

fn cast_optional_int(text: &str) -> Value {
    if text.is_empty() {
        Value::Null
    } else {
        cast_int(text)
    }
}

fn cast_float(text: &str) -> Value {
    match text.parse::<f64>() {
        Ok(x) => Value::from(x),
        Err(_) => {
            warn!(field = text, "unparseable float field");
            Value::Null
        }
    }
}

fn cast_optional_float(text: &str) -> Value {
    if text.is_empty() {
        Value::Null
    } else {
        cast_float(text)
    }
}

/// Integer when the text has no fractional or exponent part, float otherwise.
fn cast_number(text: &str) -> Value {
    match text.parse::<i64>() {
        Ok(n) => Value::from(n),
        Err(_) => cast_float(text),
    }
}

fn cast_str(text: &str) -> Value {
    Value::from(text)
}

fn cast_optional_str(text: &str) -> Value {
    if text.is_empty() {
        Value::Null
    } else {
        Value::from(text)
    }
}

/// Decode an NMEA `DDDMM.MMMM` degrees-minutes coordinate to decimal degrees.
///
/// Dividing by 100 aligns the degree/minute boundary: the integer part is
/// whole degrees, the remainder is minutes scaled by 1/100, converted to
/// degrees by dividing by 0.60. Values that decode to ≥ 180 whole degrees or
/// ≥ 1.0 fractional degrees are malformed encodings and become `Null`.
fn nmea_to_degrees(text: &str) -> Option<f64> {
    let raw: f64 = text.parse().ok()?;
    let scaled = raw / 100.0;
    let degrees = scaled.trunc();
    let frac_degrees = (scaled - degrees) / 0.60;
    if degrees >= 180.0 || frac_degrees >= 1.0 {
        return None;
    }
    Some(degrees + frac_degrees)
}

fn cast_nmea_coord(text: &str) -> Value {
    match nmea_to_degrees(text) {
        Some(deg) => Value::from(deg),
        None => {
            warn!(field = text, "malformed NMEA coordinate");
            Value::Null
        }
    }
}

/// Hemisphere-aware variant: `DDDMM.MMMM,X` where `X` is N/S/E/W; West and
/// South negate the decimal value.
fn cast_nmea_coord_dir(text: &str) -> Value {
    let Some((coord, dir)) = text.rsplit_once(',') else {
        warn!(field = text, "NMEA coordinate missing ',direction' suffix");
        return Value::Null;
    };
    match nmea_to_degrees(coord) {
        Some(deg) => {
            let signed = match dir {
                "W" | "S" => -deg,
                _ => deg,
            };
            Value::from(signed)
        }
        None => {
            warn!(field = text, "malformed NMEA coordinate");
            Value::Null
        }
    }
}
