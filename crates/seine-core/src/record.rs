//! The unit of data flowing through the pipeline.

use serde::Serialize;
use std::collections::HashMap;

/// One record moving between pipeline stages.
///
/// At the reader/writer boundary a record is a delimited text line; once a
/// parse transform has run it becomes a mapping of field name to typed value.
/// An optional field that matched but carried nothing is stored as
/// [`serde_json::Value::Null`].
///
/// There is no in-band "drop" or "end of stream" value: transforms signal
/// a dropped record by returning `None`, and readers signal exhaustion the
/// same way.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    /// A raw text line as received from a source.
    Text(String),
    /// Structured fields produced by a parse transform.
    Fields(HashMap<String, serde_json::Value>),
}

impl Record {
    /// The record's text payload, if it is still a raw line.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Record::Text(line) => Some(line),
            Record::Fields(_) => None,
        }
    }

    /// The record's field map, if it has been parsed.
    pub fn as_fields(&self) -> Option<&HashMap<String, serde_json::Value>> {
        match self {
            Record::Text(_) => None,
            Record::Fields(fields) => Some(fields),
        }
    }

    /// Render the record as one output line: text records verbatim, field
    /// records as a JSON object.
    pub fn to_line(&self) -> String {
        match self {
            Record::Text(line) => line.clone(),
            Record::Fields(fields) => {
                serde_json::to_string(fields).unwrap_or_else(|_| String::new())
            }
        }
    }
}

impl From<&str> for Record {
    fn from(line: &str) -> Self {
        Record::Text(line.to_string())
    }
}

impl From<String> for Record {
    fn from(line: String) -> Self {
        Record::Text(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_round_trip() {
        let r = Record::from("$GPGGA,123519,4807.038,N");
        assert_eq!(r.as_text(), Some("$GPGGA,123519,4807.038,N"));
        assert_eq!(r.to_line(), "$GPGGA,123519,4807.038,N");
        assert!(r.as_fields().is_none());
    }

    #[test]
    fn fields_render_as_json() {
        let mut fields = HashMap::new();
        fields.insert("Speed".to_string(), serde_json::Value::from(8.7));
        let r = Record::Fields(fields);
        assert!(r.as_text().is_none());
        assert_eq!(r.to_line(), r#"{"Speed":8.7}"#);
    }
}
