//! JSON import validation and export of flow documents.
//!
//! Import is a two-stage check: the text must parse as JSON and the parsed
//! object must carry `blocks` and `connections` arrays. Only then is it
//! deserialised into a [`Flow`].

use base64::Engine;
use serde_json::Value;

use crate::Flow;

pub const EXPORT_FILE_NAME: &str = "flow.json";
pub const EXPORT_MIME: &str = "application/json";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ImportError {
    #[error("JSON cannot be empty")]
    Empty,

    #[error("JSON parse error: {0}")]
    Parse(String),

    #[error("JSON must be an object")]
    NotAnObject,

    #[error("JSON must contain a \"{0}\" array")]
    MissingArray(&'static str),

    #[error("Invalid flow document: {0}")]
    Shape(String),
}

/// Shape check on an already-parsed value. Does not deserialise.
pub fn check_shape(value: &Value) -> Result<(), ImportError> {
    let obj = value.as_object().ok_or(ImportError::NotAnObject)?;
    for key in ["blocks", "connections"] {
        if !obj.get(key).is_some_and(Value::is_array) {
            return Err(ImportError::MissingArray(key));
        }
    }
    Ok(())
}

/// Validate JSON text and turn it into a flow.
pub fn parse_flow(text: &str) -> Result<Flow, ImportError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ImportError::Empty);
    }
    let value: Value = serde_json::from_str(text).map_err(|e| ImportError::Parse(e.to_string()))?;
    check_shape(&value)?;
    serde_json::from_value(value).map_err(|e| ImportError::Shape(e.to_string()))
}

/// Pretty-printed (2-space indent) JSON of the flow.
pub fn export_json(flow: &Flow) -> String {
    // Flow contains only strings, vectors and options; serialisation cannot fail.
    serde_json::to_string_pretty(flow).unwrap_or_else(|_| "{}".to_string())
}

/// Everything needed to hand the export to a download sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub file_name: String,
    pub mime: String,
    pub contents: String,
}

impl Download {
    pub fn of(flow: &Flow) -> Self {
        Self {
            file_name: EXPORT_FILE_NAME.to_string(),
            mime: EXPORT_MIME.to_string(),
            contents: export_json(flow),
        }
    }

    pub fn data_uri(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(self.contents.as_bytes());
        format!("data:{};charset=utf-8;base64,{}", self.mime, encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn rejects_missing_connections() {
        let err = parse_flow(r#"{"blocks": []}"#).unwrap_err();
        assert_eq!(err, ImportError::MissingArray("connections"));
        assert_eq!(err.to_string(), "JSON must contain a \"connections\" array");
    }

    #[test]
    fn rejects_non_array_blocks() {
        let err = parse_flow(r#"{"blocks": {}, "connections": []}"#).unwrap_err();
        assert_eq!(err, ImportError::MissingArray("blocks"));
    }

    #[test]
    fn reports_parser_message() {
        let err = parse_flow("{not json").unwrap_err();
        assert_matches!(err, ImportError::Parse(msg) if msg.contains("line 1"));
    }

    #[test]
    fn rejects_arrays_and_blank_input() {
        assert_eq!(parse_flow("[]").unwrap_err(), ImportError::NotAnObject);
        assert_eq!(parse_flow("   ").unwrap_err(), ImportError::Empty);
    }

    #[test]
    fn typed_failure_is_a_shape_error() {
        let text = r#"{"blocks":[{"id":"a","inputData":{"format":"xml"}}],"connections":[]}"#;
        assert_matches!(parse_flow(text), Err(ImportError::Shape(_)));
    }

    #[test]
    fn export_uses_two_space_indent() {
        let json = export_json(&Flow::default());
        assert!(json.contains("\n  \"title\": \"New data flow\""));
    }

    #[test]
    fn data_uri_decodes_back_to_export() {
        let download = Download::of(&Flow::default());
        let uri = download.data_uri();
        let encoded = uri.split_once("base64,").unwrap().1;
        let decoded = base64::engine::general_purpose::STANDARD.decode(encoded).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), download.contents);
        assert_eq!(download.file_name, "flow.json");
    }
}
