//! Reading the server-assigned ID out of a create response.
//!
//! The service answers in JSON or XML depending on its configuration, so
//! both are understood. The declared content type picks the first strategy
//! and the other one is tried when it yields nothing.

use once_cell::sync::Lazy;
use regex::Regex;

static XML_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r#"Id="(\d+)""#).unwrap());

/// Response body format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdFormat {
    Json,
    Xml,
}

impl IdFormat {
    /// Pick a format from the content type, sniffing the body if that is
    /// missing or inconclusive.
    pub fn detect(content_type: Option<&str>, body: &str) -> Self {
        match content_type.map(str::to_ascii_lowercase) {
            Some(ct) if ct.contains("json") => Self::Json,
            Some(ct) if ct.contains("xml") => Self::Xml,
            _ if body.trim_start().starts_with('<') => Self::Xml,
            _ => Self::Json,
        }
    }

    fn decode(self, body: &str) -> Option<u64> {
        match self {
            Self::Json => decode_json_id(body),
            Self::Xml => decode_xml_id(body),
        }
    }

    fn other(self) -> Self {
        match self {
            Self::Json => Self::Xml,
            Self::Xml => Self::Json,
        }
    }
}

/// `{"Id": 123}` or `{"Id": "123"}`.
pub fn decode_json_id(body: &str) -> Option<u64> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("Id")? {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// First `Id="123"` attribute in an XML fragment.
pub fn decode_xml_id(body: &str) -> Option<u64> {
    XML_ID.captures(body)?.get(1)?.as_str().parse().ok()
}

/// Decode a created item's ID, defaulting to 0.
pub fn decode_created_id(content_type: Option<&str>, body: &str) -> u64 {
    let format = IdFormat::detect(content_type, body);
    format.decode(body).or_else(|| format.other().decode(body)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<Epic Id="4711" Name="Signup"><Project Id="12" /></Epic>"#;

    #[test]
    fn test_json_number_and_string() {
        assert_eq!(decode_json_id(r#"{"Id": 42, "Name": "x"}"#), Some(42));
        assert_eq!(decode_json_id(r#"{"Id": "43"}"#), Some(43));
        assert_eq!(decode_json_id(r#"{"Id": null}"#), None);
        assert_eq!(decode_json_id(r#"{"id": 42}"#), None);
    }

    #[test]
    fn test_xml_takes_first_id() {
        assert_eq!(decode_xml_id(XML), Some(4711));
        assert_eq!(decode_xml_id("<Epic Name=\"x\" />"), None);
    }

    #[test]
    fn test_detect() {
        assert_eq!(IdFormat::detect(Some("application/json; charset=utf-8"), ""), IdFormat::Json);
        assert_eq!(IdFormat::detect(Some("application/xml"), "{}"), IdFormat::Xml);
        assert_eq!(IdFormat::detect(None, "  <Project />"), IdFormat::Xml);
        assert_eq!(IdFormat::detect(Some("text/plain"), "{}"), IdFormat::Json);
    }

    #[test]
    fn test_decode_created_id() {
        assert_eq!(decode_created_id(Some("application/json"), r#"{"Id": 7}"#), 7);
        assert_eq!(decode_created_id(None, XML), 4711);
        // mislabeled body falls back to the other strategy
        assert_eq!(decode_created_id(Some("application/json"), XML), 4711);
        assert_eq!(decode_created_id(Some("text/html"), "<html>oops</html>"), 0);
        assert_eq!(decode_created_id(None, ""), 0);
    }
}
