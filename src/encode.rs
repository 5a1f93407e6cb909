use std::fmt;

use bytes::Bytes;
use serde::Serialize;

use crate::error::EncodeError;

/// Wire format used to encode the request body and pick the default `Accept`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum BodyFormat {
    #[default]
    Json,
    Xml,
    Plain,
}

impl BodyFormat {
    /// Parses a format tag; anything unrecognized falls back to JSON.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "xml" => Self::Xml,
            "plain" | "text" => Self::Plain,
            _ => Self::Json,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "application/xml",
            Self::Plain => "text/plain",
        }
    }

    /// Value used for `Accept` when the caller does not set one.
    pub fn accept(self) -> &'static str {
        self.content_type()
    }
}

/// A value the JSON and XML encoders can both serialize.
///
/// Implemented for every `serde::Serialize` type.
pub trait StructuredBody {
    fn to_json(&self) -> Result<Vec<u8>, EncodeError>;
    fn to_xml(&self) -> Result<String, EncodeError>;
}

impl<T: Serialize + ?Sized> StructuredBody for T {
    fn to_json(&self) -> Result<Vec<u8>, EncodeError> {
        serde_json::to_vec(self).map_err(EncodeError::Json)
    }

    fn to_xml(&self) -> Result<String, EncodeError> {
        quick_xml::se::to_string(self).map_err(xml_error)
    }
}

/// Root element wrapping bare text under XML, as in `<string>hi</string>`.
pub const XML_TEXT_ROOT: &str = "string";

fn xml_error<E: std::error::Error + Send + Sync + 'static>(err: E) -> EncodeError {
    EncodeError::Xml(Box::new(err))
}

/// Request body handed to [`Request::perform`](crate::Request::perform).
#[derive(Clone, Copy, Default)]
pub enum Body<'a> {
    #[default]
    Empty,
    Text(&'a str),
    Bytes(&'a [u8]),
    Value(&'a (dyn StructuredBody + Sync)),
}

impl<'a> Body<'a> {
    pub fn text(text: &'a str) -> Self {
        Self::Text(text)
    }

    pub fn bytes(bytes: &'a [u8]) -> Self {
        Self::Bytes(bytes)
    }

    /// Structured body for the JSON or XML encoder.
    pub fn value<T: Serialize + Sync>(value: &'a T) -> Self {
        Self::Value(value)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl fmt::Debug for Body<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            Self::Value(_) => f.write_str("Value(..)"),
        }
    }
}

impl<'a> From<&'a str> for Body<'a> {
    fn from(text: &'a str) -> Self {
        Self::Text(text)
    }
}

impl<'a> From<&'a String> for Body<'a> {
    fn from(text: &'a String) -> Self {
        Self::Text(text)
    }
}

impl<'a> From<&'a [u8]> for Body<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for Body<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

/// Encoded payload replayed unchanged on every attempt.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EncodedBody {
    pub payload: Bytes,
    pub content_type: &'static str,
}

/// Encodes `body` for `format`; `Body::Empty` yields `None`.
///
/// Under JSON, text becomes a JSON string and bytes a JSON array of numbers.
/// Under XML, text is wrapped in an [`XML_TEXT_ROOT`] element. Raw bytes and
/// values without a type name (maps, sequences) have no element name and are
/// rejected with [`EncodeError::Xml`].
pub fn encode_body(
    format: BodyFormat,
    body: &Body<'_>,
) -> Result<Option<EncodedBody>, EncodeError> {
    let payload = match (format, *body) {
        (_, Body::Empty) => return Ok(None),
        (BodyFormat::Plain, Body::Text(text)) => Bytes::copy_from_slice(text.as_bytes()),
        (BodyFormat::Plain, Body::Bytes(bytes)) => Bytes::copy_from_slice(bytes),
        (BodyFormat::Plain, Body::Value(_)) => return Err(EncodeError::PlainBody),
        (BodyFormat::Json, Body::Text(text)) => Bytes::from(text.to_json()?),
        (BodyFormat::Json, Body::Bytes(bytes)) => Bytes::from(bytes.to_json()?),
        (BodyFormat::Json, Body::Value(value)) => Bytes::from(value.to_json()?),
        (BodyFormat::Xml, Body::Text(text)) => Bytes::from(
            quick_xml::se::to_string_with_root(XML_TEXT_ROOT, text).map_err(xml_error)?,
        ),
        (BodyFormat::Xml, Body::Bytes(bytes)) => Bytes::from(bytes.to_xml()?),
        (BodyFormat::Xml, Body::Value(value)) => Bytes::from(value.to_xml()?),
    };

    Ok(Some(EncodedBody {
        payload,
        content_type: format.content_type(),
    }))
}

#[cfg(test)]
mod tests {
    use serde::Serialize;
    use serde_json::json;

    use super::{encode_body, Body, BodyFormat};
    use crate::error::EncodeError;

    #[derive(Serialize)]
    struct Item {
        name: String,
        qty: u32,
    }

    #[test]
    fn unknown_tag_defaults_to_json() {
        assert_eq!(BodyFormat::from_tag("xml"), BodyFormat::Xml);
        assert_eq!(BodyFormat::from_tag(" PLAIN "), BodyFormat::Plain);
        assert_eq!(BodyFormat::from_tag("yaml"), BodyFormat::Json);
        assert_eq!(BodyFormat::from_tag(""), BodyFormat::Json);
        assert_eq!(BodyFormat::default(), BodyFormat::Json);
    }

    #[test]
    fn empty_body_skips_encoding() {
        for format in [BodyFormat::Json, BodyFormat::Xml, BodyFormat::Plain] {
            assert_eq!(encode_body(format, &Body::Empty).expect("encodes"), None);
        }
    }

    #[test]
    fn json_value_encoding() {
        let value = json!({"x": 1});
        let encoded = encode_body(BodyFormat::Json, &Body::value(&value))
            .expect("encodes")
            .expect("has payload");
        assert_eq!(&encoded.payload[..], br#"{"x":1}"#);
        assert_eq!(encoded.content_type, "application/json");
    }

    #[test]
    fn json_text_is_a_json_string() {
        let encoded = encode_body(BodyFormat::Json, &Body::text("hi"))
            .expect("encodes")
            .expect("has payload");
        assert_eq!(&encoded.payload[..], br#""hi""#);
    }

    #[test]
    fn xml_struct_encoding() {
        let item = Item {
            name: "kit".to_owned(),
            qty: 2,
        };
        let encoded = encode_body(BodyFormat::Xml, &Body::value(&item))
            .expect("encodes")
            .expect("has payload");
        let text = std::str::from_utf8(&encoded.payload).expect("utf-8");
        assert!(text.starts_with("<Item>"), "{text}");
        assert!(text.contains("<name>kit</name>"), "{text}");
        assert_eq!(encoded.content_type, "application/xml");
    }

    #[test]
    fn xml_text_is_wrapped_in_string_element() {
        let encoded = encode_body(BodyFormat::Xml, &Body::text("hi"))
            .expect("encodes")
            .expect("has payload");
        assert_eq!(&encoded.payload[..], b"<string>hi</string>");
        assert_eq!(encoded.content_type, "application/xml");

        let escaped = encode_body(BodyFormat::Xml, &Body::text("a<b"))
            .expect("encodes")
            .expect("has payload");
        assert_eq!(&escaped.payload[..], b"<string>a&lt;b</string>");
    }

    #[test]
    fn xml_rejects_values_without_element_name() {
        let err = encode_body(BodyFormat::Xml, &Body::bytes(b"ab"))
            .expect_err("bytes have no element name");
        assert!(matches!(err, EncodeError::Xml(_)));
        assert!(err.to_string().starts_with("xml marshal: "), "{err}");

        let map = json!({"a": 1});
        let err = encode_body(BodyFormat::Xml, &Body::value(&map))
            .expect_err("maps have no element name");
        assert!(matches!(err, EncodeError::Xml(_)));
    }

    #[test]
    fn plain_accepts_text_and_bytes() {
        let text = encode_body(BodyFormat::Plain, &Body::text("hello"))
            .expect("encodes")
            .expect("has payload");
        assert_eq!(&text.payload[..], b"hello");
        assert_eq!(text.content_type, "text/plain");

        let raw = [0u8, 159, 146, 150];
        let bytes = encode_body(BodyFormat::Plain, &Body::bytes(&raw))
            .expect("encodes")
            .expect("has payload");
        assert_eq!(&bytes.payload[..], &raw);
    }

    #[test]
    fn plain_rejects_structured_values() {
        let value = json!({"x": 1});
        let err = encode_body(BodyFormat::Plain, &Body::value(&value)).expect_err("must fail");
        assert!(matches!(err, EncodeError::PlainBody));
    }

    #[test]
    fn encoding_is_repeatable() {
        let item = Item {
            name: "kit".to_owned(),
            qty: 2,
        };
        for format in [BodyFormat::Json, BodyFormat::Xml] {
            let first = encode_body(format, &Body::value(&item))
                .expect("encodes")
                .expect("has payload");
            let second = encode_body(format, &Body::value(&item))
                .expect("encodes")
                .expect("has payload");
            assert_eq!(first, second);
        }
    }
}
