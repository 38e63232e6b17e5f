//! Encoding of list-valued log point columns.
//!
//! Targeting filters and webhook ids are stored as a single JSON array in a
//! text column. Blank or `null` stored text is an empty list; any other text
//! that does not parse as an array indicates storage-level corruption and is
//! surfaced as an error rather than coerced to empty.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors produced by the list-column codec
#[derive(Error, Debug)]
pub enum CodecError {
    /// Stored text is non-blank but does not parse as a JSON array
    #[error("malformed stored list: {0}")]
    Malformed(#[source] serde_json::Error),

    /// A list failed to serialize (unreachable for the crate's own types)
    #[error("unencodable list: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Encode an ordered list as its stored column text.
///
/// The empty list encodes to `[]`, never to blank text, so the encoding of
/// any list round-trips through [`decode_list`].
pub fn encode_list<T: Serialize>(values: &[T]) -> Result<String, CodecError> {
    serde_json::to_string(values).map_err(CodecError::Encode)
}

/// Decode a stored column text into an ordered list.
///
/// Absent, blank, and JSON `null` text all decode to the empty list; callers
/// never see a null-vs-empty distinction.
pub fn decode_list<T: DeserializeOwned>(raw: Option<&str>) -> Result<Vec<T>, CodecError> {
    let text = match raw {
        Some(text) if !text.trim().is_empty() => text,
        _ => return Ok(Vec::new()),
    };

    serde_json::from_str::<Option<Vec<T>>>(text)
        .map(|list| list.unwrap_or_default())
        .map_err(CodecError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ApplicationFilter;

    #[test]
    fn test_round_trip_filters() {
        let filters = vec![
            ApplicationFilter {
                name: Some("billing".to_string()),
                version: Some("1.4.2".to_string()),
                ..Default::default()
            },
            ApplicationFilter {
                stage: Some("prod".to_string()),
                ..Default::default()
            },
        ];

        let encoded = encode_list(&filters).unwrap();
        let decoded: Vec<ApplicationFilter> = decode_list(Some(&encoded)).unwrap();
        assert_eq!(decoded, filters);
    }

    #[test]
    fn test_round_trip_empty_list() {
        let encoded = encode_list::<String>(&[]).unwrap();
        assert_eq!(encoded, "[]");

        let decoded: Vec<String> = decode_list(Some(&encoded)).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_round_trip_webhook_ids() {
        let ids = vec!["wh-1".to_string(), "wh-2".to_string()];
        let encoded = encode_list(&ids).unwrap();
        let decoded: Vec<String> = decode_list(Some(&encoded)).unwrap();
        assert_eq!(decoded, ids);
    }

    #[test]
    fn test_blank_and_absent_decode_to_empty() {
        assert!(decode_list::<String>(None).unwrap().is_empty());
        assert!(decode_list::<String>(Some("")).unwrap().is_empty());
        assert!(decode_list::<String>(Some("   ")).unwrap().is_empty());
        assert!(decode_list::<String>(Some("null")).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_text_is_an_error() {
        let result = decode_list::<String>(Some(r#"[{"oops"#));
        assert!(matches!(result, Err(CodecError::Malformed(_))));

        let result = decode_list::<String>(Some("not json at all"));
        assert!(matches!(result, Err(CodecError::Malformed(_))));
    }
}
