use super::BridgeError;
use super::error::bridge_error;
use super::message::BridgeMessage;
use serde_json::Value;

/// Result of decoding one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Message(BridgeMessage),
    /// Well-formed envelope with a `type` this side does not understand.
    Unknown(String),
    Malformed(String),
}

pub fn encode(message: &BridgeMessage) -> Result<String, BridgeError> {
    serde_json::to_string(message).map_err(|err| bridge_error("encode_failed", err.to_string()))
}

pub fn decode(frame: &str) -> Decoded {
    let value: Value = match serde_json::from_str(frame) {
        Ok(value) => value,
        Err(err) => return Decoded::Malformed(format!("invalid JSON: {err}")),
    };
    if !value.is_object() {
        return Decoded::Malformed("envelope is not a JSON object".to_string());
    }
    let tag = match value.get("type").and_then(Value::as_str) {
        Some(tag) => tag.to_string(),
        None => return Decoded::Malformed("missing string `type` field".to_string()),
    };
    if !BridgeMessage::TAGS.contains(&tag.as_str()) {
        return Decoded::Unknown(tag);
    }
    match serde_json::from_value::<BridgeMessage>(value) {
        Ok(message) => Decoded::Message(message),
        Err(err) => Decoded::Malformed(format!("invalid `{tag}` payload: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThemeMode;

    #[test]
    fn decodes_wire_examples() {
        assert_eq!(
            decode(r#"{"type":"pageChange","page":3,"totalPages":40}"#),
            Decoded::Message(BridgeMessage::PageChanged {
                page: 3,
                total_pages: 40
            })
        );
        assert_eq!(
            decode(r#"{"type":"pdfLoaded","totalPages":40}"#),
            Decoded::Message(BridgeMessage::DocumentLoaded { total_pages: 40 })
        );
        assert_eq!(
            decode(r#"{"type":"goToPage","page":7}"#),
            Decoded::Message(BridgeMessage::GoToPage { page: 7 })
        );
        assert_eq!(
            decode(r#"{"type":"changeTheme","theme":"sepia"}"#),
            Decoded::Message(BridgeMessage::ChangeTheme {
                theme: Some(ThemeMode::Sepia)
            })
        );
    }

    #[test]
    fn extra_fields_are_tolerated() {
        assert_eq!(
            decode(r#"{"type":"reload","source":"viewer"}"#),
            Decoded::Message(BridgeMessage::Reload)
        );
    }

    #[test]
    fn unknown_type_is_reported_separately() {
        assert_eq!(
            decode(r#"{"type":"annotationAdded","id":4}"#),
            Decoded::Unknown("annotationAdded".to_string())
        );
    }

    #[test]
    fn malformed_frames_never_panic() {
        for frame in [
            "",
            "not json",
            "[1,2,3]",
            "42",
            r#"{"page":3}"#,
            r#"{"type":7}"#,
            r#"{"type":"pageChange","page":"three","totalPages":40}"#,
            r#"{"type":"pageChange","page":-1,"totalPages":40}"#,
            r#"{"type":"pdfLoaded"}"#,
        ] {
            assert!(
                matches!(decode(frame), Decoded::Malformed(_)),
                "expected malformed for {frame:?}"
            );
        }
    }

    #[test]
    fn encode_produces_decodable_frame() {
        let message = BridgeMessage::ChangeFontSize { delta: 2 };
        let frame = encode(&message).expect("encode");
        assert_eq!(frame, r#"{"type":"changeFontSize","delta":2}"#);
        assert_eq!(decode(&frame), Decoded::Message(message));
    }
}
