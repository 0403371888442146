use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::Value;

use crate::provider::{ImageInput, ProviderError, ProviderReply};

/// Parse a `generateContent` response into text and the first inline image.
/// Text parts are joined with newlines.
pub fn parse_generate_content(value: &Value) -> Result<ProviderReply, ProviderError> {
    let parts = match value.pointer("/candidates/0/content/parts").and_then(Value::as_array) {
        Some(parts) => parts,
        None => {
            let reason = value
                .pointer("/promptFeedback/blockReason")
                .and_then(Value::as_str)
                .unwrap_or("no candidates");
            return Err(ProviderError::Malformed(reason.to_string()));
        }
    };

    let mut texts = Vec::new();
    let mut image = None;
    for part in parts {
        if let Some(text) = part.get("text").and_then(Value::as_str) {
            if !text.trim().is_empty() {
                texts.push(text.trim().to_string());
            }
        }
        if image.is_none() {
            if let Some(inline) = part.get("inlineData").or_else(|| part.get("inline_data")) {
                image = Some(decode_inline(inline)?);
            }
        }
    }

    Ok(ProviderReply {
        text: (!texts.is_empty()).then(|| texts.join("\n")),
        image,
    })
}

fn decode_inline(inline: &Value) -> Result<ImageInput, ProviderError> {
    let data = inline
        .get("data")
        .and_then(Value::as_str)
        .ok_or_else(|| ProviderError::Malformed("inline image without data".to_string()))?;
    let mime = inline
        .get("mimeType")
        .or_else(|| inline.get("mime_type"))
        .and_then(Value::as_str)
        .unwrap_or("image/png");
    let bytes = BASE64
        .decode(data)
        .map_err(|e| ProviderError::Malformed(format!("inline image: {e}")))?;
    Ok(ImageInput {
        mime: mime.to_string(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_and_image_parts_are_collected() {
        let value = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "Here is a larger stone." },
                        { "inlineData": { "mimeType": "image/png", "data": "aGVsbG8=" } },
                        { "text": "Enjoy." }
                    ]
                }
            }]
        });
        let reply = parse_generate_content(&value).unwrap();
        assert_eq!(reply.text.as_deref(), Some("Here is a larger stone.\nEnjoy."));
        let image = reply.image.unwrap();
        assert_eq!(image.mime, "image/png");
        assert_eq!(image.bytes, b"hello");
    }

    #[test]
    fn text_only_reply_has_no_image() {
        let value = json!({ "candidates": [{ "content": { "parts": [{ "text": "no image" }] } }] });
        let reply = parse_generate_content(&value).unwrap();
        assert!(reply.image.is_none());
    }

    #[test]
    fn blocked_prompt_is_malformed() {
        let value = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        assert_eq!(
            parse_generate_content(&value),
            Err(ProviderError::Malformed("SAFETY".to_string()))
        );
    }

    #[test]
    fn bad_base64_is_reported() {
        let value = json!({
            "candidates": [{ "content": { "parts": [{ "inlineData": { "data": "***" } }] } }]
        });
        assert!(matches!(
            parse_generate_content(&value),
            Err(ProviderError::Malformed(_))
        ));
    }
}
