//! Image payload and the Gemini request envelope built around it.

use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;

/// Base64 image data tagged with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    data: String,
    mime_type: String,
}

impl ImagePayload {
    /// Wrap data that is already base64-encoded.
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Encode raw image bytes.
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self::new(general_purpose::STANDARD.encode(bytes), mime_type)
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

/// `generateContent` request body: one user turn with a prompt and an image.
#[derive(Debug, Clone, Serialize)]
pub struct InferenceRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Clone, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: String,
    data: String,
}

impl InferenceRequest {
    pub fn new(prompt: impl Into<String>, payload: &ImagePayload) -> Self {
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Text {
                        text: prompt.into(),
                    },
                    Part::InlineData {
                        inline_data: Blob {
                            mime_type: payload.mime_type.clone(),
                            data: payload.data.clone(),
                        },
                    },
                ],
            }],
        }
    }
}

/// Pull the generated text out of a `generateContent` response.
///
/// Returns `None` when the field is missing, not a string, or blank.
pub(crate) fn extract_description(body: &serde_json::Value) -> Option<String> {
    let text = body["candidates"][0]["content"]["parts"][0]["text"].as_str()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
