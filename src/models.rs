//! # Core Gemini API Data Primitives
//!
//! This module defines the building blocks shared by requests and responses:
//! [`Content`], [`Part`], [`Blob`] and [`Role`]. A `Content` is one
//! conversation turn; its parts are sent in the order they were added, which
//! matters for how the model reads mixed media and text.

use base64::{engine::general_purpose, Engine as _};
use mime::Mime;
use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message from the user
    User,
    /// Message from the model
    Model,
}

/// Content part that can be included in a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Part {
    /// Text content
    Text {
        /// The text content
        text: String,
        /// Whether this is a thought summary (Gemini 2.5 series only)
        #[serde(skip_serializing_if = "Option::is_none")]
        thought: Option<bool>,
        /// The thought signature for the text (Gemini 2.5 series only)
        #[serde(rename = "thoughtSignature", skip_serializing_if = "Option::is_none")]
        thought_signature: Option<String>,
    },
    /// Inline binary data such as an image
    InlineData {
        /// The blob data
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
    /// A part kind this crate does not model (function calls, code execution, ...).
    ///
    /// Kept as raw JSON so that responses carrying such parts still deserialize.
    Other(serde_json::Value),
}

impl Part {
    /// Create a plain text part.
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text {
            text: text.into(),
            thought: None,
            thought_signature: None,
        }
    }

    /// Create an inline data part from raw bytes, encoding them as base64.
    pub fn inline_bytes(mime_type: &Mime, bytes: impl AsRef<[u8]>) -> Self {
        Part::InlineData {
            inline_data: Blob::from_bytes(mime_type, bytes),
        }
    }

    /// Returns the text if this is a non-thought text part.
    pub fn as_answer_text(&self) -> Option<&str> {
        match self {
            Part::Text {
                text,
                thought: None | Some(false),
                ..
            } => Some(text),
            _ => None,
        }
    }
}

/// Blob for a message part
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    /// The MIME type of the data
    pub mime_type: String,
    /// Base64 encoded data
    pub data: String,
}

impl Blob {
    /// Create a new blob with mime type and already encoded data
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Create a new blob from raw bytes.
    pub fn from_bytes(mime_type: &Mime, bytes: impl AsRef<[u8]>) -> Self {
        Self {
            mime_type: mime_type.essence_str().to_string(),
            data: general_purpose::STANDARD.encode(bytes),
        }
    }
}

/// Content of a message
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    /// Parts of the content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<Part>>,
    /// Role of the content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl Content {
    /// Create a new text content
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            parts: Some(vec![Part::text(text)]),
            role: None,
        }
    }

    /// Create a new content with inline data (base64 encoded blob data)
    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            parts: Some(vec![Part::InlineData {
                inline_data: Blob::new(mime_type, data),
            }]),
            role: None,
        }
    }

    /// Create a content from an ordered list of parts attributed to one role.
    pub fn from_parts(parts: Vec<Part>, role: Role) -> Self {
        Self {
            parts: Some(parts),
            role: Some(role),
        }
    }

    /// Add a role to this content
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// The parts of this content, empty if there are none.
    pub fn parts(&self) -> &[Part] {
        self.parts.as_deref().unwrap_or_default()
    }
}
