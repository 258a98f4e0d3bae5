//! Request body payloads and their content-type specific serialization.

use reqwest::multipart::Form;

use super::data::Data;

pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Selects how a [`Body`] is put on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentType {
    /// `multipart/form-data` built from [`Body::data`].
    Multipart,
    /// `application/x-www-form-urlencoded` built from [`Body::data`].
    Urlencoded,
    /// [`Body::raw`] sent unchanged.
    #[default]
    Raw,
}

#[derive(Debug, Default)]
pub struct Body {
    pub content_type: ContentType,
    /// Fields for the two form content types.
    pub data: Data,
    /// Payload for [`ContentType::Raw`].
    pub raw: String,
}

/// Encoded request content.
#[derive(Debug)]
pub enum Payload {
    Bytes(Vec<u8>),
    /// Streamed by reqwest; the boundary is already fixed.
    Multipart(Form),
}

impl Payload {
    /// The encoded bytes, or `None` for a multipart form.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Payload::Bytes(bytes) => Some(bytes),
            Payload::Multipart(_) => None,
        }
    }
}

/// A body ready to send, together with the content-type it was encoded as.
#[derive(Debug)]
pub struct SerializedBody {
    pub payload: Payload,
    /// Empty for raw bodies.
    pub content_type: String,
}

impl Body {
    pub fn urlencoded(data: Data) -> Self {
        Self {
            content_type: ContentType::Urlencoded,
            data,
            raw: String::new(),
        }
    }

    pub fn multipart(data: Data) -> Self {
        Self {
            content_type: ContentType::Multipart,
            data,
            raw: String::new(),
        }
    }

    pub fn raw(raw: impl Into<String>) -> Self {
        Self {
            content_type: ContentType::Raw,
            data: Data::new(),
            raw: raw.into(),
        }
    }

    pub fn copy(&self) -> Self {
        Self {
            content_type: self.content_type,
            data: self.data.copy(),
            raw: self.raw.clone(),
        }
    }

    /// Encodes the body according to its content type.
    ///
    /// The body itself is left untouched; the resolved content-type is
    /// returned alongside the payload.
    pub fn serialize(&self) -> SerializedBody {
        match self.content_type {
            ContentType::Urlencoded => SerializedBody {
                payload: Payload::Bytes(self.data.link().into_bytes()),
                content_type: FORM_URLENCODED.to_string(),
            },
            ContentType::Multipart => {
                let form = self
                    .data
                    .sorted()
                    .into_iter()
                    .fold(Form::new(), |form, (name, value)| {
                        form.text(name.to_string(), value.to_string())
                    });
                let content_type =
                    format!("{}; boundary={}", MULTIPART_FORM_DATA, form.boundary());
                SerializedBody {
                    payload: Payload::Multipart(form),
                    content_type,
                }
            }
            ContentType::Raw => SerializedBody {
                payload: Payload::Bytes(self.raw.clone().into_bytes()),
                content_type: String::new(),
            },
        }
    }
}
