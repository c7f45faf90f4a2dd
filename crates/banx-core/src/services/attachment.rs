//! Attachment contract helpers
//!
//! Decoding PDFs, DOCX files and images happens outside this crate. What lives
//! here is the part of preparation that needs no decoder: MIME and size
//! checks, data URL encoding, plain-text documents and snippet building.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

use crate::models::Attachment;

pub const MAX_ATTACHMENT_SIZE: u64 = 10 * 1024 * 1024; // 10MB
pub const IMAGE_MIME_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp"];
pub const DOCUMENT_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
];

const SNIPPET_LENGTH: usize = 180;
const SNIPPET_CUT: usize = 177;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentErrorCode {
    SizeLimit,
    UnsupportedType,
    ProcessingError,
    EmptyText,
    Unknown,
}

impl AttachmentErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentErrorCode::SizeLimit => "size-limit",
            AttachmentErrorCode::UnsupportedType => "unsupported-type",
            AttachmentErrorCode::ProcessingError => "processing-error",
            AttachmentErrorCode::EmptyText => "empty-text",
            AttachmentErrorCode::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AttachmentErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure reported while preparing an attachment
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct AttachmentError {
    pub code: AttachmentErrorCode,
    pub message: String,
}

impl AttachmentError {
    pub fn new(code: AttachmentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Document,
}

/// Classify a MIME type, or `None` when it is not accepted
pub fn attachment_kind(mime_type: &str) -> Option<AttachmentKind> {
    if IMAGE_MIME_TYPES.contains(&mime_type) {
        Some(AttachmentKind::Image)
    } else if DOCUMENT_MIME_TYPES.contains(&mime_type) {
        Some(AttachmentKind::Document)
    } else {
        None
    }
}

fn check_size(size: u64) -> Result<(), AttachmentError> {
    if size > MAX_ATTACHMENT_SIZE {
        return Err(AttachmentError::new(
            AttachmentErrorCode::SizeLimit,
            "File exceeds 10MB size limit.",
        ));
    }
    Ok(())
}

/// Collapse whitespace runs into single spaces and trim
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Short preview of extracted document text
pub fn build_snippet(text: &str) -> String {
    let normalized = normalize_text(text);
    if normalized.chars().count() <= SNIPPET_LENGTH {
        return normalized;
    }
    let cut: String = normalized.chars().take(SNIPPET_CUT).collect();
    format!("{}…", cut.trim())
}

/// Build an image attachment from already-encoded image bytes.
///
/// `dimensions` comes from whatever decoded the image, if anything did.
pub fn prepare_image_attachment(
    name: &str,
    mime_type: &str,
    bytes: &[u8],
    dimensions: Option<(u32, u32)>,
) -> Result<Attachment, AttachmentError> {
    if attachment_kind(mime_type) != Some(AttachmentKind::Image) {
        return Err(AttachmentError::new(
            AttachmentErrorCode::UnsupportedType,
            "Unsupported image format.",
        ));
    }
    check_size(bytes.len() as u64)?;

    let data_url = format!("data:{mime_type};base64,{}", STANDARD.encode(bytes));
    Ok(Attachment::Image {
        name: name.to_string(),
        mime_type: mime_type.to_string(),
        size_bytes: bytes.len() as u64,
        data_url,
        width: dimensions.map(|(w, _)| w),
        height: dimensions.map(|(_, h)| h),
    })
}

/// Build a document attachment from text another component already extracted
pub fn prepare_document_attachment(
    name: &str,
    mime_type: &str,
    size_bytes: u64,
    extracted_text: &str,
) -> Result<Attachment, AttachmentError> {
    if attachment_kind(mime_type) != Some(AttachmentKind::Document) {
        return Err(AttachmentError::new(
            AttachmentErrorCode::UnsupportedType,
            "Unsupported document type.",
        ));
    }
    check_size(size_bytes)?;

    let normalized = normalize_text(extracted_text);
    if normalized.is_empty() {
        return Err(AttachmentError::new(
            AttachmentErrorCode::EmptyText,
            "Extracted document text was empty.",
        ));
    }

    Ok(Attachment::Document {
        name: name.to_string(),
        mime_type: mime_type.to_string(),
        size_bytes,
        snippet: build_snippet(&normalized),
        extracted_text: normalized,
    })
}

/// Prepare a `text/plain` file, the one document type that needs no decoder
pub fn prepare_text_document(name: &str, bytes: &[u8]) -> Result<Attachment, AttachmentError> {
    check_size(bytes.len() as u64)?;
    let text = std::str::from_utf8(bytes).map_err(|_| {
        AttachmentError::new(
            AttachmentErrorCode::ProcessingError,
            "Could not extract text from the document.",
        )
    })?;
    prepare_document_attachment(name, "text/plain", bytes.len() as u64, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_kind() {
        assert_eq!(attachment_kind("image/png"), Some(AttachmentKind::Image));
        assert_eq!(attachment_kind("application/pdf"), Some(AttachmentKind::Document));
        assert_eq!(attachment_kind("image/gif"), None);
        assert_eq!(attachment_kind(""), None);
    }

    #[test]
    fn test_image_becomes_data_url() {
        let attachment =
            prepare_image_attachment("dot.png", "image/png", &[1, 2, 3], Some((1, 1))).unwrap();

        match attachment {
            Attachment::Image {
                data_url,
                size_bytes,
                width,
                height,
                ..
            } => {
                assert_eq!(data_url, "data:image/png;base64,AQID");
                assert_eq!(size_bytes, 3);
                assert_eq!((width, height), (Some(1), Some(1)));
            }
            Attachment::Document { .. } => panic!("expected image"),
        }
    }

    #[test]
    fn test_rejects_unsupported_image_type() {
        let err = prepare_image_attachment("anim.gif", "image/gif", &[0], None).unwrap_err();
        assert_eq!(err.code, AttachmentErrorCode::UnsupportedType);
        assert_eq!(err.code.to_string(), "unsupported-type");
    }

    #[test]
    fn test_rejects_oversized_document() {
        let err = prepare_document_attachment(
            "big.pdf",
            "application/pdf",
            MAX_ATTACHMENT_SIZE + 1,
            "text",
        )
        .unwrap_err();
        assert_eq!(err.code, AttachmentErrorCode::SizeLimit);
        assert_eq!(err.to_string(), "File exceeds 10MB size limit.");
    }

    #[test]
    fn test_text_document_is_normalized() {
        let attachment = prepare_text_document("notes.txt", b"  line one\n\n line   two ").unwrap();
        match attachment {
            Attachment::Document {
                extracted_text,
                snippet,
                mime_type,
                ..
            } => {
                assert_eq!(extracted_text, "line one line two");
                assert_eq!(snippet, "line one line two");
                assert_eq!(mime_type, "text/plain");
            }
            Attachment::Image { .. } => panic!("expected document"),
        }
    }

    #[test]
    fn test_blank_document_is_empty_text() {
        let err = prepare_text_document("blank.txt", b" \n\t ").unwrap_err();
        assert_eq!(err.code, AttachmentErrorCode::EmptyText);
    }

    #[test]
    fn test_invalid_utf8_is_processing_error() {
        let err = prepare_text_document("bin.txt", &[0xff, 0xfe, 0x00]).unwrap_err();
        assert_eq!(err.code, AttachmentErrorCode::ProcessingError);
    }

    #[test]
    fn test_snippet_truncates_long_text() {
        let long = "word ".repeat(100);
        let snippet = build_snippet(&long);
        assert!(snippet.ends_with('…'));
        assert!(snippet.chars().count() <= SNIPPET_CUT + 1);
        assert_eq!(build_snippet("short"), "short");
    }
}
