//! Preview Dispatch
//!
//! Classifies a file into a preview kind by MIME type and extension, in a
//! fixed priority order. Hosts map each kind onto their own rendering
//! surface (media element, inline frame, embedded viewer, text block).

use crate::models::{FileData, UploadedFile};
use serde::{Deserialize, Serialize};

/// Extensions handled by the Office Web Viewer.
pub const OFFICE_EXTENSIONS: &[&str] = &["doc", "docx", "xls", "xlsx", "ppt", "pptx"];

/// MIME substrings identifying Office documents.
const OFFICE_MIME_MARKERS: &[&str] = &[
    "officedocument",
    "msword",
    "vnd.ms-powerpoint",
    "vnd.ms-excel",
];

/// Extensions previewed as code even without a `text/` MIME type.
pub const CODE_EXTENSIONS: &[&str] = &["js", "ts", "tsx", "jsx", "html", "css", "json", "md"];

const OFFICE_VIEWER_BASE: &str = "https://view.officeapps.live.com/op";

/// How a file should be previewed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum PreviewKind {
    /// Embed through the Office Web Viewer at `viewer_url`
    OfficeEmbed { viewer_url: String },
    /// Native image element pointed at the file URL
    Image,
    /// Native audio element pointed at the file URL
    Audio,
    /// Native video element pointed at the file URL
    Video,
    /// Inline frame pointed at the file URL
    PdfFrame,
    /// Preformatted block rendering fetched text content
    Text,
    /// No preview; show metadata and offer a download
    Metadata { mime_type: String, size: u64 },
}

impl PreviewKind {
    /// Stable name used in events and logs.
    pub fn name(&self) -> &'static str {
        match self {
            PreviewKind::OfficeEmbed { .. } => "office-embed",
            PreviewKind::Image => "image",
            PreviewKind::Audio => "audio",
            PreviewKind::Video => "video",
            PreviewKind::PdfFrame => "pdf-frame",
            PreviewKind::Text => "text",
            PreviewKind::Metadata { .. } => "metadata",
        }
    }

    /// Whether this kind renders fetched text content.
    pub fn wants_text_content(&self) -> bool {
        matches!(self, PreviewKind::Text)
    }
}

/// Classify a file into its preview kind.
///
/// Priority order is fixed:
/// 1. Office extension or MIME marker, with a non-empty URL
/// 2. `image/`, `audio/`, `video/` MIME prefixes
/// 3. Exact `application/pdf`
/// 4. `text/` MIME prefix or code-like extension
/// 5. Metadata fallback
pub fn classify(file: &UploadedFile, data: &FileData) -> PreviewKind {
    let mime = data.mime_type.as_str();
    let ext = file.extension.to_lowercase();

    let is_office_ext = OFFICE_EXTENSIONS.contains(&ext.as_str());
    let is_office_mime = OFFICE_MIME_MARKERS.iter().any(|m| mime.contains(m));
    if (is_office_ext || is_office_mime) && !data.url.is_empty() {
        return PreviewKind::OfficeEmbed {
            viewer_url: office_viewer_url(&data.url),
        };
    }

    if mime.starts_with("image/") {
        return PreviewKind::Image;
    }
    if mime.starts_with("audio/") {
        return PreviewKind::Audio;
    }
    if mime.starts_with("video/") {
        return PreviewKind::Video;
    }

    if mime == "application/pdf" {
        return PreviewKind::PdfFrame;
    }

    if mime.starts_with("text/") || CODE_EXTENSIONS.contains(&ext.as_str()) {
        return PreviewKind::Text;
    }

    PreviewKind::Metadata {
        mime_type: data.mime_type.clone(),
        size: data.size,
    }
}

/// Build the Office Web Viewer URL for a source document.
///
/// Every Office format goes through the `embed` endpoint; the source URL is
/// percent-encoded into the `src` parameter.
fn office_viewer_url(source_url: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(source_url.as_bytes()).collect();
    format!("{OFFICE_VIEWER_BASE}/embed.aspx?src={encoded}&ui=en-US&wdOrigin=BROWSELINK")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn file(name: &str, ext: &str) -> UploadedFile {
        UploadedFile {
            id: format!("f-{name}"),
            file_data_id: format!("d-{name}"),
            name: name.to_string(),
            extension: ext.to_string(),
            is_pinned: false,
            last_seen: Utc::now(),
            uploaded_at: Utc::now(),
            observations: vec![],
        }
    }

    fn data(mime: &str, url: &str) -> FileData {
        FileData {
            id: "d1".to_string(),
            blob_name: "blob".to_string(),
            url: url.to_string(),
            size: 1024,
            mime_type: mime.to_string(),
        }
    }

    #[test]
    fn test_docx_selects_office_embed() {
        let kind = classify(
            &file("Contract", "docx"),
            &data(
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                "https://files.example.com/contract.docx",
            ),
        );

        match kind {
            PreviewKind::OfficeEmbed { viewer_url } => {
                assert!(viewer_url.starts_with(
                    "https://view.officeapps.live.com/op/embed.aspx?src=https%3A%2F%2F"
                ));
                assert!(viewer_url.contains("wdOrigin=BROWSELINK"));
            }
            other => panic!("expected OfficeEmbed, got {:?}", other),
        }
    }

    #[test]
    fn test_spreadsheet_uses_embed_endpoint() {
        let kind = classify(
            &file("Report", "xlsx"),
            &data(
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                "https://files.example.com/report.xlsx",
            ),
        );

        match kind {
            PreviewKind::OfficeEmbed { viewer_url } => {
                assert!(viewer_url.contains("/op/embed.aspx?"));
                assert!(viewer_url.contains("src=https%3A%2F%2F"));
            }
            other => panic!("expected OfficeEmbed, got {:?}", other),
        }
    }

    #[test]
    fn test_office_mime_without_extension_match() {
        // Extension lies but the MIME marker identifies the document
        let kind = classify(
            &file("Legacy", "bin"),
            &data("application/msword", "https://files.example.com/legacy.doc"),
        );
        assert!(matches!(kind, PreviewKind::OfficeEmbed { .. }));
    }

    #[test]
    fn test_office_without_url_falls_through_to_metadata() {
        let kind = classify(
            &file("Contract", "docx"),
            &data(
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                "",
            ),
        );
        assert!(matches!(kind, PreviewKind::Metadata { .. }));
    }

    #[test]
    fn test_media_prefixes() {
        let f = file("m", "bin");
        assert_eq!(
            classify(&f, &data("image/jpeg", "https://x")),
            PreviewKind::Image
        );
        assert_eq!(
            classify(&f, &data("audio/mpeg", "https://x")),
            PreviewKind::Audio
        );
        assert_eq!(
            classify(&f, &data("video/mp4", "https://x")),
            PreviewKind::Video
        );
    }

    #[test]
    fn test_pdf_requires_exact_mime() {
        let f = file("doc", "pdf");
        assert_eq!(
            classify(&f, &data("application/pdf", "https://x")),
            PreviewKind::PdfFrame
        );
        // Parameterized PDF MIME is not the exact match; extension pdf is
        // not code-like, so this lands on metadata
        assert!(matches!(
            classify(&f, &data("application/pdf; version=1.7", "https://x")),
            PreviewKind::Metadata { .. }
        ));
    }

    #[test]
    fn test_text_mime_and_code_extensions() {
        assert_eq!(
            classify(&file("notes", "txt"), &data("text/plain; charset=utf-8", "")),
            PreviewKind::Text
        );
        assert_eq!(
            classify(
                &file("script", "ts"),
                &data("application/octet-stream", "")
            ),
            PreviewKind::Text
        );
        assert_eq!(
            classify(&file("readme", "md"), &data("application/octet-stream", "")),
            PreviewKind::Text
        );
    }

    #[test]
    fn test_unknown_type_falls_back_to_metadata() {
        let kind = classify(
            &file("archive", "zip"),
            &data("application/zip", "https://x"),
        );
        assert_eq!(
            kind,
            PreviewKind::Metadata {
                mime_type: "application/zip".to_string(),
                size: 1024,
            }
        );
    }
}
