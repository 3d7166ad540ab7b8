//! Drive Catalog
//!
//! Source of the drive listing and per-file content metadata. The real
//! backend is not part of this core; [`MockCatalog`] stands in with a fixed
//! listing and artificial latency so hosts exercise realistic async paths.

use crate::error::{DriveError, Result};
use crate::models::{FileData, UploadedFile};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Backend contract for the drive listing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DriveCatalog: Send + Sync {
    /// The user's file listing.
    async fn list_files(&self) -> Result<Vec<UploadedFile>>;

    /// Content metadata for one file.
    ///
    /// # Errors
    ///
    /// [`DriveError::NotFound`] when no file data exists for the id.
    async fn file_data(&self, file_data_id: &str) -> Result<FileData>;

    /// Inline text content for text and code files.
    ///
    /// # Errors
    ///
    /// [`DriveError::ContentUnavailable`] when the file has no inline text.
    async fn text_content(&self, file_data_id: &str) -> Result<String>;
}

/// Artificial latency per catalog call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockLatency {
    pub list: Duration,
    pub file_data: Duration,
    pub text: Duration,
}

impl Default for MockLatency {
    fn default() -> Self {
        Self {
            list: Duration::from_millis(600),
            file_data: Duration::from_millis(300),
            text: Duration::from_millis(250),
        }
    }
}

impl MockLatency {
    /// No artificial latency; used in tests.
    pub fn zero() -> Self {
        Self {
            list: Duration::ZERO,
            file_data: Duration::ZERO,
            text: Duration::ZERO,
        }
    }
}

/// In-process stand-in for the drive backend.
///
/// Carries eleven files spanning every preview kind. A placeholder
/// contract only, not a specification of real storage.
pub struct MockCatalog {
    latency: MockLatency,
    files: Vec<UploadedFile>,
    file_data: HashMap<String, FileData>,
    text_content: HashMap<String, String>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::with_latency(MockLatency::default())
    }

    pub fn with_latency(latency: MockLatency) -> Self {
        Self {
            latency,
            files: seed_files(),
            file_data: seed_file_data(),
            text_content: seed_text_content(),
        }
    }
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DriveCatalog for MockCatalog {
    async fn list_files(&self) -> Result<Vec<UploadedFile>> {
        tokio::time::sleep(self.latency.list).await;
        debug!(count = self.files.len(), "Listing files");
        Ok(self.files.clone())
    }

    async fn file_data(&self, file_data_id: &str) -> Result<FileData> {
        tokio::time::sleep(self.latency.file_data).await;
        self.file_data
            .get(file_data_id)
            .cloned()
            .ok_or_else(|| DriveError::NotFound {
                file_data_id: file_data_id.to_string(),
            })
    }

    async fn text_content(&self, file_data_id: &str) -> Result<String> {
        tokio::time::sleep(self.latency.text).await;
        self.text_content
            .get(file_data_id)
            .cloned()
            .ok_or_else(|| DriveError::ContentUnavailable {
                file_data_id: file_data_id.to_string(),
            })
    }
}

fn ts(value: &str) -> DateTime<Utc> {
    // Seed dates are fixed literals; fall back to the epoch rather than
    // panic if one is ever malformed.
    value
        .parse::<DateTime<Utc>>()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

struct SeedFile {
    id: &'static str,
    data_id: &'static str,
    name: &'static str,
    extension: &'static str,
    pinned: bool,
    last_seen: &'static str,
    uploaded_at: &'static str,
}

const SEED_FILES: &[SeedFile] = &[
    SeedFile {
        id: "f1",
        data_id: "d1",
        name: "Project Presentation",
        extension: "pdf",
        pinned: true,
        last_seen: "2025-10-01T10:15:00Z",
        uploaded_at: "2025-09-28T12:00:00Z",
    },
    SeedFile {
        id: "f2",
        data_id: "d2",
        name: "Vacation Photo",
        extension: "jpg",
        pinned: false,
        last_seen: "2025-10-31T08:40:00Z",
        uploaded_at: "2025-10-20T09:10:00Z",
    },
    SeedFile {
        id: "f3",
        data_id: "d3",
        name: "Meeting Notes",
        extension: "txt",
        pinned: false,
        last_seen: "2025-10-10T11:02:00Z",
        uploaded_at: "2025-10-10T09:00:00Z",
    },
    SeedFile {
        id: "f4",
        data_id: "d4",
        name: "Demo App",
        extension: "zip",
        pinned: false,
        last_seen: "2025-10-02T14:30:00Z",
        uploaded_at: "2025-09-30T16:00:00Z",
    },
    SeedFile {
        id: "f5",
        data_id: "d5",
        name: "Monthly Report",
        extension: "xlsx",
        pinned: true,
        last_seen: "2025-10-29T12:20:00Z",
        uploaded_at: "2025-10-01T08:00:00Z",
    },
    SeedFile {
        id: "f6",
        data_id: "d6",
        name: "Utility Script",
        extension: "ts",
        pinned: false,
        last_seen: "2025-10-25T10:00:00Z",
        uploaded_at: "2025-10-21T10:00:00Z",
    },
    SeedFile {
        id: "f7",
        data_id: "d7",
        name: "Interview Audio",
        extension: "mp3",
        pinned: false,
        last_seen: "2025-10-05T07:00:00Z",
        uploaded_at: "2025-10-04T07:00:00Z",
    },
    SeedFile {
        id: "f8",
        data_id: "d8",
        name: "Promo Video",
        extension: "mp4",
        pinned: false,
        last_seen: "2025-10-15T18:00:00Z",
        uploaded_at: "2025-10-12T18:00:00Z",
    },
    SeedFile {
        id: "f9",
        data_id: "d9",
        name: "Contract Template",
        extension: "docx",
        pinned: false,
        last_seen: "2025-10-22T09:30:00Z",
        uploaded_at: "2025-10-22T08:00:00Z",
    },
    SeedFile {
        id: "f10",
        data_id: "d10",
        name: "Sales Deck",
        extension: "pptx",
        pinned: false,
        last_seen: "2025-10-18T10:00:00Z",
        uploaded_at: "2025-10-17T17:00:00Z",
    },
    SeedFile {
        id: "f11",
        data_id: "d11",
        name: "Q4 Sales",
        extension: "csv",
        pinned: false,
        last_seen: "2025-10-31T09:00:00Z",
        uploaded_at: "2025-10-30T18:15:00Z",
    },
];

fn seed_files() -> Vec<UploadedFile> {
    SEED_FILES
        .iter()
        .map(|seed| UploadedFile {
            id: seed.id.to_string(),
            file_data_id: seed.data_id.to_string(),
            name: seed.name.to_string(),
            extension: seed.extension.to_string(),
            is_pinned: seed.pinned,
            last_seen: ts(seed.last_seen),
            uploaded_at: ts(seed.uploaded_at),
            observations: vec![],
        })
        .collect()
}

fn seed_file_data() -> HashMap<String, FileData> {
    let entries: &[(&str, &str, &str, u64, &str)] = &[
        (
            "d1",
            "presentation.pdf",
            "https://files.example.com/samples/presentation.pdf",
            860_000,
            "application/pdf",
        ),
        (
            "d2",
            "vacation.jpg",
            "https://files.example.com/samples/vacation.jpg",
            350_000,
            "image/jpeg",
        ),
        // Inline-only text files carry no URL
        ("d3", "notes.txt", "", 2_400, "text/plain; charset=utf-8"),
        (
            "d4",
            "demo.zip",
            "https://files.example.com/samples/demo.zip",
            2_097_152,
            "application/zip",
        ),
        (
            "d5",
            "report.xlsx",
            "https://files.example.com/samples/report.xlsx",
            10_240,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ),
        (
            "d6",
            "utils.ts",
            "",
            4_096,
            "text/x-typescript; charset=utf-8",
        ),
        (
            "d7",
            "interview.mp3",
            "https://files.example.com/samples/interview.mp3",
            700_000,
            "audio/mpeg",
        ),
        (
            "d8",
            "promo.mp4",
            "https://files.example.com/samples/promo.mp4",
            4_500_000,
            "video/mp4",
        ),
        (
            "d9",
            "contract.docx",
            "https://files.example.com/samples/contract.docx",
            100_000,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ),
        (
            "d10",
            "sales-deck.pptx",
            "https://files.example.com/samples/sales-deck.pptx",
            500_000,
            "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        ),
        ("d11", "q4-sales.csv", "", 480, "text/csv; charset=utf-8"),
    ];

    entries
        .iter()
        .map(|&(id, blob_name, url, size, mime_type)| {
            (
                id.to_string(),
                FileData {
                    id: id.to_string(),
                    blob_name: blob_name.to_string(),
                    url: url.to_string(),
                    size,
                    mime_type: mime_type.to_string(),
                },
            )
        })
        .collect()
}

fn seed_text_content() -> HashMap<String, String> {
    let mut content = HashMap::new();
    content.insert(
        "d3".to_string(),
        "# Meeting notes\n\
         - Topic: Q4 roadmap\n\
         - Attendees: Ana, Luis, Marta\n\
         - Actions:\n\
         \x20 1. Close out critical bugs.\n\
         \x20 2. Prepare the feature demo.\n\
         \x20 3. Ship release 1.2.0.\n"
            .to_string(),
    );
    content.insert(
        "d6".to_string(),
        "export function sum(a: number, b: number) {\n\
         \x20 return a + b;\n\
         }\n\
         \n\
         export const greet = (name: string) => `Hello ${name}!`;\n"
            .to_string(),
    );
    content.insert(
        "d11".to_string(),
        "date,customer,product,quantity,total\n\
         2025-10-01,Ana SA,Pro Subscription,3,149.97\n\
         2025-10-12,Marta Tech,Enterprise License,10,2990.00\n\
         2025-10-28,Globex,Storage Add-on,5,125.00\n"
            .to_string(),
    );
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> MockCatalog {
        MockCatalog::with_latency(MockLatency::zero())
    }

    #[tokio::test]
    async fn test_listing_has_eleven_files() {
        let files = catalog().list_files().await.unwrap();
        assert_eq!(files.len(), 11);

        let pinned: Vec<&str> = files
            .iter()
            .filter(|f| f.is_pinned)
            .map(|f| f.extension.as_str())
            .collect();
        assert_eq!(pinned, vec!["pdf", "xlsx"]);
    }

    #[tokio::test]
    async fn test_every_listed_file_has_data() {
        let catalog = catalog();
        for file in catalog.list_files().await.unwrap() {
            let data = catalog.file_data(&file.file_data_id).await.unwrap();
            assert_eq!(data.id, file.file_data_id);
            assert!(!data.mime_type.is_empty());
        }
    }

    #[tokio::test]
    async fn test_unknown_file_data_id_is_not_found() {
        let err = catalog().file_data("d999").await.unwrap_err();
        assert_eq!(
            err,
            DriveError::NotFound {
                file_data_id: "d999".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_text_content_only_for_inline_files() {
        let catalog = catalog();
        assert!(catalog.text_content("d3").await.is_ok());
        assert!(catalog.text_content("d6").await.is_ok());
        assert!(catalog.text_content("d11").await.is_ok());

        let err = catalog.text_content("d1").await.unwrap_err();
        assert!(matches!(err, DriveError::ContentUnavailable { .. }));
    }
}
