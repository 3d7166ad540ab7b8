//! Drive Service
//!
//! Façade over the catalog: sorted listings, preview resolution, and
//! downloads. Emits [`DriveEvent`]s so hosts can render progress and
//! transient failure alerts; download failures never disturb listing state.

use crate::catalog::DriveCatalog;
use crate::error::{DriveError, Result};
use crate::models::{FileData, UploadedFile};
use crate::preview::{classify, PreviewKind};
use crate::sort::FileSort;
use bridge_traits::error::BridgeError;
use bridge_traits::http::HttpClient;
use bytes::Bytes;
use core_runtime::events::{CoreEvent, DriveEvent, EventBus};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// A resolved preview: content metadata, the chosen kind, and text content
/// when the kind renders text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePreview {
    pub data: FileData,
    pub kind: PreviewKind,
    pub text_content: Option<String>,
}

/// Bytes ready for the host to save to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadPayload {
    pub file_name: String,
    pub mime_type: String,
    pub content: Bytes,
}

/// Sorted listings, preview resolution, and downloads over a [`DriveCatalog`].
#[derive(Clone)]
pub struct DriveService {
    catalog: Arc<dyn DriveCatalog>,
    http_client: Arc<dyn HttpClient>,
    event_bus: EventBus,
}

impl DriveService {
    pub fn new(
        catalog: Arc<dyn DriveCatalog>,
        http_client: Arc<dyn HttpClient>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            catalog,
            http_client,
            event_bus,
        }
    }

    /// The listing, ordered by `sort`.
    #[instrument(skip(self))]
    pub async fn list_files(&self, sort: &FileSort) -> Result<Vec<UploadedFile>> {
        let mut files = self.catalog.list_files().await?;
        sort.apply(&mut files);
        debug!(count = files.len(), "Listed files");
        Ok(files)
    }

    /// Content metadata for one file.
    pub async fn get_file_data(&self, file_data_id: &str) -> Result<FileData> {
        self.catalog.file_data(file_data_id).await
    }

    /// Inline text content for text and code files.
    pub async fn get_text_content(&self, file_data_id: &str) -> Result<String> {
        self.catalog.text_content(file_data_id).await
    }

    /// Resolve how to preview `file`.
    ///
    /// Fetches the file's content metadata, classifies it, and for text
    /// kinds also fetches the inline content; content that is missing
    /// leaves `text_content` as `None` rather than failing the preview.
    #[instrument(skip(self, file), fields(file_data_id = %file.file_data_id))]
    pub async fn open_preview(&self, file: &UploadedFile) -> Result<FilePreview> {
        let data = self.catalog.file_data(&file.file_data_id).await?;
        let kind = classify(file, &data);

        let text_content = if kind.wants_text_content() {
            match self.catalog.text_content(&file.file_data_id).await {
                Ok(content) => Some(content),
                Err(e) => {
                    debug!(error = %e, "No inline text content for text preview");
                    None
                }
            }
        } else {
            None
        };

        let event = CoreEvent::Drive(DriveEvent::PreviewOpened {
            file_data_id: file.file_data_id.clone(),
            kind: kind.name().to_string(),
        });
        let _ = self.event_bus.emit(event);

        info!(kind = kind.name(), "Preview opened");
        Ok(FilePreview {
            data,
            kind,
            text_content,
        })
    }

    /// Fetch the file's content for saving.
    ///
    /// Text previews serialize the already-fetched string; everything else
    /// re-fetches the binary content from the file URL. Failures emit
    /// `DownloadFailed` and leave listing state untouched.
    #[instrument(skip(self, file, preview), fields(file_data_id = %file.file_data_id))]
    pub async fn download(
        &self,
        file: &UploadedFile,
        preview: &FilePreview,
    ) -> Result<DownloadPayload> {
        let file_name = file.full_name();

        let event = CoreEvent::Drive(DriveEvent::DownloadStarted {
            file_data_id: file.file_data_id.clone(),
            file_name: file_name.clone(),
        });
        let _ = self.event_bus.emit(event);

        let result = self.fetch_content(preview).await;

        match result {
            Ok(content) => {
                let event = CoreEvent::Drive(DriveEvent::DownloadCompleted {
                    file_data_id: file.file_data_id.clone(),
                    bytes: content.len() as u64,
                });
                let _ = self.event_bus.emit(event);

                info!(bytes = content.len(), "Download completed");
                Ok(DownloadPayload {
                    file_name,
                    mime_type: preview.data.mime_type.clone(),
                    content,
                })
            }
            Err(e) => {
                warn!(error = %e, "Download failed");
                let event = CoreEvent::Drive(DriveEvent::DownloadFailed {
                    file_data_id: file.file_data_id.clone(),
                    message: e.to_string(),
                });
                let _ = self.event_bus.emit(event);
                Err(e)
            }
        }
    }

    async fn fetch_content(&self, preview: &FilePreview) -> Result<Bytes> {
        if preview.kind.wants_text_content() {
            if let Some(text) = &preview.text_content {
                return Ok(Bytes::from(text.clone()));
            }
        }

        if preview.data.url.is_empty() {
            return Err(DriveError::Download(
                "file has no downloadable content".to_string(),
            ));
        }

        self.http_client
            .download(&preview.data.url)
            .await
            .map_err(|e| match e {
                BridgeError::Network(message) => DriveError::Transport(message),
                other => DriveError::Download(other.to_string()),
            })
    }
}

impl std::fmt::Debug for DriveService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveService").finish()
    }
}
