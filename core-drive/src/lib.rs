//! # Core Drive
//!
//! The personal file drive: listing with sort control, lazy per-file
//! content metadata, preview dispatch, and downloads.
//!
//! ## Architecture
//!
//! - [`DriveCatalog`] — backend contract; [`MockCatalog`] is the in-process
//!   stand-in with a fixed listing
//! - [`FileSort`] — field/direction ordering with a pinned-first override
//! - [`classify`]/[`PreviewKind`] — MIME/extension preview dispatch
//! - [`DriveService`] — façade wiring catalog, HTTP downloads, and events

pub mod catalog;
pub mod error;
pub mod models;
pub mod preview;
pub mod service;
pub mod sort;

pub use catalog::{DriveCatalog, MockCatalog, MockLatency};
pub use error::{DriveError, Result};
pub use models::{FileData, Observation, UploadedFile};
pub use preview::{classify, PreviewKind, CODE_EXTENSIONS, OFFICE_EXTENSIONS};
pub use service::{DownloadPayload, DriveService, FilePreview};
pub use sort::{FileSort, SortDirection, SortField};
