//! Drive domain model
//!
//! Mirrors the backend's wire shapes: ids serialize as `_id`, field names as
//! camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A comment left on a file by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// A file entry as it appears in the drive listing.
///
/// Content metadata lives separately in [`FileData`] and is fetched lazily
/// per preview through `file_data_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    #[serde(rename = "_id")]
    pub id: String,
    pub file_data_id: String,
    pub name: String,
    pub extension: String,
    pub is_pinned: bool,
    pub last_seen: DateTime<Utc>,
    pub uploaded_at: DateTime<Utc>,
    pub observations: Vec<Observation>,
}

impl UploadedFile {
    /// Display name including the extension, e.g. `report.pdf`.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.name, self.extension)
    }
}

/// Content metadata for a file: where its bytes live and what they are.
///
/// Valid only while its parent [`UploadedFile`] is in the listing; not
/// cached across views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    #[serde(rename = "_id")]
    pub id: String,
    pub blob_name: String,
    /// Source URL for remote content; empty when content is inline-only
    pub url: String,
    /// Size in bytes
    pub size: u64,
    pub mime_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_uploaded_file_wire_format() {
        let file = UploadedFile {
            id: "f1".to_string(),
            file_data_id: "d1".to_string(),
            name: "Report".to_string(),
            extension: "pdf".to_string(),
            is_pinned: true,
            last_seen: Utc.timestamp_opt(1_700_000_000, 0).single().unwrap(),
            uploaded_at: Utc.timestamp_opt(1_699_000_000, 0).single().unwrap(),
            observations: vec![],
        };

        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["_id"], "f1");
        assert_eq!(json["fileDataId"], "d1");
        assert_eq!(json["isPinned"], true);

        let back: UploadedFile = serde_json::from_value(json).unwrap();
        assert_eq!(back, file);
    }

    #[test]
    fn test_full_name() {
        let file = UploadedFile {
            id: "f1".to_string(),
            file_data_id: "d1".to_string(),
            name: "Report".to_string(),
            extension: "pdf".to_string(),
            is_pinned: false,
            last_seen: Utc::now(),
            uploaded_at: Utc::now(),
            observations: vec![],
        };
        assert_eq!(file.full_name(), "Report.pdf");
    }
}
