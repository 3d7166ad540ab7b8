//! Listing Sort
//!
//! Ordering for the drive listing: a sort field with direction, plus an
//! independent pinned-first override that always wins when enabled.

use crate::models::UploadedFile;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// What to order the listing by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    /// Recency of viewing
    LastSeen,
    UploadedAt,
    Name,
    Extension,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// A complete sort specification for the listing.
///
/// When `pinned_first` is set, pinned files sort before unpinned ones
/// regardless of field and direction. Ties on the chosen field break by
/// case-insensitive name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSort {
    pub field: SortField,
    pub direction: SortDirection,
    pub pinned_first: bool,
}

impl Default for FileSort {
    /// Most recently seen first, pinned on top.
    fn default() -> Self {
        Self {
            field: SortField::LastSeen,
            direction: SortDirection::Descending,
            pinned_first: true,
        }
    }
}

impl FileSort {
    pub fn new(field: SortField, direction: SortDirection, pinned_first: bool) -> Self {
        Self {
            field,
            direction,
            pinned_first,
        }
    }

    /// Compare two files under this sort specification.
    pub fn compare(&self, a: &UploadedFile, b: &UploadedFile) -> Ordering {
        if self.pinned_first {
            // Pinned before unpinned, independent of field and direction
            match b.is_pinned.cmp(&a.is_pinned) {
                Ordering::Equal => {}
                decided => return decided,
            }
        }

        let by_field = match self.field {
            SortField::LastSeen => a.last_seen.cmp(&b.last_seen),
            SortField::UploadedAt => a.uploaded_at.cmp(&b.uploaded_at),
            SortField::Name => compare_names(a, b),
            SortField::Extension => a
                .extension
                .to_lowercase()
                .cmp(&b.extension.to_lowercase()),
        };

        let by_field = match self.direction {
            SortDirection::Ascending => by_field,
            SortDirection::Descending => by_field.reverse(),
        };

        by_field.then_with(|| compare_names(a, b))
    }

    /// Sort a listing in place.
    pub fn apply(&self, files: &mut [UploadedFile]) {
        files.sort_by(|a, b| self.compare(a, b));
    }
}

fn compare_names(a: &UploadedFile, b: &UploadedFile) -> Ordering {
    a.name.to_lowercase().cmp(&b.name.to_lowercase())
}
