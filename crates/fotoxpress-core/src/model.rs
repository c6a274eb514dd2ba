//! Data model for culling sessions.
//!
//! A [`Session`] owns an ordered list of [`SessionPhoto`] rows. While the user
//! works through a session the rows are mirrored into [`Photo`] working
//! copies, and every change is written straight back through the
//! persistence gateway.

use serde::{Deserialize, Serialize};

pub type SessionId = i64;
pub type PhotoId = i64;

/// Per-photo verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    #[default]
    Undecided,
    Keep,
    Discard,
}

impl Decision {
    /// Text form used in storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Undecided => "undecided",
            Decision::Keep => "keep",
            Decision::Discard => "discard",
        }
    }

    pub fn is_decided(self) -> bool {
        self != Decision::Undecided
    }
}

impl From<&str> for Decision {
    /// Unknown text reads as `Undecided`.
    fn from(value: &str) -> Self {
        match value {
            "keep" => Decision::Keep,
            "discard" => Decision::Discard,
            _ => Decision::Undecided,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One culling batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub name: String,
    /// Creation time, unix milliseconds.
    pub created_at: i64,
    pub photo_count: u32,
    /// Set once the delete phase of a commit has been applied.
    pub finalized: bool,
}

/// A persisted photo row inside a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPhoto {
    pub id: PhotoId,
    pub session_id: SessionId,
    /// Opaque reference to the media resource.
    pub locator: String,
    /// Accumulated rotation in degrees.
    pub rotation: f64,
    pub decision: Decision,
    /// Position in the original selection, dense and unique per session.
    pub sequence: u32,
}

impl SessionPhoto {
    /// Working copy used by the editor.
    pub fn to_photo(&self) -> Photo {
        Photo {
            id: self.id,
            locator: self.locator.clone(),
            rotation: self.rotation,
            decision: self.decision,
        }
    }
}

/// Working copy of a session photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: PhotoId,
    pub locator: String,
    pub rotation: f64,
    pub decision: Decision,
}

impl Photo {
    /// Whether the photo needs re-encoding at commit time. Any non-zero
    /// angle counts, however small.
    pub fn is_rotated(&self) -> bool {
        self.rotation != 0.0
    }
}

/// A device folder (bucket) that photos can be imported from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    pub display_name: String,
    pub cover_locator: Option<String>,
    pub photo_count: u32,
}

/// One row of the "resume a session" list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionProgress {
    pub id: SessionId,
    pub name: String,
    pub created_at: i64,
    pub total_count: u32,
    /// Photos whose decision is not `Undecided`.
    pub edited_count: u32,
    pub finalized: bool,
}

/// Counts shown on the summary screen before committing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Summary {
    pub to_discard: u32,
    /// Kept and rotated: re-encoded at commit time.
    pub to_edit_and_keep: u32,
    pub to_keep_unchanged: u32,
    pub undecided: u32,
    pub total: u32,
}

impl Summary {
    pub fn from_photos(photos: &[Photo]) -> Self {
        photos.iter().fold(
            Summary {
                total: photos.len() as u32,
                ..Summary::default()
            },
            |mut summary, photo| {
                match photo.decision {
                    Decision::Discard => summary.to_discard += 1,
                    Decision::Keep if photo.is_rotated() => summary.to_edit_and_keep += 1,
                    Decision::Keep => summary.to_keep_unchanged += 1,
                    Decision::Undecided => summary.undecided += 1,
                }
                summary
            },
        )
    }

    pub fn total_decided(&self) -> u32 {
        self.to_discard + self.to_edit_and_keep + self.to_keep_unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(id: PhotoId, rotation: f64, decision: Decision) -> Photo {
        Photo {
            id,
            locator: format!("/photos/{}.jpg", id),
            rotation,
            decision,
        }
    }

    #[test]
    fn test_decision_text_form() {
        for decision in [Decision::Undecided, Decision::Keep, Decision::Discard] {
            assert_eq!(Decision::from(decision.as_str()), decision);
        }
        assert_eq!(Decision::from("KEEP?"), Decision::Undecided);
        assert_eq!(Decision::Discard.to_string(), "discard");
    }

    #[test]
    fn test_decision_serde_matches_storage_text() {
        let json = serde_json::to_string(&Decision::Keep).unwrap();
        assert_eq!(json, "\"keep\"");
    }

    #[test]
    fn test_any_nonzero_rotation_counts() {
        assert!(!photo(1, 0.0, Decision::Keep).is_rotated());
        assert!(!photo(1, -0.0, Decision::Keep).is_rotated());
        assert!(photo(1, 0.0005, Decision::Keep).is_rotated());
        assert!(photo(1, -0.5, Decision::Keep).is_rotated());
        assert!(photo(1, 15.0, Decision::Keep).is_rotated());
    }

    #[test]
    fn test_tiny_rotation_is_an_edit() {
        let photos = vec![
            photo(1, 0.0005, Decision::Keep),
            photo(2, 0.0, Decision::Keep),
        ];
        let summary = Summary::from_photos(&photos);
        assert_eq!(summary.to_edit_and_keep, 1);
        assert_eq!(summary.to_keep_unchanged, 1);
    }

    #[test]
    fn test_summary_counts() {
        let photos = vec![
            photo(1, 0.0, Decision::Keep),
            photo(2, 0.0, Decision::Discard),
            photo(3, 15.0, Decision::Keep),
            photo(4, 3.0, Decision::Undecided),
            photo(5, -2.0, Decision::Discard),
        ];
        let summary = Summary::from_photos(&photos);

        assert_eq!(summary.to_discard, 2);
        assert_eq!(summary.to_edit_and_keep, 1);
        assert_eq!(summary.to_keep_unchanged, 1);
        assert_eq!(summary.undecided, 1);
        assert_eq!(summary.total, 5);
        assert_eq!(summary.total_decided(), 4);
    }

    #[test]
    fn test_summary_empty() {
        assert_eq!(Summary::from_photos(&[]), Summary::default());
    }

    #[test]
    fn test_session_photo_to_photo() {
        let row = SessionPhoto {
            id: 7,
            session_id: 2,
            locator: "/a.jpg".to_string(),
            rotation: 4.5,
            decision: Decision::Keep,
            sequence: 0,
        };
        let working = row.to_photo();
        assert_eq!(working.id, 7);
        assert_eq!(working.locator, "/a.jpg");
        assert_eq!(working.rotation, 4.5);
        assert_eq!(working.decision, Decision::Keep);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
