//! Portable export bundle file format.
//!
//! # Invariants
//! - `version` identifies the bundle layout; readers reject newer versions.
//! - Entries are written in display order, each board exactly once.

use crate::model::board::Board;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Bundle layout version written by this build.
pub const BUNDLE_FORMAT_VERSION: u32 = 1;

/// Whole-collection export file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportBundle {
    #[serde(default = "default_bundle_version")]
    pub version: u32,
    #[serde(default)]
    pub exported_at: Option<DateTime<Utc>>,
    pub boards: Vec<BundleEntry>,
}

/// One board inside a bundle.
///
/// Import is lenient: every field except the container may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// Canvas snapshot, `null` when the board has none.
    #[serde(default)]
    pub data: Option<Value>,
}

impl BundleEntry {
    pub fn from_board(board: &Board, data: Option<Value>) -> Self {
        Self {
            id: board.id.clone(),
            name: board.name.clone(),
            created_at: Some(board.created_at),
            updated_at: Some(board.updated_at),
            thumbnail: board.thumbnail.clone(),
            data,
        }
    }

    /// Declared id, `None` when blank.
    pub fn declared_id(&self) -> Option<&str> {
        let trimmed = self.id.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }
}

fn default_bundle_version() -> u32 {
    BUNDLE_FORMAT_VERSION
}
