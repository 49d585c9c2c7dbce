//! Puzzle and summary records, and their store field layout.

use crate::store::{FieldValue, Fields};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Minimum number of words a ladder needs to be a puzzle.
pub const MIN_LADDER_WORDS: usize = 2;

/// One word-ladder puzzle, keyed by its zero-based line position in the source file.
///
/// Construct with [`PuzzleRecord::new`], which derives `word_length` and
/// `step_count` from the ladder and refuses ladders that are too short.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleRecord {
    pub index: usize,
    pub ladder: Vec<String>,
    /// Length of `ladder[0]` in Unicode scalar values (`char`s), not bytes or UTF-16 units.
    pub word_length: usize,
    pub step_count: usize,
}

impl PuzzleRecord {
    /// Returns `None` when `ladder` has fewer than [`MIN_LADDER_WORDS`] entries.
    #[must_use]
    pub fn new(index: usize, ladder: Vec<String>) -> Option<Self> {
        if ladder.len() < MIN_LADDER_WORDS {
            return None;
        }
        let word_length = ladder[0].chars().count();
        let step_count = ladder.len();
        Some(Self {
            index,
            ladder,
            word_length,
            step_count,
        })
    }

    /// Document id under the puzzles collection.
    #[must_use]
    pub fn document_id(&self) -> String {
        self.index.to_string()
    }

    /// Store fields, with `createdAt` left for the store to fill in.
    #[must_use]
    pub fn to_fields(&self) -> Fields {
        Fields::from([
            ("index".to_string(), FieldValue::Integer(as_i64(self.index))),
            (
                "ladder".to_string(),
                FieldValue::Array(self.ladder.iter().map(|w| w.as_str().into()).collect()),
            ),
            (
                "wordLength".to_string(),
                FieldValue::Integer(as_i64(self.word_length)),
            ),
            (
                "stepCount".to_string(),
                FieldValue::Integer(as_i64(self.step_count)),
            ),
            ("createdAt".to_string(), FieldValue::ServerTimestamp),
        ])
    }
}

/// The singleton metadata record written after every window has committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub total_count: usize,
    pub epoch_date: DateTime<Utc>,
}

impl ImportSummary {
    #[must_use]
    pub fn new(total_count: usize, epoch_date: DateTime<Utc>) -> Self {
        Self {
            total_count,
            epoch_date,
        }
    }

    /// Store fields, with `lastUpdated` left for the store to fill in.
    #[must_use]
    pub fn to_fields(&self) -> Fields {
        Fields::from([
            (
                "totalCount".to_string(),
                FieldValue::Integer(as_i64(self.total_count)),
            ),
            ("epochDate".to_string(), FieldValue::Timestamp(self.epoch_date)),
            ("lastUpdated".to_string(), FieldValue::ServerTimestamp),
        ])
    }
}

/// Day zero for the puzzle-of-the-day rotation: 2026-01-01T00:00:00Z.
#[must_use]
pub fn default_epoch_date() -> DateTime<Utc> {
    Utc.timestamp_opt(1_767_225_600, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

// Line positions and ladder sizes are bounded by file size, far below i64::MAX.
fn as_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
