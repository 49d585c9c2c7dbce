//! Puzzle file parsing.
//!
//! The input is plain text with one ladder per line and comma-separated words.
//! There is no header row and no quoting: every comma separates two words.
//!
//! Each line keeps its zero-based position as the puzzle index, so a skipped line
//! leaves a gap in the index sequence rather than shifting later puzzles down.

use crate::model::PuzzleRecord;
use std::iter::Enumerate;
use std::str::Lines;
use tracing::warn;

const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// What a single input line turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Record(PuzzleRecord),
    /// The line had fewer than two non-empty words; `words` is how many it had.
    Skipped { words: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    /// Zero-based position of the line in the trimmed input.
    pub index: usize,
    pub outcome: LineOutcome,
}

impl ParsedLine {
    #[must_use]
    pub fn record(&self) -> Option<&PuzzleRecord> {
        match &self.outcome {
            LineOutcome::Record(record) => Some(record),
            LineOutcome::Skipped { .. } => None,
        }
    }

    #[must_use]
    pub fn into_record(self) -> Option<PuzzleRecord> {
        match self.outcome {
            LineOutcome::Record(record) => Some(record),
            LineOutcome::Skipped { .. } => None,
        }
    }

    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, LineOutcome::Skipped { .. })
    }
}

/// Lazy, in-order iterator over the lines of a puzzle file.
///
/// Created by [`parse_puzzles`]. Every input line yields exactly one [`ParsedLine`].
pub struct PuzzleLines<'a> {
    lines: Enumerate<Lines<'a>>,
}

impl Iterator for PuzzleLines<'_> {
    type Item = ParsedLine;

    fn next(&mut self) -> Option<Self::Item> {
        let (index, line) = self.lines.next()?;
        let parsed = parse_line(index, line);
        if let LineOutcome::Skipped { words } = parsed.outcome {
            warn!(index, words, "Skipping puzzle {index}: insufficient words");
        }
        Some(parsed)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.lines.size_hint()
    }
}

/// Parse a whole puzzle file.
///
/// Leading and trailing whitespace of the input (and a leading byte-order mark)
/// is dropped first, so blank lines
/// at either end never count as puzzles. Blank lines in the middle do count, and
/// are skipped.
#[must_use]
pub fn parse_puzzles(input: &str) -> PuzzleLines<'_> {
    PuzzleLines {
        lines: puzzle_lines(input).enumerate(),
    }
}

/// Number of lines [`parse_puzzles`] will yield for `input`.
#[must_use]
pub fn line_count(input: &str) -> usize {
    puzzle_lines(input).count()
}

fn puzzle_lines(input: &str) -> Lines<'_> {
    input.trim_matches(is_padding).lines()
}

// Whitespace, plus the byte-order mark some editors put at the start of a file.
fn is_padding(c: char) -> bool {
    c.is_whitespace() || c == BYTE_ORDER_MARK
}

/// Parse one line found at zero-based position `index`.
#[must_use]
pub fn parse_line(index: usize, line: &str) -> ParsedLine {
    let words = split_words(line);
    let count = words.len();
    let outcome = PuzzleRecord::new(index, words)
        .map_or(LineOutcome::Skipped { words: count }, LineOutcome::Record);
    ParsedLine { index, outcome }
}

/// Split a line on commas, trim and uppercase each word, and drop empty words.
#[must_use]
pub fn split_words(line: &str) -> Vec<String> {
    line.split(',')
        .map(|word| word.trim_matches(is_padding).to_uppercase())
        .filter(|word| !word.is_empty())
        .collect()
}
