use log::{debug, info};
use regex::Regex;
use serde::Serialize;

use crate::error::SegmentationError;

/// What a source blob contains once its site is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    HandHistory,
    TournamentSummary,
}

/// Hand texts cut from a source plus where the next read should resume.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Segmented {
    pub hands: Vec<String>,
    pub offset: usize,
}

/// Splits `text[offset..]` into hand texts on `divider`.
///
/// The returned offset is the full length of `text`, so a caller polling a
/// growing file can pass it back in and only see hands appended since.
pub fn split_hands(
    text: &str,
    offset: usize,
    divider: &Regex,
) -> Result<Segmented, SegmentationError> {
    if offset > text.len() {
        return Err(SegmentationError::OffsetPastEnd {
            offset,
            len: text.len(),
        });
    }
    if !text.is_char_boundary(offset) {
        return Err(SegmentationError::OffsetNotBoundary { offset });
    }

    let fresh = text[offset..].trim();
    if fresh.is_empty() {
        info!("Read no hands past offset {}", offset);
        return Ok(Segmented {
            hands: Vec::new(),
            offset: text.len(),
        });
    }

    let hands: Vec<String> = divider.split(fresh).map(str::to_string).collect();
    debug!("split_hands: {} hands from {} bytes", hands.len(), fresh.len());

    Ok(Segmented {
        hands,
        offset: text.len(),
    })
}

/// Line endings and non-breaking spaces the way every grammar expects them.
pub fn normalize(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .replace("\r\n", "\n")
        .replace('\u{a0}', " ")
}
