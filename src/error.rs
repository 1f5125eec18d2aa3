use thiserror::Error;

/// Raised when a source blob cannot be split into hand texts at all.
/// Fatal for one read attempt of a file; the caller retries on the next poll.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SegmentationError {
    #[error("offset {offset} is past the end of the source ({len} bytes)")]
    OffsetPastEnd { offset: usize, len: usize },
    #[error("offset {offset} does not fall on a character boundary")]
    OffsetNotBoundary { offset: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("required anchor not found: {0}")]
    MissingAnchor(&'static str),
    #[error("malformed amount '{0}'")]
    BadAmount(String),
    #[error("malformed number '{0}'")]
    BadNumber(String),
    #[error("malformed card '{0}'")]
    BadCard(String),
    #[error("unknown player '{player}' in {source_call}")]
    UnknownPlayer {
        player: String,
        source_call: &'static str,
    },
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    #[error("unsupported game: {0}")]
    UnsupportedGame(String),
}

/// One hand failed to parse. Fatal for that hand only.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("hand {hand_id}: {kind}")]
pub struct ParseError {
    pub hand_id: u64,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(hand_id: u64, kind: ParseErrorKind) -> Self {
        Self { hand_id, kind }
    }

    /// Error for a hand whose number is not known yet.
    pub fn anonymous(kind: ParseErrorKind) -> Self {
        Self { hand_id: 0, kind }
    }

    pub fn missing(hand_id: u64, anchor: &'static str) -> Self {
        Self::new(hand_id, ParseErrorKind::MissingAnchor(anchor))
    }

    pub fn is_unknown_player(&self) -> bool {
        matches!(self.kind, ParseErrorKind::UnknownPlayer { .. })
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache lock poisoned")]
    Poisoned,
    #[error("row {0} vanished during update")]
    MissingRow(u64),
}
