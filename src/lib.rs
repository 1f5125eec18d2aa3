pub mod action;
pub mod cache;
pub mod cards;
pub mod error;
pub mod game;
pub mod grammar;
pub mod hand;
pub mod money;
pub mod source;
pub mod stats;

pub use cache::{store_hand, CacheKey, CacheStore, MemoryCache, PlayerId, RowId};
pub use error::{CacheError, ParseError, ParseErrorKind, SegmentationError};
pub use grammar::{parse_batch, parse_hand, Batch, Grammar, GrammarRegistry, Site};
pub use hand::Hand;
pub use source::SourceKind;
pub use stats::{HandStats, StatKind, StatValue};
