//! `analytics-core`: the event aggregation engine's pure domain.
//!
//! This crate contains no IO: the event model and its stored encoding, time
//! bucketing, and the fold that turns stored members into count tables.

pub mod aggregation;
pub mod bucket;
pub mod clock;
pub mod codec;
pub mod error;
pub mod event;

pub use aggregation::{fold, AggregationResult, CountTable, CountTables};
pub use bucket::{BucketKeys, Cutoffs, Granularity, Lookback, WEEK_START};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{DomainError, DomainResult};
pub use event::{Event, EventDraft};
