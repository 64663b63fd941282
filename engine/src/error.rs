use thiserror::Error;

use skytrack_common::GeoError;
use skytrack_formats::{DecodeError, ReportError};

/// Hub usage errors.
///
#[derive(Clone, Debug, Error, PartialEq)]
pub enum HubError {
    #[error("Unknown topic {0}")]
    UnknownTopic(String),
}

/// Background worker pool errors.
///
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PoolError {
    #[error("Worker pool saturated, job {0} dropped")]
    Saturated(String),
    #[error("Worker pool closed")]
    Closed,
    #[error("Worker pool needs a tokio runtime")]
    NoRuntime,
}

/// Ranking errors.
///
#[derive(Clone, Debug, Error, PartialEq)]
pub enum RankError {
    #[error("Insufficient candidates: {0} usable, need {1}")]
    InsufficientCandidates(usize, usize),
    #[error(transparent)]
    Geo(#[from] GeoError),
}

/// Persistence errors.
///
#[derive(Clone, Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("Point from {0} at {1} already stored")]
    Duplicate(String, i64),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Why a report did not make it in.
///
#[derive(Clone, Debug, Error, PartialEq)]
pub enum IngestError {
    #[error(transparent)]
    Rejected(#[from] ReportError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("Conflict: {0}")]
    Conflict(StoreError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
