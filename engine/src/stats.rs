//! All about `Stats`.

use std::fmt::{Display, Formatter};

use serde::Serialize;

/// `Stats` keeps track of what happened to the reports we were given.
///
/// # Fields
///
/// - `tm`: elapsed time in seconds since counting began.
/// - `accepted`: reports validated and stored.
/// - `rejected`: reports refused before storage (missing fields, bad packet, …).
/// - `conflicts`: reports the store refused, generally duplicates.
/// - `published`: reports handed to the hub.
/// - `failed`: inline subscriber invocations that failed.
/// - `dropped`: background jobs the pool had no room for.
///
/// # Example
///
/// ```rust
/// use skytrack_engine::Stats;
///
/// let stats = Stats {
///     tm: 60,
///     accepted: 42,
///     rejected: 2,
///     ..Default::default()
/// };
///
/// println!("Stats summary: {}", stats);
/// ```
///
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Stats {
    pub tm: u64,
    pub accepted: u32,
    pub rejected: u32,
    pub conflicts: u32,
    pub published: u32,
    pub failed: u32,
    pub dropped: u32,
}

impl Display for Stats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "time={}s accepted={} rejected={} conflicts={} published={} failed={} dropped={}",
            self.tm,
            self.accepted,
            self.rejected,
            self.conflicts,
            self.published,
            self.failed,
            self.dropped
        )
    }
}
