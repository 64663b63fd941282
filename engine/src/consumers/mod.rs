//! Subscribers of the point topic, each one feeding a namespace of the real-time clients.
//!
//! | Consumer          | Dispatch   | Namespace  |
//! |-------------------|------------|------------|
//! | `TrackerConsumer` | inline     | `/events`  |
//! | `NavaidConsumer`  | background | `/vor`     |
//! | `PredictConsumer` | inline     | `/predict` |
//!

pub use navaid::*;
pub use predict::*;
pub use tracker::*;

mod navaid;
mod predict;
mod tracker;

/// Live map
pub const EVENTS_NS: &str = "/events";
/// Closest navigation aids
pub const VOR_NS: &str = "/vor";
/// Landing prediction
pub const PREDICT_NS: &str = "/predict";

/// Event name for a new point, whatever the namespace.
pub const POINT_EVENT: &str = "point";
/// Event name for the initial set of tracks sent to a new client.
pub const POINTS_EVENT: &str = "points";
