use thiserror::Error;

/// Everything that can go wrong while turning a telemetry packet into a `TelemetryFix`.
///
/// All of these are fatal for the packet at hand and for that packet only.
///
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("Malformed packet: {0}")]
    MalformedPacket(String),
    #[error("Truncated packet: {0} bytes, need at least {1}")]
    TruncatedPacket(usize, usize),
    #[error("Invalid coordinate ({0}, {1})")]
    InvalidCoordinate(f64, f64),
    #[error("Invalid fix time {0}")]
    InvalidTimestamp(String),
}

/// Rejections of an inbound tracking report.
///
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ReportError {
    #[error("Report is not a JSON object")]
    NotAnObject,
    #[error("Missing field {0}")]
    MissingField(&'static str),
    #[error("Null or empty field {0}")]
    EmptyField(&'static str),
    #[error("Invalid report: {0}")]
    Invalid(String),
    #[error("Invalid position ({0}, {1})")]
    InvalidCoordinate(f64, f64),
}
