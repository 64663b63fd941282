//! This is the packed binary report sent by the EDGE flight computer through its Iridium modem.
//!
//! The modem relays it as a hex string; once decoded we get consecutive little-endian 32-bit
//! words followed by an optional free-text header:
//!
//! - LAT: 4 signed, millionths of degree
//! - LON: 4 signed, millionths of degree
//! - ALT: 4 signed, centimeters
//! - SPD/DIR: 4 unsigned, speed in 1/100 knot (high 16 bits) and heading in 1/100 degree (low 16)
//! - DAY: 4 unsigned, `ddmmyy` as a number
//! - UTC: 4 unsigned, `hhmmsscc` as a number
//! - AGE: 4 unsigned, msec since the fix was computed
//! - HDR: up to 12 bytes, NUL-terminated ASCII
//!
//! Leading zeroes of DAY and UTC are lost in transmission as they are sent as numbers.
//!

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Utc};
use nom::combinator::map;
use nom::number::complete::{le_i32, le_u32};
use nom::sequence::tuple;
use nom::IResult;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use skytrack_common::Coordinate;

use crate::DecodeError;

/// Size of the fixed part of a packet.
pub const FIXED_LEN: usize = 28;
/// Maximum size of the trailing header.
pub const HEADER_LEN: usize = 12;

/// One knot in m/s.
const KNOT: f64 = 0.514444;

/// Date & time digit counts as sent.
const DATE_DIGITS: usize = 6;
const TIME_DIGITS: usize = 8;

/// A single decoded position/velocity/time report.
///
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TelemetryFix {
    /// Device or correlation id, filled in by whoever knows it (the envelope)
    pub id: Option<String>,
    /// Position
    pub position: Coordinate,
    /// Altitude in meters
    pub altitude: f64,
    /// Ground speed in m/s
    pub speed: f64,
    /// Heading in degrees
    pub heading: f64,
    /// Time of fix, UTC, seconds since epoch on the wire
    #[serde(with = "chrono::serde::ts_seconds")]
    pub time: DateTime<Utc>,
    /// Age of the fix in ms when the packet was sent
    pub age: u32,
    /// Optional free text, printable ASCII only
    pub header: Option<String>,
}

/// Fixed part of the packet, as found on the wire.
///
#[derive(Debug)]
struct RawFix {
    lat: i32,
    lon: i32,
    alt: i32,
    spd_dir: u32,
    date: u32,
    time: u32,
    age: u32,
}

fn raw_fix(input: &[u8]) -> IResult<&[u8], RawFix> {
    map(
        tuple((le_i32, le_i32, le_i32, le_u32, le_u32, le_u32, le_u32)),
        |(lat, lon, alt, spd_dir, date, time, age)| RawFix {
            lat,
            lon,
            alt,
            spd_dir,
            date,
            time,
            age,
        },
    )(input)
}

impl TelemetryFix {
    /// Time of fix as seconds since epoch.
    ///
    #[inline]
    pub fn utc(&self) -> i64 {
        self.time.timestamp()
    }

    /// Same fix, tagged with an identifier.
    ///
    pub fn with_id(self, id: &str) -> Self {
        TelemetryFix {
            id: Some(id.to_owned()),
            ..self
        }
    }
}

/// Decode the hex string relayed by the modem.
///
#[tracing::instrument]
pub fn decode_hex(data: &str) -> Result<TelemetryFix, DecodeError> {
    let payload =
        hex::decode(data.trim()).map_err(|e| DecodeError::MalformedPacket(e.to_string()))?;
    decode(&payload)
}

/// Decode a binary packet into a `TelemetryFix`.
///
#[tracing::instrument(skip(payload), fields(len = payload.len()))]
pub fn decode(payload: &[u8]) -> Result<TelemetryFix, DecodeError> {
    let len = payload.len();
    if len % 4 != 0 {
        return Err(DecodeError::MalformedPacket(format!(
            "{len} bytes is not a multiple of 4"
        )));
    }
    if len < FIXED_LEN {
        return Err(DecodeError::TruncatedPacket(len, FIXED_LEN));
    }

    let (rest, raw) =
        raw_fix(payload).map_err(|_| DecodeError::TruncatedPacket(len, FIXED_LEN))?;
    trace!("raw = {raw:?}");

    let (lat, lon) = (raw.lat as f64 / 1_000_000., raw.lon as f64 / 1_000_000.);
    let position =
        Coordinate::new(lat, lon).map_err(|_| DecodeError::InvalidCoordinate(lat, lon))?;

    let fix = TelemetryFix {
        id: None,
        position,
        altitude: raw.alt as f64 / 100.,
        speed: (raw.spd_dir >> 16) as f64 / 100. * KNOT,
        heading: (raw.spd_dir & 0xffff) as f64 / 100.,
        time: fix_time(raw.date, raw.time)?,
        age: raw.age,
        header: header(rest),
    };
    debug!("fix = {fix:?}");
    Ok(fix)
}

/// Rebuild the `ddmmyyhhmmss` instant, both numbers are padded back to their full width.
///
/// A number with more digits than its field can not be a valid date or time.
///
fn fix_time(date: u32, time: u32) -> Result<DateTime<Utc>, DecodeError> {
    let date = format!("{:0w$}", date, w = DATE_DIGITS);
    let time = format!("{:0w$}", time, w = TIME_DIGITS);
    if date.len() != DATE_DIGITS || time.len() != TIME_DIGITS {
        return Err(DecodeError::InvalidTimestamp(format!("{date}/{time}")));
    }

    // centiseconds are dropped
    let stamp = format!("{date}{}", &time[..6]);
    let t = NaiveDateTime::parse_from_str(&stamp, "%d%m%y%H%M%S")
        .map_err(|_| DecodeError::InvalidTimestamp(stamp.clone()))?;
    Ok(t.and_utc())
}

/// Best effort extraction of the trailing text.
///
/// Stops at the first NUL and keeps printable ASCII only.  Any trouble means no header.
///
fn header(rest: &[u8]) -> Option<String> {
    let field = rest.get(..rest.len().min(HEADER_LEN))?;
    let text = field
        .iter()
        .take_while(|&&b| b != 0)
        .filter(|&&b| b.is_ascii_graphic() || b == b' ')
        .copied()
        .collect::<Vec<u8>>();

    match String::from_utf8(text) {
        Ok(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    }
}

/// Pack a fix the way the flight computer does.  Mostly used for simulation and tests.
///
pub fn encode(fix: &TelemetryFix) -> Vec<u8> {
    let lat = (fix.position.lat() * 1_000_000.).round() as i32;
    let lon = (fix.position.lon() * 1_000_000.).round() as i32;
    let alt = (fix.altitude * 100.).round() as i32;
    let spd = ((fix.speed / KNOT) * 100.).round() as u32 & 0xffff;
    let dir = (fix.heading * 100.).round() as u32 & 0xffff;

    let t = fix.time;
    let date = t.day() * 10_000 + t.month() * 100 + (t.year() % 100) as u32;
    let time = t.hour() * 1_000_000 + t.minute() * 10_000 + t.second() * 100;

    let mut out = Vec::with_capacity(FIXED_LEN + HEADER_LEN);
    out.extend_from_slice(&lat.to_le_bytes());
    out.extend_from_slice(&lon.to_le_bytes());
    out.extend_from_slice(&alt.to_le_bytes());
    out.extend_from_slice(&((spd << 16) | dir).to_le_bytes());
    out.extend_from_slice(&date.to_le_bytes());
    out.extend_from_slice(&time.to_le_bytes());
    out.extend_from_slice(&fix.age.to_le_bytes());

    if let Some(hdr) = &fix.header {
        let mut field = [0u8; HEADER_LEN];
        hdr.bytes()
            .filter(u8::is_ascii)
            .take(HEADER_LEN - 1)
            .enumerate()
            .for_each(|(i, b)| field[i] = b);
        out.extend_from_slice(&field);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    /// lat 39.7, lon -104.9, alt 1600m, 19.44kt @ 270.5°, 01/02/24 10:30:45.12, age 1500ms, "EDGE-1"
    const PACKET: &str =
        "20c65d02605abff900710200aa699807f0270000003c9d00dc050000454447452d31000000000000";

    fn pack(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    fn words(lat: i32, lon: i32, date: u32, time: u32) -> Vec<u32> {
        vec![
            lat as u32,
            lon as u32,
            160_000,
            (1944 << 16) | 27050,
            date,
            time,
            1500,
        ]
    }

    #[test]
    fn test_decode_hex_packet() {
        let fix = decode_hex(PACKET).unwrap();

        assert_eq!(39.7, fix.position.lat());
        assert_eq!(-104.9, fix.position.lon());
        assert_eq!(1600.0, fix.altitude);
        assert!((fix.speed - 19.44 * KNOT).abs() < 1e-9);
        assert_eq!(270.5, fix.heading);
        assert_eq!(1_706_783_445, fix.utc());
        assert_eq!(1500, fix.age);
        assert_eq!(Some("EDGE-1".to_string()), fix.header);
        assert_eq!(None, fix.id);
    }

    #[test]
    fn test_decode_without_header() {
        let fix = decode(&pack(&words(39_700_000, -104_900_000, 10224, 10304512))).unwrap();
        assert_eq!(None, fix.header);
        assert_eq!(1_706_783_445, fix.utc());
    }

    #[rstest]
    #[case(1)]
    #[case(27)]
    #[case(30)]
    #[case(41)]
    fn test_decode_not_multiple_of_4(#[case] len: usize) {
        let data = vec![0u8; len];
        assert!(matches!(decode(&data), Err(DecodeError::MalformedPacket(_))));
    }

    #[rstest]
    #[case(0)]
    #[case(4)]
    #[case(24)]
    fn test_decode_truncated(#[case] len: usize) {
        let data = vec![0u8; len];
        assert_eq!(Err(DecodeError::TruncatedPacket(len, FIXED_LEN)), decode(&data));
    }

    #[rstest]
    #[case("zz")]
    #[case("20c")]
    fn test_decode_hex_bad(#[case] s: &str) {
        assert!(matches!(decode_hex(s), Err(DecodeError::MalformedPacket(_))));
    }

    #[rstest]
    #[case(91_000_000, 0)]
    #[case(0, -180_000_001)]
    fn test_decode_bad_coordinate(#[case] lat: i32, #[case] lon: i32) {
        let data = pack(&words(lat, lon, 10224, 10304512));
        assert!(matches!(
            decode(&data),
            Err(DecodeError::InvalidCoordinate(_, _))
        ));
    }

    #[rstest]
    #[case(311299, 23595999, 946_684_799)]
    #[case(50724, 5000000, 1_720_155_600)]
    #[case(10224, 45, 1_706_745_600)]
    fn test_decode_dropped_zeroes(#[case] date: u32, #[case] time: u32, #[case] utc: i64) {
        let fix = decode(&pack(&words(0, 0, date, time))).unwrap();
        assert_eq!(utc, fix.utc());
    }

    #[rstest]
    #[case(1224, 304512)]
    #[case(3202244, 10304512)]
    #[case(10224, 250000000)]
    #[case(320224, 10304512)]
    #[case(10224, 25304512)]
    fn test_decode_bad_time(#[case] date: u32, #[case] time: u32) {
        let data = pack(&words(0, 0, date, time));
        assert!(matches!(decode(&data), Err(DecodeError::InvalidTimestamp(_))));
    }

    #[test]
    fn test_decode_short_time_padded() {
        // 01/02/24 00:30:45
        let fix = decode(&pack(&words(0, 0, 10224, 304512))).unwrap();
        let want = Utc.with_ymd_and_hms(2024, 2, 1, 0, 30, 45).unwrap();
        assert_eq!(want, fix.time);
    }

    #[test]
    fn test_header_garbage() {
        let mut data = pack(&words(0, 0, 10224, 10304512));
        data.extend_from_slice(&[0xff, 0xfe, b'O', b'K', 0x80, 0, b'X', b'Y']);
        let fix = decode(&data).unwrap();
        assert_eq!(Some("OK".to_string()), fix.header);

        let mut data = pack(&words(0, 0, 10224, 10304512));
        data.extend_from_slice(&[0xff, 0xfe, 0x90, 0]);
        let fix = decode(&data).unwrap();
        assert_eq!(None, fix.header);
    }

    #[test]
    fn test_encode_decode() {
        let fix = TelemetryFix {
            id: None,
            position: Coordinate::new(-33.865143, 151.2099).unwrap(),
            altitude: 31_234.56,
            speed: 23.7,
            heading: 12.34,
            time: Utc.with_ymd_and_hms(2023, 11, 5, 7, 8, 9).unwrap(),
            age: 42,
            header: Some("BALLOON".into()),
        };
        let back = decode(&encode(&fix)).unwrap();

        assert!((fix.position.lat() - back.position.lat()).abs() <= 1e-6);
        assert!((fix.position.lon() - back.position.lon()).abs() <= 1e-6);
        assert!((fix.altitude - back.altitude).abs() <= 0.01);
        assert!((fix.speed - back.speed).abs() <= 0.01 * KNOT);
        assert!((fix.heading - back.heading).abs() <= 0.01);
        assert_eq!(fix.time, back.time);
        assert_eq!(fix.header, back.header);
    }
}
