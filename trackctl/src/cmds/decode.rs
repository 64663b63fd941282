//! This is the module handling the `decode` sub-command.
//!

use std::io::Read;
use std::path::Path;

use eyre::Result;
use tracing::trace;

use skytrack_formats::{decode_hex, Format, Report, RockBlock};

use crate::{open_input, DecodeOpts, Status};

/// Source tag for packets decoded by hand.
const MANUAL: &str = "manual";

/// Decode one packet and return it as pretty JSON.
///
#[tracing::instrument]
pub fn decode_packet(dopts: &DecodeOpts) -> Result<String> {
    let data = match &dopts.data {
        Some(data) if data != "-" => data.clone(),
        _ => {
            let mut buf = String::new();
            open_input(Some(Path::new("-")))?.read_to_string(&mut buf)?;
            buf
        }
    };
    decode_str(dopts.format, data.trim(), dopts.edge_id.as_deref())
}

pub(crate) fn decode_str(format: Format, data: &str, edge_id: Option<&str>) -> Result<String> {
    if data.is_empty() {
        return Err(Status::EmptyInput.into());
    }
    trace!("decoding {} bytes as {format}", data.len());

    let out = match format {
        Format::Edge => {
            let fix = decode_hex(data)?;
            match edge_id {
                Some(id) => serde_json::to_string_pretty(&Report::from_fix(&fix, id, MANUAL))?,
                None => serde_json::to_string_pretty(&fix)?,
            }
        }
        Format::RockBlock => {
            let rb: RockBlock = serde_json::from_str(data)?;
            serde_json::to_string_pretty(&rb.to_report()?)?
        }
        _ => return Err(Status::UnsupportedFormat(format.to_string()).into()),
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::Value;
    use skytrack_formats::DecodeError;

    const PACKET: &str =
        "20c65d02605abff900710200aa699807f0270000003c9d00dc050000454447452d31000000000000";

    #[test]
    fn test_decode_edge() {
        let s = decode_str(Format::Edge, PACKET, None).unwrap();
        let v: Value = serde_json::from_str(&s).unwrap();
        assert_eq!(1600.0, v["altitude"]);
        assert_eq!("EDGE-1", v["header"]);
    }

    #[test]
    fn test_decode_edge_report() {
        let s = decode_str(Format::Edge, PACKET, Some("E1")).unwrap();
        let v: Value = serde_json::from_str(&s).unwrap();
        assert_eq!("E1", v["edge_id"]);
        assert_eq!(MANUAL, v["source"]);
        assert_eq!(1_706_783_445, v["time"]);
    }

    #[test]
    fn test_decode_rockblock() {
        let rb = format!(
            r#"{{"imei":"300234010753370","momsn":3,"transmit_time":"24-02-01 10:31:02","iridium_latitude":39.6,"iridium_longitude":-104.8,"iridium_cep":2.0,"data":"{PACKET}"}}"#
        );
        let s = decode_str(Format::RockBlock, &rb, None).unwrap();
        let v: Value = serde_json::from_str(&s).unwrap();
        assert_eq!("300234010753370", v["edge_id"]);
        assert_eq!("satcom", v["source"]);
    }

    #[rstest]
    #[case(Format::Report)]
    #[case(Format::None)]
    fn test_decode_unsupported(#[case] f: Format) {
        let err = decode_str(f, PACKET, None).unwrap_err();
        assert_eq!(
            Some(&Status::UnsupportedFormat(f.to_string())),
            err.downcast_ref::<Status>()
        );
    }

    #[test]
    fn test_decode_truncated() {
        let err = decode_str(Format::Edge, "20c65d02", None).unwrap_err();
        assert_eq!(
            Some(&DecodeError::TruncatedPacket(4, 28)),
            err.downcast_ref::<DecodeError>()
        );
    }

    #[test]
    fn test_decode_empty() {
        let err = decode_str(Format::Edge, "", None).unwrap_err();
        assert_eq!(Some(&Status::EmptyInput), err.downcast_ref::<Status>());
    }
}
