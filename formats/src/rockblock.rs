//! This is the envelope the RockBLOCK web service posts for every mobile-originated message.
//!
//! URL: https://docs.rockblock.rock7.com/docs/integrating-via-http-webhooks
//!

use serde::{Deserialize, Serialize};

use crate::{decode_hex, DecodeError, Report, TelemetryFix};

/// Source tag for reports coming through the Iridium network.
pub const SATCOM: &str = "satcom";

/// Data that all RockBLOCKs deliver over the Iridium network.
///
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RockBlock {
    /// Unique IMEI of the device
    pub imei: String,
    /// Message sequence number, wraps around after 65535
    pub momsn: u16,
    /// Date & time (UTC) of the transmission, e.g. `12-10-10 10:41:50`
    pub transmit_time: String,
    /// Approximate latitude of the modem at transmission time
    pub iridium_latitude: f64,
    /// Approximate longitude of the modem at transmission time
    pub iridium_longitude: f64,
    /// Accuracy estimate (km) of the two fields above
    pub iridium_cep: f64,
    /// Our message, hex-encoded
    pub data: String,
}

impl RockBlock {
    /// Decode the payload, the fix is tagged with the IMEI.
    ///
    #[tracing::instrument(skip(self), fields(imei = %self.imei, momsn = self.momsn))]
    pub fn decode(&self) -> Result<TelemetryFix, DecodeError> {
        Ok(decode_hex(&self.data)?.with_id(&self.imei))
    }

    /// Decode the payload into a tracking report ready for ingestion.
    ///
    pub fn to_report(&self) -> Result<Report, DecodeError> {
        let fix = self.decode()?;
        let mut report = Report::from_fix(&fix, &self.imei, SATCOM);
        report.extra.insert("momsn".into(), self.momsn.into());
        report
            .extra
            .insert("transmit_time".into(), self.transmit_time.clone().into());
        Ok(report)
    }
}
