use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::EnumString;
use tabled::builder::Builder;
use tabled::settings::Style;

/// Current formats.hcl version
///
const FVERSION: usize = 3;

/// Descriptor for each of the supported input formats, loaded from `formats.hcl`.
///
#[derive(Debug, Deserialize)]
pub struct FormatDescr {
    /// Type of data each format refers to
    #[serde(rename = "type")]
    pub dtype: String,
    /// Free text description
    pub description: String,
    /// Source
    pub source: String,
    /// URL to the site where this is defined
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FormatFile {
    /// Version
    pub version: usize,
    /// Ordered list of format metadata
    pub format: BTreeMap<String, FormatDescr>,
}

/// Input formats accepted by the ingestion side.
///
/// ```rust
/// use skytrack_formats::Format;
///
/// let f: Format = "RockBlock".parse().unwrap();
/// assert_eq!(Format::RockBlock, f);
/// ```
///
#[derive(
    Copy, Clone, Debug, Default, Deserialize, PartialEq, Eq, strum::Display, EnumString, Serialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Format {
    #[default]
    None,
    /// Bare hex-encoded EDGE packet
    Edge,
    /// RockBLOCK envelope around an EDGE packet
    RockBlock,
    /// JSON tracking report
    Report,
}

impl Format {
    /// List all supported formats into a string using `tabled`.
    ///
    pub fn list() -> eyre::Result<String> {
        let descr = include_str!("formats.hcl");
        let fstr: FormatFile = hcl::from_str(descr)?;

        if fstr.version != FVERSION {
            return Err(eyre::eyre!(
                "bad formats.hcl version {}, need {FVERSION}",
                fstr.version
            ));
        }

        let header = vec!["Name", "Type", "Description"];

        let mut builder = Builder::default();
        builder.push_record(header);

        fstr.format.iter().for_each(|(name, entry)| {
            let text = match &entry.url {
                Some(url) => format!("{}\nSource: {} -- URL: {}", entry.description, entry.source, url),
                None => format!("{}\nSource: {}", entry.description, entry.source),
            };
            builder.push_record(vec![name.as_str(), entry.dtype.as_str(), text.as_str()]);
        });
        let allf = builder.build().with(Style::modern()).to_string();
        Ok(format!("List all formats:\n{allf}"))
    }
}
