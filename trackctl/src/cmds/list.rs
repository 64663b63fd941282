use eyre::Result;
use strum::VariantNames;

use skytrack_common::Unit;
use skytrack_formats::Format;

/// Fetch the list of supported formats and their description.
///
pub fn list_formats() -> Result<String> {
    Format::list()
}

/// Distance units `rank` knows about.
///
pub fn list_units() -> Result<String> {
    Ok(format!("List all units:\n{}", Unit::VARIANTS.join("\n")))
}
