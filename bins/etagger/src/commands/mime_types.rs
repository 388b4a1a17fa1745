//! List supported media types

use crate::OutputFormat;
use etagger::SupportedMimeType;

pub fn run(format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&SupportedMimeType::ALL)?);
        }
        OutputFormat::Text => {
            for mime in SupportedMimeType::ALL {
                println!("{mime}");
            }
        }
    }
    Ok(())
}
