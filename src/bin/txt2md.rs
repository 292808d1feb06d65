//! Converts tStudio tN/tQ note exports to Markdown and writes a manifest
//! fragment to paste into manifest.yaml.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use obs_export::convert::Converter;
use obs_export::settings::ConvertSettings;
use tracing::info;

#[derive(Parser)]
#[command(name = "txt2md", about = "Convert tStudio note folders to Markdown")]
struct Cli {
    /// A book folder, or a folder of book folders. Use . for the current folder.
    folder: PathBuf,
}

fn main() -> Result<()> {
    obs_export::init_tracing();
    let cli = Cli::parse();
    let settings = ConvertSettings::load()?;
    info!(settings_loaded = ?settings, msg = "Starting tStudio conversion");

    let mut converter = Converter::from_settings(&settings)?;
    let outcomes = converter.convert(&cli.folder)?;
    let converted = outcomes.iter().filter(|o| o.is_converted()).count();
    println!(
        "\n{} of {} folders converted, manifest: {:?}",
        converted,
        outcomes.len(),
        converter.manifest().path()
    );

    println!("\nDone.");
    Ok(())
}
