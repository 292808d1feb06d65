//! Exports the OBS key terms, translation notes, comprehension questions and
//! term usage catalogs to JSON.

use anyhow::Result;
use obs_export::catalog::today_stamp;
use obs_export::export;
use obs_export::settings::ExportSettings;
use tracing::info;

fn main() -> Result<()> {
    obs_export::init_tracing();
    let settings = ExportSettings::load()?;
    info!(settings_loaded = ?settings, msg = "Starting OBS JSON export");

    println!("OBS JSON Export");
    println!("===============\n");
    println!("Pages: {:?}", settings.lang_pages());
    println!("API:   {:?}\n", settings.lang_api());

    let summary = export::run(&settings, &today_stamp())?;
    summary.print();

    println!("\nDone.");
    Ok(())
}
