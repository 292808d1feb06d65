use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

const DEFAULT_PAGES_ROOT: &str = "/var/www/vhosts/door43.org/httpdocs/data/gitrepo/pages";
const DEFAULT_API_ROOT: &str = "/var/www/vhosts/api.unfoldingword.org/httpdocs/obs/txt/1";

/// Paths for the wiki-to-JSON export. Overridable with `OBS_PAGES_ROOT`,
/// `OBS_API_ROOT` and `OBS_LANG`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportSettings {
    pub pages_root: PathBuf,
    pub api_root: PathBuf,
    pub lang: String,
}

impl ExportSettings {
    pub fn load() -> Result<Self> {
        Config::builder()
            .set_default("pages_root", DEFAULT_PAGES_ROOT)?
            .set_default("api_root", DEFAULT_API_ROOT)?
            .set_default("lang", "en")?
            .add_source(Environment::with_prefix("OBS"))
            .build()
            .and_then(|c| c.try_deserialize())
            .context("Failed to load export settings")
    }

    /// `<pages_root>/<lang>`
    pub fn lang_pages(&self) -> PathBuf {
        self.pages_root.join(&self.lang)
    }

    /// `<api_root>/<lang>`
    pub fn lang_api(&self) -> PathBuf {
        self.api_root.join(&self.lang)
    }
}

/// Output locations for the tStudio converter (`TXT2MD_TARGET_DIR`, `TXT2MD_VERSES_PATH`).
#[derive(Debug, Clone, Deserialize)]
pub struct ConvertSettings {
    pub target_dir: PathBuf,
    pub verses_path: PathBuf,
}

impl ConvertSettings {
    pub fn load() -> Result<Self> {
        Config::builder()
            .set_default("target_dir", "md_out")?
            .set_default("verses_path", "verses.json")?
            .add_source(Environment::with_prefix("TXT2MD"))
            .build()
            .and_then(|c| c.try_deserialize())
            .context("Failed to load converter settings")
    }
}

// ── Tests ──
