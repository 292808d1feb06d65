use thiserror::Error;

/// A page is missing structure the exporter cannot do without.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("required section not found: {section}")]
    MissingSection { section: &'static str },

    #[error("no chapter-frame reference in file name: {0}")]
    MissingFrameId(String),
}

impl ExtractError {
    pub fn missing(section: &'static str) -> Self {
        ExtractError::MissingSection { section }
    }
}
