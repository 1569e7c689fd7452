// ABOUTME: Configuration module for the deckforge application
// ABOUTME: Resolves storage root and converter settings from the environment

use crate::errors::{DeckError, Result};
use std::env;
use std::path::PathBuf;

const DEFAULT_TIMEOUT_MS: u64 = 120_000;

/// Global configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory for persisted state and generated files. Required.
    pub storage_dir: PathBuf,
    /// Path to the document-to-PDF converter binary.
    pub soffice_path: String,
    /// Path to the PDF-to-raster converter binary.
    pub pdftoppm_path: String,
    /// Upper bound for a single converter invocation.
    pub convert_timeout_ms: u64,
    /// Raster resolution in DPI.
    pub raster_dpi: u32,
}

impl Config {
    /// Load configuration from environment variables. `STORAGE_DIR` is
    /// mandatory; everything else has a default.
    pub fn from_env() -> Result<Self> {
        let storage_dir = env::var("STORAGE_DIR")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| DeckError::Config("STORAGE_DIR is required".to_string()))?;

        let soffice_path = env::var("SOFFICE_PATH").unwrap_or_else(|_| "soffice".to_string());
        let pdftoppm_path = env::var("PDFTOPPM_PATH").unwrap_or_else(|_| "pdftoppm".to_string());
        let convert_timeout_ms = env::var("CONVERT_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        let raster_dpi = env::var("RASTER_DPI")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(150);

        Ok(Self {
            storage_dir,
            soffice_path,
            pdftoppm_path,
            convert_timeout_ms,
            raster_dpi,
        })
    }

    /// Build a configuration rooted at an explicit directory, with defaults
    /// for everything else.
    pub fn with_storage_dir(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            soffice_path: "soffice".to_string(),
            pdftoppm_path: "pdftoppm".to_string(),
            convert_timeout_ms: DEFAULT_TIMEOUT_MS,
            raster_dpi: 150,
        }
    }
}
