use anyhow::{anyhow, Result};
use std::path::Path;

use crate::models::DateRange;

/// Validation utilities for input sanitization and edge case handling
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate the path of a chat export before reading it
    pub fn validate_chat_path(path: &Path) -> Result<()> {
        if path.as_os_str().is_empty() {
            return Err(anyhow!("Chat export path cannot be empty"));
        }

        if !path.exists() {
            return Err(anyhow!("Chat export does not exist: {path:?}"));
        }

        if !path.is_file() {
            return Err(anyhow!("Chat export is not a file: {path:?}"));
        }

        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if !["txt", "csv"].contains(&extension.as_str()) {
            tracing::warn!(?path, "Chat export has an unexpected extension; expected .txt");
        }

        Ok(())
    }

    /// Validate output file path
    pub fn validate_output_path(path: &Path) -> Result<()> {
        let path_str = path.to_string_lossy();
        if path_str.is_empty() {
            return Err(anyhow!("Output path cannot be empty"));
        }

        if path_str.len() > 4096 {
            return Err(anyhow!("Output path too long (max 4096 characters)"));
        }

        if path.is_dir() {
            return Err(anyhow!("Output path is a directory: {path:?}"));
        }

        Ok(())
    }

    /// Validate date range
    pub fn validate_date_range(range: &DateRange) -> Result<()> {
        if let (Some(start), Some(end)) = (range.start, range.end) {
            if start > end {
                return Err(anyhow!("Start date cannot be after end date"));
            }
        }
        Ok(())
    }

    /// Validate user name
    pub fn validate_user_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(anyhow!("User name cannot be empty"));
        }

        if name.contains('\0') || name.contains('\r') || name.contains('\n') {
            return Err(anyhow!("User name contains invalid characters"));
        }

        Ok(())
    }

    /// Validate a "top N" style count
    pub fn validate_top_n(what: &str, n: usize) -> Result<()> {
        if n == 0 {
            return Err(anyhow!("{what} must be greater than 0"));
        }

        if n > 10_000 {
            return Err(anyhow!("{what} too large (max 10,000)"));
        }

        Ok(())
    }

    /// Validate the half-width of the neutral sentiment band
    pub fn validate_sentiment_band(band: f32) -> Result<()> {
        if !(0.0..1.0).contains(&band) {
            return Err(anyhow!("Sentiment neutral band must be in [0, 1), got {band}"));
        }
        Ok(())
    }

    /// Sanitize text input
    #[must_use]
    pub fn sanitize_text(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t' || *c == '\r')
            .collect::<String>()
            .trim()
            .to_string()
    }
}
