//! Configuration parser
//!
//! The page hands configuration over as JSON, either inline in a
//! `<script type="application/json">` block or straight from JavaScript.

use crate::{ConfigError, ConfigValidator, Result, SiteUiConfig};
use serde::de::DeserializeOwned;

/// Configuration parser
pub struct ConfigParser;

impl ConfigParser {
    /// Parse and validate a configuration document
    ///
    /// Blank input yields the defaults, so pages without overrides need no
    /// configuration block at all.
    pub fn parse_json(content: &str) -> Result<SiteUiConfig> {
        if content.trim().is_empty() {
            log::debug!("Empty site UI configuration, using defaults");
            return Ok(SiteUiConfig::default());
        }

        let config: SiteUiConfig = Self::parse_partial(content)?;
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Parse an optional document, defaulting when absent
    pub fn parse_optional(content: Option<&str>) -> Result<SiteUiConfig> {
        match content {
            Some(content) => Self::parse_json(content),
            None => Ok(SiteUiConfig::default()),
        }
    }

    /// Parse any configuration fragment without validation
    pub fn parse_partial<T: DeserializeOwned>(content: &str) -> Result<T> {
        serde_json::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("JSON parse error: {}", e)))
    }

    /// Serialize a configuration back to JSON
    pub fn to_json(config: &SiteUiConfig) -> Result<String> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ConfigError::Parse(format!("JSON serialize error: {}", e)))
    }
}
