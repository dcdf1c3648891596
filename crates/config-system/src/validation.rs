//! Configuration validation utilities

use crate::{CarouselConfig, ChromeConfig, ConfigError, LightboxConfig, Result, SiteUiConfig};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a complete configuration
    pub fn validate(config: &SiteUiConfig) -> Result<()> {
        Self::validate_carousel(&config.carousel)?;
        Self::validate_lightbox(&config.lightbox)?;
        Self::validate_chrome(&config.chrome)?;
        Ok(())
    }

    /// Validate carousel timings and selectors
    fn validate_carousel(carousel: &CarouselConfig) -> Result<()> {
        if carousel.autoplay_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "autoplay_interval_ms must be greater than 0".to_string(),
            ));
        }

        if !carousel.swipe_threshold_px.is_finite() || carousel.swipe_threshold_px < 0.0 {
            return Err(ConfigError::Validation(format!(
                "Invalid swipe_threshold_px: {}. Must be a finite, non-negative distance",
                carousel.swipe_threshold_px
            )));
        }

        // Cleanup releases the transition lock, so it has to land after the
        // slide swap and the slide-in have both been scheduled.
        let phases = carousel.swap_delay_ms as u64 + carousel.slide_duration_ms as u64;
        if carousel.cleanup_delay_ms as u64 <= phases {
            return Err(ConfigError::Validation(format!(
                "cleanup_delay_ms ({}) must exceed swap_delay_ms + slide_duration_ms ({})",
                carousel.cleanup_delay_ms, phases
            )));
        }

        if carousel.autoplay && carousel.cleanup_delay_ms >= carousel.autoplay_interval_ms {
            return Err(ConfigError::Validation(format!(
                "cleanup_delay_ms ({}) must be shorter than autoplay_interval_ms ({})",
                carousel.cleanup_delay_ms, carousel.autoplay_interval_ms
            )));
        }

        let selectors = &carousel.selectors;
        Self::require_non_empty("carousel.selectors.slide", &selectors.slide)?;
        Self::require_non_empty("carousel.selectors.next", &selectors.next)?;
        Self::require_non_empty("carousel.selectors.prev", &selectors.prev)?;
        Self::require_non_empty("carousel.selectors.surface", &selectors.surface)?;
        Self::require_non_empty("carousel.selectors.text", &selectors.text)?;
        Self::require_class_name("carousel.active_class", &carousel.active_class)?;

        Ok(())
    }

    fn validate_lightbox(lightbox: &LightboxConfig) -> Result<()> {
        Self::require_non_empty("lightbox.image_selector", &lightbox.image_selector)?;
        Self::require_non_empty("lightbox.gallery_attribute", &lightbox.gallery_attribute)?;
        Self::require_non_empty(
            "lightbox.full_source_attribute",
            &lightbox.full_source_attribute,
        )?;
        Self::require_class_name("lightbox.modal_id", &lightbox.modal_id)?;
        Self::require_class_name("lightbox.open_class", &lightbox.open_class)?;
        Ok(())
    }

    fn validate_chrome(chrome: &ChromeConfig) -> Result<()> {
        Self::require_non_empty("chrome.year_selector", &chrome.year_selector)?;
        Self::require_non_empty("chrome.menu_button_selector", &chrome.menu_button_selector)?;
        Self::require_non_empty("chrome.nav_selector", &chrome.nav_selector)?;
        Self::require_non_empty("chrome.nav_link_selector", &chrome.nav_link_selector)?;

        if chrome.thresholds.is_empty() {
            return Err(ConfigError::Validation(
                "chrome.thresholds cannot be empty".to_string(),
            ));
        }

        if let Some(bad) = chrome
            .thresholds
            .iter()
            .find(|t| !(0.0..=1.0).contains(*t))
        {
            return Err(ConfigError::Validation(format!(
                "Invalid intersection threshold: {}. Must be between 0.0 and 1.0",
                bad
            )));
        }

        Ok(())
    }

    fn require_non_empty(field: &str, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", field)));
        }
        Ok(())
    }

    /// Class names and ids are written verbatim, so no whitespace
    fn require_class_name(field: &str, value: &str) -> Result<()> {
        Self::require_non_empty(field, value)?;
        if value.chars().any(char::is_whitespace) {
            return Err(ConfigError::Validation(format!(
                "{} must be a single token, got {:?}",
                field, value
            )));
        }
        Ok(())
    }
}
