//! Configuration system for the site UI
//! Timing constants, gesture thresholds and markup selectors, all overridable

use serde::{Deserialize, Serialize};
use site_ui_shared::SiteUiError;
use thiserror::Error;

pub mod parser;
pub mod validation;

pub use parser::ConfigParser;
pub use validation::ConfigValidator;

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

impl From<ConfigError> for SiteUiError {
    fn from(err: ConfigError) -> Self {
        SiteUiError::Config {
            message: err.to_string(),
        }
    }
}

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteUiConfig {
    pub carousel: CarouselConfig,
    pub lightbox: LightboxConfig,
    pub chrome: ChromeConfig,
}

/// Hero carousel timing and markup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarouselConfig {
    /// Whether the carousel advances on its own
    pub autoplay: bool,
    pub autoplay_interval_ms: u32,
    /// Horizontal travel a swipe must exceed (CSS pixels)
    pub swipe_threshold_px: f64,
    /// Delay between fading out the outgoing text and swapping slides
    pub swap_delay_ms: u32,
    /// Length of the slide position/opacity transition
    pub slide_duration_ms: u32,
    /// Time from trigger to cleanup; the only point a transition ends
    pub cleanup_delay_ms: u32,
    pub text_out_ms: u32,
    pub text_in_ms: u32,
    pub stagger_base_ms: u32,
    pub stagger_step_ms: u32,
    pub selectors: CarouselSelectors,
    pub active_class: String,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            autoplay: true,
            autoplay_interval_ms: 7000,
            swipe_threshold_px: 50.0,
            swap_delay_ms: 150,
            slide_duration_ms: 400,
            cleanup_delay_ms: 1200,
            text_out_ms: 300,
            text_in_ms: 600,
            stagger_base_ms: 200,
            stagger_step_ms: 200,
            selectors: CarouselSelectors::default(),
            active_class: "is-active".to_string(),
        }
    }
}

impl CarouselConfig {
    /// `transition-delay` for the `index`-th text fragment of an incoming slide
    pub fn stagger_delay_ms(&self, index: usize) -> u32 {
        self.stagger_base_ms
            .saturating_add(self.stagger_step_ms.saturating_mul(index as u32))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarouselSelectors {
    pub slide: String,
    pub next: String,
    pub prev: String,
    /// Element whose hover pauses autoplay and which receives swipes
    pub surface: String,
    /// Text fragments inside a slide that animate on their own
    pub text: String,
}

impl Default for CarouselSelectors {
    fn default() -> Self {
        Self {
            slide: ".hero__slide".to_string(),
            next: ".hero__ctrl.next".to_string(),
            prev: ".hero__ctrl.prev".to_string(),
            surface: ".hero__slides".to_string(),
            text: "h1, .pill".to_string(),
        }
    }
}

/// Gallery lightbox markup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightboxConfig {
    pub image_selector: String,
    pub gallery_attribute: String,
    /// Attribute holding the full-size source; falls back to `src`
    pub full_source_attribute: String,
    pub modal_id: String,
    pub open_class: String,
}

impl Default for LightboxConfig {
    fn default() -> Self {
        Self {
            image_selector: "[data-gallery]".to_string(),
            gallery_attribute: "data-gallery".to_string(),
            full_source_attribute: "data-full".to_string(),
            modal_id: "lightbox".to_string(),
            open_class: "is-open".to_string(),
        }
    }
}

/// Footer year, mobile menu and active-link highlighting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromeConfig {
    pub year_selector: String,
    pub menu_button_selector: String,
    pub nav_selector: String,
    pub nav_link_selector: String,
    pub root_margin: String,
    pub thresholds: Vec<f64>,
}

impl Default for ChromeConfig {
    fn default() -> Self {
        Self {
            year_selector: "#year".to_string(),
            menu_button_selector: "#menu-button".to_string(),
            nav_selector: "#primary-nav".to_string(),
            nav_link_selector: "a[href^=\"#\"]".to_string(),
            root_margin: "-35% 0px -35% 0px".to_string(),
            thresholds: vec![0.0, 0.25, 0.5, 0.75, 1.0],
        }
    }
}
