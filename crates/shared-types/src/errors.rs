//! Common error type used across the site UI crates

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base error type for site UI operations
///
/// Controllers never surface these for missing markup; they show up only at
/// the edges (element creation, browser globals, configuration).
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum SiteUiError {
    #[error("DOM operation failed: {message}")]
    Dom { message: String },

    #[error("Missing browser global: {name}")]
    MissingGlobal { name: String },

    #[error("JavaScript interop error: {message}")]
    JsInterop { message: String },

    #[error("Invalid configuration: {message}")]
    Config { message: String },
}

/// Result type alias for site UI operations
pub type SiteUiResult<T> = Result<T, SiteUiError>;

impl SiteUiError {
    pub fn dom(message: impl Into<String>) -> Self {
        SiteUiError::Dom {
            message: message.into(),
        }
    }

    pub fn missing_global(name: impl Into<String>) -> Self {
        SiteUiError::MissingGlobal { name: name.into() }
    }
}

#[cfg(feature = "wasm")]
impl From<wasm_bindgen::JsValue> for SiteUiError {
    fn from(err: wasm_bindgen::JsValue) -> Self {
        SiteUiError::JsInterop {
            message: format!("{err:?}"),
        }
    }
}

#[cfg(feature = "wasm")]
impl From<SiteUiError> for wasm_bindgen::JsValue {
    fn from(err: SiteUiError) -> Self {
        wasm_bindgen::JsValue::from_str(&err.to_string())
    }
}
