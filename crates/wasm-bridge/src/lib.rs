//! WASM bridge for the site UI
//! Mounts the carousel, the lightbox and the page chrome on the live document

use std::rc::Rc;
use std::sync::Once;

use site_ui_config::ConfigParser;
use site_ui_shared::SiteUiError;
use wasm_bindgen::prelude::*;

pub mod chrome;
pub mod controls;
pub mod dom;
pub mod site;

#[cfg(test)]
pub mod testing;

use dom::web::{WebDom, WebScheduler};
use dom::Scheduler;
use site::Site;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        console_error_panic_hook::set_once();
        // Another logger may already be installed by the host page
        let _ = console_log::init_with_level(log::Level::Debug);
    });
}

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn start() {
    init_logging();
    log::info!("Site UI WASM module loaded");
}

#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[wasm_bindgen]
pub struct SiteUi {
    site: Site<WebDom>,
}

#[wasm_bindgen]
impl SiteUi {
    /// Mount every feature found on the page
    ///
    /// Without `config_json` the `#site-ui-config` script block is used, and
    /// without that the built-in defaults.
    #[wasm_bindgen]
    pub fn mount(config_json: Option<String>) -> Result<SiteUi, JsValue> {
        init_logging();

        let dom = Rc::new(WebDom::new()?);
        let config_json = config_json.or_else(|| site::page_config(&*dom));
        let config =
            ConfigParser::parse_optional(config_json.as_deref()).map_err(SiteUiError::from)?;
        let scheduler: Rc<dyn Scheduler> = Rc::new(WebScheduler::new()?);
        let year = js_sys::Date::new_0().get_full_year() as i32;

        Ok(SiteUi {
            site: Site::mount(dom, scheduler, &config, year),
        })
    }

    /// Returns `false` when the request was dropped
    #[wasm_bindgen]
    pub fn next(&self) -> bool {
        self.site.carousel.as_ref().is_some_and(|c| c.next())
    }

    #[wasm_bindgen]
    pub fn prev(&self) -> bool {
        self.site.carousel.as_ref().is_some_and(|c| c.prev())
    }

    #[wasm_bindgen]
    pub fn open_gallery(&self, name: &str, index: u32) {
        self.site.lightbox.open(index as usize, name);
    }

    #[wasm_bindgen]
    pub fn close_lightbox(&self) {
        self.site.lightbox.close();
    }

    /// `undefined` when the page has no carousel
    #[wasm_bindgen]
    pub fn carousel_index(&self) -> Option<u32> {
        self.site
            .carousel
            .as_ref()
            .map(|c| c.current_index() as u32)
    }

    #[wasm_bindgen]
    pub fn lightbox_open(&self) -> bool {
        self.site.lightbox.is_open()
    }

    /// Detach every listener and cancel every timer
    #[wasm_bindgen]
    pub fn dispose(&self) {
        self.site.dispose();
    }
}
