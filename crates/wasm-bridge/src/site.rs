//! Everything mounted on one page

use std::rc::Rc;

use site_ui_config::SiteUiConfig;

use crate::chrome::SiteChrome;
use crate::controls::{Carousel, Lightbox};
use crate::dom::{DomFacade, Scheduler};

/// Id of the optional `<script type="application/json">` config block
pub const PAGE_CONFIG_ID: &str = "site-ui-config";

pub struct Site<D: DomFacade> {
    pub chrome: SiteChrome<D>,
    pub carousel: Option<Carousel<D>>,
    pub lightbox: Lightbox<D>,
}

impl<D: DomFacade> Site<D> {
    pub fn mount(dom: Rc<D>, scheduler: Rc<dyn Scheduler>, config: &SiteUiConfig, year: i32) -> Self {
        let chrome = SiteChrome::mount(dom.clone(), &config.chrome, year);
        let carousel = Carousel::mount(dom.clone(), scheduler, config.carousel.clone());
        let lightbox = Lightbox::mount(dom, config.lightbox.clone());

        log::info!(
            "Site UI mounted (carousel: {}, menu: {}, scroll tracking: {})",
            carousel.is_some(),
            chrome.menu.is_some(),
            chrome.scroll_spy.is_some()
        );
        Self {
            chrome,
            carousel,
            lightbox,
        }
    }

    pub fn dispose(&self) {
        if let Some(carousel) = &self.carousel {
            carousel.dispose();
        }
        self.lightbox.dispose();
        self.chrome.dispose();
    }
}

/// Raw JSON of the page's config block, if it has one
pub fn page_config<D: DomFacade>(dom: &D) -> Option<String> {
    let node = dom.find_by_id(PAGE_CONFIG_ID)?;
    let text = dom.text(&node);
    (!text.trim().is_empty()).then_some(text)
}
