//! Page chrome around the interactive controllers: footer year, mobile menu,
//! active nav link

use std::rc::Rc;

use site_ui_config::ChromeConfig;

use crate::dom::DomFacade;

pub mod menu;
pub mod scrollspy;
pub mod year;

pub use menu::MobileMenu;
pub use scrollspy::ScrollSpy;
pub use year::stamp_year;

/// Every chrome feature the page supports; absent markup leaves a `None`
pub struct SiteChrome<D: DomFacade> {
    pub menu: Option<MobileMenu<D>>,
    pub scroll_spy: Option<ScrollSpy<D>>,
}

impl<D: DomFacade> SiteChrome<D> {
    pub fn mount(dom: Rc<D>, config: &ChromeConfig, year: i32) -> Self {
        stamp_year(&*dom, &config.year_selector, year);
        Self {
            menu: MobileMenu::mount(dom.clone(), config),
            scroll_spy: ScrollSpy::mount(dom, config),
        }
    }

    pub fn dispose(&self) {
        if let Some(menu) = &self.menu {
            menu.dispose();
        }
        if let Some(spy) = &self.scroll_spy {
            spy.dispose();
        }
    }
}
