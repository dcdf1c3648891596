//! Mobile navigation toggle
//!
//! The open flag lives in the markup (`aria-expanded` on the button,
//! `data-open` on the nav) so CSS and assistive tech see the same state.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use site_ui_config::ChromeConfig;
use site_ui_shared::{EventDisposition, EventKind, Key, UiEvent};

use crate::dom::{track_listener, DomFacade, ListenerId};

pub struct MobileMenu<D: DomFacade> {
    inner: Rc<MenuInner<D>>,
}

struct MenuInner<D: DomFacade> {
    dom: Rc<D>,
    button: D::Node,
    nav: D::Node,
    listeners: RefCell<Vec<ListenerId>>,
    disposed: Cell<bool>,
}

impl<D: DomFacade> MobileMenu<D> {
    /// `None` unless both the menu button and the nav are on the page
    pub fn mount(dom: Rc<D>, config: &ChromeConfig) -> Option<Self> {
        let button = dom.query_one(&config.menu_button_selector)?;
        let nav = dom.query_one(&config.nav_selector)?;
        let links = dom.query_within(&nav, &config.nav_link_selector);

        let inner = Rc::new(MenuInner {
            dom,
            button,
            nav,
            listeners: RefCell::new(Vec::new()),
            disposed: Cell::new(false),
        });

        let weak = Rc::downgrade(&inner);
        let result = inner.dom.listen(
            &inner.button,
            EventKind::Click,
            Box::new(move |_| {
                if let Some(inner) = weak.upgrade() {
                    inner.set_open(!inner.is_open());
                }
                EventDisposition::Default
            }),
        );
        track_listener(&inner.listeners, result, "menu button");

        let weak = Rc::downgrade(&inner);
        let result = inner.dom.listen_window(
            EventKind::KeyDown,
            Box::new(move |event| {
                if let (Some(inner), UiEvent::KeyDown { key: Key::Escape }) = (weak.upgrade(), event)
                {
                    inner.set_open(false);
                }
                EventDisposition::Default
            }),
        );
        track_listener(&inner.listeners, result, "menu escape");

        for link in &links {
            let weak = Rc::downgrade(&inner);
            let result = inner.dom.listen(
                link,
                EventKind::Click,
                Box::new(move |_| {
                    if let Some(inner) = weak.upgrade() {
                        if inner.is_open() {
                            inner.set_open(false);
                        }
                    }
                    EventDisposition::Default
                }),
            );
            track_listener(&inner.listeners, result, "menu link");
        }

        log::debug!("Mobile menu mounted with {} in-page links", links.len());
        Some(Self { inner })
    }

    pub fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    pub fn toggle(&self) {
        self.inner.set_open(!self.inner.is_open());
    }

    pub fn close(&self) {
        self.inner.set_open(false);
    }

    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        for id in self.inner.listeners.borrow_mut().drain(..) {
            self.inner.dom.unlisten(id);
        }
    }
}

impl<D: DomFacade> Drop for MobileMenu<D> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<D: DomFacade> MenuInner<D> {
    fn is_open(&self) -> bool {
        self.dom.attribute(&self.button, "aria-expanded").as_deref() == Some("true")
    }

    fn set_open(&self, open: bool) {
        let value = if open { "true" } else { "false" };
        self.dom.set_attribute(&self.button, "aria-expanded", value);
        self.dom.set_attribute(&self.nav, "data-open", value);
    }
}
