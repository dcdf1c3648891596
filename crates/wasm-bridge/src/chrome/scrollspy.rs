//! Active nav link tracking while the page scrolls

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use site_ui_config::ChromeConfig;
use site_ui_shared::{EventDisposition, EventKind};

use crate::dom::{
    track_listener, DomFacade, ListenerId, ObserverId, VisibilityEntry, VisibilityOptions,
};

/// Intersecting entry with the greatest ratio; the first one wins ties
pub fn most_visible<N>(entries: &[VisibilityEntry<N>]) -> Option<&N> {
    let mut best: Option<&VisibilityEntry<N>> = None;
    for entry in entries.iter().filter(|e| e.is_intersecting) {
        if best.map_or(true, |b| entry.ratio > b.ratio) {
            best = Some(entry);
        }
    }
    best.map(|e| &e.target)
}

pub struct ScrollSpy<D: DomFacade> {
    inner: Rc<SpyInner<D>>,
}

struct SpyInner<D: DomFacade> {
    dom: Rc<D>,
    links: Vec<D::Node>,
    /// (section, link) in nav order
    sections: Vec<(D::Node, D::Node)>,
    observer: Cell<Option<ObserverId>>,
    listeners: RefCell<Vec<ListenerId>>,
    disposed: Cell<bool>,
}

impl<D: DomFacade> ScrollSpy<D> {
    /// `None` when the nav has no in-page links that resolve to a section
    pub fn mount(dom: Rc<D>, config: &ChromeConfig) -> Option<Self> {
        let nav = dom.query_one(&config.nav_selector)?;
        let links = dom.query_within(&nav, &config.nav_link_selector);

        let sections: Vec<_> = links
            .iter()
            .filter_map(|link| {
                let href = dom.attribute(link, "href")?;
                let id = href.strip_prefix('#').filter(|id| !id.is_empty())?;
                let section = dom.find_by_id(id)?;
                Some((section, link.clone()))
            })
            .collect();
        if sections.is_empty() {
            log::debug!("No nav links point at page sections, scroll tracking disabled");
            return None;
        }

        let inner = Rc::new(SpyInner {
            dom,
            links,
            sections,
            observer: Cell::new(None),
            listeners: RefCell::new(Vec::new()),
            disposed: Cell::new(false),
        });

        let targets: Vec<D::Node> = inner.sections.iter().map(|(s, _)| s.clone()).collect();
        let options = VisibilityOptions {
            root_margin: config.root_margin.clone(),
            thresholds: config.thresholds.clone(),
        };
        let weak = Rc::downgrade(&inner);
        let observer = inner.dom.observe_visibility(
            &targets,
            &options,
            Box::new(move |entries| {
                if let Some(inner) = weak.upgrade() {
                    if let Some(section) = most_visible(&entries) {
                        inner.mark(section);
                    }
                }
            }),
        );
        if observer.is_none() {
            log::info!("Visibility API unavailable, active link follows the URL hash only");
        }
        inner.observer.set(observer);

        let weak = Rc::downgrade(&inner);
        let result = inner.dom.listen_window(
            EventKind::HashChange,
            Box::new(move |_| {
                if let Some(inner) = weak.upgrade() {
                    inner.mark_hash();
                }
                EventDisposition::Default
            }),
        );
        track_listener(&inner.listeners, result, "hashchange");

        inner.mark_hash();
        log::debug!("Scroll tracking {} sections", inner.sections.len());
        Some(Self { inner })
    }

    /// Link currently carrying `aria-current`
    pub fn active_link(&self) -> Option<D::Node> {
        self.inner
            .links
            .iter()
            .find(|link| self.inner.dom.attribute(link, "aria-current").is_some())
            .cloned()
    }

    pub fn section_count(&self) -> usize {
        self.inner.sections.len()
    }

    /// Mark `section` active if it is one of the tracked sections
    pub fn mark(&self, section: &D::Node) -> bool {
        self.inner.mark(section)
    }

    pub fn dispose(&self) {
        let inner = &self.inner;
        if inner.disposed.replace(true) {
            return;
        }
        if let Some(id) = inner.observer.take() {
            inner.dom.disconnect(id);
        }
        for id in inner.listeners.borrow_mut().drain(..) {
            inner.dom.unlisten(id);
        }
    }
}

impl<D: DomFacade> Drop for ScrollSpy<D> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<D: DomFacade> SpyInner<D> {
    fn mark(&self, section: &D::Node) -> bool {
        let Some((_, link)) = self.sections.iter().find(|(s, _)| s == section) else {
            return false;
        };
        for other in &self.links {
            self.dom.remove_attribute(other, "aria-current");
        }
        self.dom.set_attribute(link, "aria-current", "page");
        true
    }

    fn mark_hash(&self) {
        let Some(hash) = self.dom.location_hash() else {
            return;
        };
        let Some(id) = hash.strip_prefix('#').filter(|id| !id.is_empty()) else {
            return;
        };
        if let Some(section) = self.dom.find_by_id(id) {
            self.mark(&section);
        }
    }
}
