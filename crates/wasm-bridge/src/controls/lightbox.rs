//! Modal image lightbox for `[data-gallery]` thumbnails
//!
//! State is `Closed | Open { gallery, index }`. Gallery membership is looked
//! up again on every operation, so thumbnails added or removed after mount
//! are picked up without any bookkeeping.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use site_ui_config::LightboxConfig;
use site_ui_shared::{EventDisposition, EventKind, Key, SiteUiError, SiteUiResult, UiEvent};

use super::gallery::{self, GalleryImage};
use crate::dom::{track_listener, DomFacade, ListenerId};

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum LightboxState {
    #[default]
    Closed,
    Open { gallery: String, index: usize },
}

/// The resolved modal subtree
#[derive(Clone, Debug, PartialEq)]
pub struct Modal<N> {
    pub root: N,
    pub close: N,
    pub prev: N,
    pub image: N,
    pub next: N,
}

pub struct Lightbox<D: DomFacade> {
    inner: Rc<LightboxInner<D>>,
}

struct LightboxInner<D: DomFacade> {
    dom: Rc<D>,
    config: LightboxConfig,
    state: RefCell<LightboxState>,
    modal: RefCell<Option<Modal<D::Node>>>,
    opener: RefCell<Option<D::Node>>,
    listeners: RefCell<Vec<ListenerId>>,
    disposed: Cell<bool>,
}

impl<D: DomFacade> Lightbox<D> {
    /// A closed lightbox; nothing is read from or written to the page yet
    pub fn new(dom: Rc<D>, config: LightboxConfig) -> Self {
        Self {
            inner: Rc::new(LightboxInner {
                dom,
                config,
                state: RefCell::new(LightboxState::Closed),
                modal: RefCell::new(None),
                opener: RefCell::new(None),
                listeners: RefCell::new(Vec::new()),
                disposed: Cell::new(false),
            }),
        }
    }

    /// Make every gallery thumbnail activatable and listen for modal keys
    pub fn mount(dom: Rc<D>, config: LightboxConfig) -> Self {
        let lightbox = Self::new(dom, config);
        let inner = &lightbox.inner;
        let thumbnails = gallery::all_images(&*inner.dom, &inner.config);

        for image in &thumbnails {
            LightboxInner::wire_thumbnail(inner, &image.node);
        }

        let weak = Rc::downgrade(inner);
        let result = inner.dom.listen_document(
            EventKind::KeyDown,
            Box::new(move |event| match (weak.upgrade(), event) {
                (Some(inner), UiEvent::KeyDown { key }) => LightboxInner::on_key(&inner, key),
                _ => EventDisposition::Default,
            }),
        );
        track_listener(&inner.listeners, result, "lightbox keyboard");

        log::info!("Lightbox mounted: {} thumbnails", thumbnails.len());
        lightbox
    }

    /// Resolve or build the modal; `None` if it could not be built
    pub fn ensure_modal(&self) -> Option<Modal<D::Node>> {
        LightboxInner::ensure_modal(&self.inner)
    }

    /// Show member `index` of `gallery`, clamped into range
    pub fn open(&self, index: usize, gallery: &str) {
        LightboxInner::open(&self.inner, index, gallery);
    }

    pub fn close(&self) {
        self.inner.close();
    }

    /// Move `delta` members through the open gallery, wrapping either way
    pub fn step(&self, delta: isize) {
        self.inner.step(delta);
    }

    pub fn is_open(&self) -> bool {
        matches!(*self.inner.state.borrow(), LightboxState::Open { .. })
    }

    pub fn state(&self) -> LightboxState {
        self.inner.state.borrow().clone()
    }

    pub fn current_gallery(&self) -> Option<String> {
        match &*self.inner.state.borrow() {
            LightboxState::Open { gallery, .. } => Some(gallery.clone()),
            LightboxState::Closed => None,
        }
    }

    pub fn current_index(&self) -> Option<usize> {
        match &*self.inner.state.borrow() {
            LightboxState::Open { index, .. } => Some(*index),
            LightboxState::Closed => None,
        }
    }

    pub fn members(&self, gallery: &str) -> Vec<GalleryImage<D::Node>> {
        gallery::members(&*self.inner.dom, &self.inner.config, gallery)
    }

    /// Close and detach every listener, modal listeners included
    pub fn dispose(&self) {
        self.inner.dispose();
    }
}

impl<D: DomFacade> Drop for Lightbox<D> {
    fn drop(&mut self) {
        self.inner.dispose();
    }
}

impl<D: DomFacade> LightboxInner<D> {
    fn wire_thumbnail(inner: &Rc<Self>, node: &D::Node) {
        let dom = &inner.dom;
        if dom.attribute(node, "tabindex").is_none() {
            dom.set_attribute(node, "tabindex", "0");
        }
        if dom.attribute(node, "role").is_none() {
            dom.set_attribute(node, "role", "button");
        }

        let weak = Rc::downgrade(inner);
        let target = node.clone();
        let result = dom.listen(
            node,
            EventKind::Click,
            Box::new(move |_| {
                if let Some(inner) = weak.upgrade() {
                    Self::activate(&inner, &target);
                }
                EventDisposition::Default
            }),
        );
        track_listener(&inner.listeners, result, "thumbnail click");

        let weak = Rc::downgrade(inner);
        let target = node.clone();
        let result = dom.listen(
            node,
            EventKind::KeyDown,
            Box::new(move |event| match (weak.upgrade(), event) {
                (Some(inner), UiEvent::KeyDown { key }) if key.activates() => {
                    Self::activate(&inner, &target);
                    EventDisposition::PreventDefault
                }
                _ => EventDisposition::Default,
            }),
        );
        track_listener(&inner.listeners, result, "thumbnail keyboard");
    }

    fn activate(inner: &Rc<Self>, node: &D::Node) {
        match gallery::position_of(&*inner.dom, &inner.config, node) {
            Some((gallery, index)) => Self::open(inner, index, &gallery),
            None => log::debug!("Activated thumbnail is no longer in a gallery"),
        }
    }

    fn on_key(inner: &Rc<Self>, key: &Key) -> EventDisposition {
        if !matches!(*inner.state.borrow(), LightboxState::Open { .. }) {
            return EventDisposition::Default;
        }
        match key {
            Key::Escape => inner.close(),
            Key::ArrowLeft => inner.step(-1),
            Key::ArrowRight => inner.step(1),
            _ => return EventDisposition::Default,
        }
        EventDisposition::PreventDefault
    }

    fn ensure_modal(inner: &Rc<Self>) -> Option<Modal<D::Node>> {
        if let Some(modal) = inner.modal.borrow().as_ref() {
            return Some(modal.clone());
        }

        match inner.resolve_modal() {
            Ok(modal) => {
                Self::wire_modal(inner, &modal);
                *inner.modal.borrow_mut() = Some(modal.clone());
                Some(modal)
            }
            Err(e) => {
                log::error!("Could not build lightbox: {e}");
                None
            }
        }
    }

    /// Reuse `#<modal_id>` if the page has one, filling in any missing parts
    fn resolve_modal(&self) -> SiteUiResult<Modal<D::Node>> {
        let root = match self.dom.find_by_id(&self.config.modal_id) {
            Some(root) => root,
            None => self.build_root()?,
        };

        Ok(Modal {
            close: self.part(&root, "button", "lightbox__close", Some("Close"))?,
            prev: self.part(&root, "button", "lightbox__prev", Some("Previous image"))?,
            image: self.part(&root, "img", "lightbox__img", None)?,
            next: self.part(&root, "button", "lightbox__next", Some("Next image"))?,
            root,
        })
    }

    fn build_root(&self) -> SiteUiResult<D::Node> {
        let dom = &*self.dom;
        let body = dom
            .body()
            .ok_or_else(|| SiteUiError::missing_global("document.body"))?;

        let root = dom.create_element("div")?;
        dom.set_attribute(&root, "id", &self.config.modal_id);
        dom.add_class(&root, "lightbox");
        dom.set_attribute(&root, "role", "dialog");
        dom.set_attribute(&root, "aria-modal", "true");
        dom.set_attribute(&root, "aria-hidden", "true");
        dom.set_attribute(&root, "tabindex", "-1");
        dom.append_child(&body, &root)?;

        log::debug!("Built lightbox modal #{}", self.config.modal_id);
        Ok(root)
    }

    fn part(
        &self,
        root: &D::Node,
        tag: &str,
        class: &str,
        label: Option<&str>,
    ) -> SiteUiResult<D::Node> {
        let dom = &*self.dom;
        if let Some(existing) = dom.query_within(root, &format!(".{class}")).into_iter().next() {
            return Ok(existing);
        }

        let node = dom.create_element(tag)?;
        dom.add_class(&node, class);
        if let Some(label) = label {
            dom.set_attribute(&node, "type", "button");
            dom.set_attribute(&node, "aria-label", label);
        }
        dom.append_child(root, &node)?;
        Ok(node)
    }

    fn wire_modal(inner: &Rc<Self>, modal: &Modal<D::Node>) {
        let controls: [(&D::Node, fn(&Self)); 3] = [
            (&modal.close, |lb| lb.close()),
            (&modal.prev, |lb| lb.step(-1)),
            (&modal.next, |lb| lb.step(1)),
        ];
        for (node, action) in controls {
            let weak = Rc::downgrade(inner);
            let result = inner.dom.listen(
                node,
                EventKind::Click,
                Box::new(move |_| {
                    if let Some(inner) = weak.upgrade() {
                        action(&inner);
                    }
                    EventDisposition::Default
                }),
            );
            track_listener(&inner.listeners, result, "lightbox control");
        }

        // Clicks that land on the backdrop itself, not on the image or buttons
        let weak = Rc::downgrade(inner);
        let result = inner.dom.listen(
            &modal.root,
            EventKind::Click,
            Box::new(move |event| {
                if let (Some(inner), UiEvent::Click { on_self: true }) = (weak.upgrade(), event) {
                    inner.close();
                }
                EventDisposition::Default
            }),
        );
        track_listener(&inner.listeners, result, "lightbox backdrop");
    }

    fn open(inner: &Rc<Self>, index: usize, gallery: &str) {
        if inner.disposed.get() {
            return;
        }
        let members = gallery::members(&*inner.dom, &inner.config, gallery);
        if members.is_empty() {
            log::debug!("Gallery {gallery:?} has no images");
            return;
        }
        let Some(modal) = Self::ensure_modal(inner) else {
            return;
        };

        let index = index.min(members.len() - 1);
        let was_open = matches!(*inner.state.borrow(), LightboxState::Open { .. });
        *inner.state.borrow_mut() = LightboxState::Open {
            gallery: gallery.to_string(),
            index,
        };
        inner.show(&modal, &members[index]);

        let dom = &inner.dom;
        dom.remove_attribute(&modal.root, "aria-hidden");
        dom.add_class(&modal.root, &inner.config.open_class);
        if !was_open {
            *inner.opener.borrow_mut() = dom.active_element();
        }
        dom.focus(&modal.close);

        log::debug!("Lightbox open: {gallery} [{index}/{}]", members.len());
    }

    fn close(&self) {
        if matches!(*self.state.borrow(), LightboxState::Closed) {
            return;
        }
        *self.state.borrow_mut() = LightboxState::Closed;

        let modal = self.modal.borrow().clone();
        if let Some(modal) = modal {
            let dom = &self.dom;
            dom.remove_attribute(&modal.image, "src");
            dom.remove_attribute(&modal.image, "alt");
            dom.set_attribute(&modal.root, "aria-hidden", "true");
            dom.remove_class(&modal.root, &self.config.open_class);
        }

        let opener = self.opener.borrow_mut().take();
        if let Some(opener) = opener {
            self.dom.focus(&opener);
        }
        log::debug!("Lightbox closed");
    }

    fn step(&self, delta: isize) {
        let (gallery, index) = match &*self.state.borrow() {
            LightboxState::Open { gallery, index } => (gallery.clone(), *index),
            LightboxState::Closed => return,
        };
        let members = gallery::members(&*self.dom, &self.config, &gallery);
        if members.is_empty() {
            return;
        }

        let len = members.len() as isize;
        let index = (index as isize + delta).rem_euclid(len) as usize;
        *self.state.borrow_mut() = LightboxState::Open {
            gallery,
            index,
        };

        let modal = self.modal.borrow().clone();
        if let Some(modal) = modal {
            self.show(&modal, &members[index]);
        }
    }

    fn show(&self, modal: &Modal<D::Node>, image: &GalleryImage<D::Node>) {
        self.dom.set_attribute(&modal.image, "src", &image.src);
        self.dom.set_attribute(&modal.image, "alt", &image.alt);
    }

    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        self.close();
        for id in self.listeners.borrow_mut().drain(..) {
            self.dom.unlisten(id);
        }
        log::info!("Lightbox disposed");
    }
}
