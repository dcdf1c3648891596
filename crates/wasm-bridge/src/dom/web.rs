//! `web-sys` implementations of the DOM facade and the scheduler

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use site_ui_shared::{EventDisposition, EventKind, Key, SiteUiError, SiteUiResult, UiEvent};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    AddEventListenerOptions, Document, Element, Event, EventTarget, HtmlElement,
    IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit, KeyboardEvent,
    NodeList, TouchEvent, Window,
};

use super::{
    DomFacade, EventHandler, ListenerId, ObserverId, Scheduler, TimerId, VisibilityEntry,
    VisibilityHandler, VisibilityOptions,
};

type ObserverClosure = Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>;

struct Registered {
    target: EventTarget,
    kind: EventKind,
    closure: Closure<dyn FnMut(Event)>,
}

/// The live document
pub struct WebDom {
    window: Window,
    document: Document,
    next_id: Cell<u32>,
    listeners: RefCell<HashMap<ListenerId, Registered>>,
    observers: RefCell<HashMap<ObserverId, (IntersectionObserver, ObserverClosure)>>,
}

impl WebDom {
    pub fn new() -> SiteUiResult<Self> {
        let window = web_sys::window().ok_or_else(|| SiteUiError::missing_global("window"))?;
        let document = window
            .document()
            .ok_or_else(|| SiteUiError::missing_global("document"))?;

        Ok(Self {
            window,
            document,
            next_id: Cell::new(1),
            listeners: RefCell::new(HashMap::new()),
            observers: RefCell::new(HashMap::new()),
        })
    }

    fn allocate_id(&self) -> u32 {
        let id = self.next_id.get();
        self.next_id.set(id.wrapping_add(1));
        id
    }

    fn attach(
        &self,
        target: EventTarget,
        kind: EventKind,
        mut handler: EventHandler,
    ) -> SiteUiResult<ListenerId> {
        let closure = Closure::wrap(Box::new(move |event: Event| {
            let Some(ui_event) = to_ui_event(kind, &event) else {
                return;
            };
            if handler(&ui_event) == EventDisposition::PreventDefault && !kind.is_passive() {
                event.prevent_default();
            }
        }) as Box<dyn FnMut(Event)>);

        let options = AddEventListenerOptions::new();
        options.set_passive(kind.is_passive());
        target.add_event_listener_with_callback_and_add_event_listener_options(
            kind.as_str(),
            closure.as_ref().unchecked_ref(),
            &options,
        )?;

        let id = ListenerId(self.allocate_id());
        self.listeners.borrow_mut().insert(
            id,
            Registered {
                target,
                kind,
                closure,
            },
        );
        Ok(id)
    }

    fn style_target<'a>(&self, node: &'a Element) -> Option<&'a HtmlElement> {
        let html = node.dyn_ref::<HtmlElement>();
        if html.is_none() {
            log::debug!("<{}> has no inline style", node.tag_name());
        }
        html
    }
}

fn collect_elements(list: Result<NodeList, JsValue>, selector: &str) -> Vec<Element> {
    let list = match list {
        Ok(list) => list,
        Err(e) => {
            log::warn!("Invalid selector {selector:?}: {e:?}");
            return Vec::new();
        }
    };

    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

fn to_ui_event(kind: EventKind, event: &Event) -> Option<UiEvent> {
    match kind {
        EventKind::Click => {
            let on_self = match (event.target(), event.current_target()) {
                (Some(target), Some(current)) => target == current,
                _ => false,
            };
            Some(UiEvent::Click { on_self })
        }
        EventKind::KeyDown => {
            let key = event.dyn_ref::<KeyboardEvent>()?.key();
            Some(UiEvent::KeyDown {
                key: Key::from_dom(&key),
            })
        }
        EventKind::MouseEnter => Some(UiEvent::PointerEnter),
        EventKind::MouseLeave => Some(UiEvent::PointerLeave),
        EventKind::TouchStart => {
            let touch = event.dyn_ref::<TouchEvent>()?.touches().get(0)?;
            Some(UiEvent::TouchStart {
                client_x: touch.client_x() as f64,
            })
        }
        EventKind::TouchEnd => {
            let touch = event.dyn_ref::<TouchEvent>()?.changed_touches().get(0)?;
            Some(UiEvent::TouchEnd {
                client_x: touch.client_x() as f64,
            })
        }
        EventKind::HashChange => Some(UiEvent::HashChange),
    }
}

impl DomFacade for WebDom {
    type Node = Element;

    fn query_one(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn query_all(&self, selector: &str) -> Vec<Element> {
        collect_elements(self.document.query_selector_all(selector), selector)
    }

    fn query_within(&self, root: &Element, selector: &str) -> Vec<Element> {
        collect_elements(root.query_selector_all(selector), selector)
    }

    fn find_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn body(&self) -> Option<Element> {
        self.document.body().map(Element::from)
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) {
        if let Err(e) = node.set_attribute(name, value) {
            log::warn!("setAttribute({name}) failed: {e:?}");
        }
    }

    fn remove_attribute(&self, node: &Element, name: &str) {
        if let Err(e) = node.remove_attribute(name) {
            log::warn!("removeAttribute({name}) failed: {e:?}");
        }
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn add_class(&self, node: &Element, class: &str) {
        if let Err(e) = node.class_list().add_1(class) {
            log::warn!("classList.add({class}) failed: {e:?}");
        }
    }

    fn remove_class(&self, node: &Element, class: &str) {
        if let Err(e) = node.class_list().remove_1(class) {
            log::warn!("classList.remove({class}) failed: {e:?}");
        }
    }

    fn set_style(&self, node: &Element, property: &str, value: &str) {
        if let Some(html) = self.style_target(node) {
            if let Err(e) = html.style().set_property(property, value) {
                log::warn!("style.{property} = {value} failed: {e:?}");
            }
        }
    }

    fn clear_style(&self, node: &Element, property: &str) {
        if let Some(html) = self.style_target(node) {
            let _ = html.style().remove_property(property);
        }
    }

    fn text(&self, node: &Element) -> String {
        node.text_content().unwrap_or_default()
    }

    fn set_text(&self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn create_element(&self, tag: &str) -> SiteUiResult<Element> {
        self.document
            .create_element(tag)
            .map_err(|e| SiteUiError::dom(format!("createElement({tag}) failed: {e:?}")))
    }

    fn append_child(&self, parent: &Element, child: &Element) -> SiteUiResult<()> {
        parent
            .append_child(child)
            .map(|_| ())
            .map_err(|e| SiteUiError::dom(format!("appendChild failed: {e:?}")))
    }

    fn focus(&self, node: &Element) {
        if let Some(html) = node.dyn_ref::<HtmlElement>() {
            let _ = html.focus();
        }
    }

    fn active_element(&self) -> Option<Element> {
        self.document.active_element()
    }

    fn location_hash(&self) -> Option<String> {
        self.window
            .location()
            .hash()
            .ok()
            .filter(|hash| !hash.is_empty())
    }

    fn listen(
        &self,
        target: &Element,
        kind: EventKind,
        handler: EventHandler,
    ) -> SiteUiResult<ListenerId> {
        self.attach(target.clone().into(), kind, handler)
    }

    fn listen_document(&self, kind: EventKind, handler: EventHandler) -> SiteUiResult<ListenerId> {
        self.attach(self.document.clone().into(), kind, handler)
    }

    fn listen_window(&self, kind: EventKind, handler: EventHandler) -> SiteUiResult<ListenerId> {
        self.attach(self.window.clone().into(), kind, handler)
    }

    fn unlisten(&self, id: ListenerId) {
        if let Some(registered) = self.listeners.borrow_mut().remove(&id) {
            let _ = registered.target.remove_event_listener_with_callback(
                registered.kind.as_str(),
                registered.closure.as_ref().unchecked_ref(),
            );
        }
    }

    fn observe_visibility(
        &self,
        targets: &[Element],
        options: &VisibilityOptions,
        mut handler: VisibilityHandler<Element>,
    ) -> Option<ObserverId> {
        let supported =
            js_sys::Reflect::has(&self.window, &JsValue::from_str("IntersectionObserver"))
                .unwrap_or(false);
        if !supported {
            log::debug!("IntersectionObserver unavailable");
            return None;
        }

        let closure = Closure::wrap(Box::new(
            move |entries: js_sys::Array, _observer: IntersectionObserver| {
                let batch = entries
                    .iter()
                    .filter_map(|entry| entry.dyn_into::<IntersectionObserverEntry>().ok())
                    .map(|entry| VisibilityEntry {
                        target: entry.target(),
                        is_intersecting: entry.is_intersecting(),
                        ratio: entry.intersection_ratio(),
                    })
                    .collect();
                handler(batch);
            },
        ) as Box<dyn FnMut(js_sys::Array, IntersectionObserver)>);

        let init = IntersectionObserverInit::new();
        init.set_root_margin(&options.root_margin);
        let thresholds: js_sys::Array = options
            .thresholds
            .iter()
            .map(|t| JsValue::from_f64(*t))
            .collect();
        init.set_threshold(&thresholds);

        let observer =
            match IntersectionObserver::new_with_options(closure.as_ref().unchecked_ref(), &init)
            {
                Ok(observer) => observer,
                Err(e) => {
                    log::warn!("IntersectionObserver construction failed: {e:?}");
                    return None;
                }
            };
        for target in targets {
            observer.observe(target);
        }

        let id = ObserverId(self.allocate_id());
        self.observers.borrow_mut().insert(id, (observer, closure));
        Some(id)
    }

    fn disconnect(&self, id: ObserverId) {
        if let Some((observer, _closure)) = self.observers.borrow_mut().remove(&id) {
            observer.disconnect();
        }
    }
}

/// Timers backed by `window`
pub struct WebScheduler {
    window: Window,
    intervals: RefCell<HashMap<i32, Closure<dyn FnMut()>>>,
}

impl WebScheduler {
    pub fn new() -> SiteUiResult<Self> {
        let window = web_sys::window().ok_or_else(|| SiteUiError::missing_global("window"))?;
        Ok(Self {
            window,
            intervals: RefCell::new(HashMap::new()),
        })
    }
}

impl Scheduler for WebScheduler {
    fn set_timeout(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> SiteUiResult<TimerId> {
        // One-shot closures are owned by JS and freed once they run
        let callback = Closure::once_into_js(move || task());
        let handle = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.unchecked_ref(),
                delay_ms.min(i32::MAX as u32) as i32,
            )?;
        Ok(TimerId::Timeout(handle))
    }

    fn set_interval(&self, period_ms: u32, task: Box<dyn FnMut()>) -> SiteUiResult<TimerId> {
        let closure = Closure::wrap(task);
        let handle = self
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                period_ms.min(i32::MAX as u32) as i32,
            )?;
        self.intervals.borrow_mut().insert(handle, closure);
        Ok(TimerId::Interval(handle))
    }

    fn request_frame(&self, task: Box<dyn FnOnce()>) -> SiteUiResult<TimerId> {
        let callback = Closure::once_into_js(move |_timestamp: f64| task());
        let handle = self
            .window
            .request_animation_frame(callback.unchecked_ref())?;
        Ok(TimerId::Frame(handle))
    }

    fn cancel(&self, id: TimerId) {
        match id {
            TimerId::Timeout(handle) => self.window.clear_timeout_with_handle(handle),
            TimerId::Interval(handle) => {
                self.window.clear_interval_with_handle(handle);
                self.intervals.borrow_mut().remove(&handle);
            }
            TimerId::Frame(handle) => {
                let _ = self.window.cancel_animation_frame(handle);
            }
        }
    }
}
