//! Narrow capability interface over the document and the event loop
//!
//! Controllers only ever talk to the page through [`DomFacade`] and
//! [`Scheduler`]. The browser implementations live in [`web`]; tests use the
//! in-memory doubles from `crate::testing`.

use site_ui_shared::{EventDisposition, EventKind, SiteUiResult, UiEvent};

pub mod web;

/// Callback attached to an element, the document or the window
pub type EventHandler = Box<dyn FnMut(&UiEvent) -> EventDisposition>;

/// One batch of visibility changes: `(target, is_intersecting, ratio)`
pub type VisibilityHandler<N> = Box<dyn FnMut(Vec<VisibilityEntry<N>>)>;

#[derive(Clone, Debug, PartialEq)]
pub struct VisibilityEntry<N> {
    pub target: N,
    pub is_intersecting: bool,
    pub ratio: f64,
}

/// Options for a viewport visibility observer
#[derive(Clone, Debug, PartialEq)]
pub struct VisibilityOptions {
    pub root_margin: String,
    pub thresholds: Vec<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u32);

/// Handle to something queued on the event loop
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerId {
    Timeout(i32),
    Interval(i32),
    Frame(i32),
}

/// Query, mutate and listen to the document
///
/// Mutations are infallible from the caller's point of view: writing to an
/// element that cannot take the write is logged by the implementation and
/// otherwise ignored.
pub trait DomFacade: 'static {
    type Node: Clone + PartialEq + 'static;

    fn query_one(&self, selector: &str) -> Option<Self::Node>;
    fn query_all(&self, selector: &str) -> Vec<Self::Node>;
    /// Descendants of `root` matching `selector`, in document order
    fn query_within(&self, root: &Self::Node, selector: &str) -> Vec<Self::Node>;

    fn find_by_id(&self, id: &str) -> Option<Self::Node> {
        self.query_one(&format!("#{id}"))
    }

    fn body(&self) -> Option<Self::Node>;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);
    fn remove_attribute(&self, node: &Self::Node, name: &str);

    fn has_class(&self, node: &Self::Node, class: &str) -> bool;
    fn add_class(&self, node: &Self::Node, class: &str);
    fn remove_class(&self, node: &Self::Node, class: &str);

    fn set_style(&self, node: &Self::Node, property: &str, value: &str);
    fn clear_style(&self, node: &Self::Node, property: &str);

    fn text(&self, node: &Self::Node) -> String;
    fn set_text(&self, node: &Self::Node, text: &str);

    fn create_element(&self, tag: &str) -> SiteUiResult<Self::Node>;
    fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> SiteUiResult<()>;

    fn focus(&self, node: &Self::Node);
    fn active_element(&self) -> Option<Self::Node>;

    /// Fragment of the current URL including the leading `#`, if any
    fn location_hash(&self) -> Option<String>;

    fn listen(
        &self,
        target: &Self::Node,
        kind: EventKind,
        handler: EventHandler,
    ) -> SiteUiResult<ListenerId>;
    fn listen_document(&self, kind: EventKind, handler: EventHandler) -> SiteUiResult<ListenerId>;
    fn listen_window(&self, kind: EventKind, handler: EventHandler) -> SiteUiResult<ListenerId>;
    fn unlisten(&self, id: ListenerId);

    /// Watch viewport visibility of `targets`
    ///
    /// Returns `None` when the environment has no visibility API.
    fn observe_visibility(
        &self,
        _targets: &[Self::Node],
        _options: &VisibilityOptions,
        _handler: VisibilityHandler<Self::Node>,
    ) -> Option<ObserverId> {
        None
    }

    fn disconnect(&self, _id: ObserverId) {}
}

/// Deferred execution on the single UI thread
pub trait Scheduler: 'static {
    fn set_timeout(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> SiteUiResult<TimerId>;
    fn set_interval(&self, period_ms: u32, task: Box<dyn FnMut()>) -> SiteUiResult<TimerId>;
    fn request_frame(&self, task: Box<dyn FnOnce()>) -> SiteUiResult<TimerId>;
    /// Cancelling a handle that already fired is a no-op
    fn cancel(&self, id: TimerId);
}

/// Keep the ids of listeners that were attached, log the rest
pub(crate) fn track_listener(
    listeners: &std::cell::RefCell<Vec<ListenerId>>,
    result: SiteUiResult<ListenerId>,
    what: &str,
) {
    match result {
        Ok(id) => listeners.borrow_mut().push(id),
        Err(e) => log::warn!("Could not attach {what} listener: {e}"),
    }
}
