//! In-memory document and virtual clock for driving controllers in tests

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::iter::Peekable;
use std::rc::Rc;
use std::str::Chars;

use site_ui_shared::{EventDisposition, EventKind, SiteUiError, SiteUiResult, UiEvent};

use crate::dom::{
    DomFacade, EventHandler, ListenerId, ObserverId, Scheduler, TimerId, VisibilityEntry,
    VisibilityHandler, VisibilityOptions,
};

/// Handle to an element inside a [`FakeDom`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(usize);

#[derive(Debug, Default)]
struct FakeElement {
    tag: String,
    attrs: BTreeMap<String, String>,
    styles: BTreeMap<String, String>,
    text: String,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl FakeElement {
    fn classes(&self) -> impl Iterator<Item = &str> {
        self.attrs
            .get("class")
            .map(|c| c.split_whitespace())
            .into_iter()
            .flatten()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Target {
    Node(NodeRef),
    Document,
    Window,
}

type SharedHandler = Rc<RefCell<EventHandler>>;

struct Observer {
    targets: Vec<NodeRef>,
    options: VisibilityOptions,
    handler: Rc<RefCell<VisibilityHandler<NodeRef>>>,
}

/// A tiny document: element tree, attribute/style storage, listeners
///
/// Selectors support comma-separated compounds of a tag name, `#id`,
/// `.class`, `[attr]`, `[attr=value]` and `[attr^=value]`. Events do not
/// bubble; tests fire them at the element whose listener they exercise.
pub struct FakeDom {
    elements: RefCell<Vec<FakeElement>>,
    listeners: RefCell<Vec<(ListenerId, Target, EventKind, SharedHandler)>>,
    observers: RefCell<HashMap<ObserverId, Observer>>,
    next_id: Cell<u32>,
    active: Cell<Option<NodeRef>>,
    hash: RefCell<Option<String>>,
    fail_create: Cell<bool>,
    visibility_supported: Cell<bool>,
}

impl Default for FakeDom {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDom {
    pub fn new() -> Self {
        let body = FakeElement {
            tag: "body".to_string(),
            ..Default::default()
        };
        Self {
            elements: RefCell::new(vec![body]),
            listeners: RefCell::new(Vec::new()),
            observers: RefCell::new(HashMap::new()),
            next_id: Cell::new(1),
            active: Cell::new(None),
            hash: RefCell::new(None),
            fail_create: Cell::new(false),
            visibility_supported: Cell::new(true),
        }
    }

    pub fn root(&self) -> NodeRef {
        NodeRef(0)
    }

    /// Append a new element under `parent` with the given attributes
    pub fn add(&self, parent: NodeRef, tag: &str, attrs: &[(&str, &str)]) -> NodeRef {
        let mut elements = self.elements.borrow_mut();
        let id = elements.len();
        elements.push(FakeElement {
            tag: tag.to_string(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            parent: Some(parent.0),
            ..Default::default()
        });
        elements[parent.0].children.push(id);
        NodeRef(id)
    }

    pub fn style(&self, node: NodeRef, property: &str) -> Option<String> {
        self.elements.borrow()[node.0].styles.get(property).cloned()
    }

    pub fn has_inline_styles(&self, node: NodeRef) -> bool {
        !self.elements.borrow()[node.0].styles.is_empty()
    }

    pub fn tag(&self, node: NodeRef) -> String {
        self.elements.borrow()[node.0].tag.clone()
    }

    pub fn children(&self, node: NodeRef) -> Vec<NodeRef> {
        self.elements.borrow()[node.0]
            .children
            .iter()
            .map(|c| NodeRef(*c))
            .collect()
    }

    pub fn set_hash(&self, hash: Option<&str>) {
        *self.hash.borrow_mut() = hash.map(str::to_string);
    }

    pub fn fail_element_creation(&self, fail: bool) {
        self.fail_create.set(fail);
    }

    pub fn disable_visibility_api(&self) {
        self.visibility_supported.set(false);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }

    pub fn observed_targets(&self) -> Vec<NodeRef> {
        self.observers
            .borrow()
            .values()
            .flat_map(|o| o.targets.iter().copied())
            .collect()
    }

    pub fn observer_options(&self) -> Vec<VisibilityOptions> {
        self.observers
            .borrow()
            .values()
            .map(|o| o.options.clone())
            .collect()
    }

    /// Deliver `event` to listeners on `node`
    pub fn fire(&self, node: NodeRef, event: UiEvent) -> EventDisposition {
        self.dispatch(Target::Node(node), event)
    }

    /// Deliver `event` to document-level listeners
    pub fn fire_document(&self, event: UiEvent) -> EventDisposition {
        self.dispatch(Target::Document, event)
    }

    pub fn fire_window(&self, event: UiEvent) -> EventDisposition {
        self.dispatch(Target::Window, event)
    }

    /// Deliver one batch of visibility entries to every observer
    pub fn report_visibility(&self, entries: Vec<VisibilityEntry<NodeRef>>) {
        let handlers: Vec<_> = self
            .observers
            .borrow()
            .values()
            .map(|o| o.handler.clone())
            .collect();
        for handler in handlers {
            (&mut **handler.borrow_mut())(entries.clone());
        }
    }

    fn dispatch(&self, target: Target, event: UiEvent) -> EventDisposition {
        let kind = event.kind();
        let handlers: Vec<SharedHandler> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(_, t, k, _)| *t == target && *k == kind)
            .map(|(_, _, _, h)| h.clone())
            .collect();

        let mut disposition = EventDisposition::Default;
        for handler in handlers {
            if (&mut **handler.borrow_mut())(&event) == EventDisposition::PreventDefault {
                disposition = EventDisposition::PreventDefault;
            }
        }
        disposition
    }

    fn register(&self, target: Target, kind: EventKind, handler: EventHandler) -> ListenerId {
        let id = ListenerId(self.allocate_id());
        self.listeners
            .borrow_mut()
            .push((id, target, kind, Rc::new(RefCell::new(handler))));
        id
    }

    fn allocate_id(&self) -> u32 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    /// Descendants of `root` in document order
    fn descendants(&self, root: usize) -> Vec<usize> {
        let elements = self.elements.borrow();
        let mut out = Vec::new();
        let mut stack: Vec<usize> = elements[root].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(elements[id].children.iter().rev());
        }
        out
    }

    fn select(&self, root: usize, selector: &str) -> Vec<NodeRef> {
        let compounds: Vec<Compound> = selector.split(',').map(Compound::parse).collect();
        let candidates = self.descendants(root);
        let elements = self.elements.borrow();
        candidates
            .into_iter()
            .filter(|id| compounds.iter().any(|c| c.matches(&elements[*id])))
            .map(NodeRef)
            .collect()
    }
}

#[derive(Debug)]
enum AttrTest {
    Present,
    Equals(String),
    Prefix(String),
}

#[derive(Debug, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, AttrTest)>,
    unsupported: bool,
}

fn take_ident(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut out = String::new();
    while let Some(c) = chars.peek() {
        if c.is_alphanumeric() || *c == '-' || *c == '_' {
            out.push(*c);
            chars.next();
        } else {
            break;
        }
    }
    out
}

impl Compound {
    fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let mut compound = Compound::default();
        if raw.is_empty() || raw.contains(char::is_whitespace) && !raw.contains('[') {
            compound.unsupported = true;
            return compound;
        }

        let mut chars = raw.chars().peekable();
        let tag = take_ident(&mut chars);
        if !tag.is_empty() {
            compound.tag = Some(tag);
        }

        while let Some(c) = chars.next() {
            match c {
                '.' => compound.classes.push(take_ident(&mut chars)),
                '#' => compound.id = Some(take_ident(&mut chars)),
                '[' => {
                    let body: String = chars.by_ref().take_while(|c| *c != ']').collect();
                    let unquote = |v: &str| v.trim().trim_matches('"').trim_matches('\'').to_string();
                    let test = if let Some((name, value)) = body.split_once("^=") {
                        (name.trim().to_string(), AttrTest::Prefix(unquote(value)))
                    } else if let Some((name, value)) = body.split_once('=') {
                        (name.trim().to_string(), AttrTest::Equals(unquote(value)))
                    } else {
                        (body.trim().to_string(), AttrTest::Present)
                    };
                    compound.attrs.push(test);
                }
                _ => {
                    compound.unsupported = true;
                    break;
                }
            }
        }
        compound
    }

    fn matches(&self, element: &FakeElement) -> bool {
        if self.unsupported {
            return false;
        }
        if let Some(tag) = &self.tag {
            if !element.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.attrs.get("id") != Some(id) {
                return false;
            }
        }
        if !self
            .classes
            .iter()
            .all(|class| element.classes().any(|c| c == class))
        {
            return false;
        }
        self.attrs.iter().all(|(name, test)| {
            let value = element.attrs.get(name);
            match test {
                AttrTest::Present => value.is_some(),
                AttrTest::Equals(expected) => value == Some(expected),
                AttrTest::Prefix(prefix) => value.is_some_and(|v| v.starts_with(prefix.as_str())),
            }
        })
    }
}

impl DomFacade for FakeDom {
    type Node = NodeRef;

    fn query_one(&self, selector: &str) -> Option<NodeRef> {
        self.select(0, selector).into_iter().next()
    }

    fn query_all(&self, selector: &str) -> Vec<NodeRef> {
        self.select(0, selector)
    }

    fn query_within(&self, root: &NodeRef, selector: &str) -> Vec<NodeRef> {
        self.select(root.0, selector)
    }

    fn body(&self) -> Option<NodeRef> {
        Some(self.root())
    }

    fn attribute(&self, node: &NodeRef, name: &str) -> Option<String> {
        self.elements.borrow()[node.0].attrs.get(name).cloned()
    }

    fn set_attribute(&self, node: &NodeRef, name: &str, value: &str) {
        self.elements.borrow_mut()[node.0]
            .attrs
            .insert(name.to_string(), value.to_string());
    }

    fn remove_attribute(&self, node: &NodeRef, name: &str) {
        self.elements.borrow_mut()[node.0].attrs.remove(name);
    }

    fn has_class(&self, node: &NodeRef, class: &str) -> bool {
        self.elements.borrow()[node.0].classes().any(|c| c == class)
    }

    fn add_class(&self, node: &NodeRef, class: &str) {
        if self.has_class(node, class) {
            return;
        }
        let mut elements = self.elements.borrow_mut();
        let attrs = &mut elements[node.0].attrs;
        let classes = attrs.entry("class".to_string()).or_default();
        if !classes.is_empty() {
            classes.push(' ');
        }
        classes.push_str(class);
    }

    fn remove_class(&self, node: &NodeRef, class: &str) {
        let mut elements = self.elements.borrow_mut();
        if let Some(classes) = elements[node.0].attrs.get_mut("class") {
            *classes = classes
                .split_whitespace()
                .filter(|c| *c != class)
                .collect::<Vec<_>>()
                .join(" ");
        }
    }

    fn set_style(&self, node: &NodeRef, property: &str, value: &str) {
        self.elements.borrow_mut()[node.0]
            .styles
            .insert(property.to_string(), value.to_string());
    }

    fn clear_style(&self, node: &NodeRef, property: &str) {
        self.elements.borrow_mut()[node.0].styles.remove(property);
    }

    fn text(&self, node: &NodeRef) -> String {
        self.elements.borrow()[node.0].text.clone()
    }

    fn set_text(&self, node: &NodeRef, text: &str) {
        self.elements.borrow_mut()[node.0].text = text.to_string();
    }

    fn create_element(&self, tag: &str) -> SiteUiResult<NodeRef> {
        if self.fail_create.get() {
            return Err(SiteUiError::dom(format!("createElement({tag}) rejected")));
        }
        let mut elements = self.elements.borrow_mut();
        elements.push(FakeElement {
            tag: tag.to_string(),
            ..Default::default()
        });
        Ok(NodeRef(elements.len() - 1))
    }

    fn append_child(&self, parent: &NodeRef, child: &NodeRef) -> SiteUiResult<()> {
        let mut elements = self.elements.borrow_mut();
        if let Some(old) = elements[child.0].parent.take() {
            elements[old].children.retain(|c| *c != child.0);
        }
        elements[child.0].parent = Some(parent.0);
        elements[parent.0].children.push(child.0);
        Ok(())
    }

    fn focus(&self, node: &NodeRef) {
        self.active.set(Some(*node));
    }

    fn active_element(&self) -> Option<NodeRef> {
        self.active.get()
    }

    fn location_hash(&self) -> Option<String> {
        self.hash.borrow().clone()
    }

    fn listen(
        &self,
        target: &NodeRef,
        kind: EventKind,
        handler: EventHandler,
    ) -> SiteUiResult<ListenerId> {
        Ok(self.register(Target::Node(*target), kind, handler))
    }

    fn listen_document(&self, kind: EventKind, handler: EventHandler) -> SiteUiResult<ListenerId> {
        Ok(self.register(Target::Document, kind, handler))
    }

    fn listen_window(&self, kind: EventKind, handler: EventHandler) -> SiteUiResult<ListenerId> {
        Ok(self.register(Target::Window, kind, handler))
    }

    fn unlisten(&self, id: ListenerId) {
        self.listeners.borrow_mut().retain(|(l, ..)| *l != id);
    }

    fn observe_visibility(
        &self,
        targets: &[NodeRef],
        options: &VisibilityOptions,
        handler: VisibilityHandler<NodeRef>,
    ) -> Option<ObserverId> {
        if !self.visibility_supported.get() {
            return None;
        }
        let id = ObserverId(self.allocate_id());
        self.observers.borrow_mut().insert(
            id,
            Observer {
                targets: targets.to_vec(),
                options: options.clone(),
                handler: Rc::new(RefCell::new(handler)),
            },
        );
        Some(id)
    }

    fn disconnect(&self, id: ObserverId) {
        self.observers.borrow_mut().remove(&id);
    }
}

enum Job {
    Once(Box<dyn FnOnce()>),
    Every(u64, Box<dyn FnMut()>),
}

struct Scheduled {
    due: u64,
    id: TimerId,
    job: Job,
}

/// Virtual clock; nothing runs until [`ManualScheduler::advance`]
pub struct ManualScheduler {
    now: Cell<u64>,
    next_id: Cell<i32>,
    frame_ms: u64,
    tasks: RefCell<BTreeMap<i32, Scheduled>>,
    running: Cell<Option<i32>>,
    running_cancelled: Cell<bool>,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self {
            now: Cell::new(0),
            next_id: Cell::new(1),
            frame_ms: 16,
            tasks: RefCell::new(BTreeMap::new()),
            running: Cell::new(None),
            running_cancelled: Cell::new(false),
        }
    }

    pub fn now(&self) -> u64 {
        self.now.get()
    }

    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn pending_intervals(&self) -> usize {
        self.tasks
            .borrow()
            .values()
            .filter(|t| matches!(t.job, Job::Every(..)))
            .count()
    }

    /// Run everything due within the next `ms` milliseconds, in due order
    pub fn advance(&self, ms: u64) {
        let deadline = self.now.get() + ms;
        loop {
            let next = self
                .tasks
                .borrow()
                .iter()
                .filter(|(_, t)| t.due <= deadline)
                .min_by_key(|(key, t)| (t.due, **key))
                .map(|(key, _)| *key);
            let Some(key) = next else { break };

            let Some(scheduled) = self.tasks.borrow_mut().remove(&key) else {
                break;
            };
            self.now.set(scheduled.due);
            self.running.set(Some(key));
            self.running_cancelled.set(false);

            match scheduled.job {
                Job::Once(task) => task(),
                Job::Every(period, mut task) => {
                    task();
                    if !self.running_cancelled.get() {
                        self.tasks.borrow_mut().insert(
                            key,
                            Scheduled {
                                due: scheduled.due + period,
                                id: scheduled.id,
                                job: Job::Every(period, task),
                            },
                        );
                    }
                }
            }
            self.running.set(None);
        }
        self.now.set(deadline);
    }

    fn push(&self, delay: u64, make_id: fn(i32) -> TimerId, job: Job) -> TimerId {
        let key = self.next_id.get();
        self.next_id.set(key + 1);
        let id = make_id(key);
        self.tasks.borrow_mut().insert(
            key,
            Scheduled {
                due: self.now.get() + delay,
                id,
                job,
            },
        );
        id
    }
}

impl Scheduler for ManualScheduler {
    fn set_timeout(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> SiteUiResult<TimerId> {
        Ok(self.push(delay_ms as u64, TimerId::Timeout, Job::Once(task)))
    }

    fn set_interval(&self, period_ms: u32, task: Box<dyn FnMut()>) -> SiteUiResult<TimerId> {
        let period = (period_ms as u64).max(1);
        Ok(self.push(period, TimerId::Interval, Job::Every(period, task)))
    }

    fn request_frame(&self, task: Box<dyn FnOnce()>) -> SiteUiResult<TimerId> {
        Ok(self.push(self.frame_ms, TimerId::Frame, Job::Once(task)))
    }

    fn cancel(&self, id: TimerId) {
        let key = match id {
            TimerId::Timeout(k) | TimerId::Interval(k) | TimerId::Frame(k) => k,
        };
        if self.running.get() == Some(key) {
            self.running_cancelled.set(true);
        }
        self.tasks.borrow_mut().remove(&key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_matching() {
        let dom = FakeDom::new();
        let nav = dom.add(dom.root(), "nav", &[("id", "primary-nav")]);
        let a = dom.add(nav, "a", &[("href", "#about")]);
        let _external = dom.add(nav, "a", &[("href", "https://example.com")]);
        let slide = dom.add(dom.root(), "div", &[("class", "hero__slide is-active")]);
        let h1 = dom.add(slide, "h1", &[]);
        let pill = dom.add(slide, "span", &[("class", "pill")]);

        assert_eq!(dom.query_one("#primary-nav"), Some(nav));
        assert_eq!(dom.query_within(&nav, "a[href^=\"#\"]"), vec![a]);
        assert_eq!(dom.query_all(".hero__slide.is-active"), vec![slide]);
        assert_eq!(dom.query_within(&slide, "h1, .pill"), vec![h1, pill]);
        assert!(dom.query_all("nav a").is_empty());
    }

    #[test]
    fn test_class_edits() {
        let dom = FakeDom::new();
        let node = dom.add(dom.root(), "div", &[("class", "a b")]);
        dom.add_class(&node, "c");
        dom.add_class(&node, "a");
        dom.remove_class(&node, "b");
        assert_eq!(dom.attribute(&node, "class").as_deref(), Some("a c"));
    }

    #[test]
    fn test_manual_scheduler_order_and_cancel() {
        let scheduler = ManualScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = log.clone();
        scheduler
            .set_timeout(20, Box::new(move || l.borrow_mut().push("late")))
            .unwrap();
        let l = log.clone();
        scheduler
            .set_timeout(10, Box::new(move || l.borrow_mut().push("early")))
            .unwrap();
        let l = log.clone();
        let cancelled = scheduler
            .set_timeout(15, Box::new(move || l.borrow_mut().push("cancelled")))
            .unwrap();
        scheduler.cancel(cancelled);

        scheduler.advance(25);
        assert_eq!(*log.borrow(), vec!["early", "late"]);
        assert_eq!(scheduler.now(), 25);
    }

    #[test]
    fn test_manual_scheduler_interval_repeats() {
        let scheduler = ManualScheduler::new();
        let ticks = Rc::new(Cell::new(0));
        let t = ticks.clone();
        let id = scheduler
            .set_interval(100, Box::new(move || t.set(t.get() + 1)))
            .unwrap();

        scheduler.advance(350);
        assert_eq!(ticks.get(), 3);

        scheduler.cancel(id);
        scheduler.advance(1000);
        assert_eq!(ticks.get(), 3);
        assert_eq!(scheduler.pending(), 0);
    }
}
