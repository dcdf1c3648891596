//! Hero carousel controller
//!
//! Two states, `Idle` and `Transitioning`. [`Carousel::advance`] is the only
//! way out of `Idle`; the timed cleanup continuation is the only way back.
//! Every phase continuation carries the sequence number of the transition
//! that scheduled it and is discarded if that transition is no longer the
//! one in flight.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use site_ui_config::CarouselConfig;
use site_ui_shared::{Direction, EventDisposition, EventKind, UiEvent};

use super::swipe::SwipeTracker;
use crate::dom::{track_listener, DomFacade, ListenerId, Scheduler, TimerId};

/// One accepted slide change
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub from: usize,
    pub to: usize,
    pub direction: Direction,
    seq: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CarouselPhase {
    #[default]
    Idle,
    Transitioning(Transition),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    /// Swap the active flag and park the incoming slide off-canvas
    Swap,
    /// Move both slides on the next frame
    SlideIn,
    /// Stagger the incoming slide's text back in
    RevealText,
    /// Reset inline overrides and release the lock
    Cleanup,
}

#[derive(Clone, Copy, Debug)]
enum Wait {
    Delay(u32),
    Frame,
}

pub struct Carousel<D: DomFacade> {
    inner: Rc<CarouselInner<D>>,
}

struct CarouselInner<D: DomFacade> {
    dom: Rc<D>,
    scheduler: Rc<dyn Scheduler>,
    config: CarouselConfig,
    slides: Vec<D::Node>,
    current: Cell<usize>,
    phase: Cell<CarouselPhase>,
    next_seq: Cell<u64>,
    autoplay: Cell<Option<TimerId>>,
    pending: RefCell<Vec<TimerId>>,
    listeners: RefCell<Vec<ListenerId>>,
    swipe: Cell<SwipeTracker>,
    disposed: Cell<bool>,
}

impl<D: DomFacade> Carousel<D> {
    /// Take ownership of `slides`; `None` when there is nothing to rotate
    pub fn new(
        dom: Rc<D>,
        scheduler: Rc<dyn Scheduler>,
        config: CarouselConfig,
        slides: Vec<D::Node>,
    ) -> Option<Self> {
        if slides.is_empty() {
            log::debug!("No carousel slides found, carousel disabled");
            return None;
        }

        let inner = Rc::new(CarouselInner {
            swipe: Cell::new(SwipeTracker::new(config.swipe_threshold_px)),
            dom,
            scheduler,
            config,
            slides,
            current: Cell::new(0),
            phase: Cell::new(CarouselPhase::Idle),
            next_seq: Cell::new(0),
            autoplay: Cell::new(None),
            pending: RefCell::new(Vec::new()),
            listeners: RefCell::new(Vec::new()),
            disposed: Cell::new(false),
        });

        inner.mark_active(0);
        if inner.config.autoplay {
            CarouselInner::start_autoplay(&inner);
        }

        log::info!("Carousel initialized: {} slides", inner.slides.len());
        Some(Self { inner })
    }

    /// Find the slides and controls in the document and wire them up
    ///
    /// Missing controls or a missing hover surface only disable that input.
    pub fn mount(dom: Rc<D>, scheduler: Rc<dyn Scheduler>, config: CarouselConfig) -> Option<Self> {
        let slides = dom.query_all(&config.selectors.slide);
        let carousel = Self::new(dom, scheduler, config, slides)?;
        carousel.wire_controls();
        carousel.wire_surface();
        Some(carousel)
    }

    fn wire_controls(&self) {
        let inner = &self.inner;
        let selectors = &inner.config.selectors;

        for (selector, direction) in [
            (&selectors.next, Direction::Next),
            (&selectors.prev, Direction::Prev),
        ] {
            let Some(button) = inner.dom.query_one(selector) else {
                log::debug!("Carousel control {selector:?} not found");
                continue;
            };

            let weak = Rc::downgrade(inner);
            let result = inner.dom.listen(
                &button,
                EventKind::Click,
                Box::new(move |_| {
                    if let Some(inner) = weak.upgrade() {
                        CarouselInner::advance(&inner, direction);
                    }
                    EventDisposition::PreventDefault
                }),
            );
            track_listener(&inner.listeners, result, "carousel control");
        }
    }

    fn wire_surface(&self) {
        let inner = &self.inner;
        let Some(surface) = inner.dom.query_one(&inner.config.selectors.surface) else {
            log::debug!("Carousel surface not found, hover pause and swipe disabled");
            return;
        };

        for kind in [
            EventKind::MouseEnter,
            EventKind::MouseLeave,
            EventKind::TouchStart,
            EventKind::TouchEnd,
        ] {
            let weak = Rc::downgrade(inner);
            let result = inner.dom.listen(
                &surface,
                kind,
                Box::new(move |event| {
                    if let Some(inner) = weak.upgrade() {
                        CarouselInner::on_surface_event(&inner, event);
                    }
                    EventDisposition::Default
                }),
            );
            track_listener(&inner.listeners, result, "carousel surface");
        }
    }

    /// Start a transition; returns `false` when the request was dropped
    pub fn advance(&self, direction: Direction) -> bool {
        CarouselInner::advance(&self.inner, direction)
    }

    pub fn next(&self) -> bool {
        self.advance(Direction::Next)
    }

    pub fn prev(&self) -> bool {
        self.advance(Direction::Prev)
    }

    /// (Re)start autoplay; a live timer is always cancelled first
    pub fn start_autoplay(&self) {
        CarouselInner::start_autoplay(&self.inner);
    }

    pub fn pause_autoplay(&self) {
        self.inner.pause_autoplay();
    }

    pub fn is_autoplaying(&self) -> bool {
        self.inner.autoplay.get().is_some()
    }

    /// Index of the settled slide; updated only when a transition cleans up
    pub fn current_index(&self) -> usize {
        self.inner.current.get()
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self.inner.phase.get(), CarouselPhase::Transitioning(_))
    }

    pub fn phase(&self) -> CarouselPhase {
        self.inner.phase.get()
    }

    pub fn slide_count(&self) -> usize {
        self.inner.slides.len()
    }

    /// Cancel every timer, detach every listener, settle any transition
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }
}

impl<D: DomFacade> Drop for Carousel<D> {
    fn drop(&mut self) {
        self.inner.dispose();
    }
}

impl<D: DomFacade> CarouselInner<D> {
    fn advance(inner: &Rc<Self>, direction: Direction) -> bool {
        if inner.disposed.get() {
            return false;
        }
        if let CarouselPhase::Transitioning(t) = inner.phase.get() {
            log::debug!(
                "Carousel busy ({} -> {}), dropping {direction:?}",
                t.from,
                t.to
            );
            return false;
        }

        let from = inner.current.get();
        let to = direction.step_from(from, inner.slides.len());
        if to == from {
            return false;
        }

        let seq = inner.next_seq.get();
        inner.next_seq.set(seq.wrapping_add(1));
        let transition = Transition {
            from,
            to,
            direction,
            seq,
        };
        inner.phase.set(CarouselPhase::Transitioning(transition));
        log::debug!("Carousel transition {from} -> {to} ({direction:?})");

        inner.fade_out_text(from);
        Self::schedule(
            inner,
            transition,
            Step::Swap,
            Wait::Delay(inner.config.swap_delay_ms),
        );
        Self::schedule(
            inner,
            transition,
            Step::Cleanup,
            Wait::Delay(inner.config.cleanup_delay_ms),
        );
        true
    }

    fn schedule(inner: &Rc<Self>, transition: Transition, step: Step, wait: Wait) {
        let weak = Rc::downgrade(inner);
        let seq = transition.seq;
        let task: Box<dyn FnOnce()> = Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                Self::run_step(&inner, seq, step);
            }
        });

        let scheduled = match wait {
            Wait::Delay(ms) => inner.scheduler.set_timeout(ms, task),
            Wait::Frame => inner.scheduler.request_frame(task),
        };
        match scheduled {
            Ok(id) => inner.pending.borrow_mut().push(id),
            Err(e) => {
                // Running late beats never running: cleanup must still happen
                log::warn!("Could not schedule carousel {step:?}, running now: {e}");
                Self::run_step(inner, seq, step);
            }
        }
    }

    fn run_step(inner: &Rc<Self>, seq: u64, step: Step) {
        if inner.disposed.get() {
            return;
        }
        let transition = match inner.phase.get() {
            CarouselPhase::Transitioning(t) if t.seq == seq => t,
            _ => {
                log::debug!("Discarding stale carousel {step:?}");
                return;
            }
        };

        match step {
            Step::Swap => {
                inner.swap(transition);
                Self::schedule(inner, transition, Step::SlideIn, Wait::Frame);
            }
            Step::SlideIn => {
                inner.slide_in(transition);
                Self::schedule(
                    inner,
                    transition,
                    Step::RevealText,
                    Wait::Delay(inner.config.slide_duration_ms),
                );
            }
            Step::RevealText => inner.reveal_text(transition.to),
            Step::Cleanup => inner.cleanup(transition),
        }
    }

    fn on_surface_event(inner: &Rc<Self>, event: &UiEvent) {
        match event {
            UiEvent::PointerEnter => inner.pause_autoplay(),
            UiEvent::PointerLeave => {
                if inner.config.autoplay {
                    Self::start_autoplay(inner);
                }
            }
            UiEvent::TouchStart { client_x } => {
                let mut swipe = inner.swipe.get();
                swipe.begin(*client_x);
                inner.swipe.set(swipe);
            }
            UiEvent::TouchEnd { client_x } => {
                let mut swipe = inner.swipe.get();
                let direction = swipe.finish(*client_x);
                inner.swipe.set(swipe);
                if let Some(direction) = direction {
                    Self::advance(inner, direction);
                }
            }
            _ => {}
        }
    }

    fn start_autoplay(inner: &Rc<Self>) {
        if inner.disposed.get() {
            return;
        }
        inner.pause_autoplay();

        let weak = Rc::downgrade(inner);
        let tick: Box<dyn FnMut()> = Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                Self::advance(&inner, Direction::Next);
            }
        });
        match inner
            .scheduler
            .set_interval(inner.config.autoplay_interval_ms, tick)
        {
            Ok(id) => inner.autoplay.set(Some(id)),
            Err(e) => log::warn!("Could not start carousel autoplay: {e}"),
        }
    }

    fn pause_autoplay(&self) {
        if let Some(id) = self.autoplay.take() {
            self.scheduler.cancel(id);
        }
    }

    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        self.pause_autoplay();
        for id in self.pending.borrow_mut().drain(..) {
            self.scheduler.cancel(id);
        }
        for id in self.listeners.borrow_mut().drain(..) {
            self.dom.unlisten(id);
        }
        if let CarouselPhase::Transitioning(transition) = self.phase.get() {
            self.cleanup(transition);
        }
        log::info!("Carousel disposed");
    }

    fn texts(&self, index: usize) -> Vec<D::Node> {
        self.dom
            .query_within(&self.slides[index], &self.config.selectors.text)
    }

    fn mark_active(&self, index: usize) {
        for (i, slide) in self.slides.iter().enumerate() {
            if i == index {
                self.dom.add_class(slide, &self.config.active_class);
            } else {
                self.dom.remove_class(slide, &self.config.active_class);
            }
        }
    }

    fn fade_out_text(&self, index: usize) {
        let ms = self.config.text_out_ms;
        let transition = format!("opacity {ms}ms ease-out, transform {ms}ms ease-out");
        for text in self.texts(index) {
            self.dom.set_style(&text, "transition", &transition);
            self.dom.set_style(&text, "opacity", "0");
            self.dom.set_style(&text, "transform", "translateY(-10px)");
        }
    }

    fn swap(&self, transition: Transition) {
        let incoming = &self.slides[transition.to];

        self.mark_active(transition.to);
        self.dom
            .set_style(incoming, "transform", offset(transition.direction));
        self.dom.set_style(incoming, "opacity", "0");

        for text in self.texts(transition.to) {
            self.dom.set_style(&text, "transition", "none");
            self.dom.set_style(&text, "opacity", "0");
            self.dom.set_style(&text, "transform", "translateY(20px)");
        }
    }

    fn slide_in(&self, transition: Transition) {
        let incoming = &self.slides[transition.to];
        let outgoing = &self.slides[transition.from];

        self.dom.set_style(incoming, "transform", "translateX(0)");
        self.dom.set_style(incoming, "opacity", "1");
        self.dom.set_style(
            outgoing,
            "transform",
            offset(transition.direction.opposite()),
        );
        self.dom.set_style(outgoing, "opacity", "0");
    }

    fn reveal_text(&self, index: usize) {
        let ms = self.config.text_in_ms;
        let transition = format!("opacity {ms}ms ease-in-out, transform {ms}ms ease-in-out");
        for (i, text) in self.texts(index).iter().enumerate() {
            let delay = format!("{}ms", self.config.stagger_delay_ms(i));
            self.dom.set_style(text, "transition", &transition);
            self.dom.set_style(text, "transition-delay", &delay);
            self.dom.set_style(text, "opacity", "1");
            self.dom.set_style(text, "transform", "translateY(0)");
        }
    }

    fn cleanup(&self, transition: Transition) {
        for (index, slide) in self.slides.iter().enumerate() {
            self.dom.clear_style(slide, "transform");
            self.dom.clear_style(slide, "opacity");
            for text in self.texts(index) {
                self.dom.clear_style(&text, "transition");
                self.dom.clear_style(&text, "transition-delay");
                self.dom.clear_style(&text, "opacity");
                self.dom.clear_style(&text, "transform");
            }
        }
        // The swap may never have run if its frame was throttled
        self.mark_active(transition.to);

        self.current.set(transition.to);
        self.phase.set(CarouselPhase::Idle);
        self.pending.borrow_mut().clear();
        log::debug!("Carousel settled on slide {}", transition.to);
    }
}

/// Off-canvas position on the side a slide enters from
fn offset(direction: Direction) -> &'static str {
    match direction {
        Direction::Next => "translateX(100%)",
        Direction::Prev => "translateX(-100%)",
    }
}
