use site_ui_shared::Direction;

/// Turns a touch-start/touch-end pair into a carousel direction
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SwipeTracker {
    threshold: f64,
    start_x: Option<f64>,
}

impl SwipeTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            start_x: None,
        }
    }

    pub fn begin(&mut self, client_x: f64) {
        self.start_x = Some(client_x);
    }

    /// Finish the gesture; a touch-end with no recorded start is ignored
    pub fn finish(&mut self, client_x: f64) -> Option<Direction> {
        let start_x = self.start_x.take()?;
        classify(start_x - client_x, self.threshold)
    }

    pub fn is_tracking(&self) -> bool {
        self.start_x.is_some()
    }
}

/// `delta` is start minus end: positive means the finger moved left
///
/// Travel at or under the threshold is a tap, not a swipe.
pub fn classify(delta: f64, threshold: f64) -> Option<Direction> {
    if delta.abs() > threshold {
        Some(if delta > 0.0 {
            Direction::Next
        } else {
            Direction::Prev
        })
    } else {
        None
    }
}
