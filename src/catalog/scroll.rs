//! Infinite-scroll trigger.
//!
//! Decides when reaching the end of the list should request the next page.
//! A request is only made after a warm-up period from start, after the
//! trigger conditions have held steady for a debounce window, and never for
//! a page at or below the highest page already requested.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollConfig {
    /// Time after start during which nothing is requested.
    pub warmup: Duration,
    /// How long the trigger must stay armed before it fires.
    pub debounce: Duration,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            warmup: Duration::from_millis(1000),
            debounce: Duration::from_millis(500),
        }
    }
}

/// What the view looks like at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollSnapshot {
    /// End of the list is on screen.
    pub visible: bool,
    pub fetching: bool,
    pub has_next: bool,
    /// Page of the most recently loaded metadata.
    pub meta_page: u32,
    /// Page currently requested by the query.
    pub current_page: u32,
}

impl ScrollSnapshot {
    fn eligible(&self) -> bool {
        self.visible && !self.fetching && self.has_next && self.current_page == self.meta_page
    }
}

#[derive(Debug, Clone, Copy)]
struct Armed {
    snapshot: ScrollSnapshot,
    fires_at: Instant,
    fired: bool,
}

#[derive(Debug, Clone)]
pub struct ScrollTrigger {
    config: ScrollConfig,
    ready_at: Instant,
    armed: Option<Armed>,
    /// Highest page requested so far.
    watermark: u32,
}

impl ScrollTrigger {
    pub fn new(now: Instant, config: ScrollConfig, initial_page: u32) -> Self {
        Self {
            config,
            ready_at: now + config.warmup,
            armed: None,
            watermark: initial_page,
        }
    }

    pub fn watermark(&self) -> u32 {
        self.watermark
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some_and(|a| !a.fired)
    }

    /// Feed the current view state. Returns the page to request, if any.
    ///
    /// Any change in the snapshot restarts the debounce window.
    pub fn evaluate(&mut self, now: Instant, snapshot: &ScrollSnapshot) -> Option<u32> {
        if now < self.ready_at || !snapshot.eligible() {
            self.armed = None;
            return None;
        }

        match self.armed.as_mut() {
            Some(armed) if armed.snapshot == *snapshot => {
                if armed.fired || now < armed.fires_at {
                    return None;
                }
                armed.fired = true;

                let next = snapshot.meta_page + 1;
                if next <= self.watermark {
                    log::debug!("Scroll trigger skipped page {next}, already requested");
                    return None;
                }
                self.watermark = next;
                log::debug!("Scroll trigger requesting page {next}");
                Some(next)
            }
            _ => {
                self.armed = Some(Armed {
                    snapshot: *snapshot,
                    fires_at: now + self.config.debounce,
                    fired: false,
                });
                None
            }
        }
    }

    /// Track query page changes made elsewhere. Going back to page 1
    /// (reset, filter change) lowers the watermark again.
    pub fn on_page_changed(&mut self, page: i64) {
        if page == 1 {
            self.watermark = 1;
        }
    }
}
