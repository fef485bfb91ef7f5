//! Bounded walk over an image carousel
//!
//! A carousel shows one frame at a time and never says how many it has. The
//! navigator keeps pressing "next" until one of these happens:
//!
//! - the carousel has no next control, or advancing times out
//! - the [`LoopDetector`] sees enough repeats in a row to call it a loop
//! - the step bound (`estimated_total + safety_margin`) is hit
//! - a caller deadline passes
//!
//! None of these are errors. The walk always hands back what it found.

use std::time::Duration;

use tokio::time::{Instant, timeout};
use tracing::{debug, error, info, warn};

use crate::error::FrameReadError;
use crate::models::{NavigationState, ResourceHandle};
use crate::traits::{Advance, CarouselSession};

pub const DEFAULT_LOOP_THRESHOLD: u32 = 3;
pub const DEFAULT_SAFETY_MARGIN: usize = 5;
pub const DEFAULT_ESTIMATED_TOTAL: usize = 10;
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct NavigatorConfig {
    /// Consecutive already-seen frames that count as loop closure
    pub loop_threshold: u32,
    /// Extra steps allowed beyond the estimated gallery size
    pub safety_margin: usize,
    /// Gallery size assumed when the page gives no thumbnail count
    pub default_estimated_total: usize,
    /// Upper bound for a single advance or frame read
    pub step_timeout: Duration,
    /// Stop advancing once this instant has passed
    pub deadline: Option<Instant>,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            loop_threshold: DEFAULT_LOOP_THRESHOLD,
            safety_margin: DEFAULT_SAFETY_MARGIN,
            default_estimated_total: DEFAULT_ESTIMATED_TOTAL,
            step_timeout: DEFAULT_STEP_TIMEOUT,
            deadline: None,
        }
    }
}

/// Detects that a carousel has cycled back to frames it already showed.
///
/// A finite carousel that wraps around re-shows its frames in the same order,
/// so a short run of repeats is taken as loop closure. This is a heuristic: a
/// gallery that legitimately shows the same image `threshold` times in a row
/// is cut short.
#[derive(Debug, Clone)]
pub struct LoopDetector {
    threshold: u32,
    consecutive_duplicates: u32,
}

impl LoopDetector {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            consecutive_duplicates: 0,
        }
    }

    /// Record one dedup decision and report whether to stop
    pub fn observe(&mut self, is_new: bool) -> bool {
        if is_new {
            self.consecutive_duplicates = 0;
        } else {
            self.consecutive_duplicates += 1;
        }

        self.consecutive_duplicates >= self.threshold
    }

    pub fn consecutive_duplicates(&self) -> u32 {
        self.consecutive_duplicates
    }
}

/// Why a walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The carousel had no frame to begin with
    NoFrames,
    /// No next control, or no frame after advancing
    NoMoreFrames,
    AdvanceTimedOut,
    /// Advancing failed unexpectedly; partial results are kept
    NavigationFailed,
    /// A frame could not be read even after a retry
    FrameUnreadable,
    StepBoundReached,
    DeadlineReached,
    LoopDetected,
}

#[derive(Debug)]
pub struct WalkOutcome {
    pub state: NavigationState,
    pub stop: StopReason,
}

enum Phase {
    Start,
    HasCurrent(String),
    Advancing,
    Exhausted(StopReason),
    LoopDetected,
}

enum FrameRead {
    Frame(String),
    Missing,
    Unreadable,
}

pub struct CarouselNavigator<'a, S: CarouselSession + ?Sized> {
    session: &'a mut S,
    config: &'a NavigatorConfig,
    detector: LoopDetector,
    state: NavigationState,
}

impl<'a, S: CarouselSession + ?Sized> CarouselNavigator<'a, S> {
    pub fn new(session: &'a mut S, config: &'a NavigatorConfig) -> Self {
        Self {
            session,
            config,
            detector: LoopDetector::new(config.loop_threshold),
            state: NavigationState::default(),
        }
    }

    /// Walk the carousel forward.
    ///
    /// `accept` sees every product frame URL and returns a handle when the
    /// frame is new, `None` when it was seen before. Accepted handles are
    /// collected in order.
    pub async fn walk<F>(mut self, mut accept: F) -> WalkOutcome
    where
        F: FnMut(&str) -> Option<ResourceHandle>,
    {
        let estimated_total = match self.session.thumbnail_count_hint().await {
            Some(count) if count > 0 => count,
            _ => self.config.default_estimated_total,
        };
        let max_steps = estimated_total + self.config.safety_margin;
        debug!("Walking carousel with estimated {} frames, at most {} steps", estimated_total, max_steps);

        let mut phase = Phase::Start;
        loop {
            phase = match phase {
                Phase::Start => match self.read_frame().await {
                    FrameRead::Frame(url) => Phase::HasCurrent(url),
                    FrameRead::Missing => {
                        info!("Could not find an initial carousel frame");
                        Phase::Exhausted(StopReason::NoFrames)
                    }
                    FrameRead::Unreadable => Phase::Exhausted(StopReason::FrameUnreadable),
                },
                Phase::HasCurrent(url) => self.check_frame(&url, &mut accept),
                Phase::Advancing => self.advance(max_steps).await,
                Phase::Exhausted(reason) => return self.finish(reason),
                Phase::LoopDetected => return self.finish(StopReason::LoopDetected),
            };
        }
    }

    fn check_frame<F>(&mut self, url: &str, accept: &mut F) -> Phase
    where
        F: FnMut(&str) -> Option<ResourceHandle>,
    {
        if !self.session.accepts_frame(url) {
            debug!("Ignoring non-product frame {}", url);
            return Phase::Advancing;
        }

        let is_new = match accept(url) {
            Some(handle) => {
                self.state.discovered.push(handle);
                debug!("Accepted frame {}: {}", self.state.discovered.len(), url);
                true
            }
            None => {
                debug!("Skipping already seen frame {}", url);
                false
            }
        };

        let should_stop = self.detector.observe(is_new);
        self.state.consecutive_duplicates = self.detector.consecutive_duplicates();

        if should_stop {
            Phase::LoopDetected
        } else {
            Phase::Advancing
        }
    }

    async fn advance(&mut self, max_steps: usize) -> Phase {
        if self.state.steps_taken >= max_steps {
            return Phase::Exhausted(StopReason::StepBoundReached);
        }
        if self.config.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Phase::Exhausted(StopReason::DeadlineReached);
        }

        self.state.steps_taken += 1;
        match timeout(self.config.step_timeout, self.session.advance()).await {
            Ok(Advance::Moved) => match self.read_frame().await {
                FrameRead::Frame(url) => Phase::HasCurrent(url),
                FrameRead::Missing => Phase::Exhausted(StopReason::NoMoreFrames),
                FrameRead::Unreadable => Phase::Exhausted(StopReason::FrameUnreadable),
            },
            Ok(Advance::NoMore) => Phase::Exhausted(StopReason::NoMoreFrames),
            Ok(Advance::Failed(reason)) => {
                error!("Error during carousel navigation: {}", reason);
                Phase::Exhausted(StopReason::NavigationFailed)
            }
            Err(_) => Phase::Exhausted(StopReason::AdvanceTimedOut),
        }
    }

    /// Read the current frame, retrying a transient failure once
    async fn read_frame(&mut self) -> FrameRead {
        for attempt in 1..=2 {
            let failure = match timeout(self.config.step_timeout, self.session.current_frame_url()).await {
                Ok(Ok(Some(url))) => return FrameRead::Frame(url),
                Ok(Ok(None)) => return FrameRead::Missing,
                Ok(Err(FrameReadError::Transient(reason))) => reason,
                Err(_) => "frame read timed out".to_string(),
            };
            warn!("Frame read attempt {} failed: {}", attempt, failure);
        }

        FrameRead::Unreadable
    }

    fn finish(self, stop: StopReason) -> WalkOutcome {
        match stop {
            StopReason::LoopDetected => info!("Detected carousel loop - stopping extraction"),
            StopReason::StepBoundReached => info!("Reached step bound after {} steps", self.state.steps_taken),
            other => info!("Carousel walk ended: {:?}", other),
        }

        WalkOutcome {
            state: self.state,
            stop,
        }
    }
}
