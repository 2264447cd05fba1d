//! Scroll-to controller.
//!
//! [`ScrollToController`] is a pure state machine advanced by [`tick`]
//! with the latest height observation; [`scroll_to`] is the driver that owns
//! the clock and performs the actions it returns against a page.
//!
//! [`tick`]: ScrollToController::tick

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use super::geometry;
use crate::browser::{scripts, PageContext};
use crate::capture::{log_progress, ProgressCallback};
use crate::Result;

/// Interval between height polls while waiting for growth.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Desired content height and the per-step growth timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollTarget {
    pub height: u32,
    pub timeout: Duration,
}

/// Page state as seen by the driver at one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// Current content height.
    pub height: u32,
    /// Time since the controller was started.
    pub elapsed: Duration,
}

/// One scroll to the bottom and how it ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollStep {
    /// Height that was scrolled to.
    pub height: u32,
    pub timed_out: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollOutcome {
    /// Last observed content height.
    pub height: u32,
    /// Whether the final step ended without growth.
    pub timed_out: bool,
    pub steps: Vec<ScrollStep>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Scroll the page to this offset, then tick again.
    Scroll(u32),
    /// Sleep, then tick again.
    Wait(Duration),
    Done(ScrollOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Scrolling { height: u32 },
    Polling { height: u32, since: Duration },
    Done,
}

#[derive(Debug)]
pub struct ScrollToController {
    target: ScrollTarget,
    state: State,
    steps: Vec<ScrollStep>,
}

impl ScrollToController {
    pub fn new(target: ScrollTarget) -> Self {
        Self {
            target,
            state: State::Idle,
            steps: Vec::new(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    /// Advances the machine.
    ///
    /// Growth observed while polling wins over an elapsed timeout on the same
    /// tick. A step that grew the page past the target, or a step that timed
    /// out, ends the run.
    pub fn tick(&mut self, observation: Observation) -> Action {
        match self.state {
            State::Idle => {
                self.state = State::Scrolling {
                    height: observation.height,
                };
                Action::Scroll(observation.height)
            }
            State::Scrolling { height } => {
                self.state = State::Polling {
                    height,
                    since: observation.elapsed,
                };
                Action::Wait(POLL_INTERVAL)
            }
            State::Polling { height, since } => {
                if observation.height > height {
                    self.steps.push(ScrollStep {
                        height,
                        timed_out: false,
                    });
                    if observation.height < self.target.height {
                        self.state = State::Scrolling {
                            height: observation.height,
                        };
                        return Action::Scroll(observation.height);
                    }
                    return self.finish(observation.height, false);
                }

                let waited = observation.elapsed.saturating_sub(since);
                if waited >= self.target.timeout {
                    self.steps.push(ScrollStep {
                        height,
                        timed_out: true,
                    });
                    return self.finish(height, true);
                }
                Action::Wait(POLL_INTERVAL.min(self.target.timeout - waited))
            }
            State::Done => self.finish(observation.height, false),
        }
    }

    fn finish(&mut self, height: u32, timed_out: bool) -> Action {
        self.state = State::Done;
        Action::Done(ScrollOutcome {
            height,
            timed_out,
            steps: self.steps.clone(),
        })
    }
}

/// Scrolls to the bottom until the page reaches `target.height` or stops
/// growing within `target.timeout`.
pub async fn scroll_to(
    page: &dyn PageContext,
    target: ScrollTarget,
    progress: &Option<ProgressCallback>,
) -> Result<ScrollOutcome> {
    log_progress(progress, &format!("Scrolling to {}", target.height));

    let mut controller = ScrollToController::new(target);
    let started = Instant::now();
    let mut observed = geometry::probe(page).await?.height;

    loop {
        let action = controller.tick(Observation {
            height: observed,
            elapsed: started.elapsed(),
        });
        match action {
            Action::Scroll(height) => {
                page.evaluate(&scripts::scroll_to(height)).await?;
                log_progress(progress, &format!("    Scrolled to {height}"));
            }
            Action::Wait(pause) => {
                tokio::time::sleep(pause).await;
                observed = geometry::probe(page).await?.height;
            }
            Action::Done(outcome) => {
                if outcome.timed_out {
                    log_progress(progress, "    Timeout");
                }
                log::debug!(
                    "scroll-to finished at {} after {} step(s)",
                    outcome.height,
                    outcome.steps.len()
                );
                return Ok(outcome);
            }
        }
    }
}
